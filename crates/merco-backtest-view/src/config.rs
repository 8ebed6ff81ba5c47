/*
[INPUT]:  Optional YAML configuration file + MERCO_* environment overrides
[OUTPUT]: Parsed ViewConfig with defaults for every field
[POS]:    Configuration layer - server, stream and view settings
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::time::Duration;

use merco_adapter::{ClientConfig, TaskStreamConfig};
use serde::{Deserialize, Serialize};

use crate::pagination::DEFAULT_PAGE_SIZE;

const ENV_PREFIX: &str = "MERCO";

/// Top-level configuration of the backtest viewer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
    pub view: PanelConfig,
}

/// Backtest service connection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: merco_adapter::http::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Task stream reconnection and buffering
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    pub max_backoff_secs: u64,
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_backoff_secs: 30,
            channel_capacity: 256,
        }
    }
}

impl StreamConfig {
    pub fn task_stream_config(&self) -> TaskStreamConfig {
        TaskStreamConfig {
            channel_capacity: self.channel_capacity,
            max_backoff: Duration::from_secs(self.max_backoff_secs.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    pub page_size: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewConfig {
    /// Load defaults, then the YAML file if given, then `MERCO_<SECTION>__<KEY>` variables
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Yaml));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load from a YAML string, without environment overrides
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Yaml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
