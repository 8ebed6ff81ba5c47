/*
[INPUT]:  MercoClient, stream configuration, shutdown CancellationToken
[OUTPUT]: StreamEvent channel (Connected / Task / Disconnected) in arrival order
[POS]:    Stream layer - supervised SSE reader with reconnection backoff
[UPDATE]: When changing reconnection backoff, framing, or shutdown semantics
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::http::MercoClient;
use crate::stream::sse::{SseDecoder, SseFrame};
use crate::types::BacktestTask;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Everything the task stream reports, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connected,
    Disconnected,
    Task(Box<BacktestTask>),
}

#[derive(Debug, Clone)]
pub struct TaskStreamConfig {
    pub channel_capacity: usize,
    pub max_backoff: Duration,
}

impl Default for TaskStreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

/// Task stream reader.
///
/// The service replays every known task when a connection opens, so a reconnect
/// re-converges consumers without a separate snapshot fetch.
#[derive(Debug)]
pub struct TaskStream;

impl TaskStream {
    /// Spawn the reader. It runs until `shutdown` is cancelled or the receiver is dropped.
    pub fn spawn(
        client: MercoClient,
        config: TaskStreamConfig,
        shutdown: CancellationToken,
    ) -> (mpsc::Receiver<StreamEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let worker = TaskStreamWorker {
            client,
            tx,
            shutdown,
            max_backoff: config.max_backoff,
        };
        let handle = tokio::spawn(worker.run());
        (rx, handle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamExit {
    Disconnected,
    Shutdown,
}

#[derive(Debug)]
struct TaskStreamWorker {
    client: MercoClient,
    tx: mpsc::Sender<StreamEvent>,
    shutdown: CancellationToken,
    max_backoff: Duration,
}

impl TaskStreamWorker {
    async fn run(self) {
        let mut retry_count: u32 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            info!(base_url = %self.client.base_url(), "Connecting to task stream");
            match self.client.open_task_stream().await {
                Ok(response) => {
                    if self.tx.send(StreamEvent::Connected).await.is_err() {
                        break;
                    }
                    info!("Task stream connected");

                    let exit = self.read_loop(response).await;
                    if self.tx.send(StreamEvent::Disconnected).await.is_err() {
                        break;
                    }
                    if exit == StreamExit::Shutdown {
                        break;
                    }

                    // a dropped connection retries after the first backoff step
                    retry_count = 1;
                    warn!("Task stream disconnected; reconnecting");
                }
                Err(err) => {
                    retry_count = retry_count.saturating_add(1);
                    let backoff = backoff_duration(retry_count, self.max_backoff);
                    warn!(
                        retry_count,
                        ?backoff,
                        error = %err,
                        "Task stream connect failed; retrying with backoff"
                    );
                }
            }

            let backoff = backoff_duration(retry_count.max(1), self.max_backoff);
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        debug!("Task stream worker stopped");
    }

    async fn read_loop(&self, response: reqwest::Response) -> StreamExit {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Task stream shutdown requested");
                    return StreamExit::Shutdown;
                }
                chunk = body.next() => {
                    match chunk {
                        Some(Ok(bytes)) => {
                            for frame in decoder.push(&bytes) {
                                if self.forward_frame(frame).await.is_err() {
                                    return StreamExit::Shutdown;
                                }
                            }
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, "Task stream read failed");
                            return StreamExit::Disconnected;
                        }
                        None => {
                            warn!("Task stream ended");
                            return StreamExit::Disconnected;
                        }
                    }
                }
            }
        }
    }

    /// `Err` means the consumer is gone
    async fn forward_frame(&self, frame: SseFrame) -> Result<(), ()> {
        match serde_json::from_str::<BacktestTask>(&frame.data) {
            Ok(task) => self
                .tx
                .send(StreamEvent::Task(Box::new(task)))
                .await
                .map_err(|_| ()),
            Err(err) => {
                log_parse_fail_once(&err, &frame.data);
                Ok(())
            }
        }
    }
}

fn backoff_duration(retry_count: u32, max_backoff: Duration) -> Duration {
    let exp = retry_count.saturating_sub(1).min(63);
    let secs = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(max_backoff)
}

fn log_parse_fail_once(err: &serde_json::Error, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        warn!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "task stream frame parse failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            message = %preview,
            "task stream frame parse failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_backoff_clamps_at_max() {
        let max = Duration::from_secs(30);
        assert_eq!(backoff_duration(1, max), Duration::from_secs(1));
        assert_eq!(backoff_duration(2, max), Duration::from_secs(2));
        assert_eq!(backoff_duration(3, max), Duration::from_secs(4));
        assert_eq!(backoff_duration(5, max), Duration::from_secs(16));
        assert_eq!(backoff_duration(6, max), Duration::from_secs(30));
        assert_eq!(backoff_duration(100, max), Duration::from_secs(30));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_for_log("abc", 10), "abc");
        assert_eq!(truncate_for_log("ééé", 3), "é...");
    }
}
