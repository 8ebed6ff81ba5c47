/*
[INPUT]:  CLI arguments, optional YAML configuration, OS shutdown signals
[OUTPUT]: Headless backtest watcher: task progress logs + statistics of the charted task
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use merco_adapter::{BacktestTask, CreateBacktestTaskRequest, MercoClient, TaskStatus};
use merco_backtest_view::{ChartState, Paginator, Session, StatisticsView, ViewConfig};

#[derive(Parser, Debug)]
#[command(name = "merco-backtest-view", version, about = "Merco backtest task watcher")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "log-dir", value_name = "DIR")]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one backtest job, then keep watching
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        exchange: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        timeframe: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_dir.as_ref())?;

    let config = ViewConfig::load(args.config_path.as_deref()).context("load config")?;
    info!(base_url = %config.server.base_url, "starting merco-backtest-view");

    let client = MercoClient::with_config(config.server.client_config(), &config.server.base_url)
        .context("build backtest client")?;
    let session = Session::connect(client, config.stream.task_stream_config());

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    if let Some(Command::Submit {
        name,
        exchange,
        symbol,
        timeframe,
    }) = args.command
    {
        let request = CreateBacktestTaskRequest::new(name, exchange, symbol, timeframe);
        let accepted = session.submit(request).await.context("submit backtest task")?;
        if !accepted {
            warn!("submission ignored; every field needs a value");
        }
    }

    let mut tasks_rx = session.subscribe_tasks();
    let mut chart_rx = session.subscribe_chart();
    let mut last_created_rx = session.subscribe_last_created();
    let mut progress = ProgressLog::default();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown signal received");
                break;
            }
            changed = tasks_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let tasks = tasks_rx.borrow_and_update().clone();
                progress.log_changes(&tasks);
            }
            changed = chart_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let chart = chart_rx.borrow_and_update().clone();
                print_statistics(&session, &chart, config.view.page_size);
            }
            changed = last_created_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(task_id) = last_created_rx.borrow_and_update().as_deref() {
                    info!(task_id, "backtest task accepted by the service");
                }
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Logs a line whenever a task's status or whole-percent progress moves
#[derive(Debug, Default)]
struct ProgressLog {
    seen: HashMap<String, (TaskStatus, u32)>,
}

impl ProgressLog {
    fn log_changes(&mut self, tasks: &[BacktestTask]) {
        for task in tasks {
            let state = (task.status, task.progress.clamp(0.0, 100.0) as u32);
            if self.seen.get(&task.id) == Some(&state) {
                continue;
            }
            self.seen.insert(task.id.clone(), state);

            match task.status {
                TaskStatus::Running => info!(
                    task_id = %task.id,
                    name = %task.name,
                    progress = state.1,
                    "backtest running"
                ),
                TaskStatus::Failed => warn!(
                    task_id = %task.id,
                    name = %task.name,
                    error = task.error_message.as_deref().unwrap_or_default(),
                    "backtest failed"
                ),
                TaskStatus::Pending | TaskStatus::Completed => info!(
                    task_id = %task.id,
                    name = %task.name,
                    status = ?task.status,
                    "backtest status"
                ),
            }
        }
    }
}

fn print_statistics(session: &Session, chart: &ChartState, page_size: usize) {
    let Some(task_id) = chart.loaded_task_id.as_deref() else {
        return;
    };
    let tasks = session.tasks();
    let Some(task) = tasks.iter().find(|task| task.id == task_id) else {
        return;
    };
    let Some(view) = StatisticsView::build(task, &Paginator::with_page_size(page_size)) else {
        return;
    };

    println!(
        "== {} {} {} {} ({}) ==",
        task.name, task.exchange, task.symbol, task.timeframe, task.id
    );
    for row in &view.summary {
        println!("{:<16} {}", row.label, row.value);
    }
    println!(
        "-- trades page {}/{} ({} total, {} candles, {} markers) --",
        view.page,
        view.page_count.max(1),
        view.total_trades,
        chart.points.len(),
        chart.markers.len()
    );
    for trade in &view.trades {
        println!(
            "{}  {:<11} price {:>14}  amount {:>12}  fee {:>10}  profit {:>10}",
            trade.time, trade.trade_type, trade.price, trade.amount, trade.fee, trade.profit
        );
    }
}

fn init_tracing(log_level: &str, log_dir: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "merco-backtest-view.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(None)
        }
    }
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
