/*
[INPUT]:  Task stream events, user commands (select / submit), API completions
[OUTPUT]: Watch-channel snapshots of tasks, connectivity, selection, chart, submission
[POS]:    Runtime layer - owned session actor funnelling all state mutations
[UPDATE]: When adding session commands, snapshots or changing shutdown semantics
*/

use std::sync::Arc;

use merco_adapter::{
    BacktestTask, Candle, CreateBacktestTaskRequest, CreateBacktestTaskResponse, MercoClient,
    MercoError, StreamEvent, TaskStream, TaskStreamConfig,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::BacktestApi;
use crate::chart::{ChartState, candles_to_points};
use crate::filters::MarketDataCatalog;
use crate::markers::Marker;
use crate::registry::{RegistryChange, TaskRegistry};
use crate::submission::{SubmissionController, SubmitOutcome, SubmitTicket};
use crate::synchronizer::{ChartSynchronizer, LoadRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
}

#[derive(Debug)]
enum SessionCommand {
    Select {
        task_id: String,
        reply: oneshot::Sender<bool>,
    },
    Submit {
        request: CreateBacktestTaskRequest,
        reply: oneshot::Sender<bool>,
    },
    SubmitFinished {
        request_id: u64,
        result: Result<CreateBacktestTaskResponse, MercoError>,
    },
    ChartLoaded {
        task_id: String,
        markers: Vec<Marker>,
        result: Result<Vec<Candle>, MercoError>,
    },
    Shutdown,
}

#[derive(Debug)]
struct Snapshots {
    tasks: watch::Sender<Vec<BacktestTask>>,
    connected: watch::Sender<bool>,
    selected: watch::Sender<Option<String>>,
    chart: watch::Sender<ChartState>,
    submitting: watch::Sender<bool>,
    last_created: watch::Sender<Option<String>>,
}

impl Snapshots {
    fn new() -> Self {
        Self {
            tasks: watch::channel(Vec::new()).0,
            connected: watch::channel(false).0,
            selected: watch::channel(None).0,
            chart: watch::channel(ChartState::default()).0,
            submitting: watch::channel(false).0,
            last_created: watch::channel(None).0,
        }
    }
}

fn publish<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    });
}

/// Handle to a running session.
///
/// Every mutation goes through one actor task; readers see consistent snapshots through
/// `watch` channels. Dropping the handle stops the actor without waiting for it.
pub struct Session {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    snapshots: Arc<Snapshots>,
    api: Arc<dyn BacktestApi>,
    shutdown: CancellationToken,
    actor_handle: Option<JoinHandle<()>>,
    stream_handle: Option<JoinHandle<()>>,
}

impl Session {
    /// Start a session fed by an already running stream of task events
    pub fn start(api: Arc<dyn BacktestApi>, stream_rx: mpsc::Receiver<StreamEvent>) -> Self {
        Self::start_internal(api, stream_rx, CancellationToken::new(), None)
    }

    /// Start a session that owns its task stream reader
    pub fn connect(client: MercoClient, stream_config: TaskStreamConfig) -> Self {
        let shutdown = CancellationToken::new();
        let (stream_rx, stream_handle) =
            TaskStream::spawn(client.clone(), stream_config, shutdown.child_token());
        Self::start_internal(Arc::new(client), stream_rx, shutdown, Some(stream_handle))
    }

    fn start_internal(
        api: Arc<dyn BacktestApi>,
        stream_rx: mpsc::Receiver<StreamEvent>,
        shutdown: CancellationToken,
        stream_handle: Option<JoinHandle<()>>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let snapshots = Arc::new(Snapshots::new());

        let actor = SessionActor {
            api: api.clone(),
            cmd_tx: cmd_tx.clone(),
            snapshots: snapshots.clone(),
            registry: TaskRegistry::new(),
            synchronizer: ChartSynchronizer::new(),
            submission: SubmissionController::new(),
            chart: ChartState::default(),
            loads: shutdown.child_token(),
        };
        let actor_handle = tokio::spawn(actor.run(cmd_rx, stream_rx, shutdown.clone()));

        Self {
            cmd_tx,
            snapshots,
            api,
            shutdown,
            actor_handle: Some(actor_handle),
            stream_handle,
        }
    }

    pub fn tasks(&self) -> Vec<BacktestTask> {
        self.snapshots.tasks.borrow().clone()
    }

    pub fn connected(&self) -> bool {
        *self.snapshots.connected.borrow()
    }

    pub fn selected_task_id(&self) -> Option<String> {
        self.snapshots.selected.borrow().clone()
    }

    pub fn chart_state(&self) -> ChartState {
        self.snapshots.chart.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        *self.snapshots.submitting.borrow()
    }

    pub fn last_created_task_id(&self) -> Option<String> {
        self.snapshots.last_created.borrow().clone()
    }

    pub fn subscribe_tasks(&self) -> watch::Receiver<Vec<BacktestTask>> {
        self.snapshots.tasks.subscribe()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.snapshots.connected.subscribe()
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<String>> {
        self.snapshots.selected.subscribe()
    }

    pub fn subscribe_chart(&self) -> watch::Receiver<ChartState> {
        self.snapshots.chart.subscribe()
    }

    pub fn subscribe_submitting(&self) -> watch::Receiver<bool> {
        self.snapshots.submitting.subscribe()
    }

    pub fn subscribe_last_created(&self) -> watch::Receiver<Option<String>> {
        self.snapshots.last_created.subscribe()
    }

    /// Select a task for charting. Returns false when the task cannot be selected.
    pub async fn select(&self, task_id: impl Into<String>) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Select {
            task_id: task_id.into(),
            reply,
        })?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Submit a backtest job. Returns false when ignored (blank field or one already in flight).
    pub async fn submit(&self, request: CreateBacktestTaskRequest) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Submit { request, reply })?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn list_strategies(&self) -> merco_adapter::Result<Vec<String>> {
        self.api.list_strategies().await
    }

    pub async fn market_data_catalog(&self) -> merco_adapter::Result<MarketDataCatalog> {
        Ok(MarketDataCatalog::new(self.api.list_market_data().await?))
    }

    /// Cancel any in-flight submission, stop the stream reader and wait for both tasks
    pub async fn shutdown(mut self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown);
        self.shutdown.cancel();

        if let Some(handle) = self.actor_handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "session actor terminated abnormally");
            }
        }
        if let Some(handle) = self.stream_handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "task stream reader terminated abnormally");
            }
        }
        info!("session shutdown complete");
    }

    fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.cmd_tx.send(command).map_err(|_| SessionError::Closed)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct SessionActor {
    api: Arc<dyn BacktestApi>,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    snapshots: Arc<Snapshots>,
    registry: TaskRegistry,
    synchronizer: ChartSynchronizer,
    submission: SubmissionController,
    chart: ChartState,
    /// Cancels in-flight candle fetches on teardown
    loads: CancellationToken,
}

impl SessionActor {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
        stream_rx: mpsc::Receiver<StreamEvent>,
        shutdown: CancellationToken,
    ) {
        let mut stream_rx = Some(stream_rx);
        info!("session started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                command = cmd_rx.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                event = next_stream_event(&mut stream_rx) => match event {
                    Some(event) => self.handle_stream_event(event),
                    None => {
                        debug!("task stream closed");
                        stream_rx = None;
                        self.registry.set_connected(false);
                    }
                },
            }

            self.reconcile();
            self.publish();
        }

        self.submission.cancel_in_flight();
        self.loads.cancel();
        self.publish();
        info!("session stopped");
    }

    fn handle_stream_event(&mut self, event: StreamEvent) {
        match self.registry.apply(event) {
            RegistryChange::Connectivity => {
                if self.registry.connected() {
                    info!(tasks = self.registry.len(), "task stream online");
                } else {
                    warn!(tasks = self.registry.len(), "task stream offline; keeping known tasks");
                }
            }
            RegistryChange::Tasks | RegistryChange::Unchanged => {}
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Select { task_id, reply } => {
                let accepted = self.synchronizer.select(&self.registry, &task_id);
                let _ = reply.send(accepted);
            }
            SessionCommand::Submit { request, reply } => {
                let ticket = self.submission.begin(request);
                let accepted = ticket.is_some();
                if let Some(ticket) = ticket {
                    self.spawn_submit(ticket);
                }
                let _ = reply.send(accepted);
            }
            SessionCommand::SubmitFinished { request_id, result } => {
                let outcome = self.submission.finish(request_id, result);
                if let SubmitOutcome::Created(task_id) = outcome {
                    debug!(task_id = %task_id, "waiting for created task on the stream");
                }
            }
            SessionCommand::ChartLoaded {
                task_id,
                markers,
                result,
            } => self.apply_chart(task_id, markers, result),
            SessionCommand::Shutdown => {}
        }
    }

    fn apply_chart(
        &mut self,
        task_id: String,
        markers: Vec<Marker>,
        result: Result<Vec<Candle>, MercoError>,
    ) {
        let succeeded = result.is_ok();
        if !self.synchronizer.finish_load(&task_id, succeeded) {
            return;
        }

        match result {
            Ok(candles) => {
                info!(
                    task_id = %task_id,
                    candles = candles.len(),
                    markers = markers.len(),
                    "chart data ready"
                );
                self.chart = ChartState::loaded(task_id, markers, candles_to_points(&candles));
            }
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "failed to fetch candles");
            }
        }
    }

    fn reconcile(&mut self) {
        if let Some(load) = self.synchronizer.reconcile(&self.registry) {
            self.spawn_load(load);
        }
    }

    fn spawn_submit(&self, ticket: SubmitTicket) {
        let api = self.api.clone();
        let cmd_tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            let SubmitTicket {
                request_id,
                request,
                token,
            } = ticket;
            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!(request_id, "submission request aborted");
                    return;
                }
                result = api.create_task(&request) => result,
            };
            let _ = cmd_tx.send(SessionCommand::SubmitFinished { request_id, result });
        });
    }

    fn spawn_load(&self, load: LoadRequest) {
        let api = self.api.clone();
        let cmd_tx = self.cmd_tx.clone();
        let token = self.loads.clone();
        tokio::spawn(async move {
            let LoadRequest {
                task_id,
                query,
                markers,
            } = load;
            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!(task_id = %task_id, "chart load aborted");
                    return;
                }
                result = api.fetch_candles(&query) => result,
            };
            let _ = cmd_tx.send(SessionCommand::ChartLoaded {
                task_id,
                markers,
                result,
            });
        });
    }

    fn publish(&self) {
        let snapshots = &self.snapshots;
        if snapshots.tasks.borrow().as_slice() != self.registry.tasks() {
            snapshots.tasks.send_replace(self.registry.tasks().to_vec());
        }
        publish(&snapshots.connected, self.registry.connected());
        publish(
            &snapshots.selected,
            self.synchronizer.selected_task_id().map(str::to_string),
        );
        if *snapshots.chart.borrow() != self.chart {
            snapshots.chart.send_replace(self.chart.clone());
        }
        publish(&snapshots.submitting, self.submission.is_submitting());
        publish(
            &snapshots.last_created,
            self.submission.last_created_task_id().map(str::to_string),
        );
    }
}

async fn next_stream_event(
    stream_rx: &mut Option<mpsc::Receiver<StreamEvent>>,
) -> Option<StreamEvent> {
    match stream_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
