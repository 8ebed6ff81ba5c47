/*
[INPUT]:  Submit requests and create-task completions
[OUTPUT]: At most one in-flight create request + last created task id
[POS]:    Coordination core - single-flight job submission
[UPDATE]: When supersede / cancellation rules of submissions change
*/

use merco_adapter::{CreateBacktestTaskRequest, CreateBacktestTaskResponse, MercoError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::permit::Permit;

/// Everything the transport side needs to issue one create request
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub request_id: u64,
    pub request: CreateBacktestTaskRequest,
    pub token: CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(String),
    Failed,
    /// Completion of a superseded or cancelled request; nothing was applied
    Dropped,
}

#[derive(Debug, Default)]
pub struct SubmissionController {
    permit: Permit,
    /// Set exactly while `permit` is held
    token: Option<CancellationToken>,
    current_request_id: Option<u64>,
    next_request_id: u64,
    last_created_task_id: Option<String>,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.permit.is_held()
    }

    pub fn last_created_task_id(&self) -> Option<&str> {
        self.last_created_task_id.as_deref()
    }

    /// Start a submission. `None` when a field is blank or another submission is in flight.
    pub fn begin(&mut self, request: CreateBacktestTaskRequest) -> Option<SubmitTicket> {
        if !request.is_complete() {
            debug!(?request, "Ignoring submit with blank fields");
            return None;
        }
        if self.permit.try_acquire().is_err() {
            debug!(name = %request.name, "Ignoring submit while another is in flight");
            return None;
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        self.current_request_id = Some(request_id);

        info!(
            request_id,
            name = %request.name,
            exchange = %request.exchange,
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            "Submitting backtest task"
        );

        Some(SubmitTicket {
            request_id,
            request,
            token,
        })
    }

    /// Apply a completion. Only the current, uncancelled request may touch state.
    pub fn finish(
        &mut self,
        request_id: u64,
        result: Result<CreateBacktestTaskResponse, MercoError>,
    ) -> SubmitOutcome {
        if self.current_request_id != Some(request_id) {
            debug!(request_id, "Dropping late submission result");
            return SubmitOutcome::Dropped;
        }

        let cancelled = self
            .token
            .take()
            .is_some_and(|token| token.is_cancelled());
        self.current_request_id = None;
        self.permit.release();

        if cancelled {
            debug!(request_id, "Dropping result of cancelled submission");
            return SubmitOutcome::Dropped;
        }

        match result {
            Ok(response) => {
                info!(request_id, task_id = %response.task_id, "Backtest task created");
                self.last_created_task_id = Some(response.task_id.clone());
                SubmitOutcome::Created(response.task_id)
            }
            Err(err) => {
                warn!(request_id, error = %err, "Backtest task submission failed");
                SubmitOutcome::Failed
            }
        }
    }

    /// Cancel whatever is in flight and free the slot. Its late completion is dropped.
    pub fn cancel_in_flight(&mut self) -> bool {
        let Some(token) = self.token.take() else {
            return false;
        };
        token.cancel();
        if let Some(request_id) = self.current_request_id.take() {
            info!(request_id, "Cancelled in-flight submission");
        }
        self.permit.release();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateBacktestTaskRequest {
        CreateBacktestTaskRequest::new("sma-cross", "binance", "BTC/USDT", "1h")
    }

    fn created(task_id: &str) -> Result<CreateBacktestTaskResponse, MercoError> {
        Ok(CreateBacktestTaskResponse {
            task_id: task_id.to_string(),
        })
    }

    #[test]
    fn test_blank_field_is_ignored() {
        let mut controller = SubmissionController::new();
        let blank = CreateBacktestTaskRequest::new("sma-cross", "binance", "", "1h");

        assert!(controller.begin(blank).is_none());
        assert!(!controller.is_submitting());
    }

    #[test]
    fn test_second_submit_while_in_flight_is_noop() {
        let mut controller = SubmissionController::new();
        let first = controller.begin(request()).expect("first submit starts");

        assert!(controller.begin(request()).is_none());
        assert!(controller.is_submitting());
        assert!(!first.token.is_cancelled());

        assert_eq!(
            controller.finish(first.request_id, created("t-1")),
            SubmitOutcome::Created("t-1".to_string())
        );
        assert!(!controller.is_submitting());
        assert_eq!(controller.last_created_task_id(), Some("t-1"));
    }

    #[test]
    fn test_failure_clears_flag_and_keeps_last_created() {
        let mut controller = SubmissionController::new();
        let first = controller.begin(request()).expect("submit");
        controller.finish(first.request_id, created("t-1"));

        let second = controller.begin(request()).expect("submit again");
        let outcome = controller.finish(
            second.request_id,
            Err(MercoError::Api {
                code: 500,
                message: "engine down".to_string(),
            }),
        );

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(!controller.is_submitting());
        assert_eq!(controller.last_created_task_id(), Some("t-1"));
    }

    #[test]
    fn test_cancelled_request_result_is_dropped() {
        let mut controller = SubmissionController::new();
        let first = controller.begin(request()).expect("submit");

        assert!(controller.cancel_in_flight());
        assert!(first.token.is_cancelled());
        assert!(!controller.is_submitting());

        assert_eq!(
            controller.finish(first.request_id, created("late")),
            SubmitOutcome::Dropped
        );
        assert_eq!(controller.last_created_task_id(), None);
    }

    #[test]
    fn test_late_result_does_not_release_newer_request() {
        let mut controller = SubmissionController::new();
        let first = controller.begin(request()).expect("submit");
        controller.cancel_in_flight();
        let second = controller.begin(request()).expect("resubmit");
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());

        assert_eq!(
            controller.finish(first.request_id, created("stale")),
            SubmitOutcome::Dropped
        );
        assert!(controller.is_submitting());

        assert_eq!(
            controller.finish(second.request_id, created("fresh")),
            SubmitOutcome::Created("fresh".to_string())
        );
        assert_eq!(controller.last_created_task_id(), Some("fresh"));
    }
}
