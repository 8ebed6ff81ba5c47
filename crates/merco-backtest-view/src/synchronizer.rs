/*
[INPUT]:  TaskRegistry state, user selections, chart load completions
[OUTPUT]: Current selection and at most one LoadRequest at a time
[POS]:    Coordination core - selection -> chart state machine (no I/O)
[UPDATE]: When auto-selection, load triggering or coalescing rules change
*/

use merco_adapter::CandlesQuery;
use tracing::{debug, info, warn};

use crate::markers::{Marker, project_markers};
use crate::permit::Permit;
use crate::registry::TaskRegistry;

/// A chart load the caller must perform and report back with [`ChartSynchronizer::finish_load`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub task_id: String,
    pub query: CandlesQuery,
    pub markers: Vec<Marker>,
}

/// Selection and chart-loading state.
///
/// Inputs mutate state, then [`reconcile`](Self::reconcile) runs the auto-selection and
/// load rules until neither fires. A selection made while a load is running is only
/// remembered; the load for it starts once the running one finishes.
#[derive(Debug, Default)]
pub struct ChartSynchronizer {
    selected_task_id: Option<String>,
    loaded_chart_task_id: Option<String>,
    loading: Permit,
    loading_task_id: Option<String>,
    failed_task_id: Option<String>,
}

impl ChartSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn loaded_chart_task_id(&self) -> Option<&str> {
        self.loaded_chart_task_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_held()
    }

    /// User selection. Tasks that are not completed with a statistic are ignored.
    pub fn select(&mut self, registry: &TaskRegistry, task_id: &str) -> bool {
        let selectable = registry.get(task_id).is_some_and(|task| task.is_selectable());
        if !selectable {
            debug!(task_id, "Ignoring selection of task without results");
            return false;
        }

        if self.failed_task_id.as_deref() == Some(task_id) {
            self.failed_task_id = None;
        }
        if self.selected_task_id.as_deref() != Some(task_id) {
            debug!(task_id, "Task selected");
            self.selected_task_id = Some(task_id.to_string());
        }
        true
    }

    /// Run both rules to a fixed point. Returns the load to start, if any.
    pub fn reconcile(&mut self, registry: &TaskRegistry) -> Option<LoadRequest> {
        let mut load = None;
        loop {
            let mut progressed = self.auto_select(registry);
            if load.is_none() {
                load = self.next_load(registry);
                progressed |= load.is_some();
            }
            if !progressed {
                return load;
            }
        }
    }

    /// Report the end of the load started for `task_id`. Returns false for a load this
    /// synchronizer did not start.
    pub fn finish_load(&mut self, task_id: &str, succeeded: bool) -> bool {
        if self.loading_task_id.as_deref() != Some(task_id) {
            debug!(task_id, "Ignoring completion of unknown chart load");
            return false;
        }

        self.loading_task_id = None;
        self.loading.release();

        if succeeded {
            info!(task_id, "Chart loaded");
            self.loaded_chart_task_id = Some(task_id.to_string());
            self.failed_task_id = None;
        } else {
            warn!(task_id, "Chart load failed; keeping previous chart");
            self.failed_task_id = Some(task_id.to_string());
        }
        true
    }

    fn auto_select(&mut self, registry: &TaskRegistry) -> bool {
        if self.selected_task_id.is_some() {
            return false;
        }
        let Some(latest) = registry.selectable().last() else {
            return false;
        };

        info!(task_id = %latest.id, "Auto-selecting completed task");
        self.selected_task_id = Some(latest.id.clone());
        true
    }

    fn next_load(&mut self, registry: &TaskRegistry) -> Option<LoadRequest> {
        let selected = self.selected_task_id.as_deref()?;
        if self.loaded_chart_task_id.as_deref() == Some(selected)
            || self.failed_task_id.as_deref() == Some(selected)
        {
            return None;
        }
        let task = registry.get(selected).filter(|task| task.is_selectable())?;
        self.loading.try_acquire().ok()?;

        debug!(task_id = %task.id, trades = task.trades().len(), "Starting chart load");
        self.loading_task_id = Some(task.id.clone());
        Some(LoadRequest {
            task_id: task.id.clone(),
            query: CandlesQuery {
                exchange: task.exchange.clone(),
                symbol: task.symbol.clone(),
                timeframe: task.timeframe.clone(),
            },
            markers: project_markers(task.trades()),
        })
    }
}
