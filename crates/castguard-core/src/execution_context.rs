// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CastguardError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Outer-loop budgets for one remediation request.
///
/// The greedy search is naturally bounded by
/// `priority_list_len * max_iterations_per_var` classifier calls; these
/// limits guarantee termination even for pathological configurations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Constraints {
    pub max_classifier_calls: Option<usize>,
    pub time_budget_ms: Option<u64>,
}

/// What to do when a budget runs out mid-search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetMode {
    /// Fail the request with a resource-limit error.
    HardFail,
    /// End the search early and return the best result reached so far.
    SoftDegrade,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetStatus {
    WithinBudget,
    ExceededSoftDegrade,
}

/// Shareable cancellation flag for long-running searches.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Progress callback for request-scoped observability.
pub trait ProgressSink {
    fn on_progress(&self, fraction: f32);
}

/// Scalar telemetry callback (classifier call counts, accepted improvements).
pub trait TelemetrySink {
    fn record_scalar(&self, key: &'static str, value: f64);
}

/// Unified execution context threaded through remediation calls.
pub struct ExecutionContext<'a> {
    pub constraints: &'a Constraints,
    pub cancel: Option<&'a CancelToken>,
    pub budget_mode: BudgetMode,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with safe defaults and no optional hooks.
    pub fn new(constraints: &'a Constraints) -> Self {
        Self {
            constraints,
            cancel: None,
            budget_mode: BudgetMode::HardFail,
            progress: None,
            telemetry: None,
        }
    }

    /// Sets the optional cancellation token.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the budget mode.
    pub fn with_budget_mode(mut self, budget_mode: BudgetMode) -> Self {
        self.budget_mode = budget_mode;
        self
    }

    /// Sets an optional progress sink.
    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets an optional telemetry sink.
    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Returns true when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Returns a cancelled error when cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), CastguardError> {
        if self.is_cancelled() {
            return Err(CastguardError::cancelled());
        }
        Ok(())
    }

    /// Checks the classifier-call budget and reports status per mode.
    pub fn check_call_budget(&self, calls: usize) -> Result<BudgetStatus, CastguardError> {
        let Some(limit) = self.constraints.max_classifier_calls else {
            return Ok(BudgetStatus::WithinBudget);
        };

        if calls <= limit {
            return Ok(BudgetStatus::WithinBudget);
        }

        match self.budget_mode {
            BudgetMode::HardFail => Err(CastguardError::resource_limit(format!(
                "constraints.max_classifier_calls exceeded: used={calls}, limit={limit}, budget_mode=HardFail"
            ))),
            BudgetMode::SoftDegrade => Ok(BudgetStatus::ExceededSoftDegrade),
        }
    }

    /// Checks the elapsed time budget and reports status per mode.
    pub fn check_time_budget(&self, started_at: Instant) -> Result<BudgetStatus, CastguardError> {
        let Some(limit_ms) = self.constraints.time_budget_ms else {
            return Ok(BudgetStatus::WithinBudget);
        };

        let elapsed_ms = started_at.elapsed().as_millis();
        if elapsed_ms <= u128::from(limit_ms) {
            return Ok(BudgetStatus::WithinBudget);
        }

        match self.budget_mode {
            BudgetMode::HardFail => Err(CastguardError::resource_limit(format!(
                "constraints.time_budget_ms exceeded: elapsed_ms={elapsed_ms}, limit_ms={limit_ms}, budget_mode=HardFail"
            ))),
            BudgetMode::SoftDegrade => Ok(BudgetStatus::ExceededSoftDegrade),
        }
    }

    /// Emits clamped progress to the sink, if configured.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }

        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    /// Emits a scalar telemetry value to the sink, if configured.
    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}
