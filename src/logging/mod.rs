//! Structured logging helpers: correlation ids, timed operation scopes,
//! and retry events, emitted through `tracing`.

use std::time::{Duration, Instant};

/// Generate a correlation id for scoping related log events.
pub fn correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Timed scope around one logical operation.
///
/// Emits a start event on construction and a completion event with the
/// elapsed milliseconds when finished (or dropped without an explicit
/// outcome, which is reported as completed).
///
/// # Example
/// ```
/// use gantry::logging::{correlation_id, OperationScope};
///
/// let scope = OperationScope::start("token_refresh", correlation_id());
/// // ... do the work ...
/// scope.finish(true);
/// ```
pub struct OperationScope {
    operation: String,
    correlation_id: String,
    started: Instant,
    finished: bool,
}

impl OperationScope {
    pub fn start(operation: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        let operation = operation.into();
        let correlation_id = correlation_id.into();
        tracing::info!(
            operation = %operation,
            correlation_id = %correlation_id,
            "operation started"
        );
        Self {
            operation,
            correlation_id,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Time elapsed since the scope was opened.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Close the scope, reporting success or failure.
    pub fn finish(mut self, success: bool) {
        self.emit(success);
        self.finished = true;
    }

    fn emit(&self, success: bool) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        if success {
            tracing::info!(
                operation = %self.operation,
                correlation_id = %self.correlation_id,
                elapsed_ms,
                "operation completed"
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                correlation_id = %self.correlation_id,
                elapsed_ms,
                "operation failed"
            );
        }
    }
}

impl Drop for OperationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(true);
            self.finished = true;
        }
    }
}

/// Record one retry attempt for an operation.
pub fn log_retry_attempt(
    operation: &str,
    correlation_id: &str,
    attempt: u32,
    max_attempts: u32,
    delay: Duration,
) {
    tracing::warn!(
        operation = %operation,
        correlation_id = %correlation_id,
        attempt,
        max_attempts,
        delay_ms = delay.as_millis() as u64,
        "retrying after error"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_unique() {
        assert_ne!(correlation_id(), correlation_id());
    }

    #[test]
    fn scope_tracks_elapsed_time() {
        let scope = OperationScope::start("test_op", correlation_id());
        std::thread::sleep(Duration::from_millis(5));
        assert!(scope.elapsed() >= Duration::from_millis(5));
        scope.finish(true);
    }

    #[test]
    fn dropped_scope_does_not_panic() {
        let _scope = OperationScope::start("dropped_op", correlation_id());
    }
}
