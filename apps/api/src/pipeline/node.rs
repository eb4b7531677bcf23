//! Node executor: runs a pipeline's static node order and provides the
//! bounded-retry wrapper used by the scoring step.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::pipeline::state::{ErrorLog, EvaluationState, ExtractionState};

/// Access to the error accumulator every pipeline state carries.
pub trait PipelineState: Send {
    fn errors(&self) -> &ErrorLog;
}

impl PipelineState for ExtractionState {
    fn errors(&self) -> &ErrorLog {
        &self.errors
    }
}

impl PipelineState for EvaluationState {
    fn errors(&self) -> &ErrorLog {
        &self.errors
    }
}

/// A pipeline made of a fixed, ordered list of nodes over an owned state.
///
/// Nodes are infallible from the executor's point of view: a node that hits a
/// degraded condition records it in the state's error log and returns.
#[async_trait]
pub trait NodeSequence: Send + Sync {
    type State: PipelineState;
    type Node: Copy + Debug + Send + Sync + 'static;

    fn sequence(&self) -> &'static [Self::Node];

    fn node_name(node: Self::Node) -> &'static str;

    async fn execute(&self, node: Self::Node, state: Self::State) -> Self::State;
}

/// Runs every node of `pipeline` in order, passing ownership of the state along.
pub async fn run_sequence<P: NodeSequence>(pipeline: &P, mut state: P::State) -> P::State {
    for &node in pipeline.sequence() {
        let name = P::node_name(node);
        let errors_before = state.errors().len();
        let started = Instant::now();

        state = pipeline.execute(node, state).await;

        let new_errors = state.errors().len() - errors_before;
        if new_errors > 0 {
            warn!(node = name, new_errors, "node degraded");
        }
        debug!(
            node = name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "node completed"
        );
    }
    state
}

/// Result of a retried operation. Exhaustion is a value, not a panic or early return,
/// so the caller decides which fallback applies.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. } | RetryOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Calls `op` up to `max_attempts` times (at least once), immediately and without backoff,
/// stopping at the first success. `op` receives the 1-based attempt number.
pub async fn with_retry<T, E, F, Fut>(
    node: &'static str,
    max_attempts: u32,
    mut op: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                }
            }
            Err(error) if attempt >= max_attempts => {
                warn!(node, attempt, max_attempts, "all attempts failed: {error}");
                return RetryOutcome::Exhausted {
                    error,
                    attempts: attempt,
                };
            }
            Err(error) => {
                warn!(node, attempt, max_attempts, "attempt failed, retrying: {error}");
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::models::candidate::CandidateIdentity;

    #[tokio::test]
    async fn test_retry_stops_at_first_success() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<u32, String> = with_retry("score", 2, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(attempt) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            outcome,
            RetryOutcome::Succeeded {
                value: 1,
                attempts: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_second_attempt() {
        let outcome: RetryOutcome<&str, String> = with_retry("score", 2, |attempt| async move {
            if attempt == 1 {
                Err("invalid json".to_string())
            } else {
                Ok("parsed")
            }
        })
        .await;

        assert_eq!(outcome.attempts(), 2);
        assert!(matches!(
            outcome,
            RetryOutcome::Succeeded {
                value: "parsed",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_retry_exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<(), String> = with_retry("score", 2, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("failure {attempt}")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match outcome {
            RetryOutcome::Exhausted { error, attempts } => {
                assert_eq!(attempts, 2);
                assert_eq!(error, "failure 2");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_max_attempts_still_calls_once() {
        let outcome: RetryOutcome<(), String> =
            with_retry("score", 0, |_| async { Err("nope".to_string()) }).await;
        assert_eq!(outcome.attempts(), 1);
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Append,
        Degrade,
    }

    struct Recorder;

    #[async_trait]
    impl NodeSequence for Recorder {
        type State = ExtractionState;
        type Node = Step;

        fn sequence(&self) -> &'static [Step] {
            &[Step::Append, Step::Degrade, Step::Append]
        }

        fn node_name(node: Step) -> &'static str {
            match node {
                Step::Append => "append",
                Step::Degrade => "degrade",
            }
        }

        async fn execute(&self, node: Step, mut state: ExtractionState) -> ExtractionState {
            match node {
                Step::Append => state.summary.push('x'),
                Step::Degrade => state.errors.record("degraded"),
            }
            state
        }
    }

    #[tokio::test]
    async fn test_run_sequence_visits_nodes_in_order() {
        let state = ExtractionState::new(CandidateIdentity::default(), "");
        let state = run_sequence(&Recorder, state).await;
        assert_eq!(state.summary, "xx");
        assert_eq!(state.errors.as_slice(), ["degraded"]);
    }
}
