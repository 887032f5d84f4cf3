//! Concurrent fetch-and-merge.
//!
//! Runs a fixed list of independent fetch tasks at the same time, waits for
//! every one of them to settle, and hands back one [`Outcome`] per task in
//! the order the tasks were given.

use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A named, parameterless unit of asynchronous work.
///
/// The work is not started until [`aggregate`] spawns it. Anything the task
/// needs (credentials, HTTP client, query) must be captured when it is built.
pub struct FetchTask<T> {
    name: String,
    run: Box<dyn FnOnce() -> BoxFuture<'static, Result<T, String>> + Send>,
}

impl<T: Send + 'static> FetchTask<T> {
    /// Wrap an async closure as a task. The error is kept only as its
    /// display text, which becomes the rejection reason.
    pub fn new<F, Fut, E>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(move || {
                Box::pin(async move { f().await.map_err(|e| e.to_string()) })
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for FetchTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTask").field("name", &self.name).finish()
    }
}

/// The settled state of one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Outcome<T> {
    Fulfilled(T),
    Rejected(String),
}

impl<T> Outcome<T> {
    pub fn is_fulfilled(&self) -> bool {
        self.value().is_some()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Fulfilled(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Fulfilled(_) => None,
            Outcome::Rejected(reason) => Some(reason),
        }
    }
}

/// One outcome per input task, same length and order as the input.
pub type AggregationResult<T> = Vec<Outcome<T>>;

/// Run every task concurrently and collect all outcomes in input order.
///
/// A failing (or panicking) task only affects its own slot. This function
/// itself never fails; an empty task list yields an empty result.
pub async fn aggregate<T: Send + 'static>(tasks: Vec<FetchTask<T>>) -> AggregationResult<T> {
    if tasks.is_empty() {
        debug!("Nothing to aggregate");
        return Vec::new();
    }

    let started = Instant::now();
    let total = tasks.len();

    let handles: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let FetchTask { name, run } = task;
            tokio::spawn(async move {
                let task_started = Instant::now();
                let result = run().await;
                match &result {
                    Ok(_) => debug!(
                        "Task {} fulfilled in {}ms",
                        name,
                        task_started.elapsed().as_millis()
                    ),
                    Err(reason) => debug!(
                        "Task {} rejected in {}ms: {}",
                        name,
                        task_started.elapsed().as_millis(),
                        reason
                    ),
                }
                result
            })
        })
        .collect();

    let outcomes: Vec<Outcome<T>> = join_all(handles)
        .await
        .into_iter()
        .enumerate()
        .map(|(index, joined)| match joined {
            Ok(Ok(value)) => Outcome::Fulfilled(value),
            Ok(Err(reason)) => Outcome::Rejected(reason),
            Err(e) => {
                warn!("Task #{} did not complete: {}", index, e);
                Outcome::Rejected(format!("task aborted: {}", e))
            }
        })
        .collect();

    let fulfilled = outcomes.iter().filter(|o| o.is_fulfilled()).count();
    info!(
        "Aggregated {} tasks in {}ms ({} fulfilled, {} rejected)",
        total,
        started.elapsed().as_millis(),
        fulfilled,
        total - fulfilled
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn succeed(name: &str, value: &str, delay_ms: u64) -> FetchTask<String> {
        let value = value.to_string();
        FetchTask::new(name, move || async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<_, String>(value)
        })
    }

    fn fail(name: &str, reason: &str, delay_ms: u64) -> FetchTask<String> {
        let reason = reason.to_string();
        FetchTask::new(name, move || async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Err::<String, _>(reason)
        })
    }

    #[tokio::test]
    async fn test_mixed_outcomes_keep_positions() {
        let tasks = vec![
            succeed("a", "A", 0),
            fail("b", "boom", 0),
            succeed("c", "C", 0),
            succeed("d", "D", 0),
        ];

        let result = aggregate(tasks).await;

        assert_eq!(
            result,
            vec![
                Outcome::Fulfilled("A".to_string()),
                Outcome::Rejected("boom".to_string()),
                Outcome::Fulfilled("C".to_string()),
                Outcome::Fulfilled("D".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_is_input_order_not_completion_order() {
        // Later tasks finish first.
        let tasks = vec![
            succeed("slow", "1", 400),
            succeed("medium", "2", 200),
            succeed("fast", "3", 50),
            succeed("instant", "4", 0),
        ];

        let result = aggregate(tasks).await;
        let values: Vec<_> = result.iter().filter_map(|o| o.value().cloned()).collect();

        assert_eq!(values, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let result: AggregationResult<String> = aggregate(Vec::new()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_all_rejected_still_settles() {
        let tasks = (0..4)
            .map(|i| fail(&format!("t{}", i), &format!("down {}", i), 0))
            .collect();

        let result = aggregate(tasks).await;

        assert_eq!(result.len(), 4);
        for (i, outcome) in result.iter().enumerate() {
            assert_eq!(outcome.reason(), Some(format!("down {}", i).as_str()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wall_clock_bounded_by_slowest_task() {
        let delays = [300u64, 100, 500, 200];
        let tasks = delays
            .iter()
            .enumerate()
            .map(|(i, d)| succeed(&format!("t{}", i), "x", *d))
            .collect();

        let started = tokio::time::Instant::now();
        let result = aggregate(tasks).await;
        let elapsed = started.elapsed();

        assert_eq!(result.len(), 4);
        // Sequential execution would take 1100ms.
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_failure_does_not_hold_back_others() {
        let tasks = vec![
            fail("late", "timed out upstream", 1000),
            succeed("early", "ok", 10),
        ];

        let result = aggregate(tasks).await;

        assert!(!result[0].is_fulfilled());
        assert_eq!(result[1].value().map(String::as_str), Some("ok"));
    }

    #[tokio::test]
    async fn test_panicking_task_is_rejected_in_place() {
        let tasks = vec![
            succeed("a", "A", 0),
            FetchTask::new("explodes", || async {
                if true {
                    panic!("kaboom");
                }
                Ok::<String, String>(String::new())
            }),
            succeed("c", "C", 0),
        ];

        let result = aggregate(tasks).await;

        assert!(result[0].is_fulfilled());
        assert!(result[1].reason().unwrap().starts_with("task aborted"));
        assert!(result[2].is_fulfilled());
    }

    #[tokio::test]
    async fn test_repeatable_for_pure_tasks() {
        let build = || {
            vec![
                succeed("a", "A", 0),
                fail("b", "nope", 0),
                succeed("c", "C", 0),
            ]
        };

        let first = aggregate(build()).await;
        let second = aggregate(build()).await;

        assert_eq!(first, second);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let ok: Outcome<u32> = Outcome::Fulfilled(7);
        let err: Outcome<u32> = Outcome::Rejected("bad".to_string());

        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"status":"fulfilled","value":7}"#
        );
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"status":"rejected","value":"bad"}"#
        );
    }
}
