//! Task execution strategies.
//!
//! The scheduler only decides *when* tasks run; what a task does is supplied
//! by the caller as a runner closure. Runners report failure through their
//! [`TaskResult`], and a runner that panics is recorded as a failure as well,
//! so one bad icon never stops a run.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;

use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};

use crate::plan::ConversionTask;
use crate::stats::{ResultAggregator, TaskResult};

/// Number of tasks in flight at once in [`ExecutionMode::Batched`].
pub const BATCH_SIZE: usize = 4;

/// How to run the planned tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One task at a time, in planned order.
    #[default]
    Sequential,
    /// Contiguous groups of [`BATCH_SIZE`] run concurrently; each group
    /// settles before the next starts.
    Batched,
}

/// Runs every task and returns one result per task, in task order.
///
/// Each result is recorded in `aggregator` as soon as its task settles, so
/// within a batch the recording order is completion order.
pub async fn execute<F, Fut>(
    tasks: Vec<ConversionTask>,
    mode: ExecutionMode,
    aggregator: &mut ResultAggregator,
    runner: F,
) -> Vec<TaskResult>
where
    F: Fn(ConversionTask) -> Fut,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    match mode {
        ExecutionMode::Sequential => execute_sequential(tasks, aggregator, runner).await,
        ExecutionMode::Batched => execute_batched(tasks, aggregator, runner).await,
    }
}

async fn execute_sequential<F, Fut>(
    tasks: Vec<ConversionTask>,
    aggregator: &mut ResultAggregator,
    runner: F,
) -> Vec<TaskResult>
where
    F: Fn(ConversionTask) -> Fut,
    Fut: Future<Output = TaskResult>,
{
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        let output = task.output_path.clone();
        let result = AssertUnwindSafe(runner(task))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| aborted(&output, &panic_message(payload.as_ref())));
        aggregator.record(&result);
        results.push(result);
    }
    results
}

async fn execute_batched<F, Fut>(
    tasks: Vec<ConversionTask>,
    aggregator: &mut ResultAggregator,
    runner: F,
) -> Vec<TaskResult>
where
    F: Fn(ConversionTask) -> Fut,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    let batch_count = tasks.len().div_ceil(BATCH_SIZE);
    let mut results = Vec::with_capacity(tasks.len());
    let mut pending = tasks.into_iter().peekable();
    let mut batch_number = 0;

    while pending.peek().is_some() {
        batch_number += 1;
        let batch: Vec<_> = pending.by_ref().take(BATCH_SIZE).collect();
        tracing::debug!(
            batch = batch_number,
            of = batch_count,
            size = batch.len(),
            "dispatching batch"
        );

        let mut settled: Vec<Option<TaskResult>> = vec![None; batch.len()];
        let mut in_flight: FuturesUnordered<_> = batch
            .into_iter()
            .enumerate()
            .map(|(slot, task)| {
                let output = task.output_path.clone();
                let handle = tokio::spawn(runner(task));
                async move { (slot, output, handle.await) }
            })
            .collect();

        while let Some((slot, output, joined)) = in_flight.next().await {
            let result = joined.unwrap_or_else(|e| aborted(&output, &e.to_string()));
            aggregator.record(&result);
            settled[slot] = Some(result);
        }

        results.extend(settled.into_iter().flatten());
    }

    results
}

fn aborted(output: &Path, reason: &str) -> TaskResult {
    tracing::error!(output = %output.display(), "task aborted: {reason}");
    TaskResult::failed(None, format!("{}: task aborted: {reason}", output.display()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked with message {message:?}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked with message {message:?}")
    } else {
        "task panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
