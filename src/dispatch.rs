//! Bounded-concurrency batch execution.
//!
//! `process_in_batches` is the generic executor: items are processed in
//! consecutive chunks of `concurrency_limit`, every operation in a chunk
//! runs concurrently, and the next chunk starts only after the previous
//! one has fully settled. That chunk barrier is what bounds the number of
//! in-flight calls.
//!
//! Failure isolation contract: an operation is expected to catch its own
//! per-item errors (recording them in the shared batch state) and return
//! `Ok`. An `Err` or a panic escaping an operation is catastrophic: the
//! remaining chunks are abandoned and the error propagates, but whatever
//! the finished operations already merged stays visible to the caller.

use crate::contexts::ModelClient;
use crate::merge::{BatchState, lock_state};
use crate::prompt;
use crate::protocol::{self, ModificationInstruction};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Runs `operation` over `items`, at most `concurrency_limit` at a time.
///
/// `on_progress(completed, total)` fires once per completed chunk with the
/// running cumulative count. Results are returned in item order.
pub async fn process_in_batches<T, R, F, Fut, P>(
    items: Vec<T>,
    concurrency_limit: usize,
    operation: F,
    mut on_progress: P,
) -> Result<Vec<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: Send + 'static,
    P: FnMut(usize, usize),
{
    let limit = concurrency_limit.max(1);
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut completed = 0usize;

    let mut remaining = items.into_iter();
    loop {
        let mut handles = Vec::with_capacity(limit);
        for item in remaining.by_ref().take(limit) {
            handles.push(tokio::task::spawn(operation(item)));
        }
        if handles.is_empty() {
            break;
        }
        let chunk_len = handles.len();
        for handle in handles {
            let result = handle.await.context("batch worker panicked")??;
            results.push(result);
        }
        completed += chunk_len;
        on_progress(completed, total);
    }

    Ok(results)
}

/// Dispatches reconciled instructions to the level 2 model and merges each
/// result into the shared batch state.
///
/// Per-item failures (transport errors, bad statuses) are recorded via
/// [`BatchState::flag_error`] and never stop sibling instructions; the
/// batch ends "completed with errors" instead. The caller keeps its own
/// handle on `state`, so partial progress survives even a catastrophic
/// abort.
pub async fn run_modification_batch<C>(
    instructions: Vec<ModificationInstruction>,
    thread_count: usize,
    client: Arc<C>,
    state: Arc<Mutex<BatchState>>,
    on_progress: impl FnMut(usize, usize),
) -> Result<()>
where
    C: ModelClient + 'static,
{
    process_in_batches(
        instructions,
        thread_count,
        move |instruction| {
            let client = client.clone();
            let state = state.clone();
            async move {
                let request = prompt::render_level2_prompt(&instruction);
                match client.generate(&request).await {
                    Ok(raw) => {
                        let content = protocol::parse_level2_output(&raw);
                        lock_state(&state).apply(&instruction, Some(content));
                    }
                    Err(err) => {
                        eprintln!("✗ {}: {}", instruction.file_path, err);
                        lock_state(&state)
                            .flag_error(format!("{}: {}", instruction.file_path, err));
                    }
                }
                Ok(())
            }
        },
        on_progress,
    )
    .await
    .map(|_| ())
}
