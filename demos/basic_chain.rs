//! # Example: basic_chain
//!
//! Builds a chain around a flaky task: each attempt is bounded by a timeout, failed
//! attempts are retried with exponential backoff, and a completion hook reports the
//! final outcome.
//!
//! ## Flow
//! ```text
//! Completion ─► Retry(4, 100ms × 2^n) ─► Timeout(200ms) ─► flaky
//!
//! attempt 1 → Err("boom #1")            BackoffScheduled{100ms}
//! attempt 2 → hangs, TimeoutHit         BackoffScheduled{200ms}
//! attempt 3 → Ok                        TaskSucceeded → on_success()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic_chain
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskchain::{
    BackoffPolicy, CompletionHooks, JitterPolicy, LogWriter, Retryable, Subscribe, SubscriberSet,
    TaskChain, TaskError,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

static ATTEMPTS: AtomicU32 = AtomicU32::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let backoff = BackoffPolicy {
        first: Duration::from_millis(100),
        max: Duration::from_secs(2),
        factor: 2.0,
        jitter: JitterPolicy::None,
    };

    let chain = TaskChain::from_fn("flaky", |ctx: CancellationToken| async move {
        let attempt = ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
        match attempt {
            1 => Err(TaskError::fail(format!("boom #{attempt}"))),
            2 => {
                // Hangs until the timeout cancels its context.
                ctx.cancelled().await;
                Err(TaskError::Canceled)
            }
            _ => Ok(()),
        }
    })
    .with_subscribers(SubscriberSet::new(subs))
    .timeout(Duration::from_millis(200))
    .retry(4, backoff, Retryable)?
    .with_completion(
        CompletionHooks::new()
            .on_success(|| println!("[hook] flaky finished"))
            .on_failure(|err| println!("[hook] flaky gave up: {err}")),
    );

    chain.run(CancellationToken::new()).await?;
    println!("done after {} attempts", ATTEMPTS.load(Ordering::Relaxed));
    Ok(())
}
