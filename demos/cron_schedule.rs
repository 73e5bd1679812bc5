//! # Example: cron_schedule
//!
//! Runs a chain every two seconds on a cron schedule, switches it to a fixed
//! interval, and stops it when the outer context is cancelled.
//!
//! ## Flow
//! ```text
//! run_with_cron(ctx, "*/2 * * * * *")   SchedulerStarted
//!   ├─► TickFired → run (fire-and-forget)
//!   └─► ...
//! run_every(ctx, 500ms)                 previous schedule stopped, new one started
//! ctx.cancel()                          watcher stops the loop → SchedulerStopped
//! stop_cron() ×2                        no-ops
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example cron_schedule
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskchain::{LogWriter, Subscribe, SubscriberSet, TaskChain, TaskError};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let chain = TaskChain::from_fn("heartbeat", |_ctx: CancellationToken| async {
        println!("[heartbeat] {}", chrono::Utc::now().format("%H:%M:%S%.3f"));
        Ok::<_, TaskError>(())
    })
    .with_subscribers(SubscriberSet::new(subs))
    .timeout(Duration::from_secs(1));

    if let Err(e) = chain.run_with_cron(CancellationToken::new(), "every two seconds") {
        println!("rejected: {e}");
    }

    let ctx = CancellationToken::new();
    chain.run_with_cron(ctx.clone(), "*/2 * * * * *")?;
    time::sleep(Duration::from_secs(5)).await;
    println!("ticks on cron schedule: {:?}", chain.ticks());

    chain.run_every(ctx.clone(), Duration::from_millis(500))?;
    time::sleep(Duration::from_secs(2)).await;
    println!("ticks on interval schedule: {:?}", chain.ticks());

    ctx.cancel();
    time::sleep(Duration::from_millis(50)).await;
    println!("scheduled after cancel: {}", chain.is_scheduled());

    chain.stop_cron();
    chain.stop_cron();
    Ok(())
}
