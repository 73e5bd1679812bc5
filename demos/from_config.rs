//! # Example: from_config
//!
//! Loads chain policies from a TOML file (or the path given as the first argument)
//! and runs the resulting chain once, then on its configured schedule.
//!
//! ## Run
//! ```bash
//! cargo run --example from_config
//! cargo run --example from_config -- path/to/chain.json
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskchain::{Config, LogWriter, Subscribe, SubscriberSet, TaskChain, TaskError, TaskFn, TaskRef};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const SAMPLE: &str = r#"
timeout_ms = 300
max_attempts = 3
retry_on = "retryable"
schedule = "* * * * * *"

[backoff]
first_ms = 50
max_ms = 1000
factor = 2.0
jitter = "equal"
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => {
            let dir = std::env::temp_dir().join("taskchain-demo");
            std::fs::create_dir_all(&dir)?;
            let path = dir.join("chain.toml");
            std::fs::write(&path, SAMPLE)?;
            Config::from_file(&path)?
        }
    };
    println!("loaded: {cfg:?}");

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let task: TaskRef = TaskFn::arc("sync-inventory", move |_ctx: CancellationToken| {
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        async move {
            if n % 2 == 1 {
                return Err(TaskError::fail(format!("upstream busy (call {n})")));
            }
            Ok(())
        }
    });

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let chain = TaskChain::new(task)
        .with_subscribers(SubscriberSet::new(subs))
        .configure(&cfg)?;

    chain.run(CancellationToken::new()).await?;

    if let Some(expr) = cfg.schedule.as_deref() {
        let ctx = CancellationToken::new();
        chain.run_with_cron(ctx.clone(), expr)?;
        time::sleep(Duration::from_millis(3500)).await;
        ctx.cancel();
    }
    println!("task invoked {} times", calls.load(Ordering::Relaxed));
    Ok(())
}
