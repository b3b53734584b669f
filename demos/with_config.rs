use std::time::Duration;
use tickwork::{Scheduler, SchedulerBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tickwork_runtime=debug"))
        .init();

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/config/scheduler.toml");
    let scheduler: Scheduler = SchedulerBuilder::with_toml(path)?.build()?;
    println!("📋 Loaded config: {:?}", scheduler.config());

    scheduler.run_every(Duration::from_secs(1), || async {
        println!("💓 heartbeat");
        Ok(())
    })?;

    // An action that ignores cancellation makes shutdown overrun its window
    scheduler.run_in(Duration::ZERO, || async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    })?;

    tokio::time::sleep(Duration::from_secs(3)).await;
    match scheduler.stop().await {
        Ok(()) => println!("✅ Stopped cleanly"),
        Err(e) => println!("⚠️  {}", e),
    }
    Ok(())
}
