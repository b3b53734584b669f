use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tickwork::Scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("🚀 Demonstrating run_every, run_in and cancellation...\n");

    let scheduler = Scheduler::builder().build()?;
    let counter = Arc::new(AtomicU32::new(0));

    let fast = {
        let counter = counter.clone();
        scheduler.run_every(Duration::from_millis(500), move || {
            let counter = counter.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                println!("[FAST-MS] Execution #{} (every 500ms)", count);
                Ok(())
            }
        })?
    };

    scheduler.run_in(Duration::from_secs(2), || async {
        println!("[ONCE] Two seconds after start");
        Ok(())
    })?;

    let never = scheduler.run_in(Duration::from_secs(3), || async {
        println!("❌ [CANCELLED] This should never run");
        Ok(())
    })?;
    never.cancel();

    // Run for 5 seconds to see the pattern
    tokio::time::sleep(Duration::from_secs(5)).await;
    fast.cancel();
    println!("\n[FAST-MS] ended with {:?}", fast.await);

    scheduler.stop().await?;
    println!("   Cancelled task ended with {:?}", never.await);
    println!("   Fast task executions: {}", counter.load(Ordering::SeqCst));
    println!("   Expected: ~10 times (5000ms / 500ms)\n");

    Ok(())
}
