use chrono::Local;
use std::time::Duration;
use tickwork::{timing, Scheduler, Weekday};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let now = Local::now().naive_local();
    let weekdays = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
    let target = timing::parse_time_of_day("07:30:00").ok_or("bad time")?;
    println!(
        "[{}] ⏰ Next weekday 07:30:00 run in {:?}",
        now.format("%Y-%m-%d %H:%M:%S"),
        timing::time_until_daily_on(now, target, &weekdays)
    );

    let scheduler = Scheduler::builder().build()?;

    scheduler.run_daily("07:30:00", &weekdays, || async {
        println!("[{}] 🌅 [WEEKDAY] Good morning", Local::now().format("%H:%M:%S"));
        Ok(())
    })?;

    scheduler.run_every_minute(0, || async {
        println!("[{}] 🕐 [MINUTE] Top of the minute", Local::now().format("%H:%M:%S"));
        Ok(())
    })?;

    scheduler.run_cron("*/15 * * * * *", || async {
        println!("[{}] 🔄 [CRON] Every 15 seconds", Local::now().format("%H:%M:%S"));
        Ok(())
    })?;

    tokio::time::sleep(Duration::from_secs(70)).await;
    scheduler.stop().await?;
    Ok(())
}
