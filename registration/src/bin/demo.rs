//! Activity Registration Demo
//!
//! Walks through the registration engine against the configured catalog:
//! - Signing up, duplicate and full-roster rejections
//! - Withdrawing and re-registering
//! - A concurrent burst against one activity
//! - Roster events delivered to a subscriber
//!
//! # Usage
//!
//! ```bash
//! # Built-in school catalog
//! cargo run --bin registration-demo
//!
//! # Custom catalog, verbose logs
//! REGISTRATION_CATALOG_PATH=activities.json RUST_LOG=debug cargo run --bin registration-demo
//! ```

use activity_registration::metrics::MetricsRecorder;
use activity_registration::{EngineConfig, ErrorPayload, RegistrationEngine, RosterAction, RosterEnvironment};
use activity_registration_core::environment::SystemClock;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BURST_ACTIVITY: &str = "Math Olympiad";
const BURST_SIZE: usize = 25;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let config = EngineConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},activity_registration=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut recorder = MetricsRecorder::new();
    if config.metrics_enabled {
        recorder.install()?;
    }

    println!("\n📋 ============================================");
    println!("   Activity Registration - Live Demo");
    println!("============================================\n");

    let engine = RegistrationEngine::from_config(&config, RosterEnvironment::new(Arc::new(SystemClock)))?;
    let mut events = engine.subscribe();

    println!("Catalog:");
    for view in engine.list_activities().await {
        println!(
            "   {:<20} {:>2}/{:<2} {}",
            view.name.as_str(),
            view.participant_count,
            view.capacity.value(),
            view.schedule
        );
    }
    println!();

    // Step 1: sign up, then try again
    let Some(first) = engine.catalog().iter().next().map(|metadata| metadata.name.clone()) else {
        println!("Catalog is empty, nothing to demo.");
        return Ok(());
    };
    let activity = first.as_str();

    println!("1️⃣  Signing up newstudent@mergington.edu for {activity}...");
    let receipt = engine.register(activity, "newstudent@mergington.edu").await?;
    println!("   ✓ {} ({} registered)", receipt.message, receipt.participant_count);

    println!("2️⃣  Signing up the same student again...");
    match engine.register(activity, "newstudent@mergington.edu").await {
        Ok(receipt) => println!("   ✗ Unexpectedly accepted: {}", receipt.message),
        Err(error) => println!(
            "   ✓ Rejected with {}: {}",
            error.status_code(),
            ErrorPayload::from(&error).detail
        ),
    }

    // Step 2: withdraw and re-register
    println!("3️⃣  Withdrawing and registering again...");
    let receipt = engine.withdraw(activity, "newstudent@mergington.edu").await?;
    println!("   ✓ {}", receipt.message);
    let receipt = engine.register(activity, "newstudent@mergington.edu").await?;
    println!("   ✓ {}", receipt.message);

    // Step 3: concurrent burst
    if let Some(metadata) = engine.catalog().lookup(BURST_ACTIVITY) {
        println!(
            "4️⃣  {BURST_SIZE} students race for {} open spots in {BURST_ACTIVITY}...",
            metadata.capacity.as_usize().saturating_sub(metadata.seed.len())
        );

        let handles: Vec<_> = (0..BURST_SIZE)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .register(BURST_ACTIVITY, &format!("racer{i}@mergington.edu"))
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await? {
                accepted += 1;
            }
        }
        let view = engine.activity(BURST_ACTIVITY).await?;
        println!(
            "   ✓ {accepted} accepted, roster at {}/{}",
            view.participant_count, view.capacity
        );
    }

    // Step 4: reset and drain events
    println!("5️⃣  Resetting all rosters...");
    engine.reset().await;

    let mut registered = 0;
    let mut withdrawn = 0;
    let mut resets = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            RosterAction::ParticipantRegistered { .. } => registered += 1,
            RosterAction::ParticipantWithdrawn { .. } => withdrawn += 1,
            RosterAction::RosterReset { .. } => resets += 1,
            _ => {}
        }
    }
    println!("   ✓ Events seen: {registered} registered, {withdrawn} withdrawn, {resets} reset\n");

    if let Some(rendered) = recorder.render() {
        println!("Metrics:\n{rendered}");
    }

    Ok(())
}
