/// NostrGator NIP-05 - identity hosting and verification service
use nostrgator_nip05::{
    config::ServerConfig, context::AppContext, error::Nip05Result, jobs, server,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Nip05Result<()> {
    init_tracing();

    // Print banner
    print_banner();

    // Load configuration
    let config = ServerConfig::load();

    // Create application context
    let ctx = Arc::new(AppContext::new(config)?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

/// Human-readable logs by default, JSON lines when NIP05_LOG_JSON=true
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nostrgator_nip05=debug,tower_http=debug".into());

    let json = std::env::var("NIP05_LOG_JSON")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn print_banner() {
    println!(
        r#"
    _   __           __                  __
   / | / /___  _____/ /_____ _____ _____/ /_____  _____
  /  |/ / __ \/ ___/ __/ __ `/ __ `/ __  __/ __ \/ ___/
 / /|  / /_/ (__  ) /_/ /_/ / /_/ / /_/ /_/ /_/ / /
/_/ |_/\____/____/\__/\__, /\__,_/\__,_/\__/\____/_/
                     /____/
        NIP-05 identity service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
