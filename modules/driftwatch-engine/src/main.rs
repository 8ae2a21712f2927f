use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_client::ChatClient;
use driftwatch_common::Config;
use driftwatch_engine::registry::SessionRegistry;
use driftwatch_engine::session::{self, SessionOptions};
use driftwatch_engine::sources::ApiTimelineSource;
use driftwatch_engine::traits::Generator;
use driftwatch_store::SessionPaths;
use timeline_client::TimelineClient;

#[derive(Parser)]
#[command(name = "driftwatch", about = "Watch a public timeline and narrate its drift")]
struct Args {
    /// Account handle to watch
    account: String,

    /// Override the configured number of collection passes
    #[arg(long)]
    passes: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Driftwatch starting...");

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(passes) = args.passes {
        config.collect_passes = passes;
    }
    config.log_redacted();

    let timeline = TimelineClient::new(config.timeline_api_token.clone());
    let source = ApiTimelineSource::new(
        timeline,
        &args.account,
        config.page_size,
        config.collect_passes,
    );

    let mut chat = ChatClient::new(&config.chat_api_url, &config.chat_model);
    if let Some(ref key) = config.chat_api_key {
        chat = chat.with_api_key(key);
    }
    let generator: Arc<dyn Generator> = Arc::new(chat);

    let registry = SessionRegistry::new();
    let paths = SessionPaths::for_account(&args.account);
    let handle = session::start(
        &args.account,
        source,
        generator,
        paths,
        SessionOptions::from(&config),
    )?;
    registry.register(handle)?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, stopping session");
            registry.stop_all();
        }
        _ = wait_until_drained(&registry, &args.account) => {}
    }

    if let Some(handle) = registry.take(&args.account) {
        let stats = handle.wait().await?;
        info!("Session complete. {stats}");
    }

    Ok(())
}

/// Poll the registry until the account's annotation worker has drained,
/// the same signal a live observer uses to decide whether to keep watching.
async fn wait_until_drained(registry: &SessionRegistry, account: &str) {
    loop {
        if registry.is_drained(account).unwrap_or(true) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}
