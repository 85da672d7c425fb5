mod cli;

use pulse_dash::{Dashboard, Session};
use pulse_proto::config::Config;
use pulse_proto::platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("tubepulse.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("tubepulse log: {}", log_path.display());
    tracing::info!("tubepulse starting…");

    let config = Config::load().unwrap_or_default();

    // Credentials: environment wins over the config file. Issuing the token
    // is the auth service's job; we only carry it.
    let token = std::env::var("TUBEPULSE_TOKEN").unwrap_or_else(|_| config.session.token.clone());
    let channel_name =
        std::env::var("TUBEPULSE_CHANNEL").unwrap_or_else(|_| config.session.channel_name.clone());
    if token.is_empty() || channel_name.is_empty() {
        anyhow::bail!(
            "no session: set TUBEPULSE_TOKEN and TUBEPULSE_CHANNEL or fill [session] in {}",
            Config::config_path().display()
        );
    }

    let session = Session {
        token,
        channel_name,
    };
    let dashboard = Dashboard::new(&config, session)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    cli::run(&dashboard, &config, &args).await
}
