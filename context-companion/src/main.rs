use context_companion::config::CompanionConfig;
use context_companion::security::users::hash_password;
use context_companion::startup::Application;
use secrecy::Secret;
use service_core::observability::init_tracing;
use std::io::BufRead;

/// `context-companion hash-password` reads a password from stdin and prints
/// the PHC string to put in `security.users[].password_hash`.
fn print_password_hash() -> anyhow::Result<()> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = Secret::new(line.trim_end_matches(['\r', '\n']).to_string());

    println!("{}", hash_password(&password)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("hash-password") {
        return print_password_hash();
    }

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("context-companion", "info", otlp_endpoint.as_deref());

    let config = CompanionConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    tracing::info!(
        environment = %config.common.environment,
        translation = config.features.translation.enabled,
        test_generation = config.features.test_generation.enabled,
        region = %config.aws.region,
        "Configuration loaded"
    );

    let application = Application::build(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start: {}", e))?;
    application.run_until_stopped().await?;

    Ok(())
}
