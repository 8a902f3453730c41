use chatflow::config::{self, ClientConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), chatflow::LlmError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    config::load_env();
    let config = ClientConfig::from_env()?;

    println!("Base URL: {}", config.base_url);
    println!("Model: {}", config.model);
    println!("API Key: {}", config::mask_key(Some(&config.api_key)));

    if std::env::var(config::API_KEY_ENV_VAR).is_err() {
        tracing::warn!("{} is not set, using the placeholder key", config::API_KEY_ENV_VAR);
    }
    Ok(())
}
