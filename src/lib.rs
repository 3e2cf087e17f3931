pub mod api;
pub mod config;
pub mod pipeline;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use config::{ProviderConfig, ServiceConfig};
use pipeline::{DictionaryError, Simplifier, TerminologyDictionary};
use provider::{LlmClient, OllamaClient, OpenAiClient, ProviderError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("Cannot load terminology dictionary: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Server(#[from] api::ServerError),

    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Start the service and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;
    let dictionary = Arc::new(load_dictionary(&config)?);

    let mut simplifier = Simplifier::new(dictionary);
    match build_provider(&config.provider, config.provider_timeout).await {
        Ok(Some(client)) => {
            tracing::info!(provider = client.name(), model = client.model(), "AI provider configured");
            simplifier = simplifier.with_provider(client, config.provider_timeout);
        }
        Ok(None) => tracing::info!("No AI provider configured, using the local pipeline only"),
        Err(e) => tracing::warn!(
            provider = config.provider.label(),
            error = %e,
            "AI provider unavailable, using the local pipeline only"
        ),
    }

    let ctx = api::ApiContext::new(Arc::new(simplifier));
    let server = api::start_server_on(ctx, config.addr).await?;
    tracing::info!(addr = %server.session.server_addr, "{} ready", config::APP_NAME);

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    tracing::info!("Shutdown requested");
    server.stop().await;

    Ok(())
}

fn load_dictionary(config: &ServiceConfig) -> Result<TerminologyDictionary, DictionaryError> {
    match &config.dictionary_path {
        Some(path) => {
            let dictionary = TerminologyDictionary::builtin_with_file(path)?;
            tracing::info!(path = %path.display(), terms = dictionary.len(), "Terminology dictionary loaded");
            Ok(dictionary)
        }
        None => Ok(TerminologyDictionary::builtin()),
    }
}

async fn build_provider(
    provider: &ProviderConfig,
    timeout: Duration,
) -> Result<Option<Arc<dyn LlmClient>>, ProviderError> {
    match provider {
        ProviderConfig::None => Ok(None),
        ProviderConfig::OpenAi {
            base_url,
            api_key,
            model,
        } => {
            let client: Arc<dyn LlmClient> =
                Arc::new(OpenAiClient::new(base_url, api_key, model, timeout)?);
            Ok(Some(client))
        }
        ProviderConfig::Ollama { url, model } => {
            let client = OllamaClient::new(url, timeout)?;
            let client = match model {
                Some(model) => client.with_model(model.clone()),
                None => {
                    if let Err(e) = client.resolve_model().await {
                        tracing::warn!(
                            url = %url,
                            error = %e,
                            "Ollama model detection failed, retrying on the next request"
                        );
                    }
                    client
                }
            };
            let client: Arc<dyn LlmClient> = Arc::new(client);
            Ok(Some(client))
        }
    }
}
