//! Servidor web Axum do cadastro: CRUD de itens e comandos em linguagem natural

mod config;
mod routes;

use std::sync::Arc;

use cadastro_core::{DisabledGenerator, GenerationService, JsonFileStore, WatsonxClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::routes::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = config::load_dotenv(std::path::Path::new(".env"));
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if dotenv_loaded {
        info!("Variáveis de ambiente complementadas pelo .env");
    }
    let config = ServerConfig::from_env();
    let store = Arc::new(JsonFileStore::new(&config.db_path));
    info!(path = %store.path().display(), "Cadastro em arquivo JSON");

    let generator: Arc<dyn GenerationService> = match config.watsonx.clone() {
        Some(wx) => match WatsonxClient::new(wx) {
            Ok(client) => {
                info!("Geração de texto via watsonx.ai habilitada");
                Arc::new(client)
            }
            Err(e) => {
                warn!(error = %e, "Cliente watsonx.ai indisponível, geração desabilitada");
                Arc::new(DisabledGenerator)
            }
        },
        None => {
            warn!("Credenciais WATSONX ausentes, narração usará mensagens padrão");
            Arc::new(DisabledGenerator)
        }
    };

    let app = router(Arc::new(AppState::new(store, generator)));

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Servidor do cadastro iniciado em http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
