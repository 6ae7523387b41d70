//! Configuração do servidor lida das variáveis de ambiente.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use cadastro_core::generation::DEFAULT_MODEL_ID;
use cadastro_core::WatsonxConfig;
use tracing::{debug, warn};

/// Carrega um arquivo `.env` no ambiente do processo.
///
/// Variáveis já definidas no ambiente não são sobrescritas. Arquivo ausente
/// não é erro; retorna `true` só quando o arquivo foi lido.
pub fn load_dotenv(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Variáveis carregadas do .env");
            true
        }
        Err(e) if e.not_found() => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Arquivo .env inválido");
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// `None` quando faltam credenciais: a geração fica desabilitada.
    pub watsonx: Option<WatsonxConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca de variáveis.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let watsonx = match (var("WATSONX_URL"), var("WATSONX_PROJECT_ID"), var("WATSONX_APIKEY")) {
            (Some(service_url), Some(project_id), Some(api_key)) => Some(WatsonxConfig {
                service_url,
                project_id,
                api_key,
                model_id: var("WATSONX_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
                insecure_tls: var("WATSONX_INSECURE_TLS")
                    .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "sim"))
                    .unwrap_or(false),
            }),
            _ => None,
        };

        Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000),
            db_path: var("DB_PATH").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("db/data.json")),
            watsonx,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_addr, self.port).parse()
    }
}
