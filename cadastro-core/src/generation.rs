//! # Serviço de Geração de Texto
//!
//! Contrato ([`GenerationService`]) para o modelo de linguagem remoto que
//! narra os resultados, e duas implementações:
//!
//! - [`WatsonxClient`]: IBM watsonx.ai (modelo Granite) via HTTP. A chave
//!   de API é trocada por um token IAM, guardado até pouco antes de expirar.
//! - [`DisabledGenerator`]: usado quando não há credenciais; toda chamada
//!   falha com [`GenerationError::NotConfigured`].
//!
//! Nenhuma das implementações limita a latência: quem chama impõe o próprio
//! timeout (ver [`narrator`](crate::narrator)).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::GenerationError;

const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";
const API_VERSION: &str = "2024-02-15";
pub const DEFAULT_MODEL_ID: &str = "ibm/granite-13b-instruct-v2";

/// Margem antes da expiração em que o token IAM é renovado.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Parâmetros de uma geração.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 250,
            temperature: 0.7,
        }
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String, GenerationError>;
}

/// Gerador ausente: sempre `NotConfigured`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl GenerationService for DisabledGenerator {
    async fn generate(&self, _prompt: &str, _options: GenerationOptions) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// Credenciais e destino do watsonx.ai.
#[derive(Debug, Clone)]
pub struct WatsonxConfig {
    pub service_url: String,
    pub project_id: String,
    pub api_key: String,
    pub model_id: String,
    /// Aceita certificados inválidos. Só para desenvolvimento.
    pub insecure_tls: bool,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    results: Vec<GenerationResult>,
}

#[derive(Deserialize)]
struct GenerationResult {
    #[serde(default)]
    generated_text: Option<String>,
}

pub struct WatsonxClient {
    http: reqwest::Client,
    config: WatsonxConfig,
    token: Mutex<Option<CachedToken>>,
}

impl WatsonxClient {
    pub fn new(config: WatsonxConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    async fn bearer_token(&self) -> Result<String, GenerationError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http
            .post(IAM_TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GenerationError::Auth(format!("IAM respondeu {}", response.status())));
        }
        let body: IamTokenResponse = response.json().await?;

        let lifetime = Duration::from_secs(body.expires_in.unwrap_or(3600));
        let expires_at = Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN);
        debug!(expira_em_s = lifetime.as_secs(), "Token IAM renovado");
        *cached = Some(CachedToken {
            value: body.access_token.clone(),
            expires_at,
        });
        Ok(body.access_token)
    }

    fn generation_url(&self) -> String {
        format!(
            "{}/ml/v1/text/generation?version={}",
            self.config.service_url.trim_end_matches('/'),
            API_VERSION
        )
    }
}

#[async_trait]
impl GenerationService for WatsonxClient {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String, GenerationError> {
        let token = self.bearer_token().await?;
        let body = json!({
            "input": prompt,
            "model_id": self.config.model_id,
            "project_id": self.config.project_id,
            "parameters": {
                "max_new_tokens": options.max_tokens,
                "temperature": options.temperature,
                "top_p": 0.9,
            },
        });

        let response = self
            .http
            .post(self.generation_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream(format!("{}: {}", status, detail)));
        }

        let parsed: GenerationResponse = response.json().await?;
        Ok(parsed
            .results
            .into_iter()
            .next()
            .and_then(|r| r.generated_text)
            .unwrap_or_default())
    }
}
