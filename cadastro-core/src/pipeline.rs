//! # Pipeline de Comandos — Orquestrador
//!
//! Conecta os estágios do interpretador para uma frase:
//!
//! ```text
//! prompt ──► detect_intent ──► Dispatcher ──► narrate ──► CommandResponse
//!                 │                 │             │
//!            ParsedCommand     Dispatched    Option<String>
//!                                   │             │ None
//!                                   └─ fallback ◄─┘
//! ```
//!
//! O pipeline não guarda estado entre requisições: store e gerador entram
//! como dependências explícitas e podem ser compartilhados por várias
//! requisições concorrentes.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::error::CommandError;
use crate::generation::GenerationService;
use crate::intent::detect_intent;
use crate::narrator::{narrate_within, NARRATION_TIMEOUT};
use crate::store::RecordStore;

pub const MISSING_PROMPT_MESSAGE: &str = "Campo prompt é obrigatório";

/// Resposta de sucesso de um comando: `{intent, message, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub intent: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub struct CommandPipeline {
    dispatcher: Dispatcher,
    generator: Arc<dyn GenerationService>,
    narration_timeout: Duration,
}

impl CommandPipeline {
    pub fn new(store: Arc<dyn RecordStore>, generator: Arc<dyn GenerationService>) -> Self {
        Self {
            dispatcher: Dispatcher::new(store),
            generator,
            narration_timeout: NARRATION_TIMEOUT,
        }
    }

    /// Troca o prazo da narração.
    pub fn with_narration_timeout(mut self, timeout: Duration) -> Self {
        self.narration_timeout = timeout;
        self
    }

    /// Interpreta e executa uma frase.
    pub async fn run(&self, prompt: &str) -> Result<CommandResponse, CommandError> {
        if prompt.trim().is_empty() {
            return Err(CommandError::Validation(MISSING_PROMPT_MESSAGE.into()));
        }

        let command = detect_intent(prompt);
        debug!(?command, "Comando interpretado");

        let dispatched = self.dispatcher.dispatch(&command, prompt).await?;

        let data = dispatched.data.clone().unwrap_or(Value::Null);
        let narration = narrate_within(
            self.generator.clone(),
            &dispatched.context,
            &data,
            self.narration_timeout,
        )
        .await;
        let narrated = narration.is_some();
        let message = narration.unwrap_or(dispatched.fallback);

        info!(intent = dispatched.intent, narrated, "Comando executado");
        Ok(CommandResponse {
            intent: dispatched.intent.to_string(),
            message,
            data: dispatched.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::DisabledGenerator;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pipeline() -> CommandPipeline {
        let store = Arc::new(MemoryStore::with_payloads([json!({"qra": "SILVA", "re": "1-1"})]));
        CommandPipeline::new(store, Arc::new(DisabledGenerator))
    }

    #[tokio::test]
    async fn test_blank_prompt_is_validation() {
        let err = pipeline().run("   ").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), MISSING_PROMPT_MESSAGE);
    }

    #[tokio::test]
    async fn test_disabled_generator_uses_fallback() {
        let response = pipeline().run("excluir id 1").await.unwrap();
        assert_eq!(response.intent, "delete");
        assert_eq!(response.message, "Registro 1 removido com sucesso.");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"intent": "delete", "message": "Registro 1 removido com sucesso."})
        );
    }

    #[test]
    fn test_response_skips_missing_data() {
        let response = CommandResponse {
            intent: "list".into(),
            message: "ok".into(),
            data: None,
        };
        assert_eq!(serde_json::to_value(response).unwrap(), json!({"intent": "list", "message": "ok"}));
    }
}
