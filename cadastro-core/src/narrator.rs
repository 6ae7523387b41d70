//! # Narrador — Resumo em Linguagem Natural com Prazo
//!
//! Pede ao [`GenerationService`] uma frase curta descrevendo o resultado de
//! um comando. A narração é opcional: se o serviço falhar, responder em
//! branco ou estourar o prazo ([`NARRATION_TIMEOUT`]), o retorno é `None` e
//! quem chama usa a mensagem determinística.
//!
//! A chamada roda numa task própria. No estouro do prazo o `JoinHandle` é
//! descartado: a requisição é abandonada, não cancelada, e pode terminar em
//! segundo plano sem efeito na resposta.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::generation::{GenerationOptions, GenerationService};

pub const NARRATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Tamanho máximo (em caracteres) do JSON incluído no prompt.
pub const MAX_DATA_CHARS: usize = 2000;

/// Monta o prompt de narração.
pub fn build_prompt(context: &str, data: &Value) -> String {
    let json = data.to_string();
    let excerpt: String = json.chars().take(MAX_DATA_CHARS).collect();
    format!(
        "Você é um assistente de um sistema de cadastro de funcionários. \
         Responda em português, em no máximo duas frases, sem repetir o JSON. \
         Descreva o resultado da operação: {context}.\n\nDados: {excerpt}\n\nResposta:"
    )
}

pub async fn narrate(generator: Arc<dyn GenerationService>, context: &str, data: &Value) -> Option<String> {
    narrate_within(generator, context, data, NARRATION_TIMEOUT).await
}

pub async fn narrate_within(
    generator: Arc<dyn GenerationService>,
    context: &str,
    data: &Value,
    limit: Duration,
) -> Option<String> {
    let prompt = build_prompt(context, data);
    let handle = tokio::spawn(async move { generator.generate(&prompt, GenerationOptions::default()).await });

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(Ok(text))) => {
            let text = text.trim();
            if text.is_empty() {
                debug!("Narração vazia, usando mensagem padrão");
                None
            } else {
                Some(text.to_string())
            }
        }
        Ok(Ok(Err(e))) => {
            warn!(error = %e, "Falha na narração");
            None
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Task de narração abortou");
            None
        }
        Err(_) => {
            warn!(limite_ms = limit.as_millis() as u64, "Narração excedeu o prazo");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use serde_json::json;

    struct Scripted(Result<&'static str, ()>);

    #[async_trait]
    impl GenerationService for Scripted {
        async fn generate(&self, _prompt: &str, _options: GenerationOptions) -> Result<String, GenerationError> {
            self.0
                .map(str::to_string)
                .map_err(|_| GenerationError::Upstream("500".into()))
        }
    }

    struct Slow(Duration);

    #[async_trait]
    impl GenerationService for Slow {
        async fn generate(&self, _prompt: &str, _options: GenerationOptions) -> Result<String, GenerationError> {
            tokio::time::sleep(self.0).await;
            Ok("tarde demais".into())
        }
    }

    #[tokio::test]
    async fn test_success_is_trimmed() {
        let out = narrate(Arc::new(Scripted(Ok("  Um registro encontrado.\n"))), "busca", &json!([])).await;
        assert_eq!(out.as_deref(), Some("Um registro encontrado."));
    }

    #[tokio::test]
    async fn test_blank_is_none() {
        assert_eq!(narrate(Arc::new(Scripted(Ok("   "))), "busca", &json!([])).await, None);
    }

    #[tokio::test]
    async fn test_error_is_none() {
        assert_eq!(narrate(Arc::new(Scripted(Err(()))), "busca", &json!([])).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_none() {
        let started = tokio::time::Instant::now();
        let out = narrate(Arc::new(Slow(Duration::from_secs(60))), "busca", &json!([])).await;
        assert_eq!(out, None);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_enough_is_kept() {
        let out = narrate(Arc::new(Slow(Duration::from_millis(1500))), "busca", &json!([])).await;
        assert_eq!(out.as_deref(), Some("tarde demais"));
    }

    #[test]
    fn test_prompt_truncates_data() {
        let big = json!({"texto": "x".repeat(5000)});
        let prompt = build_prompt("listagem", &big);
        assert!(prompt.contains("listagem"));
        assert!(prompt.chars().count() < MAX_DATA_CHARS + 400);
        assert!(!prompt.contains(&"x".repeat(MAX_DATA_CHARS)));
    }
}
