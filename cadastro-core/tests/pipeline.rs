//! Testes de ponta a ponta do pipeline de comandos sobre um store em memória.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadastro_core::{
    CommandError, CommandPipeline, DisabledGenerator, GenerationError, GenerationOptions, GenerationService,
    MemoryStore, RecordStore,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Gerador que responde sempre o mesmo texto e conta as chamadas.
struct Echo {
    reply: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl GenerationService for Echo {
    async fn generate(&self, prompt: &str, _options: GenerationOptions) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(prompt.contains("no máximo duas frases"));
        Ok(self.reply.to_string())
    }
}

/// Gerador que nunca responde.
struct Hanging;

#[async_trait]
impl GenerationService for Hanging {
    async fn generate(&self, _prompt: &str, _options: GenerationOptions) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

fn seeded() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_payloads([
        json!({"nomeCompleto": "Joao Silva", "qra": "SILVA", "re": "200999-1", "posto": "soldado",
               "contatos": {"telefone": "1111", "emailFuncional": "silva@pm.br"}}),
        json!({"nomeCompleto": "Ana Souza", "qra": "ANA", "re": "200999-2", "posto": "cabo"}),
    ]))
}

#[tokio::test]
async fn test_full_crud_conversation() {
    let store = seeded();
    let pipeline = CommandPipeline::new(store.clone(), Arc::new(DisabledGenerator));

    let created = pipeline
        .run("criar funcionario Carlos Lima com qra LIMA e re 300100-5")
        .await
        .unwrap();
    assert_eq!(created.intent, "create");
    assert_eq!(created.message, "Registro 3 criado com sucesso.");

    let found = pipeline.run("buscar funcionario com qra lima").await.unwrap();
    assert_eq!(found.intent, "search");
    assert_eq!(found.data.unwrap()[0]["nomeCompleto"], json!("Carlos Lima"));

    let updated = pipeline
        .run("atualize o posto do funcionario com re 300100-5 para sargento")
        .await
        .unwrap();
    assert_eq!(updated.intent, "update");
    assert_eq!(updated.data.unwrap()["posto"], json!("sargento"));

    let posto = pipeline
        .run("Qual é o posto do funcionário com qra LIMA?")
        .await
        .unwrap();
    assert_eq!(posto.intent, "select");
    assert_eq!(posto.data, Some(json!("sargento")));

    let removed = pipeline.run("excluir id 3").await.unwrap();
    assert_eq!(removed.intent, "delete");
    assert_eq!(store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_select_nested_section() {
    let pipeline = CommandPipeline::new(seeded(), Arc::new(DisabledGenerator));
    let response = pipeline
        .run("quais os contatos do funcionario com re 200999-1?")
        .await
        .unwrap();
    assert_eq!(response.data, Some(json!({"telefone": "1111", "emailFuncional": "silva@pm.br"})));
}

#[tokio::test]
async fn test_narration_replaces_fallback() {
    let echo = Arc::new(Echo {
        reply: "Há dois funcionários cadastrados.",
        calls: AtomicUsize::new(0),
    });
    let pipeline = CommandPipeline::new(seeded(), echo.clone());
    let response = pipeline.run("listar todos").await.unwrap();
    assert_eq!(response.message, "Há dois funcionários cadastrados.");
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_generator_falls_back_after_timeout() {
    let pipeline = CommandPipeline::new(seeded(), Arc::new(Hanging));
    let started = tokio::time::Instant::now();
    let response = pipeline.run("mostrar id 2").await.unwrap();
    assert_eq!(response.message, "Registro 2 encontrado.");
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_custom_narration_timeout() {
    let pipeline = CommandPipeline::new(seeded(), Arc::new(Hanging)).with_narration_timeout(Duration::from_millis(100));
    let started = tokio::time::Instant::now();
    pipeline.run("listar todos").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_errors_carry_status() {
    let pipeline = CommandPipeline::new(seeded(), Arc::new(DisabledGenerator));

    let cases = [
        ("", 400),
        ("bom dia", 400),
        ("excluir", 400),
        ("mostrar id 77", 404),
        ("qual o posto do funcionario com qra NINGUEM?", 404),
        ("qual o posto do funcionario com re 200999?", 404),
    ];
    for (prompt, status) in cases {
        let err = pipeline.run(prompt).await.unwrap_err();
        assert_eq!(err.status_code(), status, "prompt: {:?}", prompt);
    }
}

#[tokio::test]
async fn test_ambiguous_update_is_conflict_and_harmless() {
    let store = seeded();
    let pipeline = CommandPipeline::new(store.clone(), Arc::new(DisabledGenerator));
    let before = store.list().await.unwrap();

    let err = pipeline
        .run("atualize a situacao do funcionario com re 200999 para inativo")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));

    let err = pipeline
        .run("mude o posto do funcionario com qra a para cabo")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Conflict(_)));
    assert_eq!(store.list().await.unwrap(), before);
}
