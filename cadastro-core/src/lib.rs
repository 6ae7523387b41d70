//! # cadastro-core — Interpretador de Comandos em Português
//!
//! Transforma frases livres em Português Brasileiro em operações CRUD sobre
//! um cadastro de funcionários, executa essas operações e devolve uma
//! narração curta do resultado.
//!
//! ## Arquitetura
//!
//! O dado flui em linha, estágio a estágio:
//!
//! 1.  **Normalização** ([`normalizer`]): minúsculas e sem acentos. Todo
//!     extrator trabalha sobre essa forma.
//! 2.  **Classificação** ([`intent`]): tabela ordenada de regras, apoiada nos
//!     [`extractors`] e no mapa de campos ([`fields`]).
//! 3.  **Despacho** ([`dispatcher`]): valida o comando, resolve filtros com o
//!     [`matcher`] e altera registros via [`deep`] e [`store`].
//! 4.  **Narração** ([`narrator`]): chama o serviço de [`generation`] com
//!     prazo de 2 segundos, com mensagem determinística de reserva.
//!
//! O [`pipeline`] amarra os quatro estágios.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use cadastro_core::{CommandPipeline, DisabledGenerator, MemoryStore};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let pipeline = CommandPipeline::new(Arc::new(MemoryStore::new()), Arc::new(DisabledGenerator));
//!
//! let response = pipeline
//!     .run("criar funcionario Joao Silva com qra SILVA e re 200999-1")
//!     .await
//!     .unwrap();
//!
//! assert_eq!(response.intent, "create");
//! assert_eq!(response.message, "Registro 1 criado com sucesso.");
//! # });
//! ```

pub mod deep;
pub mod dispatcher;
pub mod error;
pub mod extractors;
pub mod fields;
pub mod generation;
pub mod intent;
pub mod matcher;
pub mod narrator;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod store;

pub use error::{CommandError, GenerationError, StoreError};
pub use generation::{DisabledGenerator, GenerationOptions, GenerationService, WatsonxClient, WatsonxConfig};
pub use intent::{detect_intent, ParsedCommand};
pub use pipeline::{CommandPipeline, CommandResponse};
pub use record::Record;
pub use store::{JsonFileStore, MemoryStore, RecordStore};
