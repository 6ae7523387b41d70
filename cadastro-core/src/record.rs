//! # Registro Persistido
//!
//! Um [`Record`] é um funcionário do cadastro: um `id` numérico, a árvore
//! livre de atributos (nome, qra, re, documentos, contatos, ...) e os dois
//! carimbos de tempo. Chaves desconhecidas são preservadas intactas.
//!
//! ```json
//! {
//!   "id": 1,
//!   "nomeCompleto": "Joao Silva",
//!   "qra": "SILVA",
//!   "documentos": { "rg": "12.345.678", "cnh": { "numero": "999" } },
//!   "createdAt": "2025-01-01T12:00:00Z",
//!   "updatedAt": "2025-01-01T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::deep::get_deep_in;

/// Chaves controladas pelo store; nunca vêm do payload do usuário.
pub const RESERVED_KEYS: &[&str] = &["id", "createdAt", "updatedAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Identificador positivo e imutável (`max + 1`).
    pub id: u64,
    /// Atributos de domínio, achatados no JSON do registro.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    /// Definido uma única vez, na criação.
    pub created_at: DateTime<Utc>,
    /// Renovado a cada mutação bem-sucedida.
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Lê um atributo por caminho pontuado (ex: `documentos.cnh.numero`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_deep_in(&self.attributes, path)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Remove do mapa as chaves reservadas do store.
pub fn strip_reserved(mut payload: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        payload.remove(*key);
    }
    payload
}
