//! # Store de Registros
//!
//! Contrato assíncrono ([`RecordStore`]) que o dispatcher usa para ler e
//! alterar o cadastro, e duas implementações:
//!
//! - [`JsonFileStore`]: a coleção inteira em um arquivo JSON (array),
//!   reescrito a cada mutação.
//! - [`MemoryStore`]: o mesmo comportamento sobre um `Vec` em memória.
//!
//! As regras de id e carimbos de tempo vivem nas funções `apply_*`,
//! compartilhadas pelas duas implementações.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::deep::merge_patch;
use crate::error::StoreError;
use crate::record::{strip_reserved, Record};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Todos os registros, na ordem de armazenamento. Sem dados → vazio.
    async fn list(&self) -> Result<Vec<Record>, StoreError>;
    /// Cria um registro atribuindo `id`, `createdAt` e `updatedAt`.
    async fn create(&self, payload: Map<String, Value>) -> Result<Record, StoreError>;
    /// Aplica um patch aninhado; `None` se o id não existe.
    async fn update(&self, id: u64, patch: Map<String, Value>) -> Result<Option<Record>, StoreError>;
    /// `true` se algum registro foi removido.
    async fn remove(&self, id: u64) -> Result<bool, StoreError>;
}

fn next_id(records: &[Record]) -> u64 {
    records.iter().map(|r| r.id).max().map_or(1, |max| max + 1)
}

fn apply_create(records: &mut Vec<Record>, payload: Map<String, Value>) -> Record {
    let now = Utc::now();
    let record = Record {
        id: next_id(records),
        attributes: strip_reserved(payload),
        created_at: now,
        updated_at: now,
    };
    records.push(record.clone());
    record
}

fn apply_update(records: &mut [Record], id: u64, patch: Map<String, Value>) -> Option<Record> {
    let record = records.iter_mut().find(|r| r.id == id)?;
    merge_patch(&mut record.attributes, strip_reserved(patch));
    record.updated_at = Utc::now();
    Some(record.clone())
}

fn apply_remove(records: &mut Vec<Record>, id: u64) -> bool {
    match records.iter().position(|r| r.id == id) {
        Some(idx) => {
            records.remove(idx);
            true
        }
        None => false,
    }
}

/// Store em arquivo JSON.
///
/// Um `Mutex` serializa cada ciclo ler-modificar-escrever deste processo,
/// então duas mutações concorrentes no mesmo arquivo não se sobrepõem.
/// Cada gravação vai para um arquivo `.tmp` ao lado e substitui o original
/// com `rename`, então leituras sem o lock nunca veem um arquivo pela metade.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Arquivo irmão onde a nova versão é escrita antes do `rename`.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_all(&self) -> Result<Vec<Record>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&raw)? {
            data @ Value::Array(_) => Ok(serde_json::from_value(data)?),
            _ => Ok(vec![]),
        }
    }

    async fn write_all(&self, records: &[Record]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(records)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), total = records.len(), "Cadastro gravado");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.read_all().await
    }

    async fn create(&self, payload: Map<String, Value>) -> Result<Record, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let record = apply_create(&mut records, payload);
        self.write_all(&records).await?;
        info!(id = record.id, "Registro criado");
        Ok(record)
    }

    async fn update(&self, id: u64, patch: Map<String, Value>) -> Result<Option<Record>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let Some(updated) = apply_update(&mut records, id, patch) else {
            return Ok(None);
        };
        self.write_all(&records).await?;
        info!(id, "Registro atualizado");
        Ok(Some(updated))
    }

    async fn remove(&self, id: u64) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        if !apply_remove(&mut records, id) {
            return Ok(false);
        }
        self.write_all(&records).await?;
        info!(id, "Registro removido");
        Ok(true)
    }
}

/// Store em memória.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cria o store já populado, como se cada payload fosse criado em ordem.
    pub fn with_payloads(payloads: impl IntoIterator<Item = Value>) -> Self {
        let mut records = Vec::new();
        for payload in payloads {
            if let Value::Object(map) = payload {
                apply_create(&mut records, map);
            }
        }
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn create(&self, payload: Map<String, Value>) -> Result<Record, StoreError> {
        Ok(apply_create(&mut *self.records.write().await, payload))
    }

    async fn update(&self, id: u64, patch: Map<String, Value>) -> Result<Option<Record>, StoreError> {
        Ok(apply_update(&mut self.records.write().await, id, patch))
    }

    async fn remove(&self, id: u64) -> Result<bool, StoreError> {
        Ok(apply_remove(&mut *self.records.write().await, id))
    }
}
