//! # Dispatcher — Do Comando Interpretado às Operações no Store
//!
//! Recebe um [`ParsedCommand`] e executa as operações correspondentes no
//! [`RecordStore`]. Toda validação mora aqui: os extratores nunca falham,
//! então um comando incompleto vira [`CommandError::Validation`] (400) em
//! vez de derrubar a requisição.
//!
//! ## Política de ambiguidade (filtros)
//!
//! Quando um filtro precisa apontar para **um** registro (`select` e
//! `update` por filtro):
//!
//! | Registros que casam | Resultado |
//! |---------------------|-----------|
//! | 0 | [`CommandError::NotFound`] (404) |
//! | 1 | segue com esse registro |
//! | 2 ou mais | [`CommandError::Conflict`] (409), nada é alterado |
//!
//! Não existe "pega o primeiro". Já `search` devolve todos os registros que
//! casam, e zero resultados é uma resposta válida.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::deep::{merge_patch, set_deep};
use crate::error::CommandError;
use crate::extractors::extract_inline_object;
use crate::fields::{FieldQuery, UpdateTarget};
use crate::intent::ParsedCommand;
use crate::matcher::match_records;
use crate::record::Record;
use crate::store::RecordStore;

pub const NOT_FOUND_MESSAGE: &str = "Item não encontrado";
pub const MISSING_ID_MESSAGE: &str = "ID inválido ou ausente. Informe o id (ex: \"excluir id 3\").";
pub const UNKNOWN_INTENT_MESSAGE: &str = "Não entendi o comando. Exemplos: \"listar todos\", \
\"mostrar id 3\", \"criar funcionario Nome Sobrenome com qra APELIDO e re 000000-0\", \
\"buscar funcionario com qra APELIDO\", \"qual o posto do funcionario com re 000000-0?\", \
\"atualize o posto do funcionario com qra APELIDO para cabo\", \"atualizar id 3 qra NOVO\", \
\"excluir id 3\".";
pub const UPDATE_GUIDANCE_MESSAGE: &str = "Informe o id do registro ou um filtro com o campo a \
atualizar (ex: \"atualize o posto do funcionario com qra APELIDO para cabo\").";

/// Resultado bem-sucedido de um comando, antes da narração.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Intenção executada (`"list"`, `"update"`, ...).
    pub intent: &'static str,
    /// Dados devolvidos ao cliente; `None` em `delete`.
    pub data: Option<Value>,
    /// Descrição da operação, usada no prompt de narração.
    pub context: String,
    /// Mensagem determinística usada quando a narração não responde.
    pub fallback: String,
}

impl Dispatched {
    fn new(intent: &'static str, data: Value, context: String, fallback: String) -> Self {
        Self {
            intent,
            data: Some(data),
            context,
            fallback,
        }
    }

    fn without_data(intent: &'static str, context: String, fallback: String) -> Self {
        Self {
            intent,
            data: None,
            context,
            fallback,
        }
    }
}

pub struct Dispatcher {
    store: Arc<dyn RecordStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Executa o comando. `raw` é a frase original, usada para o fragmento
    /// JSON literal da atualização por id.
    pub async fn dispatch(&self, command: &ParsedCommand, raw: &str) -> Result<Dispatched, CommandError> {
        match command {
            ParsedCommand::List => self.list().await,
            ParsedCommand::Get { id } => self.get(require_id(*id)?).await,
            ParsedCommand::Search { query } => self.search(query).await,
            ParsedCommand::Select { section, query } => self.select(section, query).await,
            ParsedCommand::Create { fields } => self.create(fields).await,
            ParsedCommand::Update {
                id,
                fields,
                target,
                query,
            } => self.update(*id, fields, target.as_ref(), query.as_ref(), raw).await,
            ParsedCommand::Delete { id } => self.delete(require_id(*id)?).await,
            ParsedCommand::Unknown => Err(CommandError::UnknownIntent(UNKNOWN_INTENT_MESSAGE.into())),
        }
    }

    async fn list(&self) -> Result<Dispatched, CommandError> {
        let records = self.store.list().await?;
        let total = records.len();
        Ok(Dispatched::new(
            "list",
            records_value(&records),
            format!("listagem do cadastro com {} registro(s)", total),
            format!("{} registro(s) no cadastro.", total),
        ))
    }

    async fn get(&self, id: u64) -> Result<Dispatched, CommandError> {
        let record = self
            .store
            .list()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CommandError::NotFound(NOT_FOUND_MESSAGE.into()))?;
        Ok(Dispatched::new(
            "get",
            record.to_value(),
            format!("consulta do registro id {}", id),
            format!("Registro {} encontrado.", id),
        ))
    }

    async fn search(&self, query: &FieldQuery) -> Result<Dispatched, CommandError> {
        let records = self.store.list().await?;
        let matches = match_records(&records, query);
        debug!(field = %query.field, value = %query.value, total = matches.len(), "Busca por filtro");
        Ok(Dispatched::new(
            "search",
            records_value(&matches),
            format!("busca por {} = {} com {} resultado(s)", query.field, query.value, matches.len()),
            format!("{} registro(s) encontrado(s) para {} = {}.", matches.len(), query.field, query.value),
        ))
    }

    async fn select(&self, section: &str, query: &FieldQuery) -> Result<Dispatched, CommandError> {
        let record = self.resolve_single(query).await?;
        let value = record.get(section).cloned().unwrap_or(Value::Null);
        Ok(Dispatched::new(
            "select",
            value,
            format!("consulta de {} do registro id {} ({} = {})", section, record.id, query.field, query.value),
            format!("{} do registro {}.", section, record.id),
        ))
    }

    async fn create(&self, fields: &Map<String, Value>) -> Result<Dispatched, CommandError> {
        if !fields.values().any(is_filled) {
            return Err(CommandError::Validation(
                "Nenhum campo reconhecido para criar. Informe nome, qra ou re.".into(),
            ));
        }
        let record = self.store.create(fields.clone()).await?;
        info!(id = record.id, "Registro criado por comando");
        Ok(Dispatched::new(
            "create",
            record.to_value(),
            format!("criação do registro id {}", record.id),
            format!("Registro {} criado com sucesso.", record.id),
        ))
    }

    /// Duas estratégias, nesta ordem:
    ///
    /// 1. **filtro + alvo**: resolve o filtro para um único registro e
    ///    aplica `alvo.caminho ← alvo.valor`.
    /// 2. **id**: aplica os campos extraídos, o alvo (se houver) e o
    ///    fragmento JSON literal do fim da frase ao registro com esse id.
    ///
    /// Quando o campo do alvo também é um campo de filtro ("nome", "posto",
    /// "re", ...), o texto depois dele vira um filtro e a estratégia 1 é
    /// escolhida mesmo com id na frase: "mudar o nome do registro id 4 para
    /// X" filtra por `nomeCompleto = "do registro id 4"`.
    async fn update(
        &self,
        id: Option<u64>,
        fields: &Map<String, Value>,
        target: Option<&UpdateTarget>,
        query: Option<&FieldQuery>,
        raw: &str,
    ) -> Result<Dispatched, CommandError> {
        if let (Some(target), Some(query)) = (target, query) {
            let record = self.resolve_single(query).await?;
            let mut patch = Value::Object(Map::new());
            set_deep(&mut patch, &target.path, Value::String(target.value.clone()));
            return self.apply_update(record.id, patch, "filter").await;
        }

        let Some(id) = id else {
            return Err(CommandError::Validation(UPDATE_GUIDANCE_MESSAGE.into()));
        };

        let mut patch = Value::Object(fields.clone());
        if let Some(target) = target {
            set_deep(&mut patch, &target.path, Value::String(target.value.clone()));
        }
        if let (Some(inline), Value::Object(map)) = (extract_inline_object(raw), &mut patch) {
            merge_patch(map, inline);
        }
        if patch.as_object().map_or(true, Map::is_empty) {
            return Err(CommandError::Validation("Nenhum campo para atualizar.".into()));
        }
        self.apply_update(id, patch, "id").await
    }

    async fn apply_update(&self, id: u64, patch: Value, strategy: &'static str) -> Result<Dispatched, CommandError> {
        let Value::Object(patch) = patch else {
            return Err(CommandError::Validation("Nenhum campo para atualizar.".into()));
        };
        let changed: Vec<String> = patch.keys().cloned().collect();
        let record = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| CommandError::NotFound(NOT_FOUND_MESSAGE.into()))?;
        info!(id, strategy, campos = ?changed, "Registro atualizado por comando");
        Ok(Dispatched::new(
            "update",
            record.to_value(),
            format!("atualização de {} no registro id {}", changed.join(", "), id),
            format!("Registro {} atualizado com sucesso.", id),
        ))
    }

    async fn delete(&self, id: u64) -> Result<Dispatched, CommandError> {
        if !self.store.remove(id).await? {
            return Err(CommandError::NotFound(NOT_FOUND_MESSAGE.into()));
        }
        info!(id, "Registro removido por comando");
        Ok(Dispatched::without_data(
            "delete",
            format!("remoção do registro id {}", id),
            format!("Registro {} removido com sucesso.", id),
        ))
    }

    /// Aplica a política 0 / 1 / muitos do filtro.
    async fn resolve_single(&self, query: &FieldQuery) -> Result<Record, CommandError> {
        let records = self.store.list().await?;
        let mut matches = match_records(&records, query);
        match matches.len() {
            0 => Err(CommandError::NotFound(format!(
                "Nenhum registro encontrado com {} = {}",
                query.field, query.value
            ))),
            1 => Ok(matches.remove(0)),
            n => Err(CommandError::Conflict(format!(
                "Filtro ambíguo: {} registros com {} = {}. Refine a busca.",
                n, query.field, query.value
            ))),
        }
    }
}

fn require_id(id: Option<u64>) -> Result<u64, CommandError> {
    id.ok_or_else(|| CommandError::Validation(MISSING_ID_MESSAGE.into()))
}

fn records_value(records: &[Record]) -> Value {
    Value::Array(records.iter().map(Record::to_value).collect())
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
