//! # Classificador de Intenção por Regras Ordenadas
//!
//! Transforma a frase do usuário em um [`ParsedCommand`]. As regras ficam
//! numa tabela ([`RULES`]) avaliada em ordem fixa; a primeira que aceitar a
//! frase decide a intenção.
//!
//! | # | Regra | Gatilho | Intenção |
//! |---|-------|---------|----------|
//! | 1 | `delete` | verbo de exclusão | `Delete { id }` |
//! | 2 | `update` | verbo de alteração | `Update { id, fields, target, query }` |
//! | 3 | `question_select` | pergunta + seção + filtro | `Select` |
//! | 4 | `get_by_id` | verbo de consulta + token "id" | `Get { id }` |
//! | 5 | `retrieve_select` | verbo de busca + seção + filtro | `Select` |
//! | 6 | `search` | verbo de busca + filtro | `Search` |
//! | 7 | `list` | "listar", "todos", ... | `List` |
//! | 8 | `create` | verbo de criação | `Create { fields }` |
//! | — | (nenhuma) | | `Unknown` |
//!
//! Verbos de exclusão e alteração vencem os de busca na mesma frase, e uma
//! pergunta sobre seção vence a consulta por id.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::extractors::{
    extract_fields, extract_id, extract_query, extract_section, extract_update_target, is_question,
};
use crate::fields::{FieldQuery, UpdateTarget};
use crate::normalizer::normalize;

/// Comando interpretado, válido apenas durante uma requisição.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ParsedCommand {
    List,
    Get {
        id: Option<u64>,
    },
    Create {
        fields: Map<String, Value>,
    },
    /// As quatro extrações são sempre tentadas; o dispatcher decide qual
    /// combinação é acionável.
    Update {
        id: Option<u64>,
        fields: Map<String, Value>,
        target: Option<UpdateTarget>,
        query: Option<FieldQuery>,
    },
    Delete {
        id: Option<u64>,
    },
    Search {
        query: FieldQuery,
    },
    Select {
        section: String,
        query: FieldQuery,
    },
    Unknown,
}

impl ParsedCommand {
    /// Nome da intenção como aparece na resposta (`"list"`, `"select"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            ParsedCommand::List => "list",
            ParsedCommand::Get { .. } => "get",
            ParsedCommand::Create { .. } => "create",
            ParsedCommand::Update { .. } => "update",
            ParsedCommand::Delete { .. } => "delete",
            ParsedCommand::Search { .. } => "search",
            ParsedCommand::Select { .. } => "select",
            ParsedCommand::Unknown => "unknown",
        }
    }
}

/// Uma linha da tabela de regras.
///
/// `applies` olha só as pistas lexicais do texto normalizado; `build` roda
/// os extratores sobre o texto original e pode recusar (`None`), caso em
/// que a avaliação segue para a próxima regra.
pub struct IntentRule {
    pub name: &'static str,
    pub applies: fn(&str) -> bool,
    pub build: fn(&str) -> Option<ParsedCommand>,
}

fn cue(pattern: &str) -> Regex {
    Regex::new(pattern).expect("regex inválida")
}

static DELETE_CUE: LazyLock<Regex> =
    LazyLock::new(|| cue(r"\b(?:excluir|exclua|apagar|apague|remover|remova|deletar|delete)\b"));
static UPDATE_CUE: LazyLock<Regex> =
    LazyLock::new(|| cue(r"\b(?:atualiz\w+|edit\w+|alter\w+|mud\w+)\b"));
static LOOKUP_CUE: LazyLock<Regex> =
    LazyLock::new(|| cue(r"\b(?:buscar|busque|mostrar|mostre|ver|consultar|consulte|detalhe|detalhar)\b"));
static ID_TOKEN: LazyLock<Regex> = LazyLock::new(|| cue(r"\bid\b"));
static SELECT_CUE: LazyLock<Regex> = LazyLock::new(|| {
    cue(r"\b(?:buscar|busque|procurar|procure|encontrar|encontre|retorne|retornar|mostrar|mostre|exibir|exiba)\b")
});
static SEARCH_CUE: LazyLock<Regex> = LazyLock::new(|| {
    cue(r"\b(?:buscar|busque|procurar|procure|encontrar|encontre|retorne|retornar|filtrar|filtre)\b")
});
static LIST_CUE: LazyLock<Regex> = LazyLock::new(|| cue(r"\b(?:listar|liste|todos|tudo)\b"));
static CREATE_CUE: LazyLock<Regex> = LazyLock::new(|| {
    cue(r"\b(?:criar|crie|cadastrar|cadastre|adicionar|adicione|inserir|insira|novo|nova)\b")
});

fn build_select(text: &str) -> Option<ParsedCommand> {
    let section = extract_section(text)?;
    let query = extract_query(text)?;
    Some(ParsedCommand::Select {
        section: section.to_string(),
        query,
    })
}

/// Tabela de regras em ordem de prioridade.
pub static RULES: &[IntentRule] = &[
    IntentRule {
        name: "delete",
        applies: |t| DELETE_CUE.is_match(t),
        build: |text| Some(ParsedCommand::Delete { id: extract_id(text) }),
    },
    IntentRule {
        name: "update",
        applies: |t| UPDATE_CUE.is_match(t),
        build: |text| {
            Some(ParsedCommand::Update {
                id: extract_id(text),
                fields: extract_fields(text),
                target: extract_update_target(text),
                query: extract_query(text),
            })
        },
    },
    IntentRule {
        name: "question_select",
        applies: is_question,
        build: build_select,
    },
    IntentRule {
        name: "get_by_id",
        applies: |t| LOOKUP_CUE.is_match(t) && ID_TOKEN.is_match(t),
        build: |text| Some(ParsedCommand::Get { id: extract_id(text) }),
    },
    IntentRule {
        name: "retrieve_select",
        applies: |t| SELECT_CUE.is_match(t),
        build: build_select,
    },
    IntentRule {
        name: "search",
        applies: |t| SEARCH_CUE.is_match(t),
        build: |text| extract_query(text).map(|query| ParsedCommand::Search { query }),
    },
    IntentRule {
        name: "list",
        applies: |t| LIST_CUE.is_match(t),
        build: |_| Some(ParsedCommand::List),
    },
    IntentRule {
        name: "create",
        applies: |t| CREATE_CUE.is_match(t),
        build: |text| Some(ParsedCommand::Create { fields: extract_fields(text) }),
    },
];

/// Nome da primeira regra que aceita a frase, se houver.
pub fn matching_rule(text: &str) -> Option<(&'static str, ParsedCommand)> {
    let t = normalize(text);
    RULES.iter().find_map(|rule| {
        if !(rule.applies)(&t) {
            return None;
        }
        (rule.build)(text).map(|command| (rule.name, command))
    })
}

/// Classifica a frase. Sem estado; nunca falha.
pub fn detect_intent(text: &str) -> ParsedCommand {
    match matching_rule(text) {
        Some((rule, command)) => {
            debug!(rule, intent = command.name(), "Intenção detectada");
            command
        }
        None => {
            debug!("Nenhuma regra de intenção aplicável");
            ParsedCommand::Unknown
        }
    }
}
