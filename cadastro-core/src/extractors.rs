//! # Extratores — Regras Regex sobre Texto Normalizado
//!
//! Cada extrator é uma função independente que retira um fragmento
//! estruturado da frase do usuário. Nenhum deles falha: quando o padrão
//! não aparece, o retorno é `None` (ou um mapa vazio), e a decisão sobre o
//! que fazer fica com o [`dispatcher`](crate::dispatcher).
//!
//! | Extrator | Exemplo de entrada | Saída |
//! |----------|--------------------|-------|
//! | [`extract_id`] | "excluir id 5" | `5` |
//! | [`extract_fields`] | "criar funcionario Joao Silva com qra SILVA" | `{nomeCompleto, qra}` |
//! | [`extract_query`] | "buscar com re 200999-1" | `re = 200999-1` |
//! | [`extract_update_target`] | "atualize o posto ... para cabo" | `posto ← cabo` |
//! | [`extract_section`] | "qual a cnh do ...?" | `documentos.cnh` |
//! | [`is_question`] | "quais os contatos ...?" | `true` |
//!
//! Os padrões são compilados uma única vez ([`LazyLock`]) e sempre
//! aplicados sobre a saída de [`normalize`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::fields::{map_field_path, FieldQuery, UpdateTarget};
use crate::normalizer::{capitalize_words, normalize};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("regex inválida")
}

/// Vocabulário de campos aceito como filtro. Não inclui os subcampos da CNH.
const QUERY_FIELDS: &str = "re|qra|nome|nomecompleto|cpf|rg|email|telefone|codigoopm|posto|situacao";

static ID_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\bid[:\s]*([0-9]+)\b"));

static QUOTED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"nome(?:\s+completo)?\s*["“”']([^"“”']+)["“”']"#));
static LABELED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"nome(?:\s+completo)?[:\-]\s*([a-z][a-z\s'.-]+)"));
static CREATE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:criar|crie|cadastrar|cadastre|adicionar|adicione|novo|nova)\s+(?:funcionario|item|registro)\s+([a-z][a-z\s'.-]+)")
});
static QRA_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"\bqra\s*["“”']?([a-z0-9\-_.]+)["“”']?\b"#));
static RE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r#"\bre[:\s"]+([0-9\-]+)\b"#));

/// Variantes de filtro em ordem de preferência: "com campo: valor",
/// "com campo valor", "campo: valor", "campo valor". O valor termina antes
/// de " para", de pontuação final ou do fim do texto.
static QUERY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let value = r"([^\r\n?.;]*?)(?:\s+para\b|[?.;]|$)";
    vec![
        compile(&format!(r"\bcom\s+({QUERY_FIELDS})\s*:\s*{value}")),
        compile(&format!(r"\bcom\s+({QUERY_FIELDS})\s+{value}")),
        compile(&format!(r"\b({QUERY_FIELDS})\s*:\s*{value}")),
        compile(&format!(r"\b({QUERY_FIELDS})\s+{value}")),
    ]
});

static UPDATE_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(?:atualiz\w+|alter\w+|mud\w+|edit\w+)\s+(?:(?:o|a)\s+)?(.+?)\s+\bpara\b\s+([^\r\n]+)$")
});

/// Maior número de palavras que um nome de campo pode ocupar ("cnh numero").
const MAX_FIELD_WORDS: usize = 3;

/// Seções na ordem em que são testadas; a primeira que aparecer vence.
static SECTION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bdocumentos?\b", "documentos"),
        (r"\bcnh\b", "documentos.cnh"),
        (r"\brg\b", "documentos.rg"),
        (r"\bcontatos?\b", "contatos"),
        (r"\bemail\b", "contatos.emailFuncional"),
        (r"\b(?:telefone|celular)\b", "contatos.telefone"),
        (r"\bcaracteristicas?(?:\s+fisicas)?\b", "caracteristicasFisicas"),
        (r"\bcodigo\s?opm\b", "codigoOpm"),
        (r"\bopm\b", "opm"),
        (r"\bposto\b", "posto"),
        (r"\bsituacao\b", "situacao"),
    ]
    .into_iter()
    .map(|(pattern, path)| (compile(pattern), path))
    .collect()
});

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(?:qual|quais|que)\b"));

/// Palavras que encerram um nome completo não delimitado por aspas.
const NAME_STOPWORDS: &[&str] = &[
    "com", "qra", "re", "cpf", "rg", "email", "telefone", "posto", "situacao", "codigoopm", "id",
];

/// Id numérico após o token "id" ("id 5", "id:5").
pub fn extract_id(text: &str) -> Option<u64> {
    let t = normalize(text);
    ID_RE.captures(&t)?.get(1)?.as_str().parse().ok()
}

/// Campos de criação: `nomeCompleto`, `qra` e `re`.
///
/// Só as chaves efetivamente encontradas aparecem no mapa retornado.
pub fn extract_fields(text: &str) -> Map<String, Value> {
    let t = normalize(text);

    let quoted = QUOTED_NAME_RE
        .captures(&t)
        .map(|c| c[1].trim().to_string());
    let nome_completo = quoted
        .or_else(|| {
            LABELED_NAME_RE
                .captures(&t)
                .map(|c| trim_name(&c[1]))
        })
        .or_else(|| {
            CREATE_NAME_RE
                .captures(&t)
                .map(|c| trim_name(&c[1]))
        })
        .filter(|name| !name.is_empty());

    let qra = QRA_RE.captures(&t).map(|c| c[1].to_uppercase());
    let re = RE_RE.captures(&t).map(|c| c[1].to_string());

    let mut payload = Map::new();
    if let Some(nome) = nome_completo {
        payload.insert("nomeCompleto".into(), Value::String(capitalize_words(&nome)));
    }
    if let Some(qra) = qra {
        payload.insert("qra".into(), Value::String(qra));
    }
    if let Some(re) = re {
        payload.insert("re".into(), Value::String(re));
    }
    payload
}

/// Corta o nome na primeira palavra-chave de campo (ou "com") e descarta um
/// "e" solto no final: "joao silva e re 1" → "joao silva".
fn trim_name(raw: &str) -> String {
    let mut words: Vec<&str> = raw
        .split_whitespace()
        .take_while(|w| !NAME_STOPWORDS.contains(w))
        .collect();
    while words.last() == Some(&"e") {
        words.pop();
    }
    words.join(" ")
}

/// Filtro `campo valor` (ou `campo: valor`), opcionalmente precedido de "com".
pub fn extract_query(text: &str) -> Option<FieldQuery> {
    let t = normalize(text);
    QUERY_RES.iter().find_map(|re| {
        let caps = re.captures(&t)?;
        map_query(&caps[1], &caps[2])
    })
}

fn map_query(field: &str, value: &str) -> Option<FieldQuery> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let path = map_field_path(field)?;
    Some(FieldQuery::new(path, value))
}

/// "atualize o `<campo>` [do funcionario] ... para `<valor>`".
///
/// O campo é o maior prefixo (até [`MAX_FIELD_WORDS`] palavras) do trecho
/// entre o verbo e "para" que [`map_field_path`] reconhece. Sem prefixo
/// reconhecido a extração inteira falha, mesmo que o padrão tenha casado.
pub fn extract_update_target(text: &str) -> Option<UpdateTarget> {
    let t = normalize(text);
    let caps = UPDATE_TARGET_RE.captures(&t)?;
    let words: Vec<&str> = caps[1].split_whitespace().collect();
    let path = (1..=words.len().min(MAX_FIELD_WORDS))
        .rev()
        .find_map(|n| map_field_path(&words[..n].concat()))?;
    let value = caps[2].trim();
    if value.is_empty() {
        return None;
    }
    Some(UpdateTarget {
        path: path.to_string(),
        value: value.to_string(),
    })
}

/// Seção (sub-objeto) pedida na frase, como prefixo de caminho canônico.
pub fn extract_section(text: &str) -> Option<&'static str> {
    let t = normalize(text);
    SECTION_RES
        .iter()
        .find(|(re, _)| re.is_match(&t))
        .map(|(_, path)| *path)
}

pub fn is_question(text: &str) -> bool {
    QUESTION_RE.is_match(&normalize(text))
}

/// Objeto JSON literal no final do texto original (sem normalizar):
/// "atualizar id 3 {\"posto\": \"cabo\"}".
///
/// Tenta cada `{` da esquerda para a direita até achar um sufixo que seja
/// um objeto JSON válido.
pub fn extract_inline_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim_end();
    if !trimmed.ends_with('}') {
        return None;
    }
    trimmed
        .match_indices('{')
        .find_map(|(start, _)| match serde_json::from_str::<Value>(&trimmed[start..]) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
}
