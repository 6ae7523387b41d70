//! # Casamento de Filtros sobre o Cadastro
//!
//! Dado um [`FieldQuery`], percorre os registros e devolve os que casam:
//!
//! | Campo | Comparação |
//! |-------|------------|
//! | `re`, `cpf`, `documentos.rg`, `codigoOpm` | igualdade exata |
//! | qualquer outro | "contém", sem diferenciar maiúsculas |
//!
//! Os dois lados passam por [`normalize`], então acentos também são
//! ignorados. Registros em que o caminho não existe (ou é `null`) nunca
//! casam. A ordem do store é preservada.

use rayon::prelude::*;
use serde_json::Value;

use crate::fields::FieldQuery;
use crate::normalizer::normalize;
use crate::record::Record;

/// Registros que satisfazem o filtro, na ordem original.
pub fn match_records(records: &[Record], query: &FieldQuery) -> Vec<Record> {
    let needle = normalize(&query.value);
    let exact = query.is_exact();
    records
        .par_iter()
        .filter(|record| {
            record
                .get(&query.field)
                .and_then(stringify)
                .map(|value| value_matches(&normalize(&value), &needle, exact))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn value_matches(value: &str, needle: &str, exact: bool) -> bool {
    if exact {
        value == needle
    } else {
        value.contains(needle)
    }
}

/// Texto comparável de um valor JSON; `null` conta como ausente.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RecordStore};
    use serde_json::json;

    async fn sample() -> Vec<Record> {
        MemoryStore::with_payloads([
            json!({"nomeCompleto": "João Silva", "qra": "SILVA", "re": "200999-1", "documentos": {"rg": "11"}}),
            json!({"nomeCompleto": "Maria Silveira", "qra": "MARIA", "re": "200999-10", "codigoOpm": 620}),
            json!({"nomeCompleto": "Pedro Souza", "qra": "PEDRO", "re": null}),
        ])
        .list()
        .await
        .unwrap()
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_exact_field_requires_equality() {
        let records = sample().await;
        let hits = match_records(&records, &FieldQuery::new("re", "200999-1"));
        assert_eq!(ids(&hits), vec![1]);
    }

    #[tokio::test]
    async fn test_substring_field_is_case_and_accent_insensitive() {
        let records = sample().await;
        let hits = match_records(&records, &FieldQuery::new("nomeCompleto", "silv"));
        assert_eq!(ids(&hits), vec![1, 2]);
        let hits = match_records(&records, &FieldQuery::new("nomeCompleto", "joao"));
        assert_eq!(ids(&hits), vec![1]);
    }

    #[test]
    fn test_substring_is_superset_of_exact() {
        let cases = [
            ("200999-1", "200999-1"),
            ("200999-10", "200999-1"),
            ("11", "1"),
            ("620", "621"),
            ("", ""),
        ];
        for (value, needle) in cases {
            let exact = value_matches(value, needle, true);
            let substring = value_matches(value, needle, false);
            assert!(!exact || substring, "{} / {}", value, needle);
            assert_eq!(exact == substring, value == needle || !substring, "{} / {}", value, needle);
        }
    }

    #[tokio::test]
    async fn test_exact_rejects_prefix_that_substring_accepts() {
        let records = sample().await;
        let by_re = match_records(&records, &FieldQuery::new("re", "200999"));
        assert!(by_re.is_empty());
        let by_qra = match_records(&records, &FieldQuery::new("qra", "silv"));
        assert_eq!(ids(&by_qra), vec![1]);
    }

    #[tokio::test]
    async fn test_missing_or_null_path_never_matches() {
        let records = sample().await;
        assert!(match_records(&records, &FieldQuery::new("documentos.rg", "22")).is_empty());
        let hits = match_records(&records, &FieldQuery::new("re", "null"));
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_numeric_values_are_stringified() {
        let records = sample().await;
        let hits = match_records(&records, &FieldQuery::new("codigoOpm", "620"));
        assert_eq!(ids(&hits), vec![2]);
    }
}
