//! # Acesso por Caminho Pontuado
//!
//! Leitura e escrita em estruturas JSON aninhadas usando caminhos como
//! `documentos.cnh.numero`.
//!
//! - [`get_deep`] nunca falha: qualquer nó ausente ou que não seja objeto
//!   no meio do caminho resulta em `None`.
//! - [`set_deep`] cria os nós intermediários que faltam. Um nó
//!   intermediário que existe mas não é objeto é **sobrescrito** por um
//!   objeto vazio (não há fusão).
//! - [`merge_patch`] aplica um patch aninhado sobre um registro: objetos se
//!   fundem recursivamente, qualquer outro valor substitui o anterior.

use serde_json::{Map, Value};

/// Lê o valor em `path` a partir de `root`.
pub fn get_deep<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, key| node.as_object()?.get(key))
}

/// Mesmo que [`get_deep`], partindo de um mapa (ex: atributos de um registro).
pub fn get_deep_in<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        Some((head, rest)) => get_deep(map.get(head)?, rest),
        None => map.get(path),
    }
}

/// Escreve `value` em `path`, criando os nós intermediários.
///
/// Se `target` não for um objeto, ele próprio é substituído por um objeto
/// vazio antes da descida. Retorna `target` para permitir encadeamento.
pub fn set_deep<'a>(target: &'a mut Value, path: &str, value: Value) -> &'a mut Value {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return target;
    };

    let mut node = &mut *target;
    for key in parents {
        node = ensure_object(node)
            .entry(key.to_string())
            .or_insert(Value::Null);
    }
    ensure_object(node).insert(last.to_string(), value);
    target
}

/// Funde `patch` dentro de `target`.
pub fn merge_patch(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, incoming) in patch {
        match incoming {
            Value::Object(nested) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => merge_patch(existing, nested),
                _ => {
                    target.insert(key, Value::Object(nested));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("nó acabou de ser convertido em objeto"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_get_deep_nested() {
        let record = json!({"documentos": {"cnh": {"numero": "123"}}});
        assert_eq!(get_deep(&record, "documentos.cnh.numero"), Some(&json!("123")));
        assert_eq!(get_deep(&record, "documentos.cnh"), Some(&json!({"numero": "123"})));
    }

    #[test]
    fn test_get_deep_missing_or_scalar_parent() {
        let record = json!({"documentos": {"rg": "55"}, "posto": "cabo"});
        assert_eq!(get_deep(&record, "documentos.cnh.numero"), None);
        assert_eq!(get_deep(&record, "posto.nivel"), None);
        assert_eq!(get_deep(&record, "inexistente"), None);
    }

    #[test]
    fn test_set_deep_builds_from_empty() {
        let mut patch = json!({});
        set_deep(&mut patch, "documentos.cnh.numero", json!("999"));
        assert_eq!(patch, json!({"documentos": {"cnh": {"numero": "999"}}}));
    }

    #[test]
    fn test_set_deep_overwrites_scalar_intermediate() {
        let mut target = json!({"documentos": "nenhum"});
        set_deep(&mut target, "documentos.rg", json!("1"));
        assert_eq!(target, json!({"documentos": {"rg": "1"}}));
    }

    #[test]
    fn test_set_deep_preserves_siblings() {
        let mut target = json!({"contatos": {"telefone": "1"}});
        set_deep(&mut target, "contatos.emailFuncional", json!("a@b"));
        assert_eq!(target, json!({"contatos": {"telefone": "1", "emailFuncional": "a@b"}}));
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        for path in ["re", "documentos.rg", "documentos.cnh.vencimento", "a.b.c.d.e"] {
            let mut root = json!({});
            set_deep(&mut root, path, json!("v"));
            assert_eq!(get_deep(&root, path), Some(&json!("v")), "caminho {}", path);
        }
    }

    #[test]
    fn test_get_deep_in_map() {
        let record = json!({"documentos": {"rg": "77"}, "re": "1"});
        let map = record.as_object().unwrap();
        assert_eq!(get_deep_in(map, "documentos.rg"), Some(&json!("77")));
        assert_eq!(get_deep_in(map, "re"), Some(&json!("1")));
        assert_eq!(get_deep_in(map, "documentos.cpf"), None);
    }

    #[test]
    fn test_merge_patch_nested() {
        let mut target = json!({"documentos": {"rg": "1", "cpf": "2"}, "qra": "A"});
        let patch = json!({"documentos": {"rg": "9"}, "posto": "cabo"});
        merge_patch(
            target.as_object_mut().unwrap(),
            patch.as_object().unwrap().clone(),
        );
        assert_eq!(
            target,
            json!({"documentos": {"rg": "9", "cpf": "2"}, "qra": "A", "posto": "cabo"})
        );
    }
}
