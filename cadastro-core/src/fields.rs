//! # Mapeamento de Campos — Nome Falado → Caminho Canônico
//!
//! O usuário fala "rg", "email" ou "nome completo"; o registro guarda esses
//! dados em caminhos pontuados como `documentos.rg` ou
//! `contatos.emailFuncional`. Este módulo é o dicionário fechado que liga
//! um ao outro.
//!
//! | Nome falado (normalizado) | Caminho canônico |
//! |---------------------------|------------------|
//! | `nome`, `nomecompleto`    | `nomeCompleto` |
//! | `qra`                     | `qra` |
//! | `re`                      | `re` |
//! | `cpf`                     | `cpf` |
//! | `rg`                      | `documentos.rg` |
//! | `email`                   | `contatos.emailFuncional` |
//! | `telefone`                | `contatos.telefone` |
//! | `codigoopm`               | `codigoOpm` |
//! | `posto`                   | `posto` |
//! | `situacao`                | `situacao` |
//! | `cnhnumero`               | `documentos.cnh.numero` |
//! | `cnhcategoria`            | `documentos.cnh.categoria` |
//! | `cnhvencimento`           | `documentos.cnh.vencimento` |

use serde::{Deserialize, Serialize};

use crate::normalizer::normalize;

/// Dicionário completo aceito por [`map_field_path`].
const FIELD_PATHS: &[(&str, &str)] = &[
    ("nome", "nomeCompleto"),
    ("nomecompleto", "nomeCompleto"),
    ("qra", "qra"),
    ("re", "re"),
    ("cpf", "cpf"),
    ("rg", "documentos.rg"),
    ("email", "contatos.emailFuncional"),
    ("telefone", "contatos.telefone"),
    ("codigoopm", "codigoOpm"),
    ("posto", "posto"),
    ("situacao", "situacao"),
    ("cnhnumero", "documentos.cnh.numero"),
    ("cnhcategoria", "documentos.cnh.categoria"),
    ("cnhvencimento", "documentos.cnh.vencimento"),
];

/// Campos comparados por igualdade exata no filtro (identificadores).
/// Todos os demais usam "contém", sem diferenciar maiúsculas.
pub const EXACT_FIELDS: &[&str] = &["re", "cpf", "documentos.rg", "codigoOpm"];

/// Filtro `campo = valor` extraído da frase.
///
/// O modo de comparação (exato ou substring) não é guardado aqui:
/// deriva de [`FieldQuery::is_exact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldQuery {
    /// Caminho canônico (ex: `documentos.rg`).
    pub field: String,
    /// Valor procurado, já normalizado.
    pub value: String,
}

impl FieldQuery {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `true` se o campo pertence ao conjunto de identificadores exatos.
    pub fn is_exact(&self) -> bool {
        is_exact_field(&self.field)
    }
}

/// Alvo de atualização: "atualize o `<campo>` ... para `<valor>`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTarget {
    pub path: String,
    pub value: String,
}

/// Converte um nome de campo falado no caminho canônico.
///
/// A entrada é normalizada e tem todos os espaços removidos
/// ("CNH número" → "cnhnumero"). Nomes desconhecidos retornam `None`,
/// que deve ser tratado como falha de extração.
pub fn map_field_path(name: &str) -> Option<&'static str> {
    let key: String = normalize(name).split_whitespace().collect();
    FIELD_PATHS
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, path)| *path)
}

pub fn is_exact_field(field: &str) -> bool {
    EXACT_FIELDS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_known_aliases() {
        assert_eq!(map_field_path("nome"), Some("nomeCompleto"));
        assert_eq!(map_field_path("nome completo"), Some("nomeCompleto"));
        assert_eq!(map_field_path("rg"), Some("documentos.rg"));
        assert_eq!(map_field_path("email"), Some("contatos.emailFuncional"));
        assert_eq!(map_field_path("CNH número"), Some("documentos.cnh.numero"));
        assert_eq!(map_field_path("situação"), Some("situacao"));
    }

    #[test]
    fn test_map_unknown_is_none() {
        assert_eq!(map_field_path("salario"), None);
        assert_eq!(map_field_path(""), None);
    }

    #[test]
    fn test_exact_fields() {
        assert!(FieldQuery::new("re", "1").is_exact());
        assert!(FieldQuery::new("documentos.rg", "1").is_exact());
        assert!(!FieldQuery::new("qra", "x").is_exact());
        assert!(!FieldQuery::new("nomeCompleto", "x").is_exact());
    }
}
