//! Tipos de erro do interpretador, do store e do serviço de geração.

use thiserror::Error;

/// Falhas do store de registros (viram HTTP 500).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("erro de E/S no armazenamento: {0}")]
    Io(#[from] std::io::Error),
    #[error("erro de serialização no armazenamento: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Falhas do serviço de geração de texto. Nunca chegam ao usuário do
/// comando: a narração cai na mensagem determinística.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("serviço de geração não configurado")]
    NotConfigured,
    #[error("falha HTTP na geração: {0}")]
    Http(#[from] reqwest::Error),
    #[error("falha de autenticação: {0}")]
    Auth(String),
    #[error("resposta inválida do serviço de geração: {0}")]
    Upstream(String),
}

/// Resultado negativo de um comando em linguagem natural.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Prompt, id ou filtro ausente/ilegível.
    #[error("{0}")]
    Validation(String),
    /// Id ou filtro sem nenhum registro correspondente.
    #[error("{0}")]
    NotFound(String),
    /// Filtro que casa com mais de um registro onde só um é aceito.
    #[error("{0}")]
    Conflict(String),
    /// Nenhuma regra de intenção reconheceu a frase.
    #[error("{0}")]
    UnknownIntent(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    /// Status HTTP correspondente.
    pub fn status_code(&self) -> u16 {
        match self {
            CommandError::Validation(_) | CommandError::UnknownIntent(_) => 400,
            CommandError::NotFound(_) => 404,
            CommandError::Conflict(_) => 409,
            CommandError::Store(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CommandError::Validation("x".into()).status_code(), 400);
        assert_eq!(CommandError::UnknownIntent("x".into()).status_code(), 400);
        assert_eq!(CommandError::NotFound("x".into()).status_code(), 404);
        assert_eq!(CommandError::Conflict("x".into()).status_code(), 409);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disco");
        assert_eq!(CommandError::from(StoreError::from(io)).status_code(), 500);
    }

    #[test]
    fn test_message_is_plain() {
        let err = CommandError::NotFound("Item não encontrado".into());
        assert_eq!(err.to_string(), "Item não encontrado");
    }
}
