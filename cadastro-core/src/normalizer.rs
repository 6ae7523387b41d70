//! # Normalizador de Texto para Português Brasileiro
//!
//! Primeira etapa de toda a análise: coloca o texto em minúsculas e remove
//! os acentos, de modo que "é" e "e" sejam comparados como iguais.
//! Todos os extratores e o classificador de intenção trabalham sobre a
//! saída de [`normalize`], nunca sobre o texto cru.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use cadastro_core::normalizer::normalize;
//!
//! assert_eq!(normalize("Situação ÁGIL"), "situacao agil");
//! ```

use unicode_normalization::UnicodeNormalization;

/// Faixa Unicode das marcas diacríticas combinantes (U+0300..=U+036F).
///
/// Após a decomposição NFD, "ç" vira "c" + U+0327 e "ã" vira "a" + U+0303;
/// descartar esta faixa é o que remove os acentos.
fn is_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Normaliza um texto: minúsculas + remoção de diacríticos.
///
/// Função total: texto vazio produz texto vazio. Nunca altera o argumento.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_diacritic(*c))
        .collect()
}

/// Primeira letra de cada palavra em maiúscula ("joao silva" → "Joao Silva").
///
/// Divide apenas por espaço simples, preservando o restante de cada palavra.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
