//! Address text normalization
//!
//! Canonicalizes free-text addresses before they are sent to a geocoder:
//! strips diacritics (`São` → `Sao`), folds dash variants to `-` and
//! collapses whitespace. The function is pure and idempotent.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize an address for matching and query construction.
pub fn normalize_address(raw: &str) -> String {
    let folded: String = raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize_address("São Paulo"), "Sao Paulo");
        assert_eq!(normalize_address("Avenida João Pessoa"), "Avenida Joao Pessoa");
        assert_eq!(normalize_address("Guarulhos - SÃO PAULO"), "Guarulhos - SAO PAULO");
        assert_eq!(normalize_address("Praça da Sé, Ribeirão Preto"), "Praca da Se, Ribeirao Preto");
    }

    #[test]
    fn test_folds_dashes() {
        assert_eq!(normalize_address("Campinas – SP"), "Campinas - SP");
        assert_eq!(normalize_address("Campinas — SP"), "Campinas - SP");
        assert_eq!(normalize_address("Campinas - SP"), "Campinas - SP");
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(normalize_address("  Rua   das\tFlores \n 10  "), "Rua das Flores 10");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_address(""), "");
        assert_eq!(normalize_address("   "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "São Paulo",
            "Rua Conceição,  123 — Jundiaí – SP, Brasil",
            "  ÁÉÍÓÚ àèìòù ç ñ  ",
            "Rua 25 de Março, 1000, São Paulo - SP",
            "",
            "x\u{0301}\u{0301}",
        ];
        for s in samples {
            let once = normalize_address(s);
            assert_eq!(normalize_address(&once), once, "not idempotent for {:?}", s);
        }
    }
}
