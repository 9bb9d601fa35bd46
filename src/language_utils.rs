use isolang::Language;

use crate::errors::ConfigError;

/// Language utilities for ISO language code handling
///
/// This module provides functions for validating ISO 639-1 (2-letter) and
/// ISO 639-3 (3-letter) language codes and for rendering the English names
/// used in translation prompts.
/// Look up a language by ISO code.
fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    }
}

/// Validate a language code, returning the normalized lowercase form.
///
/// An empty or unrecognized code is a configuration error; translation
/// calls must never proceed with a guessed language.
pub fn validate_language_code(code: &str) -> Result<String, ConfigError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidLanguage("language code is empty".to_string()));
    }
    match lookup(trimmed) {
        Some(_) => Ok(trimmed.to_lowercase()),
        None => Err(ConfigError::InvalidLanguage(trimmed.to_string())),
    }
}

/// Get the English name of a language from its ISO code.
///
/// Used to render human-readable language names into system prompts;
/// models follow "French" far more reliably than "fr".
pub fn get_language_name(code: &str) -> Result<String, ConfigError> {
    lookup(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| ConfigError::InvalidLanguage(code.trim().to_string()))
}

/// Check whether two language codes refer to the same language,
/// tolerating a 639-1 / 639-3 mix (e.g. "en" vs "eng").
pub fn language_codes_match(a: &str, b: &str) -> bool {
    match (lookup(a), lookup(b)) {
        (Some(lang_a), Some(lang_b)) => lang_a == lang_b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}
