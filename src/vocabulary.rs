use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const VOCAB_ES: &str = include_str!("../assets/vocabulary/es.json");
const VOCAB_FR: &str = include_str!("../assets/vocabulary/fr.json");

pub const BUILTIN_LANGUAGES: &[&str] = &["es", "fr"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub term: String,
    pub translation: String,
}

impl VocabularyItem {
    pub fn new(term: &str, translation: &str) -> Self {
        Self {
            term: term.to_string(),
            translation: translation.to_string(),
        }
    }
}

/// Built-in pool for `language`, or `None` if none ships with the crate.
pub fn builtin(language: &str) -> Option<Vec<VocabularyItem>> {
    let raw = match language {
        "es" => VOCAB_ES,
        "fr" => VOCAB_FR,
        _ => return None,
    };
    let items: Vec<VocabularyItem> = serde_json::from_str(raw).unwrap_or_default();
    Some(sanitize(items))
}

/// Load a `[{ "term": ..., "translation": ... }]` JSON file.
pub fn load_from_path(path: &Path) -> Result<Vec<VocabularyItem>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading vocabulary file {}", path.display()))?;
    let items: Vec<VocabularyItem> = serde_json::from_str(&content)
        .with_context(|| format!("parsing vocabulary file {}", path.display()))?;
    Ok(sanitize(items))
}

/// Trim entries, drop blank ones and keep the first occurrence of each term.
pub fn sanitize(items: Vec<VocabularyItem>) -> Vec<VocabularyItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| {
            let term = item.term.trim();
            let translation = item.translation.trim();
            if term.is_empty() || translation.is_empty() {
                return None;
            }
            Some(VocabularyItem::new(term, translation))
        })
        .filter(|item| seen.insert(item.term.clone()))
        .collect()
}
