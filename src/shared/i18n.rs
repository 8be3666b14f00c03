use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::header::LanguageCode;

const BUILTIN_AR: &str = include_str!("../../locales/ar.json");
const BUILTIN_EN: &str = include_str!("../../locales/en.json");

/// Nested translation dictionaries, one per language. Immutable once built.
#[derive(Debug, Default)]
pub struct Dictionaries {
    by_language: HashMap<LanguageCode, Map<String, Value>>,
}

/// Collects dictionary fragments before freezing them into `Dictionaries`
#[derive(Debug, Default)]
pub struct DictionariesBuilder {
    by_language: HashMap<LanguageCode, Map<String, Value>>,
}

impl DictionariesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the dictionaries shipped with the binary
    pub fn with_builtin() -> Result<Self> {
        let mut builder = Self::new();
        builder.register_language(
            LanguageCode::Ar,
            serde_json::from_str(BUILTIN_AR).context("Invalid built-in Arabic dictionary")?,
        );
        builder.register_language(
            LanguageCode::En,
            serde_json::from_str(BUILTIN_EN).context("Invalid built-in English dictionary")?,
        );
        Ok(builder)
    }

    /// Merge a dictionary for one language. Existing keys are overridden,
    /// nothing is removed.
    pub fn register_language(&mut self, lang: LanguageCode, fragment: Value) -> &mut Self {
        match fragment {
            Value::Object(map) => {
                let target = self.by_language.entry(lang).or_default();
                merge_into(target, map);
            }
            other => warn!(%lang, "Ignoring non-object dictionary fragment: {other}"),
        }
        self
    }

    /// Merge a fragment shaped `{ "ar": {...}, "en": {...} }`.
    /// Unknown language codes are skipped.
    pub fn register(&mut self, fragment: Value) -> &mut Self {
        let Value::Object(languages) = fragment else {
            warn!("Ignoring dictionary fragment that is not an object");
            return self;
        };
        for (code, dictionary) in languages {
            match LanguageCode::from_code(&code) {
                Some(lang) => {
                    self.register_language(lang, dictionary);
                }
                None => warn!(code = %code, "Skipping dictionary for unsupported language"),
            }
        }
        self
    }

    /// Read and merge a fragment file
    pub fn register_file(&mut self, path: &Path) -> Result<&mut Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read translations {}", path.display()))?;
        let fragment: Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid translations JSON in {}", path.display()))?;
        debug!(path = %path.display(), "Registered translation fragment");
        Ok(self.register(fragment))
    }

    pub fn build(self) -> Arc<Dictionaries> {
        Arc::new(Dictionaries {
            by_language: self.by_language,
        })
    }
}

fn merge_into(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Object(incoming) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => merge_into(existing, incoming),
                _ => {
                    target.insert(key, Value::Object(incoming));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

impl Dictionaries {
    /// Walk a dotted path in one language. Only string leaves count.
    pub fn get(&self, lang: LanguageCode, key: &str) -> Option<&str> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut node = self.by_language.get(&lang)?.get(first)?;
        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }
        node.as_str()
    }
}

/// Translation lookup bound to the current language
#[derive(Debug, Clone)]
pub struct I18n {
    language: LanguageCode,
    dictionaries: Arc<Dictionaries>,
}

impl I18n {
    pub fn new(language: LanguageCode, dictionaries: Arc<Dictionaries>) -> Self {
        Self {
            language,
            dictionaries,
        }
    }

    pub fn set_language(&mut self, language: LanguageCode) {
        self.language = language;
    }

    /// Look up `key` in the current language, then English, then fall back
    /// to `fallback` or the key itself.
    pub fn t(&self, key: &str, fallback: Option<&str>) -> String {
        if key.is_empty() {
            return String::new();
        }
        self.dictionaries
            .get(self.language, key)
            .or_else(|| self.dictionaries.get(LanguageCode::FALLBACK, key))
            .or(fallback.filter(|f| !f.is_empty()))
            .unwrap_or(key)
            .to_string()
    }
}
