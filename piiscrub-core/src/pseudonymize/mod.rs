// piiscrub-core/src/pseudonymize/mod.rs
//! Reversible pseudonymization.
//!
//! Each distinct `(entity_type, value)` pair gets a stable placeholder such as
//! `[PERSON_1]`. The mapping is kept in a `MappingStore`, so text can later be
//! restored with `deanonymize`.
//!
//! License: MIT OR APACHE 2.0

pub mod store;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::json;
use tinytemplate::TinyTemplate;

use crate::errors::ScrubError;
use crate::recognizer_result::log_operator_action_debug;

pub use store::{EntityMapping, FileMappingStore, InMemoryMappingStore, MappingStore};

/// Placeholder layout used unless a custom template is given.
pub const DEFAULT_PLACEHOLDER_FORMAT: &str = "[{entity_type}_{index}]";

/// Substituted for placeholders that have no mapping.
pub const NOT_FOUND: &str = "[NOT_FOUND]";

const TEMPLATE_NAME: &str = "placeholder";

static DEFAULT_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[A-Z][A-Z0-9_]*_\d+\]").expect("placeholder regex is valid")
});

/// Allocates placeholders and restores originals through a mapping store.
#[derive(Debug)]
pub struct Pseudonymizer {
    store: Box<dyn MappingStore>,
    format: String,
}

impl Pseudonymizer {
    pub fn new(store: Box<dyn MappingStore>) -> Self {
        Self {
            store,
            format: DEFAULT_PLACEHOLDER_FORMAT.to_string(),
        }
    }

    /// Uses a custom placeholder template with `{entity_type}` and `{index}` fields.
    ///
    /// The template must produce a different placeholder for each index.
    pub fn with_format(mut self, template: impl Into<String>) -> Result<Self, ScrubError> {
        let template = template.into();
        let first = render(&template, "ENTITY", 1)?;
        let second = render(&template, "ENTITY", 2)?;
        if first == second {
            return Err(ScrubError::PlaceholderTemplate(format!(
                "template '{}' must include {{index}}",
                template
            )));
        }
        self.format = template;
        Ok(self)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn store(&self) -> &dyn MappingStore {
        self.store.as_ref()
    }

    pub fn into_store(self) -> Box<dyn MappingStore> {
        self.store
    }

    /// Persists the store.
    pub fn flush(&mut self) -> Result<(), ScrubError> {
        self.store.flush()
    }

    /// Returns the placeholder for `original`, allocating one on first sight.
    pub fn pseudonymize(&mut self, entity_type: &str, original: &str) -> Result<String, ScrubError> {
        if let Some(existing) = self.store.find(entity_type, original) {
            return Ok(existing.placeholder.clone());
        }

        // Indexes continue after what the store holds; skip any that a
        // different template run already claimed.
        let mut index = self.store.count(entity_type) + 1;
        let placeholder = loop {
            let candidate = render(&self.format, entity_type, index)?;
            if self.store.get(&candidate).is_none() {
                break candidate;
            }
            index += 1;
        };

        log_operator_action_debug(module_path!(), original, &placeholder, "pseudonymize");
        self.store
            .put(EntityMapping::new(placeholder.clone(), original, entity_type))?;
        Ok(placeholder)
    }

    /// Restores original values in `text`.
    ///
    /// With the default template every `[UPPER_SNAKE_N]` token is replaced,
    /// unknown ones by `[NOT_FOUND]`. With a custom template only placeholders
    /// known to the store are replaced.
    pub fn deanonymize(&self, text: &str) -> Result<String, ScrubError> {
        if self.format == DEFAULT_PLACEHOLDER_FORMAT {
            let restored = DEFAULT_PLACEHOLDER.replace_all(text, |caps: &Captures| {
                let token = &caps[0];
                match self.store.get(token) {
                    Some(mapping) => mapping.original.clone(),
                    None => {
                        debug!("No mapping for placeholder {}.", token);
                        NOT_FOUND.to_string()
                    }
                }
            });
            return Ok(restored.into_owned());
        }

        let mut placeholders: Vec<String> = self
            .store
            .mappings()
            .into_iter()
            .map(|m| m.placeholder)
            .collect();
        if placeholders.is_empty() {
            return Ok(text.to_string());
        }
        placeholders.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = placeholders
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = Regex::new(&alternation)
            .map_err(|e| ScrubError::PlaceholderTemplate(format!("cannot match placeholders: {}", e)))?;

        let restored = matcher.replace_all(text, |caps: &Captures| {
            self.store
                .get(&caps[0])
                .map(|m| m.original.clone())
                .unwrap_or_else(|| caps[0].to_string())
        });
        Ok(restored.into_owned())
    }
}

fn render(template: &str, entity_type: &str, index: usize) -> Result<String, ScrubError> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template(TEMPLATE_NAME, template)
        .map_err(|e| ScrubError::PlaceholderTemplate(e.to_string()))?;
    let context = json!({ "entity_type": entity_type, "index": index });
    tt.render(TEMPLATE_NAME, &context)
        .map_err(|e| ScrubError::PlaceholderTemplate(e.to_string()))
}
