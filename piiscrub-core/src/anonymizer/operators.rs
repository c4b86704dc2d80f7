// piiscrub-core/src/anonymizer/operators.rs
//! Anonymization operators and their configuration.
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use crate::errors::ScrubError;

fn default_masking_char() -> char {
    '*'
}

/// Digest used by the `hash` operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashType {
    #[default]
    Sha256,
    Sha512,
}

/// How a detected span is transformed in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatorConfig {
    /// Replaces the span with `new_value`, or `<ENTITY_TYPE>` when unset.
    Replace {
        #[serde(default)]
        new_value: Option<String>,
    },
    /// Removes the span entirely.
    Redact,
    /// Overwrites characters with `masking_char`. `chars_to_mask: None` masks all of them.
    Mask {
        #[serde(default = "default_masking_char")]
        masking_char: char,
        #[serde(default)]
        chars_to_mask: Option<usize>,
        #[serde(default)]
        from_end: bool,
    },
    /// Hex digest of `salt || value`.
    Hash {
        #[serde(default)]
        hash_type: HashType,
        #[serde(default)]
        salt: Option<String>,
    },
    /// Leaves the span untouched but still reports it.
    Keep,
    /// Consistent, reversible placeholder such as `[PERSON_1]`.
    Pseudonymize,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        OperatorConfig::Replace { new_value: None }
    }
}

impl OperatorConfig {
    /// The operator name as written in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            OperatorConfig::Replace { .. } => "replace",
            OperatorConfig::Redact => "redact",
            OperatorConfig::Mask { .. } => "mask",
            OperatorConfig::Hash { .. } => "hash",
            OperatorConfig::Keep => "keep",
            OperatorConfig::Pseudonymize => "pseudonymize",
        }
    }

    /// Builds the default configuration for an operator given by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name.to_ascii_lowercase().as_str() {
            "replace" => OperatorConfig::Replace { new_value: None },
            "redact" => OperatorConfig::Redact,
            "mask" => OperatorConfig::Mask { masking_char: default_masking_char(), chars_to_mask: None, from_end: false },
            "hash" => OperatorConfig::Hash { hash_type: HashType::default(), salt: None },
            "keep" => OperatorConfig::Keep,
            "pseudonymize" => OperatorConfig::Pseudonymize,
            _ => return None,
        };
        Some(op)
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            OperatorConfig::Mask { masking_char, .. } if masking_char.is_control() => {
                Err(format!("masking_char {:?} is a control character", masking_char))
            }
            _ => Ok(()),
        }
    }

    /// Computes the replacement for `original`.
    ///
    /// `Pseudonymize` needs a mapping store and is rejected here; the
    /// anonymizer routes it to a `Pseudonymizer` instead.
    pub fn operate(&self, entity_type: &str, original: &str) -> Result<String, ScrubError> {
        let out = match self {
            OperatorConfig::Replace { new_value } => new_value
                .clone()
                .unwrap_or_else(|| format!("<{}>", entity_type)),
            OperatorConfig::Redact => String::new(),
            OperatorConfig::Mask { masking_char, chars_to_mask, from_end } => {
                mask(original, *masking_char, *chars_to_mask, *from_end)
            }
            OperatorConfig::Hash { hash_type, salt } => {
                let salt = salt.as_deref().unwrap_or("");
                match hash_type {
                    HashType::Sha256 => {
                        let mut hasher = Sha256::new();
                        hasher.update(salt.as_bytes());
                        hasher.update(original.as_bytes());
                        hex::encode(hasher.finalize())
                    }
                    HashType::Sha512 => {
                        let mut hasher = Sha512::new();
                        hasher.update(salt.as_bytes());
                        hasher.update(original.as_bytes());
                        hex::encode(hasher.finalize())
                    }
                }
            }
            OperatorConfig::Keep => original.to_string(),
            OperatorConfig::Pseudonymize => {
                return Err(ScrubError::InvalidOperator(
                    entity_type.to_string(),
                    "pseudonymize requires a Pseudonymizer with a mapping store".to_string(),
                ));
            }
        };
        Ok(out)
    }
}

fn mask(original: &str, masking_char: char, chars_to_mask: Option<usize>, from_end: bool) -> String {
    let total = original.chars().count();
    let n = chars_to_mask.unwrap_or(total).min(total);
    original
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let masked = if from_end { i >= total - n } else { i < n };
            if masked { masking_char } else { c }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_defaults_to_entity_tag() {
        let op = OperatorConfig::default();
        assert_eq!(op.operate("PERSON", "John").unwrap(), "<PERSON>");
        let op = OperatorConfig::Replace { new_value: Some("ANON".into()) };
        assert_eq!(op.operate("PERSON", "John").unwrap(), "ANON");
    }

    #[test]
    fn mask_counts_chars_not_bytes() {
        let op = OperatorConfig::Mask { masking_char: '#', chars_to_mask: Some(4), from_end: true };
        assert_eq!(op.operate("PHONE_NUMBER", "555-123-4567").unwrap(), "555-123-####");
        let op = OperatorConfig::Mask { masking_char: '*', chars_to_mask: Some(2), from_end: false };
        assert_eq!(op.operate("PERSON", "Zoë").unwrap(), "**ë");
        let op = OperatorConfig::Mask { masking_char: '*', chars_to_mask: Some(99), from_end: false };
        assert_eq!(op.operate("PERSON", "Ann").unwrap(), "***");
    }

    #[test]
    fn hash_is_salted_hex() {
        let plain = OperatorConfig::Hash { hash_type: HashType::Sha256, salt: None };
        let salted = OperatorConfig::Hash { hash_type: HashType::Sha256, salt: Some("pepper".into()) };
        let a = plain.operate("EMAIL_ADDRESS", "a@b.io").unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, salted.operate("EMAIL_ADDRESS", "a@b.io").unwrap());
        let long = OperatorConfig::Hash { hash_type: HashType::Sha512, salt: None };
        assert_eq!(long.operate("EMAIL_ADDRESS", "a@b.io").unwrap().len(), 128);
    }

    #[test]
    fn redact_keep_and_pseudonymize() {
        assert_eq!(OperatorConfig::Redact.operate("URL", "http://x.io").unwrap(), "");
        assert_eq!(OperatorConfig::Keep.operate("URL", "http://x.io").unwrap(), "http://x.io");
        assert!(matches!(
            OperatorConfig::Pseudonymize.operate("URL", "http://x.io"),
            Err(ScrubError::InvalidOperator(_, _))
        ));
    }

    #[test]
    fn parses_tagged_yaml() {
        let yaml = "type: mask\nmasking_char: \"#\"\nchars_to_mask: 4\nfrom_end: true\n";
        let op: OperatorConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(op, OperatorConfig::Mask { masking_char: '#', chars_to_mask: Some(4), from_end: true });
        let op: OperatorConfig = serde_yml::from_str("type: redact\n").unwrap();
        assert_eq!(op, OperatorConfig::Redact);
        assert_eq!(OperatorConfig::from_name("HASH").map(|o| o.name()), Some("hash"));
    }
}
