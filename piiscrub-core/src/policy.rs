// File: piiscrub-core/src/policy.rs

//! policy.rs - Named anonymization policies for piiscrub.
//!
//! A policy bundles the choices a team usually wants fixed for a workload:
//! which entity types to look for, the score threshold, values that are
//! always allowed, which recognizers are switched on or off, and the operator
//! applied to each entity type. Policies are YAML files found by name in the
//! standard policy directories, or loaded from an explicit path.
//!
//! Policies can be signed with HMAC-SHA256 so a deployment can refuse a
//! policy that was edited after review.
//!
//! license: MIT OR Apache-2.0

use anyhow::{anyhow, bail, Context, Result};
use hmac::{Hmac, Mac};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use sha2::Sha256;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::AnalyzeRequest;
use crate::anonymizer::operators::OperatorConfig;
use crate::config::ScrubConfig;

type HmacSha256 = Hmac<Sha256>;

/// Only supported signature algorithm.
pub const SIGNATURE_ALG: &str = "hmac-sha256";

/// Environment variable holding the hex-encoded policy signing key.
pub const POLICY_KEY_ENV: &str = "PIISCRUB_POLICY_KEY";

/// A named anonymization policy.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct Policy {
    pub policy_name: String,
    pub version: String,
    pub description: Option<String>,
    /// Entity types to detect. `None` means everything the analyzer supports.
    pub entities: Option<Vec<String>>,
    pub score_threshold: Option<f64>,
    pub allow_list: Vec<String>,
    pub rules: Vec<PolicyRule>,
    pub operators: BTreeMap<String, OperatorConfig>,
    /// Placeholder template for the pseudonymize operator.
    pub pseudonym_format: Option<String>,
    pub signature: Option<String>,
    pub signature_alg: Option<String>,
}

/// Enables or disables a recognizer by rule name.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PolicyRule {
    pub name: String,
    pub enabled: Option<bool>,
}

impl Policy {
    pub fn validate(&self, default_config: &ScrubConfig) -> Result<()> {
        if self.version.trim().is_empty() {
            bail!("Policy '{}' validation failed: 'version' field cannot be empty.", self.policy_name);
        }

        let known_rules: HashSet<&str> = default_config.rules.iter().map(|r| r.name.as_str()).collect();
        for rule_override in &self.rules {
            if !known_rules.contains(rule_override.name.as_str()) {
                bail!("Policy '{}' validation failed: rule '{}' not found in configuration.",
                    self.policy_name, rule_override.name);
            }
        }

        for (entity, operator) in &self.operators {
            operator.validate().map_err(|e| {
                anyhow!("Policy '{}' validation failed: operator for '{}' is invalid: {}", self.policy_name, entity, e)
            })?;
        }

        if let Some(threshold) = self.score_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                bail!("Policy '{}' validation failed: 'score_threshold' {} is outside [0, 1].",
                    self.policy_name, threshold);
            }
        }

        Ok(())
    }

    /// Verifies the HMAC-SHA256 signature against the raw YAML the policy was parsed from.
    ///
    /// Unsigned policies pass. A signed policy with a wrong signature or an
    /// unknown algorithm is an error.
    pub fn verify_signature(&self, raw_bytes: &[u8], key: &[u8]) -> Result<bool> {
        let Some(stored_signature) = self.signature.as_deref() else {
            debug!("Policy '{}' is unsigned, skipping signature verification.", self.policy_name);
            return Ok(true);
        };

        if self.signature_alg.as_deref() != Some(SIGNATURE_ALG) {
            bail!("Policy '{}' signature verification failed: unsupported signature algorithm '{}'. Only '{}' is supported.",
                self.policy_name, self.signature_alg.as_deref().unwrap_or("none"), SIGNATURE_ALG);
        }

        let computed_signature = compute_signature(raw_bytes, key)?;
        if computed_signature.eq_ignore_ascii_case(stored_signature) {
            debug!("Policy '{}' signature verification succeeded.", self.policy_name);
            Ok(true)
        } else {
            warn!("Policy '{}' signature verification failed.", self.policy_name);
            Err(anyhow!("Policy signature verification failed for policy '{}'. The policy may have been tampered with.", self.policy_name))
        }
    }

    /// The analyzer request this policy implies.
    pub fn analyze_request(&self) -> AnalyzeRequest {
        let mut request = AnalyzeRequest::default().with_allow_list(self.allow_list.clone());
        if let Some(entities) = &self.entities {
            request = request.with_entities(entities.clone());
        }
        if let Some(threshold) = self.score_threshold {
            request = request.with_score_threshold(threshold);
        }
        request
    }
}

/// Re-serializes the policy YAML without `signature` and `signature_alg`.
fn canonical_bytes_for_signature(raw_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut value: Value = serde_yml::from_slice(raw_bytes)
        .context("Failed to parse policy YAML for signing.")?;

    if let Value::Mapping(mapping) = &mut value {
        mapping.remove(&Value::String("signature".to_string()));
        mapping.remove(&Value::String("signature_alg".to_string()));
    }

    serde_yml::to_string(&value)
        .context("Failed to re-serialize policy for signing.")
        .map(String::into_bytes)
}

fn compute_signature(raw_bytes: &[u8], key: &[u8]) -> Result<String> {
    let canonical = canonical_bytes_for_signature(raw_bytes)?;
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to initialize HMAC-SHA256 with key: {}", e))?;
    mac.update(&canonical);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Directories searched for policies, in priority order.
pub fn policy_dirs() -> Vec<PathBuf> {
    vec![
        dirs::home_dir().map(|p| p.join(".piiscrub").join("policies")),
        dirs::config_dir().map(|p| p.join("piiscrub").join("policies")),
        Some(PathBuf::from("/etc/piiscrub/policies")),
        Some(PathBuf::from("./policies")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn policy_candidate_paths(name: &str) -> Vec<PathBuf> {
    policy_dirs()
        .into_iter()
        .map(|dir| dir.join(format!("{}.yaml", name)))
        .collect()
}

/// Loads a policy from a file path, or by name from the policy directories.
///
/// When `PIISCRUB_POLICY_KEY` is set the signature is checked.
pub fn load_policy_by_name(name_or_path: &str) -> Result<Policy> {
    debug!("Attempting to load policy from: '{}'", name_or_path);

    let path_to_load = {
        let path = Path::new(name_or_path);
        if path.is_file() {
            Some(path.to_path_buf())
        } else {
            policy_candidate_paths(name_or_path)
                .into_iter()
                .find(|p| p.is_file())
        }
    }
    .with_context(|| format!("Policy '{}' not found. It is not a file path, and was not found in the policy directories.", name_or_path))?;

    let raw_bytes = fs::read(&path_to_load)
        .with_context(|| format!("reading policy file {}", path_to_load.display()))?;
    let policy: Policy = serde_yml::from_slice(&raw_bytes)
        .with_context(|| format!("parsing policy YAML {}", path_to_load.display()))?;

    if let Ok(key_hex) = std::env::var(POLICY_KEY_ENV) {
        let key = hex::decode(key_hex.trim())
            .with_context(|| format!("Failed to decode {} from hex.", POLICY_KEY_ENV))?;
        policy.verify_signature(&raw_bytes, &key)?;
    } else if policy.signature.is_some() {
        warn!("Policy '{}' is signed, but {} is not set. Signature verification skipped.",
            policy.policy_name, POLICY_KEY_ENV);
    }

    debug!("Loaded policy '{}' from {}.", policy.policy_name, path_to_load.display());
    Ok(policy)
}

/// Signs a policy file in place with HMAC-SHA256.
pub fn sign_policy(path: &Path, key: &[u8]) -> Result<()> {
    debug!("Signing policy file: {}", path.display());

    let raw_bytes = fs::read(path)
        .with_context(|| format!("reading policy file {}", path.display()))?;
    let mut policy: Policy = serde_yml::from_slice(&raw_bytes)
        .with_context(|| format!("parsing policy YAML for signing {}", path.display()))?;

    // Sign the re-serialized struct so the stored form and the signed form agree.
    policy.signature = None;
    policy.signature_alg = None;
    let unsigned_yaml = serde_yml::to_string(&policy)
        .context("Failed to serialize policy for signing.")?;
    let signature = compute_signature(unsigned_yaml.as_bytes(), key)?;

    policy.signature = Some(signature);
    policy.signature_alg = Some(SIGNATURE_ALG.to_string());
    let signed_yaml = serde_yml::to_string(&policy)
        .context("Failed to re-serialize signed policy.")?;
    fs::write(path, signed_yaml)
        .with_context(|| format!("writing signed policy to file {}", path.display()))?;

    debug!("Signed policy '{}'.", policy.policy_name);
    Ok(())
}

/// Applies rule enable/disable overrides and operator overrides to a config.
pub fn apply_policy_to_config(policy: &Policy, mut config: ScrubConfig) -> ScrubConfig {
    debug!("Applying policy '{}' to configuration.", policy.policy_name);

    for rule_override in &policy.rules {
        match config.rules.iter_mut().find(|r| r.name == rule_override.name) {
            Some(rule) => {
                if let Some(enabled) = rule_override.enabled {
                    debug!("Applying enabled={} override for rule '{}'", enabled, rule_override.name);
                    rule.enabled = Some(enabled);
                }
            }
            None => warn!("Policy rule '{}' not found in configuration. It will be ignored.", rule_override.name),
        }
    }

    config
        .operators
        .extend(policy.operators.iter().map(|(k, v)| (k.clone(), v.clone())));
    if policy.score_threshold.is_some() {
        config.analysis.score_threshold = policy.score_threshold;
    }

    config
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySummary {
    pub policy_name: String,
    pub version: String,
    pub description: Option<String>,
    pub signed: bool,
    pub path: Option<PathBuf>,
}

/// Lists policies found in the policy directories. Unparseable files are skipped with a warning.
pub fn list_available_policies() -> Vec<PolicySummary> {
    list_policies_in(&policy_dirs())
}

pub fn list_policies_in(dirs: &[PathBuf]) -> Vec<PolicySummary> {
    let mut out = Vec::new();
    let mut seen_paths: HashSet<PathBuf> = HashSet::new();

    for dir in dirs {
        let Ok(entries) = fs::read_dir(dir) else {
            debug!("Policy directory not found: {}", dir.display());
            continue;
        };
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| matches!(p.extension().and_then(|s| s.to_str()), Some("yaml" | "yml")))
            .collect();
        paths.sort();

        for path in paths {
            if !seen_paths.insert(path.clone()) {
                continue;
            }
            match fs::read_to_string(&path).map(|s| serde_yml::from_str::<Policy>(&s)) {
                Ok(Ok(policy)) => out.push(PolicySummary {
                    policy_name: policy.policy_name,
                    version: policy.version,
                    description: policy.description,
                    signed: policy.signature.is_some(),
                    path: Some(path),
                }),
                Ok(Err(e)) => warn!("Failed to parse policy at {}: {}", path.display(), e),
                Err(e) => warn!("Failed to read policy file at {}: {}", path.display(), e),
            }
        }
    }
    out
}
