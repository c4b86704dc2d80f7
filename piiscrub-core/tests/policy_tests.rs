// piiscrub-core/tests/policy_tests.rs
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

use piiscrub_core::policy::{list_policies_in, SIGNATURE_ALG};
use piiscrub_core::*;

const POLICY_YAML: &str = r#"
policy_name: support_tickets
version: "1.0"
description: "Ticket exports sent to the summarizer"
entities: [PERSON, EMAIL_ADDRESS, PHONE_NUMBER, US_ITIN]
score_threshold: 0.4
allow_list: [support@example.com]
rules:
  - name: us_itin
    enabled: true
  - name: url
    enabled: false
operators:
  EMAIL_ADDRESS:
    type: hash
  PHONE_NUMBER:
    type: mask
    chars_to_mask: 4
    from_end: true
"#;

fn policy() -> Policy {
    serde_yml::from_str(POLICY_YAML).unwrap()
}

#[test]
fn test_policy_validation_success() -> Result<()> {
    let config = ScrubConfig::load_default_rules()?;
    policy().validate(&config)?;
    Ok(())
}

#[test]
fn test_policy_validation_failures() -> Result<()> {
    let config = ScrubConfig::load_default_rules()?;

    let mut unknown_rule = policy();
    unknown_rule.rules.push(PolicyRule { name: "unknown_rule".into(), enabled: Some(true) });
    assert!(unknown_rule.validate(&config).is_err());

    let mut no_version = policy();
    no_version.version = "  ".into();
    assert!(no_version.validate(&config).is_err());

    let mut bad_threshold = policy();
    bad_threshold.score_threshold = Some(1.5);
    assert!(bad_threshold.validate(&config).is_err());

    let mut bad_operator = policy();
    bad_operator.operators = BTreeMap::from([(
        "PERSON".to_string(),
        OperatorConfig::Mask { masking_char: '\n', chars_to_mask: None, from_end: false },
    )]);
    assert!(bad_operator.validate(&config).is_err());
    Ok(())
}

#[test]
fn test_apply_policy_and_analyze_request() -> Result<()> {
    let policy = policy();
    let config = apply_policy_to_config(&policy, ScrubConfig::load_default_rules()?);
    assert_eq!(config.rules.iter().find(|r| r.name == "us_itin").unwrap().enabled, Some(true));
    assert_eq!(config.rules.iter().find(|r| r.name == "url").unwrap().enabled, Some(false));
    assert_eq!(config.analysis.score_threshold, Some(0.4));

    let request = policy.analyze_request();
    assert_eq!(request.score_threshold, Some(0.4));
    assert_eq!(request.allow_list, vec!["support@example.com".to_string()]);

    let text = "Mail jane@example.com or support@example.com, call 555-123-4567 re ITIN 912-70-1234.";
    let result = sanitize_text_with(&config, &request, text)?;
    let hashed = &result.items[0];
    assert_eq!(hashed.entity_type, "EMAIL_ADDRESS");
    assert_eq!(hashed.text.len(), 64);
    assert!(result.text.contains("support@example.com"));
    assert!(result.text.contains("555-123-****"));
    assert!(result.text.ends_with("ITIN <US_ITIN>."));
    Ok(())
}

#[test]
fn test_sign_and_verify_policy() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("support_tickets.yaml");
    fs::write(&path, POLICY_YAML)?;
    let key = b"0123456789abcdef0123456789abcdef";

    sign_policy(&path, key)?;
    let raw = fs::read(&path)?;
    let signed: Policy = serde_yml::from_slice(&raw)?;
    assert_eq!(signed.signature_alg.as_deref(), Some(SIGNATURE_ALG));
    assert!(signed.verify_signature(&raw, key)?);
    assert!(signed.verify_signature(&raw, b"another key").is_err());

    let tampered = String::from_utf8(raw)?.replace("score_threshold: 0.4", "score_threshold: 0.9");
    let tampered_policy: Policy = serde_yml::from_str(&tampered)?;
    assert!(tampered_policy.verify_signature(tampered.as_bytes(), key).is_err());
    Ok(())
}

#[test]
fn test_load_policy_by_path_and_listing() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("support_tickets.yaml");
    fs::write(&path, POLICY_YAML)?;
    fs::write(dir.path().join("broken.yaml"), "policy_name: [unterminated")?;
    fs::write(dir.path().join("notes.txt"), "ignored")?;

    let loaded = load_policy_by_name(path.to_str().unwrap())?;
    assert_eq!(loaded, policy());

    let listed = list_policies_in(&[dir.path().to_path_buf()]);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].policy_name, "support_tickets");
    assert!(!listed[0].signed);

    assert!(load_policy_by_name("definitely_not_a_policy_name").is_err());
    Ok(())
}

#[test]
fn test_candidate_paths_use_yaml_extension() {
    let paths = policy_candidate_paths("gdpr");
    assert!(!paths.is_empty());
    assert!(paths.iter().all(|p| p.ends_with("policies/gdpr.yaml")));
}
