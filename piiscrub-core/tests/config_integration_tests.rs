// piiscrub-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use piiscrub_core::config::{merge_rules, PatternDef, RecognizerRule, ScrubConfig};
use piiscrub_core::{AnalyzeRequest, AnalyzerEngine, OperatorConfig};

fn write_yaml(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_load_default_rules() {
    let config = ScrubConfig::load_default_rules().unwrap();
    assert!(config.validate().is_ok());
    for name in ["email_address", "phone_number", "credit_card", "us_ssn", "url"] {
        assert!(config.rules.iter().any(|r| r.name == name), "missing default rule {}", name);
    }
    let itin = config.rules.iter().find(|r| r.name == "us_itin").unwrap();
    assert!(itin.opt_in);
    assert!(!itin.is_active());
    assert_eq!(config.operator_for("PERSON"), Some(&OperatorConfig::Replace { new_value: None }));
}

#[test]
fn test_load_from_file() -> Result<()> {
    let file = write_yaml(
        r##"
rules:
  - name: employee_id
    entity_type: EMPLOYEE_ID
    patterns:
      - name: emp
        regex: 'EMP-\d{4}-\d{3}'
        score: 0.7
    context: [employee]
operators:
  EMPLOYEE_ID:
    type: mask
    masking_char: "#"
analysis:
  score_threshold: 0.3
"##,
    )?;
    let config = ScrubConfig::load_from_file(file.path())?;
    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].entity_type, "EMPLOYEE_ID");
    assert_eq!(config.rules[0].patterns[0].score, 0.7);
    assert_eq!(config.rules[0].language, "en");
    assert_eq!(config.analysis.score_threshold(), 0.3);
    assert!(matches!(
        config.operators.get("EMPLOYEE_ID"),
        Some(OperatorConfig::Mask { masking_char: '#', chars_to_mask: None, from_end: false })
    ));
    Ok(())
}

#[test]
fn test_load_from_file_reports_every_problem() -> Result<()> {
    let file = write_yaml(
        r#"
rules:
  - name: broken
    entity_type: BROKEN
    patterns:
      - name: bad
        regex: '(unclosed'
  - name: broken
    entity_type: ""
    validator: nonsense
    patterns:
      - name: ok
        regex: 'x'
        score: 2.0
"#,
    )?;
    let err = ScrubConfig::load_from_file(file.path()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("invalid regex"));
    assert!(message.contains("Duplicate rule name"));
    assert!(message.contains("empty `entity_type`"));
    assert!(message.contains("unknown validator 'nonsense'"));
    assert!(message.contains("outside [0, 1]"));
    Ok(())
}

#[test]
fn test_merge_rules_user_overrides_default() -> Result<()> {
    let defaults = ScrubConfig::load_default_rules()?;
    let default_count = defaults.rules.len();
    let user = ScrubConfig {
        rules: vec![
            RecognizerRule {
                name: "phone_number".into(),
                entity_type: "PHONE_NUMBER".into(),
                patterns: vec![PatternDef { name: "ext".into(), regex: r"\bx\d{4}\b".into(), score: 0.9 }],
                ..Default::default()
            },
            RecognizerRule {
                name: "ticket".into(),
                entity_type: "TICKET".into(),
                patterns: vec![PatternDef { name: "t".into(), regex: r"\bTCK-\d+\b".into(), score: 0.9 }],
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let merged = merge_rules(defaults, Some(user));
    assert_eq!(merged.rules.len(), default_count + 1);
    let phone = merged.rules.iter().find(|r| r.name == "phone_number").unwrap();
    assert_eq!(phone.patterns[0].regex, r"\bx\d{4}\b");

    let analyzer = AnalyzerEngine::new(&merged)?;
    let text = "ticket TCK-42, ext x1234, 555-123-4567";
    let found: Vec<&str> = analyzer
        .analyze(text, &AnalyzeRequest::default())?
        .iter()
        .map(|r| &text[r.start..r.end])
        .collect();
    assert_eq!(found, vec!["TCK-42", "x1234"]);
    Ok(())
}

#[test]
fn test_set_active_rules_enables_opt_in_and_disables() -> Result<()> {
    let mut config = ScrubConfig::load_default_rules()?;
    config.set_active_rules(&["us_itin".to_string()], &["url".to_string(), "no_such_rule".to_string()]);
    assert!(config.rules.iter().any(|r| r.name == "us_itin"));
    assert!(!config.rules.iter().any(|r| r.name == "url"));

    let analyzer = AnalyzerEngine::new(&config)?;
    let text = "ITIN 912-70-1234 at https://example.com";
    let results = analyzer.analyze(text, &AnalyzeRequest::default())?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entity_type, "US_ITIN");
    Ok(())
}
