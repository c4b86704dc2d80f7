// piiscrub-core/tests/sanitize_text_tests.rs
use anyhow::Result;
use std::collections::BTreeMap;
use test_log::test; // Routes `log` output through env_logger while testing

use piiscrub_core::{
    sanitize_text, sanitize_text_with, AnalyzeRequest, OperatorConfig, ScrubConfig, ScrubError,
};

#[test]
fn readme_example_is_sanitized() -> Result<()> {
    let out = sanitize_text("My name is John Doe and my phone number is 555-123-4567.")?;
    assert_eq!(out, "My name is <PERSON> and my phone number is <PHONE_NUMBER>.");
    Ok(())
}

#[test]
fn several_entity_types_in_one_text() -> Result<()> {
    let text = "Contact jane.doe@example.com or visit https://example.com/profile. Card 4111 1111 1111 1111.";
    let out = sanitize_text(text)?;
    assert_eq!(out, "Contact <EMAIL_ADDRESS> or visit <URL>. Card <CREDIT_CARD>.");
    Ok(())
}

#[test]
fn invalid_checksums_are_left_alone() -> Result<()> {
    // Fails Luhn, and area 000 is never issued.
    let text = "Card 4111 1111 1111 1112, SSN 000-12-3456.";
    assert_eq!(sanitize_text(text)?, text);
    Ok(())
}

#[test]
fn configured_operators_are_applied() -> Result<()> {
    let mut config = ScrubConfig::load_default_rules()?;
    config.operators = BTreeMap::from([
        ("DEFAULT".to_string(), OperatorConfig::Redact),
        (
            "PHONE_NUMBER".to_string(),
            OperatorConfig::Mask { masking_char: '*', chars_to_mask: Some(4), from_end: true },
        ),
        ("PERSON".to_string(), OperatorConfig::Replace { new_value: Some("[name]".into()) }),
    ]);

    let text = "My name is John Doe, mail john@doe.io or call 555-123-4567.";
    let result = sanitize_text_with(&config, &AnalyzeRequest::default(), text)?;
    assert_eq!(result.text, "My name is [name], mail  or call 555-123-****.");

    let summary = result.summary();
    let entities: Vec<&str> = summary.iter().map(|s| s.entity_type.as_str()).collect();
    assert_eq!(entities, vec!["EMAIL_ADDRESS", "PERSON", "PHONE_NUMBER"]);
    for item in &result.items {
        assert_eq!(&result.text[item.start..item.end], item.text);
    }
    Ok(())
}

#[test]
fn request_filters_entities() -> Result<()> {
    let config = ScrubConfig::load_default_rules()?;
    let request = AnalyzeRequest::default().with_entities(vec!["PHONE_NUMBER".into()]);
    let result = sanitize_text_with(&config, &request, "My name is John Doe, call 555-123-4567.")?;
    assert_eq!(result.text, "My name is John Doe, call <PHONE_NUMBER>.");
    Ok(())
}

#[test]
fn unsupported_language_surfaces_typed_error() -> Result<()> {
    let config = ScrubConfig::load_default_rules()?;
    let request = AnalyzeRequest::default().with_language("de");
    let err = sanitize_text_with(&config, &request, "Hallo").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScrubError>(),
        Some(ScrubError::UnsupportedLanguage(lang, _)) if lang == "de"
    ));
    Ok(())
}
