//! Field rules shared by the API and the editor, plus the conversion of
//! `validator` errors into field violations and one aggregated message.

use std::borrow::Cow;

use serde::Serialize;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::models::country;

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// At least one character; whitespace counts.
pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(violation("required", "is required"));
    }
    Ok(())
}

pub fn validate_nationality(value: &str) -> Result<(), ValidationError> {
    validate_required(value)?;
    if country(value).is_none() {
        return Err(violation("unknown_country", "must be a known country code"));
    }
    Ok(())
}

/// Empty links are allowed and mean "no link".
pub fn validate_link(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(_) => Ok(()),
        Err(_) => Err(violation("url", "must be a valid URL")),
    }
}

pub fn validate_photo(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match crate::data_uri::DataUri::parse(value) {
        Ok(uri) if uri.mime.starts_with("image/") => Ok(()),
        _ => Err(violation("photo", "must be a base64 image data URI")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// `real_name` -> `realName`, so violations use the JSON field names.
fn json_field_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    match err.code.as_ref() {
        "length" => match err.params.get("max") {
            Some(max) => format!("must be at most {} characters", max),
            None => "has an invalid length".to_string(),
        },
        code => format!("is invalid ({})", code),
    }
}

/// Flatten `errors` into a list sorted by field name.
pub fn field_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out = Vec::new();
    for (field, kind) in errors.errors() {
        let field = json_field_name(&field.to_string());
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    out.push(FieldViolation {
                        field: field.clone(),
                        code: err.code.to_string(),
                        message: describe(err),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => out.extend(field_violations(inner)),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    out.extend(field_violations(inner));
                }
            }
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
    out
}

/// Human-readable aggregate, e.g.
/// `Validation error: qrCodeLink: must be a valid URL; username: is required`.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let parts: Vec<String> = field_violations(errors)
        .into_iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect();
    format!("Validation error: {}", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCard;
    use serde_json::json;
    use validator::Validate;

    fn card(overrides: serde_json::Value) -> NewCard {
        let mut base = json!({
            "username": "KawaiiSenpai",
            "realName": "Jean Dupont",
            "nationality": "fr",
            "status": "Otaku",
            "genre": "Shonen",
            "quote": "Omae wa mou shindeiru",
        });
        for (k, v) in overrides.as_object().unwrap() {
            base[k] = v.clone();
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_json_field_name() {
        assert_eq!(json_field_name("qr_code_link"), "qrCodeLink");
        assert_eq!(json_field_name("username"), "username");
        assert_eq!(json_field_name("realName"), "realName");
    }

    #[test]
    fn test_bad_url_names_the_field() {
        let c = card(json!({ "qrCodeEnabled": true, "qrCodeLink": "not-a-url" }));
        let errors = c.validate().unwrap_err();
        let msg = validation_message(&errors);
        assert!(msg.contains("qrCodeLink"), "{}", msg);
        assert!(msg.contains("valid URL"), "{}", msg);
    }

    #[test]
    fn test_empty_link_is_allowed() {
        let c = card(json!({ "qrCodeEnabled": true, "qrCodeLink": "" }));
        assert!(c.validate().is_ok());
        let c = card(json!({ "qrCodeLink": "https://myanimelist.net/profile/senpai" }));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_aggregated() {
        let c: NewCard = serde_json::from_value(json!({ "username": "x" })).unwrap();
        let violations = field_violations(&c.validate().unwrap_err());
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["genre", "nationality", "quote", "realName", "status"]
        );
        assert!(violations.iter().all(|v| v.code == "required"));
    }

    #[test]
    fn test_whitespace_counts_as_a_value() {
        let c = card(json!({ "quote": " ", "realName": "  " }));
        assert!(c.validate().is_ok());

        let c = card(json!({ "quote": "" }));
        let msg = validation_message(&c.validate().unwrap_err());
        assert_eq!(msg, "Validation error: quote: is required");
    }

    #[test]
    fn test_length_limits() {
        let c = card(json!({ "username": "u".repeat(51) }));
        let msg = validation_message(&c.validate().unwrap_err());
        assert_eq!(msg, "Validation error: username: must be at most 50 characters");

        let c = card(json!({ "username": "é".repeat(50), "quote": "q".repeat(500) }));
        assert!(c.validate().is_ok());

        let c = card(json!({ "quote": "q".repeat(501) }));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_unknown_country() {
        let c = card(json!({ "nationality": "zz" }));
        let violations = field_violations(&c.validate().unwrap_err());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "nationality");
        assert_eq!(violations[0].code, "unknown_country");
    }

    #[test]
    fn test_photo_must_be_image_data_uri() {
        let c = card(json!({ "photo": "https://example.com/me.png" }));
        assert!(c.validate().is_err());
        let c = card(json!({ "photo": "data:text/plain;base64,aGVsbG8=" }));
        assert!(c.validate().is_err());
        let c = card(json!({ "photo": "data:image/png;base64,iVBORw0KGgo=" }));
        assert!(c.validate().is_ok());
    }
}
