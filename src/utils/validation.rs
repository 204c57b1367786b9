use crate::utils::error::{DigestError, Result};
use std::fmt::Display;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Display, reason: impl Into<String>) -> DigestError {
    DigestError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Accepts only absolute http(s) URLs.
pub fn validate_url(field: &str, raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(invalid(field, raw, "a URL is required"));
    }
    let url = Url::parse(raw).map_err(|e| invalid(field, raw, format!("not a URL ({})", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(field, raw, format!("scheme {:?} is not http(s)", url.scheme())));
    }
    Ok(())
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field, path, "a path is required"));
    }
    if path.contains('\0') {
        return Err(invalid(field, path.escape_default(), "NUL byte in path"));
    }
    Ok(())
}

pub fn validate_positive_number(field: &str, value: u64, at_least: u64) -> Result<()> {
    if value < at_least {
        return Err(invalid(field, value, format!("must be {} or more", at_least)));
    }
    Ok(())
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "must not be blank"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        let reason = format!("must lie within {}..={}", min, max);
        return Err(invalid(field, value, reason));
    }
    Ok(())
}

/// Two settings that only make sense together, like a push origin and its token.
pub fn validate_paired<A, B>(
    first_field: &str,
    first: &Option<A>,
    second_field: &str,
    second: &Option<B>,
) -> Result<()> {
    match (first, second) {
        (Some(_), None) => Err(DigestError::MissingConfigError {
            field: second_field.to_string(),
        }),
        (None, Some(_)) => Err(DigestError::MissingConfigError {
            field: first_field.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("notify.origin", "https://gotify.example.com").is_ok());
        assert!(validate_url("notify.origin", "http://localhost:8080").is_ok());
        assert!(validate_url("notify.origin", "").is_err());
        assert!(validate_url("notify.origin", "invalid-url").is_err());
        assert!(validate_url("notify.origin", "ftp://example.com").is_err());
    }

    #[test]
    fn test_blank_store_path_is_rejected() {
        let err = validate_path("store.path", "   ").unwrap_err();
        assert!(matches!(err, DigestError::InvalidConfigValueError { field, .. } if field == "store.path"));
        assert!(validate_path("store.path", "./movies.db").is_ok());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("collection.window_seconds", 90, 1).is_ok());
        assert!(validate_positive_number("collection.window_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_paired() {
        let origin = Some("https://gotify.example.com".to_string());
        let token: Option<String> = None;
        let err = validate_paired("notify.origin", &origin, "notify.token", &token).unwrap_err();
        assert!(matches!(err, DigestError::MissingConfigError { field } if field == "notify.token"));

        let none: Option<String> = None;
        assert!(validate_paired("notify.origin", &none, "notify.token", &none).is_ok());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("collection.max_page_depth", 2, 1, 5).is_ok());
        assert!(validate_range("collection.max_page_depth", 9, 1, 5).is_err());
    }
}
