use url::Url;

use crate::registry::RegistryError;

pub const CUSTOM_CODE_MIN_LEN: usize = 3;
pub const CUSTOM_CODE_MAX_LEN: usize = 20;

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<(), RegistryError> {
    let parsed = Url::parse(raw.trim()).map_err(|e| RegistryError::InvalidUrl(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(RegistryError::InvalidUrl(
            "URL must use http or https scheme".to_string(),
        ));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(RegistryError::InvalidUrl(
            "URL must have a valid host".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_custom_code(code: &str) -> Result<(), RegistryError> {
    if code.len() < CUSTOM_CODE_MIN_LEN || code.len() > CUSTOM_CODE_MAX_LEN {
        return Err(RegistryError::InvalidCustomCode(format!(
            "must be {CUSTOM_CODE_MIN_LEN}-{CUSTOM_CODE_MAX_LEN} characters"
        )));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(RegistryError::InvalidCustomCode(
            "only letters, numbers, and hyphens are allowed".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/path?q=1").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("  https://example.com  ").is_ok());

        for bad in ["", "example.com", "ftp://example.com", "mailto:me@example.com", "https://"] {
            assert!(
                matches!(validate_url(bad), Err(RegistryError::InvalidUrl(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_custom_code() {
        assert!(validate_custom_code("abc").is_ok());
        assert!(validate_custom_code("my-link-2024").is_ok());
        assert!(validate_custom_code(&"a".repeat(20)).is_ok());

        for bad in ["ab", "has space", "under_score", "slash/", "ünï"] {
            assert!(
                matches!(validate_custom_code(bad), Err(RegistryError::InvalidCustomCode(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_custom_code(&"a".repeat(21)).is_err());
    }
}
