//! Upload input validation helpers.

use notehive_core::AppError;

/// Validate file size against the configured cap.
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Normalize MIME type by stripping parameters (e.g. "application/pdf; charset=utf-8" -> "application/pdf").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against allowlist. Compares normalized MIME type only.
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}

/// Validate file extension and return it lowercased.
pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    if !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file extension. Allowed extensions: {}",
            allowed_extensions.join(", ")
        )));
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        vec!["pdf".to_string(), "pptx".to_string()]
    }

    #[test]
    fn test_file_size_cap() {
        assert!(validate_file_size(100, 1024).is_ok());
        assert!(validate_file_size(1024, 1024).is_ok());
        let err = validate_file_size(1025, 1024).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_extension_allowlist() {
        assert_eq!(validate_file_extension("notes.pdf", &extensions()).unwrap(), "pdf");
        assert_eq!(validate_file_extension("deck.PPTX", &extensions()).unwrap(), "pptx");
        assert!(validate_file_extension("script.exe", &extensions()).is_err());
        assert!(validate_file_extension("noextension", &extensions()).is_err());
    }

    #[test]
    fn test_content_type_allowlist_ignores_parameters() {
        let allowed = vec!["application/pdf".to_string()];
        assert!(validate_content_type("application/pdf", &allowed).is_ok());
        assert!(validate_content_type("application/pdf; charset=utf-8", &allowed).is_ok());
        assert!(validate_content_type("APPLICATION/PDF", &allowed).is_ok());
        assert!(validate_content_type("text/html", &allowed).is_err());
    }
}
