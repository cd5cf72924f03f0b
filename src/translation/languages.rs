use crate::utils::{PipelineError, Result};

/// Language codes the remote pipeline accepts as a source.
pub const SUPPORTED_LANGUAGES: [&str; 23] = [
    "hi", "gom", "kn", "doi", "brx", "ur", "ta", "ks", "as", "bn", "mr", "sd", "mai", "pa", "ml",
    "mni", "te", "sa", "ne", "sat", "gu", "or", "en",
];

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

pub fn ensure_supported(code: &str) -> Result<()> {
    if is_supported(code) {
        Ok(())
    } else {
        Err(PipelineError::UnsupportedLanguage(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert!(is_supported("hi"));
        assert!(is_supported("sat"));
        assert!(is_supported("en"));
        assert!(!is_supported("HI"));
        assert!(!is_supported("fr"));
    }

    #[test]
    fn test_unsupported_is_error() {
        assert!(matches!(
            ensure_supported("xx"),
            Err(PipelineError::UnsupportedLanguage(code)) if code == "xx"
        ));
    }
}
