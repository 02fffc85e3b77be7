use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

/// Characters that must not reach the substring-match layer.
static FORBIDDEN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>"';]"#).unwrap());

const MAX_TERM_LEN: usize = 100;

/// Outcome of search-term validation. A value, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct TermValidation {
    pub valid: bool,
    pub message: String,
    /// The trimmed term, present only when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_term: Option<String>,
}

impl TermValidation {
    fn rejected(message: &str) -> Self {
        Self {
            valid: false,
            message: message.to_string(),
            clean_term: None,
        }
    }
}

/// Validate a search term: non-empty after trimming, at most 100
/// characters, and free of `< > " ' ;`.
pub fn validate_term(term: &str) -> TermValidation {
    let clean = term.trim();
    if clean.is_empty() {
        return TermValidation::rejected("search term is required");
    }
    if clean.chars().count() > MAX_TERM_LEN {
        return TermValidation::rejected("search term cannot exceed 100 characters");
    }
    if FORBIDDEN.is_match(clean) {
        return TermValidation::rejected("search term contains forbidden characters");
    }
    TermValidation {
        valid: true,
        message: "search term is valid".to_string(),
        clean_term: Some(clean.to_string()),
    }
}
