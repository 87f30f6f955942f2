use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Regex for list query keys: a field name with an optional bracketed operator
    /// - Valid: "status", "createdAt[gte]", "type[in]"
    /// - Invalid: "created_at", "status[eq]", "title[gt", "[lt]"
    pub static ref FILTER_KEY_REGEX: Regex =
        Regex::new(r"^([A-Za-z]+)(?:\[(gt|gte|lt|lte|in)\])?$").unwrap();

    /// Regex for a single sort key, `-` prefix means descending
    /// - Valid: "createdAt", "-createdAt", "title"
    /// - Invalid: "--title", "created_at", "+title"
    pub static ref SORT_KEY_REGEX: Regex = Regex::new(r"^-?[A-Za-z]+$").unwrap();
}

/// Rejects strings that are empty once trimmed
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_key_regex_valid() {
        let caps = FILTER_KEY_REGEX.captures("createdAt[gte]").unwrap();
        assert_eq!(&caps[1], "createdAt");
        assert_eq!(caps.get(2).map(|m| m.as_str()), Some("gte"));

        let caps = FILTER_KEY_REGEX.captures("status").unwrap();
        assert_eq!(&caps[1], "status");
        assert!(caps.get(2).is_none());
    }

    #[test]
    fn test_filter_key_regex_invalid() {
        assert!(!FILTER_KEY_REGEX.is_match("status[eq]")); // unsupported operator
        assert!(!FILTER_KEY_REGEX.is_match("title[gt")); // unterminated
        assert!(!FILTER_KEY_REGEX.is_match("[lt]")); // no field
        assert!(!FILTER_KEY_REGEX.is_match("created_at")); // underscore
    }

    #[test]
    fn test_sort_key_regex() {
        assert!(SORT_KEY_REGEX.is_match("createdAt"));
        assert!(SORT_KEY_REGEX.is_match("-createdAt"));
        assert!(!SORT_KEY_REGEX.is_match("--title"));
        assert!(!SORT_KEY_REGEX.is_match("+title"));
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("pothole").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }
}
