//! Thin wrapper over the `regex` crate standing in for the PCRE matcher
//! named in spec.md §4.A (see SPEC_FULL.md §1: `regex` is the idiomatic
//! Rust substitute the example pack reaches for).

use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum RegexMatchError {
    #[error("invalid regular expression: {0}")]
    InvalidPattern(String),
}

/// Compiles `pattern` and matches it against `text`, returning the full
/// match plus each capture group's text (empty string for unmatched
/// optional groups), in group order starting at group 1.
pub fn regmatch(text: &str, pattern: &str) -> Result<Option<Vec<String>>, RegexMatchError> {
    let re = Regex::new(pattern).map_err(|e| RegexMatchError::InvalidPattern(e.to_string()))?;
    let Some(caps) = re.captures(text) else {
        return Ok(None);
    };
    let groups = (1..caps.len())
        .map(|i| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect();
    Ok(Some(groups))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_regmatch_abc123() {
        // regmatch(abc123,^([a-z]+)([0-9]+)$, 1 2) -> 1, r(1)=abc, r(2)=123
        let groups = regmatch("abc123", r"^([a-z]+)([0-9]+)$")
            .expect("valid regex")
            .expect("should match");
        assert_eq!(groups, vec!["abc".to_string(), "123".to_string()]);
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(regmatch("xyz", r"^[0-9]+$").unwrap(), None);
    }

    #[test]
    fn invalid_pattern_is_error() {
        assert!(regmatch("x", "(").is_err());
    }
}
