use tinymush_common::flags::AttrFlags;
use tinymush_common::limits::FIRST_USER_ATTR;
use tinymush_common::Dbref;

use crate::error::DbError;

/// (dbref, attr-number) -> (owner, flags, value-string) (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub owner: Dbref,
    pub flags: AttrFlags,
    pub value: String,
}

impl Attribute {
    pub fn is_user_defined(number: u32) -> bool {
        number >= FIRST_USER_ATTR
    }
}

/// Validates a user attribute name: lowercase, first char alphabetic,
/// remainder alphanumeric or `_ - . #` (spec.md §3).
pub fn validate_attr_name(name: &str) -> Result<(), DbError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(DbError::BadAttrName(name.to_string()));
    };
    if !first.is_ascii_lowercase() {
        return Err(DbError::BadAttrName(name.to_string()));
    }
    for c in chars {
        if !(c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || matches!(c, '_' | '-' | '.' | '#'))
        {
            return Err(DbError::BadAttrName(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_with_punctuation() {
        assert!(validate_attr_name("my_attr-1.x#2").is_ok());
    }

    #[test]
    fn rejects_leading_digit_or_uppercase() {
        assert!(validate_attr_name("1attr").is_err());
        assert!(validate_attr_name("Attr").is_err());
        assert!(validate_attr_name("").is_err());
    }
}
