use tinymush_common::Dbref;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DbError {
    #[error("{0} is not a valid object")]
    BadObject(Dbref),
    #[error("actor is not permitted to do that")]
    NotPermitted,
    #[error("moving {0} into {1} would create a containment cycle")]
    Cycle(Dbref, Dbref),
    #[error("parent chain exceeds the configured nesting limit")]
    ParentNestLimit,
    #[error("object attribute storage exceeds the configured byte cap")]
    AttrBytesLimit,
    #[error("invalid attribute name: {0}")]
    BadAttrName(String),
}
