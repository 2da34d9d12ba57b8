//! Built-in attribute numbers (spec.md §3: "attribute, addressed by
//! attribute number or name"). These sit below `FIRST_USER_ATTR` and never
//! collide with a user-defined attribute.

/// Stores a player's password hash (spec.md §4.H "password-checked" connect).
pub const ATTR_PASSWORD: u32 = 1;
/// Stores an object's default lock key (spec.md §4.I).
pub const ATTR_LOCK: u32 = 2;
/// Stores a player's mailbox contents.
pub const ATTR_MAILBOX: u32 = 3;
