//! Shared primitives used by every layer of the TinyMUSH core: the stable
//! object identity type, flag words, fixed buffer-size limits, and the
//! in-band error string convention.

pub mod attrs;
pub mod dbref;
pub mod flags;
pub mod inband;
pub mod limits;

pub use attrs::{ATTR_LOCK, ATTR_MAILBOX, ATTR_PASSWORD};
pub use dbref::{Dbref, ObjectKind};
pub use flags::{AttrFlags, DescriptorFlags, Flags1};
