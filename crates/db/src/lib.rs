//! The object/attribute database and its invariants (spec.md §3, §4.C):
//! entities, ownership, attribute storage, lifecycle, and the flat-file
//! persistence compatibility format named in spec.md §6.

pub mod attr;
pub mod error;
pub mod object;
pub mod persistence;
pub mod store;

pub use attr::Attribute;
pub use error::DbError;
pub use object::Object;
pub use persistence::{decode_flatfile, encode_flatfile, FlatFileStore, InMemoryStore, PersistentStore, StoreIoError};
pub use store::ObjectDb;
