//! Bounded string/buffer utilities (spec.md §4.A): the `Lbuf` sink every
//! evaluation writes into, delimiter-aware tokenization, and the
//! wildcard/regex matchers used by the built-in function table.

pub mod delim;
pub mod lbuf;
pub mod regexmatch;
pub mod strfuncs;
pub mod wildcard;

pub use delim::Delim;
pub use lbuf::Lbuf;
