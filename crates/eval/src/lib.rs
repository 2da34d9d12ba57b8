//! Recursive expression evaluator (spec.md §4.E): `%`-substitutions,
//! `[...]` sub-evaluation, and the built-in function dispatch table. This
//! is the one component every other layer calls into — it reads and
//! writes the D-layer stores, consults the object database, and asks
//! `tinymush-acl` before running any function tagged with a side-effect
//! class.

mod context;
mod eval;
mod functions;
mod parse;

pub use context::{AttrTextLookup, EvalContext};
pub use eval::eval;
pub use functions::{dispatch, lookup, FuncSpec};
