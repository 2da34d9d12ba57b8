//! Register, variable, stack, structure and grid storage (spec.md
//! component D). Each module owns one kind of per-object or per-call
//! state; none of them know how to evaluate expressions, only how to
//! hold and mutate the data an evaluator reaches through `r()`, `x()`,
//! `push()`, `z()` and friends.

mod grid;
mod regframe;
mod stacks;
mod structures;
mod xvars;

pub use grid::{GridError, GridStore};
pub use regframe::RegFrame;
pub use stacks::StackStore;
pub use structures::{CompType, ComponentDef, Instance, StructDef, StructError, StructStore};
pub use xvars::{XVarError, XVarStore};
