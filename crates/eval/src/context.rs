use tinymush_acl::{AttrResolver, FunctionLimitMask};
use tinymush_common::Dbref;
use tinymush_db::ObjectDb;
use tinymush_vars::{RegFrame, StackStore, StructStore, XVarStore};

/// Looks up the attribute text a `ucall()` target names, so `tinymush-eval`
/// doesn't need to own attribute-name interning itself (spec.md §4.E
/// lambda form / ucall contract).
pub trait AttrTextLookup {
    fn lookup(&self, obj: Dbref, attr_name: &str) -> Option<String>;
}

impl<F: Fn(Dbref, &str) -> Option<String>> AttrTextLookup for F {
    fn lookup(&self, obj: Dbref, attr_name: &str) -> Option<String> {
        self(obj, attr_name)
    }
}

/// One evaluation's working state (spec.md §4.E): the object database and
/// the D-layer stores it reads/writes, the caller/enactor/executor triple,
/// positional `%0..%9` args, and the limit counters every function call
/// checks against.
pub struct EvalContext<'a> {
    pub db: &'a mut ObjectDb,
    pub regs: &'a mut RegFrame,
    pub xvars: &'a mut XVarStore,
    pub stacks: &'a mut StackStore,
    pub structs: &'a mut StructStore,
    pub attrs: &'a dyn AttrResolver,
    pub attr_text: &'a dyn AttrTextLookup,

    pub caller: Dbref,
    pub enactor: Dbref,
    pub executor: Dbref,
    pub args: Vec<String>,

    pub limitmask: FunctionLimitMask,
    pub invocations: usize,
    pub invocation_limit: usize,
    pub nesting: usize,
    pub max_nesting: usize,
}

impl<'a> EvalContext<'a> {
    /// Increments the per-evaluation function-call counter; once the limit
    /// is exceeded every further call fails in-band rather than recursing
    /// further (spec.md §4.E, §5 CPU-budget suspension point).
    pub fn charge_invocation(&mut self) -> Result<(), String> {
        self.invocations += 1;
        if self.invocations > self.invocation_limit {
            return Err("#-1 FUNCTION INVOCATION LIMIT EXCEEDED".to_string());
        }
        Ok(())
    }

    pub fn enter_nesting(&mut self) -> Result<(), String> {
        self.nesting += 1;
        if self.nesting > self.max_nesting {
            self.nesting -= 1;
            return Err("#-1 NESTING LIMIT EXCEEDED".to_string());
        }
        Ok(())
    }

    pub fn leave_nesting(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }
}
