use bitflags::bitflags;

bitflags! {
    /// Classes of side effect an evaluation subtree may be forbidden from
    /// performing, set by `nofx()`/`sandbox()` (spec.md §4.I item 3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FunctionLimitMask: u8 {
        /// Functions that read or write the object database (`set()`, `@create`-equivalents).
        const FN_DBFX    = 1 << 0;
        /// Functions that read or write q-registers / named registers.
        const FN_QFX     = 1 << 1;
        /// Functions that write to a descriptor's output (`pemit()`, `@pemit`-equivalents).
        const FN_OUTFX   = 1 << 2;
        /// Functions that read or write named variables (`x()`/`setvar()`).
        const FN_VARFX   = 1 << 3;
        /// Functions that touch the per-object data stack.
        const FN_STACKFX = 1 << 4;
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("FUNCTION DISABLED")]
pub struct FunctionDisabled;

/// `nofx()`: forbid the given classes for the remainder of the current
/// evaluation subtree; `sandbox()` is the same with every class forbidden.
pub fn check_allowed(active: FunctionLimitMask, needed: FunctionLimitMask) -> Result<(), FunctionDisabled> {
    if active.intersects(needed) {
        Err(FunctionDisabled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_forbids_every_class() {
        let sandbox = FunctionLimitMask::all();
        assert_eq!(check_allowed(sandbox, FunctionLimitMask::FN_OUTFX), Err(FunctionDisabled));
        assert_eq!(check_allowed(sandbox, FunctionLimitMask::FN_DBFX), Err(FunctionDisabled));
    }

    #[test]
    fn disjoint_masks_are_allowed() {
        let active = FunctionLimitMask::FN_OUTFX;
        assert!(check_allowed(active, FunctionLimitMask::FN_DBFX).is_ok());
    }

    #[test]
    fn empty_mask_forbids_nothing() {
        assert!(check_allowed(FunctionLimitMask::empty(), FunctionLimitMask::FN_STACKFX).is_ok());
    }
}
