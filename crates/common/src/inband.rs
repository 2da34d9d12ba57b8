//! Helpers for the in-band `#-1 <REASON>` error convention used by the
//! expression evaluator (spec.md §7: evaluation errors are strings, never
//! exceptions).

/// Formats an in-band evaluator error string, e.g. `#-1 NO MATCH`.
pub fn inband_error(reason: &str) -> String {
    format!("#-1 {reason}")
}

pub const ERR_PERM_DENIED: &str = "PERMISSION DENIED";
pub const ERR_NO_MATCH: &str = "NO MATCH";
pub const ERR_NOT_FOUND: &str = "NOT FOUND";
pub const ERR_FUNCTION_DISABLED: &str = "FUNCTION DISABLED";
pub const ERR_CPU: &str = "CPU";

pub fn limit_exceeded(kind: &str) -> String {
    inband_error(&format!("{kind} LIMIT EXCEEDED"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_reason() {
        assert_eq!(inband_error(ERR_NO_MATCH), "#-1 NO MATCH");
        assert_eq!(limit_exceeded("REGISTER"), "#-1 REGISTER LIMIT EXCEEDED");
    }
}
