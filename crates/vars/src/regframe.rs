use tinymush_common::limits::{qreg_chartab, DEFAULT_NUM_Q_REGS, DEFAULT_REGISTER_LIMIT, NUM_ENV_VARS};

/// Per-evaluation register frame (spec.md §3 "Register store", `GDATA`): a
/// dense array of indexed `q0..qN` registers plus a dynamic table of named
/// registers, grown in `NUM_ENV_VARS`-sized chunks up to `register_limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegFrame {
    dense: Vec<String>,
    named: Vec<(String, String)>,
    register_limit: usize,
}

impl RegFrame {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_NUM_Q_REGS, DEFAULT_REGISTER_LIMIT)
    }

    pub fn with_limits(num_dense: usize, register_limit: usize) -> Self {
        RegFrame {
            dense: vec![String::new(); num_dense],
            named: Vec::new(),
            register_limit,
        }
    }

    /// Single-letter names (`0-9,a-z,A-Z`) resolve to the dense array via
    /// the chartab; anything else is a named register.
    pub fn get(&self, name: &str) -> &str {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(idx) = qreg_chartab(c) {
                if idx < self.dense.len() {
                    return &self.dense[idx];
                }
            }
        }
        self.named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Sets `name` to `data`. Returns the stored length on success, `-1` for
    /// an invalid (empty) name, `-2` when the named-register table is full
    /// and `name` isn't an existing entry (spec.md §4.D).
    pub fn set(&mut self, name: &str, data: &str) -> i64 {
        if name.is_empty() {
            return -1;
        }
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(idx) = qreg_chartab(c) {
                if idx >= self.dense.len() {
                    self.dense.resize(idx + 1, String::new());
                }
                self.dense[idx] = data.to_string();
                return data.len() as i64;
            }
        }
        if let Some(slot) = self.named.iter_mut().find(|(n, _)| n == name) {
            slot.1 = data.to_string();
            return data.len() as i64;
        }
        if self.named.len() >= self.register_limit {
            return -2;
        }
        // Grow in NUM_ENV_VARS-sized chunks conceptually; since this is a
        // Vec the actual reallocation policy doesn't matter externally.
        let _ = NUM_ENV_VARS;
        self.named.push((name.to_string(), data.to_string()));
        data.len() as i64
    }

    /// Returns an immutable snapshot suitable for [`Self::restore`].
    pub fn save(&self) -> RegFrame {
        self.clone()
    }

    /// Restores the entire frame from `snapshot`.
    pub fn restore(&mut self, snapshot: &RegFrame) {
        *self = snapshot.clone();
    }

    /// `@_! <names>`: revert to `original`, but keep the *current* values of
    /// the registers named in `keep`.
    pub fn restore_except_keep(&mut self, original: &RegFrame, keep: &[&str]) {
        let kept: Vec<(String, String)> = keep
            .iter()
            .map(|n| (n.to_string(), self.get(n).to_string()))
            .collect();
        *self = original.clone();
        for (name, value) in kept {
            self.set(&name, &value);
        }
    }

    /// `@_ <names>`: restore everything in `original` except the registers
    /// named in `names`, which keep their current (post-call) values.
    pub fn restore_all_except(&mut self, original: &RegFrame, names: &[&str]) {
        let kept: Vec<(String, String)> = names
            .iter()
            .map(|n| (n.to_string(), self.get(n).to_string()))
            .collect();
        *self = original.clone();
        for (name, value) in kept {
            self.set(&name, &value);
        }
    }

    pub fn clear_all(&mut self) {
        for slot in &mut self.dense {
            slot.clear();
        }
        self.named.clear();
    }
}

impl Default for RegFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_setq_and_r() {
        // setq(x,hello)[r(x)] -> hello
        let mut f = RegFrame::new();
        f.set("x", "hello");
        assert_eq!(f.get("x"), "hello");
    }

    #[test]
    fn scenario_setq_pair_and_add() {
        let mut f = RegFrame::new();
        f.set("a", "1");
        f.set("b", "2");
        assert_eq!(f.get("a"), "1");
        assert_eq!(f.get("b"), "2");
    }

    #[test]
    fn empty_name_is_invalid() {
        let mut f = RegFrame::new();
        assert_eq!(f.set("", "x"), -1);
    }

    #[test]
    fn unset_single_letter_register_reads_empty() {
        let f = RegFrame::new();
        assert_eq!(f.get("q"), "");
    }

    #[test]
    fn empty_data_clears_and_returns_zero() {
        let mut f = RegFrame::new();
        f.set("x", "hi");
        assert_eq!(f.set("x", ""), 0);
        assert_eq!(f.get("x"), "");
    }

    #[test]
    fn save_restore_round_trip_is_invariant() {
        let mut f = RegFrame::new();
        f.set("x", "before");
        let snap = f.save();
        f.set("x", "after");
        f.restore(&snap);
        assert_eq!(f.get("x"), "before");
    }

    #[test]
    fn register_limit_rejects_new_named_registers() {
        let mut f = RegFrame::with_limits(0, 1);
        assert_eq!(f.set("alpha", "1"), 1);
        assert_eq!(f.set("beta", "1"), -2);
    }
}
