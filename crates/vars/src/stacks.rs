use rustc_hash::FxHashMap;
use tinymush_common::limits::DEFAULT_STACK_LIM;
use tinymush_common::Dbref;
use tinymush_buffer::Delim;

/// Per-object LIFO of text frames (spec.md §3, §4.D). `pos` is depth from
/// the top: `0` is the most recently pushed item.
#[derive(Debug, Default)]
pub struct StackStore {
    stacks: FxHashMap<Dbref, Vec<String>>,
    limit: usize,
}

impl StackStore {
    pub fn new() -> Self {
        StackStore {
            stacks: FxHashMap::default(),
            limit: DEFAULT_STACK_LIM,
        }
    }

    fn idx_from_pos(len: usize, pos: usize) -> Option<usize> {
        if pos >= len {
            None
        } else {
            Some(len - 1 - pos)
        }
    }

    pub fn depth(&self, obj: Dbref) -> usize {
        self.stacks.get(&obj).map(Vec::len).unwrap_or(0)
    }

    pub fn push(&mut self, obj: Dbref, data: &str) -> bool {
        let v = self.stacks.entry(obj).or_default();
        if v.len() >= self.limit {
            return false;
        }
        v.push(data.to_string());
        true
    }

    pub fn peek(&self, obj: Dbref, pos: usize) -> &str {
        self.stacks
            .get(&obj)
            .and_then(|v| Self::idx_from_pos(v.len(), pos).map(|i| v[i].as_str()))
            .unwrap_or("")
    }

    pub fn pop(&mut self, obj: Dbref, pos: usize) -> String {
        let Some(v) = self.stacks.get_mut(&obj) else { return String::new() };
        match Self::idx_from_pos(v.len(), pos) {
            Some(i) => v.remove(i),
            None => String::new(),
        }
    }

    pub fn toss(&mut self, obj: Dbref, pos: usize) {
        let _ = self.pop(obj, pos);
    }

    pub fn dup(&mut self, obj: Dbref, pos: usize) -> bool {
        if self.depth(obj) <= pos {
            return false;
        }
        let item = self.peek(obj, pos).to_string();
        self.push(obj, &item)
    }

    pub fn swap(&mut self, obj: Dbref) -> bool {
        let Some(v) = self.stacks.get_mut(&obj) else { return false };
        let len = v.len();
        if len < 2 {
            return false;
        }
        v.swap(len - 1, len - 2);
        true
    }

    /// Joins the top `n` items (from depth `pos`) with `osep`. Returns
    /// empty when `pos` is past the current depth (spec.md §4.D).
    pub fn popn(&mut self, obj: Dbref, pos: usize, n: usize, osep: &Delim) -> String {
        let depth = self.depth(obj);
        if pos >= depth || n == 0 {
            return String::new();
        }
        let take = n.min(depth - pos);
        let mut items = Vec::with_capacity(take);
        for _ in 0..take {
            items.push(self.pop(obj, pos));
        }
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        osep.join(&refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_push_peek_pop_depth_roundtrip() {
        let mut s = StackStore::new();
        let o = Dbref(1);
        s.push(o, "x");
        assert_eq!(s.peek(o, 0), "x");
        let before = s.depth(o);
        assert_eq!(s.pop(o, 0), "x");
        assert_eq!(s.depth(o), before - 1);
    }

    #[test]
    fn popn_past_depth_is_empty() {
        let mut s = StackStore::new();
        let o = Dbref(1);
        s.push(o, "a");
        assert_eq!(s.popn(o, 5, 2, &Delim::Space), "");
    }

    #[test]
    fn dup_then_swap() {
        let mut s = StackStore::new();
        let o = Dbref(1);
        s.push(o, "a");
        s.push(o, "b");
        s.dup(o, 0);
        assert_eq!(s.peek(o, 0), "b");
        assert_eq!(s.depth(o), 3);
        // stack is now [a, b, b]; swap the top two.
        s.pop(o, 0);
        s.push(o, "c");
        // stack is [a, b, c]; swap top two -> [a, c, b]
        s.swap(o);
        assert_eq!(s.peek(o, 0), "b");
        assert_eq!(s.peek(o, 1), "c");
    }
}
