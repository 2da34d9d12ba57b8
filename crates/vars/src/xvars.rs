use rustc_hash::FxHashMap;
use tinymush_common::limits::DEFAULT_NUMVARS_LIM;
use tinymush_common::Dbref;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum XVarError {
    #[error("object has reached its named-variable limit")]
    LimitExceeded,
}

/// Per-object named variables (`x()`/`setvar`), keyed
/// `"<dbref>.<lowercased-name>"` in a process-wide map (spec.md §3).
#[derive(Debug, Default)]
pub struct XVarStore {
    map: FxHashMap<String, String>,
    counts: FxHashMap<Dbref, usize>,
    limit: usize,
}

impl XVarStore {
    pub fn new() -> Self {
        XVarStore {
            map: FxHashMap::default(),
            counts: FxHashMap::default(),
            limit: DEFAULT_NUMVARS_LIM,
        }
    }

    fn key(obj: Dbref, name: &str) -> String {
        format!("{}.{}", obj.0, name.to_ascii_lowercase())
    }

    pub fn get(&self, obj: Dbref, name: &str) -> &str {
        self.map.get(&Self::key(obj, name)).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, obj: Dbref, name: &str, value: &str) -> Result<(), XVarError> {
        let key = Self::key(obj, name);
        if value.is_empty() {
            if self.map.remove(&key).is_some() {
                if let Some(c) = self.counts.get_mut(&obj) {
                    *c = c.saturating_sub(1);
                }
            }
            return Ok(());
        }
        if !self.map.contains_key(&key) {
            let count = self.counts.entry(obj).or_insert(0);
            if *count >= self.limit {
                return Err(XVarError::LimitExceeded);
            }
            *count += 1;
        }
        self.map.insert(key, value.to_string());
        Ok(())
    }

    /// Clears every variable owned by `obj` (called on object destruction).
    pub fn clear_object(&mut self, obj: Dbref) {
        let prefix = format!("{}.", obj.0);
        self.map.retain(|k, _| !k.starts_with(&prefix));
        self.counts.remove(&obj);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_is_case_insensitive_on_name() {
        let mut s = XVarStore::new();
        let obj = Dbref(1);
        s.set(obj, "Score", "10").unwrap();
        assert_eq!(s.get(obj, "score"), "10");
    }

    #[test]
    fn limit_is_enforced_per_object() {
        let mut s = XVarStore { limit: 1, ..XVarStore::new() };
        let obj = Dbref(1);
        s.set(obj, "a", "1").unwrap();
        assert!(s.set(obj, "b", "1").is_err());
    }

    #[test]
    fn destroying_object_clears_its_variables() {
        let mut s = XVarStore::new();
        let obj = Dbref(1);
        s.set(obj, "a", "1").unwrap();
        s.clear_object(obj);
        assert_eq!(s.get(obj, "a"), "");
    }
}
