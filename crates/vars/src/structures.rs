use rustc_hash::FxHashMap;
use tinymush_buffer::Delim;
use tinymush_common::Dbref;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompType {
    Char,
    Dbref,
    Int,
    Float,
    String,
    Any,
}

impl CompType {
    pub fn parse(s: &str) -> CompType {
        match s {
            "c" => CompType::Char,
            "d" => CompType::Dbref,
            "i" => CompType::Int,
            "f" => CompType::Float,
            "s" => CompType::String,
            _ => CompType::Any,
        }
    }

    pub fn accepts(self, value: &str) -> bool {
        match self {
            CompType::Any | CompType::String => true,
            CompType::Char => value.chars().count() == 1,
            CompType::Dbref => value.starts_with('#') && value[1..].parse::<i32>().is_ok(),
            CompType::Int => value.parse::<i64>().is_ok(),
            CompType::Float => value.parse::<f64>().is_ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComponentDef {
    pub name: String,
    pub ty: CompType,
    pub default: String,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub components: Vec<ComponentDef>,
}

#[derive(Debug, Clone)]
pub struct Instance {
    pub struct_owner: Dbref,
    pub struct_name: String,
    pub values: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StructError {
    #[error("no such structure definition")]
    NoSuchStruct,
    #[error("structure already defined")]
    AlreadyDefined,
    #[error("structure still has live instances")]
    HasInstances,
    #[error("no such instance")]
    NoSuchInstance,
    #[error("no such component")]
    NoSuchComponent,
    #[error("value does not satisfy the component's type predicate")]
    TypeMismatch,
    #[error("component/value count mismatch")]
    ArityMismatch,
}

/// User-defined record types and their instances (spec.md §3, §4.D).
#[derive(Debug, Default)]
pub struct StructStore {
    defs: FxHashMap<(Dbref, String), StructDef>,
    instance_counts: FxHashMap<(Dbref, String), usize>,
    instances: FxHashMap<(Dbref, String), Instance>,
}

impl StructStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a struct named `name` owned by `player`, with one component
    /// per parallel entry in `comps`/`types`/`defaults`.
    pub fn structure(
        &mut self,
        player: Dbref,
        name: &str,
        comps: &[&str],
        types: &[&str],
        defaults: &[&str],
    ) -> Result<(), StructError> {
        let key = (player, name.to_string());
        if self.defs.contains_key(&key) {
            return Err(StructError::AlreadyDefined);
        }
        let n = comps.len();
        if types.len() != n || defaults.len() != n {
            return Err(StructError::ArityMismatch);
        }
        let components = (0..n)
            .map(|i| ComponentDef {
                name: comps[i].to_string(),
                ty: CompType::parse(types[i]),
                default: defaults[i].to_string(),
            })
            .collect();
        self.defs.insert(key.clone(), StructDef { components });
        self.instance_counts.insert(key, 0);
        Ok(())
    }

    pub fn unstructure(&mut self, player: Dbref, name: &str) -> Result<(), StructError> {
        let key = (player, name.to_string());
        if !self.defs.contains_key(&key) {
            return Err(StructError::NoSuchStruct);
        }
        if self.instance_counts.get(&key).copied().unwrap_or(0) != 0 {
            return Err(StructError::HasInstances);
        }
        self.defs.remove(&key);
        self.instance_counts.remove(&key);
        Ok(())
    }

    /// Allocates instance `inst` owned by `owner` from struct
    /// `(struct_owner, struct_name)`, either with explicit `names`/`vals`
    /// pairs or, when both are `None`, using every component's default.
    pub fn construct(
        &mut self,
        owner: Dbref,
        inst: &str,
        struct_owner: Dbref,
        struct_name: &str,
        names: Option<&[&str]>,
        vals: Option<&[&str]>,
    ) -> Result<(), StructError> {
        let def_key = (struct_owner, struct_name.to_string());
        let def = self.defs.get(&def_key).ok_or(StructError::NoSuchStruct)?;
        let mut values: Vec<String> = def.components.iter().map(|c| c.default.clone()).collect();

        if let (Some(names), Some(vals)) = (names, vals) {
            if names.len() != vals.len() {
                return Err(StructError::ArityMismatch);
            }
            for (n, v) in names.iter().zip(vals.iter()) {
                let idx = def
                    .components
                    .iter()
                    .position(|c| &c.name == n)
                    .ok_or(StructError::NoSuchComponent)?;
                if !def.components[idx].ty.accepts(v) {
                    return Err(StructError::TypeMismatch);
                }
                values[idx] = v.to_string();
            }
        }

        let inst_key = (owner, inst.to_string());
        self.instances.insert(
            inst_key,
            Instance {
                struct_owner,
                struct_name: struct_name.to_string(),
                values,
            },
        );
        *self.instance_counts.entry(def_key).or_insert(0) += 1;
        Ok(())
    }

    /// Parses `delim`-separated `text` (as produced by [`Self::unload`])
    /// into the instance's component values, in definition order. This is
    /// the `read(<obj>/<attr>, inst, struct)` load path; the caller supplies
    /// the attribute text already fetched from `tinymush-db`.
    pub fn read_from_text(
        &mut self,
        owner: Dbref,
        inst: &str,
        struct_owner: Dbref,
        struct_name: &str,
        text: &str,
        delim: &Delim,
    ) -> Result<(), StructError> {
        let def_key = (struct_owner, struct_name.to_string());
        let def = self.defs.get(&def_key).ok_or(StructError::NoSuchStruct)?;
        let parts = delim.split(text);
        let mut values: Vec<String> = def.components.iter().map(|c| c.default.clone()).collect();
        for (i, v) in parts.iter().enumerate().take(values.len()) {
            values[i] = v.to_string();
        }
        self.instances.insert(
            (owner, inst.to_string()),
            Instance {
                struct_owner,
                struct_name: struct_name.to_string(),
                values,
            },
        );
        *self.instance_counts.entry(def_key).or_insert(0) += 1;
        Ok(())
    }

    /// Joins an instance's component values with `delim`, round-tripping
    /// with [`Self::read_from_text`] (spec.md §8 round-trip law).
    pub fn unload(&self, owner: Dbref, inst: &str, delim: &Delim) -> Option<String> {
        let i = self.instances.get(&(owner, inst.to_string()))?;
        let refs: Vec<&str> = i.values.iter().map(String::as_str).collect();
        Some(delim.join(&refs))
    }

    pub fn modify(
        &mut self,
        owner: Dbref,
        inst: &str,
        names: &[&str],
        vals: &[&str],
    ) -> Result<(), StructError> {
        if names.len() != vals.len() {
            return Err(StructError::ArityMismatch);
        }
        let inst_key = (owner, inst.to_string());
        let instance = self.instances.get(&inst_key).ok_or(StructError::NoSuchInstance)?;
        let def_key = (instance.struct_owner, instance.struct_name.clone());
        let def = self.defs.get(&def_key).ok_or(StructError::NoSuchStruct)?;

        let mut updates = Vec::with_capacity(names.len());
        for (n, v) in names.iter().zip(vals.iter()) {
            let idx = def
                .components
                .iter()
                .position(|c| &c.name == n)
                .ok_or(StructError::NoSuchComponent)?;
            if !def.components[idx].ty.accepts(v) {
                return Err(StructError::TypeMismatch);
            }
            updates.push((idx, v.to_string()));
        }
        let instance = self.instances.get_mut(&inst_key).expect("checked above");
        for (idx, v) in updates {
            instance.values[idx] = v;
        }
        Ok(())
    }

    /// `z(<inst>, <component>)`: reads one component's current value.
    pub fn z(&self, owner: Dbref, inst: &str, component: &str) -> Option<&str> {
        let instance = self.instances.get(&(owner, inst.to_string()))?;
        let def = self
            .defs
            .get(&(instance.struct_owner, instance.struct_name.clone()))?;
        let idx = def.components.iter().position(|c| c.name == component)?;
        Some(instance.values[idx].as_str())
    }

    pub fn destruct(&mut self, owner: Dbref, inst: &str) -> bool {
        let Some(removed) = self.instances.remove(&(owner, inst.to_string())) else {
            return false;
        };
        let key = (removed.struct_owner, removed.struct_name);
        if let Some(c) = self.instance_counts.get_mut(&key) {
            *c = c.saturating_sub(1);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_point_structure() {
        // structure(pt,x y,i i,0 0, )[construct(p1,pt,x y,3 4, )][z(p1,x)][z(p1,y)] -> 1134
        let mut s = StructStore::new();
        let player = Dbref(1);
        s.structure(player, "pt", &["x", "y"], &["i", "i"], &["0", "0"])
            .unwrap();
        s.construct(player, "p1", player, "pt", Some(&["x", "y"]), Some(&["3", "4"]))
            .unwrap();
        assert_eq!(s.z(player, "p1", "x"), Some("3"));
        assert_eq!(s.z(player, "p1", "y"), Some("4"));
    }

    #[test]
    fn unload_round_trips_construct() {
        let mut s = StructStore::new();
        let player = Dbref(1);
        s.structure(player, "pt", &["x", "y"], &["i", "i"], &["0", "0"])
            .unwrap();
        s.construct(player, "p1", player, "pt", Some(&["x", "y"]), Some(&["3", "4"]))
            .unwrap();
        let dumped = s.unload(player, "p1", &Delim::Space).unwrap();
        assert_eq!(dumped, "3 4");

        s.destruct(player, "p1");
        s.read_from_text(player, "p2", player, "pt", &dumped, &Delim::Space)
            .unwrap();
        assert_eq!(s.unload(player, "p2", &Delim::Space).unwrap(), dumped);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut s = StructStore::new();
        let player = Dbref(1);
        s.structure(player, "pt", &["x"], &["i"], &["0"]).unwrap();
        assert_eq!(
            s.construct(player, "p1", player, "pt", Some(&["x"]), Some(&["not-an-int"])),
            Err(StructError::TypeMismatch)
        );
    }

    #[test]
    fn unstructure_requires_zero_instances() {
        let mut s = StructStore::new();
        let player = Dbref(1);
        s.structure(player, "pt", &["x"], &["i"], &["0"]).unwrap();
        s.construct(player, "p1", player, "pt", None, None).unwrap();
        assert_eq!(s.unstructure(player, "pt"), Err(StructError::HasInstances));
        s.destruct(player, "p1");
        assert!(s.unstructure(player, "pt").is_ok());
    }
}
