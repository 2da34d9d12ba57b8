use tinymush_common::limits::DEFAULT_ATTR_BYTES_CAP;
use tinymush_common::{Dbref, ObjectKind};
use tracing::{debug, trace};

use crate::attr::Attribute;
use crate::error::DbError;
use crate::object::Object;

/// Array of objects keyed by `dbref`, with per-object attribute storage,
/// flags, and the owner/location/zone graph (spec.md §4.C).
///
/// A single owned table behind a small set of invariant-checked mutators,
/// with `tracing` on every mutation instead of ad-hoc `printf` logging.
#[derive(Debug, Default)]
pub struct ObjectDb {
    objects: Vec<Object>,
    free_list: Vec<usize>,
    attr_bytes_cap: usize,
}

impl ObjectDb {
    pub fn new() -> Self {
        ObjectDb {
            objects: Vec::new(),
            free_list: Vec::new(),
            attr_bytes_cap: DEFAULT_ATTR_BYTES_CAP,
        }
    }

    pub fn with_attr_bytes_cap(cap: usize) -> Self {
        ObjectDb {
            attr_bytes_cap: cap,
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// `Good_obj(d)`: index in range and kind != Garbage (spec.md §3).
    pub fn good_obj(&self, d: Dbref) -> bool {
        d.index()
            .and_then(|i| self.objects.get(i))
            .is_some_and(|o| !o.is_garbage())
    }

    fn require_good(&self, d: Dbref) -> Result<usize, DbError> {
        let idx = d.index().filter(|&i| i < self.objects.len()).ok_or(DbError::BadObject(d))?;
        if self.objects[idx].is_garbage() {
            return Err(DbError::BadObject(d));
        }
        Ok(idx)
    }

    pub fn get(&self, d: Dbref) -> Result<&Object, DbError> {
        self.require_good(d).map(|i| &self.objects[i])
    }

    pub fn get_mut(&mut self, d: Dbref) -> Result<&mut Object, DbError> {
        let i = self.require_good(d)?;
        Ok(&mut self.objects[i])
    }

    /// Creates a new object, reusing a garbage slot when one is available so
    /// that destroyed dbrefs are recycled (spec.md §3).
    pub fn create(&mut self, kind: ObjectKind, owner: Dbref) -> Dbref {
        let mut obj = Object::new_garbage();
        obj.kind = kind;
        obj.owner = owner;

        let dbref = if let Some(idx) = self.free_list.pop() {
            self.objects[idx] = obj;
            Dbref(idx as i32)
        } else {
            let idx = self.objects.len();
            self.objects.push(obj);
            Dbref(idx as i32)
        };
        debug!(target: "tinymush_db", %dbref, ?kind, "created object");
        dbref
    }

    /// Converts `d` to `Garbage`, detaches it from its location's contents
    /// list, reparents its own contents up to its former location, clears
    /// its attributes, and frees the slot for reuse (spec.md §4.C).
    pub fn destroy(&mut self, d: Dbref) -> Result<(), DbError> {
        let idx = self.require_good(d)?;
        let location = self.objects[idx].location;
        let contents_head = self.objects[idx].contents;

        self.unlink_from_location(d)?;

        // Reparent children to the destroyed object's former location.
        let mut cur = contents_head;
        while self.good_obj(cur) {
            let next = self.objects[cur.index().expect("good_obj implies valid index")].next;
            self.move_object(cur, location).ok();
            cur = next;
        }

        let slot = &mut self.objects[idx];
        slot.kind = ObjectKind::Garbage;
        slot.attrs.clear();
        slot.contents = Dbref::NOTHING;
        slot.next = Dbref::NOTHING;
        slot.exits = Dbref::NOTHING;
        self.free_list.push(idx);
        debug!(target: "tinymush_db", %d, "destroyed object");
        Ok(())
    }

    fn unlink_from_location(&mut self, d: Dbref) -> Result<(), DbError> {
        let idx = self.require_good(d)?;
        let location = self.objects[idx].location;
        if !self.good_obj(location) {
            return Ok(());
        }
        let loc_idx = location.index().expect("good_obj implies valid index");
        if self.objects[loc_idx].contents == d {
            self.objects[loc_idx].contents = self.objects[idx].next;
        } else {
            let mut cur = self.objects[loc_idx].contents;
            while self.good_obj(cur) {
                let cur_idx = cur.index().expect("good_obj implies valid index");
                if self.objects[cur_idx].next == d {
                    self.objects[cur_idx].next = self.objects[idx].next;
                    break;
                }
                cur = self.objects[cur_idx].next;
            }
        }
        self.objects[idx].next = Dbref::NOTHING;
        self.objects[idx].location = Dbref::NOTHING;
        Ok(())
    }

    /// True if `ancestor` contains `descendant` directly or transitively.
    fn contains_transitively(&self, ancestor: Dbref, descendant: Dbref) -> bool {
        if !self.good_obj(ancestor) {
            return false;
        }
        let mut cur = self.objects[ancestor.index().expect("checked")].contents;
        while self.good_obj(cur) {
            if cur == descendant {
                return true;
            }
            if self.contains_transitively(cur, descendant) {
                return true;
            }
            cur = self.objects[cur.index().expect("checked")].next;
        }
        false
    }

    /// Unlinks `obj` from its current location and inserts it at the head of
    /// `newloc`'s contents list. Forbids containment cycles (spec.md §4.C).
    pub fn move_object(&mut self, obj: Dbref, newloc: Dbref) -> Result<(), DbError> {
        self.require_good(obj)?;
        if newloc == obj || self.contains_transitively(obj, newloc) {
            return Err(DbError::Cycle(obj, newloc));
        }
        self.unlink_from_location(obj)?;
        if self.good_obj(newloc) {
            let loc_idx = newloc.index().expect("checked");
            let old_head = self.objects[loc_idx].contents;
            let obj_idx = obj.index().expect("checked");
            self.objects[obj_idx].next = old_head;
            self.objects[obj_idx].location = newloc;
            self.objects[loc_idx].contents = obj;
        }
        trace!(target: "tinymush_db", %obj, %newloc, "moved object");
        Ok(())
    }

    pub fn get_attr(&self, obj: Dbref, attr: u32) -> Result<Option<&Attribute>, DbError> {
        Ok(self.get(obj)?.attrs.get(&attr))
    }

    /// Sets an attribute, clearing it when `value` is empty. Enforces the
    /// per-object attribute byte cap (spec.md §4.C).
    pub fn set_attr(
        &mut self,
        obj: Dbref,
        attr: u32,
        value: String,
        owner: Dbref,
        flags: tinymush_common::AttrFlags,
    ) -> Result<(), DbError> {
        let cap = self.attr_bytes_cap;
        let o = self.get_mut(obj)?;
        if value.is_empty() {
            o.attrs.remove(&attr);
            return Ok(());
        }
        let previous_len = o.attrs.get(&attr).map(|a| a.value.len()).unwrap_or(0);
        let projected = o.attr_bytes() - previous_len + value.len();
        if projected > cap {
            return Err(DbError::AttrBytesLimit);
        }
        o.attrs.insert(attr, Attribute { owner, flags, value });
        Ok(())
    }

    /// Overwrites slot `index` directly, bypassing the `Good_obj` guard that
    /// `get_mut` enforces. Used only by the flat-file loader to materialize
    /// objects into freshly-reserved (still-`Garbage`) slots.
    pub fn restore_raw_slot(&mut self, index: usize, obj: Object) {
        if index >= self.objects.len() {
            self.objects.resize_with(index + 1, Object::new_garbage);
        }
        if !obj.is_garbage() {
            self.free_list.retain(|&i| i != index);
        }
        self.objects[index] = obj;
    }

    /// Lazily walks the `next`-linked contents list headed at `obj`.
    pub fn iter_contents<'a>(&'a self, obj: Dbref) -> impl Iterator<Item = Dbref> + 'a {
        let start = self.get(obj).map(|o| o.contents).unwrap_or(Dbref::NOTHING);
        ContentsIter { db: self, cur: start }
    }
}

struct ContentsIter<'a> {
    db: &'a ObjectDb,
    cur: Dbref,
}

impl<'a> Iterator for ContentsIter<'a> {
    type Item = Dbref;

    fn next(&mut self) -> Option<Dbref> {
        if !self.db.good_obj(self.cur) {
            return None;
        }
        let here = self.cur;
        self.cur = self.db.objects[here.index().expect("good_obj implies valid index")].next;
        Some(here)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_good_obj() {
        let mut db = ObjectDb::new();
        let r = db.create(ObjectKind::Room, Dbref::NOTHING);
        assert!(db.good_obj(r));
    }

    #[test]
    fn destroy_then_recycled_on_next_create() {
        let mut db = ObjectDb::new();
        let r = db.create(ObjectKind::Room, Dbref::NOTHING);
        db.destroy(r).unwrap();
        assert!(!db.good_obj(r));
        let r2 = db.create(ObjectKind::Thing, Dbref::NOTHING);
        assert_eq!(r, r2);
        assert!(db.good_obj(r2));
    }

    #[test]
    fn move_tracks_contents_membership() {
        let mut db = ObjectDb::new();
        let room = db.create(ObjectKind::Room, Dbref::NOTHING);
        let thing = db.create(ObjectKind::Thing, Dbref::NOTHING);
        db.move_object(thing, room).unwrap();
        assert_eq!(db.iter_contents(room).collect::<Vec<_>>(), vec![thing]);
        assert_eq!(db.get(thing).unwrap().location, room);
    }

    #[test]
    fn move_rejects_cycles() {
        let mut db = ObjectDb::new();
        let a = db.create(ObjectKind::Thing, Dbref::NOTHING);
        let b = db.create(ObjectKind::Thing, Dbref::NOTHING);
        db.move_object(b, a).unwrap();
        assert!(db.move_object(a, b).is_err());
        assert!(db.move_object(a, a).is_err());
    }

    #[test]
    fn set_attr_empty_clears() {
        let mut db = ObjectDb::new();
        let o = db.create(ObjectKind::Thing, Dbref::NOTHING);
        db.set_attr(o, 300, "hi".into(), o, tinymush_common::AttrFlags::empty())
            .unwrap();
        assert!(db.get_attr(o, 300).unwrap().is_some());
        db.set_attr(o, 300, "".into(), o, tinymush_common::AttrFlags::empty())
            .unwrap();
        assert!(db.get_attr(o, 300).unwrap().is_none());
    }

    #[test]
    fn destroy_reparents_contents_to_former_location() {
        let mut db = ObjectDb::new();
        let room = db.create(ObjectKind::Room, Dbref::NOTHING);
        let bag = db.create(ObjectKind::Thing, Dbref::NOTHING);
        let coin = db.create(ObjectKind::Thing, Dbref::NOTHING);
        db.move_object(bag, room).unwrap();
        db.move_object(coin, bag).unwrap();
        db.destroy(bag).unwrap();
        assert_eq!(db.get(coin).unwrap().location, room);
        assert!(db.iter_contents(room).collect::<Vec<_>>().contains(&coin));
    }

    #[test]
    fn attr_bytes_cap_is_enforced() {
        let mut db = ObjectDb::with_attr_bytes_cap(4);
        let o = db.create(ObjectKind::Thing, Dbref::NOTHING);
        assert!(db
            .set_attr(o, 300, "toolong".into(), o, tinymush_common::AttrFlags::empty())
            .is_err());
    }
}
