use rustc_hash::FxHashMap;
use tinymush_common::{Dbref, Flags1, ObjectKind};

use crate::attr::Attribute;

/// A single dbref-indexed entry (spec.md §3 "Object").
///
/// `contents`/`next` form the same acyclic singly-linked list the original
/// implementation uses: `contents` is the head of the list of things
/// directly inside this object, and each member's `next` points at the
/// following sibling (or `Dbref::NOTHING` at the end). `exits` is the
/// equivalent head-of-list for a room's exits.
#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    pub owner: Dbref,
    pub location: Dbref,
    pub contents: Dbref,
    pub next: Dbref,
    pub exits: Dbref,
    pub parent: Dbref,
    pub zone: Dbref,
    pub flags1: Flags1,
    pub flags2: u32,
    pub flags3: u32,
    pub attrs: FxHashMap<u32, Attribute>,
}

impl Object {
    pub fn new_garbage() -> Self {
        Object {
            name: String::new(),
            kind: ObjectKind::Garbage,
            owner: Dbref::NOTHING,
            location: Dbref::NOTHING,
            contents: Dbref::NOTHING,
            next: Dbref::NOTHING,
            exits: Dbref::NOTHING,
            parent: Dbref::NOTHING,
            zone: Dbref::NOTHING,
            flags1: Flags1::empty(),
            flags2: 0,
            flags3: 0,
            attrs: FxHashMap::default(),
        }
    }

    pub fn is_garbage(&self) -> bool {
        self.kind == ObjectKind::Garbage
    }

    pub fn attr_bytes(&self) -> usize {
        self.attrs.values().map(|a| a.value.len()).sum()
    }
}
