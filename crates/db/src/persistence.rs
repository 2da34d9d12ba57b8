//! The `PersistentStore` collaborator named in spec.md §6: the core only
//! ever calls `open()/read_all()/write_all()/sync()/close()`. The concrete
//! on-disk format (GDBM/LMDB) is explicitly out of scope; what's provided
//! here is the flat-file compatibility format (for `dbconvert`) and an
//! in-memory stand-in used by the server when no dump file is configured
//! and by tests.

use std::fmt::Write as _;
use std::io::{self, Write};

use tinymush_common::{Dbref, Flags1, ObjectKind};

use crate::attr::Attribute;
use crate::object::Object;
use crate::store::ObjectDb;

#[derive(Debug, thiserror::Error)]
pub enum StoreIoError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed dump at line {0}: {1}")]
    Malformed(usize, String),
}

/// The minimal persistence contract the core depends on (spec.md §6).
pub trait PersistentStore {
    fn open(&mut self) -> Result<(), StoreIoError>;
    fn read_all(&mut self) -> Result<ObjectDb, StoreIoError>;
    fn write_all(&mut self, db: &ObjectDb) -> Result<(), StoreIoError>;
    fn sync(&mut self) -> Result<(), StoreIoError>;
    fn close(&mut self) -> Result<(), StoreIoError>;
}

/// A `PersistentStore` that just keeps the last-written snapshot in memory;
/// used by the server when running without a dump file and by tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: Option<String>,
}

impl PersistentStore for InMemoryStore {
    fn open(&mut self) -> Result<(), StoreIoError> {
        Ok(())
    }

    fn read_all(&mut self) -> Result<ObjectDb, StoreIoError> {
        match &self.snapshot {
            Some(text) => decode_flatfile(text),
            None => Ok(ObjectDb::new()),
        }
    }

    fn write_all(&mut self, db: &ObjectDb) -> Result<(), StoreIoError> {
        self.snapshot = Some(encode_flatfile(db));
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreIoError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreIoError> {
        Ok(())
    }
}

/// A `PersistentStore` backed by the `!<dbref>` / attribute-record /
/// `***END OF DUMP***` flat-file format named in spec.md §6.
#[derive(Debug)]
pub struct FlatFileStore {
    path: std::path::PathBuf,
}

impl FlatFileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        FlatFileStore { path: path.into() }
    }
}

impl PersistentStore for FlatFileStore {
    fn open(&mut self) -> Result<(), StoreIoError> {
        Ok(())
    }

    fn read_all(&mut self) -> Result<ObjectDb, StoreIoError> {
        if !self.path.exists() {
            return Ok(ObjectDb::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        decode_flatfile(&text)
    }

    fn write_all(&mut self, db: &ObjectDb) -> Result<(), StoreIoError> {
        let text = encode_flatfile(db);
        let mut f = std::fs::File::create(&self.path)?;
        f.write_all(text.as_bytes())?;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreIoError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreIoError> {
        Ok(())
    }
}

/// Encodes every non-garbage object as a `!<dbref>` record followed by its
/// name, type letter, location/owner/flags/next/contents/exits, then each
/// attribute as `><number>\n<value>`, terminated by `***END OF DUMP***`.
pub fn encode_flatfile(db: &ObjectDb) -> String {
    let mut out = String::new();
    for i in 0..db.len() {
        let d = Dbref(i as i32);
        let Ok(obj) = db.get(d) else { continue };
        writeln!(out, "!{}", d.0).expect("write to String never fails");
        writeln!(out, "{}", obj.name).expect("write to String never fails");
        writeln!(out, "T{}", obj.kind.letter()).expect("write to String never fails");
        writeln!(out, "L{}", obj.location.0).expect("write to String never fails");
        writeln!(out, "O{}", obj.owner.0).expect("write to String never fails");
        writeln!(out, "F{} {} {}", obj.flags1.bits(), obj.flags2, obj.flags3).expect("write to String never fails");
        writeln!(out, "N{}", obj.next.0).expect("write to String never fails");
        writeln!(out, "C{}", obj.contents.0).expect("write to String never fails");
        writeln!(out, "X{}", obj.exits.0).expect("write to String never fails");
        writeln!(out, "P{}", obj.parent.0).expect("write to String never fails");
        writeln!(out, "Z{}", obj.zone.0).expect("write to String never fails");
        let mut attr_numbers: Vec<_> = obj.attrs.keys().copied().collect();
        attr_numbers.sort_unstable();
        for num in attr_numbers {
            let a = &obj.attrs[&num];
            writeln!(out, ">{num} {} {}", a.owner.0, a.flags.bits()).expect("write to String never fails");
            writeln!(out, "{}", a.value).expect("write to String never fails");
        }
    }
    out.push_str("***END OF DUMP***\n");
    out
}

fn parse_kind(letter: char) -> ObjectKind {
    match letter {
        'R' => ObjectKind::Room,
        'T' => ObjectKind::Thing,
        'P' => ObjectKind::Player,
        'E' => ObjectKind::Exit,
        _ => ObjectKind::Garbage,
    }
}

/// Decodes the format written by [`encode_flatfile`].
pub fn decode_flatfile(text: &str) -> Result<ObjectDb, StoreIoError> {
    let mut db = ObjectDb::new();
    let mut lines = text.lines().enumerate().peekable();
    let mut max_index: i32 = -1;
    let mut pending: Vec<(usize, Object)> = Vec::new();

    while let Some((lineno, line)) = lines.next() {
        if line == "***END OF DUMP***" {
            break;
        }
        let Some(rest) = line.strip_prefix('!') else {
            return Err(StoreIoError::Malformed(lineno + 1, format!("expected '!' header, got {line:?}")));
        };
        let index: i32 = rest
            .parse()
            .map_err(|_| StoreIoError::Malformed(lineno + 1, "bad dbref".into()))?;
        max_index = max_index.max(index);

        let mut obj = Object::new_garbage();
        let (_, name) = lines.next().ok_or_else(|| StoreIoError::Malformed(lineno + 1, "missing name".into()))?;
        obj.name = name.to_string();

        while let Some(&(_, peeked)) = lines.peek() {
            if peeked.starts_with('!') || peeked == "***END OF DUMP***" {
                break;
            }
            let (_, field_line) = lines.next().expect("peeked Some");
            if let Some(v) = field_line.strip_prefix('T') {
                obj.kind = parse_kind(v.chars().next().unwrap_or('G'));
            } else if let Some(v) = field_line.strip_prefix('L') {
                obj.location = Dbref(v.parse().unwrap_or(-1));
            } else if let Some(v) = field_line.strip_prefix('O') {
                obj.owner = Dbref(v.parse().unwrap_or(-1));
            } else if let Some(v) = field_line.strip_prefix('F') {
                let mut parts = v.split_whitespace();
                let f1: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                obj.flags1 = Flags1::from_bits_truncate(f1);
                obj.flags2 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                obj.flags3 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            } else if let Some(v) = field_line.strip_prefix('N') {
                obj.next = Dbref(v.parse().unwrap_or(-1));
            } else if let Some(v) = field_line.strip_prefix('C') {
                obj.contents = Dbref(v.parse().unwrap_or(-1));
            } else if let Some(v) = field_line.strip_prefix('X') {
                obj.exits = Dbref(v.parse().unwrap_or(-1));
            } else if let Some(v) = field_line.strip_prefix('P') {
                obj.parent = Dbref(v.parse().unwrap_or(-1));
            } else if let Some(v) = field_line.strip_prefix('Z') {
                obj.zone = Dbref(v.parse().unwrap_or(-1));
            } else if let Some(v) = field_line.strip_prefix('>') {
                let mut parts = v.split_whitespace();
                let num: u32 = parts
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| StoreIoError::Malformed(lineno + 1, "bad attr number".into()))?;
                let aowner: i32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(-1);
                let aflags: u16 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                let (_, value) = lines
                    .next()
                    .ok_or_else(|| StoreIoError::Malformed(lineno + 1, "missing attr value".into()))?;
                obj.attrs.insert(
                    num,
                    Attribute {
                        owner: Dbref(aowner),
                        flags: tinymush_common::AttrFlags::from_bits_truncate(aflags),
                        value: value.to_string(),
                    },
                );
            }
        }
        pending.push((index as usize, obj));
    }

    if max_index >= 0 {
        db.restore_raw_slot(max_index as usize, Object::new_garbage());
    }
    for (index, obj) in pending {
        db.restore_raw_slot(index, obj);
    }
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinymush_common::ObjectKind;

    #[test]
    fn round_trips_objects_and_attrs() {
        let mut db = ObjectDb::new();
        let room = db.create(ObjectKind::Room, Dbref::NOTHING);
        db.get_mut(room).unwrap().name = "The Void".to_string();
        db.set_attr(room, 300, "hello".into(), room, tinymush_common::AttrFlags::empty())
            .unwrap();

        let encoded = encode_flatfile(&db);
        assert!(encoded.ends_with("***END OF DUMP***\n"));

        let decoded = decode_flatfile(&encoded).unwrap();
        let restored = decoded.get(room).unwrap();
        assert_eq!(restored.name, "The Void");
        assert_eq!(decoded.get_attr(room, 300).unwrap().unwrap().value, "hello");
    }

    #[test]
    fn in_memory_store_round_trips() {
        let mut store = InMemoryStore::default();
        let mut db = ObjectDb::new();
        db.create(ObjectKind::Thing, Dbref::NOTHING);
        store.write_all(&db).unwrap();
        let reloaded = store.read_all().unwrap();
        assert_eq!(reloaded.len(), db.len());
    }
}
