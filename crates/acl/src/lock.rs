use std::fmt;

use tinymush_buffer::wildcard::wildmatch;
use tinymush_common::Dbref;
use tinymush_db::ObjectDb;

use crate::flags::has_named_flag;

/// Maps a user attribute name to its numeric slot, so lock text like
/// `score:100` can be checked without the ACL layer owning attribute
/// name interning itself (spec.md §3 leaves that table to the command
/// dispatcher).
pub trait AttrResolver {
    fn resolve(&self, name: &str) -> Option<u32>;
}

impl<F: Fn(&str) -> Option<u32>> AttrResolver for F {
    fn resolve(&self, name: &str) -> Option<u32> {
        self(name)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LockParseError {
    #[error("unexpected end of lock expression")]
    UnexpectedEnd,
    #[error("expected ')' at position {0}")]
    MissingCloseParen(usize),
    #[error("empty flag or attribute name at position {0}")]
    EmptyName(usize),
}

/// Compiled boolean lock expression (spec.md §4.I item 2). Evaluated by a
/// recursive-descent walk with short-circuit `&`/`|` semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockExpr {
    True,
    False,
    /// `=#<dbref>`: actor must be exactly this object.
    Is(Dbref),
    /// `@#<dbref>`: actor must be owned by this object's owner (`@lock`
    /// "owned by" form).
    OwnedBy(Dbref),
    /// Bare flag name, e.g. `WIZARD`.
    Flag(String),
    /// `<attr>:<pattern>`: actor's named attribute wildcard-matches.
    AttrMatch(String, String),
    Not(Box<LockExpr>),
    And(Box<LockExpr>, Box<LockExpr>),
    Or(Box<LockExpr>, Box<LockExpr>),
}

impl fmt::Display for LockExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockExpr::True => write!(f, "#true"),
            LockExpr::False => write!(f, "#false"),
            LockExpr::Is(d) => write!(f, "=#{}", d.0),
            LockExpr::OwnedBy(d) => write!(f, "@#{}", d.0),
            LockExpr::Flag(n) => write!(f, "{n}"),
            LockExpr::AttrMatch(a, p) => write!(f, "{a}:{p}"),
            LockExpr::Not(e) => write!(f, "!{e}"),
            LockExpr::And(a, b) => write!(f, "({a})&({b})"),
            LockExpr::Or(a, b) => write!(f, "({a})|({b})"),
        }
    }
}

/// Recursive-descent parser for the lock grammar:
/// `expr := or`, `or := and ('|' and)*`, `and := unary ('&' unary)*`,
/// `unary := '!' unary | atom`, `atom := '(' expr ')' | '=#'dbref |
/// '@#'dbref | name | name ':' pattern`.
struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    src: &'a str,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            chars: src.chars().collect(),
            pos: 0,
            src,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_expr(&mut self) -> Result<LockExpr, LockParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<LockExpr, LockParseError> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('|') {
                self.bump();
                let right = self.parse_and()?;
                left = LockExpr::Or(Box::new(left), Box::new(right));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<LockExpr, LockParseError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('&') {
                self.bump();
                let right = self.parse_unary()?;
                left = LockExpr::And(Box::new(left), Box::new(right));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<LockExpr, LockParseError> {
        self.skip_ws();
        if self.peek() == Some('!') {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(LockExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<LockExpr, LockParseError> {
        self.skip_ws();
        match self.peek() {
            None => Err(LockParseError::UnexpectedEnd),
            Some('(') => {
                self.bump();
                let inner = self.parse_expr()?;
                self.skip_ws();
                if self.bump() != Some(')') {
                    return Err(LockParseError::MissingCloseParen(self.pos));
                }
                Ok(inner)
            }
            Some('=') => {
                self.bump();
                let d = self.parse_dbref()?;
                Ok(LockExpr::Is(d))
            }
            Some('@') => {
                self.bump();
                let d = self.parse_dbref()?;
                Ok(LockExpr::OwnedBy(d))
            }
            _ => {
                let start = self.pos;
                let name = self.parse_name();
                if name.is_empty() {
                    return Err(LockParseError::EmptyName(start));
                }
                self.skip_ws();
                if self.peek() == Some(':') {
                    self.bump();
                    let pattern = self.parse_pattern();
                    Ok(LockExpr::AttrMatch(name, pattern))
                } else {
                    Ok(LockExpr::Flag(name))
                }
            }
        }
    }

    fn parse_dbref(&mut self) -> Result<Dbref, LockParseError> {
        if self.peek() == Some('#') {
            self.bump();
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<i32>()
            .map(Dbref)
            .map_err(|_| LockParseError::EmptyName(start))
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !c.is_whitespace() && !"&|!():".contains(c)) {
            self.bump();
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_pattern(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !c.is_whitespace() && !"&|)".contains(c)) {
            self.bump();
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn finish(self) -> &'a str {
        self.src
    }
}

pub fn parse_lock(text: &str) -> Result<LockExpr, LockParseError> {
    if text.trim().is_empty() {
        return Ok(LockExpr::True);
    }
    let mut p = Parser::new(text);
    let expr = p.parse_expr()?;
    p.skip_ws();
    let _ = p.finish();
    Ok(expr)
}

/// Evaluates a compiled lock against `actor` attempting to pass a lock
/// held by `holder` (the object the lock text is attached to).
pub struct LockEvaluator<'a> {
    pub db: &'a ObjectDb,
    pub attrs: &'a dyn AttrResolver,
}

impl<'a> LockEvaluator<'a> {
    pub fn eval(&self, expr: &LockExpr, actor: Dbref, holder: Dbref) -> bool {
        match expr {
            LockExpr::True => true,
            LockExpr::False => false,
            LockExpr::Is(d) => actor == *d,
            LockExpr::OwnedBy(d) => match (self.db.get(actor), self.db.get(*d)) {
                (Ok(a), Ok(b)) => a.owner == b.owner,
                _ => false,
            },
            LockExpr::Flag(name) => match self.db.get(actor) {
                Ok(o) => has_named_flag(o.flags1, name),
                Err(_) => false,
            },
            LockExpr::AttrMatch(name, pattern) => {
                let Some(num) = self.attrs.resolve(name) else { return false };
                match self.db.get_attr(actor, num) {
                    Ok(Some(attr)) => wildmatch(&attr.value, pattern).is_some(),
                    _ => false,
                }
            }
            LockExpr::Not(inner) => !self.eval(inner, actor, holder),
            LockExpr::And(a, b) => self.eval(a, actor, holder) && self.eval(b, actor, holder),
            LockExpr::Or(a, b) => self.eval(a, actor, holder) || self.eval(b, actor, holder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinymush_common::{Flags1, ObjectKind};

    fn resolver(attr_num: u32) -> impl Fn(&str) -> Option<u32> {
        move |name: &str| if name == "score" { Some(attr_num) } else { None }
    }

    #[test]
    fn empty_lock_text_always_passes() {
        let expr = parse_lock("").unwrap();
        assert_eq!(expr, LockExpr::True);
    }

    #[test]
    fn wizard_flag_short_circuits_or() {
        let expr = parse_lock("WIZARD|ROYALTY").unwrap();
        let mut db = ObjectDb::new();
        let wiz = db.create(ObjectKind::Player, Dbref::NOTHING);
        db.get_mut(wiz).unwrap().flags1.insert(Flags1::WIZARD);
        let other = db.create(ObjectKind::Player, Dbref::NOTHING);

        let r = resolver(300);
        let ev = LockEvaluator { db: &db, attrs: &r };
        assert!(ev.eval(&expr, wiz, Dbref::NOTHING));
        assert!(!ev.eval(&expr, other, Dbref::NOTHING));
    }

    #[test]
    fn not_and_parens_compose() {
        let expr = parse_lock("!(WIZARD&STAFF)").unwrap();
        let mut db = ObjectDb::new();
        let wiz_staff = db.create(ObjectKind::Player, Dbref::NOTHING);
        db.get_mut(wiz_staff).unwrap().flags1.insert(Flags1::WIZARD | Flags1::STAFF);
        let plain = db.create(ObjectKind::Player, Dbref::NOTHING);

        let r = resolver(300);
        let ev = LockEvaluator { db: &db, attrs: &r };
        assert!(!ev.eval(&expr, wiz_staff, Dbref::NOTHING));
        assert!(ev.eval(&expr, plain, Dbref::NOTHING));
    }

    #[test]
    fn dbref_identity_lock() {
        let expr = parse_lock("=#5").unwrap();
        assert_eq!(expr, LockExpr::Is(Dbref(5)));
        let db = ObjectDb::new();
        let r = resolver(300);
        let ev = LockEvaluator { db: &db, attrs: &r };
        assert!(ev.eval(&expr, Dbref(5), Dbref::NOTHING));
        assert!(!ev.eval(&expr, Dbref(6), Dbref::NOTHING));
    }

    #[test]
    fn attr_wildcard_match() {
        let mut db = ObjectDb::new();
        let player = db.create(ObjectKind::Player, Dbref::NOTHING);
        db.set_attr(
            player,
            300,
            "100 points".to_string(),
            player,
            tinymush_common::AttrFlags::empty(),
        )
        .unwrap();
        let expr = parse_lock("score:*points").unwrap();
        let r = resolver(300);
        let ev = LockEvaluator { db: &db, attrs: &r };
        assert!(ev.eval(&expr, player, Dbref::NOTHING));
    }

    #[test]
    fn missing_close_paren_is_a_parse_error() {
        assert_eq!(parse_lock("(WIZARD"), Err(LockParseError::MissingCloseParen(7)));
    }
}
