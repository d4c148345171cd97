//! Boolean locks
//!
//! A lock is a small boolean expression over objects and attribute tests,
//! stored as attribute text (`LOCK`, `LENTER`, `LUSE`) and evaluated when a
//! player tries to pass through, enter or use something.
//!
//! Operators: `&` and, `|` or, `!` not, `@` indirect (use another object's
//! lock), `=` is, `+` carries, `$` owned by the same player. A reference
//! containing `:` tests an attribute against a wildcard pattern; one
//! containing `/` evaluates an attribute and compares the result.
//!
//! Locks are written in two forms: the storage form uses `#N` and attribute
//! numbers so it survives renames, the display form uses names.

mod eval;
mod parser;

use thiserror::Error;

use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::matcher::Match;
use crate::world::{attrs, AttrNum, World};

use parser::Syntax;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("I don't see {0} here.")]
    NotFound(String),
    #[error("I don't know which {0} you mean!")]
    Ambiguous(String),
    #[error("I don't understand that key.")]
    Syntax,
    #[error("corrupt lock record: {0}")]
    Corrupt(String),
}

/// Operand of `=` and `+`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockTarget {
    Object(Dbref),
    Attr { attr: AttrNum, pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    And(Box<Lock>, Box<Lock>),
    Or(Box<Lock>, Box<Lock>),
    Not(Box<Lock>),
    /// The player is, or carries, the object
    Const(Dbref),
    /// `ATTR:pattern` on the player or something they carry
    Attr { attr: AttrNum, pattern: String },
    /// `ATTR/value`: evaluate the attribute and compare
    Eval { attr: AttrNum, value: String },
    Indir(Dbref),
    Is(LockTarget),
    Carry(LockTarget),
    Owner(Dbref),
}

/// Turns reference text into objects and attribute numbers
trait Resolve {
    fn object(&mut self, text: &str) -> Result<Dbref, LockError>;
    fn attribute(&mut self, name: &str) -> Option<AttrNum>;
    fn syntax_error(&self) -> LockError;
}

/// Names typed by a player, resolved from where they stand
struct Typed<'e, W: World> {
    engine: &'e mut Engine<W>,
    player: Dbref,
}

impl<W: World> Resolve for Typed<'_, W> {
    fn object(&mut self, text: &str) -> Result<Dbref, LockError> {
        match self.engine.match_thing(self.player, text) {
            Match::Found(obj) => Ok(obj),
            Match::NotFound => Err(LockError::NotFound(text.to_string())),
            Match::Ambiguous => Err(LockError::Ambiguous(text.to_string())),
        }
    }

    fn attribute(&mut self, name: &str) -> Option<AttrNum> {
        let world = &mut self.engine.world;
        world
            .attr_number(name)
            .or_else(|| attrs::is_valid_name(name).then(|| world.attr_define(name)))
    }

    fn syntax_error(&self) -> LockError {
        LockError::Syntax
    }
}

/// The storage form read back from an attribute
struct Stored<'w, W: World> {
    world: &'w W,
    text: &'w str,
}

impl<W: World> Resolve for Stored<'_, W> {
    fn object(&mut self, text: &str) -> Result<Dbref, LockError> {
        Dbref::parse(text).ok_or_else(|| self.syntax_error())
    }

    fn attribute(&mut self, name: &str) -> Option<AttrNum> {
        match name.parse::<AttrNum>() {
            Ok(num) => Some(num),
            Err(_) => self.world.attr_number(name),
        }
    }

    fn syntax_error(&self) -> LockError {
        LockError::Corrupt(self.text.to_string())
    }
}

/// `ATTR:pattern` or `ATTR/value`, if `text` names a known attribute
fn attr_ref<R: Resolve>(text: &str, r: &mut R) -> Option<(AttrNum, char, String)> {
    let split = text.find([':', '/'])?;
    let sep = text[split..].chars().next()?;
    let attr = r.attribute(text[..split].trim())?;
    Some((attr, sep, text[split + 1..].to_string()))
}

fn leaf<R: Resolve>(text: &str, r: &mut R) -> Result<Lock, LockError> {
    if text.is_empty() {
        return Err(r.syntax_error());
    }
    match attr_ref(text, r) {
        Some((attr, ':', pattern)) => Ok(Lock::Attr { attr, pattern }),
        Some((attr, _, value)) => Ok(Lock::Eval { attr, value }),
        None => r.object(text).map(Lock::Const),
    }
}

/// Operand of a prefix operator that only accepts an object
fn object_operand<R: Resolve>(tree: &Syntax<'_>, r: &mut R) -> Result<Dbref, LockError> {
    match tree {
        Syntax::Ref(text) => match leaf(text, r)? {
            Lock::Const(obj) => Ok(obj),
            _ => Err(r.syntax_error()),
        },
        _ => Err(r.syntax_error()),
    }
}

fn target<R: Resolve>(tree: &Syntax<'_>, r: &mut R) -> Result<LockTarget, LockError> {
    match tree {
        Syntax::Ref(text) => match leaf(text, r)? {
            Lock::Const(obj) => Ok(LockTarget::Object(obj)),
            Lock::Attr { attr, pattern } => Ok(LockTarget::Attr { attr, pattern }),
            _ => Err(r.syntax_error()),
        },
        _ => Err(r.syntax_error()),
    }
}

fn build<R: Resolve>(tree: &Syntax<'_>, r: &mut R) -> Result<Lock, LockError> {
    Ok(match tree {
        Syntax::And(a, b) => Lock::And(Box::new(build(a, r)?), Box::new(build(b, r)?)),
        Syntax::Or(a, b) => Lock::Or(Box::new(build(a, r)?), Box::new(build(b, r)?)),
        Syntax::Not(a) => Lock::Not(Box::new(build(a, r)?)),
        Syntax::Indir(a) => Lock::Indir(object_operand(a, r)?),
        Syntax::Owner(a) => Lock::Owner(object_operand(a, r)?),
        Syntax::Is(a) => Lock::Is(target(a, r)?),
        Syntax::Carry(a) => Lock::Carry(target(a, r)?),
        Syntax::Ref(text) => leaf(text, r)?,
    })
}

impl Lock {
    /// Decode the storage form
    pub fn from_storage<W: World>(world: &W, text: &str) -> Result<Lock, LockError> {
        let mut stored = Stored { world, text };
        let tree = parser::parse(text).ok_or_else(|| stored.syntax_error())?;
        build(&tree, &mut stored)
    }

    /// Storage form: `#N` objects and numbered attributes
    pub fn to_storage(&self) -> String {
        let mut out = String::new();
        self.unparse(&mut out, &|obj| obj.to_string(), &|attr| attr.to_string());
        out
    }

    /// Display form: `Name(#N)` objects and attribute names
    pub fn display<W: World>(&self, world: &W) -> String {
        let mut out = String::new();
        self.unparse(
            &mut out,
            &|obj| {
                if world.is_valid(obj) {
                    format!("{}({})", world.name(obj), obj)
                } else {
                    obj.to_string()
                }
            },
            &|attr| world.attr_name(attr).unwrap_or_else(|| attr.to_string()),
        );
        out
    }

    fn is_compound(&self) -> bool {
        matches!(self, Lock::And(..) | Lock::Or(..))
    }

    fn unparse(&self, out: &mut String, obj: &dyn Fn(Dbref) -> String, attr: &dyn Fn(AttrNum) -> String) {
        let grouped = |lock: &Lock, out: &mut String, wrap: bool| {
            if wrap {
                out.push('(');
                lock.unparse(out, obj, attr);
                out.push(')');
            } else {
                lock.unparse(out, obj, attr);
            }
        };
        match self {
            Lock::And(a, b) => {
                grouped(a, out, matches!(**a, Lock::Or(..)));
                out.push('&');
                grouped(b, out, matches!(**b, Lock::Or(..)));
            }
            Lock::Or(a, b) => {
                grouped(a, out, matches!(**a, Lock::Or(..)));
                out.push('|');
                b.unparse(out, obj, attr);
            }
            Lock::Not(a) => {
                out.push('!');
                grouped(a, out, a.is_compound());
            }
            Lock::Const(d) => out.push_str(&obj(*d)),
            Lock::Attr { attr: a, pattern } => {
                out.push_str(&format!("{}:{}", attr(*a), pattern));
            }
            Lock::Eval { attr: a, value } => {
                out.push_str(&format!("{}/{}", attr(*a), value));
            }
            Lock::Indir(d) => {
                out.push('@');
                out.push_str(&obj(*d));
            }
            Lock::Is(t) | Lock::Carry(t) => {
                out.push(if matches!(self, Lock::Is(_)) { '=' } else { '+' });
                match t {
                    LockTarget::Object(d) => out.push_str(&obj(*d)),
                    LockTarget::Attr { attr: a, pattern } => {
                        out.push_str(&format!("{}:{}", attr(*a), pattern));
                    }
                }
            }
            Lock::Owner(d) => {
                out.push('$');
                out.push_str(&obj(*d));
            }
        }
    }
}

impl<W: World> Engine<W> {
    /// Parse a lock typed by `player`, matching names from where they stand
    pub fn parse_lock(&mut self, player: Dbref, text: &str) -> Result<Lock, LockError> {
        let tree = parser::parse(text).ok_or(LockError::Syntax)?;
        build(&tree, &mut Typed { engine: self, player })
    }
}
