//! Collaborator services consumed by the engine
//!
//! The engine does not own the object database, the flag library, the
//! command queue or the network. It reaches all of them through [`World`].
//! [`memory::MemoryWorld`] is a complete in-memory implementation used by the
//! REPL and the test suite.

pub mod attrs;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::dbref::Dbref;
use crate::eval::Registers;

pub use attrs::AttrNum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Room,
    Thing,
    Exit,
    Player,
    Garbage,
}

macro_rules! bitset {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $bit:expr;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(0);
            $($(#[$fmeta])* pub const $flag: $name = $name($bit);)*

            pub fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn intersects(self, other: $name) -> bool {
                self.0 & other.0 != 0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: $name) {
                self.0 &= !other.0;
            }

            pub const fn without(self, other: $name) -> $name {
                $name(self.0 & !other.0)
            }

            pub const fn with(self, other: $name) -> $name {
                $name(self.0 | other.0)
            }
        }

        impl ::std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl ::std::ops::BitAnd for $name {
            type Output = $name;
            fn bitand(self, rhs: $name) -> $name {
                $name(self.0 & rhs.0)
            }
        }
    };
}

pub(crate) use bitset;

bitset! {
    /// Per-object flags tested by the permission layer and the dispatcher
    ObjectFlags {
        WIZARD = 1 << 0;
        STAFF = 1 << 1;
        BUILDER = 1 << 2;
        HEAD = 1 << 3;
        IMMORTAL = 1 << 4;
        INHERIT = 1 << 5;
        GOING = 1 << 6;
        HALTED = 1 << 7;
        TRACE = 1 << 8;
        VERBOSE = 1 << 9;
        /// $-commands on this object are never matched
        NO_COMMAND = 1 << 10;
        ROBOT = 1 << 11;
        SLAVE = 1 << 12;
        SUSPECT = 1 << 13;
        GUEST = 1 << 14;
        HAVEN = 1 << 15;
        UNINSPECTED = 1 << 16;
        /// Consult the CMDCHECK attribute before running commands
        CMDCHECK = 1 << 17;
        ENTER_OK = 1 << 18;
        VISUAL = 1 << 19;
        /// May not use `home`
        FIXED = 1 << 20;
        /// Hidden from location queries by those who can't examine it
        UNFINDABLE = 1 << 21;
    }
}

const FLAG_NAMES: &[(&str, ObjectFlags)] = &[
    ("builder", ObjectFlags::BUILDER),
    ("cmdcheck", ObjectFlags::CMDCHECK),
    ("enter_ok", ObjectFlags::ENTER_OK),
    ("fixed", ObjectFlags::FIXED),
    ("going", ObjectFlags::GOING),
    ("guest", ObjectFlags::GUEST),
    ("halted", ObjectFlags::HALTED),
    ("haven", ObjectFlags::HAVEN),
    ("head", ObjectFlags::HEAD),
    ("immortal", ObjectFlags::IMMORTAL),
    ("inherit", ObjectFlags::INHERIT),
    ("no_command", ObjectFlags::NO_COMMAND),
    ("robot", ObjectFlags::ROBOT),
    ("slave", ObjectFlags::SLAVE),
    ("staff", ObjectFlags::STAFF),
    ("suspect", ObjectFlags::SUSPECT),
    ("trace", ObjectFlags::TRACE),
    ("unfindable", ObjectFlags::UNFINDABLE),
    ("uninspected", ObjectFlags::UNINSPECTED),
    ("verbose", ObjectFlags::VERBOSE),
    ("visual", ObjectFlags::VISUAL),
    ("wizard", ObjectFlags::WIZARD),
];

impl ObjectFlags {
    /// Flag by its (case-insensitive) name
    pub fn from_name(name: &str) -> Option<ObjectFlags> {
        FLAG_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, f)| *f)
    }
}

bitset! {
    /// Per-attribute flags
    AttrFlags {
        /// Never matched as a $-command
        NO_PROGRAM = 1 << 0;
        /// $-pattern is a regular expression
        REGEXP = 1 << 1;
        /// Pattern matching is case-sensitive
        CASE = 1 << 2;
        /// Match the $-pattern against the unevaluated command line
        NO_PARSE = 1 << 3;
        /// Readable by God only
        DARK = 1 << 4;
        /// Readable by wizards only
        MDARK = 1 << 5;
        /// Readable by everyone
        VISUAL = 1 << 6;
        /// Not inherited by children
        PRIVATE = 1 << 7;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub text: String,
    pub owner: Dbref,
    #[serde(default)]
    pub flags: AttrFlags,
}

/// A unit of deferred work handed to the queue collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCommand {
    pub executor: Dbref,
    pub caller: Dbref,
    pub enactor: Dbref,
    /// `;`-separated action list, evaluated when the entry runs
    pub text: String,
    /// Bound to `%0`-`%9`
    pub args: Vec<String>,
    /// Register snapshot restored before the entry runs
    pub registers: Registers,
}

/// Object database, predicate library, queue, notification and movement services
pub trait World {
    fn is_valid(&self, obj: Dbref) -> bool;
    fn object_type(&self, obj: Dbref) -> Option<ObjectType>;
    fn name(&self, obj: Dbref) -> String;
    fn owner(&self, obj: Dbref) -> Dbref;
    fn location(&self, obj: Dbref) -> Dbref;
    fn home(&self, obj: Dbref) -> Dbref;
    fn zone(&self, obj: Dbref) -> Dbref;
    fn parent(&self, obj: Dbref) -> Dbref;
    fn contents(&self, obj: Dbref) -> Vec<Dbref>;
    fn exits(&self, obj: Dbref) -> Vec<Dbref>;
    fn flags(&self, obj: Dbref) -> ObjectFlags;
    fn set_flag(&mut self, obj: Dbref, flag: ObjectFlags, on: bool);
    fn is_connected(&self, obj: Dbref) -> bool;
    fn lookup_player(&self, name: &str) -> Option<Dbref>;

    fn atr_get(&self, obj: Dbref, attr: AttrNum) -> Option<Attribute>;
    fn atr_add(&mut self, obj: Dbref, attr: AttrNum, text: &str, owner: Dbref, flags: AttrFlags);
    fn atr_clear(&mut self, obj: Dbref, attr: AttrNum);
    /// Attribute numbers present directly on `obj`
    fn atr_list(&self, obj: Dbref) -> Vec<AttrNum>;
    fn attr_number(&self, name: &str) -> Option<AttrNum>;
    /// Look up or allocate an attribute number for `name`
    fn attr_define(&mut self, name: &str) -> AttrNum;
    fn attr_name(&self, num: AttrNum) -> Option<String>;

    fn notify(&mut self, target: Dbref, message: &str);
    fn enqueue(&mut self, entry: QueuedCommand);
    fn dequeue(&mut self) -> Option<QueuedCommand>;

    fn move_via_exit(&mut self, player: Dbref, exit: Dbref);
    fn move_home(&mut self, player: Dbref);
    fn move_into(&mut self, player: Dbref, dest: Dbref);
    fn move_out(&mut self, player: Dbref);

    /// Communication-system hook; return true to claim the line
    fn channel_intercept(&mut self, _player: Dbref, _line: &str) -> bool {
        false
    }

    fn has_flag(&self, obj: Dbref, flag: ObjectFlags) -> bool {
        self.flags(obj).contains(flag)
    }

    fn is_player(&self, obj: Dbref) -> bool {
        self.object_type(obj) == Some(ObjectType::Player)
    }

    fn is_room(&self, obj: Dbref) -> bool {
        self.object_type(obj) == Some(ObjectType::Room)
    }

    fn has_location(&self, obj: Dbref) -> bool {
        matches!(
            self.object_type(obj),
            Some(ObjectType::Thing | ObjectType::Player | ObjectType::Exit)
        )
    }

    fn has_contents(&self, obj: Dbref) -> bool {
        matches!(
            self.object_type(obj),
            Some(ObjectType::Room | ObjectType::Thing | ObjectType::Player)
        )
    }

    fn is_god(&self, obj: Dbref) -> bool {
        obj == Dbref::GOD
    }

    fn is_wizard(&self, obj: Dbref) -> bool {
        if !self.is_valid(obj) {
            return false;
        }
        if self.is_god(obj) || self.has_flag(obj, ObjectFlags::WIZARD) {
            return true;
        }
        let owner = self.owner(obj);
        owner != obj
            && self.has_flag(obj, ObjectFlags::INHERIT)
            && self.has_flag(owner, ObjectFlags::WIZARD)
    }

    fn is_staff(&self, obj: Dbref) -> bool {
        self.is_wizard(obj) || self.has_flag(obj, ObjectFlags::STAFF)
    }

    fn is_builder(&self, obj: Dbref) -> bool {
        self.is_wizard(obj)
            || self.has_flag(obj, ObjectFlags::BUILDER)
            || self.has_flag(self.owner(obj), ObjectFlags::BUILDER)
    }

    fn controls(&self, who: Dbref, what: Dbref) -> bool {
        if !self.is_valid(who) || !self.is_valid(what) {
            return false;
        }
        if self.is_god(who) || who == what {
            return true;
        }
        if self.is_god(what) {
            return false;
        }
        if self.is_wizard(who) {
            return true;
        }
        self.owner(who) == self.owner(what) && !self.is_wizard(what)
    }

    fn nearby(&self, a: Dbref, b: Dbref) -> bool {
        if !self.is_valid(a) || !self.is_valid(b) {
            return false;
        }
        let loc_a = self.location(a);
        let loc_b = self.location(b);
        (loc_a == loc_b && !loc_a.is_nothing()) || loc_b == a || loc_a == b
    }

    /// Whether `player` may learn where `it` is. Objects that are
    /// unfindable, or sit in an unfindable container, hide their location
    /// from anyone who controls neither them nor that container and isn't
    /// standing beside them.
    fn locatable(&self, player: Dbref, it: Dbref) -> bool {
        if !self.is_valid(it) {
            return false;
        }
        let loc = self.location(it);
        if self.is_wizard(player)
            || self.controls(player, it)
            || loc == player
            || (!loc.is_nothing() && (loc == self.location(player) || self.controls(player, loc)))
        {
            return true;
        }
        !self.has_flag(it, ObjectFlags::UNFINDABLE)
            && !(self.is_valid(loc) && self.has_flag(loc, ObjectFlags::UNFINDABLE))
    }

    /// Attribute lookup through the parent chain. Returns the attribute and
    /// the object it was found on.
    fn atr_pget(&self, obj: Dbref, attr: AttrNum, limit: usize) -> Option<(Attribute, Dbref)> {
        let mut current = obj;
        for depth in 0..=limit {
            if !self.is_valid(current) {
                return None;
            }
            if let Some(found) = self.atr_get(current, attr) {
                if depth == 0 || !found.flags.contains(AttrFlags::PRIVATE) {
                    return Some((found, current));
                }
            }
            current = self.parent(current);
        }
        None
    }

    /// Attribute text or the empty string
    fn atr_text(&self, obj: Dbref, attr: AttrNum) -> String {
        self.atr_get(obj, attr).map(|a| a.text).unwrap_or_default()
    }

    /// Whether `player` may read `attr` on `thing`
    fn can_read_attr(&self, player: Dbref, thing: Dbref, attr: AttrNum) -> bool {
        let Some(found) = self.atr_get(thing, attr) else {
            return true;
        };
        if found.flags.contains(AttrFlags::DARK) {
            return self.is_god(player);
        }
        if found.flags.contains(AttrFlags::MDARK) && !self.is_wizard(player) {
            return false;
        }
        found.flags.contains(AttrFlags::VISUAL)
            || self.has_flag(thing, ObjectFlags::VISUAL)
            || found.owner == player
            || self.controls(player, thing)
    }
}
