//! In-memory world
//!
//! A small but complete [`World`]: objects live in a vector indexed by dbref,
//! notifications are recorded per recipient, and the command queue is a FIFO.
//! Snapshots round-trip through JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;
use thiserror::Error;

use super::attrs::{self, AttrNum};
use super::{AttrFlags, Attribute, ObjectFlags, ObjectType, QueuedCommand, World};
use crate::dbref::Dbref;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("object {0} refers to missing object {1}")]
    Dangling(Dbref, Dbref),
}

fn nothing() -> Dbref {
    Dbref::NOTHING
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    pub kind: ObjectType,
    pub owner: Dbref,
    #[serde(default = "nothing")]
    pub location: Dbref,
    #[serde(default = "nothing")]
    pub destination: Dbref,
    #[serde(default = "nothing")]
    pub home: Dbref,
    #[serde(default = "nothing")]
    pub zone: Dbref,
    #[serde(default = "nothing")]
    pub parent: Dbref,
    #[serde(default)]
    pub flags: ObjectFlags,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub contents: Vec<Dbref>,
    #[serde(default)]
    pub exits: Vec<Dbref>,
    #[serde(default)]
    pub attrs: BTreeMap<AttrNum, Attribute>,
}

impl Object {
    fn new(name: &str, kind: ObjectType, owner: Dbref) -> Self {
        Self {
            name: name.to_string(),
            kind,
            owner,
            location: Dbref::NOTHING,
            destination: Dbref::NOTHING,
            home: Dbref::NOTHING,
            zone: Dbref::NOTHING,
            parent: Dbref::NOTHING,
            flags: ObjectFlags::NONE,
            connected: false,
            contents: Vec::new(),
            exits: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryWorld {
    objects: Vec<Object>,
    attr_names: BTreeMap<String, AttrNum>,
    next_attr: AttrNum,
    #[serde(default)]
    channel_aliases: HashSet<String>,
    #[serde(skip)]
    notifications: Vec<(Dbref, String)>,
    #[serde(skip)]
    queue: VecDeque<QueuedCommand>,
    #[serde(skip)]
    channel_log: Vec<(Dbref, String)>,
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorld {
    /// A world with room #0 (Limbo) and God (#1) standing in it
    pub fn new() -> Self {
        let mut world = Self {
            objects: Vec::new(),
            attr_names: attrs::WELL_KNOWN
                .iter()
                .map(|(name, num)| (name.to_string(), *num))
                .collect(),
            next_attr: attrs::USER_START,
            channel_aliases: HashSet::new(),
            notifications: Vec::new(),
            queue: VecDeque::new(),
            channel_log: Vec::new(),
        };
        let limbo = world.push(Object::new("Limbo", ObjectType::Room, Dbref::GOD));
        let mut god = Object::new("Wizard", ObjectType::Player, Dbref::GOD);
        god.flags = ObjectFlags::WIZARD;
        god.connected = true;
        god.home = limbo;
        let god = world.push(god);
        world.place(god, limbo);
        world
    }

    pub fn from_json(json: &str) -> Result<Self, WorldError> {
        let world: MemoryWorld = serde_json::from_str(json)?;
        world.check()?;
        Ok(world)
    }

    pub fn load(path: &Path) -> Result<Self, WorldError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check(&self) -> Result<(), WorldError> {
        for (index, obj) in self.objects.iter().enumerate() {
            let here = Dbref(index as i32);
            for other in obj.contents.iter().chain(obj.exits.iter()) {
                if self.get(*other).is_none() {
                    return Err(WorldError::Dangling(here, *other));
                }
            }
            if !obj.owner.is_nothing() && self.get(obj.owner).is_none() {
                return Err(WorldError::Dangling(here, obj.owner));
            }
        }
        Ok(())
    }

    fn push(&mut self, obj: Object) -> Dbref {
        self.objects.push(obj);
        Dbref(self.objects.len() as i32 - 1)
    }

    fn get(&self, obj: Dbref) -> Option<&Object> {
        obj.index().and_then(|i| self.objects.get(i))
    }

    fn get_mut(&mut self, obj: Dbref) -> Option<&mut Object> {
        obj.index().and_then(|i| self.objects.get_mut(i))
    }

    fn place(&mut self, obj: Dbref, dest: Dbref) {
        let old = self.location(obj);
        if let Some(prev) = self.get_mut(old) {
            prev.contents.retain(|d| *d != obj);
        }
        if let Some(target) = self.get_mut(dest) {
            target.contents.insert(0, obj);
        }
        if let Some(me) = self.get_mut(obj) {
            me.location = dest;
        }
    }

    fn arrive(&mut self, obj: Dbref, dest: Dbref) {
        if !self.is_valid(dest) {
            return;
        }
        self.place(obj, dest);
        let name = self.name(dest);
        self.notify(obj, &name);
    }

    pub fn create_room(&mut self, name: &str, owner: Dbref) -> Dbref {
        self.push(Object::new(name, ObjectType::Room, owner))
    }

    pub fn create_thing(&mut self, name: &str, owner: Dbref, location: Dbref) -> Dbref {
        let mut obj = Object::new(name, ObjectType::Thing, owner);
        obj.home = location;
        let thing = self.push(obj);
        self.place(thing, location);
        thing
    }

    /// A connected player standing in `location`
    pub fn create_player(&mut self, name: &str, location: Dbref) -> Dbref {
        let index = Dbref(self.objects.len() as i32);
        let mut obj = Object::new(name, ObjectType::Player, index);
        obj.home = location;
        obj.connected = true;
        let player = self.push(obj);
        self.place(player, location);
        player
    }

    /// `name` may hold `;`-separated aliases, e.g. `North;n`
    pub fn create_exit(&mut self, name: &str, source: Dbref, destination: Dbref, owner: Dbref) -> Dbref {
        let mut obj = Object::new(name, ObjectType::Exit, owner);
        obj.location = source;
        obj.destination = destination;
        let exit = self.push(obj);
        if let Some(room) = self.get_mut(source) {
            room.exits.push(exit);
        }
        exit
    }

    pub fn set_connected(&mut self, obj: Dbref, connected: bool) {
        if let Some(o) = self.get_mut(obj) {
            o.connected = connected;
        }
    }

    pub fn set_owner(&mut self, obj: Dbref, owner: Dbref) {
        if let Some(o) = self.get_mut(obj) {
            o.owner = owner;
        }
    }

    pub fn set_zone(&mut self, obj: Dbref, zone: Dbref) {
        if let Some(o) = self.get_mut(obj) {
            o.zone = zone;
        }
    }

    pub fn set_parent(&mut self, obj: Dbref, parent: Dbref) {
        if let Some(o) = self.get_mut(obj) {
            o.parent = parent;
        }
    }

    pub fn set_home(&mut self, obj: Dbref, home: Dbref) {
        if let Some(o) = self.get_mut(obj) {
            o.home = home;
        }
    }

    pub fn teleport(&mut self, obj: Dbref, dest: Dbref) {
        self.place(obj, dest);
    }

    /// Set an attribute by name, owned by the object's owner
    pub fn set_attr(&mut self, obj: Dbref, name: &str, text: &str) -> AttrNum {
        self.set_attr_flags(obj, name, text, AttrFlags::NONE)
    }

    pub fn set_attr_flags(&mut self, obj: Dbref, name: &str, text: &str, flags: AttrFlags) -> AttrNum {
        let num = self.attr_define(name);
        let owner = self.owner(obj);
        self.atr_add(obj, num, text, owner, flags);
        num
    }

    pub fn attr(&self, obj: Dbref, name: &str) -> Option<String> {
        let num = self.attr_number(name)?;
        self.atr_get(obj, num).map(|a| a.text)
    }

    pub fn add_channel_alias(&mut self, alias: &str) {
        self.channel_aliases.insert(alias.to_ascii_lowercase());
    }

    pub fn channel_log(&self) -> &[(Dbref, String)] {
        &self.channel_log
    }

    /// Messages delivered to `target`, oldest first
    pub fn notifications(&self, target: Dbref) -> Vec<String> {
        self.notifications
            .iter()
            .filter(|(to, _)| *to == target)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    /// Remove and return the messages delivered to `target`
    pub fn take_notifications(&mut self, target: Dbref) -> Vec<String> {
        let (mine, rest): (Vec<_>, Vec<_>) =
            self.notifications.drain(..).partition(|(to, _)| *to == target);
        self.notifications = rest;
        mine.into_iter().map(|(_, msg)| msg).collect()
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queued(&self) -> impl Iterator<Item = &QueuedCommand> {
        self.queue.iter()
    }
}

impl World for MemoryWorld {
    fn is_valid(&self, obj: Dbref) -> bool {
        self.get(obj).is_some_and(|o| o.kind != ObjectType::Garbage)
    }

    fn object_type(&self, obj: Dbref) -> Option<ObjectType> {
        self.get(obj).map(|o| o.kind)
    }

    fn name(&self, obj: Dbref) -> String {
        self.get(obj).map(|o| o.name.clone()).unwrap_or_default()
    }

    fn owner(&self, obj: Dbref) -> Dbref {
        self.get(obj).map(|o| o.owner).unwrap_or(Dbref::NOTHING)
    }

    fn location(&self, obj: Dbref) -> Dbref {
        self.get(obj).map(|o| o.location).unwrap_or(Dbref::NOTHING)
    }

    fn home(&self, obj: Dbref) -> Dbref {
        self.get(obj).map(|o| o.home).unwrap_or(Dbref::NOTHING)
    }

    fn zone(&self, obj: Dbref) -> Dbref {
        self.get(obj).map(|o| o.zone).unwrap_or(Dbref::NOTHING)
    }

    fn parent(&self, obj: Dbref) -> Dbref {
        self.get(obj).map(|o| o.parent).unwrap_or(Dbref::NOTHING)
    }

    fn contents(&self, obj: Dbref) -> Vec<Dbref> {
        self.get(obj).map(|o| o.contents.clone()).unwrap_or_default()
    }

    fn exits(&self, obj: Dbref) -> Vec<Dbref> {
        self.get(obj).map(|o| o.exits.clone()).unwrap_or_default()
    }

    fn flags(&self, obj: Dbref) -> ObjectFlags {
        self.get(obj).map(|o| o.flags).unwrap_or_default()
    }

    fn set_flag(&mut self, obj: Dbref, flag: ObjectFlags, on: bool) {
        if let Some(o) = self.get_mut(obj) {
            if on {
                o.flags.insert(flag);
            } else {
                o.flags.remove(flag);
            }
        }
    }

    fn is_connected(&self, obj: Dbref) -> bool {
        self.get(obj).is_some_and(|o| o.connected)
    }

    fn lookup_player(&self, name: &str) -> Option<Dbref> {
        self.objects
            .iter()
            .position(|o| o.kind == ObjectType::Player && o.name.eq_ignore_ascii_case(name))
            .map(|i| Dbref(i as i32))
    }

    fn atr_get(&self, obj: Dbref, attr: AttrNum) -> Option<Attribute> {
        let o = self.get(obj)?;
        if attr == attrs::NAME {
            return Some(Attribute { text: o.name.clone(), owner: o.owner, flags: AttrFlags::NONE });
        }
        o.attrs.get(&attr).cloned()
    }

    fn atr_add(&mut self, obj: Dbref, attr: AttrNum, text: &str, owner: Dbref, flags: AttrFlags) {
        if let Some(o) = self.get_mut(obj) {
            if attr == attrs::NAME {
                o.name = text.to_string();
            } else if text.is_empty() {
                o.attrs.remove(&attr);
            } else {
                o.attrs.insert(attr, Attribute { text: text.to_string(), owner, flags });
            }
        }
    }

    fn atr_clear(&mut self, obj: Dbref, attr: AttrNum) {
        if let Some(o) = self.get_mut(obj) {
            o.attrs.remove(&attr);
        }
    }

    fn atr_list(&self, obj: Dbref) -> Vec<AttrNum> {
        self.get(obj).map(|o| o.attrs.keys().copied().collect()).unwrap_or_default()
    }

    fn attr_number(&self, name: &str) -> Option<AttrNum> {
        let upper = name.to_ascii_uppercase();
        if let Some(num) = self.attr_names.get(&upper) {
            return Some(*num);
        }
        let letter = upper.strip_prefix('V').filter(|rest| rest.len() == 1)?;
        letter.chars().next().and_then(attrs::va)
    }

    fn attr_define(&mut self, name: &str) -> AttrNum {
        if let Some(num) = self.attr_number(name) {
            return num;
        }
        let num = self.next_attr;
        self.next_attr += 1;
        self.attr_names.insert(name.to_ascii_uppercase(), num);
        num
    }

    fn attr_name(&self, num: AttrNum) -> Option<String> {
        attrs::well_known_name(num).or_else(|| {
            self.attr_names
                .iter()
                .find(|(_, n)| **n == num)
                .map(|(name, _)| name.clone())
        })
    }

    fn notify(&mut self, target: Dbref, message: &str) {
        if self.is_valid(target) {
            self.notifications.push((target, message.to_string()));
        }
    }

    fn enqueue(&mut self, entry: QueuedCommand) {
        self.queue.push_back(entry);
    }

    fn dequeue(&mut self) -> Option<QueuedCommand> {
        self.queue.pop_front()
    }

    fn move_via_exit(&mut self, player: Dbref, exit: Dbref) {
        let dest = self.get(exit).map(|e| e.destination).unwrap_or(Dbref::NOTHING);
        if dest == Dbref::HOME {
            self.move_home(player);
        } else {
            self.arrive(player, dest);
        }
    }

    fn move_home(&mut self, player: Dbref) {
        let home = self.home(player);
        self.arrive(player, home);
    }

    fn move_into(&mut self, player: Dbref, dest: Dbref) {
        self.arrive(player, dest);
    }

    fn move_out(&mut self, player: Dbref) {
        let container = self.location(player);
        let outside = self.location(container);
        self.arrive(player, outside);
    }

    fn channel_intercept(&mut self, player: Dbref, line: &str) -> bool {
        let alias = line.split(' ').next().unwrap_or_default().to_ascii_lowercase();
        if !alias.is_empty() && self.channel_aliases.contains(&alias) {
            self.channel_log.push((player, line.to_string()));
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_world() {
        let world = MemoryWorld::new();
        assert!(world.is_room(Dbref(0)));
        assert!(world.is_god(Dbref::GOD));
        assert_eq!(world.location(Dbref::GOD), Dbref(0));
        assert_eq!(world.contents(Dbref(0)), vec![Dbref::GOD]);
    }

    #[test]
    fn movement_updates_contents() {
        let mut world = MemoryWorld::new();
        let hall = world.create_room("Hall", Dbref::GOD);
        let bob = world.create_player("Bob", Dbref(0));
        let door = world.create_exit("Door;d", Dbref(0), hall, Dbref::GOD);
        world.move_via_exit(bob, door);
        assert_eq!(world.location(bob), hall);
        assert!(!world.contents(Dbref(0)).contains(&bob));
        assert_eq!(world.take_notifications(bob), vec!["Hall".to_string()]);
        world.move_home(bob);
        assert_eq!(world.location(bob), Dbref(0));
    }

    #[test]
    fn attributes_by_name() {
        let mut world = MemoryWorld::new();
        let n = world.set_attr(Dbref::GOD, "fn_test", "abc");
        assert!(n >= attrs::USER_START);
        assert_eq!(world.attr_number("FN_TEST"), Some(n));
        assert_eq!(world.attr(Dbref::GOD, "Fn_Test").as_deref(), Some("abc"));
        assert_eq!(world.attr_number("VB"), Some(attrs::VA + 1));
        assert_eq!(world.atr_text(Dbref::GOD, attrs::NAME), "Wizard");
    }

    #[test]
    fn parent_chain_skips_private() {
        let mut world = MemoryWorld::new();
        let parent = world.create_thing("Parent", Dbref::GOD, Dbref(0));
        let child = world.create_thing("Child", Dbref::GOD, Dbref(0));
        world.set_parent(child, parent);
        world.set_attr(parent, "SHARED", "yes");
        world.set_attr_flags(parent, "SECRET", "no", AttrFlags::PRIVATE);
        let shared = world.attr_number("SHARED").unwrap();
        let secret = world.attr_number("SECRET").unwrap();
        assert_eq!(world.atr_pget(child, shared, 10).map(|(a, on)| (a.text, on)), Some(("yes".into(), parent)));
        assert!(world.atr_pget(child, secret, 10).is_none());
    }

    #[test]
    fn json_round_trip() {
        let mut world = MemoryWorld::new();
        world.create_thing("Box", Dbref::GOD, Dbref(0));
        let json = world.to_json().unwrap();
        let back = MemoryWorld::from_json(&json).unwrap();
        assert_eq!(back.name(Dbref(2)), "Box");
        assert!(MemoryWorld::from_json("{").is_err());
    }
}
