//! Object name matching
//!
//! Resolves what a player typed (`me`, `here`, `#12`, `*name`, or an object
//! name) to a dbref, searching the player's inventory, their location's
//! contents and its exits. Exact names win over partial ones.

use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::world::{ObjectType, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Found(Dbref),
    NotFound,
    Ambiguous,
}

impl Match {
    pub fn found(self) -> Option<Dbref> {
        match self {
            Match::Found(d) => Some(d),
            _ => None,
        }
    }
}

/// `name` equals one of the `;`-separated aliases in `list`
pub fn exit_name_matches(list: &str, name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && list.split(';').any(|alias| alias.trim().eq_ignore_ascii_case(name))
}

/// Some word of `full` starts with `partial`
fn word_prefix(full: &str, partial: &str) -> bool {
    let partial = partial.to_ascii_lowercase();
    full.split_whitespace()
        .any(|word| word.to_ascii_lowercase().starts_with(&partial))
}

fn settle(candidates: &[Dbref]) -> Option<Match> {
    match candidates {
        [] => None,
        [one] => Some(Match::Found(*one)),
        _ => Some(Match::Ambiguous),
    }
}

impl<W: World> Engine<W> {
    pub fn match_thing(&self, player: Dbref, name: &str) -> Match {
        let name = name.trim();
        if name.is_empty() {
            return Match::NotFound;
        }
        if name.eq_ignore_ascii_case("me") {
            return Match::Found(player);
        }
        if name.eq_ignore_ascii_case("here") {
            let loc = self.world.location(player);
            return if self.world.is_valid(loc) { Match::Found(loc) } else { Match::NotFound };
        }
        if name.starts_with('#') {
            return match Dbref::parse(name) {
                Some(d) if self.world.is_valid(d) => Match::Found(d),
                _ => Match::NotFound,
            };
        }
        if let Some(pname) = name.strip_prefix('*') {
            return self.world.lookup_player(pname).map_or(Match::NotFound, Match::Found);
        }

        let loc = self.world.location(player);
        let mut things = self.world.contents(player);
        if self.world.is_valid(loc) {
            things.extend(self.world.contents(loc));
        }
        let exits = if self.world.is_valid(loc) { self.world.exits(loc) } else { Vec::new() };

        let exact: Vec<Dbref> = things
            .iter()
            .copied()
            .filter(|&t| self.world.name(t).eq_ignore_ascii_case(name))
            .chain(exits.iter().copied().filter(|&e| exit_name_matches(&self.world.name(e), name)))
            .collect();
        if let Some(m) = settle(&exact) {
            return m;
        }
        let partial: Vec<Dbref> = things
            .iter()
            .copied()
            .filter(|&t| word_prefix(&self.world.name(t), name))
            .collect();
        settle(&partial).unwrap_or(Match::NotFound)
    }

    /// Resolve `name` or tell the player why it could not be resolved
    pub(crate) fn match_or_notify(&mut self, player: Dbref, name: &str) -> Option<Dbref> {
        match self.match_thing(player, name) {
            Match::Found(d) => Some(d),
            Match::NotFound => {
                self.world.notify(player, "I don't see that here.");
                None
            }
            Match::Ambiguous => {
                self.world.notify(player, "I don't know which one you mean!");
                None
            }
        }
    }

    /// An exit named `name` in `room` or its parents
    pub(crate) fn match_exit_in(&self, room: Dbref, name: &str) -> Option<Dbref> {
        let mut current = room;
        for _ in 0..=self.config.limits.parent_nesting {
            if !self.world.is_valid(current) {
                return None;
            }
            let found = self
                .world
                .exits(current)
                .into_iter()
                .find(|&e| exit_name_matches(&self.world.name(e), name));
            if found.is_some() {
                return found;
            }
            current = self.world.parent(current);
        }
        None
    }

    /// Exits reachable from where `player` stands, nearest first
    pub(crate) fn match_exit(&self, player: Dbref, name: &str) -> Option<Dbref> {
        let loc = self.world.location(player);
        match self.world.object_type(loc) {
            Some(ObjectType::Room) | Some(ObjectType::Thing) => self.match_exit_in(loc, name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::world::memory::MemoryWorld;

    #[test]
    fn exit_aliases() {
        assert!(exit_name_matches("North;n;no", "N"));
        assert!(!exit_name_matches("North;n", "nor"));
        assert!(!exit_name_matches("North", ""));
    }

    #[test]
    fn names_and_keywords() {
        let mut world = MemoryWorld::new();
        let bob = world.create_player("Bob", Dbref(0));
        let sword = world.create_thing("Silver Sword", bob, bob);
        world.create_thing("Red Ball", bob, Dbref(0));
        world.create_thing("Red Box", bob, Dbref(0));
        let engine = Engine::new(world, Config::default());

        assert_eq!(engine.match_thing(bob, "me"), Match::Found(bob));
        assert_eq!(engine.match_thing(bob, "here"), Match::Found(Dbref(0)));
        assert_eq!(engine.match_thing(bob, "#1"), Match::Found(Dbref::GOD));
        assert_eq!(engine.match_thing(bob, "#999"), Match::NotFound);
        assert_eq!(engine.match_thing(bob, "*wizard"), Match::Found(Dbref::GOD));
        assert_eq!(engine.match_thing(bob, "sword"), Match::Found(sword));
        assert_eq!(engine.match_thing(bob, "red"), Match::Ambiguous);
        assert_eq!(engine.match_thing(bob, "red ball").found().is_some(), true);
        assert_eq!(engine.match_thing(bob, "lamp"), Match::NotFound);
    }
}
