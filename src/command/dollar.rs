//! `$`-command matching on objects

use std::collections::HashSet;

use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::wild::{regex_captures, wild_captures};
use crate::world::{attrs, AttrFlags, AttrNum, ObjectFlags, World};

use super::invoke::split_dollar;

impl<W: World> Engine<W> {
    /// Match `line` against the `$`-commands on `thing` and its parents,
    /// queueing each one that matches. Returns whether anything matched,
    /// including matches refused by the use lock.
    pub(crate) fn atr_match(&mut self, thing: Dbref, player: Dbref, line: &str, raw: &str) -> bool {
        if !self.world.is_valid(thing) || self.world.has_flag(thing, ObjectFlags::NO_COMMAND) {
            return false;
        }
        let mut seen: HashSet<AttrNum> = HashSet::new();
        let mut matched = false;
        let mut current = thing;
        for depth in 0..=self.config.limits.parent_nesting {
            if !self.world.is_valid(current) {
                break;
            }
            for attr in self.world.atr_list(current) {
                if !seen.insert(attr) {
                    continue;
                }
                let Some(found) = self.world.atr_get(current, attr) else {
                    continue;
                };
                if found.flags.contains(AttrFlags::NO_PROGRAM)
                    || (depth > 0 && found.flags.contains(AttrFlags::PRIVATE))
                {
                    continue;
                }
                let Some((pattern, action)) = split_dollar(&found.text) else {
                    continue;
                };
                let subject = if found.flags.contains(AttrFlags::NO_PARSE) { raw } else { line };
                let case = found.flags.contains(AttrFlags::CASE);
                let captures = if found.flags.contains(AttrFlags::REGEXP) {
                    regex_captures(pattern, subject, case)
                } else {
                    wild_captures(pattern, subject, case)
                };
                let Some(args) = captures else {
                    continue;
                };
                matched = true;
                if !self.could_doit(player, thing, attrs::LUSE) {
                    self.world.notify(player, "You can't use that.");
                    continue;
                }
                self.queue_command(thing, player, player, action, &args);
            }
            current = self.world.parent(current);
        }
        matched
    }

    /// `$`-commands on everything inside `container` except the player
    pub(crate) fn list_match(&mut self, container: Dbref, player: Dbref, line: &str, raw: &str) -> bool {
        let mut matched = false;
        for thing in self.world.contents(container) {
            if thing != player {
                matched |= self.atr_match(thing, player, line, raw);
            }
        }
        matched
    }
}
