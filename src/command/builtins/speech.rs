//! say, pose, think and the emit family

use crate::command::{CallSeq, CommandEntry, CommandHandler, Invocation, SwitchEntry, SW_NOEVAL};
use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::perms::Perms;
use crate::world::World;

const POSE_NOSPACE: u32 = 1;
const EMIT_HERE: u32 = 1;
const EMIT_ROOM: u32 = 2;
const PEMIT_CONTENTS: u32 = 1;
const PEMIT_LIST: u32 = 2;

const POSE_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("default", 1, 0),
    SwitchEntry::new("nospace", 1, POSE_NOSPACE),
    SwitchEntry::new("noeval", 3, SW_NOEVAL).multiple(),
];

const EMIT_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("here", 1, EMIT_HERE).multiple(),
    SwitchEntry::new("room", 1, EMIT_ROOM).multiple(),
    SwitchEntry::new("noeval", 1, SW_NOEVAL).multiple(),
];

const PEMIT_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("contents", 1, PEMIT_CONTENTS).multiple(),
    SwitchEntry::new("list", 1, PEMIT_LIST).multiple(),
    SwitchEntry::new("noeval", 1, SW_NOEVAL).multiple(),
];

impl<W: World> Engine<W> {
    pub(super) fn speech_commands() -> Vec<CommandEntry<W>> {
        use CommandHandler::*;
        vec![
            CommandEntry::new("say", CallSeq::INTERP, OneArg(Self::do_say)).perms(Perms::NEED_LOCATION),
            CommandEntry::new("pose", CallSeq::INTERP, OneArg(Self::do_pose))
                .switches(POSE_SWITCHES)
                .perms(Perms::NEED_LOCATION),
            CommandEntry::new("think", CallSeq::INTERP, OneArg(Self::do_think)),
            CommandEntry::new("@emit", CallSeq::INTERP, OneArg(Self::do_emit))
                .switches(EMIT_SWITCHES)
                .perms(Perms::NEED_LOCATION),
            CommandEntry::new("@pemit", CallSeq::INTERP, TwoArgs(Self::do_pemit)).switches(PEMIT_SWITCHES),
            CommandEntry::new(
                "@npemit",
                CallSeq::NOINTERP | CallSeq::UNPARSE | CallSeq::NOSQUISH,
                TwoArgs(Self::do_pemit),
            )
            .switches(PEMIT_SWITCHES),
            CommandEntry::new("@oemit", CallSeq::INTERP, TwoArgs(Self::do_oemit)).perms(Perms::NEED_LOCATION),
        ]
    }

    pub(super) fn speech_prefixes() -> Vec<(u8, CommandEntry<W>)> {
        use CommandHandler::*;
        vec![
            (b'"', CommandEntry::new("\"", CallSeq::INTERP, OneArg(Self::do_say)).perms(Perms::NEED_LOCATION)),
            (b':', CommandEntry::new(":", CallSeq::INTERP, OneArg(Self::do_pose)).perms(Perms::NEED_LOCATION)),
            (
                b';',
                CommandEntry::new(";", CallSeq::INTERP, OneArg(Self::do_pose))
                    .perms(Perms::NEED_LOCATION)
                    .extra(POSE_NOSPACE),
            ),
            (b'\\', CommandEntry::new("\\", CallSeq::INTERP, OneArg(Self::do_emit)).perms(Perms::NEED_LOCATION)),
        ]
    }

    /// Tell everything in `room` except `skip`
    pub(crate) fn notify_contents(&mut self, room: Dbref, skip: Dbref, message: &str) {
        if !self.world.is_valid(room) {
            return;
        }
        for obj in self.world.contents(room) {
            if obj != skip {
                self.world.notify(obj, message);
            }
        }
    }

    /// The room at the top of `obj`'s chain of locations
    fn enclosing_room(&self, obj: Dbref) -> Dbref {
        let mut current = self.world.location(obj);
        for _ in 0..self.config.limits.parent_nesting {
            if !self.world.is_valid(current) || self.world.is_room(current) {
                break;
            }
            current = self.world.location(current);
        }
        current
    }

    fn do_say(&mut self, inv: &Invocation<'_>, message: &str) {
        let speaker = inv.executor;
        let name = self.world.name(speaker);
        let loc = self.world.location(speaker);
        self.world.notify(speaker, &format!("You say \"{}\"", message));
        self.notify_contents(loc, speaker, &format!("{} says \"{}\"", name, message));
    }

    fn do_pose(&mut self, inv: &Invocation<'_>, message: &str) {
        let actor = inv.executor;
        let name = self.world.name(actor);
        let text = if inv.has(POSE_NOSPACE) {
            format!("{}{}", name, message)
        } else {
            format!("{} {}", name, message)
        };
        let loc = self.world.location(actor);
        if self.world.is_valid(loc) {
            self.notify_contents(loc, Dbref::NOTHING, &text);
        } else {
            self.world.notify(actor, &text);
        }
    }

    fn do_think(&mut self, inv: &Invocation<'_>, message: &str) {
        self.world.notify(inv.executor, message);
    }

    fn do_emit(&mut self, inv: &Invocation<'_>, message: &str) {
        let room = if inv.has(EMIT_ROOM) {
            self.enclosing_room(inv.executor)
        } else {
            self.world.location(inv.executor)
        };
        if self.world.is_valid(room) {
            self.notify_contents(room, Dbref::NOTHING, message);
        } else {
            self.world.notify(inv.executor, message);
        }
    }

    /// Anyone may reach things nearby or under their control; the rest
    /// depends on configuration
    fn may_pemit(&self, executor: Dbref, target: Dbref) -> bool {
        let dispatch = &self.config.dispatch;
        dispatch.pemit_any
            || self.world.is_wizard(executor)
            || self.world.nearby(executor, target)
            || self.world.controls(executor, target)
            || (dispatch.pemit_players && self.world.is_player(target))
    }

    fn do_pemit(&mut self, inv: &Invocation<'_>, target: &str, message: &str) {
        let executor = inv.executor;
        let names: Vec<&str> = if inv.has(PEMIT_LIST) {
            target.split_whitespace().collect()
        } else {
            vec![target]
        };
        for name in names {
            let Some(obj) = self.match_or_notify(executor, name) else {
                continue;
            };
            if !self.may_pemit(executor, obj) {
                self.world.notify(executor, "You are too far away to do that.");
                continue;
            }
            self.world.notify(obj, message);
            if inv.has(PEMIT_CONTENTS) {
                self.notify_contents(obj, Dbref::NOTHING, message);
            }
        }
    }

    /// Everyone in `target`'s location hears the message except `target`
    fn do_oemit(&mut self, inv: &Invocation<'_>, target: &str, message: &str) {
        let executor = inv.executor;
        let Some(obj) = self.match_or_notify(executor, target) else {
            return;
        };
        if !self.may_pemit(executor, obj) {
            self.world.notify(executor, "You are too far away to do that.");
            return;
        }
        let loc = self.world.location(obj);
        self.notify_contents(loc, obj, message);
    }
}
