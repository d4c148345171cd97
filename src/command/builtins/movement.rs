//! goto, enter and leave

use crate::command::{CallSeq, CommandEntry, CommandHandler, Invocation, NOPERM};
use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::perms::Perms;
use crate::world::{attrs, ObjectFlags, ObjectType, World};

impl<W: World> Engine<W> {
    pub(super) fn movement_commands() -> Vec<CommandEntry<W>> {
        use CommandHandler::*;
        vec![
            CommandEntry::new("goto", CallSeq::NONE, OneArg(Self::do_goto)).perms(Perms::NEED_LOCATION),
            CommandEntry::new("enter", CallSeq::NONE, OneArg(Self::do_enter)).perms(Perms::NEED_LOCATION),
            CommandEntry::new("leave", CallSeq::NONE, NoArgs(Self::do_leave)).perms(Perms::NEED_LOCATION),
        ]
    }

    /// Take `exit` if its lock allows
    pub(crate) fn move_through(&mut self, player: Dbref, exit: Dbref) {
        if self.could_doit(player, exit, attrs::LOCK) {
            self.world.move_via_exit(player, exit);
        } else {
            self.world.notify(player, "You can't go that way.");
        }
    }

    pub(crate) fn enter_object(&mut self, player: Dbref, thing: Dbref) {
        let enterable = matches!(self.world.object_type(thing), Some(ObjectType::Thing | ObjectType::Player));
        if !enterable
            || thing == player
            || !(self.world.has_flag(thing, ObjectFlags::ENTER_OK) || self.world.controls(player, thing))
        {
            self.world.notify(player, NOPERM);
            return;
        }
        if !self.could_doit(player, thing, attrs::LENTER) {
            self.world.notify(player, "You can't enter that.");
            return;
        }
        self.world.move_into(player, thing);
    }

    fn do_goto(&mut self, inv: &Invocation<'_>, direction: &str) {
        let executor = inv.executor;
        if direction.trim().eq_ignore_ascii_case("home") {
            self.go_home(executor);
            return;
        }
        let master = self.config.dispatch.master_room;
        let exit = self
            .match_exit(executor, direction)
            .or_else(|| self.match_exit_in(master, direction));
        match exit {
            Some(exit) => self.move_through(executor, exit),
            None => self.world.notify(executor, "You can't go that way."),
        }
    }

    fn do_enter(&mut self, inv: &Invocation<'_>, what: &str) {
        if let Some(thing) = self.match_or_notify(inv.executor, what) {
            self.enter_object(inv.executor, thing);
        }
    }

    fn do_leave(&mut self, inv: &Invocation<'_>) {
        let executor = inv.executor;
        let loc = self.world.location(executor);
        if !self.world.is_valid(loc) || self.world.is_room(loc) {
            self.world.notify(executor, "You can't leave.");
            return;
        }
        self.world.move_out(executor);
    }
}
