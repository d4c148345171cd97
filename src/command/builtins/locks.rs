//! @lock, @unlock and `&attr obj=value`

use crate::command::{CallSeq, CommandEntry, CommandHandler, Invocation, SwitchEntry, NOPERM};
use crate::eval::Engine;
use crate::perms::Perms;
use crate::world::{attrs, AttrFlags, AttrNum, World};

const LOCK_DEFAULT: u32 = 1;
const LOCK_ENTER: u32 = 2;
const LOCK_USE: u32 = 4;

const LOCK_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("default", 1, LOCK_DEFAULT),
    SwitchEntry::new("enter", 1, LOCK_ENTER),
    SwitchEntry::new("use", 1, LOCK_USE),
];

fn lock_attr(key: u32) -> AttrNum {
    if key & LOCK_ENTER != 0 {
        attrs::LENTER
    } else if key & LOCK_USE != 0 {
        attrs::LUSE
    } else {
        attrs::LOCK
    }
}

impl<W: World> Engine<W> {
    pub(super) fn lock_commands() -> Vec<CommandEntry<W>> {
        use CommandHandler::*;
        vec![
            CommandEntry::new("@lock", CallSeq::INTERP, TwoArgs(Self::do_lock))
                .switches(LOCK_SWITCHES)
                .perms(Perms::NO_SLAVE),
            CommandEntry::new("@unlock", CallSeq::INTERP, OneArg(Self::do_unlock))
                .switches(LOCK_SWITCHES)
                .perms(Perms::NO_SLAVE),
        ]
    }

    pub(super) fn lock_prefixes() -> Vec<(u8, CommandEntry<W>)> {
        vec![(
            b'&',
            CommandEntry::new("&", CallSeq::NONE, CommandHandler::TwoArgs(Self::do_set_attr))
                .perms(Perms::NO_SLAVE | Perms::NO_GUEST),
        )]
    }

    fn do_lock(&mut self, inv: &Invocation<'_>, target: &str, key: &str) {
        let executor = inv.executor;
        let Some(obj) = self.match_or_notify(executor, target) else {
            return;
        };
        if !self.world.controls(executor, obj) {
            self.world.notify(executor, NOPERM);
            return;
        }
        match self.parse_lock(executor, key) {
            Ok(lock) => {
                let owner = self.world.owner(executor);
                self.world
                    .atr_add(obj, lock_attr(inv.key), &lock.to_storage(), owner, AttrFlags::NONE);
                self.world.notify(executor, "Locked.");
            }
            Err(e) => self.world.notify(executor, &e.to_string()),
        }
    }

    fn do_unlock(&mut self, inv: &Invocation<'_>, target: &str) {
        let executor = inv.executor;
        let Some(obj) = self.match_or_notify(executor, target) else {
            return;
        };
        if !self.world.controls(executor, obj) {
            self.world.notify(executor, NOPERM);
            return;
        }
        self.world.atr_clear(obj, lock_attr(inv.key));
        self.world.notify(executor, "Unlocked.");
    }

    /// `&ATTR obj=value`; an empty value clears the attribute
    fn do_set_attr(&mut self, inv: &Invocation<'_>, spec: &str, value: &str) {
        let executor = inv.executor;
        let Some((name, target)) = spec.trim().split_once(' ') else {
            self.world.notify(executor, "Set what on what?");
            return;
        };
        let name = name.to_ascii_uppercase();
        if !attrs::is_valid_name(&name) {
            self.world.notify(executor, "That's not a good name for an attribute.");
            return;
        }
        let Some(obj) = self.match_or_notify(executor, target) else {
            return;
        };
        if !self.world.controls(executor, obj) {
            self.world.notify(executor, NOPERM);
            return;
        }
        let attr = self.world.attr_define(&name);
        if value.is_empty() {
            self.world.atr_clear(obj, attr);
            self.world.notify(executor, "Cleared.");
        } else {
            let owner = self.world.owner(executor);
            self.world.atr_add(obj, attr, value, owner, AttrFlags::NONE);
            self.world.notify(executor, "Set.");
        }
    }
}
