//! Verbs that queue more commands: @trigger, @force, @switch, @dolist

use crate::command::{CallSeq, CommandEntry, CommandHandler, Invocation, SwitchEntry, NOPERM};
use crate::dbref::Dbref;
use crate::eval::{Engine, EvalFlags, Frame};
use crate::perms::Perms;
use crate::wild::wild_match;
use crate::world::World;

const TRIG_QUIET: u32 = 1;
const SWITCH_ALL: u32 = 1;
const SWITCH_FIRST: u32 = 2;

const TRIGGER_SWITCHES: &[SwitchEntry] = &[SwitchEntry::new("quiet", 1, TRIG_QUIET)];

const SWITCH_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("all", 1, SWITCH_ALL),
    SwitchEntry::new("first", 1, SWITCH_FIRST),
];

impl<W: World> Engine<W> {
    pub(super) fn control_commands() -> Vec<CommandEntry<W>> {
        use CommandHandler::*;
        vec![
            CommandEntry::new("@trigger", CallSeq::NONE, TwoArgsArgv(Self::do_trigger))
                .switches(TRIGGER_SWITCHES)
                .perms(Perms::GBL_INTERP),
            CommandEntry::new("@force", CallSeq::INTERP, TwoArgsCmdArgs(Self::do_force))
                .perms(Perms::NO_SLAVE | Perms::NO_GUEST | Perms::GBL_INTERP),
            CommandEntry::new(
                "@switch",
                CallSeq::NOINTERP | CallSeq::STRIP_AROUND,
                TwoArgsArgvCmdArgs(Self::do_switch),
            )
            .switches(SWITCH_SWITCHES)
            .perms(Perms::GBL_INTERP),
            CommandEntry::new("@dolist", CallSeq::NOINTERP | CallSeq::STRIP_AROUND, TwoArgsCmdArgs(Self::do_dolist))
                .perms(Perms::GBL_INTERP),
        ]
    }

    pub(super) fn control_prefixes() -> Vec<(u8, CommandEntry<W>)> {
        vec![(
            b'#',
            CommandEntry::new("#", CallSeq::INTERP, CommandHandler::OneArgCmdArgs(Self::do_force_prefix))
                .perms(Perms::NO_SLAVE | Perms::NO_GUEST | Perms::GBL_INTERP),
        )]
    }

    /// `@trigger obj/attr=args` queues the attribute as the object
    fn do_trigger(&mut self, inv: &Invocation<'_>, target: &str, argv: &[String]) {
        let executor = inv.executor;
        let Some((obj_name, attr_name)) = target.split_once('/') else {
            self.world.notify(executor, "No match.");
            return;
        };
        let Some(obj) = self.match_or_notify(executor, obj_name) else {
            return;
        };
        let Some(attr) = self.world.attr_number(attr_name.trim()) else {
            self.world.notify(executor, "No match.");
            return;
        };
        if !self.world.controls(executor, obj) {
            self.world.notify(executor, NOPERM);
            return;
        }
        let limit = self.config.limits.parent_nesting;
        if let Some((body, _)) = self.world.atr_pget(obj, attr, limit) {
            self.queue_command(obj, executor, executor, &body.text, argv);
        }
        if !inv.has(TRIG_QUIET) {
            self.world.notify(executor, "Triggered.");
        }
    }

    fn do_force(&mut self, inv: &Invocation<'_>, target: &str, command: &str, cargs: &[String]) {
        let executor = inv.executor;
        let Some(victim) = self.match_or_notify(executor, target) else {
            return;
        };
        if !self.world.controls(executor, victim) {
            self.world.notify(executor, NOPERM);
            return;
        }
        self.queue_command(victim, executor, executor, command, cargs);
    }

    /// `#12 command` forces object #12
    fn do_force_prefix(&mut self, inv: &Invocation<'_>, text: &str, cargs: &[String]) {
        let (number, command) = text.trim_start().split_once(' ').unwrap_or((text.trim(), ""));
        let target = format!("#{}", number);
        if Dbref::parse(&target).is_none() {
            self.world.notify(inv.executor, "I don't see that here.");
            return;
        }
        self.do_force(inv, &target, command, cargs);
    }

    /// `@switch value=pattern,action,...,default`; `#$` in an action is the value
    fn do_switch(&mut self, inv: &Invocation<'_>, value: &str, argv: &[String], cargs: &[String]) {
        let frame = Frame::new(inv.executor, inv.caller, inv.enactor, cargs);
        let first_only = inv.has(SWITCH_FIRST);
        let mut any = false;
        for pair in argv.chunks_exact(2) {
            let pattern = self.eval(&pair[0], &frame, EvalFlags::STANDARD);
            if wild_match(&pattern, value) {
                any = true;
                let action = pair[1].replace("#$", value);
                self.queue_command(inv.executor, inv.caller, inv.enactor, &action, cargs);
                if first_only {
                    break;
                }
            }
        }
        if !any && argv.len() % 2 == 1 {
            if let Some(default) = argv.last() {
                let action = default.replace("#$", value);
                self.queue_command(inv.executor, inv.caller, inv.enactor, &action, cargs);
            }
        }
    }

    /// `@dolist list=action`; `##` is the item and `#@` its position
    fn do_dolist(&mut self, inv: &Invocation<'_>, list: &str, action: &str, cargs: &[String]) {
        for (index, item) in list.split_whitespace().enumerate() {
            let command = action.replace("#@", &(index + 1).to_string()).replace("##", item);
            self.queue_command(inv.executor, inv.caller, inv.enactor, &command, cargs);
        }
    }
}
