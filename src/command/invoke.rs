//! Running a resolved verb

use crate::eval::{Engine, EvalFlags, Frame, MAX_ARGS};
use crate::perms::{check_access, Perms};
use crate::wild::{regex_captures, wild_captures};
use crate::world::{attrs, AttrFlags, QueuedCommand, World};

use super::dispatch::HUH;
use super::hooks::HookMask;
use super::switches::{parse_switches, SW_GOT_UNIQUE, SW_NOEVAL};
use super::{CallSeq, CommandEntry, CommandHandler, Invocation};

/// Strip the `$pattern:` header from a command attribute. The pattern ends
/// at the first `:` not escaped with a backslash.
pub(crate) fn split_dollar(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('$')?;
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b':' => return Some((&body[..i], &body[i + 1..])),
            _ => i += 1,
        }
    }
    None
}

impl<W: World> Engine<W> {
    /// Check, evaluate arguments for and run `entry`. `arg` is everything
    /// after the verb; `cargs` are the caller's `%0`-`%9`.
    pub fn process_cmdent(
        &mut self,
        entry: &CommandEntry<W>,
        switches: Option<&str>,
        inv: &Invocation<'_>,
        arg: &str,
        cargs: &[String],
    ) {
        let executor = inv.executor;
        let world = &self.world;
        let wrong_type = (entry.perms.contains(Perms::NEED_LOCATION) && !world.has_location(executor))
            || (entry.perms.contains(Perms::NEED_CONTENTS) && !world.has_contents(executor))
            || (entry.perms.contains(Perms::NEED_PLAYER) && !world.is_player(executor));
        if wrong_type {
            self.world.notify(executor, "Command incompatible with executor type.");
            return;
        }
        if !check_access(&self.world, executor, entry.perms) {
            self.deny(entry, executor, inv.enactor);
            return;
        }
        if !self.world.is_wizard(executor) {
            if entry.perms.contains(Perms::GBL_BUILD) && !self.config.dispatch.building_allowed {
                self.world.notify(executor, "Sorry, building is not allowed now.");
                return;
            }
            if entry.perms.contains(Perms::GBL_INTERP) && !self.config.dispatch.queueing_allowed {
                self.world.notify(executor, "Sorry, queueing and triggering are not allowed now.");
                return;
            }
        }

        if entry.hooks.contains(HookMask::BEFORE) {
            self.run_hook("B_", entry, executor, inv.enactor);
        }

        if entry.is_soft() {
            for request in self.soft_requests(entry, switches, inv, arg) {
                self.world.enqueue(request);
            }
        } else {
            let key = match switches {
                Some(text) => parse_switches(&self.world, executor, entry, text),
                None => Ok(entry.extra & !SW_GOT_UNIQUE),
            };
            match key {
                Ok(key) => {
                    let inv = Invocation { key: key & !SW_NOEVAL, ..*inv };
                    self.call_handler(entry, &inv, key & SW_NOEVAL != 0, arg, cargs);
                }
                Err(e) => {
                    self.world.notify(executor, &e.to_string());
                    return;
                }
            }
        }

        if entry.hooks.contains(HookMask::AFTER) {
            self.run_hook("A_", entry, executor, inv.enactor);
        }
    }

    /// Interpretation for a verb's arguments, strongest rule first
    fn interp_flags(entry: &CommandEntry<W>, interactive: bool, noeval: bool) -> EvalFlags {
        let seq = entry.callseq;
        if noeval {
            EvalFlags::STRIP_CURLY
        } else if seq.contains(CallSeq::INTERP) || !(interactive || seq.contains(CallSeq::NOINTERP)) {
            EvalFlags::EVAL | EvalFlags::STRIP_CURLY
        } else if seq.contains(CallSeq::STRIP) {
            EvalFlags::STRIP_CURLY
        } else if seq.contains(CallSeq::STRIP_AROUND) {
            EvalFlags::STRIP_AROUND
        } else {
            EvalFlags::NONE
        }
    }

    /// Evaluate, or just scan, one argument
    fn command_arg(&mut self, text: &str, interp: EvalFlags, frame: &Frame<'_>, extra: EvalFlags) -> String {
        if interp.contains(EvalFlags::EVAL) {
            self.eval(text, frame, interp | EvalFlags::FCHECK | EvalFlags::TOP)
        } else {
            let mut cursor = Some(text);
            self.scanner()
                .parse_to(&mut cursor, 0, interp | extra | EvalFlags::TOP)
                .unwrap_or_default()
        }
    }

    fn call_handler(&mut self, entry: &CommandEntry<W>, inv: &Invocation<'_>, noeval: bool, arg: &str, cargs: &[String]) {
        let interp = Self::interp_flags(entry, inv.interactive, noeval);
        let frame = Frame::new(inv.executor, inv.caller, inv.enactor, cargs);

        match entry.handler {
            CommandHandler::NoArgs(f) => f(self, inv),
            CommandHandler::OneArg(f) => {
                let a = self.command_arg(arg, interp, &frame, EvalFlags::NONE);
                f(self, inv, &a);
            }
            CommandHandler::OneArgCmdArgs(f) => {
                let a = self.command_arg(arg, interp, &frame, EvalFlags::NONE);
                f(self, inv, &a, cargs);
            }
            CommandHandler::Soft => {}
            handler => {
                let mut cursor = Some(arg);
                let left = self
                    .scanner()
                    .parse_to(&mut cursor, b'=', EvalFlags::STRIP_TS)
                    .unwrap_or_default();
                let right = cursor.unwrap_or("");
                let first = self.eval(
                    &left,
                    &frame,
                    EvalFlags::EVAL | EvalFlags::STRIP_CURLY | EvalFlags::FCHECK | EvalFlags::TOP,
                );

                match handler {
                    CommandHandler::TwoArgsArgv(f) => {
                        let argv = self.command_argv(right, interp, &frame);
                        f(self, inv, &first, &argv);
                    }
                    CommandHandler::TwoArgsArgvCmdArgs(f) => {
                        let argv = self.command_argv(right, interp, &frame);
                        f(self, inv, &first, &argv, cargs);
                    }
                    CommandHandler::TwoArgs(f) => {
                        let second = self.second_arg(entry, right, interp, &frame);
                        f(self, inv, &first, &second);
                    }
                    CommandHandler::TwoArgsCmdArgs(f) => {
                        let second = self.second_arg(entry, right, interp, &frame);
                        f(self, inv, &first, &second, cargs);
                    }
                    _ => {}
                }
            }
        }
    }

    fn command_argv(&mut self, text: &str, interp: EvalFlags, frame: &Frame<'_>) -> Vec<String> {
        let flags = interp | EvalFlags::STRIP_LS | EvalFlags::STRIP_TS;
        self.parse_arglist(text, 0, flags, MAX_ARGS, frame).0
    }

    fn second_arg(&mut self, entry: &CommandEntry<W>, text: &str, interp: EvalFlags, frame: &Frame<'_>) -> String {
        if interp.contains(EvalFlags::EVAL) {
            self.command_arg(text, interp, frame, EvalFlags::NONE)
        } else if entry.callseq.contains(CallSeq::UNPARSE) {
            self.command_arg(text, interp, frame, EvalFlags::NO_COMPRESS)
        } else {
            self.command_arg(text, interp, frame, EvalFlags::STRIP_LS | EvalFlags::STRIP_TS)
        }
    }

    /// Queue entries for every binding of a soft command whose pattern
    /// matches the rebuilt command line
    pub(crate) fn soft_requests(
        &mut self,
        entry: &CommandEntry<W>,
        switches: Option<&str>,
        inv: &Invocation<'_>,
        arg: &str,
    ) -> Vec<QueuedCommand> {
        let executor = inv.executor;
        let line = match switches {
            Some(sw) => format!("{}/{} {}", entry.name, sw, arg),
            None => format!("{} {}", entry.name, arg),
        };
        let line = line.trim_end();
        let mut requests = Vec::new();
        let mut matched = false;

        for binding in &entry.bindings {
            let Some(attr) = self.world.atr_get(binding.thing, binding.attr) else {
                continue;
            };
            let Some((pattern, action)) = split_dollar(&attr.text) else {
                continue;
            };
            let case = attr.flags.contains(AttrFlags::CASE);
            let captures = if attr.flags.contains(AttrFlags::REGEXP) {
                regex_captures(pattern, line, case)
            } else {
                wild_captures(pattern, line, case)
            };
            let Some(captures) = captures else {
                continue;
            };
            matched = true;
            if self.config.dispatch.addcmd_obey_uselocks
                && !self.could_doit(executor, binding.thing, attrs::LUSE)
            {
                self.world.notify(executor, "You can't use that.");
                continue;
            }
            requests.push(QueuedCommand {
                executor: binding.thing,
                caller: executor,
                enactor: executor,
                text: action.to_string(),
                args: captures,
                registers: self.state.registers.clone(),
            });
        }
        if !matched {
            self.world.notify(executor, HUH);
        }
        requests
    }
}
