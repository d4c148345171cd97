//! Resolving a typed line to something that runs it

use tracing::{info, warn};

use crate::dbref::Dbref;
use crate::eval::{Engine, EvalFlags, Frame};
use crate::matcher::exit_name_matches;
use crate::perms::{self, check_access, Perms};
use crate::world::{attrs, ObjectFlags, ObjectType, World};

use super::hooks::{Gate, HookMask};
use super::switches::parse_switches;
use super::{CallSeq, Invocation, NOPERM};

pub(crate) const HUH: &str = "Huh?  (Type \"help\" for help.)";

/// Which stage handled a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The executor may not run commands
    Rejected,
    Empty,
    Prefix,
    Channel,
    Home,
    Exit,
    Builtin,
    /// An enter or leave alias
    Alias,
    /// One or more `$`-commands were queued
    Dollar,
    Huh,
}

/// Collapse runs of spaces and drop trailing ones
fn squish(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(' ').filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Split `line` into its first word and the rest
fn first_word(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (line, ""),
    }
}

impl<W: World> Engine<W> {
    /// Run one line typed (or queued) for `executor`. `args` become `%0`-`%9`
    /// for anything the line evaluates.
    pub fn process_command(
        &mut self,
        executor: Dbref,
        caller: Dbref,
        enactor: Dbref,
        interactive: bool,
        command: &str,
        args: &[String],
    ) -> Dispatch {
        if !self.world.is_valid(executor) {
            warn!(executor = %executor, command, "command from invalid object");
            return Dispatch::Rejected;
        }
        let flags = self.world.flags(executor);
        let halted = flags.contains(ObjectFlags::HALTED)
            && !(interactive && self.world.is_player(executor));
        if flags.contains(ObjectFlags::GOING) || halted {
            let owner = self.world.owner(executor);
            self.world
                .notify(owner, &format!("Attempt to execute command by halted object {}", executor));
            warn!(executor = %executor, command, "command from halted or going object");
            return Dispatch::Rejected;
        }

        self.reset_counters();
        self.alarm.arm(self.config.limits.cpu_time_ms);
        self.state.curr_cmd = command.to_string();

        let inv = Invocation { executor, caller, enactor, key: 0, interactive, command };
        let outcome = self.dispatch(&inv, args);

        if self.alarm.disarm() {
            warn!(player = %executor, command, "command exceeded its CPU budget");
        }
        if self.state.stack_limit_reached {
            warn!(player = %executor, command, "command hit the stack limit");
        }
        outcome
    }

    fn dispatch(&mut self, inv: &Invocation<'_>, args: &[String]) -> Dispatch {
        let executor = inv.executor;
        let raw = inv.command.trim_start();
        let line = if self.config.parser.space_compress { squish(raw) } else { raw.trim_end().to_string() };
        if line.is_empty() {
            return Dispatch::Empty;
        }

        if let Some(entry) = self.commands.lookup_prefix(line.as_bytes()[0]).cloned() {
            if self.gate(&entry, executor, inv.enactor) == Gate::Normal {
                let text = if entry.callseq.contains(CallSeq::NOSQUISH) { &raw[1..] } else { &line[1..] };
                self.process_cmdent(&entry, None, inv, text, args);
            }
            return Dispatch::Prefix;
        }

        if self.world.channel_intercept(executor, &line) {
            return Dispatch::Channel;
        }

        if line.eq_ignore_ascii_case("home") && self.world.has_location(executor) {
            match self.cmdtest(executor, "home") {
                Gate::Disabled => {
                    self.world.notify(executor, NOPERM);
                    return Dispatch::Home;
                }
                Gate::Ignored => {}
                Gate::Normal => {
                    self.go_home(executor);
                    return Dispatch::Home;
                }
            }
        }

        if let Some(outcome) = self.try_exits(inv, &line) {
            return outcome;
        }

        let (word, rest) = first_word(&line);
        let lower = word.to_ascii_lowercase();
        let (name, switches) = match lower.split_once('/') {
            Some((name, switches)) => (name, Some(switches)),
            None => (lower.as_str(), None),
        };
        if let Some(entry) = self.commands.lookup(name).cloned() {
            match self.gate(&entry, executor, inv.enactor) {
                Gate::Disabled => return Dispatch::Builtin,
                Gate::Ignored => {}
                Gate::Normal => {
                    let bad_switch = entry.hooks.contains(HookMask::IGSWITCH)
                        && !entry.is_soft()
                        && switches.is_some_and(|sw| parse_switches(&self.world, executor, &entry, sw).is_err());
                    if !bad_switch {
                        let arg = if entry.callseq.contains(CallSeq::NOSQUISH) {
                            first_word(raw).1.trim_start()
                        } else {
                            rest
                        };
                        self.process_cmdent(&entry, switches, inv, arg, args);
                        return Dispatch::Builtin;
                    }
                }
            }
        }

        let frame = Frame::new(executor, inv.caller, inv.enactor, args);
        let evaluated = self.eval(
            &line,
            &frame,
            EvalFlags::EVAL | EvalFlags::FCHECK | EvalFlags::STRIP_CURLY | EvalFlags::TOP,
        );
        self.match_dollar_commands(inv, &evaluated, &line)
    }

    /// Exits where the executor stands, then in the master room
    fn try_exits(&mut self, inv: &Invocation<'_>, line: &str) -> Option<Dispatch> {
        let executor = inv.executor;
        let goto = self.commands.lookup("goto").cloned()?;
        if !check_access(&self.world, executor, goto.perms) {
            return None;
        }
        let state = self.gate_state(&goto, executor, inv.enactor);
        if state == Gate::Ignored {
            return None;
        }
        let exit = self.match_exit(executor, line).or_else(|| {
            let master = self.config.dispatch.master_room;
            self.match_exit_in(master, line)
        })?;
        if state == Gate::Disabled {
            self.deny(&goto, executor, inv.enactor);
            return Some(Dispatch::Exit);
        }
        if goto.hooks.contains(HookMask::BEFORE) {
            self.run_hook("B_", &goto, executor, inv.enactor);
        }
        self.move_through(executor, exit);
        if goto.hooks.contains(HookMask::AFTER) {
            self.run_hook("A_", &goto, executor, inv.enactor);
        }
        Some(Dispatch::Exit)
    }

    pub(crate) fn go_home(&mut self, executor: Dbref) {
        let restrict = self.config.dispatch.restrict_home.clone();
        let allowed = match perms::apply_names(Perms::PUBLIC, &restrict) {
            Ok(mask) => check_access(&self.world, executor, mask),
            Err(word) => {
                warn!(name = %word, "restrict_home names an unknown permission");
                true
            }
        };
        if !allowed || self.world.has_flag(executor, ObjectFlags::FIXED) {
            self.world.notify(executor, NOPERM);
            return;
        }
        self.world.notify(executor, "There's no place like home...");
        self.world.move_home(executor);
    }

    /// `$`-commands and enter/leave aliases, nearest objects first
    fn match_dollar_commands(&mut self, inv: &Invocation<'_>, evaluated: &str, raw: &str) -> Dispatch {
        let executor = inv.executor;
        let dispatch = self.config.dispatch.clone();
        let loc = self.world.location(executor);
        let has_loc = self.world.has_location(executor) && self.world.is_valid(loc);
        let mut matched = false;

        if dispatch.match_mine && (!self.world.is_player(executor) || dispatch.match_mine_players) {
            matched |= self.atr_match(executor, executor, evaluated, raw);
        }

        if has_loc {
            let leave = self.world.atr_text(loc, attrs::LALIAS);
            if !self.world.is_room(loc) && exit_name_matches(&leave, evaluated) {
                self.world.move_out(executor);
                return Dispatch::Alias;
            }
            for thing in self.world.contents(loc) {
                if thing == executor {
                    continue;
                }
                let enter = self.world.atr_text(thing, attrs::EALIAS);
                if exit_name_matches(&enter, evaluated) {
                    self.enter_object(executor, thing);
                    return Dispatch::Alias;
                }
            }
            matched |= self.list_match(loc, executor, evaluated, raw);
            matched |= self.atr_match(loc, executor, evaluated, raw);
        }

        if self.world.has_contents(executor) {
            matched |= self.list_match(executor, executor, evaluated, raw);
        }

        if !matched && dispatch.have_zones {
            let zone = if has_loc { self.world.zone(loc) } else { Dbref::NOTHING };
            matched |= self.zone_match(zone, loc, executor, evaluated, raw);
            let own_zone = self.world.zone(executor);
            if !matched && own_zone != zone {
                matched |= self.zone_match(own_zone, loc, executor, evaluated, raw);
            }
        }

        let master = dispatch.master_room;
        if !matched && self.world.is_valid(master) {
            matched |= self.list_match(master, executor, evaluated, raw);
            if !matched {
                matched |= self.atr_match(master, executor, evaluated, raw);
            }
        }

        if matched {
            return Dispatch::Dollar;
        }
        self.huh(inv, raw.to_string(), dispatch.global_error_object, dispatch.log_bad_commands);
        Dispatch::Huh
    }

    /// A zone room offers the commands of its contents; any other zone
    /// object offers its own
    fn zone_match(&mut self, zone: Dbref, loc: Dbref, executor: Dbref, evaluated: &str, raw: &str) -> bool {
        if !self.world.is_valid(zone) {
            return false;
        }
        if self.world.object_type(zone) == Some(ObjectType::Room) {
            zone != loc && self.list_match(zone, executor, evaluated, raw)
        } else {
            self.atr_match(zone, executor, evaluated, raw)
        }
    }

    fn huh(&mut self, inv: &Invocation<'_>, line: String, error_obj: Dbref, log: bool) {
        let executor = inv.executor;
        if log {
            info!(target: "bad_command", player = %executor, location = %self.world.location(executor), command = inv.command, "Huh?");
        }
        let message = if self.world.is_valid(error_obj) {
            let body = self.world.atr_text(error_obj, attrs::VA);
            let args = [line];
            let frame = Frame::new(error_obj, executor, executor, &args);
            self.eval(&body, &frame, EvalFlags::EVAL | EvalFlags::FCHECK | EvalFlags::STRIP_CURLY | EvalFlags::TOP)
        } else {
            HUH.to_string()
        };
        self.world.notify(executor, &message);
    }
}
