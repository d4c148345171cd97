//! @function, @addcommand, @delcommand, @hook and @icmd

use crate::command::hooks::HookMask;
use crate::command::invoke::split_dollar;
use crate::command::{CallSeq, CommandEntry, CommandHandler, Invocation, SoftBinding, SwitchEntry, NOPERM};
use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::functions::{FunctionError, UserFunction};
use crate::perms::Perms;
use crate::world::{attrs, AttrFlags, AttrNum, ObjectFlags, World};

const FN_PRIVILEGED: u32 = 1;
const FN_PRESERVE: u32 = 2;
const FN_DELETE: u32 = 4;
const FN_LIST: u32 = 8;

const FUNCTION_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("privileged", 3, FN_PRIVILEGED).multiple(),
    SwitchEntry::new("preserve", 3, FN_PRESERVE).multiple(),
    SwitchEntry::new("delete", 1, FN_DELETE),
    SwitchEntry::new("list", 1, FN_LIST),
];

/// Hook switches share their bits with [`HookMask`]
const HOOK_CLEAR: u32 = 1 << 6;

const HOOK_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("before", 1, HookMask::BEFORE.0).multiple(),
    SwitchEntry::new("after", 1, HookMask::AFTER.0).multiple(),
    SwitchEntry::new("ignore", 2, HookMask::IGNORE.0).multiple(),
    SwitchEntry::new("igswitch", 2, HookMask::IGSWITCH.0).multiple(),
    SwitchEntry::new("permit", 1, HookMask::PERMIT.0).multiple(),
    SwitchEntry::new("fail", 1, HookMask::AFAIL.0).multiple(),
    SwitchEntry::new("clear", 1, HOOK_CLEAR).multiple(),
];

const ICMD_DISABLE: u32 = 1;
const ICMD_IGNORE: u32 = 2;
const ICMD_CLEAR: u32 = 4;
const ICMD_CHECK: u32 = 8;

const ICMD_SWITCHES: &[SwitchEntry] = &[
    SwitchEntry::new("disable", 1, ICMD_DISABLE),
    SwitchEntry::new("ignore", 1, ICMD_IGNORE),
    SwitchEntry::new("clear", 2, ICMD_CLEAR),
    SwitchEntry::new("check", 2, ICMD_CHECK),
];

impl<W: World> Engine<W> {
    pub(super) fn admin_commands() -> Vec<CommandEntry<W>> {
        use CommandHandler::*;
        vec![
            CommandEntry::new("@function", CallSeq::NONE, TwoArgs(Self::do_function))
                .switches(FUNCTION_SWITCHES)
                .perms(Perms::GOD),
            CommandEntry::new("@addcommand", CallSeq::NONE, TwoArgs(Self::do_addcommand)).perms(Perms::GOD),
            CommandEntry::new("@delcommand", CallSeq::NONE, TwoArgs(Self::do_delcommand)).perms(Perms::GOD),
            CommandEntry::new("@hook", CallSeq::NONE, OneArg(Self::do_hook))
                .switches(HOOK_SWITCHES)
                .perms(Perms::GOD),
            CommandEntry::new("@icmd", CallSeq::NONE, TwoArgs(Self::do_icmd))
                .switches(ICMD_SWITCHES)
                .perms(Perms::WIZARD),
        ]
    }

    /// Resolve `obj/attr` for an admin verb, telling the executor what went wrong
    fn object_attr(&mut self, executor: Dbref, spec: &str) -> Option<(Dbref, AttrNum)> {
        let Some((obj_name, attr_name)) = spec.split_once('/') else {
            self.world.notify(executor, "No match.");
            return None;
        };
        let obj = self.match_or_notify(executor, obj_name)?;
        match self.world.attr_number(attr_name.trim()) {
            Some(attr) => Some((obj, attr)),
            None => {
                self.world.notify(executor, "No such attribute.");
                None
            }
        }
    }

    fn do_function(&mut self, inv: &Invocation<'_>, name: &str, target: &str) {
        let executor = inv.executor;
        if inv.has(FN_LIST) {
            self.list_functions(executor);
            return;
        }
        let fname = name.trim().to_ascii_lowercase();
        if inv.has(FN_DELETE) {
            let message = match self.functions.undefine(&fname) {
                Ok(_) => "Function deleted.".to_string(),
                Err(e) => e.to_string(),
            };
            self.world.notify(executor, &message);
            return;
        }
        if fname.is_empty() {
            self.world.notify(executor, "Function name required.");
            return;
        }
        if self.functions.builtin(&fname).is_some() {
            self.world.notify(executor, &FunctionError::Builtin.to_string());
            return;
        }
        let Some((object, attr)) = self.object_attr(executor, target) else {
            return;
        };
        if !self.world.controls(executor, object) || !self.world.can_read_attr(executor, object, attr) {
            self.world.notify(executor, NOPERM);
            return;
        }
        let ufun = UserFunction {
            name: fname.clone(),
            object,
            attr,
            privileged: inv.has(FN_PRIVILEGED),
            preserve: inv.has(FN_PRESERVE),
            perms: Perms::PUBLIC,
        };
        let message = match self.functions.define(ufun) {
            Ok(true) => format!("Function {} updated.", fname.to_ascii_uppercase()),
            Ok(false) => format!("Function {} defined.", fname.to_ascii_uppercase()),
            Err(e) => e.to_string(),
        };
        self.world.notify(executor, &message);
    }

    fn list_functions(&mut self, executor: Dbref) {
        let lines: Vec<String> = self
            .functions
            .user_functions()
            .into_iter()
            .map(|ufun| {
                let attr = self
                    .world
                    .attr_name(ufun.attr)
                    .unwrap_or_else(|| ufun.attr.to_string());
                let mut flags = Vec::new();
                if ufun.privileged {
                    flags.push("privileged");
                }
                if ufun.preserve {
                    flags.push("preserve");
                }
                format!("{:<16} {}/{} {}", ufun.name.to_ascii_uppercase(), ufun.object, attr, flags.join(" "))
                    .trim_end()
                    .to_string()
            })
            .collect();
        if lines.is_empty() {
            self.world.notify(executor, "No user-defined functions.");
        }
        for line in lines {
            self.world.notify(executor, &line);
        }
    }

    /// Shadowed built-ins are kept under this name
    fn shadow_name(name: &str) -> String {
        format!("__{}", name)
    }

    fn do_addcommand(&mut self, inv: &Invocation<'_>, name: &str, target: &str) {
        let executor = inv.executor;
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() || name.contains(char::is_whitespace) || name.starts_with("__") {
            self.world.notify(executor, "That is not a valid command name.");
            return;
        }
        let Some((thing, attr)) = self.object_attr(executor, target) else {
            return;
        };
        if split_dollar(&self.world.atr_text(thing, attr)).is_none() {
            self.world.notify(executor, "Attribute must be a $-command.");
            return;
        }
        let binding = SoftBinding { thing, attr };
        let existing = self.commands.lookup(&name).map(|e| (e.is_soft(), e.bindings.contains(&binding)));
        match existing {
            Some((true, true)) => {
                self.world.notify(executor, &format!("Command {} already added.", name));
                return;
            }
            Some((false, _)) => {
                if let Err(e) = self.commands.rename(&name, &Self::shadow_name(&name)) {
                    self.world.notify(executor, &e.to_string());
                    return;
                }
            }
            _ => {}
        }
        self.commands.soft_entry(&name).bindings.push(binding);
        self.world.notify(executor, &format!("Command {} added.", name));
    }

    fn do_delcommand(&mut self, inv: &Invocation<'_>, name: &str, target: &str) {
        let executor = inv.executor;
        let name = name.trim().to_ascii_lowercase();
        if !self.commands.lookup(&name).is_some_and(|e| e.is_soft()) {
            self.world.notify(executor, "Command not found in command table.");
            return;
        }
        let remaining = if target.trim().is_empty() {
            0
        } else {
            let Some((thing, attr)) = self.object_attr(executor, target) else {
                return;
            };
            let binding = SoftBinding { thing, attr };
            let Some(entry) = self.commands.entry_mut(&name) else {
                return;
            };
            let before = entry.bindings.len();
            entry.bindings.retain(|b| *b != binding);
            if entry.bindings.len() == before {
                self.world.notify(executor, "Command binding not found.");
                return;
            }
            entry.bindings.len()
        };
        if remaining > 0 {
            self.world.notify(executor, &format!("Command {} binding deleted.", name));
            return;
        }
        if let Some(entry) = self.commands.entry_mut(&name) {
            entry.bindings.clear();
        }
        self.commands.remove_name(&name);
        let shadow = Self::shadow_name(&name);
        if self.commands.lookup(&shadow).is_some() {
            if let Err(e) = self.commands.rename(&shadow, &name) {
                self.world.notify(executor, &e.to_string());
            }
        }
        self.world.notify(executor, &format!("Command {} deleted.", name));
    }

    /// `@hook/before/after cmd` sets hooks, `/clear` removes them, no switch lists them
    fn do_hook(&mut self, inv: &Invocation<'_>, target: &str) {
        let executor = inv.executor;
        let Some(entry) = self.commands.entry_mut(target.trim()) else {
            self.world.notify(executor, "Command not found.");
            return;
        };
        let mask = HookMask(inv.key & !HOOK_CLEAR);
        if inv.has(HOOK_CLEAR) {
            if mask == HookMask::NONE {
                entry.hooks = HookMask::NONE;
            } else {
                entry.hooks.remove(mask);
            }
        } else {
            entry.hooks.insert(mask);
        }
        let message = format!("Hooks for {}: {}", entry.name, entry.hooks.describe());
        self.world.notify(executor, &message);
    }

    /// `@icmd/disable obj=cmd`, `/ignore`, `/clear obj`, `/check obj`
    fn do_icmd(&mut self, inv: &Invocation<'_>, target: &str, command: &str) {
        let executor = inv.executor;
        let Some(obj) = self.match_or_notify(executor, target) else {
            return;
        };
        let name = self.world.name(obj);
        let current = self.world.atr_text(obj, attrs::CMDCHECK);

        if inv.has(ICMD_CLEAR) {
            self.world.atr_clear(obj, attrs::CMDCHECK);
            self.world.set_flag(obj, ObjectFlags::CMDCHECK, false);
            self.world.notify(executor, &format!("Command restrictions cleared for {}.", name));
            return;
        }
        if !inv.has(ICMD_DISABLE | ICMD_IGNORE) {
            let message = if current.is_empty() {
                format!("No commands restricted for {}.", name)
            } else {
                format!("{}: {}", name, current)
            };
            self.world.notify(executor, &message);
            return;
        }

        let cmd = command.trim().to_ascii_lowercase();
        if cmd.is_empty() {
            self.world.notify(executor, "No command given.");
            return;
        }
        let (code, verb) = if inv.has(ICMD_DISABLE) { ("1", "disabled") } else { ("2", "ignored") };
        let mut tokens: Vec<&str> = current
            .split_whitespace()
            .filter(|t| t.split_once(':').map_or(true, |(_, n)| !n.eq_ignore_ascii_case(&cmd)))
            .collect();
        let token = format!("{}:{}", code, cmd);
        tokens.push(&token);
        let owner = self.world.owner(executor);
        self.world
            .atr_add(obj, attrs::CMDCHECK, &tokens.join(" "), owner, AttrFlags::NONE);
        self.world.set_flag(obj, ObjectFlags::CMDCHECK, true);
        self.world.notify(executor, &format!("Command {} {} for {}.", cmd, verb, name));
    }
}
