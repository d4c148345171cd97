//! Command hooks and per-object command checks

use crate::dbref::Dbref;
use crate::eval::{Engine, EvalFlags, Frame};
use crate::functions::truthy;
use crate::world::{attrs, bitset, ObjectFlags, World};

use super::{CommandEntry, NOPERM};

bitset! {
    /// Hook attributes consulted around a verb
    HookMask {
        BEFORE = 1 << 0;
        AFTER = 1 << 1;
        /// `I_` false makes the verb fall through as if unknown
        IGNORE = 1 << 2;
        /// `P_` false denies the verb
        PERMIT = 1 << 3;
        /// Bad switches fall through instead of erroring
        IGSWITCH = 1 << 4;
        /// `AF_` replaces the generic denial message
        AFAIL = 1 << 5;
    }
}

const HOOK_NAMES: &[(&str, HookMask)] = &[
    ("before", HookMask::BEFORE),
    ("after", HookMask::AFTER),
    ("ignore", HookMask::IGNORE),
    ("permit", HookMask::PERMIT),
    ("igswitch", HookMask::IGSWITCH),
    ("fail", HookMask::AFAIL),
];

impl HookMask {
    pub fn describe(self) -> String {
        let names: Vec<&str> = HOOK_NAMES
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(" ")
        }
    }
}

/// Outcome of the command-check and hook gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    Normal,
    /// Denied; the player has already been told
    Disabled,
    /// Treat the verb as unknown
    Ignored,
}

/// Hook attribute stem for a verb: `@pemit` hooks live in `B_PEMIT` etc.
pub(crate) fn hook_stem(name: &str) -> String {
    match name {
        "\"" => "SAY".to_string(),
        ":" => "POSE".to_string(),
        ";" => "SEMIPOSE".to_string(),
        "\\" => "EMIT".to_string(),
        "#" => "FORCE".to_string(),
        "&" => "SET".to_string(),
        other => other.trim_start_matches('@').to_ascii_uppercase(),
    }
}

/// CMDCHECK text holds `1:name` (disabled) and `2:name` (ignored) tokens
pub(crate) fn cmdcheck_state(text: &str, command: &str) -> Gate {
    for token in text.split_whitespace() {
        let Some((code, name)) = token.split_once(':') else {
            continue;
        };
        if !name.eq_ignore_ascii_case(command) {
            continue;
        }
        match code {
            "1" => return Gate::Disabled,
            "2" => return Gate::Ignored,
            _ => {}
        }
    }
    Gate::Normal
}

impl<W: World> Engine<W> {
    /// Evaluate the `prefix` hook attribute for `entry`, if the hook object
    /// has one. Returns the result text.
    pub(crate) fn run_hook(
        &mut self,
        prefix: &str,
        entry: &CommandEntry<W>,
        executor: Dbref,
        enactor: Dbref,
    ) -> Option<String> {
        let hook_obj = self.config.dispatch.hook_object;
        if !self.world.is_valid(hook_obj) {
            return None;
        }
        let attr = self
            .world
            .attr_number(&format!("{}{}", prefix, hook_stem(&entry.name)))?;
        let body = self.world.atr_text(hook_obj, attr);
        if body.is_empty() {
            return None;
        }
        self.state.stack_nest += 1;
        let frame = Frame::new(hook_obj, executor, enactor, &[]);
        let result = self.preserving_registers(|engine| {
            engine.eval(&body, &frame, EvalFlags::STANDARD)
        });
        self.state.stack_nest -= 1;
        Some(result)
    }

    /// A permit-style hook passes when missing or when it evaluates true
    fn hook_allows(&mut self, prefix: &str, entry: &CommandEntry<W>, executor: Dbref, enactor: Dbref) -> bool {
        self.run_hook(prefix, entry, executor, enactor)
            .map_or(true, |result| truthy(&result))
    }

    /// Tell `executor` they may not use `entry`, through the fail hook when
    /// there is one
    pub(crate) fn deny(&mut self, entry: &CommandEntry<W>, executor: Dbref, enactor: Dbref) {
        if entry.hooks.contains(HookMask::AFAIL) {
            if let Some(text) = self.run_hook("AF_", entry, executor, enactor) {
                if !text.is_empty() {
                    self.world.notify(executor, &text);
                }
                return;
            }
        }
        self.world.notify(executor, NOPERM);
    }

    fn cmdcheck_on(&self, obj: Dbref, command: &str) -> Gate {
        if !self.world.has_flag(obj, ObjectFlags::CMDCHECK) {
            return Gate::Normal;
        }
        cmdcheck_state(&self.world.atr_text(obj, attrs::CMDCHECK), command)
    }

    /// Disabled or ignored commands on the executor (or its owner), its
    /// location and the location's zone
    pub(crate) fn cmdtest(&self, executor: Dbref, command: &str) -> Gate {
        let owner = self.world.owner(executor);
        let who = if self.world.has_flag(executor, ObjectFlags::CMDCHECK) { executor } else { owner };
        let mut state = self.cmdcheck_on(who, command);
        let loc = self.world.location(executor);
        if state == Gate::Normal && self.world.is_valid(loc) {
            state = self.cmdcheck_on(loc, command);
            let zone = self.world.zone(loc);
            if state == Gate::Normal && self.config.dispatch.have_zones && self.world.is_valid(zone) {
                state = self.cmdcheck_on(zone, command);
            }
        }
        state
    }

    /// Command checks, then the ignore and permit hooks. A disabled verb
    /// has already been reported when this returns.
    pub(crate) fn gate(&mut self, entry: &CommandEntry<W>, executor: Dbref, enactor: Dbref) -> Gate {
        let state = self.gate_state(entry, executor, enactor);
        if state == Gate::Disabled {
            self.deny(entry, executor, enactor);
        }
        state
    }

    /// Command checks plus the ignore and permit hooks, without notifying
    pub(crate) fn gate_state(&mut self, entry: &CommandEntry<W>, executor: Dbref, enactor: Dbref) -> Gate {
        let mut state = self.cmdtest(executor, &entry.name);
        if state == Gate::Normal
            && entry.hooks.contains(HookMask::IGNORE)
            && !self.hook_allows("I_", entry, executor, enactor)
        {
            state = Gate::Ignored;
        }
        if state == Gate::Normal
            && entry.hooks.contains(HookMask::PERMIT)
            && !self.hook_allows("P_", entry, executor, enactor)
        {
            state = Gate::Disabled;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems() {
        assert_eq!(hook_stem("@pemit"), "PEMIT");
        assert_eq!(hook_stem("say"), "SAY");
        assert_eq!(hook_stem("\""), "SAY");
        assert_eq!(hook_stem("&"), "SET");
    }

    #[test]
    fn cmdcheck_tokens() {
        assert_eq!(cmdcheck_state("1:say 2:@pemit", "say"), Gate::Disabled);
        assert_eq!(cmdcheck_state("1:say 2:@pemit", "@PEMIT"), Gate::Ignored);
        assert_eq!(cmdcheck_state("1:say junk", "think"), Gate::Normal);
    }

    #[test]
    fn mask_description() {
        assert_eq!(HookMask::NONE.describe(), "none");
        assert_eq!((HookMask::BEFORE | HookMask::AFAIL).describe(), "before fail");
    }
}
