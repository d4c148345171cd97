//! Command table and dispatcher
//!
//! A typed line goes through [`Engine::process_command`], which tries, in
//! order: the single-character prefixes, the channel system, `home`, exits,
//! the hashed verb table, enter/leave aliases and finally `$`-commands on
//! nearby objects. Verbs found in the table are run by
//! [`Engine::process_cmdent`], which checks permissions, parses switches,
//! evaluates arguments according to the verb's calling sequence and calls its
//! handler.

mod builtins;
mod dispatch;
mod dollar;
mod hooks;
mod invoke;
mod queue;
mod switches;

pub use dispatch::Dispatch;
pub use hooks::HookMask;
pub use switches::{parse_switches, SwitchEntry, SwitchError, SW_GOT_UNIQUE, SW_NOEVAL};

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::perms::{self, minmatch, Perms};
use crate::world::{bitset, AttrNum, World};

pub(crate) const NOPERM: &str = "Permission denied.";

bitset! {
    /// How a verb's arguments are split and evaluated
    CallSeq {
        /// Evaluate arguments even when typed interactively
        INTERP = 1 << 0;
        /// Never evaluate arguments of queued commands
        NOINTERP = 1 << 1;
        /// Strip one level of braces from unevaluated arguments
        STRIP = 1 << 2;
        STRIP_AROUND = 1 << 3;
        /// Pass the second argument through unparsed
        UNPARSE = 1 << 4;
        /// Take arguments from the line before space compression
        NOSQUISH = 1 << 5;
    }
}

/// Who runs a verb and how it was reached
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub executor: Dbref,
    pub caller: Dbref,
    pub enactor: Dbref,
    /// Switch bits plus the entry's extra bits
    pub key: u32,
    pub interactive: bool,
    /// The line as it was typed
    pub command: &'a str,
}

impl Invocation<'_> {
    pub fn has(&self, bit: u32) -> bool {
        self.key & bit != 0
    }
}

/// A verb handler, one variant per calling shape
pub enum CommandHandler<W: World> {
    NoArgs(fn(&mut Engine<W>, &Invocation<'_>)),
    OneArg(fn(&mut Engine<W>, &Invocation<'_>, &str)),
    /// One argument plus the caller's `%0`-`%9`, for verbs that queue more commands
    OneArgCmdArgs(fn(&mut Engine<W>, &Invocation<'_>, &str, &[String])),
    TwoArgs(fn(&mut Engine<W>, &Invocation<'_>, &str, &str)),
    /// The second argument split into a comma-separated list
    TwoArgsArgv(fn(&mut Engine<W>, &Invocation<'_>, &str, &[String])),
    TwoArgsCmdArgs(fn(&mut Engine<W>, &Invocation<'_>, &str, &str, &[String])),
    TwoArgsArgvCmdArgs(fn(&mut Engine<W>, &Invocation<'_>, &str, &[String], &[String])),
    /// Added with `@addcommand`; runs by queueing its bound attributes
    Soft,
}

impl<W: World> Clone for CommandHandler<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: World> Copy for CommandHandler<W> {}

impl<W: World> fmt::Debug for CommandHandler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            CommandHandler::NoArgs(_) => "NoArgs",
            CommandHandler::OneArg(_) => "OneArg",
            CommandHandler::OneArgCmdArgs(_) => "OneArgCmdArgs",
            CommandHandler::TwoArgs(_) => "TwoArgs",
            CommandHandler::TwoArgsArgv(_) => "TwoArgsArgv",
            CommandHandler::TwoArgsCmdArgs(_) => "TwoArgsCmdArgs",
            CommandHandler::TwoArgsArgvCmdArgs(_) => "TwoArgsArgvCmdArgs",
            CommandHandler::Soft => "Soft",
        };
        f.write_str(shape)
    }
}

/// An attribute bound to a soft command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftBinding {
    pub thing: Dbref,
    pub attr: AttrNum,
}

#[derive(Debug)]
pub struct CommandEntry<W: World> {
    pub name: String,
    pub switches: Vec<SwitchEntry>,
    pub perms: Perms,
    pub extra: u32,
    pub callseq: CallSeq,
    pub hooks: HookMask,
    pub handler: CommandHandler<W>,
    pub bindings: Vec<SoftBinding>,
}

impl<W: World> Clone for CommandEntry<W> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            switches: self.switches.clone(),
            perms: self.perms,
            extra: self.extra,
            callseq: self.callseq,
            hooks: self.hooks,
            handler: self.handler,
            bindings: self.bindings.clone(),
        }
    }
}

impl<W: World> CommandEntry<W> {
    pub fn new(name: &str, callseq: CallSeq, handler: CommandHandler<W>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            switches: Vec::new(),
            perms: Perms::PUBLIC,
            extra: 0,
            callseq,
            hooks: HookMask::NONE,
            handler,
            bindings: Vec::new(),
        }
    }

    pub fn perms(mut self, perms: Perms) -> Self {
        self.perms = perms;
        self
    }

    pub fn switches(mut self, table: &[SwitchEntry]) -> Self {
        self.switches = table.to_vec();
        self
    }

    pub fn extra(mut self, extra: u32) -> Self {
        self.extra = extra;
        self
    }

    pub fn is_soft(&self) -> bool {
        matches!(self.handler, CommandHandler::Soft)
    }

    fn soft(name: &str) -> Self {
        Self::new(name, CallSeq::NONE, CommandHandler::Soft)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("command {0} is already defined")]
    Duplicate(String),
    #[error("no such command: {0}")]
    NotFound(String),
    #[error("command {command} has no switch {switch}")]
    NoSuchSwitch { command: String, switch: String },
    #[error("bad permission name: {0}")]
    BadPermission(String),
    #[error(transparent)]
    Switches(#[from] SwitchError),
}

pub type CmdId = usize;

/// Verbs by name plus the single-character prefix slots
pub struct CommandTable<W: World> {
    entries: Vec<CommandEntry<W>>,
    index: HashMap<String, CmdId>,
    prefixes: [Option<CmdId>; 256],
    /// Slots no name or prefix points at any more
    free: Vec<CmdId>,
}

impl<W: World> CommandTable<W> {
    pub fn new() -> Self {
        Self { entries: Vec::new(), index: HashMap::new(), prefixes: [None; 256], free: Vec::new() }
    }

    fn alloc(&mut self, entry: CommandEntry<W>) -> CmdId {
        match self.free.pop() {
            Some(id) => {
                self.entries[id] = entry;
                id
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        }
    }

    fn is_referenced(&self, id: CmdId) -> bool {
        self.index.values().any(|&v| v == id) || self.prefixes.contains(&Some(id))
    }

    /// The built-in verbs and prefixes. Entries that fail to register are
    /// logged and left out.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for entry in Engine::<W>::builtin_commands() {
            if let Err(e) = table.register(entry) {
                error!("built-in command rejected: {}", e);
            }
        }
        for (byte, entry) in Engine::<W>::prefix_commands() {
            table.register_prefix(byte, entry);
        }
        for &(name, target) in builtins::BUILTIN_ALIASES {
            if let Err(e) = table.alias(name, target) {
                error!("built-in alias {} rejected: {}", name, e);
            }
        }
        table
    }

    /// Add a verb. The first registration of a name wins.
    pub fn register(&mut self, entry: CommandEntry<W>) -> Result<CmdId, TableError> {
        switches::validate(&entry)?;
        if self.index.contains_key(&entry.name) {
            warn!(command = %entry.name, "duplicate command registration ignored");
            return Err(TableError::Duplicate(entry.name));
        }
        let name = entry.name.clone();
        let id = self.alloc(entry);
        self.index.insert(name, id);
        Ok(id)
    }

    pub fn register_prefix(&mut self, byte: u8, entry: CommandEntry<W>) {
        let id = self.alloc(entry);
        self.prefixes[usize::from(byte)] = Some(id);
    }

    pub fn lookup(&self, name: &str) -> Option<&CommandEntry<W>> {
        self.index.get(&name.to_ascii_lowercase()).map(|&id| &self.entries[id])
    }

    pub fn lookup_prefix(&self, byte: u8) -> Option<&CommandEntry<W>> {
        self.prefixes[usize::from(byte)].map(|id| &self.entries[id])
    }

    /// A verb by name, or a prefix slot when `name` is one character
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut CommandEntry<W>> {
        let key = name.to_ascii_lowercase();
        let id = match self.index.get(&key) {
            Some(&id) => Some(id),
            None if key.len() == 1 => self.prefixes[usize::from(key.as_bytes()[0])],
            None => None,
        }?;
        self.entries.get_mut(id)
    }

    /// Make `name` another name for `target`. A `verb/switch` target
    /// produces a new entry with that switch already applied.
    pub fn alias(&mut self, name: &str, target: &str) -> Result<(), TableError> {
        let name = name.trim().to_ascii_lowercase();
        if self.index.contains_key(&name) {
            return Err(TableError::Duplicate(name));
        }
        let (base, switch) = match target.split_once('/') {
            Some((base, switch)) => (base.trim(), Some(switch.trim())),
            None => (target.trim(), None),
        };
        let id = *self
            .index
            .get(&base.to_ascii_lowercase())
            .ok_or_else(|| TableError::NotFound(base.to_string()))?;
        let Some(switch) = switch else {
            self.index.insert(name, id);
            return Ok(());
        };

        let base_entry = &self.entries[id];
        let sw = base_entry
            .switches
            .iter()
            .find(|s| minmatch(switch, s.name, s.min_len))
            .copied()
            .ok_or_else(|| TableError::NoSuchSwitch {
                command: base_entry.name.clone(),
                switch: switch.to_string(),
            })?;
        let mut entry = base_entry.clone();
        entry.name = name;
        entry.perms = entry.perms | sw.perms;
        entry.extra |= sw.bit;
        if !sw.multiple {
            entry.extra |= SW_GOT_UNIQUE;
        }
        self.register(entry).map(|_| ())
    }

    /// Give the entry known as `old` the name `new` instead
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), TableError> {
        let new = new.to_ascii_lowercase();
        if self.index.contains_key(&new) {
            return Err(TableError::Duplicate(new));
        }
        let id = self
            .index
            .remove(&old.to_ascii_lowercase())
            .ok_or_else(|| TableError::NotFound(old.to_string()))?;
        if self.entries[id].name == old.to_ascii_lowercase() {
            self.entries[id].name = new.clone();
        }
        self.index.insert(new, id);
        Ok(())
    }

    /// Forget a name. The entry is released once no other name or prefix
    /// refers to it.
    pub fn remove_name(&mut self, name: &str) -> Option<CmdId> {
        let id = self.index.remove(&name.to_ascii_lowercase())?;
        if !self.is_referenced(id) {
            self.entries[id].bindings.clear();
            self.free.push(id);
        }
        Some(id)
    }

    /// Insert or fetch the soft entry called `name`
    pub(crate) fn soft_entry(&mut self, name: &str) -> &mut CommandEntry<W> {
        let key = name.to_ascii_lowercase();
        let id = match self.index.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.alloc(CommandEntry::soft(&key));
                self.index.insert(key, id);
                id
            }
        };
        &mut self.entries[id]
    }

    /// Apply a permission-name list to a verb or `verb/switch`
    pub fn set_access(&mut self, target: &str, spec: &str) -> Result<(), TableError> {
        let (base, switch) = match target.split_once('/') {
            Some((base, switch)) => (base.trim(), Some(switch.trim())),
            None => (target.trim(), None),
        };
        let entry = self
            .entry_mut(base)
            .ok_or_else(|| TableError::NotFound(base.to_string()))?;
        let current = match switch {
            None => &mut entry.perms,
            Some(sw) => {
                let command = entry.name.clone();
                &mut entry
                    .switches
                    .iter_mut()
                    .find(|s| minmatch(sw, s.name, s.min_len))
                    .ok_or(TableError::NoSuchSwitch { command, switch: sw.to_string() })?
                    .perms
            }
        };
        *current = perms::apply_names(*current, spec).map_err(TableError::BadPermission)?;
        Ok(())
    }

    /// Names in the table, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<W: World> Default for CommandTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: World> Engine<W> {
    pub fn commands(&self) -> &CommandTable<W> {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandTable<W> {
        &mut self.commands
    }

    /// Replay `[[alias]]` and `[access]` from the configuration
    pub(crate) fn apply_command_directives(&mut self) {
        for directive in self.config.aliases.clone() {
            if let Err(e) = self.commands.alias(&directive.name, &directive.command) {
                warn!(alias = %directive.name, "alias directive: {}", e);
            }
        }
        let mut access: Vec<_> = self.config.access.clone().into_iter().collect();
        access.sort();
        for (target, spec) in access {
            if let Err(e) = self.commands.set_access(&target, &spec) {
                warn!(command = %target, "access directive: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::memory::MemoryWorld;

    fn table() -> CommandTable<MemoryWorld> {
        CommandTable::with_builtins()
    }

    #[test]
    fn builtins_and_prefixes() {
        let t = table();
        assert!(t.lookup("say").is_some());
        assert!(t.lookup("@PEMIT").is_some());
        assert_eq!(t.lookup("move").map(|e| e.name.as_str()), Some("goto"));
        assert_eq!(t.lookup_prefix(b'"').map(|e| e.name.as_str()), Some("\""));
        assert!(t.lookup_prefix(b'-').is_none());
        assert!(t.lookup_prefix(b'~').is_none());
    }

    #[test]
    fn first_registration_wins() {
        let mut t = table();
        let dup = CommandEntry::new("say", CallSeq::NONE, CommandHandler::Soft);
        assert_eq!(t.register(dup), Err(TableError::Duplicate("say".into())));
        assert!(!t.lookup("say").is_some_and(|e| e.is_soft()));
    }

    #[test]
    fn switch_alias_presets_the_switch() {
        let mut t = table();
        t.alias("pl", "@pemit/list").unwrap();
        let entry = t.lookup("pl").unwrap();
        let list = t.lookup("@pemit").unwrap().switches.iter().find(|s| s.name == "list").unwrap();
        assert!(entry.extra & list.bit != 0);
        assert!(entry.extra & SW_GOT_UNIQUE != 0);
        assert!(matches!(t.alias("px", "@pemit/bogus"), Err(TableError::NoSuchSwitch { .. })));
        assert!(matches!(t.alias("py", "@nothing"), Err(TableError::NotFound(_))));
    }

    #[test]
    fn plain_alias_shares_the_entry() {
        let mut t = table();
        t.alias("tk", "think").unwrap();
        assert_eq!(t.lookup("tk").map(|e| e.name.as_str()), Some("think"));
        assert_eq!(t.alias("tk", "say"), Err(TableError::Duplicate("tk".into())));
    }

    #[test]
    fn access_overrides() {
        let mut t = table();
        t.set_access("think", "wizard").unwrap();
        assert!(t.lookup("think").unwrap().perms.contains(Perms::WIZARD));
        t.set_access("@pemit/contents", "builder").unwrap();
        let sw = t.lookup("@pemit").unwrap().switches.iter().find(|s| s.name == "contents").copied();
        assert!(sw.unwrap().perms.contains(Perms::BUILDER));
        assert_eq!(t.set_access("think", "bogus"), Err(TableError::BadPermission("bogus".into())));
    }

    #[test]
    fn removed_soft_entries_release_their_slot() {
        let mut t = table();
        let before = t.entries.len();
        for _ in 0..3 {
            t.soft_entry("+who");
            assert_eq!(t.entries.len(), before + 1);
            t.remove_name("+who");
        }
        assert!(t.lookup("+who").is_none());

        t.alias("tk", "think").unwrap();
        t.remove_name("tk");
        assert!(t.lookup("think").is_some());
        assert_eq!(t.soft_entry("+where").name, "+where");
        assert_eq!(t.entries.len(), before + 1);
    }

    #[test]
    fn rename_moves_the_name() {
        let mut t = table();
        t.rename("think", "__think").unwrap();
        assert!(t.lookup("think").is_none());
        assert!(t.lookup("__think").is_some());
        t.rename("__think", "think").unwrap();
        assert!(t.lookup("think").is_some());
    }
}
