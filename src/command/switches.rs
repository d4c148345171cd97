//! Command switches (`@pemit/list/contents`)

use thiserror::Error;
use tracing::error;

use crate::dbref::Dbref;
use crate::perms::{ambiguous_pairs, check_access, minmatch, Perms};
use crate::world::World;

use super::CommandEntry;

/// Arguments are taken literally
pub const SW_NOEVAL: u32 = 1 << 31;
/// A non-multiple switch is already applied (set by `verb/switch` aliases)
pub const SW_GOT_UNIQUE: u32 = 1 << 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchEntry {
    pub name: &'static str,
    /// Shortest accepted abbreviation
    pub min_len: usize,
    pub perms: Perms,
    pub bit: u32,
    /// May be combined with other switches
    pub multiple: bool,
}

impl SwitchEntry {
    pub const fn new(name: &'static str, min_len: usize, bit: u32) -> Self {
        Self { name, min_len, perms: Perms::PUBLIC, bit, multiple: false }
    }

    pub const fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub const fn perms(mut self, perms: Perms) -> Self {
        self.perms = perms;
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwitchError {
    #[error("Unrecognized switch '{switch}' for command '{command}'.")]
    Unrecognized { switch: String, command: String },
    #[error("Illegal combination of switches.")]
    Combination,
    #[error("Command {0} does not take switches.")]
    NoSwitches(String),
    #[error("Permission denied.")]
    Permission,
    #[error("switches {first} and {second} of {command} share an abbreviation")]
    Ambiguous { command: String, first: String, second: String },
}

/// Reject switch tables where one abbreviation would match two entries
pub(crate) fn validate<W: World>(entry: &CommandEntry<W>) -> Result<(), SwitchError> {
    let pairs = ambiguous_pairs(&entry.switches, |s| (s.name, s.min_len));
    match pairs.first() {
        Some((first, second)) => {
            error!(command = %entry.name, first, second, "ambiguous switch table");
            Err(SwitchError::Ambiguous {
                command: entry.name.clone(),
                first: (*first).to_string(),
                second: (*second).to_string(),
            })
        }
        None => Ok(()),
    }
}

/// Turn `list/contents` into switch bits for `entry`, starting from its
/// extra bits. Soft commands take any combination.
pub fn parse_switches<W: World>(
    world: &W,
    player: Dbref,
    entry: &CommandEntry<W>,
    text: &str,
) -> Result<u32, SwitchError> {
    let mut key = entry.extra;
    let mut got_one = key & SW_GOT_UNIQUE != 0;
    if entry.switches.is_empty() {
        return Err(SwitchError::NoSwitches(entry.name.clone()));
    }

    for token in text.split('/').map(str::trim).filter(|t| !t.is_empty()) {
        let sw = entry
            .switches
            .iter()
            .find(|s| minmatch(token, s.name, s.min_len))
            .ok_or_else(|| SwitchError::Unrecognized {
                switch: token.to_string(),
                command: entry.name.clone(),
            })?;
        if !check_access(world, player, sw.perms) {
            return Err(SwitchError::Permission);
        }
        if !sw.multiple && !entry.is_soft() {
            if got_one {
                return Err(SwitchError::Combination);
            }
            got_one = true;
        }
        key |= sw.bit;
    }
    Ok(key & !SW_GOT_UNIQUE)
}
