//! Built-in verbs

mod admin;
mod control;
mod locks;
mod movement;
mod speech;

use crate::eval::Engine;
use crate::world::World;

use super::CommandEntry;

/// Extra names for built-in verbs
pub(crate) const BUILTIN_ALIASES: &[(&str, &str)] = &[("move", "goto")];

impl<W: World> Engine<W> {
    pub(crate) fn builtin_commands() -> Vec<CommandEntry<W>> {
        let groups = [
            Self::speech_commands(),
            Self::control_commands(),
            Self::lock_commands(),
            Self::admin_commands(),
            Self::movement_commands(),
        ];
        groups.into_iter().flatten().collect()
    }

    /// Entries for the single-character prefixes. `-` and `~` stay empty.
    pub(crate) fn prefix_commands() -> Vec<(u8, CommandEntry<W>)> {
        let groups = [Self::speech_prefixes(), Self::control_prefixes(), Self::lock_prefixes()];
        groups.into_iter().flatten().collect()
    }
}
