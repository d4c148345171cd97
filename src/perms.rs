//! Permission masks
//!
//! Commands, switches and functions carry a [`Perms`] mask. Some bits name a
//! class the player must belong to (wizard, builder, ...), some name a class
//! the player must not belong to (guest, slave, ...), and some are gates the
//! dispatcher checks separately (global build/interp, object type).

use crate::dbref::Dbref;
use crate::world::{bitset, ObjectFlags, World};

bitset! {
    Perms {
        GOD = 1 << 0;
        WIZARD = 1 << 1;
        BUILDER = 1 << 2;
        IMMORTAL = 1 << 3;
        HEAD = 1 << 4;
        STAFF = 1 << 5;
        ROBOT = 1 << 6;
        UNINSPECTED = 1 << 7;
        NO_HAVEN = 1 << 8;
        NO_ROBOT = 1 << 9;
        NO_SLAVE = 1 << 10;
        NO_SUSPECT = 1 << 11;
        NO_GUEST = 1 << 12;
        NO_UNINSPECTED = 1 << 13;
        GBL_BUILD = 1 << 14;
        GBL_INTERP = 1 << 15;
        DISABLED = 1 << 16;
        STATIC = 1 << 17;
        NEED_LOCATION = 1 << 18;
        NEED_CONTENTS = 1 << 19;
        NEED_PLAYER = 1 << 20;
        /// Hidden from command listings
        DARK = 1 << 21;
    }
}

impl Perms {
    pub const PUBLIC: Perms = Perms::NONE;
    const MUST_BE: Perms = Perms(
        Perms::GOD.0
            | Perms::WIZARD.0
            | Perms::BUILDER.0
            | Perms::IMMORTAL.0
            | Perms::HEAD.0
            | Perms::STAFF.0
            | Perms::ROBOT.0
            | Perms::UNINSPECTED.0,
    );
    const CANT_BE: Perms = Perms(
        Perms::NO_HAVEN.0
            | Perms::NO_ROBOT.0
            | Perms::NO_SLAVE.0
            | Perms::NO_SUSPECT.0
            | Perms::NO_GUEST.0
            | Perms::NO_UNINSPECTED.0,
    );
}

/// One row of a name table: full name, shortest accepted abbreviation, value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameEntry {
    pub name: &'static str,
    pub min_len: usize,
    pub bits: u32,
}

pub const ACCESS_NAMES: &[NameEntry] = &[
    NameEntry { name: "builder", min_len: 6, bits: Perms::BUILDER.0 },
    NameEntry { name: "dark", min_len: 4, bits: Perms::DARK.0 },
    NameEntry { name: "disabled", min_len: 4, bits: Perms::DISABLED.0 },
    NameEntry { name: "global_build", min_len: 8, bits: Perms::GBL_BUILD.0 },
    NameEntry { name: "global_interp", min_len: 8, bits: Perms::GBL_INTERP.0 },
    NameEntry { name: "god", min_len: 2, bits: Perms::GOD.0 },
    NameEntry { name: "head", min_len: 2, bits: Perms::HEAD.0 },
    NameEntry { name: "immortal", min_len: 3, bits: Perms::IMMORTAL.0 },
    NameEntry { name: "need_location", min_len: 6, bits: Perms::NEED_LOCATION.0 },
    NameEntry { name: "need_contents", min_len: 6, bits: Perms::NEED_CONTENTS.0 },
    NameEntry { name: "need_player", min_len: 6, bits: Perms::NEED_PLAYER.0 },
    NameEntry { name: "no_haven", min_len: 4, bits: Perms::NO_HAVEN.0 },
    NameEntry { name: "no_robot", min_len: 4, bits: Perms::NO_ROBOT.0 },
    NameEntry { name: "no_slave", min_len: 5, bits: Perms::NO_SLAVE.0 },
    NameEntry { name: "no_suspect", min_len: 5, bits: Perms::NO_SUSPECT.0 },
    NameEntry { name: "no_guest", min_len: 5, bits: Perms::NO_GUEST.0 },
    NameEntry { name: "no_uninspected", min_len: 5, bits: Perms::NO_UNINSPECTED.0 },
    NameEntry { name: "robot", min_len: 2, bits: Perms::ROBOT.0 },
    NameEntry { name: "staff", min_len: 4, bits: Perms::STAFF.0 },
    NameEntry { name: "static", min_len: 4, bits: Perms::STATIC.0 },
    NameEntry { name: "uninspected", min_len: 5, bits: Perms::UNINSPECTED.0 },
    NameEntry { name: "wizard", min_len: 3, bits: Perms::WIZARD.0 },
];

/// `input` is a case-insensitive prefix of `name` at least `min_len` long
/// (or all of `name`)
pub fn minmatch(input: &str, name: &str, min_len: usize) -> bool {
    if input.is_empty() || input.len() > name.len() {
        return false;
    }
    let prefix = &name.as_bytes()[..input.len()];
    if !prefix.eq_ignore_ascii_case(input.as_bytes()) {
        return false;
    }
    input.len() >= min_len || input.len() == name.len()
}

/// First entry whose name `input` abbreviates
pub fn search_names<'t>(table: &'t [NameEntry], input: &str) -> Option<&'t NameEntry> {
    table.iter().find(|e| minmatch(input, e.name, e.min_len))
}

/// Pairs of entries that some abbreviation would match ambiguously
pub fn ambiguous_pairs<'t, T, F>(table: &'t [T], key: F) -> Vec<(&'t str, &'t str)>
where
    F: Fn(&'t T) -> (&'t str, usize),
{
    let mut pairs = Vec::new();
    for (i, a) in table.iter().enumerate() {
        let (name_a, min_a) = key(a);
        for b in &table[i + 1..] {
            let (name_b, min_b) = key(b);
            let common = name_a
                .bytes()
                .zip(name_b.bytes())
                .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
                .count();
            let shortest_a = min_a.max(1).min(name_a.len());
            let shortest_b = min_b.max(1).min(name_b.len());
            if common >= shortest_a.max(shortest_b) {
                pairs.push((name_a, name_b));
            }
        }
    }
    pairs
}

/// Apply a space-separated list of permission names to `base`. A leading
/// `!` removes the bit. Returns the offending word on failure.
pub fn apply_names(base: Perms, spec: &str) -> Result<Perms, String> {
    let mut perms = base;
    for word in spec.split_whitespace() {
        let (negate, name) = match word.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, word),
        };
        let entry = search_names(ACCESS_NAMES, name).ok_or_else(|| word.to_string())?;
        if negate {
            perms.remove(Perms(entry.bits));
        } else {
            perms.insert(Perms(entry.bits));
        }
    }
    Ok(perms)
}

/// Space-separated names of the bits set in `perms`
pub fn describe(perms: Perms) -> String {
    ACCESS_NAMES
        .iter()
        .filter(|e| perms.contains(Perms(e.bits)))
        .map(|e| e.name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// May `player` use something guarded by `mask`?
pub fn check_access<W: World + ?Sized>(world: &W, player: Dbref, mask: Perms) -> bool {
    if mask.intersects(Perms::DISABLED | Perms::STATIC) {
        return false;
    }
    if world.is_god(player) {
        return true;
    }

    let must = mask.0 & Perms::MUST_BE.0;
    if must != 0 {
        if must == Perms::GOD.0 {
            return false;
        }
        let must = Perms(must);
        let found = (must.contains(Perms::WIZARD) && world.is_wizard(player))
            || (must.contains(Perms::BUILDER) && world.is_builder(player))
            || (must.contains(Perms::STAFF) && world.is_staff(player))
            || (must.contains(Perms::HEAD) && world.has_flag(player, ObjectFlags::HEAD))
            || (must.contains(Perms::IMMORTAL) && world.has_flag(player, ObjectFlags::IMMORTAL))
            || (must.contains(Perms::ROBOT) && world.has_flag(player, ObjectFlags::ROBOT))
            || (must.contains(Perms::UNINSPECTED) && world.has_flag(player, ObjectFlags::UNINSPECTED));
        if !found {
            return false;
        }
    }

    if mask.intersects(Perms::CANT_BE) && !world.is_wizard(player) {
        let flags = world.flags(player);
        let barred = (mask.contains(Perms::NO_HAVEN) && flags.contains(ObjectFlags::HAVEN))
            || (mask.contains(Perms::NO_ROBOT) && flags.contains(ObjectFlags::ROBOT))
            || (mask.contains(Perms::NO_SLAVE) && flags.contains(ObjectFlags::SLAVE))
            || (mask.contains(Perms::NO_SUSPECT) && flags.contains(ObjectFlags::SUSPECT))
            || (mask.contains(Perms::NO_GUEST) && flags.contains(ObjectFlags::GUEST))
            || (mask.contains(Perms::NO_UNINSPECTED) && flags.contains(ObjectFlags::UNINSPECTED));
        if barred {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::memory::MemoryWorld;

    #[test]
    fn abbreviations() {
        assert!(minmatch("wiz", "wizard", 3));
        assert!(minmatch("WIZARD", "wizard", 3));
        assert!(!minmatch("wi", "wizard", 3));
        assert!(!minmatch("wizards", "wizard", 3));
        assert!(minmatch("god", "god", 5));
    }

    #[test]
    fn access_table_is_unambiguous() {
        assert!(ambiguous_pairs(ACCESS_NAMES, |e| (e.name, e.min_len)).is_empty());
    }

    #[test]
    fn ambiguity_detection() {
        let table = [("quiet", 1), ("quick", 1), ("all", 1)];
        assert_eq!(ambiguous_pairs(&table, |e| (e.0, e.1)), vec![("quiet", "quick")]);
        let table = [("quiet", 4), ("quick", 4)];
        assert!(ambiguous_pairs(&table, |e| (e.0, e.1)).is_empty());
    }

    #[test]
    fn name_lists() {
        let perms = apply_names(Perms::NONE, "wizard no_guest").unwrap();
        assert!(perms.contains(Perms::WIZARD | Perms::NO_GUEST));
        let perms = apply_names(perms, "!wiz").unwrap();
        assert_eq!(perms, Perms::NO_GUEST);
        assert_eq!(apply_names(Perms::NONE, "wizard bogus"), Err("bogus".to_string()));
        assert_eq!(describe(Perms::GOD | Perms::NO_SLAVE), "god no_slave");
    }

    #[test]
    fn access_checks() {
        let mut world = MemoryWorld::new();
        let bob = world.create_player("Bob", Dbref(0));
        let god = Dbref::GOD;

        assert!(check_access(&world, bob, Perms::PUBLIC));
        assert!(!check_access(&world, bob, Perms::WIZARD));
        assert!(check_access(&world, god, Perms::WIZARD));
        assert!(!check_access(&world, god, Perms::DISABLED));
        assert!(!check_access(&world, bob, Perms::GOD));

        world.set_flag(bob, ObjectFlags::GUEST, true);
        assert!(!check_access(&world, bob, Perms::NO_GUEST));
        world.set_flag(bob, ObjectFlags::WIZARD, true);
        assert!(check_access(&world, bob, Perms::NO_GUEST | Perms::WIZARD));
        assert!(!check_access(&world, bob, Perms::GOD));
    }
}
