//! Well-known attribute numbers
//!
//! Numbers below [`USER_START`] are reserved for attributes the engine itself
//! reads. Everything else is allocated by the database on first use.

pub type AttrNum = u32;

pub const DESC: AttrNum = 6;
pub const SEX: AttrNum = 7;
pub const NAME: AttrNum = 33;
/// Default lock
pub const LOCK: AttrNum = 42;
pub const LENTER: AttrNum = 59;
pub const LUSE: AttrNum = 62;
pub const EALIAS: AttrNum = 64;
pub const LALIAS: AttrNum = 65;
pub const VA: AttrNum = 100;
pub const VZ: AttrNum = 125;
/// Per-object disabled/ignored command list
pub const CMDCHECK: AttrNum = 216;

pub const USER_START: AttrNum = 256;

pub const WELL_KNOWN: &[(&str, AttrNum)] = &[
    ("DESC", DESC),
    ("SEX", SEX),
    ("NAME", NAME),
    ("LOCK", LOCK),
    ("LENTER", LENTER),
    ("LUSE", LUSE),
    ("EALIAS", EALIAS),
    ("LALIAS", LALIAS),
    ("CMDCHECK", CMDCHECK),
];

/// `VA`..`VZ` for a letter
pub fn va(letter: char) -> Option<AttrNum> {
    let lower = letter.to_ascii_lowercase();
    lower
        .is_ascii_lowercase()
        .then(|| VA + (lower as AttrNum - 'a' as AttrNum))
}

/// Name of a reserved attribute, including the `VA`..`VZ` range
pub fn well_known_name(num: AttrNum) -> Option<String> {
    if (VA..=VZ).contains(&num) {
        let letter = (b'A' + (num - VA) as u8) as char;
        return Some(format!("V{}", letter));
    }
    WELL_KNOWN
        .iter()
        .find(|(_, n)| *n == num)
        .map(|(name, _)| (*name).to_string())
}

/// Attribute names are upper-case words of letters, digits and `_-.#`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '#' | '`' | '~'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn va_range() {
        assert_eq!(va('a'), Some(VA));
        assert_eq!(va('Z'), Some(VZ));
        assert_eq!(va('1'), None);
        assert_eq!(well_known_name(VA + 2).as_deref(), Some("VC"));
        assert_eq!(well_known_name(LENTER).as_deref(), Some("LENTER"));
    }

    #[test]
    fn names() {
        assert!(is_valid_name("FN_DOUBLE"));
        assert!(!is_valid_name("1ABC"));
        assert!(!is_valid_name("A B"));
    }
}
