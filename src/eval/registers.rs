//! Global registers `%q0`-`%q9` and `%qa`-`%qz`

use crate::world::World;

use super::Engine;

pub const REGISTER_COUNT: usize = 36;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    slots: Vec<String>,
}

impl Default for Registers {
    fn default() -> Self {
        Self { slots: vec![String::new(); REGISTER_COUNT] }
    }
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for a register name: `0`-`9`, then `a`-`z` in either case
    pub fn index_of(name: char) -> Option<usize> {
        match name {
            '0'..='9' => Some(name as usize - '0' as usize),
            'a'..='z' => Some(10 + name as usize - 'a' as usize),
            'A'..='Z' => Some(10 + name as usize - 'A' as usize),
            _ => None,
        }
    }

    /// Slot for a one-character register name given as text
    pub fn index_of_str(name: &str) -> Option<usize> {
        let mut chars = name.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::index_of(c),
            _ => None,
        }
    }

    pub fn get(&self, index: usize) -> &str {
        self.slots.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, index: usize, value: &str) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.clear();
            slot.push_str(value);
        }
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(String::clear);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(String::is_empty)
    }
}

impl<W: World> Engine<W> {
    /// Run `f` with the global registers restored afterwards
    pub(crate) fn preserving_registers<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.state.registers.clone();
        let result = f(self);
        self.state.registers = saved;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_names() {
        assert_eq!(Registers::index_of('0'), Some(0));
        assert_eq!(Registers::index_of('9'), Some(9));
        assert_eq!(Registers::index_of('a'), Some(10));
        assert_eq!(Registers::index_of('Z'), Some(35));
        assert_eq!(Registers::index_of('-'), None);
        assert_eq!(Registers::index_of_str("ab"), None);
    }

    #[test]
    fn set_and_clear() {
        let mut regs = Registers::new();
        assert!(regs.is_empty());
        regs.set(Registers::index_of('x').unwrap(), "hello");
        assert_eq!(regs.get(33), "hello");
        assert_eq!(regs.get(99), "");
        regs.clear();
        assert!(regs.is_empty());
    }
}
