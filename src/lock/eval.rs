//! Lock evaluation

use tracing::error;

use crate::dbref::Dbref;
use crate::eval::{Engine, EvalFlags, Frame};
use crate::wild::wild_match;
use crate::world::{attrs, AttrNum, World};

use super::{Lock, LockTarget};

impl<W: World> Engine<W> {
    /// Can `player` pass the lock stored in `lock_attr` on `thing`? A missing
    /// or empty lock passes, and so does a corrupt one (after logging it).
    pub fn could_doit(&mut self, player: Dbref, thing: Dbref, lock_attr: AttrNum) -> bool {
        if !self.world.is_valid(thing) {
            return false;
        }
        let text = self.world.atr_text(thing, lock_attr);
        if text.trim().is_empty() {
            return true;
        }
        match Lock::from_storage(&self.world, &text) {
            Ok(lock) => self.eval_lock(player, thing, thing, &lock),
            Err(e) => {
                error!(object = %thing, attr = lock_attr, "{}", e);
                true
            }
        }
    }

    /// Evaluate `lock` for `player` trying `thing`; attribute tests are
    /// visible to `from`
    pub fn eval_lock(&mut self, player: Dbref, thing: Dbref, from: Dbref, lock: &Lock) -> bool {
        match lock {
            Lock::And(a, b) => {
                self.eval_lock(player, thing, from, a) && self.eval_lock(player, thing, from, b)
            }
            Lock::Or(a, b) => {
                self.eval_lock(player, thing, from, a) || self.eval_lock(player, thing, from, b)
            }
            Lock::Not(a) => !self.eval_lock(player, thing, from, a),
            Lock::Const(obj) => *obj == player || self.world.contents(player).contains(obj),
            Lock::Attr { attr, pattern } => {
                self.check_attr(player, from, *attr, pattern)
                    || self
                        .world
                        .contents(player)
                        .into_iter()
                        .any(|held| self.check_attr(held, from, *attr, pattern))
            }
            Lock::Eval { attr, value } => self.eval_attr_lock(player, thing, from, *attr, value),
            Lock::Indir(obj) => self.eval_indirect(player, *obj, from),
            Lock::Is(LockTarget::Object(obj)) => *obj == player,
            Lock::Is(LockTarget::Attr { attr, pattern }) => self.check_attr(player, from, *attr, pattern),
            Lock::Carry(LockTarget::Object(obj)) => self.world.contents(player).contains(obj),
            Lock::Carry(LockTarget::Attr { attr, pattern }) => self
                .world
                .contents(player)
                .into_iter()
                .any(|held| self.check_attr(held, from, *attr, pattern)),
            Lock::Owner(obj) => {
                self.world.is_valid(*obj) && self.world.owner(*obj) == self.world.owner(player)
            }
        }
    }

    /// Wildcard test of `attr` on `candidate`. Enter locks and names are
    /// always visible; anything else must be readable by `from`.
    fn check_attr(&self, candidate: Dbref, from: Dbref, attr: AttrNum, pattern: &str) -> bool {
        let visible = attr == attrs::LENTER
            || attr == attrs::NAME
            || self.world.can_read_attr(from, candidate, attr);
        if !visible {
            return false;
        }
        let limit = self.config.limits.parent_nesting;
        let text = self
            .world
            .atr_pget(candidate, attr, limit)
            .map(|(found, _)| found.text)
            .unwrap_or_default();
        wild_match(pattern, &text)
    }

    /// `ATTR/value`: the attribute comes from `from`, or from `thing` when
    /// `from` has none, and runs as whichever object held it
    fn eval_attr_lock(&mut self, player: Dbref, thing: Dbref, from: Dbref, attr: AttrNum, value: &str) -> bool {
        let limit = self.config.limits.parent_nesting;
        let lookup = |source: Dbref| {
            self.world
                .atr_pget(source, attr, limit)
                .map(|(found, _)| found.text)
                .filter(|text| !text.is_empty())
                .map(|text| (source, text))
        };
        let Some((source, body)) = lookup(from).or_else(|| lookup(thing)) else {
            return value.is_empty();
        };
        if attr != attrs::NAME && !self.world.can_read_attr(source, source, attr) {
            return false;
        }
        let frame = Frame::new(source, player, player, &[]);
        let result = self.preserving_registers(|engine| {
            engine.eval(&body, &frame, EvalFlags::EVAL | EvalFlags::FCHECK)
        });
        result.eq_ignore_ascii_case(value)
    }

    fn eval_indirect(&mut self, player: Dbref, target: Dbref, from: Dbref) -> bool {
        if !self.world.is_valid(target) {
            return false;
        }
        self.state.lock_nest_lev += 1;
        if self.state.lock_nest_lev >= self.config.limits.lock_nesting {
            error!(player = %player, lock = %from, "lock exceeded recursion limit");
            self.world.notify(player, "Sorry, broken lock!");
            self.state.lock_nest_lev -= 1;
            return false;
        }
        let text = self.world.atr_text(target, attrs::LOCK);
        let passed = if text.trim().is_empty() {
            true
        } else {
            match Lock::from_storage(&self.world, &text) {
                Ok(lock) => self.eval_lock(player, target, from, &lock),
                Err(e) => {
                    error!(object = %target, "{}", e);
                    true
                }
            }
        };
        self.state.lock_nest_lev -= 1;
        passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::world::memory::MemoryWorld;
    use crate::world::AttrFlags;

    struct Fixture {
        engine: Engine<MemoryWorld>,
        bob: Dbref,
        alice: Dbref,
        door: Dbref,
        key: Dbref,
    }

    fn fixture() -> Fixture {
        let mut world = MemoryWorld::new();
        let bob = world.create_player("Bob", Dbref(0));
        let alice = world.create_player("Alice", Dbref(0));
        let door = world.create_thing("Door", Dbref::GOD, Dbref(0));
        let key = world.create_thing("Key", bob, bob);
        Fixture { engine: Engine::new(world, Config::default()), bob, alice, door, key }
    }

    fn lock_with(f: &mut Fixture, text: &str) {
        let door = f.door;
        f.engine.world_mut().set_attr(door, "LOCK", text);
    }

    #[test]
    fn and_not_composition() {
        let mut f = fixture();
        lock_with(&mut f, "#1&!#2");
        assert!(f.engine.could_doit(Dbref::GOD, f.door, attrs::LOCK));
        assert!(!f.engine.could_doit(f.bob, f.door, attrs::LOCK));
        assert!(!f.engine.could_doit(f.alice, f.door, attrs::LOCK));
    }

    #[test]
    fn carrying_and_identity() {
        let mut f = fixture();
        let key = f.key;
        lock_with(&mut f, &key.to_string());
        assert!(f.engine.could_doit(f.bob, f.door, attrs::LOCK));
        assert!(!f.engine.could_doit(f.alice, f.door, attrs::LOCK));

        lock_with(&mut f, &format!("={}", key));
        assert!(!f.engine.could_doit(f.bob, f.door, attrs::LOCK));
        assert!(f.engine.could_doit(key, f.door, attrs::LOCK));

        lock_with(&mut f, &format!("+{}", key));
        assert!(f.engine.could_doit(f.bob, f.door, attrs::LOCK));
        assert!(!f.engine.could_doit(key, f.door, attrs::LOCK));
    }

    #[test]
    fn ownership() {
        let mut f = fixture();
        let key = f.key;
        lock_with(&mut f, &format!("${}", key));
        assert!(f.engine.could_doit(f.bob, f.door, attrs::LOCK));
        assert!(!f.engine.could_doit(f.alice, f.door, attrs::LOCK));
    }

    #[test]
    fn attribute_patterns() {
        let mut f = fixture();
        let (bob, alice) = (f.bob, f.alice);
        f.engine.world_mut().set_attr_flags(bob, "SEX", "male", AttrFlags::VISUAL);
        f.engine.world_mut().set_attr_flags(alice, "SEX", "female", AttrFlags::VISUAL);
        lock_with(&mut f, &format!("{}:m*", attrs::SEX));
        assert!(f.engine.could_doit(bob, f.door, attrs::LOCK));
        assert!(!f.engine.could_doit(alice, f.door, attrs::LOCK));
        lock_with(&mut f, &format!("{}:B*", attrs::NAME));
        assert!(f.engine.could_doit(bob, f.door, attrs::LOCK));
    }

    #[test]
    fn evaluated_attribute() {
        let mut f = fixture();
        let door = f.door;
        let num = f.engine.world_mut().set_attr(door, "CHECK", "[name(%#)]");
        lock_with(&mut f, &format!("{}/alice", num));
        assert!(f.engine.could_doit(f.alice, door, attrs::LOCK));
        assert!(!f.engine.could_doit(f.bob, door, attrs::LOCK));
    }

    #[test]
    fn indirect_and_broken_locks() {
        let mut f = fixture();
        let (bob, door) = (f.bob, f.door);
        let other = f.engine.world_mut().create_thing("Gate", Dbref::GOD, Dbref(0));
        f.engine.world_mut().set_attr(other, "LOCK", &bob.to_string());
        lock_with(&mut f, &format!("@{}", other));
        assert!(f.engine.could_doit(bob, door, attrs::LOCK));
        assert!(!f.engine.could_doit(f.alice, door, attrs::LOCK));

        f.engine.world_mut().set_attr(other, "LOCK", &format!("@{}", other));
        assert!(!f.engine.could_doit(bob, door, attrs::LOCK));
        assert!(f
            .engine
            .world_mut()
            .take_notifications(bob)
            .contains(&"Sorry, broken lock!".to_string()));
    }

    #[test]
    fn corrupt_and_empty_locks_pass() {
        let mut f = fixture();
        assert!(f.engine.could_doit(f.alice, f.door, attrs::LOCK));
        lock_with(&mut f, "#1&(");
        assert!(f.engine.could_doit(f.alice, f.door, attrs::LOCK));
    }
}
