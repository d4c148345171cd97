//! Common test utilities for softcode integration tests

#![allow(dead_code)]

pub use softcode::command::Dispatch;
pub use softcode::world::{AttrFlags, ObjectFlags};
pub use softcode::{Config, Dbref, Engine, MemoryWorld, World};

pub const LIMBO: Dbref = Dbref(0);
pub const GOD: Dbref = Dbref::GOD;

/// Limbo (#0) holding God (#1) and Alice (#2), an ordinary connected player
pub struct Fixture {
    pub engine: Engine<MemoryWorld>,
    pub alice: Dbref,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, |_| {})
    }

    /// Build the world with `setup` before the engine is created, so
    /// configuration directives can refer to what it makes
    pub fn build(config: Config, setup: impl FnOnce(&mut MemoryWorld)) -> Self {
        let mut world = MemoryWorld::new();
        let alice = world.create_player("Alice", LIMBO);
        setup(&mut world);
        world.clear_notifications();
        Self { engine: Engine::new(world, config), alice }
    }

    pub fn world(&mut self) -> &mut MemoryWorld {
        self.engine.world_mut()
    }

    /// Type `line` as `who`, run everything it queued, and return what
    /// `who` was told
    pub fn run(&mut self, who: Dbref, line: &str) -> Vec<String> {
        self.dispatch(who, line);
        self.heard(who)
    }

    /// Like [`Fixture::run`] but returns which stage handled the line
    pub fn dispatch(&mut self, who: Dbref, line: &str) -> Dispatch {
        let outcome = self.engine.process_command(who, who, who, true, line, &[]);
        self.engine.drain_queue(50);
        outcome
    }

    pub fn heard(&mut self, who: Dbref) -> Vec<String> {
        self.world().take_notifications(who)
    }

    pub fn eval(&mut self, who: Dbref, text: &str) -> String {
        self.engine.evaluate(who, text)
    }

    pub fn room(&mut self, name: &str) -> Dbref {
        self.world().create_room(name, GOD)
    }

    pub fn thing(&mut self, name: &str, owner: Dbref, location: Dbref) -> Dbref {
        self.world().create_thing(name, owner, location)
    }

    pub fn player(&mut self, name: &str, location: Dbref) -> Dbref {
        self.world().create_player(name, location)
    }

    pub fn set(&mut self, obj: Dbref, attr: &str, text: &str) {
        self.world().set_attr(obj, attr, text);
    }
}

pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
