//! softcode - command dispatch and softcode evaluation for a multi-user world
//!
//! # Overview
//!
//! Every line a player types, and every line an object queues, goes through
//! [`Engine::process_command`]. The dispatcher tries, in order: single
//! character prefixes, channel aliases, `home`, exits, the hashed built-in
//! command table, and finally `$`-commands stored on nearby objects.
//!
//! Softcode text is evaluated by [`Engine::eval`], which substitutes `%`
//! codes, calls functions written as `name(args)` or `[name(args)]`, and
//! honours `{}` grouping and `\` escapes.
//!
//! Locks are boolean expressions over objects and attributes, parsed by
//! [`Engine::parse_lock`] and checked with [`Engine::could_doit`].
//!
//! # Example
//!
//! ```rust
//! use softcode::{Config, Dbref, Engine, MemoryWorld};
//!
//! let mut engine = Engine::new(MemoryWorld::new(), Config::default());
//! let out = engine.evaluate(Dbref::GOD, "add(1,2)");
//! assert_eq!(out, "3");
//!
//! engine.process_command(Dbref::GOD, Dbref::GOD, Dbref::GOD, true, "think [mul(6,7)]", &[]);
//! assert_eq!(engine.world_mut().take_notifications(Dbref::GOD), vec!["42"]);
//! ```

pub mod alarm;
pub mod command;
pub mod config;
pub mod dbref;
pub mod eval;
pub mod functions;
pub mod lock;
pub mod matcher;
pub mod perms;
pub mod scan;
pub mod wild;
pub mod world;

pub use command::{CommandTable, Dispatch};
pub use config::{Config, ConfigError};
pub use dbref::Dbref;
pub use eval::{Engine, EvalFlags, Frame};
pub use lock::{Lock, LockError};
pub use world::memory::{MemoryWorld, WorldError};
pub use world::World;
