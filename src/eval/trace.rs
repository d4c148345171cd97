//! Trace output for objects with the TRACE flag
//!
//! Each traced evaluation records `before -> after` once it finishes. Lines
//! are buffered until the outermost traced evaluation completes and are then
//! delivered to the owner of each executor.

use std::mem;
use tracing::debug;

use crate::dbref::Dbref;
use crate::world::World;

use super::Engine;

#[derive(Debug)]
pub(crate) struct TraceCache {
    idle: bool,
    top: Dbref,
    lines: Vec<(Dbref, String, String)>,
    dropped: usize,
}

impl Default for TraceCache {
    fn default() -> Self {
        Self { idle: true, top: Dbref::NOTHING, lines: Vec::new(), dropped: 0 }
    }
}

impl TraceCache {
    /// Begin a traced evaluation; true for the outermost one
    pub(crate) fn enter(&mut self, executor: Dbref) -> bool {
        if !self.idle {
            return false;
        }
        self.idle = false;
        self.top = executor;
        self.lines.clear();
        self.dropped = 0;
        true
    }

    pub(crate) fn record(&mut self, executor: Dbref, before: &str, after: &str, limit: usize) {
        if before == after {
            return;
        }
        if self.lines.len() < limit {
            self.lines.push((executor, before.to_string(), after.to_string()));
        } else {
            self.dropped += 1;
        }
    }

    fn take(&mut self) -> (Dbref, Vec<(Dbref, String, String)>, usize) {
        self.idle = true;
        (self.top, mem::take(&mut self.lines), mem::take(&mut self.dropped))
    }
}

impl<W: World> Engine<W> {
    pub(super) fn flush_trace(&mut self) {
        let (top, lines, dropped) = self.trace.take();
        for (executor, before, after) in lines {
            let owner = self.world.owner(executor);
            let line = format!("{}(#{})}} '{}' -> '{}'", self.world.name(executor), executor.0, before, after);
            self.world.notify(owner, &line);
        }
        if dropped > 0 {
            debug!(executor = %top, dropped, "trace output truncated");
            let owner = self.world.owner(top);
            self.world.notify(owner, &format!("{} lines of trace output discarded.", dropped));
        }
    }
}
