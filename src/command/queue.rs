//! Running queued commands

use tracing::debug;

use crate::dbref::Dbref;
use crate::eval::Engine;
use crate::world::{QueuedCommand, World};

impl<W: World> Engine<W> {
    /// Queue `text` to run later as `executor`, capturing the current registers
    pub(crate) fn queue_command(&mut self, executor: Dbref, caller: Dbref, enactor: Dbref, text: &str, args: &[String]) {
        self.world.enqueue(QueuedCommand {
            executor,
            caller,
            enactor,
            text: text.to_string(),
            args: args.to_vec(),
            registers: self.state.registers.clone(),
        });
    }

    /// Run up to `limits.queue_batch` queued entries. Returns how many ran.
    pub fn run_queue(&mut self) -> usize {
        let mut ran = 0;
        while ran < self.config.limits.queue_batch {
            let Some(entry) = self.world.dequeue() else {
                break;
            };
            ran += 1;
            self.run_entry(entry);
        }
        ran
    }

    /// Run the queue until it is empty or `rounds` batches have run
    pub fn drain_queue(&mut self, rounds: usize) -> usize {
        let mut total = 0;
        for _ in 0..rounds {
            let ran = self.run_queue();
            total += ran;
            if ran == 0 {
                break;
            }
        }
        total
    }

    fn run_entry(&mut self, entry: QueuedCommand) {
        if !self.world.is_valid(entry.executor) {
            debug!(executor = %entry.executor, "dropping queue entry for invalid object");
            return;
        }
        self.state.registers = entry.registers;
        for action in self.scanner().split_actions(&entry.text) {
            self.process_command(entry.executor, entry.caller, entry.enactor, false, &action, &entry.args);
        }
    }
}
