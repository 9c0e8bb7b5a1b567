//! Priority queue over commands: `BinaryHeap<(Reverse(priority),
//! Reverse(insertion_seq), Command)>` ordering, giving strict priority
//! order with FIFO tie-breaking (spec §4.8 rule 3).

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::command::Command;

struct QueueEntry {
    priority: i32,
    seq: u64,
    command: Command,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    /// Smallest `priority` first, earliest `seq` first among ties — a max-heap
    /// pops the largest element, so both fields are compared in reverse.
    fn cmp(&self, other: &Self) -> Ordering {
        Reverse((self.priority, self.seq)).cmp(&Reverse((other.priority, other.seq)))
    }
}

#[derive(Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        let priority = command.effective_priority();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueueEntry { priority, seq, command });
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.heap.pop().map(|e| e.command)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandType;

    fn cmd(id: &str, ty: CommandType) -> Command {
        Command {
            correlation_id: id.to_string(),
            command_type: ty,
            payload: serde_json::Value::Null,
            timestamp: 0,
            priority: None,
        }
    }

    #[test]
    fn s5_pause_processed_before_lower_priority_force_backfill() {
        let mut q = PriorityQueue::new();
        q.push(cmd("a", CommandType::ForceBackfill));
        q.push(cmd("b", CommandType::Pause));

        assert_eq!(q.pop().unwrap().correlation_id, "b");
        assert_eq!(q.pop().unwrap().correlation_id, "a");
    }

    #[test]
    fn ties_broken_by_insertion_order() {
        let mut q = PriorityQueue::new();
        q.push(cmd("first", CommandType::AddSymbol));
        q.push(cmd("second", CommandType::RemoveSymbol));

        assert_eq!(q.pop().unwrap().correlation_id, "first");
        assert_eq!(q.pop().unwrap().correlation_id, "second");
    }
}
