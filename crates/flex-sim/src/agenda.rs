//! Events scheduled for future time steps

use std::cmp::Reverse;
use std::collections::HashMap;

use gridflex_core::{Event, TimeCount};
use priority_queue::PriorityQueue;

/// Time-ordered queue of pending events
///
/// Events due at the same time come out in the order they were scheduled.
#[derive(Debug, Default)]
pub struct Agenda {
    queue: PriorityQueue<u64, Reverse<(TimeCount, u64)>>,
    events: HashMap<u64, Event>,
    next_seq: u64,
}

impl Agenda {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to be posted at time `at`
    pub fn schedule(&mut self, at: TimeCount, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.insert(seq, event);
        self.queue.push(seq, Reverse((at, seq)));
    }

    /// Remove and return every event due at or before `now`
    pub fn pop_due(&mut self, now: TimeCount) -> Vec<Event> {
        let mut due = Vec::new();
        while let Some((_, Reverse((at, _)))) = self.queue.peek() {
            if *at > now {
                break;
            }
            if let Some((seq, _)) = self.queue.pop() {
                if let Some(event) = self.events.remove(&seq) {
                    due.push(event);
                }
            }
        }
        due
    }

    /// Due time of the earliest pending event
    pub fn next_due(&self) -> Option<TimeCount> {
        self.queue.peek().map(|(_, Reverse((at, _)))| *at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
