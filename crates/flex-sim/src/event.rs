//! Event type registry
//!
//! Every event posted during a run is built here, so a misspelled type
//! surfaces as an error instead of an event nobody listens to.

use std::collections::BTreeSet;

use gridflex_core::{Event, event_types};
use gridflex_ports::{KernelError, KernelResult};

/// Builds events of registered types
#[derive(Debug, Clone, Default)]
pub struct EventFactory {
    registered: BTreeSet<String>,
}

impl EventFactory {
    /// Factory without any registered type
    pub fn empty() -> Self {
        Self::default()
    }

    /// Factory knowing every kernel event type
    pub fn standard() -> Self {
        let mut factory = Self::empty();
        for event_type in event_types::KERNEL {
            factory.register(event_type);
        }
        factory
    }

    /// Register an additional event type; registering twice is a no-op
    pub fn register(&mut self, event_type: impl Into<String>) {
        self.registered.insert(event_type.into());
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.registered.contains(event_type)
    }

    /// Build an event with an empty payload
    pub fn build(&self, event_type: &str) -> KernelResult<Event> {
        if !self.is_registered(event_type) {
            return Err(KernelError::UnknownEventType(event_type.to_string()));
        }
        Ok(Event::new(event_type))
    }

    /// Check a set of types up front, failing on the first unknown one
    pub fn ensure_registered<I, S>(&self, event_types: I) -> KernelResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for event_type in event_types {
            let event_type = event_type.as_ref();
            if !self.is_registered(event_type) {
                return Err(KernelError::UnknownEventType(event_type.to_string()));
            }
        }
        Ok(())
    }

    /// Registered types in sorted order
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(String::as_str)
    }
}
