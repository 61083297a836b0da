//! Listener registration and event delivery

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gridflex_core::Event;
use gridflex_ports::Listener;

/// Listener that ignores every event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopListener;

impl Listener for NoopListener {
    fn on_event(&mut self, _event: &Event) {}
}

/// Listener keeping a copy of every event it receives
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Vec<Event>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events of one type, in delivery order
    pub fn of_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.is(event_type))
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.of_type(event_type).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Listener for EventRecorder {
    fn on_event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}

/// Delivers events to registered listeners
///
/// The bus never owns its listeners: it keeps weak handles and drops a
/// registration as soon as the listener itself is gone.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Weak<RefCell<dyn Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; delivery follows registration order
    pub fn register<L: Listener + 'static>(&mut self, listener: &Rc<RefCell<L>>) {
        let listener: Rc<RefCell<dyn Listener>> = listener.clone();
        self.register_dyn(&listener);
    }

    pub fn register_dyn(&mut self, listener: &Rc<RefCell<dyn Listener>>) {
        self.listeners.push(Rc::downgrade(listener));
    }

    /// Deliver `event` to every live listener
    ///
    /// Returns the number of listeners that received it. A listener that is
    /// already borrowed (posting from inside its own callback) is skipped.
    pub fn post(&mut self, event: &Event) -> usize {
        self.listeners.retain(|l| l.strong_count() > 0);

        let mut delivered = 0;
        for weak in &self.listeners {
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    listener.on_event(event);
                    delivered += 1;
                }
                Err(_) => {
                    log::warn!("Listener busy, skipped {} event", event.event_type());
                }
            }
        }
        delivered
    }

    /// Number of live registrations
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().filter(|l| l.strong_count() > 0).count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
