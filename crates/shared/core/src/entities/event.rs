//! Simulation events
//!
//! An event is a type tag plus an attribute map. Events are plain values:
//! once built and posted they are never changed, attaching an attribute
//! consumes the event and returns a new one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute key reserved for the event type pseudo-attribute
pub const RESERVED_TYPE_KEY: &str = "type";

/// Event types posted by the simulation kernel
pub mod event_types {
    pub const SIMULATION_STARTED: &str = "simulation:started";
    pub const SIMULATION_STOPPED: &str = "simulation:stopped";
    pub const CLOCK_TICK: &str = "clock:tick";
    pub const FLEX_ACTIVATION: &str = "flex:activation";
    pub const MARKET_SETTLEMENT: &str = "market:settlement";

    /// Every type the kernel may post during a replication
    pub const KERNEL: [&str; 5] = [
        SIMULATION_STARTED,
        SIMULATION_STOPPED,
        CLOCK_TICK,
        FLEX_ACTIVATION,
        MARKET_SETTLEMENT,
    ];
}

/// Attribute keys used by kernel events
pub mod attributes {
    pub const CLOCKTIME: &str = "clocktime";
    pub const PROVIDER: &str = "provider";
    pub const SLOT: &str = "slot";
    pub const VOLUME: &str = "volume";
    pub const REQUESTED: &str = "requested";
    pub const DELIVERED: &str = "delivered";
    pub const REWARD_SHARE: &str = "reward_share";
    pub const PENALTY: &str = "penalty";
}

/// Attribute value carried by an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i64> for EventValue {
    fn from(v: i64) -> Self {
        EventValue::Int(v)
    }
}

impl From<u32> for EventValue {
    fn from(v: u32) -> Self {
        EventValue::Int(i64::from(v))
    }
}

impl From<u64> for EventValue {
    fn from(v: u64) -> Self {
        EventValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for EventValue {
    fn from(v: usize) -> Self {
        EventValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for EventValue {
    fn from(v: f64) -> Self {
        EventValue::Float(v)
    }
}

impl From<bool> for EventValue {
    fn from(v: bool) -> Self {
        EventValue::Bool(v)
    }
}

impl From<&str> for EventValue {
    fn from(v: &str) -> Self {
        EventValue::Text(v.to_string())
    }
}

impl From<String> for EventValue {
    fn from(v: String) -> Self {
        EventValue::Text(v)
    }
}

impl std::fmt::Display for EventValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventValue::Int(v) => write!(f, "{}", v),
            EventValue::Float(v) => write!(f, "{}", v),
            EventValue::Text(v) => write!(f, "{}", v),
            EventValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// A typed simulation event
///
/// Prefer building events through the simulation's event factory, which
/// rejects unregistered types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    event_type: String,
    attributes: BTreeMap<String, EventValue>,
}

impl Event {
    /// Create an event with an empty payload
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// The type tag of this event
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Check the type tag
    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }

    /// Return a new event with one more attribute
    ///
    /// Setting an existing key replaces its value. The `type` key is reserved.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<EventValue>,
    ) -> Result<Self, &'static str> {
        let key = key.into();
        if key == RESERVED_TYPE_KEY {
            return Err("Attribute with key 'type' not allowed");
        }
        self.attributes.insert(key, value.into());
        Ok(self)
    }

    pub fn attribute(&self, key: &str) -> Option<&EventValue> {
        self.attributes.get(key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Integer attribute, `None` if missing or not an integer
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.attributes.get(key) {
            Some(EventValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Numeric attribute; integers are widened to floats
    pub fn float(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key) {
            Some(EventValue::Float(v)) => Some(*v),
            Some(EventValue::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(EventValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.attributes.get(key) {
            Some(EventValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Number of payload attributes (the type pseudo-attribute excluded)
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Copy of all attributes including the `type` pseudo-attribute
    pub fn attributes(&self) -> BTreeMap<String, EventValue> {
        let mut copy = self.attributes.clone();
        copy.insert(
            RESERVED_TYPE_KEY.to_string(),
            EventValue::Text(self.event_type.clone()),
        );
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_has_empty_payload() {
        let event = Event::new("foo:bar");
        assert_eq!(event.event_type(), "foo:bar");
        assert!(event.is("foo:bar"));
        assert_eq!(event.attribute_count(), 0);
    }

    #[test]
    fn test_with_attribute() {
        let event = Event::new("test:event")
            .with_attribute("number", 1i64)
            .unwrap()
            .with_attribute("string", "foo")
            .unwrap()
            .with_attribute("boolean", true)
            .unwrap()
            .with_attribute("ratio", 0.5)
            .unwrap();

        assert_eq!(event.int("number"), Some(1));
        assert_eq!(event.float("number"), Some(1.0));
        assert_eq!(event.text("string"), Some("foo"));
        assert_eq!(event.bool("boolean"), Some(true));
        assert_eq!(event.float("ratio"), Some(0.5));

        // Wrong variant or missing key
        assert_eq!(event.int("string"), None);
        assert_eq!(event.text("number"), None);
        assert!(!event.has_attribute("numbr"));
    }

    #[test]
    fn test_type_key_is_reserved() {
        let result = Event::new("test:event").with_attribute("type", "other:type");
        assert!(result.is_err());
    }

    #[test]
    fn test_replacing_attribute() {
        let event = Event::new("test:event")
            .with_attribute("k", 1i64)
            .unwrap()
            .with_attribute("k", 5i64)
            .unwrap();
        assert_eq!(event.int("k"), Some(5));
        assert_eq!(event.attribute_count(), 1);
    }

    #[test]
    fn test_attributes_include_type() {
        let mut event = Event::new("test:event");
        for i in 0..5i64 {
            event = event.with_attribute(i.to_string(), i).unwrap();
        }

        let attributes = event.attributes();
        assert_eq!(attributes.len(), 6);
        assert_eq!(
            attributes.get("type"),
            Some(&EventValue::Text("test:event".to_string()))
        );
        // The copy is detached from the event
        assert_eq!(event.attribute_count(), 5);
    }
}
