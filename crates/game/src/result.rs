use std::fmt::Debug;

use gridflex_ports::Writable;
use serde::{Deserialize, Serialize};

/// Results of a game with an ordered key/value description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult<T> {
    description: Vec<(String, String)>,
    results: T,
}

impl<T> GameResult<T> {
    /// Result without description
    pub fn create(results: T) -> Self {
        Self {
            description: Vec::new(),
            results,
        }
    }

    /// Copy with `key` set to `value`
    ///
    /// An existing key keeps its position; a new key goes last.
    pub fn with_description(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.description.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.description.push((key, value)),
        }
        self
    }

    pub fn description(&self) -> &[(String, String)] {
        &self.description
    }

    /// Value of one description key
    pub fn describe(&self, key: &str) -> Option<&str> {
        self.description
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn results(&self) -> &T {
        &self.results
    }

    pub fn into_results(self) -> T {
        self.results
    }
}

impl<T: Debug> Writable for GameResult<T> {
    fn format_result(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.description {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        out.push_str(&format!("results: {:?}\n", self.results));
        out
    }
}
