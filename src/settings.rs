//! Per-instance settings store and delegation cache

use std::collections::HashMap;

use shell_types::Value;

use crate::session::SessionRef;

/// Current value of every setting, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsStore {
    values: Vec<(String, Value)>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(setting, _)| setting == name)
            .map(|(_, value)| value)
    }

    /// Insert or replace; returns the previous value
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        match self.values.iter_mut().find(|(setting, _)| setting == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.values.push((name.to_string(), value));
                None
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Sub-sessions memoised by delegate name
#[derive(Default)]
pub struct DelegationCache {
    sessions: HashMap<String, SessionRef>,
}

impl DelegationCache {
    pub fn get(&self, delegate: &str) -> Option<&SessionRef> {
        self.sessions.get(delegate)
    }

    pub fn insert(&mut self, delegate: &str, session: SessionRef) {
        self.sessions.insert(delegate.to_string(), session);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
