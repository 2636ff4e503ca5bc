//! Free-form key/value metadata, never sent to the device

use crate::core::error::SceneResult;
use crate::ecs::component::Component;
use crate::foundation::ModifiedFlag;
use std::collections::BTreeMap;

/// Loader-provided descriptive entries
#[derive(Debug, Clone, Default)]
pub struct MetadataComponent {
    entries: BTreeMap<String, String>,
    modified: ModifiedFlag,
}

impl MetadataComponent {
    /// Component holding `entries`
    pub fn new<K: Into<String>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            modified: ModifiedFlag::modified(),
        }
    }

    /// Value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set an entry, returning whether its value changed
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        if let Some(current) = self.entries.get_mut(&key) {
            return self.modified.update(current, value);
        }
        self.entries.insert(key, value);
        self.modified.set_modified();
        true
    }

    /// All entries in key order
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl Component for MetadataComponent {
    fn on_commit(&mut self) -> SceneResult<bool> {
        Ok(self.modified.take())
    }

    fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self
                .entries
                .iter()
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
    }
}
