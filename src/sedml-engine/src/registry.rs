// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use crate::resolve::EntityKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    /// set once a surviving curve refers to this entry
    pub referenced: bool,
}

/// Deduplicating accumulator of the variables seen while translating plots.
///
/// Entries keep first-insertion order and the first display name and kind
/// registered for an id. Every resolved channel is registered, but only
/// entries marked as referenced by a kept curve become data generators.
#[derive(Clone, Debug, Default)]
pub struct VariableRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns true if `id` was not registered before.
    pub fn register(&mut self, id: &str, name: &str, kind: EntityKind) -> bool {
        if self.index.contains_key(id) {
            return false;
        }
        self.index.insert(id.to_owned(), self.entries.len());
        self.entries.push(RegistryEntry {
            id: id.to_owned(),
            name: name.to_owned(),
            kind,
            referenced: false,
        });
        true
    }

    /// Marks a registered id as used by an output. Unknown ids are ignored.
    pub fn mark_referenced(&mut self, id: &str) {
        if let Some(&off) = self.index.get(id) {
            self.entries[off].referenced = true;
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.index.get(id).map(|&off| &self.entries[off])
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn referenced(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter().filter(|entry| entry.referenced)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[test]
fn test_register_first_writer_wins() {
    let mut registry = VariableRegistry::new();
    assert!(registry.register("A", "A", EntityKind::Species));
    assert!(!registry.register("A", "renamed", EntityKind::Parameter));
    assert!(registry.register("time", "Time", EntityKind::Time));

    assert_eq!(2, registry.len());
    let a = registry.get("A").unwrap();
    assert_eq!("A", a.name);
    assert_eq!(EntityKind::Species, a.kind);
    assert!(registry.contains("time"));
    assert!(!registry.contains("B"));
}

#[test]
fn test_insertion_order() {
    let mut registry = VariableRegistry::new();
    for id in ["c", "a", "b", "a", "c"] {
        registry.register(id, id, EntityKind::Parameter);
    }
    let ids: Vec<&str> = registry.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(vec!["c", "a", "b"], ids);
}

#[test]
fn test_referenced_entries() {
    let mut registry = VariableRegistry::new();
    registry.register("time", "Time", EntityKind::Time);
    registry.register("A", "A", EntityKind::Species);
    registry.register("B", "B", EntityKind::Species);
    registry.mark_referenced("B");
    registry.mark_referenced("time");
    registry.mark_referenced("not-registered");

    let ids: Vec<&str> = registry.referenced().map(|e| e.id.as_str()).collect();
    assert_eq!(vec!["time", "B"], ids);
    assert_eq!(3, registry.len());
}
