//! Field store: the single owner of field values.
//!
//! Everything else in the engine is derived from what the store holds and
//! can be rebuilt from [`FieldStore::get_all_values`]. Setting a value never
//! validates or recalculates; the controller drives those steps.

use std::collections::HashMap;

use termsheet_model::{FieldKey, FieldSchema, FieldSnapshot, FieldValue, FormSchema};

use crate::error::StoreError;

/// A registered field and its live state.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub schema: FieldSchema,
    pub value: FieldValue,
    pub visible: bool,
    /// Label currently shown; differs from `schema.label` while a label
    /// rule applies.
    pub label: String,
}

impl FieldEntry {
    pub fn key(&self) -> &FieldKey {
        &self.schema.key
    }

    pub fn is_filled(&self) -> bool {
        !self.value.is_blank()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    entries: Vec<FieldEntry>,
    index: HashMap<FieldKey, usize>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every field of `schema` in layout order.
    pub fn from_schema(schema: &FormSchema) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for field in schema.fields() {
            store.register(field.clone())?;
        }
        Ok(store)
    }

    pub fn register(&mut self, schema: FieldSchema) -> Result<(), StoreError> {
        if self.index.contains_key(&schema.key) {
            return Err(StoreError::DuplicateField(schema.key.to_string()));
        }
        self.index.insert(schema.key.clone(), self.entries.len());
        self.entries.push(FieldEntry {
            value: schema.default.clone(),
            visible: true,
            label: schema.label.clone(),
            schema,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn field(&self, key: &str) -> Option<&FieldEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.field(key).map(|entry| &entry.value)
    }

    /// Write a value and return the previous one.
    pub fn set(&mut self, key: &str, value: FieldValue) -> Result<FieldValue, StoreError> {
        let entry = self.entry_mut(key)?;
        Ok(std::mem::replace(&mut entry.value, value))
    }

    /// Returns true when visibility actually changed.
    pub fn set_visible(&mut self, key: &str, visible: bool) -> Result<bool, StoreError> {
        let entry = self.entry_mut(key)?;
        let changed = entry.visible != visible;
        entry.visible = visible;
        Ok(changed)
    }

    /// Returns true when the displayed label actually changed.
    pub fn set_display_label(&mut self, key: &str, label: &str) -> Result<bool, StoreError> {
        let entry = self.entry_mut(key)?;
        if entry.label == label {
            return Ok(false);
        }
        entry.label = label.to_string();
        Ok(true)
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.field(key).is_some_and(|entry| entry.visible)
    }

    /// Keys of currently visible fields, in registration order.
    pub fn visible_keys(&self) -> Vec<FieldKey> {
        self.entries
            .iter()
            .filter(|entry| entry.visible)
            .map(|entry| entry.schema.key.clone())
            .collect()
    }

    /// Every registered field and its value, hidden fields included.
    pub fn get_all_values(&self) -> FieldSnapshot {
        self.entries
            .iter()
            .map(|entry| (entry.schema.key.clone(), entry.value.clone()))
            .collect()
    }

    pub fn has_any_value(&self) -> bool {
        self.entries.iter().any(FieldEntry::is_filled)
    }

    /// Restore every field to its declared default, visible, with its
    /// declared label.
    pub fn reset_to_defaults(&mut self) {
        for entry in &mut self.entries {
            entry.value = entry.schema.default.clone();
            entry.visible = true;
            entry.label.clone_from(&entry.schema.label);
        }
    }

    fn entry_mut(&mut self, key: &str) -> Result<&mut FieldEntry, StoreError> {
        match self.index.get(key) {
            Some(&i) => Ok(&mut self.entries[i]),
            None => Err(StoreError::UnknownField(key.to_string())),
        }
    }
}
