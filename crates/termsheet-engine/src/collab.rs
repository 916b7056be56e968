//! Collaborator contracts: the field view and document generators.
//!
//! Rendering and document packaging live outside the engine. The
//! controller talks to them only through these traits.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use termsheet_model::{FieldSchema, FieldSnapshot, FieldValue};

use crate::error::Result;
use crate::validate::ValidationSummary;

/// Opaque id of a widget created by a [`FieldView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldHandle(pub u32);

impl fmt::Display for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Input widgets for the form's fields.
pub trait FieldView {
    fn create_field(&mut self, field: &FieldSchema) -> FieldHandle;
    fn get_value(&self, handle: FieldHandle) -> FieldValue;
    fn set_value(&mut self, handle: FieldHandle, value: &FieldValue);
    fn set_visible(&mut self, handle: FieldHandle, visible: bool);
    fn set_label(&mut self, handle: FieldHandle, label: &str);
}

/// Widget state as a [`HeadlessView`] records it.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub key: String,
    pub value: FieldValue,
    pub visible: bool,
    pub label: String,
    pub readonly: bool,
}

/// View without a screen: records what would be displayed.
///
/// Clones share widgets, so a caller can inspect the view after handing
/// it to the controller.
#[derive(Debug, Clone, Default)]
pub struct HeadlessView {
    widgets: Rc<RefCell<BTreeMap<FieldHandle, Widget>>>,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn widget(&self, key: &str) -> Option<Widget> {
        self.widgets
            .borrow()
            .values()
            .find(|w| w.key == key)
            .cloned()
    }

    pub fn handle(&self, key: &str) -> Option<FieldHandle> {
        self.widgets
            .borrow()
            .iter()
            .find(|(_, w)| w.key == key)
            .map(|(h, _)| *h)
    }

    pub fn len(&self) -> usize {
        self.widgets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.borrow().is_empty()
    }

    fn update(&self, handle: FieldHandle, apply: impl FnOnce(&mut Widget)) {
        if let Some(widget) = self.widgets.borrow_mut().get_mut(&handle) {
            apply(widget);
        }
    }
}

impl FieldView for HeadlessView {
    fn create_field(&mut self, field: &FieldSchema) -> FieldHandle {
        let mut widgets = self.widgets.borrow_mut();
        let handle = FieldHandle(u32::try_from(widgets.len()).unwrap_or(u32::MAX));
        widgets.insert(
            handle,
            Widget {
                key: field.key.to_string(),
                value: field.default.clone(),
                visible: true,
                label: field.label.clone(),
                readonly: field.is_readonly(),
            },
        );
        handle
    }

    fn get_value(&self, handle: FieldHandle) -> FieldValue {
        self.widgets
            .borrow()
            .get(&handle)
            .map(|w| w.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&mut self, handle: FieldHandle, value: &FieldValue) {
        self.update(handle, |w| w.value = value.clone());
    }

    fn set_visible(&mut self, handle: FieldHandle, visible: bool) {
        self.update(handle, |w| w.visible = visible);
    }

    fn set_label(&mut self, handle: FieldHandle, label: &str) {
        self.update(handle, |w| w.label = label.to_string());
    }
}

/// A rendered document ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Turns a valid form into a document.
///
/// Only called once the form passed whole-form validation.
pub trait DocumentGenerator {
    fn generate(
        &mut self,
        values: &FieldSnapshot,
        validation: &ValidationSummary,
    ) -> Result<GeneratedDocument>;
}

/// Plain-text rendering of the filled fields, one `key: value` per line.
#[derive(Debug, Clone)]
pub struct TextDocument {
    title: String,
}

impl TextDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl DocumentGenerator for TextDocument {
    fn generate(
        &mut self,
        values: &FieldSnapshot,
        validation: &ValidationSummary,
    ) -> Result<GeneratedDocument> {
        let mut text = format!("{}\n", self.title);
        for (key, value) in values.iter().filter(|(_, v)| !v.is_blank()) {
            text.push_str(&format!("{key}: {value}\n"));
        }
        for warning in &validation.warnings {
            text.push_str(&format!("* {warning}\n"));
        }
        Ok(GeneratedDocument {
            file_name: format!("{}.txt", self.title),
            content: text.into_bytes(),
        })
    }
}
