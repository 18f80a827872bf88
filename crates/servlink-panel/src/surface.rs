//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! The rendering surface seam.
//!
//! Everything above this trait manipulates the panel purely through element
//! references and class/text/style mutations, so the real frontend, the
//! journal surface in the binary and the recording surface in tests are
//! interchangeable.

use std::collections::BTreeMap;
use std::fmt;

/// Opaque handle to one element on the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(String);

impl ElementRef {
    /// Wrap an element identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying element identifier.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Mutation sink for the rendering surface.
///
/// Implementations must tolerate references to elements they do not know;
/// unknown targets are ignored, never an error.
pub trait Surface: Send {
    /// Add a class to an element.
    fn add_class(&mut self, element: &ElementRef, class: &str);
    /// Remove a class from an element.
    fn remove_class(&mut self, element: &ElementRef, class: &str);
    /// Replace the text content of an element.
    fn set_text(&mut self, element: &ElementRef, text: &str);
    /// Set an inline style property on an element.
    fn set_style(&mut self, element: &ElementRef, property: &str, value: &str);
    /// Set the current value of an input element.
    fn set_input_value(&mut self, element: &ElementRef, value: &str);

    /// Add or remove a class depending on `enabled`.
    fn set_class(&mut self, element: &ElementRef, class: &str, enabled: bool) {
        if enabled {
            self.add_class(element, class);
        } else {
            self.remove_class(element, class);
        }
    }
}

/// In-memory surface that tracks the state every mutation would produce.
///
/// Used by the binary as a fallback and by tests to assert on final element
/// state rather than on mutation call sequences.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    elements: BTreeMap<String, RecordedElement>,
}

/// Accumulated state of one element on a [`RecordingSurface`].
#[derive(Debug, Default, Clone)]
pub struct RecordedElement {
    /// Classes currently present.
    pub classes: Vec<String>,
    /// Last text content set.
    pub text: Option<String>,
    /// Last value per inline style property.
    pub styles: BTreeMap<String, String>,
    /// Last input value set.
    pub value: Option<String>,
}

impl RecordingSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    fn element_mut(&mut self, element: &ElementRef) -> &mut RecordedElement {
        self.elements.entry(element.id().to_string()).or_default()
    }

    /// Recorded state for an element, if anything touched it.
    pub fn element(&self, id: &str) -> Option<&RecordedElement> {
        self.elements.get(id)
    }

    /// Whether an element currently carries a class.
    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.elements
            .get(id)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    /// Last text set on an element.
    pub fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).and_then(|e| e.text.as_deref())
    }

    /// Last value set for a style property on an element.
    pub fn style(&self, id: &str, property: &str) -> Option<&str> {
        self.elements
            .get(id)
            .and_then(|e| e.styles.get(property))
            .map(String::as_str)
    }

    /// Last input value set on an element.
    pub fn input_value(&self, id: &str) -> Option<&str> {
        self.elements.get(id).and_then(|e| e.value.as_deref())
    }
}

impl Surface for RecordingSurface {
    fn add_class(&mut self, element: &ElementRef, class: &str) {
        let entry = self.element_mut(element);
        if !entry.classes.iter().any(|c| c == class) {
            entry.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, element: &ElementRef, class: &str) {
        self.element_mut(element).classes.retain(|c| c != class);
    }

    fn set_text(&mut self, element: &ElementRef, text: &str) {
        self.element_mut(element).text = Some(text.to_string());
    }

    fn set_style(&mut self, element: &ElementRef, property: &str, value: &str) {
        self.element_mut(element)
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn set_input_value(&mut self, element: &ElementRef, value: &str) {
        self.element_mut(element).value = Some(value.to_string());
    }
}
