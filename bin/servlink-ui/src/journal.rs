//! ---
//! sl_section: "06-client"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Panel client entrypoint and surface wiring."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Journal surface: logs every mutation the real frontend would apply.
//!
//! Running headless this is the whole output of the client; a frontend
//! integration replaces it with a surface bound to real widgets.

use servlink_panel::{ElementRef, Surface};
use tracing::debug;

/// Surface that journals mutations through the tracing stack.
#[derive(Debug, Default)]
pub struct JournalSurface;

impl JournalSurface {
    pub fn new() -> Self {
        Self
    }
}

impl Surface for JournalSurface {
    fn add_class(&mut self, element: &ElementRef, class: &str) {
        debug!(element = %element, class, "add class");
    }

    fn remove_class(&mut self, element: &ElementRef, class: &str) {
        debug!(element = %element, class, "remove class");
    }

    fn set_text(&mut self, element: &ElementRef, text: &str) {
        debug!(element = %element, text, "set text");
    }

    fn set_style(&mut self, element: &ElementRef, property: &str, value: &str) {
        debug!(element = %element, property, value, "set style");
    }

    fn set_input_value(&mut self, element: &ElementRef, value: &str) {
        debug!(element = %element, value, "set input value");
    }
}
