//! Process-wide theme settings.
//!
//! The active theme lives in two places that must agree: the document
//! `data-theme` attribute (drives CSS) and one persisted key-value entry
//! (survives reload). [`ThemeSettings`] is the only code that touches either.
//!
//! Access points:
//! - [`ThemeSettings::restore`]: read once at bootstrap, before any input.
//! - [`ThemeSettings::select`]: the single writer, called by the theme menu.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::Page;
use crate::error::PageError;

/// String key-value persistence (`localStorage` in the browser).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PageError>;
}

/// Non-persistent store, used when browser storage is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

pub struct ThemeSettings<P: Page> {
    page: Rc<P>,
    store: Rc<dyn KeyValueStore>,
    key: String,
}

impl<P: Page> ThemeSettings<P> {
    pub fn new(page: Rc<P>, store: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { page, store, key: key.into() }
    }

    /// Apply the persisted theme to the document, if one was saved.
    pub fn restore(&self) -> Option<String> {
        let theme = self.persisted()?;
        self.page.set_document_theme(&theme);
        log::debug!("restored theme {theme}");
        Some(theme)
    }

    /// Make `theme` active and persist it.
    ///
    /// The document attribute is applied even when the write fails, so the
    /// choice holds for this page view.
    pub fn select(&self, theme: &str) {
        self.page.set_document_theme(theme);
        if let Err(err) = self.store.set(&self.key, theme) {
            log::warn!("theme {theme} not persisted: {err}");
        }
    }

    /// Theme currently applied to the document.
    pub fn active(&self) -> Option<String> {
        self.page.document_theme()
    }

    pub fn persisted(&self) -> Option<String> {
        self.store.get(&self.key).filter(|theme| !theme.is_empty())
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}
