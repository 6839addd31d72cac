//! Host page port.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every component talks to the document through [`Page`]. The browser build
//! implements it over `web-sys`; unit tests implement it with an in-memory
//! page, a virtual clock, and manual frame pumps.
//!
//! Timer and frame requests hand back guards. Dropping a guard cancels the
//! pending callback, matching `gloo_timers::callback::Timeout`.

use crate::error::PageError;

pub const CLASS_HIDDEN: &str = "hidden";
pub const CLASS_VISIBLE: &str = "visible";
pub const CLASS_ACTIVE: &str = "active";

/// Where an event listener is registered.
#[derive(Debug)]
pub enum ListenTarget<'a, E> {
    Element(&'a E),
    Document,
    Window,
}

/// Listener registration flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenOptions {
    /// The handler never calls `prevent_default`, so the browser may keep
    /// scrolling and painting without waiting on it.
    pub passive: bool,
}

impl ListenOptions {
    pub const PASSIVE: Self = Self { passive: true };
}

/// Event as seen by a component handler.
///
/// Handlers record `prevent_default` / `stop_propagation` requests here and
/// the host applies them to the real event once the handler returns.
#[derive(Debug)]
pub struct PageEvent<E> {
    target: Option<E>,
    key: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl<E> PageEvent<E> {
    #[must_use]
    pub fn new(target: Option<E>, key: Option<String>) -> Self {
        Self { target, key, default_prevented: false, propagation_stopped: false }
    }

    /// Element the event was dispatched to, if it was an element.
    #[must_use]
    pub fn target(&self) -> Option<&E> {
        self.target.as_ref()
    }

    /// `KeyboardEvent.key` for keyboard events.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

pub type Handler<E> = Box<dyn FnMut(&mut PageEvent<E>)>;

/// The document, event loop, and frame clock a component runs against.
///
/// Selectors passed to `select_all` / `select_within` are limited to a single
/// `.class` or `[attribute]` term.
pub trait Page: 'static {
    type Element: Clone + 'static;
    /// Pending timeout; dropping it cancels the callback.
    type Timer: 'static;
    /// Pending animation frame; dropping it cancels the callback.
    type Frame: 'static;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
    fn select_all(&self, selector: &str) -> Vec<Self::Element>;
    fn select_within(&self, root: &Self::Element, selector: &str) -> Vec<Self::Element>;
    /// True when `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Element, node: &Self::Element) -> bool;
    fn text_content(&self, element: &Self::Element) -> Option<String>;

    fn is_checked(&self, element: &Self::Element) -> bool;
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn scroll_left(&self, element: &Self::Element) -> f64;
    fn offset_width(&self, element: &Self::Element) -> f64;
    /// Synchronous layout read so a following class change starts a transition.
    fn force_layout(&self, element: &Self::Element);

    fn set_style(&self, element: &Self::Element, property: &str, value: &str);
    fn set_class(&self, element: &Self::Element, class: &str, on: bool);
    /// Scroll offsets at which `element`'s start edges meet `container`'s.
    fn offset_within(&self, container: &Self::Element, element: &Self::Element) -> (f64, f64);
    /// Smooth-scroll `container` alone; ancestors and the viewport stay put.
    fn scroll_container_to(&self, container: &Self::Element, left: f64, top: f64);
    /// Begin fetching an image without tracking completion.
    fn preload_image(&self, src: &str);

    fn document_theme(&self) -> Option<String>;
    fn set_document_theme(&self, theme: &str);

    fn listen(
        &self,
        target: ListenTarget<'_, Self::Element>,
        event: &'static str,
        options: ListenOptions,
        handler: Handler<Self::Element>,
    ) -> Result<(), PageError>;

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Self::Timer;
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Self::Frame;
    /// Run `callback` when the page is idle, or soon after if idle callbacks
    /// are unavailable.
    fn when_idle(&self, callback: Box<dyn FnOnce()>);
}

/// CSS `url(...)` value for an image path.
#[must_use]
pub fn css_url(path: &str) -> String {
    format!("url('{path}')")
}
