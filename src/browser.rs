//! `web-sys` implementation of the page port, and the WASM entry point.
//!
//! Listener closures are leaked with `Closure::forget`: every listener lives
//! as long as the page. Timers use `gloo_timers::callback::Timeout`, whose
//! drop cancels the pending callback; animation frames get the same
//! cancel-on-drop guard here.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Element, EventTarget, HtmlElement, HtmlImageElement,
    HtmlInputElement, KeyboardEvent, Node, NodeList, ScrollBehavior, ScrollToOptions, Storage, Window,
};

use crate::bootstrap::{Presentation, boot, load_config};
use crate::config::DEFAULT_THEME_ATTRIBUTE;
use crate::dom::{Handler, ListenOptions, ListenTarget, Page, PageEvent};
use crate::error::PageError;
use crate::settings::{KeyValueStore, MemoryStore};

thread_local! {
    static PRESENTATION: RefCell<Option<Presentation<BrowserPage>>> = const { RefCell::new(None) };
}

fn js_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{value:?}")
}

fn elements(list: Result<NodeList, JsValue>, selector: &str) -> Vec<Element> {
    let list = match list {
        Ok(list) => list,
        Err(err) => {
            log::warn!("selector {selector} rejected: {}", js_message(&err));
            return Vec::new();
        }
    };
    (0..list.length())
        .filter_map(|idx| list.item(idx))
        .filter_map(|node| node.dyn_ref::<Element>().cloned())
        .collect()
}

/// Animation frame request; dropping it cancels the frame.
pub struct AnimationFrame {
    window: Window,
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for AnimationFrame {
    fn drop(&mut self) {
        if let Err(err) = self.window.cancel_animation_frame(self.id) {
            log::debug!("cancelAnimationFrame failed: {}", js_message(&err));
        }
    }
}

/// Pending frame work: a real animation frame, or a zero-delay timeout when
/// `requestAnimationFrame` is refused.
pub enum BrowserFrame {
    Animation(AnimationFrame),
    Fallback(Timeout),
}

pub struct BrowserPage {
    window: Window,
    document: Document,
    theme_attribute: String,
}

impl BrowserPage {
    pub fn from_global() -> Result<Self, PageError> {
        let window = web_sys::window().ok_or(PageError::MissingWindow)?;
        let document = window.document().ok_or(PageError::MissingDocument)?;
        Ok(Self { window, document, theme_attribute: DEFAULT_THEME_ATTRIBUTE.to_owned() })
    }

    /// Attribute on `<html>` that carries the active theme.
    #[must_use]
    pub fn with_theme_attribute(mut self, attribute: &str) -> Self {
        attribute.clone_into(&mut self.theme_attribute);
        self
    }

    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl Page for BrowserPage {
    type Element = Element;
    type Timer = Timeout;
    type Frame = BrowserFrame;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn select_all(&self, selector: &str) -> Vec<Element> {
        elements(self.document.query_selector_all(selector), selector)
    }

    fn select_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        elements(root.query_selector_all(selector), selector)
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &Node = node;
        ancestor.contains(Some(node))
    }

    fn text_content(&self, element: &Element) -> Option<String> {
        element.text_content()
    }

    fn is_checked(&self, element: &Element) -> bool {
        element
            .dyn_ref::<HtmlInputElement>()
            .is_some_and(HtmlInputElement::checked)
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn scroll_left(&self, element: &Element) -> f64 {
        match js_sys::Reflect::get(element, &JsValue::from_str("scrollLeft")) {
            Ok(value) => value.as_f64().unwrap_or(0.0),
            Err(err) => {
                log::debug!("scrollLeft unreadable: {}", js_message(&err));
                0.0
            }
        }
    }

    fn offset_width(&self, element: &Element) -> f64 {
        element
            .dyn_ref::<HtmlElement>()
            .map_or(0.0, |html| f64::from(html.offset_width()))
    }

    fn force_layout(&self, element: &Element) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            let width = html.offset_width();
            log::trace!("layout flushed ({width}px)");
        }
    }

    fn set_style(&self, element: &Element, property: &str, value: &str) {
        let Some(html) = element.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(err) = html.style().set_property(property, value) {
            log::debug!("style {property} not applied: {}", js_message(&err));
        }
    }

    fn set_class(&self, element: &Element, class: &str, on: bool) {
        if let Err(err) = element.class_list().toggle_with_force(class, on) {
            log::debug!("class {class} not toggled: {}", js_message(&err));
        }
    }

    fn offset_within(&self, container: &Element, element: &Element) -> (f64, f64) {
        let outer = container.get_bounding_client_rect();
        let inner = element.get_bounding_client_rect();
        let left = inner.left() - outer.left() - f64::from(container.client_left()) + self.scroll_left(container);
        let top = inner.top() - outer.top() - f64::from(container.client_top()) + f64::from(container.scroll_top());
        (left, top)
    }

    fn scroll_container_to(&self, container: &Element, left: f64, top: f64) {
        let options = ScrollToOptions::new();
        options.set_left(left);
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        container.scroll_to_with_scroll_to_options(&options);
    }

    fn preload_image(&self, src: &str) {
        match HtmlImageElement::new() {
            Ok(image) => image.set_src(src),
            Err(err) => log::debug!("preload {src} skipped: {}", js_message(&err)),
        }
    }

    fn document_theme(&self) -> Option<String> {
        self.document
            .document_element()
            .and_then(|root| root.get_attribute(&self.theme_attribute))
    }

    fn set_document_theme(&self, theme: &str) {
        let Some(root) = self.document.document_element() else {
            return;
        };
        if let Err(err) = root.set_attribute(&self.theme_attribute, theme) {
            log::warn!("theme attribute not set: {}", js_message(&err));
        }
    }

    fn listen(
        &self,
        target: ListenTarget<'_, Element>,
        event: &'static str,
        options: ListenOptions,
        mut handler: Handler<Element>,
    ) -> Result<(), PageError> {
        let event_target: EventTarget = match target {
            ListenTarget::Element(element) => element.clone().into(),
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Window => self.window.clone().into(),
        };

        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |raw: web_sys::Event| {
            let target = raw
                .target()
                .and_then(|target| target.dyn_ref::<Element>().cloned());
            let key = raw.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key);
            let mut page_event = PageEvent::new(target, key);
            handler(&mut page_event);
            if page_event.default_prevented() {
                raw.prevent_default();
            }
            if page_event.propagation_stopped() {
                raw.stop_propagation();
            }
        });

        let listen_options = AddEventListenerOptions::new();
        listen_options.set_passive(options.passive);
        event_target
            .add_event_listener_with_callback_and_add_event_listener_options(
                event,
                closure.as_ref().unchecked_ref(),
                &listen_options,
            )
            .map_err(|err| PageError::Listen { event, message: js_message(&err) })?;
        closure.forget();
        Ok(())
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(delay_ms, callback)
    }

    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> BrowserFrame {
        let slot = Rc::new(RefCell::new(Some(callback)));
        let run = {
            let slot = Rc::clone(&slot);
            move || {
                let callback = slot.borrow_mut().take();
                if let Some(callback) = callback {
                    callback();
                }
            }
        };
        let closure = Closure::<dyn FnMut()>::new(run);
        let requested = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref());
        match requested {
            Ok(id) => BrowserFrame::Animation(AnimationFrame { window: self.window.clone(), id, _callback: closure }),
            Err(err) => {
                log::debug!("requestAnimationFrame refused: {}", js_message(&err));
                BrowserFrame::Fallback(Timeout::new(0, move || {
                    let callback = slot.borrow_mut().take();
                    if let Some(callback) = callback {
                        callback();
                    }
                }))
            }
        }
    }

    fn when_idle(&self, callback: Box<dyn FnOnce()>) {
        let request_idle = js_sys::Reflect::get(&self.window, &JsValue::from_str("requestIdleCallback"))
            .map(|value| value.dyn_into::<js_sys::Function>());
        match request_idle {
            Ok(Ok(request_idle)) => {
                let callback = Closure::once_into_js(move || callback());
                if let Err(err) = request_idle.call1(&self.window, &callback) {
                    log::debug!("requestIdleCallback failed: {}", js_message(&err));
                }
            }
            _ => {
                Timeout::new(1, callback).forget();
            }
        }
    }
}

/// `localStorage`-backed key-value store.
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    pub fn open(window: &Window) -> Result<Self, PageError> {
        match window.local_storage() {
            Ok(Some(storage)) => Ok(Self { storage }),
            Ok(None) => Err(PageError::Storage("localStorage unavailable".into())),
            Err(err) => Err(PageError::Storage(js_message(&err))),
        }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log::debug!("localStorage read of {key} failed: {}", js_message(&err));
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PageError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| PageError::Storage(js_message(&err)))
    }
}

fn mount(page: BrowserPage) {
    let store: Rc<dyn KeyValueStore> = match LocalStore::open(page.window()) {
        Ok(store) => Rc::new(store),
        Err(err) => {
            log::warn!("{err}; theme choice will not survive reload");
            Rc::new(MemoryStore::new())
        }
    };
    let config = load_config(&page);
    let page = Rc::new(page.with_theme_attribute(&config.theme_attribute));
    let presentation = boot(page, store, config);
    PRESENTATION.with(|slot| *slot.borrow_mut() = Some(presentation));
}

/// Module entry: boot now, or once the DOM has been parsed.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"showroom: logger already installed".into());
    }

    let page = match BrowserPage::from_global() {
        Ok(page) => page,
        Err(err) => {
            log::warn!("showroom not started: {err}");
            return;
        }
    };

    if page.document.ready_state() != "loading" {
        mount(page);
        return;
    }
    let document = page.document.clone();
    let on_ready = Closure::once_into_js(move || mount(page));
    if let Err(err) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref()) {
        log::warn!("showroom not started: {}", js_message(&err));
    }
    log::info!("showroom waiting for DOMContentLoaded");
}
