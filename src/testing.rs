//! In-memory page for unit tests.
//!
//! Elements live in a flat arena with parent links. Timers run on a virtual
//! clock advanced by [`FakePage::advance`]; frames and idle callbacks run only
//! when a test pumps them.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use crate::dom::{Handler, ListenOptions, ListenTarget, Page, PageEvent};
use crate::error::PageError;
use crate::settings::KeyValueStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FakeElement(usize);

#[derive(Default)]
struct Node {
    id: Option<String>,
    parent: Option<usize>,
    classes: BTreeSet<String>,
    attributes: HashMap<String, String>,
    styles: HashMap<String, String>,
    text: Option<String>,
    checked: bool,
    scroll_left: f64,
    offset_width: f64,
    left: f64,
    top: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Element(usize),
    Document,
    Window,
}

struct Listener {
    slot: Slot,
    event: &'static str,
    options: ListenOptions,
    handler: Rc<RefCell<Handler<FakeElement>>>,
}

struct Pending {
    due_ms: u64,
    seq: u64,
    cancelled: Rc<Cell<bool>>,
    callback: Box<dyn FnOnce()>,
}

/// Cancel-on-drop guard for fake timers and frames.
pub struct FakeGuard {
    cancelled: Rc<Cell<bool>>,
}

impl Drop for FakeGuard {
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}

#[derive(Default)]
pub struct FakePage {
    nodes: RefCell<Vec<Node>>,
    listeners: RefCell<Vec<Listener>>,
    timers: RefCell<Vec<Pending>>,
    frames: RefCell<Vec<Pending>>,
    idle: RefCell<Vec<Box<dyn FnOnce()>>>,
    now_ms: Cell<u64>,
    seq: Cell<u64>,
    theme: RefCell<Option<String>>,
    scroll_requests: RefCell<Vec<(FakeElement, f64, f64)>>,
    preloaded: RefCell<Vec<String>>,
    layout_reads: Cell<usize>,
    rejected_events: RefCell<HashSet<&'static str>>,
    listener_limit: Cell<Option<usize>>,
}

impl FakePage {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    // --- Building the document ---

    pub fn element(&self, id: &str) -> FakeElement {
        self.insert(Some(id), None)
    }

    pub fn child(&self, parent: FakeElement, id: Option<&str>) -> FakeElement {
        self.insert(id, Some(parent))
    }

    fn insert(&self, id: Option<&str>, parent: Option<FakeElement>) -> FakeElement {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Node { id: id.map(str::to_owned), parent: parent.map(|p| p.0), ..Node::default() });
        FakeElement(nodes.len() - 1)
    }

    pub fn add_class(&self, el: FakeElement, class: &str) {
        self.nodes.borrow_mut()[el.0].classes.insert(class.to_owned());
    }

    pub fn set_attribute(&self, el: FakeElement, name: &str, value: &str) {
        self.nodes.borrow_mut()[el.0]
            .attributes
            .insert(name.to_owned(), value.to_owned());
    }

    pub fn set_text(&self, el: FakeElement, text: &str) {
        self.nodes.borrow_mut()[el.0].text = Some(text.to_owned());
    }

    pub fn set_checked(&self, el: FakeElement, checked: bool) {
        self.nodes.borrow_mut()[el.0].checked = checked;
    }

    pub fn set_scroll_left(&self, el: FakeElement, x: f64) {
        self.nodes.borrow_mut()[el.0].scroll_left = x;
    }

    pub fn set_offset_width(&self, el: FakeElement, width: f64) {
        self.nodes.borrow_mut()[el.0].offset_width = width;
    }

    /// Layout position in page coordinates, unaffected by scrolling.
    pub fn set_position(&self, el: FakeElement, left: f64, top: f64) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[el.0].left = left;
        nodes[el.0].top = top;
    }

    /// Make `listen` fail for `event`.
    pub fn reject_listeners_for(&self, event: &'static str) {
        self.rejected_events.borrow_mut().insert(event);
    }

    /// Make every `listen` fail once `count` listeners are registered.
    pub fn fail_listeners_after(&self, count: usize) {
        self.listener_limit.set(Some(count));
    }

    // --- Inspection ---

    pub fn style(&self, el: FakeElement, property: &str) -> Option<String> {
        self.nodes.borrow()[el.0].styles.get(property).cloned()
    }

    pub fn has_class(&self, el: FakeElement, class: &str) -> bool {
        self.nodes.borrow()[el.0].classes.contains(class)
    }

    /// `(container, left, top)` for every `scroll_container_to` call.
    pub fn scroll_requests(&self) -> Vec<(FakeElement, f64, f64)> {
        self.scroll_requests.borrow().clone()
    }

    pub fn preloaded(&self) -> Vec<String> {
        self.preloaded.borrow().clone()
    }

    pub fn layout_reads(&self) -> usize {
        self.layout_reads.get()
    }

    pub fn listener_options(&self, el: FakeElement, event: &str) -> Vec<ListenOptions> {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.slot == Slot::Element(el.0) && l.event == event)
            .map(|l| l.options)
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers
            .borrow()
            .iter()
            .filter(|t| !t.cancelled.get())
            .count()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames
            .borrow()
            .iter()
            .filter(|f| !f.cancelled.get())
            .count()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    // --- Events ---

    /// Click `el`, bubbling through its ancestors, the document, and the window.
    pub fn click(&self, el: FakeElement) -> PageEvent<FakeElement> {
        let mut event = PageEvent::new(Some(el), None);
        self.dispatch(&self.bubble_path(el), "click", &mut event);
        event
    }

    pub fn change(&self, el: FakeElement) {
        let mut event = PageEvent::new(Some(el), None);
        self.dispatch(&self.bubble_path(el), "change", &mut event);
    }

    /// Toggle a checkbox the way a user would: flip it, then fire `change`.
    pub fn toggle(&self, el: FakeElement) {
        let checked = self.nodes.borrow()[el.0].checked;
        self.set_checked(el, !checked);
        self.change(el);
    }

    /// Scroll events do not bubble.
    pub fn scroll(&self, el: FakeElement) {
        let mut event = PageEvent::new(Some(el), None);
        self.dispatch(&[Slot::Element(el.0)], "scroll", &mut event);
    }

    pub fn scroll_to(&self, el: FakeElement, x: f64) {
        self.set_scroll_left(el, x);
        self.scroll(el);
    }

    pub fn key_down(&self, key: &str) -> PageEvent<FakeElement> {
        let mut event = PageEvent::new(None, Some(key.to_owned()));
        self.dispatch(&[Slot::Document, Slot::Window], "keydown", &mut event);
        event
    }

    pub fn resize(&self) {
        let mut event = PageEvent::new(None, None);
        self.dispatch(&[Slot::Window], "resize", &mut event);
    }

    fn bubble_path(&self, el: FakeElement) -> Vec<Slot> {
        let nodes = self.nodes.borrow();
        let mut path = Vec::new();
        let mut cursor = Some(el.0);
        while let Some(idx) = cursor {
            path.push(Slot::Element(idx));
            cursor = nodes[idx].parent;
        }
        path.push(Slot::Document);
        path.push(Slot::Window);
        path
    }

    fn dispatch(&self, path: &[Slot], name: &str, event: &mut PageEvent<FakeElement>) {
        for slot in path {
            let handlers = self
                .listeners
                .borrow()
                .iter()
                .filter(|l| l.slot == *slot && l.event == name)
                .map(|l| Rc::clone(&l.handler))
                .collect::<Vec<_>>();
            for handler in handlers {
                let mut handler = handler.borrow_mut();
                (&mut **handler)(event);
            }
            if event.propagation_stopped() {
                break;
            }
        }
    }

    // --- Clock ---

    /// Move the virtual clock forward, firing due timers in order.
    pub fn advance(&self, ms: u64) {
        let deadline = self.now_ms.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                timers.retain(|t| !t.cancelled.get());
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due_ms <= deadline)
                    .min_by_key(|(_, t)| (t.due_ms, t.seq))
                    .map(|(idx, _)| idx);
                due.map(|idx| timers.remove(idx))
            };
            let Some(timer) = next else {
                break;
            };
            self.now_ms.set(timer.due_ms);
            (timer.callback)();
        }
        self.now_ms.set(deadline);
    }

    /// Run every frame callback queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let queued = std::mem::take(&mut *self.frames.borrow_mut());
        let mut ran = 0;
        for frame in queued {
            if frame.cancelled.get() {
                continue;
            }
            (frame.callback)();
            ran += 1;
        }
        ran
    }

    pub fn run_idle(&self) -> usize {
        let queued = std::mem::take(&mut *self.idle.borrow_mut());
        let count = queued.len();
        for callback in queued {
            callback();
        }
        count
    }

    fn next_seq(&self) -> u64 {
        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        seq
    }

    fn pending(&self, due_ms: u64, callback: Box<dyn FnOnce()>) -> (Pending, FakeGuard) {
        let cancelled = Rc::new(Cell::new(false));
        let pending = Pending { due_ms, seq: self.next_seq(), cancelled: Rc::clone(&cancelled), callback };
        (pending, FakeGuard { cancelled })
    }

    fn matches(node: &Node, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.') {
            return node.classes.contains(class);
        }
        if let Some(attr) = selector
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return node.attributes.contains_key(attr);
        }
        false
    }

    fn is_descendant(nodes: &[Node], ancestor: usize, node: usize) -> bool {
        let mut cursor = Some(node);
        while let Some(idx) = cursor {
            if idx == ancestor {
                return true;
            }
            cursor = nodes[idx].parent;
        }
        false
    }
}

impl Page for FakePage {
    type Element = FakeElement;
    type Timer = FakeGuard;
    type Frame = FakeGuard;

    fn element_by_id(&self, id: &str) -> Option<FakeElement> {
        self.nodes
            .borrow()
            .iter()
            .position(|n| n.id.as_deref() == Some(id))
            .map(FakeElement)
    }

    fn select_all(&self, selector: &str) -> Vec<FakeElement> {
        self.nodes
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, n)| Self::matches(n, selector))
            .map(|(idx, _)| FakeElement(idx))
            .collect()
    }

    fn select_within(&self, root: &FakeElement, selector: &str) -> Vec<FakeElement> {
        let nodes = self.nodes.borrow();
        nodes
            .iter()
            .enumerate()
            .filter(|(idx, n)| *idx != root.0 && Self::is_descendant(&nodes, root.0, *idx) && Self::matches(n, selector))
            .map(|(idx, _)| FakeElement(idx))
            .collect()
    }

    fn contains(&self, ancestor: &FakeElement, node: &FakeElement) -> bool {
        Self::is_descendant(&self.nodes.borrow(), ancestor.0, node.0)
    }

    fn text_content(&self, element: &FakeElement) -> Option<String> {
        self.nodes.borrow()[element.0].text.clone()
    }

    fn is_checked(&self, element: &FakeElement) -> bool {
        self.nodes.borrow()[element.0].checked
    }

    fn attribute(&self, element: &FakeElement, name: &str) -> Option<String> {
        self.nodes.borrow()[element.0].attributes.get(name).cloned()
    }

    fn scroll_left(&self, element: &FakeElement) -> f64 {
        self.nodes.borrow()[element.0].scroll_left
    }

    fn offset_width(&self, element: &FakeElement) -> f64 {
        self.nodes.borrow()[element.0].offset_width
    }

    fn force_layout(&self, _element: &FakeElement) {
        self.layout_reads.set(self.layout_reads.get() + 1);
    }

    fn set_style(&self, element: &FakeElement, property: &str, value: &str) {
        self.nodes.borrow_mut()[element.0]
            .styles
            .insert(property.to_owned(), value.to_owned());
    }

    fn set_class(&self, element: &FakeElement, class: &str, on: bool) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[element.0].classes;
        if on {
            classes.insert(class.to_owned());
        } else {
            classes.remove(class);
        }
    }

    fn offset_within(&self, container: &FakeElement, element: &FakeElement) -> (f64, f64) {
        let nodes = self.nodes.borrow();
        let (outer, inner) = (&nodes[container.0], &nodes[element.0]);
        (inner.left - outer.left, inner.top - outer.top)
    }

    fn scroll_container_to(&self, container: &FakeElement, left: f64, top: f64) {
        self.scroll_requests
            .borrow_mut()
            .push((*container, left, top));
    }

    fn preload_image(&self, src: &str) {
        self.preloaded.borrow_mut().push(src.to_owned());
    }

    fn document_theme(&self) -> Option<String> {
        self.theme.borrow().clone()
    }

    fn set_document_theme(&self, theme: &str) {
        *self.theme.borrow_mut() = Some(theme.to_owned());
    }

    fn listen(
        &self,
        target: ListenTarget<'_, FakeElement>,
        event: &'static str,
        options: ListenOptions,
        handler: Handler<FakeElement>,
    ) -> Result<(), PageError> {
        let over_limit = self
            .listener_limit
            .get()
            .is_some_and(|limit| self.listeners.borrow().len() >= limit);
        if over_limit || self.rejected_events.borrow().contains(event) {
            return Err(PageError::Listen { event, message: "rejected by test page".into() });
        }
        let slot = match target {
            ListenTarget::Element(el) => Slot::Element(el.0),
            ListenTarget::Document => Slot::Document,
            ListenTarget::Window => Slot::Window,
        };
        self.listeners.borrow_mut().push(Listener { slot, event, options, handler: Rc::new(RefCell::new(handler)) });
        Ok(())
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> FakeGuard {
        let (pending, guard) = self.pending(self.now_ms.get() + u64::from(delay_ms), callback);
        self.timers.borrow_mut().push(pending);
        guard
    }

    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> FakeGuard {
        let (pending, guard) = self.pending(self.now_ms.get(), callback);
        self.frames.borrow_mut().push(pending);
        guard
    }

    fn when_idle(&self, callback: Box<dyn FnOnce()>) {
        self.idle.borrow_mut().push(callback);
    }
}

/// Store whose writes always fail, for persistence error paths.
#[derive(Default)]
pub struct RejectingStore;

impl KeyValueStore for RejectingStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), PageError> {
        Err(PageError::Storage("quota exceeded".into()))
    }
}
