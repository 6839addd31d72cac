//! Slide scroller navigation: indicator dots, arrow keys, scroll sync.
//!
//! The recorded active index only changes when the scroll position settles
//! (trailing debounce). `next`/`prev` step from that recorded index, so during
//! an in-flight scroll they can step from a slide that is no longer on screen.

#[cfg(test)]
#[path = "nav_test.rs"]
mod nav_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::dom::{CLASS_ACTIVE, ListenOptions, ListenTarget, Page};
use crate::error::PageError;
use crate::sched::Debounce;

/// Active-dot change produced by a settled scroll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DotChange {
    pub previous: usize,
    pub current: usize,
}

/// Recorded active slide, derived from scroll offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlideTracker {
    slide_count: usize,
    active: usize,
}

impl SlideTracker {
    #[must_use]
    pub fn new(slide_count: usize) -> Self {
        Self { slide_count, active: 0 }
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// `index` if it names a slide.
    #[must_use]
    pub fn target(&self, index: usize) -> Option<usize> {
        (index < self.slide_count).then_some(index)
    }

    #[must_use]
    pub fn next_index(&self) -> Option<usize> {
        self.target((self.active + 1).min(self.slide_count.saturating_sub(1)))
    }

    #[must_use]
    pub fn prev_index(&self) -> Option<usize> {
        self.target(self.active.saturating_sub(1))
    }

    /// Nearest slide for a horizontal offset, clamped to the valid range.
    ///
    /// `None` when there are no slides or the width is unusable.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn index_for_offset(&self, scroll_left: f64, slide_width: f64) -> Option<usize> {
        if self.slide_count == 0 || !slide_width.is_finite() || slide_width <= 0.0 || !scroll_left.is_finite() {
            return None;
        }
        let last = (self.slide_count - 1) as f64;
        let index = (scroll_left / slide_width).round().clamp(0.0, last);
        Some(index as usize)
    }

    /// Record the slide for `scroll_left`, reporting a change if it moved.
    pub fn update(&mut self, scroll_left: f64, slide_width: f64) -> Option<DotChange> {
        let current = self.index_for_offset(scroll_left, slide_width)?;
        if current == self.active {
            return None;
        }
        let previous = std::mem::replace(&mut self.active, current);
        Some(DotChange { previous, current })
    }
}

struct NavInner<P: Page> {
    page: Rc<P>,
    container: P::Element,
    dots: Vec<P::Element>,
    slides: Vec<P::Element>,
    tracker: RefCell<SlideTracker>,
    settle: Debounce<P>,
    armed: Cell<bool>,
}

impl<P: Page> NavInner<P> {
    fn go_to(&self, index: usize) {
        let Some(index) = self.tracker.borrow().target(index) else {
            return;
        };
        let (left, top) = self
            .page
            .offset_within(&self.container, &self.slides[index]);
        self.page
            .scroll_container_to(&self.container, left, top);
    }

    fn update_active_dot(&self) {
        let Some(first) = self.slides.first() else {
            return;
        };
        let scroll_left = self.page.scroll_left(&self.container);
        let width = self.page.offset_width(first);
        let change = self.tracker.borrow_mut().update(scroll_left, width);
        if let Some(change) = change {
            log::debug!("slide {} -> {}", change.previous, change.current);
            self.mark_active(change.current);
        }
    }

    fn mark_active(&self, active: usize) {
        for (idx, dot) in self.dots.iter().enumerate() {
            self.page.set_class(dot, CLASS_ACTIVE, idx == active);
        }
    }
}

pub struct NavigationController<P: Page> {
    inner: Rc<NavInner<P>>,
}

impl<P: Page> NavigationController<P> {
    /// Wire dots, arrow keys, and scroll sync. `dots[i]` indicates `slides[i]`.
    pub fn attach(
        page: &Rc<P>,
        container: P::Element,
        dots: Vec<P::Element>,
        slides: Vec<P::Element>,
        settle_ms: u32,
    ) -> Result<Self, PageError> {
        let inner = Rc::new(NavInner {
            page: Rc::clone(page),
            container,
            tracker: RefCell::new(SlideTracker::new(slides.len())),
            dots,
            slides,
            settle: Debounce::new(Rc::clone(page), settle_ms),
            armed: Cell::new(false),
        });
        inner.mark_active(inner.tracker.borrow().active());

        for (idx, dot) in inner.dots.iter().enumerate() {
            let on_dot = Rc::clone(&inner);
            page.listen(
                ListenTarget::Element(dot),
                "click",
                ListenOptions::default(),
                Box::new(move |_event| {
                    if on_dot.armed.get() {
                        on_dot.go_to(idx);
                    }
                }),
            )?;
        }

        let on_key = Rc::clone(&inner);
        page.listen(
            ListenTarget::Document,
            "keydown",
            ListenOptions::default(),
            Box::new(move |event| {
                if !on_key.armed.get() {
                    return;
                }
                let target = match event.key() {
                    Some("ArrowRight") => on_key.tracker.borrow().next_index(),
                    Some("ArrowLeft") => on_key.tracker.borrow().prev_index(),
                    _ => None,
                };
                if let Some(index) = target {
                    on_key.go_to(index);
                }
            }),
        )?;

        let on_scroll = Rc::clone(&inner);
        page.listen(
            ListenTarget::Element(&inner.container),
            "scroll",
            ListenOptions::PASSIVE,
            Box::new(move |_event| {
                if !on_scroll.armed.get() {
                    return;
                }
                let settled = Rc::clone(&on_scroll);
                on_scroll
                    .settle
                    .trigger(move || settled.update_active_dot());
            }),
        )?;

        inner.armed.set(true);
        Ok(Self { inner })
    }

    /// Scroll to slide `index`; out-of-range indices are ignored.
    pub fn go_to_slide(&self, index: usize) {
        self.inner.go_to(index);
    }

    pub fn next_slide(&self) {
        let next = self.inner.tracker.borrow().next_index();
        if let Some(index) = next {
            self.inner.go_to(index);
        }
    }

    pub fn prev_slide(&self) {
        let prev = self.inner.tracker.borrow().prev_index();
        if let Some(index) = prev {
            self.inner.go_to(index);
        }
    }

    /// Recompute the active dot from the current scroll offset.
    pub fn update_active_dot(&self) {
        self.inner.update_active_dot();
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.inner.tracker.borrow().active()
    }

    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.inner.slides.len()
    }
}
