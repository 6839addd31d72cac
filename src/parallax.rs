//! Decorative heading parallax driven by the slide scroller's offset.

#[cfg(test)]
#[path = "parallax_test.rs"]
mod parallax_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{ListenOptions, ListenTarget, Page};
use crate::error::PageError;
use crate::sched::FrameScheduler;

pub const MAX_TRANSLATE_PX: f64 = 40.0;
pub const MAX_ROTATE_DEG: f64 = 6.0;
pub const MAX_SCALE_BOOST: f64 = 0.06;

const TRANSLATE_DIVISOR: f64 = 30.0;
const ROTATE_DIVISOR: f64 = 200.0;
const SCALE_DIVISOR: f64 = 2000.0;

/// Heading pose for one scroll offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxPose {
    pub translate_x: f64,
    pub rotate_deg: f64,
    pub scale: f64,
}

impl ParallaxPose {
    #[must_use]
    pub fn at(scroll_x: f64) -> Self {
        let x = if scroll_x.is_finite() { scroll_x } else { 0.0 };
        Self {
            translate_x: (x / TRANSLATE_DIVISOR).clamp(-MAX_TRANSLATE_PX, MAX_TRANSLATE_PX),
            rotate_deg: (x / ROTATE_DIVISOR).clamp(-MAX_ROTATE_DEG, MAX_ROTATE_DEG),
            scale: 1.0 + (x.abs() / SCALE_DIVISOR).min(MAX_SCALE_BOOST),
        }
    }

    #[must_use]
    pub fn transform_css(&self) -> String {
        format!(
            "translateX({:.2}px) rotate({:.2}deg) scale({:.4})",
            self.translate_x, self.rotate_deg, self.scale
        )
    }

    /// Shadow falls opposite the drift so the heading appears lifted.
    #[must_use]
    pub fn shadow_css(&self) -> String {
        let offset_x = -self.translate_x / 4.0;
        let offset_y = 4.0 + self.rotate_deg.abs();
        format!("{offset_x:.2}px {offset_y:.2}px 18px rgba(0, 0, 0, 0.28)")
    }
}

struct ParallaxInner<P: Page> {
    page: Rc<P>,
    heading: P::Element,
    container: P::Element,
    frames: FrameScheduler<P>,
    /// Set once every listener is registered; handlers ignore events before.
    armed: Cell<bool>,
}

impl<P: Page> ParallaxInner<P> {
    fn render(&self) {
        let pose = ParallaxPose::at(self.page.scroll_left(&self.container));
        self.page
            .set_style(&self.heading, "transform", &pose.transform_css());
        self.page
            .set_style(&self.heading, "text-shadow", &pose.shadow_css());
    }

    fn schedule(self: &Rc<Self>) {
        if !self.armed.get() {
            return;
        }
        let this = Rc::clone(self);
        self.frames.schedule(move || this.render());
    }
}

/// Heading parallax. Inert when the scroller is not on the page.
pub struct ParallaxController<P: Page> {
    inner: Option<Rc<ParallaxInner<P>>>,
}

impl<P: Page> ParallaxController<P> {
    pub fn attach(page: &Rc<P>, heading: P::Element, scroller_id: &str) -> Result<Self, PageError> {
        let Some(container) = page.element_by_id(scroller_id) else {
            log::debug!("parallax: #{scroller_id} not on page");
            return Ok(Self { inner: None });
        };
        let inner = Rc::new(ParallaxInner {
            page: Rc::clone(page),
            heading,
            container,
            frames: FrameScheduler::new(Rc::clone(page)),
            armed: Cell::new(false),
        });

        let on_scroll = Rc::clone(&inner);
        page.listen(
            ListenTarget::Element(&inner.container),
            "scroll",
            ListenOptions::PASSIVE,
            Box::new(move |_event| on_scroll.schedule()),
        )?;
        let on_resize = Rc::clone(&inner);
        page.listen(
            ListenTarget::Window,
            "resize",
            ListenOptions::PASSIVE,
            Box::new(move |_event| on_resize.schedule()),
        )?;

        inner.armed.set(true);
        inner.render();
        Ok(Self { inner: Some(inner) })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    /// Pose for the current scroll offset, if the scroller exists.
    #[must_use]
    pub fn current_pose(&self) -> Option<ParallaxPose> {
        self.inner
            .as_ref()
            .map(|inner| ParallaxPose::at(inner.page.scroll_left(&inner.container)))
    }
}
