//! Zone overlay toggles.
//!
//! Each zone owns two overlay layers (lighting and airflow), each paired with
//! a checkbox. Element ids follow `{kind}-zone{N}-{layer|toggle}`. The zone
//! number is passed in at construction and never recovered from an id.

#[cfg(test)]
#[path = "zone_test.rs"]
mod zone_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::config::PageConfig;
use crate::dom::{ListenOptions, ListenTarget, Page, css_url};
use crate::error::PageError;
use crate::sched::FrameScheduler;

/// Overlay kind within a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Light,
    Airflow,
}

impl LayerKind {
    pub const ALL: [Self; 2] = [Self::Light, Self::Airflow];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Airflow => "airflow",
        }
    }
}

/// `light-zone3-layer`
#[must_use]
pub fn layer_id(kind: LayerKind, zone: u32) -> String {
    format!("{}-zone{zone}-layer", kind.as_str())
}

/// `light-zone3-toggle`
#[must_use]
pub fn toggle_id(kind: LayerKind, zone: u32) -> String {
    format!("{}-zone{zone}-toggle", kind.as_str())
}

#[must_use]
pub fn opacity(visible: bool) -> &'static str {
    if visible { "1" } else { "0" }
}

struct ZoneLayer<P: Page> {
    page: Rc<P>,
    kind: LayerKind,
    layer: P::Element,
    toggle: P::Element,
    frames: FrameScheduler<P>,
    /// Shared by both layers of a zone; set once the whole zone is wired.
    armed: Rc<Cell<bool>>,
}

impl<P: Page> ZoneLayer<P> {
    /// Copy the checkbox state onto the layer.
    fn sync(&self) {
        let visible = self.page.is_checked(&self.toggle);
        self.page
            .set_style(&self.layer, "opacity", opacity(visible));
    }

    fn schedule_sync(self: &Rc<Self>) {
        if !self.armed.get() {
            return;
        }
        let this = Rc::clone(self);
        self.frames.schedule(move || this.sync());
    }
}

pub struct ZoneController<P: Page> {
    index: u32,
    layers: Vec<Rc<ZoneLayer<P>>>,
}

impl<P: Page> ZoneController<P> {
    /// Wire zone `index` if all four of its elements exist.
    ///
    /// Returns `Ok(None)` when any element is missing; nothing is touched in
    /// that case.
    pub fn attach(page: &Rc<P>, config: &PageConfig, index: u32) -> Result<Option<Self>, PageError> {
        let mut found = Vec::with_capacity(LayerKind::ALL.len());
        for kind in LayerKind::ALL {
            let layer = page.element_by_id(&layer_id(kind, index));
            let toggle = page.element_by_id(&toggle_id(kind, index));
            let (Some(layer), Some(toggle)) = (layer, toggle) else {
                log::debug!("zone {index}: {} elements missing, skipped", kind.as_str());
                return Ok(None);
            };
            found.push((kind, layer, toggle));
        }

        let armed = Rc::new(Cell::new(false));
        let mut layers = Vec::with_capacity(found.len());
        for (kind, layer, toggle) in found {
            let image = config.zone_image(kind, index);
            page.preload_image(&image);
            page.set_style(&layer, "background-image", &css_url(&image));

            let zone_layer = Rc::new(ZoneLayer {
                page: Rc::clone(page),
                kind,
                layer,
                toggle,
                frames: FrameScheduler::new(Rc::clone(page)),
                armed: Rc::clone(&armed),
            });
            zone_layer.sync();

            let on_change = Rc::clone(&zone_layer);
            page.listen(
                ListenTarget::Element(&zone_layer.toggle),
                "change",
                ListenOptions::PASSIVE,
                Box::new(move |_event| on_change.schedule_sync()),
            )?;
            layers.push(zone_layer);
        }

        armed.set(true);
        Ok(Some(Self { index, layers }))
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Current checkbox state for one overlay.
    #[must_use]
    pub fn is_visible(&self, kind: LayerKind) -> bool {
        self.layers
            .iter()
            .find(|layer| layer.kind == kind)
            .is_some_and(|layer| layer.page.is_checked(&layer.toggle))
    }
}
