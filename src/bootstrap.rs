//! Page startup sequence.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs once when the DOM is ready. Each feature checks its own elements and
//! is wired independently: a missing element skips that feature, and a setup
//! error is logged without stopping the features after it.
//!
//! Order: static layers, persisted theme, zones, theme menu, navigation,
//! parallax, then an idle-time readiness log.

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;

use std::rc::Rc;

use crate::config::{CONFIG_ELEMENT_ID, PageConfig};
use crate::dom::Page;
use crate::error::PageError;
use crate::layers::paint_static_layers;
use crate::nav::NavigationController;
use crate::parallax::ParallaxController;
use crate::settings::{KeyValueStore, ThemeSettings};
use crate::theme::ThemeManager;
use crate::zone::ZoneController;

/// Controllers created at startup. Dropping this does not unwire listeners;
/// the page keeps them alive.
pub struct Presentation<P: Page> {
    pub config: PageConfig,
    pub settings: Rc<ThemeSettings<P>>,
    pub static_layers: usize,
    pub zones: Vec<ZoneController<P>>,
    pub theme: Option<ThemeManager<P>>,
    pub navigation: Option<NavigationController<P>>,
    pub parallax: Option<ParallaxController<P>>,
}

/// Read the inline JSON config, falling back to defaults.
pub fn load_config<P: Page>(page: &P) -> PageConfig {
    let Some(raw) = page
        .element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| page.text_content(&el))
        .filter(|raw| !raw.trim().is_empty())
    else {
        return PageConfig::default();
    };
    match PageConfig::from_json(&raw) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("ignoring #{CONFIG_ELEMENT_ID}: {err}");
            PageConfig::default()
        }
    }
}

pub fn boot<P: Page>(page: Rc<P>, store: Rc<dyn KeyValueStore>, config: PageConfig) -> Presentation<P> {
    let static_layers = paint_static_layers(&*page, &config.static_layers);

    let settings = Rc::new(ThemeSettings::new(Rc::clone(&page), store, config.theme_storage_key.clone()));
    settings.restore();

    let mut zones = Vec::new();
    for index in 1..=config.zone_count {
        match ZoneController::attach(&page, &config, index) {
            Ok(Some(zone)) => zones.push(zone),
            Ok(None) => {}
            Err(err) => log::warn!("zone {index} disabled: {err}"),
        }
    }

    let theme = attach_theme(&page, &settings, &config);
    let navigation = attach_navigation(&page, &config);
    let parallax = attach_parallax(&page, &config);

    let zone_count = zones.len();
    page.when_idle(Box::new(move || {
        log::info!("presentation ready: {static_layers} layers, {zone_count} zones");
    }));

    Presentation { config, settings, static_layers, zones, theme, navigation, parallax }
}

fn attach_theme<P: Page>(page: &Rc<P>, settings: &Rc<ThemeSettings<P>>, config: &PageConfig) -> Option<ThemeManager<P>> {
    let trigger = page.element_by_id(&config.profile_trigger_id)?;
    let menu = page.element_by_id(&config.profile_menu_id)?;
    contained("theme menu", ThemeManager::attach(page, trigger, menu, Rc::clone(settings), config))
}

fn attach_navigation<P: Page>(page: &Rc<P>, config: &PageConfig) -> Option<NavigationController<P>> {
    let container = page.element_by_id(&config.scroller_id)?;
    let slides = page.select_all(&config.slide_selector);
    if slides.is_empty() {
        log::debug!("navigation: no slides match {}", config.slide_selector);
        return None;
    }
    let dots = page.select_all(&config.dot_selector);
    contained("navigation", NavigationController::attach(page, container, dots, slides, config.scroll_settle_ms))
}

fn attach_parallax<P: Page>(page: &Rc<P>, config: &PageConfig) -> Option<ParallaxController<P>> {
    let heading = page.element_by_id(&config.heading_id)?;
    contained("parallax effect", ParallaxController::attach(page, heading, &config.scroller_id))
}

/// Log a feature's setup error and carry on without it.
fn contained<T>(feature: &str, result: Result<T, PageError>) -> Option<T> {
    match result {
        Ok(controller) => Some(controller),
        Err(err) => {
            log::warn!("{feature} failed to initialize: {err}");
            None
        }
    }
}
