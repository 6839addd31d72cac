//! Page configuration: element ids, selectors, image paths, and delays.
//!
//! Defaults match the shipped page markup. A page can override any field by
//! embedding JSON in `<script type="application/json" id="showroom-config">`;
//! missing fields keep their defaults.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::Deserialize;

use crate::error::PageError;
use crate::zone::LayerKind;

pub const CONFIG_ELEMENT_ID: &str = "showroom-config";
pub const DEFAULT_SCROLLER_ID: &str = "scroller";
pub const DEFAULT_THEME_STORAGE_KEY: &str = "showroom.theme";
pub const DEFAULT_THEME_ATTRIBUTE: &str = "data-theme";
pub const DEFAULT_ZONE_COUNT: u32 = 4;
pub const DEFAULT_MENU_CLOSE_DELAY_MS: u32 = 300;
pub const DEFAULT_SCROLL_SETTLE_MS: u32 = 100;

/// One fixed background layer painted at startup.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StaticLayer {
    pub id: String,
    pub image: String,
}

impl StaticLayer {
    fn new(id: &str, image: &str) -> Self {
        Self { id: id.to_owned(), image: image.to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    pub scroller_id: String,
    pub profile_trigger_id: String,
    pub profile_menu_id: String,
    pub heading_id: String,
    pub dot_selector: String,
    pub slide_selector: String,
    /// Attribute naming a theme on menu options; also the `<html>` attribute.
    pub theme_attribute: String,
    pub theme_storage_key: String,
    pub zone_count: u32,
    pub image_dir: String,
    pub static_layers: Vec<StaticLayer>,
    pub menu_close_delay_ms: u32,
    pub scroll_settle_ms: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            scroller_id: DEFAULT_SCROLLER_ID.to_owned(),
            profile_trigger_id: "profile-trigger".to_owned(),
            profile_menu_id: "profile-menu".to_owned(),
            heading_id: "hero-title".to_owned(),
            dot_selector: ".nav-dot".to_owned(),
            slide_selector: ".slide".to_owned(),
            theme_attribute: DEFAULT_THEME_ATTRIBUTE.to_owned(),
            theme_storage_key: DEFAULT_THEME_STORAGE_KEY.to_owned(),
            zone_count: DEFAULT_ZONE_COUNT,
            image_dir: "images".to_owned(),
            static_layers: vec![
                StaticLayer::new("layer-floorplan", "images/floorplan.png"),
                StaticLayer::new("layer-structure", "images/structure.png"),
                StaticLayer::new("layer-furniture", "images/furniture.png"),
            ],
            menu_close_delay_ms: DEFAULT_MENU_CLOSE_DELAY_MS,
            scroll_settle_ms: DEFAULT_SCROLL_SETTLE_MS,
        }
    }
}

impl PageConfig {
    /// Parse a JSON override; absent fields fall back to the defaults.
    pub fn from_json(raw: &str) -> Result<Self, PageError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Image for one zone overlay, e.g. `images/zone2-airflow.png`.
    #[must_use]
    pub fn zone_image(&self, kind: LayerKind, zone: u32) -> String {
        let dir = self.image_dir.trim_end_matches('/');
        let kind = kind.as_str();
        if dir.is_empty() {
            format!("zone{zone}-{kind}.png")
        } else {
            format!("{dir}/zone{zone}-{kind}.png")
        }
    }

    /// Selector for theme options inside the menu.
    #[must_use]
    pub fn theme_option_selector(&self) -> String {
        format!("[{}]", self.theme_attribute)
    }
}
