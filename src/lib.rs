//! # showroom
//!
//! WASM page enhancers for the building presentation page: zone overlay
//! toggles, the theme menu, slide navigation, and the heading parallax.
//!
//! All component logic is written against the [`dom::Page`] port so it can be
//! exercised natively with a fake page. The `browser` feature adds the
//! `web-sys` adapter and the `#[wasm_bindgen(start)]` entry point.

pub mod bootstrap;
pub mod config;
pub mod dom;
pub mod error;
pub mod layers;
pub mod nav;
pub mod parallax;
pub mod sched;
pub mod settings;
pub mod theme;
pub mod zone;

#[cfg(feature = "browser")]
pub mod browser;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{Presentation, boot};
pub use config::PageConfig;
pub use error::PageError;
