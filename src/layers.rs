//! Static background layers painted once at startup.

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

use crate::config::StaticLayer;
use crate::dom::{Page, css_url};

/// Paint each configured layer that exists on the page.
///
/// Missing layers are skipped. Returns the number painted.
pub fn paint_static_layers<P: Page>(page: &P, layers: &[StaticLayer]) -> usize {
    let mut painted = 0;
    for layer in layers {
        let Some(element) = page.element_by_id(&layer.id) else {
            log::debug!("static layer {} not on page", layer.id);
            continue;
        };
        page.set_style(&element, "background-image", &css_url(&layer.image));
        page.preload_image(&layer.image);
        painted += 1;
    }
    painted
}
