//! Profile menu with theme selection.
//!
//! DESIGN
//! ======
//! The open/closed decision is a pure transition ([`MenuState::next`]); the
//! controller only maps DOM events to inputs and applies class changes when
//! the state actually moves.
//!
//! Closing drops `visible` right away and re-adds `hidden` after a fixed
//! delay, so the exit transition can play before the menu leaves layout. The
//! delay is a constant, not read from the stylesheet.

#[cfg(test)]
#[path = "theme_test.rs"]
mod theme_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::config::PageConfig;
use crate::dom::{CLASS_HIDDEN, CLASS_VISIBLE, ListenOptions, ListenTarget, Page};
use crate::error::PageError;
use crate::sched::Debounce;
use crate::settings::ThemeSettings;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuInput {
    /// Trigger button activated.
    Trigger,
    /// Click landed outside both the trigger and the menu.
    OutsideClick,
    /// A theme option inside the menu was chosen.
    ThemeChosen,
}

impl MenuState {
    #[must_use]
    pub fn next(self, input: MenuInput) -> Self {
        match (self, input) {
            (Self::Closed, MenuInput::Trigger) => Self::Open,
            (Self::Open, _) => Self::Closed,
            (Self::Closed, MenuInput::OutsideClick | MenuInput::ThemeChosen) => Self::Closed,
        }
    }
}

struct ThemeInner<P: Page> {
    page: Rc<P>,
    trigger: P::Element,
    menu: P::Element,
    settings: Rc<ThemeSettings<P>>,
    state: Cell<MenuState>,
    pending_hide: Debounce<P>,
    armed: Cell<bool>,
}

impl<P: Page> ThemeInner<P> {
    fn handle(self: &Rc<Self>, input: MenuInput) {
        if !self.armed.get() {
            return;
        }
        let current = self.state.get();
        let next = current.next(input);
        if next == current {
            return;
        }
        self.state.set(next);
        match next {
            MenuState::Open => self.show(),
            MenuState::Closed => self.hide(),
        }
    }

    fn show(&self) {
        self.pending_hide.cancel();
        self.page.set_class(&self.menu, CLASS_HIDDEN, false);
        self.page.force_layout(&self.menu);
        self.page.set_class(&self.menu, CLASS_VISIBLE, true);
    }

    fn hide(self: &Rc<Self>) {
        self.page
            .set_class(&self.menu, CLASS_VISIBLE, false);
        let this = Rc::clone(self);
        self.pending_hide.trigger(move || {
            this.page.set_class(&this.menu, CLASS_HIDDEN, true);
        });
    }

    fn is_outside(&self, target: Option<&P::Element>) -> bool {
        target.is_none_or(|node| !self.page.contains(&self.menu, node) && !self.page.contains(&self.trigger, node))
    }
}

/// Profile menu controller. Both elements must exist; the caller checks.
pub struct ThemeManager<P: Page> {
    inner: Rc<ThemeInner<P>>,
}

impl<P: Page> ThemeManager<P> {
    pub fn attach(
        page: &Rc<P>,
        trigger: P::Element,
        menu: P::Element,
        settings: Rc<ThemeSettings<P>>,
        config: &PageConfig,
    ) -> Result<Self, PageError> {
        let inner = Rc::new(ThemeInner {
            page: Rc::clone(page),
            trigger,
            menu,
            settings,
            state: Cell::new(MenuState::Closed),
            pending_hide: Debounce::new(Rc::clone(page), config.menu_close_delay_ms),
            armed: Cell::new(false),
        });

        let on_trigger = Rc::clone(&inner);
        page.listen(
            ListenTarget::Element(&inner.trigger),
            "click",
            ListenOptions::default(),
            Box::new(move |event| {
                if !on_trigger.armed.get() {
                    return;
                }
                event.stop_propagation();
                on_trigger.handle(MenuInput::Trigger);
            }),
        )?;

        let on_document = Rc::clone(&inner);
        page.listen(
            ListenTarget::Document,
            "click",
            ListenOptions::default(),
            Box::new(move |event| {
                if on_document.state.get() == MenuState::Open && on_document.is_outside(event.target()) {
                    on_document.handle(MenuInput::OutsideClick);
                }
            }),
        )?;

        for option in page.select_within(&inner.menu, &config.theme_option_selector()) {
            let Some(theme) = page.attribute(&option, &config.theme_attribute) else {
                continue;
            };
            let on_option = Rc::clone(&inner);
            page.listen(
                ListenTarget::Element(&option),
                "click",
                ListenOptions::default(),
                Box::new(move |event| {
                    if !on_option.armed.get() {
                        return;
                    }
                    event.prevent_default();
                    on_option.settings.select(&theme);
                    on_option.handle(MenuInput::ThemeChosen);
                }),
            )?;
        }

        inner.armed.set(true);
        Ok(Self { inner })
    }

    #[must_use]
    pub fn state(&self) -> MenuState {
        self.inner.state.get()
    }

    pub fn toggle(&self) {
        self.inner.handle(MenuInput::Trigger);
    }

    pub fn close(&self) {
        self.inner.handle(MenuInput::OutsideClick);
    }

    /// Apply and persist `theme`, then close the menu.
    pub fn select(&self, theme: &str) {
        self.inner.settings.select(theme);
        self.inner.handle(MenuInput::ThemeChosen);
    }
}
