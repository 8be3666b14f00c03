//! Navigation header core.
//!
//! `Header` is one parameterised component: links, translations and style
//! variant come in through `HeaderOptions`. Platform input arrives as
//! `HeaderEvent`s; navigation the platform has to perform comes back as
//! `Effect`s. Document-level language side effects go through the
//! `Environment` the header was mounted with.

pub mod dom;
pub mod language;
pub mod links;
pub mod slider;
pub mod spy;

use std::sync::Arc;
use tracing::debug;

pub use dom::{
    Document, Listener, ListenerKind, ListenerTable, Overflow, Point, Region, ScrollLock,
    SectionBox, Viewport,
};
pub use language::{
    detect_platform_locale, Environment, LanguageCode, LanguageController, TextDirection,
    LANGUAGE_STORAGE_KEY,
};
pub use links::{default_links, NavLink};
pub use slider::{compute_indicator, Bounds, CapsuleLayout, Indicator, IndicatorMotion, Transition};
pub use spy::{ActiveSection, RootMargin, ScrollFlag, SectionObserver, SCROLL_THRESHOLD_PX};

use crate::shared::{Dictionaries, I18n, StyleVariant};

/// Everything that varies between header instances
#[derive(Debug, Clone)]
pub struct HeaderOptions {
    /// Must not be empty
    pub links: Vec<NavLink>,
    pub dictionaries: Arc<Dictionaries>,
    pub style_variant: StyleVariant,
    pub scroll_threshold: f64,
}

/// Which menu a language was picked from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOrigin {
    LanguageMenu,
    Drawer,
}

/// Where a link click came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    Capsule,
    Drawer,
    Logo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSource {
    /// Wheel, keys, scrollbar
    User,
    /// Frames of a scroll the header asked for
    Programmatic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderEvent {
    HashChanged,
    Scrolled(ScrollSource),
    /// A requested scroll reached its target
    ScrollSettled,
    Resized,
    EscapePressed,
    PointerDown(Point),
    ToggleLanguageMenu,
    ToggleDrawer,
    /// Backdrop, close button or drawer call-to-action
    CloseDrawer,
    SelectLanguage { lang: LanguageCode, origin: MenuOrigin },
    LinkClicked { anchor: String, origin: LinkOrigin },
}

impl HeaderEvent {
    /// Platform listener the event arrives through. Events without one come
    /// from the header's own controls and are always delivered.
    pub fn listener_kind(&self) -> Option<ListenerKind> {
        match self {
            HeaderEvent::HashChanged => Some(ListenerKind::HashChange),
            HeaderEvent::Scrolled(_) | HeaderEvent::ScrollSettled => Some(ListenerKind::Scroll),
            HeaderEvent::Resized => Some(ListenerKind::Resize),
            HeaderEvent::EscapePressed => Some(ListenerKind::KeyDown),
            HeaderEvent::PointerDown(_) => Some(ListenerKind::PointerDown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Work the platform must do on the header's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScrollIntoView {
        anchor: String,
        behavior: ScrollBehavior,
    },
    /// Add the fragment to history without navigating
    PushHistory(String),
    /// Navigate by fragment; used when the target section is missing
    SetLocationHash(String),
}

/// Screen areas that count as "inside" for outside-press detection
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitRegions {
    pub language_button: Option<Region>,
    pub language_menu: Option<Region>,
    pub menu_button: Option<Region>,
    pub drawer_panel: Option<Region>,
}

fn inside(region: Option<Region>, point: Point) -> bool {
    region.is_some_and(|r| r.contains(point))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiToggles {
    pub language_menu_open: bool,
    pub drawer_open: bool,
}

#[derive(Debug, Default)]
struct CapsuleState {
    layout: Option<CapsuleLayout>,
    scroll_left: f64,
    bounds: Option<Bounds>,
    indicator: Option<Indicator>,
    dirty: bool,
}

pub struct Header<E: Environment> {
    options: HeaderOptions,
    language: LanguageController<E>,
    i18n: I18n,
    active: ActiveSection,
    scroll_flag: ScrollFlag,
    observer: Option<SectionObserver>,
    toggles: UiToggles,
    scroll_lock: Option<ScrollLock>,
    regions: HitRegions,
    capsule: CapsuleState,
    /// Anchor of a click-initiated scroll still in flight
    pending_navigation: Option<String>,
    _listeners: Vec<Listener>,
}

impl<E: Environment> Header<E> {
    /// Mount on `doc`: resolve the language, register listeners, start
    /// observing sections and take the initial active link from the fragment.
    pub fn mount(
        mut options: HeaderOptions,
        env: E,
        platform_locale: Option<&str>,
        doc: &impl Document,
    ) -> Self {
        if options.links.is_empty() {
            options.links = default_links();
        }

        let language = LanguageController::new(env, platform_locale);
        let i18n = I18n::new(language.current(), Arc::clone(&options.dictionaries));

        let table = doc.listeners();
        let listeners = vec![
            Listener::passive(&table, ListenerKind::Scroll),
            Listener::register(&table, ListenerKind::Resize),
            Listener::register(&table, ListenerKind::HashChange),
            Listener::register(&table, ListenerKind::KeyDown),
            Listener::register(&table, ListenerKind::PointerDown),
        ];

        let mut scroll_flag = ScrollFlag::new(options.scroll_threshold);
        scroll_flag.update(doc.scroll_offset());

        let mut active = ActiveSection::new(&options.links);
        let hash = doc.location_hash();
        active.set_from_hash(hash.as_deref());

        let observer = SectionObserver::observe(&options.links, doc, RootMargin::default());

        debug!(
            lang = %language.current(),
            active = active.current(),
            links = options.links.len(),
            "Header mounted"
        );

        Self {
            options,
            language,
            i18n,
            active,
            scroll_flag,
            observer,
            toggles: UiToggles::default(),
            scroll_lock: None,
            regions: HitRegions::default(),
            capsule: CapsuleState {
                dirty: true,
                ..Default::default()
            },
            pending_navigation: None,
            _listeners: listeners,
        }
    }

    /// Release every listener, the observer and any scroll lock
    pub fn unmount(self) {
        debug!(drawer_open = self.toggles.drawer_open, "Header unmounted");
    }

    /// Re-read which linked sections exist, replacing the current observer
    pub fn reobserve(&mut self, doc: &impl Document) {
        self.observer = None;
        self.observer = SectionObserver::observe(&self.options.links, doc, RootMargin::default());
    }

    pub fn handle(&mut self, event: HeaderEvent, doc: &impl Document) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            HeaderEvent::HashChanged => {
                let hash = doc.location_hash();
                self.set_active_from_hash(hash.as_deref());
            }
            HeaderEvent::Scrolled(source) => {
                if self.scroll_flag.update(doc.scroll_offset()) {
                    debug!(scrolled = self.scroll_flag.is_scrolled(), "Scroll threshold crossed");
                }
                if source == ScrollSource::User {
                    self.pending_navigation = None;
                }
                if self.pending_navigation.is_none() {
                    self.spy(doc);
                }
            }
            HeaderEvent::ScrollSettled => {
                self.pending_navigation = None;
            }
            HeaderEvent::Resized => {
                self.capsule.dirty = true;
                if self.pending_navigation.is_none() {
                    self.spy(doc);
                }
            }
            HeaderEvent::EscapePressed => {
                self.toggles.language_menu_open = false;
                self.set_drawer(false, doc);
            }
            HeaderEvent::PointerDown(point) => self.pointer_down(point, doc),
            HeaderEvent::ToggleLanguageMenu => {
                self.toggles.language_menu_open = !self.toggles.language_menu_open;
            }
            HeaderEvent::ToggleDrawer => {
                let open = !self.toggles.drawer_open;
                self.set_drawer(open, doc);
            }
            HeaderEvent::CloseDrawer => self.set_drawer(false, doc),
            HeaderEvent::SelectLanguage { lang, origin } => {
                self.set_language(lang);
                match origin {
                    MenuOrigin::LanguageMenu => self.toggles.language_menu_open = false,
                    MenuOrigin::Drawer => self.set_drawer(false, doc),
                }
            }
            HeaderEvent::LinkClicked { anchor, origin } => {
                self.click_link(&anchor, doc, &mut effects);
                debug!(anchor = %anchor, ?origin, "Link clicked");
                self.set_drawer(false, doc);
            }
        }
        effects
    }

    fn click_link(&mut self, anchor: &str, doc: &impl Document, effects: &mut Vec<Effect>) {
        if self.active.set(anchor) {
            self.capsule.dirty = true;
        }
        let href = format!("#{anchor}");
        if doc.section(anchor).is_some() {
            let behavior = if doc.prefers_reduced_motion() {
                ScrollBehavior::Instant
            } else {
                ScrollBehavior::Smooth
            };
            self.pending_navigation = Some(anchor.to_string());
            effects.push(Effect::ScrollIntoView {
                anchor: anchor.to_string(),
                behavior,
            });
            effects.push(Effect::PushHistory(href));
        } else {
            effects.push(Effect::SetLocationHash(href));
        }
    }

    fn pointer_down(&mut self, point: Point, doc: &impl Document) {
        if self.toggles.language_menu_open
            && !inside(self.regions.language_button, point)
            && !inside(self.regions.language_menu, point)
        {
            self.toggles.language_menu_open = false;
        }
        if self.toggles.drawer_open
            && !inside(self.regions.menu_button, point)
            && !inside(self.regions.drawer_panel, point)
        {
            self.set_drawer(false, doc);
        }
    }

    fn set_drawer(&mut self, open: bool, doc: &impl Document) {
        if open == self.toggles.drawer_open {
            return;
        }
        self.toggles.drawer_open = open;
        self.scroll_lock = open.then(|| ScrollLock::acquire(doc.body_overflow()));
        debug!(open, "Drawer toggled");
    }

    fn set_language(&mut self, lang: LanguageCode) {
        self.language.set(lang);
        self.i18n.set_language(lang);
        self.capsule.dirty = true;
    }

    fn set_active_from_hash(&mut self, hash: Option<&str>) {
        if self.active.set_from_hash(hash) {
            self.capsule.dirty = true;
        }
    }

    fn spy(&mut self, doc: &impl Document) {
        let Some(observer) = &self.observer else {
            return;
        };
        if let Some(anchor) = observer.evaluate(doc) {
            if self.active.set(&anchor) {
                self.capsule.dirty = true;
            }
        }
    }

    /// Recompute capsule layout and indicator if the active link, the
    /// capsule bounds or the language changed since the last call.
    pub fn layout_capsule(&mut self, bounds: Bounds, reduced_motion: bool) -> Option<Indicator> {
        let direction = self.language.direction();
        let stale = self.capsule.dirty
            || self.capsule.bounds != Some(bounds)
            || self.capsule.layout.as_ref().map(|l| l.direction) != Some(direction);
        if !stale {
            return self.capsule.indicator;
        }

        let items: Vec<(String, String)> = self
            .options
            .links
            .iter()
            .map(|link| (link.anchor_id.clone(), self.link_text(link)))
            .collect();
        let layout = CapsuleLayout::measure(&items, bounds.width, direction);

        let direction_changed = self.capsule.layout.as_ref().map(|l| l.direction) != Some(direction);
        let scroll = if direction_changed {
            layout.initial_scroll()
        } else {
            self.capsule.scroll_left
        };
        self.capsule.scroll_left = layout.reveal(self.active.current(), scroll);

        let content_origin = Bounds {
            left: 0.0,
            width: bounds.width,
        };
        self.capsule.indicator = layout.bounds_of(self.active.current()).map(|link| {
            compute_indicator(
                link,
                content_origin,
                self.capsule.scroll_left,
                direction,
                reduced_motion,
            )
        });
        self.capsule.layout = Some(layout);
        self.capsule.bounds = Some(bounds);
        self.capsule.dirty = false;
        self.capsule.indicator
    }

    pub fn capsule_layout(&self) -> Option<&CapsuleLayout> {
        self.capsule.layout.as_ref()
    }

    /// Visible scroll distance of the capsule, always non-negative
    pub fn capsule_scroll(&self) -> f64 {
        self.capsule.scroll_left.abs()
    }

    /// Icon and label as shown in the capsule
    pub fn link_text(&self, link: &NavLink) -> String {
        let label = link.label(self.language.current());
        match link.icon {
            Some(icon) => format!("{} {label}", icon.glyph()),
            None => label.to_string(),
        }
    }

    pub fn set_hit_regions(&mut self, regions: HitRegions) {
        self.regions = regions;
    }

    pub fn t(&self, key: &str, fallback: Option<&str>) -> String {
        self.i18n.t(key, fallback)
    }

    pub fn language(&self) -> LanguageCode {
        self.language.current()
    }

    pub fn direction(&self) -> TextDirection {
        self.language.direction()
    }

    pub fn links(&self) -> &[NavLink] {
        &self.options.links
    }

    pub fn active(&self) -> &str {
        self.active.current()
    }

    pub fn is_scrolled(&self) -> bool {
        self.scroll_flag.is_scrolled()
    }

    pub fn toggles(&self) -> UiToggles {
        self.toggles
    }

    pub fn style_variant(&self) -> StyleVariant {
        self.options.style_variant
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    #[cfg(test)]
    fn env(&self) -> &E {
        self.language.env()
    }
}
