//! The terminal page the header sits on.
//!
//! `Page` owns everything a browser document would: section geometry, the
//! vertical scroll position, the URL fragment and history, the root `dir`
//! and `lang` attributes, the body overflow flag and the listener table.
//! Geometry is kept in terminal rows and reported to the header in pixels.

use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::header::{
    Document, Environment, LanguageCode, ListenerKind, ListenerTable, NavLink, Overflow,
    ScrollBehavior, SectionBox, TextDirection, Viewport, LANGUAGE_STORAGE_KEY,
};
use crate::shared::LocalStorage;

/// Pixel height of one terminal row
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Duration of a smooth scroll
pub const SMOOTH_SCROLL: Duration = Duration::from_millis(300);

const HERO_ROWS: u16 = 14;
const SECTION_ROWS: u16 = 18;

/// One content section of the page
#[derive(Debug, Clone, PartialEq)]
pub struct PageSection {
    pub id: String,
    pub rows: u16,
}

impl PageSection {
    pub fn title_key(&self) -> String {
        format!("sections.{}.title", self.id)
    }

    pub fn body_key(&self) -> String {
        format!("sections.{}.body", self.id)
    }
}

/// Attributes of the document root element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentRoot {
    pub dir: Option<TextDirection>,
    pub lang: Option<LanguageCode>,
}

#[derive(Debug, Clone, Copy)]
struct ScrollAnimation {
    from: f64,
    to: f64,
    started: Instant,
    duration: Duration,
}

impl ScrollAnimation {
    /// Position at `now` with a cubic ease-out, and whether the target is reached
    fn position_at(&self, now: Instant) -> (f64, bool) {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration || self.duration.is_zero() {
            return (self.to, true);
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t).powi(3);
        (self.from + (self.to - self.from) * eased, false)
    }
}

/// Outcome of advancing the scroll animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTick {
    Idle,
    Moved,
    Settled,
}

#[derive(Debug)]
pub struct Page {
    sections: Vec<PageSection>,
    scroll_px: f64,
    viewport_rows: u16,
    hash: Option<String>,
    history: Vec<String>,
    reduced_motion: bool,
    animation: Option<ScrollAnimation>,
    root: Rc<RefCell<DocumentRoot>>,
    body: Rc<Cell<Overflow>>,
    listeners: Rc<RefCell<ListenerTable>>,
}

impl Page {
    pub fn new(sections: Vec<PageSection>, viewport_rows: u16, reduced_motion: bool) -> Self {
        Self {
            sections,
            scroll_px: 0.0,
            viewport_rows,
            hash: None,
            history: Vec::new(),
            reduced_motion,
            animation: None,
            root: Rc::default(),
            body: Rc::default(),
            listeners: Rc::default(),
        }
    }

    /// One section per link; the first one is the hero
    pub fn from_links(links: &[NavLink], viewport_rows: u16, reduced_motion: bool) -> Self {
        let sections = links
            .iter()
            .enumerate()
            .map(|(index, link)| PageSection {
                id: link.anchor_id.clone(),
                rows: if index == 0 { HERO_ROWS } else { SECTION_ROWS },
            })
            .collect();
        Self::new(sections, viewport_rows, reduced_motion)
    }

    /// First row of each section, in page coordinates
    pub fn section_rows(&self) -> impl Iterator<Item = (&PageSection, u32)> {
        let mut top = 0u32;
        self.sections.iter().map(move |section| {
            let start = top;
            top += u32::from(section.rows);
            (section, start)
        })
    }

    fn content_height_px(&self) -> f64 {
        self.sections
            .iter()
            .map(|s| f64::from(s.rows) * CELL_HEIGHT_PX)
            .sum()
    }

    pub fn max_scroll_px(&self) -> f64 {
        (self.content_height_px() - f64::from(self.viewport_rows) * CELL_HEIGHT_PX).max(0.0)
    }

    pub fn scroll_px(&self) -> f64 {
        self.scroll_px
    }

    /// First visible page row
    pub fn scroll_row(&self) -> u32 {
        (self.scroll_px / CELL_HEIGHT_PX).round() as u32
    }

    pub fn viewport_rows(&self) -> u16 {
        self.viewport_rows
    }

    pub fn set_viewport_rows(&mut self, rows: u16) {
        self.viewport_rows = rows;
        self.scroll_px = self.scroll_px.clamp(0.0, self.max_scroll_px());
    }

    /// User scroll by whole rows. Refused while the body is locked.
    pub fn scroll_by(&mut self, rows: i32) -> bool {
        if self.body.get() == Overflow::Hidden {
            trace!("Scroll ignored, body is locked");
            return false;
        }
        self.animation = None;
        let target = (self.scroll_px + f64::from(rows) * CELL_HEIGHT_PX).clamp(0.0, self.max_scroll_px());
        let moved = target != self.scroll_px;
        self.scroll_px = target;
        moved
    }

    /// Bring a section's top to the top of the viewport. Returns false if
    /// there is no such section.
    pub fn scroll_into_view(&mut self, id: &str, behavior: ScrollBehavior, now: Instant) -> bool {
        let Some(section) = self.section(id) else {
            return false;
        };
        let target = section.top.clamp(0.0, self.max_scroll_px());
        match behavior {
            ScrollBehavior::Instant => {
                self.animation = None;
                self.scroll_px = target;
            }
            ScrollBehavior::Smooth => {
                self.animation = Some(ScrollAnimation {
                    from: self.scroll_px,
                    to: target,
                    started: now,
                    duration: SMOOTH_SCROLL,
                });
            }
        }
        debug!(id, ?behavior, target, "Scrolling section into view");
        true
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advance a running smooth scroll
    pub fn tick(&mut self, now: Instant) -> ScrollTick {
        let Some(animation) = self.animation else {
            return ScrollTick::Idle;
        };
        let (position, done) = animation.position_at(now);
        self.scroll_px = position.clamp(0.0, self.max_scroll_px());
        if done {
            self.animation = None;
            ScrollTick::Settled
        } else {
            ScrollTick::Moved
        }
    }

    /// Record a fragment in history without a hash-change notification
    pub fn push_history(&mut self, hash: &str) {
        self.history.push(hash.to_string());
        self.hash = Some(hash.to_string());
    }

    /// Navigate to a fragment. Returns true when the fragment changed, in
    /// which case a hash-change notification is due.
    pub fn set_location_hash(&mut self, hash: &str) -> bool {
        if self.hash.as_deref() == Some(hash) {
            return false;
        }
        self.history.push(hash.to_string());
        self.hash = Some(hash.to_string());
        if let Some(id) = hash.strip_prefix('#') {
            self.scroll_into_view(id, ScrollBehavior::Instant, Instant::now());
        }
        true
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn root(&self) -> Rc<RefCell<DocumentRoot>> {
        Rc::clone(&self.root)
    }

    /// Whether anything is registered to hear events of `kind`
    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.listeners.borrow().count(kind) > 0
    }
}

impl Document for Page {
    fn section(&self, id: &str) -> Option<SectionBox> {
        self.section_rows()
            .find(|(section, _)| section.id == id)
            .map(|(section, top)| SectionBox {
                top: f64::from(top) * CELL_HEIGHT_PX,
                height: f64::from(section.rows) * CELL_HEIGHT_PX,
            })
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            top: self.scroll_px,
            height: f64::from(self.viewport_rows) * CELL_HEIGHT_PX,
        }
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll_px
    }

    fn location_hash(&self) -> Option<String> {
        self.hash.clone()
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn body_overflow(&self) -> Rc<Cell<Overflow>> {
        Rc::clone(&self.body)
    }

    fn listeners(&self) -> Rc<RefCell<ListenerTable>> {
        Rc::clone(&self.listeners)
    }
}

/// Language side effects applied to the page root and local storage
#[derive(Debug)]
pub struct DocumentEnvironment {
    root: Rc<RefCell<DocumentRoot>>,
    storage: Option<LocalStorage>,
}

impl DocumentEnvironment {
    pub fn new(page: &Page, storage: Option<LocalStorage>) -> Self {
        Self {
            root: page.root(),
            storage,
        }
    }

    fn storage(&self) -> Result<&LocalStorage> {
        self.storage
            .as_ref()
            .ok_or_else(|| anyhow!("Local storage is unavailable"))
    }
}

impl Environment for DocumentEnvironment {
    fn apply_direction(&mut self, direction: TextDirection) {
        self.root.borrow_mut().dir = Some(direction);
    }

    fn apply_lang_attr(&mut self, lang: LanguageCode) {
        self.root.borrow_mut().lang = Some(lang);
    }

    fn persist(&mut self, lang: LanguageCode) -> Result<()> {
        self.storage()?.set_item(LANGUAGE_STORAGE_KEY, lang.code())
    }

    fn read_persisted(&self) -> Result<Option<String>> {
        self.storage()?.get_item(LANGUAGE_STORAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{default_links, Header, HeaderEvent, HeaderOptions, MenuOrigin, ScrollLock};
    use crate::shared::{DictionariesBuilder, StyleVariant};

    fn page() -> Page {
        Page::from_links(&default_links(), 20, false)
    }

    #[test]
    fn test_sections_are_stacked() {
        let page = page();
        let classes = page.section("classes").unwrap();
        assert_eq!(classes.top, 14.0 * CELL_HEIGHT_PX);
        assert_eq!(classes.height, 18.0 * CELL_HEIGHT_PX);
        assert!(page.section("pricing").is_none());
        assert_eq!(page.max_scroll_px(), (14.0 + 3.0 * 18.0 - 20.0) * CELL_HEIGHT_PX);
    }

    #[test]
    fn test_scroll_by_clamps() {
        let mut page = page();
        assert!(!page.scroll_by(-3));
        assert!(page.scroll_by(5));
        assert_eq!(page.scroll_row(), 5);
        page.scroll_by(1000);
        assert_eq!(page.scroll_px(), page.max_scroll_px());
    }

    #[test]
    fn test_scroll_refused_while_locked() {
        let mut page = page();
        let lock = ScrollLock::acquire(page.body_overflow());
        assert!(!page.scroll_by(3));
        drop(lock);
        assert!(page.scroll_by(3));
    }

    #[test]
    fn test_smooth_scroll_eases_out_and_settles() {
        let mut page = page();
        let start = Instant::now();
        assert!(page.scroll_into_view("trainers", ScrollBehavior::Smooth, start));
        let target = page.section("trainers").unwrap().top;

        assert_eq!(page.tick(start + SMOOTH_SCROLL / 2), ScrollTick::Moved);
        // Ease-out covers more than half the distance in half the time.
        assert!(page.scroll_px() > target / 2.0);
        assert!(page.scroll_px() < target);

        assert_eq!(page.tick(start + SMOOTH_SCROLL), ScrollTick::Settled);
        assert_eq!(page.scroll_px(), target);
        assert_eq!(page.tick(start + SMOOTH_SCROLL * 2), ScrollTick::Idle);
    }

    #[test]
    fn test_instant_scroll_jumps() {
        let mut page = page();
        page.scroll_into_view("classes", ScrollBehavior::Instant, Instant::now());
        assert!(!page.is_animating());
        assert_eq!(page.scroll_row(), 14);
    }

    #[test]
    fn test_user_scroll_cancels_animation() {
        let mut page = page();
        page.scroll_into_view("contact", ScrollBehavior::Smooth, Instant::now());
        page.scroll_by(1);
        assert!(!page.is_animating());
    }

    #[test]
    fn test_missing_section_is_not_scrolled() {
        let mut page = page();
        assert!(!page.scroll_into_view("pricing", ScrollBehavior::Smooth, Instant::now()));
        assert!(!page.is_animating());
    }

    #[test]
    fn test_history_and_hash() {
        let mut page = page();
        page.push_history("#classes");
        assert_eq!(page.location_hash().as_deref(), Some("#classes"));

        assert!(page.set_location_hash("#contact"));
        assert!(!page.set_location_hash("#contact"));
        assert_eq!(page.history(), ["#classes", "#contact"]);
    }

    #[test]
    fn test_environment_writes_root_and_storage() {
        let dir = tempfile::tempdir().unwrap();
        let page = page();
        let storage = LocalStorage::new(dir.path().join("storage.json"));
        let mut env = DocumentEnvironment::new(&page, Some(storage.clone()));

        env.apply_direction(TextDirection::Rtl);
        env.apply_lang_attr(LanguageCode::Ar);
        env.persist(LanguageCode::Ar).unwrap();

        assert_eq!(page.root().borrow().dir, Some(TextDirection::Rtl));
        assert_eq!(page.root().borrow().lang, Some(LanguageCode::Ar));
        assert_eq!(storage.get_item("site_lang").unwrap().as_deref(), Some("ar"));
        assert_eq!(env.read_persisted().unwrap().as_deref(), Some("ar"));
    }

    #[test]
    fn test_environment_without_storage_reports_errors() {
        let page = page();
        let mut env = DocumentEnvironment::new(&page, None);
        assert!(env.persist(LanguageCode::En).is_err());
        assert!(env.read_persisted().is_err());
    }

    #[test]
    fn test_header_on_page_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("storage.json"));
        let page = page();
        let options = HeaderOptions {
            links: default_links(),
            dictionaries: DictionariesBuilder::with_builtin().unwrap().build(),
            style_variant: StyleVariant::Transparent,
            scroll_threshold: 8.0,
        };

        let env = DocumentEnvironment::new(&page, Some(storage.clone()));
        let mut header = Header::mount(options.clone(), env, Some("en_US.UTF-8"), &page);
        assert_eq!(page.root().borrow().dir, Some(TextDirection::Ltr));

        header.handle(
            HeaderEvent::SelectLanguage {
                lang: LanguageCode::Ar,
                origin: MenuOrigin::LanguageMenu,
            },
            &page,
        );
        assert!(page.is_listening(ListenerKind::Scroll));
        header.unmount();
        assert!(!page.is_listening(ListenerKind::Scroll));
        assert_eq!(page.root().borrow().dir, Some(TextDirection::Rtl));

        // The stored choice beats the platform locale on the next visit.
        let env = DocumentEnvironment::new(&page, Some(storage));
        let header = Header::mount(options, env, Some("en_US.UTF-8"), &page);
        assert_eq!(header.language(), LanguageCode::Ar);
    }
}
