//! The header's view of the page it is mounted on.
//!
//! `Document` is the read-only query seam (section geometry, scroll position,
//! fragment, motion preference). Listener registrations and the body scroll
//! lock are scoped resources: acquiring returns a guard, dropping the guard
//! releases it. The event loop only delivers a platform event while a
//! listener of its kind is registered. A passive flag is recorded for the
//! scroll listener; in the terminal nothing waits on a listener, so it has no
//! further effect.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Vertical extent of a section in document coordinates (px)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionBox {
    pub top: f64,
    pub height: f64,
}

impl SectionBox {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Visible window of the document (px)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top: f64,
    pub height: f64,
}

/// Screen-space rectangle used for pointer hit testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Region {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x.saturating_add(self.width)
            && point.y < self.y.saturating_add(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

/// Body overflow style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Auto,
    Hidden,
}

pub trait Document {
    /// Geometry of the element with this id, if it exists
    fn section(&self, id: &str) -> Option<SectionBox>;
    fn viewport(&self) -> Viewport;
    fn scroll_offset(&self) -> f64;
    /// Current URL fragment including the leading '#'
    fn location_hash(&self) -> Option<String>;
    fn prefers_reduced_motion(&self) -> bool;
    fn body_overflow(&self) -> Rc<Cell<Overflow>>;
    fn listeners(&self) -> Rc<RefCell<ListenerTable>>;
}

/// Locks page scrolling until dropped, then restores the previous overflow
#[must_use = "dropping the lock immediately restores scrolling"]
pub struct ScrollLock {
    body: Rc<Cell<Overflow>>,
    previous: Overflow,
}

impl ScrollLock {
    pub fn acquire(body: Rc<Cell<Overflow>>) -> Self {
        let previous = body.replace(Overflow::Hidden);
        Self { body, previous }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.body.set(self.previous);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Scroll,
    Resize,
    HashChange,
    KeyDown,
    PointerDown,
    Intersection,
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    id: u64,
    kind: ListenerKind,
    passive: bool,
}

/// Every live listener registration on a document
#[derive(Debug, Default)]
pub struct ListenerTable {
    next_id: u64,
    entries: Vec<Registration>,
}

impl ListenerTable {
    pub fn count(&self, kind: ListenerKind) -> usize {
        self.entries.iter().filter(|r| r.kind == kind).count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn is_passive(&self, kind: ListenerKind) -> bool {
        self.entries
            .iter()
            .filter(|r| r.kind == kind)
            .all(|r| r.passive)
    }

    fn insert(&mut self, kind: ListenerKind, passive: bool) -> u64 {
        self.next_id += 1;
        self.entries.push(Registration {
            id: self.next_id,
            kind,
            passive,
        });
        self.next_id
    }

    fn remove(&mut self, id: u64) {
        self.entries.retain(|r| r.id != id);
    }
}

/// A live registration; deregisters on drop
#[must_use = "dropping the listener deregisters it"]
pub struct Listener {
    table: Rc<RefCell<ListenerTable>>,
    id: u64,
    kind: ListenerKind,
}

impl Listener {
    pub fn register(table: &Rc<RefCell<ListenerTable>>, kind: ListenerKind) -> Self {
        Self::with_passive(table, kind, false)
    }

    /// Register a listener that never blocks the platform's default handling
    pub fn passive(table: &Rc<RefCell<ListenerTable>>, kind: ListenerKind) -> Self {
        Self::with_passive(table, kind, true)
    }

    fn with_passive(table: &Rc<RefCell<ListenerTable>>, kind: ListenerKind, passive: bool) -> Self {
        let id = table.borrow_mut().insert(kind, passive);
        Self {
            table: Rc::clone(table),
            id,
            kind,
        }
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.table.borrow_mut().remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_lock_restores_previous_overflow() {
        let body = Rc::new(Cell::new(Overflow::Auto));
        {
            let _lock = ScrollLock::acquire(Rc::clone(&body));
            assert_eq!(body.get(), Overflow::Hidden);
        }
        assert_eq!(body.get(), Overflow::Auto);
    }

    #[test]
    fn test_nested_scroll_locks_unwind_in_order() {
        let body = Rc::new(Cell::new(Overflow::Auto));
        let outer = ScrollLock::acquire(Rc::clone(&body));
        let inner = ScrollLock::acquire(Rc::clone(&body));
        drop(inner);
        assert_eq!(body.get(), Overflow::Hidden);
        drop(outer);
        assert_eq!(body.get(), Overflow::Auto);
    }

    #[test]
    fn test_listener_deregisters_on_drop() {
        let table = Rc::new(RefCell::new(ListenerTable::default()));
        let scroll = Listener::passive(&table, ListenerKind::Scroll);
        let key = Listener::register(&table, ListenerKind::KeyDown);
        assert_eq!(table.borrow().total(), 2);
        assert!(table.borrow().is_passive(ListenerKind::Scroll));
        assert!(!table.borrow().is_passive(ListenerKind::KeyDown));
        assert_eq!(scroll.kind(), ListenerKind::Scroll);

        drop(scroll);
        assert_eq!(table.borrow().count(ListenerKind::Scroll), 0);
        drop(key);
        assert_eq!(table.borrow().total(), 0);
    }

    #[test]
    fn test_region_contains() {
        let region = Region::new(10, 2, 4, 3);
        assert!(region.contains(Point { x: 10, y: 2 }));
        assert!(region.contains(Point { x: 13, y: 4 }));
        assert!(!region.contains(Point { x: 14, y: 4 }));
        assert!(!region.contains(Point { x: 9, y: 2 }));
        assert!(!Region::default().contains(Point { x: 0, y: 0 }));
    }
}
