use tracing::debug;

use super::dom::{Document, Listener, ListenerKind, SectionBox, Viewport};
use super::links::{anchor_from_hash, NavLink};

/// Default scroll offset (px) past which the header turns opaque
pub const SCROLL_THRESHOLD_PX: f64 = 8.0;

/// "Scrolled past threshold" flag used for header styling only
#[derive(Debug, Clone, Copy)]
pub struct ScrollFlag {
    threshold: f64,
    scrolled: bool,
}

impl ScrollFlag {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            scrolled: false,
        }
    }

    /// Recompute from the current offset. Returns true when the flag flipped.
    pub fn update(&mut self, offset: f64) -> bool {
        let scrolled = offset > self.threshold;
        let changed = scrolled != self.scrolled;
        self.scrolled = scrolled;
        changed
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }
}

/// Viewport shrink applied before testing section visibility, as fractions
/// of the viewport height. Negative values shrink the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: f64,
    pub bottom: f64,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: -0.20,
            bottom: -0.55,
        }
    }
}

/// The part of the viewport in which sections compete for "active"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionBand {
    pub top: f64,
    pub bottom: f64,
}

impl DetectionBand {
    pub fn new(viewport: Viewport, margin: RootMargin) -> Self {
        let top = viewport.top - viewport.height * margin.top;
        let bottom = viewport.top + viewport.height + viewport.height * margin.bottom;
        Self {
            top,
            bottom: bottom.max(top),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub id: String,
    /// Visible share of the section inside the band, 0.0..=1.0
    pub ratio: f64,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn measure(id: &str, section: SectionBox, band: DetectionBand) -> Self {
        let overlap = section.bottom().min(band.bottom) - section.top.max(band.top);
        let (ratio, is_intersecting) = if section.height <= 0.0 {
            let inside = section.top >= band.top && section.top <= band.bottom;
            (if inside { 1.0 } else { 0.0 }, inside)
        } else if overlap > 0.0 {
            ((overlap / section.height).clamp(0.0, 1.0), true)
        } else {
            (0.0, false)
        };
        Self {
            id: id.to_string(),
            ratio,
            is_intersecting,
        }
    }
}

/// Highest ratio among intersecting entries; the earlier entry wins a tie.
pub fn pick_active(entries: &[IntersectionEntry]) -> Option<&str> {
    let mut best: Option<&IntersectionEntry> = None;
    for entry in entries.iter().filter(|e| e.is_intersecting) {
        match best {
            Some(current) if entry.ratio <= current.ratio => {}
            _ => best = Some(entry),
        }
    }
    best.map(|entry| entry.id.as_str())
}

/// The one highlighted link. Always names a link of the table it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSection {
    anchors: Vec<String>,
    current: String,
}

impl ActiveSection {
    /// `links` must not be empty
    pub fn new(links: &[NavLink]) -> Self {
        let anchors: Vec<String> = links.iter().map(|l| l.anchor_id.clone()).collect();
        let current = anchors.first().cloned().unwrap_or_default();
        Self { anchors, current }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn first(&self) -> &str {
        self.anchors.first().map(String::as_str).unwrap_or_default()
    }

    /// Set the active link. Unknown anchors are ignored. Returns true on change.
    pub fn set(&mut self, anchor: &str) -> bool {
        if self.current == anchor || !self.anchors.iter().any(|a| a == anchor) {
            return false;
        }
        debug!(from = %self.current, to = anchor, "Active link changed");
        self.current = anchor.to_string();
        true
    }

    /// Apply a URL fragment, falling back to the first link
    pub fn set_from_hash(&mut self, hash: Option<&str>) -> bool {
        let target = hash
            .and_then(anchor_from_hash)
            .filter(|id| self.anchors.iter().any(|a| a == id))
            .map(str::to_string)
            .unwrap_or_else(|| self.first().to_string());
        self.set(&target)
    }
}

/// Visibility watcher over the sections the links point at.
///
/// Holds an `Intersection` registration for as long as it lives. Results are
/// recomputed from current geometry on every call, nothing is queued.
pub struct SectionObserver {
    observed: Vec<String>,
    margin: RootMargin,
    _registration: Listener,
}

impl SectionObserver {
    /// Observe every linked section present in the document. With no sections
    /// found nothing is observed and `None` is returned.
    pub fn observe(links: &[NavLink], doc: &impl Document, margin: RootMargin) -> Option<Self> {
        let observed: Vec<String> = links
            .iter()
            .map(|l| l.anchor_id.clone())
            .filter(|id| doc.section(id).is_some())
            .collect();

        if observed.is_empty() {
            debug!("No linked sections in the document, scroll-spy idle");
            return None;
        }

        debug!(sections = ?observed, "Observing sections");
        Some(Self {
            observed,
            margin,
            _registration: Listener::register(&doc.listeners(), ListenerKind::Intersection),
        })
    }

    /// Entries in first-observed order. Sections that vanished are skipped.
    pub fn entries(&self, doc: &impl Document) -> Vec<IntersectionEntry> {
        let band = DetectionBand::new(doc.viewport(), self.margin);
        self.observed
            .iter()
            .filter_map(|id| doc.section(id).map(|s| IntersectionEntry::measure(id, s, band)))
            .collect()
    }

    /// The section that should be active right now, if any is visible
    pub fn evaluate(&self, doc: &impl Document) -> Option<String> {
        let entries = self.entries(doc);
        pick_active(&entries).map(str::to_string)
    }
}
