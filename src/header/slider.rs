//! Position of the sliding indicator under the active link.
//!
//! Geometry is in capsule columns. Link boxes are laid out in content
//! coordinates measured from the left edge of the capsule's scrollable
//! content. A right-to-left capsule reports its horizontal scroll offset as a
//! negative number; `compute_indicator` normalises it.

use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use super::language::TextDirection;

/// Duration of the indicator's position and width animation
pub const INDICATOR_TRANSITION_MS: u32 = 220;

/// Horizontal padding inside each link, per side
pub const LINK_PADDING: f64 = 1.0;

/// Space between neighbouring links
pub const LINK_GAP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub width: f64,
}

impl Bounds {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Animated { duration_ms: u32 },
}

/// Where to draw the indicator, relative to the capsule's visible left edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indicator {
    pub left: f64,
    pub width: f64,
    pub transition: Transition,
}

pub fn compute_indicator(
    link: Bounds,
    capsule: Bounds,
    scroll_left: f64,
    direction: TextDirection,
    reduced_motion: bool,
) -> Indicator {
    let scroll = if direction.is_rtl() && scroll_left < 0.0 {
        scroll_left.abs()
    } else {
        scroll_left
    };

    Indicator {
        left: link.left - capsule.left - scroll,
        width: link.width,
        transition: if reduced_motion {
            Transition::None
        } else {
            Transition::Animated {
                duration_ms: INDICATOR_TRANSITION_MS,
            }
        },
    }
}

/// Animates the drawn indicator toward the latest computed one
#[derive(Debug, Clone, Copy)]
pub struct IndicatorMotion {
    from: Option<(f64, f64)>,
    target: Option<Indicator>,
    started: Instant,
}

impl IndicatorMotion {
    pub fn new(now: Instant) -> Self {
        Self {
            from: None,
            target: None,
            started: now,
        }
    }

    /// Start moving toward `target` from wherever the indicator is drawn now
    pub fn retarget(&mut self, target: Option<Indicator>, now: Instant) {
        if target == self.target {
            return;
        }
        self.from = self.current(now).map(|shown| (shown.left, shown.width));
        self.target = target;
        self.started = now;
    }

    pub fn current(&self, now: Instant) -> Option<Indicator> {
        let target = self.target?;
        let (Transition::Animated { duration_ms }, Some((left, width))) = (target.transition, self.from)
        else {
            return Some(target);
        };
        let duration = Duration::from_millis(u64::from(duration_ms));
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= duration {
            return Some(target);
        }
        let t = elapsed.as_secs_f64() / duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t).powi(2);
        Some(Indicator {
            left: left + (target.left - left) * eased,
            width: width + (target.width - width) * eased,
            transition: target.transition,
        })
    }

    pub fn is_moving(&self, now: Instant) -> bool {
        self.current(now) != self.target
    }
}

/// One link as laid out inside the capsule
#[derive(Debug, Clone, PartialEq)]
pub struct CapsuleItem {
    pub anchor_id: String,
    pub text: String,
    pub bounds: Bounds,
}

/// Link boxes of the capsule for one language and width
#[derive(Debug, Clone, PartialEq)]
pub struct CapsuleLayout {
    pub items: Vec<CapsuleItem>,
    pub content_width: f64,
    pub viewport_width: f64,
    pub direction: TextDirection,
}

impl CapsuleLayout {
    /// Lay out `(anchor_id, text)` pairs in reading order. Right-to-left
    /// layouts place the first link at the right end of the content. Links
    /// narrower than the capsule are centred in it; overflowing links fill
    /// the content from its left edge and scroll.
    pub fn measure(items: &[(String, String)], viewport_width: f64, direction: TextDirection) -> Self {
        let viewport_width = viewport_width.max(0.0);
        let widths: Vec<f64> = items
            .iter()
            .map(|(_, text)| text.width() as f64 + LINK_PADDING * 2.0)
            .collect();
        let gaps = LINK_GAP * items.len().saturating_sub(1) as f64;
        let links_width = widths.iter().sum::<f64>() + gaps;
        let inset = ((viewport_width - links_width) / 2.0).max(0.0).floor();
        let content_width = links_width + inset * 2.0;

        let mut cursor = inset;
        let mut laid_out = Vec::with_capacity(items.len());
        let order: Box<dyn Iterator<Item = usize>> = if direction.is_rtl() {
            Box::new((0..items.len()).rev())
        } else {
            Box::new(0..items.len())
        };
        for index in order {
            let (anchor_id, text) = &items[index];
            laid_out.push((
                index,
                CapsuleItem {
                    anchor_id: anchor_id.clone(),
                    text: text.clone(),
                    bounds: Bounds {
                        left: cursor,
                        width: widths[index],
                    },
                },
            ));
            cursor += widths[index] + LINK_GAP;
        }
        laid_out.sort_by_key(|(index, _)| *index);

        Self {
            items: laid_out.into_iter().map(|(_, item)| item).collect(),
            content_width,
            viewport_width,
            direction,
        }
    }

    pub fn bounds_of(&self, anchor_id: &str) -> Option<Bounds> {
        self.items
            .iter()
            .find(|item| item.anchor_id == anchor_id)
            .map(|item| item.bounds)
    }

    pub fn max_scroll(&self) -> f64 {
        (self.content_width - self.viewport_width).max(0.0)
    }

    /// Scroll offset a freshly laid out capsule starts at: the left end for
    /// LTR, the right end for RTL.
    pub fn initial_scroll(&self) -> f64 {
        self.to_reported(if self.direction.is_rtl() {
            self.max_scroll()
        } else {
            0.0
        })
    }

    /// Smallest scroll change that brings `anchor_id` fully into view.
    pub fn reveal(&self, anchor_id: &str, scroll_left: f64) -> f64 {
        let Some(bounds) = self.bounds_of(anchor_id) else {
            return scroll_left;
        };
        let mut distance = scroll_left.abs().min(self.max_scroll());
        if bounds.left < distance {
            distance = bounds.left;
        } else if bounds.right() > distance + self.viewport_width {
            distance = bounds.right() - self.viewport_width;
        }
        self.to_reported(distance.clamp(0.0, self.max_scroll()))
    }

    fn to_reported(&self, distance: f64) -> f64 {
        if self.direction.is_rtl() && distance > 0.0 {
            -distance
        } else {
            distance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<(String, String)> {
        [("home", "Home"), ("classes", "Classes"), ("trainers", "Trainers")]
            .iter()
            .map(|(id, text)| (id.to_string(), text.to_string()))
            .collect()
    }

    #[test]
    fn test_indicator_underlines_link() {
        let indicator = compute_indicator(
            Bounds {
                left: 12.0,
                width: 9.0,
            },
            Bounds {
                left: 0.0,
                width: 40.0,
            },
            0.0,
            TextDirection::Ltr,
            false,
        );
        assert_eq!(indicator.left, 12.0);
        assert_eq!(indicator.width, 9.0);
        assert_eq!(
            indicator.transition,
            Transition::Animated {
                duration_ms: INDICATOR_TRANSITION_MS
            }
        );
    }

    #[test]
    fn test_indicator_normalises_negative_rtl_scroll() {
        let link = Bounds {
            left: 30.0,
            width: 6.0,
        };
        let capsule = Bounds {
            left: 0.0,
            width: 20.0,
        };
        let rtl = compute_indicator(link, capsule, -15.0, TextDirection::Rtl, false);
        let ltr = compute_indicator(link, capsule, 15.0, TextDirection::Ltr, false);
        assert_eq!(rtl.left, 15.0);
        assert_eq!(rtl.left, ltr.left);
    }

    #[test]
    fn test_indicator_relative_to_capsule_origin() {
        let indicator = compute_indicator(
            Bounds {
                left: 25.0,
                width: 4.0,
            },
            Bounds {
                left: 10.0,
                width: 30.0,
            },
            3.0,
            TextDirection::Ltr,
            false,
        );
        assert_eq!(indicator.left, 12.0);
    }

    #[test]
    fn test_reduced_motion_disables_transition() {
        let indicator = compute_indicator(
            Bounds {
                left: 0.0,
                width: 4.0,
            },
            Bounds {
                left: 0.0,
                width: 30.0,
            },
            0.0,
            TextDirection::Rtl,
            true,
        );
        assert_eq!(indicator.transition, Transition::None);
    }

    #[test]
    fn test_measure_ltr_order() {
        let layout = CapsuleLayout::measure(&items(), 27.0, TextDirection::Ltr);
        assert_eq!(layout.bounds_of("home").unwrap().left, 0.0);
        assert_eq!(layout.bounds_of("home").unwrap().width, 6.0);
        assert_eq!(layout.bounds_of("classes").unwrap().left, 7.0);
        assert_eq!(layout.bounds_of("trainers").unwrap().left, 17.0);
        assert_eq!(layout.content_width, 27.0);
        assert_eq!(layout.initial_scroll(), 0.0);
    }

    #[test]
    fn test_measure_rtl_puts_first_link_on_the_right() {
        let layout = CapsuleLayout::measure(&items(), 27.0, TextDirection::Rtl);
        assert_eq!(layout.bounds_of("trainers").unwrap().left, 0.0);
        assert_eq!(layout.bounds_of("home").unwrap().right(), layout.content_width);
        assert_eq!(layout.items[0].anchor_id, "home");
    }

    #[test]
    fn test_short_link_row_is_centred() {
        let two = &items()[..2];
        let rtl = CapsuleLayout::measure(two, 80.0, TextDirection::Rtl);
        let home = rtl.bounds_of("home").unwrap();
        let classes = rtl.bounds_of("classes").unwrap();
        assert_eq!(classes.left, 32.0);
        assert_eq!(home.right(), 48.0);
        assert!(home.left > 40.0);
        assert_eq!(rtl.max_scroll(), 0.0);

        let ltr = CapsuleLayout::measure(two, 80.0, TextDirection::Ltr);
        assert_eq!(ltr.bounds_of("home").unwrap().left, 32.0);
        assert_eq!(ltr.bounds_of("classes").unwrap().right(), 48.0);
    }

    #[test]
    fn test_overflowing_rtl_row_starts_at_the_right_edge() {
        let layout = CapsuleLayout::measure(&items(), 12.0, TextDirection::Rtl);
        let home = layout.bounds_of("home").unwrap();
        let distance = layout.initial_scroll().abs();
        assert_eq!(home.right() - distance, layout.viewport_width);
    }

    #[test]
    fn test_reveal_scrolls_minimally() {
        let layout = CapsuleLayout::measure(&items(), 12.0, TextDirection::Ltr);
        assert_eq!(layout.max_scroll(), 15.0);
        assert_eq!(layout.reveal("home", 0.0), 0.0);
        assert_eq!(layout.reveal("trainers", 0.0), 15.0);
        assert_eq!(layout.reveal("classes", 15.0), 7.0);
        assert_eq!(layout.reveal("missing", 4.0), 4.0);
    }

    #[test]
    fn test_rtl_reveal_reports_negative_offsets() {
        let layout = CapsuleLayout::measure(&items(), 12.0, TextDirection::Rtl);
        assert_eq!(layout.initial_scroll(), -15.0);
        assert_eq!(layout.reveal("trainers", layout.initial_scroll()), 0.0);
        let scroll = layout.reveal("home", 0.0);
        assert_eq!(scroll, -15.0);

        let home = layout.bounds_of("home").unwrap();
        let capsule = Bounds {
            left: 0.0,
            width: 12.0,
        };
        let indicator = compute_indicator(home, capsule, scroll, TextDirection::Rtl, true);
        assert_eq!(indicator.left, 6.0);
        assert!(indicator.left + indicator.width <= capsule.width);
    }

    #[test]
    fn test_motion_slides_between_links() {
        let start = Instant::now();
        let animated = Transition::Animated {
            duration_ms: INDICATOR_TRANSITION_MS,
        };
        let first = Indicator {
            left: 0.0,
            width: 6.0,
            transition: animated,
        };
        let second = Indicator {
            left: 10.0,
            width: 8.0,
            transition: animated,
        };

        let mut motion = IndicatorMotion::new(start);
        motion.retarget(Some(first), start);
        // Nothing drawn yet, so the first position appears immediately.
        assert_eq!(motion.current(start), Some(first));

        motion.retarget(Some(second), start);
        let midway = motion.current(start + Duration::from_millis(110)).unwrap();
        assert!(midway.left > 0.0 && midway.left < 10.0);
        assert!(motion.is_moving(start + Duration::from_millis(110)));

        let end = start + Duration::from_millis(u64::from(INDICATOR_TRANSITION_MS));
        assert_eq!(motion.current(end), Some(second));
        assert!(!motion.is_moving(end));
    }

    #[test]
    fn test_motion_jumps_without_transition() {
        let start = Instant::now();
        let mut motion = IndicatorMotion::new(start);
        let first = Indicator {
            left: 0.0,
            width: 6.0,
            transition: Transition::None,
        };
        let second = Indicator { left: 12.0, ..first };
        motion.retarget(Some(first), start);
        motion.retarget(Some(second), start);
        assert_eq!(motion.current(start), Some(second));
        assert!(!motion.is_moving(start));
    }
}
