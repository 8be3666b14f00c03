use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::header::{Bounds, CapsuleLayout, Indicator, LanguageCode, NavLink, TextDirection};
use crate::shared::HeaderTheme;

/// Glyph row drawn under the active link
pub const INDICATOR_GLYPH: &str = "▔";

/// Helper function to render text with proper Unicode support
/// Returns the number of columns (visual width) consumed
pub fn render_text_unicode_aware(
    text: &str,
    buf: &mut Buffer,
    x: u16,
    y: u16,
    max_x: u16,
    style: Style,
) -> u16 {
    let mut current_x = x;

    for grapheme in text.graphemes(true) {
        let width = grapheme.width();

        if current_x + width as u16 > max_x {
            break;
        }

        let cell = buf.get_mut(current_x, y);
        cell.set_symbol(grapheme);
        cell.set_style(style);

        current_x += width as u16;

        // Zero-width graphemes still take a cell
        if width == 0 && current_x == x {
            current_x += 1;
        }
    }

    current_x - x
}

fn fill(area: Rect, buf: &mut Buffer, style: Style) {
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            let cell = buf.get_mut(x, y);
            cell.set_char(' ');
            cell.set_style(style);
        }
    }
}

/// Clip a content box of the capsule to the visible capsule area.
/// `scroll` is the non-negative scroll distance.
pub fn capsule_item_rect(area: Rect, bounds: Bounds, scroll: f64) -> Option<Rect> {
    let left = (bounds.left - scroll).round();
    let right = (bounds.right() - scroll).round();
    let visible_left = left.max(0.0);
    let visible_right = right.min(f64::from(area.width));
    if visible_right <= visible_left || area.height == 0 {
        return None;
    }
    Some(Rect::new(
        area.x + visible_left as u16,
        area.y,
        (visible_right - visible_left) as u16,
        1,
    ))
}

/// Horizontally scrollable row of links with the sliding indicator below
pub struct NavCapsule<'a> {
    layout: &'a CapsuleLayout,
    scroll: f64,
    active: &'a str,
    focused: Option<&'a str>,
    indicator: Option<Indicator>,
    theme: &'a HeaderTheme,
    scrolled: bool,
}

impl<'a> NavCapsule<'a> {
    pub fn new(layout: &'a CapsuleLayout, active: &'a str, theme: &'a HeaderTheme) -> Self {
        Self {
            layout,
            scroll: 0.0,
            active,
            focused: None,
            indicator: None,
            theme,
            scrolled: false,
        }
    }

    pub fn scroll(mut self, scroll: f64) -> Self {
        self.scroll = scroll.abs();
        self
    }

    pub fn focused(mut self, focused: Option<&'a str>) -> Self {
        self.focused = focused;
        self
    }

    pub fn indicator(mut self, indicator: Option<Indicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn scrolled(mut self, scrolled: bool) -> Self {
        self.scrolled = scrolled;
        self
    }
}

impl<'a> Widget for NavCapsule<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        for item in &self.layout.items {
            let Some(rect) = capsule_item_rect(area, item.bounds, self.scroll) else {
                continue;
            };
            let style = if self.focused == Some(item.anchor_id.as_str()) {
                self.theme.focused_style()
            } else if item.anchor_id == self.active {
                self.theme.link_active_style()
            } else {
                self.theme.link_style(self.scrolled)
            };
            fill(rect, buf, style);

            // Text starts one padding cell in; skip whatever scrolled off the left edge.
            let text_left = (item.bounds.left - self.scroll + 1.0).round();
            let mut skip = (-text_left).max(0.0) as usize;
            let mut x = area.x + text_left.max(0.0) as u16;
            for grapheme in item.text.graphemes(true) {
                let width = grapheme.width();
                if skip > 0 {
                    skip = skip.saturating_sub(width.max(1));
                    continue;
                }
                if x + width as u16 > rect.right() {
                    break;
                }
                x += render_text_unicode_aware(grapheme, buf, x, area.y, rect.right(), style);
            }
        }

        if area.height < 2 {
            return;
        }
        if let Some(indicator) = self.indicator {
            let underline = Bounds {
                left: indicator.left,
                width: indicator.width,
            };
            let row = Rect::new(area.x, area.y + 1, area.width, 1);
            if let Some(rect) = capsule_item_rect(row, underline, 0.0) {
                for x in rect.left()..rect.right() {
                    let cell = buf.get_mut(x, rect.y);
                    cell.set_symbol(INDICATOR_GLYPH);
                    cell.set_style(self.theme.slider_style());
                }
            }
        }
    }
}

/// Small filled button with centred text
pub struct HeaderButton<'a> {
    text: &'a str,
    style: Style,
}

impl<'a> HeaderButton<'a> {
    pub fn new(text: &'a str, style: Style) -> Self {
        Self { text, style }
    }
}

impl<'a> Widget for HeaderButton<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let style = self.style;
        fill(area, buf, style);

        let text = truncate_to_width(self.text, area.width as usize);
        let x_offset = (area.width as usize).saturating_sub(text.width()) / 2;
        render_text_unicode_aware(
            &text,
            buf,
            area.x + x_offset as u16,
            area.y + area.height / 2,
            area.right(),
            style,
        );
    }
}

/// Rows of the language dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageMenuLayout {
    pub area: Rect,
    pub items: [(LanguageCode, Rect); 2],
}

/// Width of the language dropdown including its border
pub const LANGUAGE_MENU_WIDTH: u16 = 20;

impl LanguageMenuLayout {
    /// Drop below `anchor`, right-aligned for RTL and left-aligned for LTR,
    /// kept inside `screen`.
    pub fn new(anchor: Rect, direction: TextDirection, screen: Rect) -> Self {
        let width = LANGUAGE_MENU_WIDTH.min(screen.width);
        let height = 4u16.min(screen.height.saturating_sub(anchor.bottom()));
        let x = if direction.is_rtl() {
            anchor.right().saturating_sub(width)
        } else {
            anchor.x
        };
        let x = x.min(screen.right().saturating_sub(width)).max(screen.x);
        let area = Rect::new(x, anchor.bottom(), width, height);

        let row = |offset: u16| {
            let y = area.y + 1 + offset;
            if y + 1 < area.bottom() {
                Rect::new(area.x + 1, y, area.width.saturating_sub(2), 1)
            } else {
                Rect::new(area.x, area.y, 0, 0)
            }
        };
        Self {
            area,
            items: [(LanguageCode::Ar, row(0)), (LanguageCode::En, row(1))],
        }
    }
}

/// Language dropdown listing each language by its native name and region
pub struct LanguageMenu<'a> {
    layout: LanguageMenuLayout,
    current: LanguageCode,
    focused: Option<LanguageCode>,
    title: Option<&'a str>,
    theme: &'a HeaderTheme,
}

impl<'a> LanguageMenu<'a> {
    pub fn new(layout: LanguageMenuLayout, current: LanguageCode, theme: &'a HeaderTheme) -> Self {
        Self {
            layout,
            current,
            focused: None,
            title: None,
            theme,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn focused(mut self, focused: Option<LanguageCode>) -> Self {
        self.focused = focused;
        self
    }
}

impl<'a> Widget for LanguageMenu<'a> {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        let area = self.layout.area;
        if area.width < 4 || area.height < 3 {
            return;
        }
        fill(area, buf, self.theme.menu_style());
        let title = self.title.map(|t| truncate_to_width(t, area.width.saturating_sub(2) as usize));
        modern_block(title.as_deref(), self.theme, self.focused.is_some())
            .style(self.theme.menu_style())
            .render(area, buf);

        for (lang, rect) in self.layout.items {
            if rect.width == 0 {
                continue;
            }
            let style = if self.focused == Some(lang) {
                self.theme.focused_style()
            } else {
                self.theme.menu_item_style(lang == self.current)
            };
            fill(rect, buf, style);
            let label = format!(" {}  {}", lang.native_name(), lang.region_code());
            render_text_unicode_aware(&label, buf, rect.x, rect.y, rect.right(), style);
        }
    }
}

/// Hit areas inside the mobile drawer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawerLayout {
    pub panel: Rect,
    pub close_button: Rect,
    pub links: Vec<Rect>,
    pub cta: Rect,
    pub languages: [(LanguageCode, Rect); 2],
}

/// Widest the drawer gets, in columns
pub const DRAWER_MAX_WIDTH: u16 = 36;

/// Time the drawer takes to slide in
pub const DRAWER_SLIDE: Duration = Duration::from_millis(200);

/// Share of the drawer shown `elapsed` after it opened, eased out. Reduced
/// motion shows it whole at once.
pub fn drawer_progress(elapsed: Duration, reduced_motion: bool) -> f64 {
    if reduced_motion || elapsed >= DRAWER_SLIDE {
        return 1.0;
    }
    let t = elapsed.as_secs_f64() / DRAWER_SLIDE.as_secs_f64();
    1.0 - (1.0 - t).powi(3)
}

impl DrawerLayout {
    /// Panel docked to the right edge for RTL and the left edge for LTR.
    /// `progress` is how far it has slid out from that edge, 0 to 1.
    pub fn new(screen: Rect, link_count: usize, direction: TextDirection, progress: f64) -> Self {
        let full = (screen.width.saturating_mul(78) / 100).min(DRAWER_MAX_WIDTH);
        let width = (f64::from(full) * progress.clamp(0.0, 1.0)).round() as u16;
        let width = width.max(1);
        let x = if direction.is_rtl() {
            screen.right().saturating_sub(width)
        } else {
            screen.x
        };
        let panel = Rect::new(x, screen.y, width, screen.height);
        let inner_x = panel.x + 1;
        let inner_width = panel.width.saturating_sub(2);

        let clip = |y: u16, height: u16| {
            if y + height < panel.bottom() {
                Rect::new(inner_x, y, inner_width, height)
            } else {
                Rect::new(inner_x, panel.y, 0, 0)
            }
        };

        let close_button = Rect::new(
            (panel.right().saturating_sub(4)).max(panel.x),
            panel.y + 1,
            3u16.min(panel.width),
            1u16.min(panel.height),
        );
        let links_top = panel.y + 3;
        let links: Vec<Rect> = (0..link_count as u16)
            .map(|i| clip(links_top + i, 1))
            .collect();
        let cta = clip(links_top + link_count as u16 + 1, 1);

        let languages_y = cta.y + 2;
        let half = inner_width / 2;
        let languages = if languages_y + 1 < panel.bottom() && cta.height > 0 {
            [
                (LanguageCode::Ar, Rect::new(inner_x, languages_y, half, 1)),
                (
                    LanguageCode::En,
                    Rect::new(inner_x + half, languages_y, inner_width - half, 1),
                ),
            ]
        } else {
            [
                (LanguageCode::Ar, Rect::new(inner_x, panel.y, 0, 0)),
                (LanguageCode::En, Rect::new(inner_x, panel.y, 0, 0)),
            ]
        };

        Self {
            panel,
            close_button,
            links,
            cta,
            languages,
        }
    }
}

/// Off-canvas navigation panel
pub struct DrawerPanel<'a> {
    layout: &'a DrawerLayout,
    brand: &'a str,
    links: Vec<String>,
    active: Option<usize>,
    cta: &'a str,
    current: LanguageCode,
    theme: &'a HeaderTheme,
}

impl<'a> DrawerPanel<'a> {
    pub fn new(layout: &'a DrawerLayout, brand: &'a str, theme: &'a HeaderTheme) -> Self {
        Self {
            layout,
            brand,
            links: Vec::new(),
            active: None,
            cta: "",
            current: LanguageCode::DEFAULT,
            theme,
        }
    }

    /// Labels of `links` in `lang`, marking `active`
    pub fn links(mut self, links: &[NavLink], lang: LanguageCode, active: &str) -> Self {
        self.links = links.iter().map(|l| l.label(lang).to_string()).collect();
        self.active = links.iter().position(|l| l.anchor_id == active);
        self.current = lang;
        self
    }

    pub fn cta(mut self, cta: &'a str) -> Self {
        self.cta = cta;
        self
    }
}

impl<'a> Widget for DrawerPanel<'a> {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        let panel = self.layout.panel;
        if panel.width < 4 || panel.height < 3 {
            return;
        }
        fill(panel, buf, self.theme.drawer_style());
        modern_block(None, self.theme, true)
            .style(self.theme.drawer_style())
            .render(panel, buf);

        render_text_unicode_aware(
            self.brand,
            buf,
            panel.x + 2,
            panel.y + 1,
            self.layout.close_button.x,
            self.theme.brand_style(),
        );
        HeaderButton::new("✕", self.theme.menu_item_style(false)).render(self.layout.close_button, buf);

        for (index, (label, rect)) in self.links.iter().zip(&self.layout.links).enumerate() {
            if rect.width == 0 {
                continue;
            }
            let style = if self.active == Some(index) {
                self.theme.menu_item_style(true).fg(self.theme.primary)
            } else {
                self.theme.menu_item_style(false)
            };
            fill(*rect, buf, style);
            render_text_unicode_aware(&format!(" {label}"), buf, rect.x, rect.y, rect.right(), style);
        }

        HeaderButton::new(self.cta, self.theme.cta_style()).render(self.layout.cta, buf);

        for (lang, rect) in self.layout.languages {
            let label = format!("{} {}", lang.native_name(), lang.region_code());
            HeaderButton::new(&label, self.theme.menu_item_style(lang == self.current)).render(rect, buf);
        }
    }
}

/// Dimmed layer behind the drawer
pub struct Backdrop<'a> {
    theme: &'a HeaderTheme,
}

impl<'a> Backdrop<'a> {
    pub fn new(theme: &'a HeaderTheme) -> Self {
        Self { theme }
    }
}

impl<'a> Widget for Backdrop<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.backdrop_style());
    }
}

/// Helper function to create a styled block
pub fn modern_block<'a>(title: Option<&'a str>, theme: &'a HeaderTheme, focused: bool) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            theme.border_focused_style()
        } else {
            theme.border_style()
        });

    if let Some(title) = title {
        block = block.title(title);
    }

    block
}

/// Line with an icon glyph before the text
pub fn icon_line<'a>(icon: &'a str, text: String, style: Style) -> Line<'a> {
    Line::from(vec![Span::styled(icon, style), Span::raw(" "), Span::styled(text, style)])
}

/// Truncate to `max_width` columns on grapheme boundaries, marking the cut
/// with an ellipsis
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let target_width = max_width.saturating_sub(ellipsis.width());
    let mut result = String::new();
    let mut current_width = 0;

    for grapheme in text.graphemes(true) {
        let grapheme_width = grapheme.width();
        if current_width + grapheme_width > target_width {
            break;
        }
        result.push_str(grapheme);
        current_width += grapheme_width;
    }

    if max_width >= ellipsis.width() {
        result.push_str(ellipsis);
    }
    result
}
