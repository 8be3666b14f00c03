use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, ClickAction},
    header::{Bounds, Document, HitRegions, LinkOrigin, MenuOrigin, Region, TextDirection},
    shared::HeaderTheme,
    widgets::{
        capsule_item_rect, drawer_progress, icon_line, Backdrop, DrawerLayout, DrawerPanel,
        HeaderButton, LanguageMenu, LanguageMenuLayout, NavCapsule,
    },
};

/// Rows taken by the header: the bar, the indicator row and a rule
pub const HEADER_HEIGHT: u16 = 3;

/// Below this width the capsule gives way to the menu button
pub const NARROW_WIDTH: u16 = 72;

/// From this width on the call-to-action is shown in the bar
pub const WIDE_WIDTH: u16 = 100;

const BRAND_WIDTH: u16 = 8;
const CHIP_WIDTH: u16 = 6;
const MENU_BUTTON_WIDTH: u16 = 3;

/// Anchor the brand logo links to
pub const HOME_ANCHOR: &str = "home";

/// Screen split between header, page and status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub page: Rect,
    pub status: Rect,
}

pub fn layout_areas(size: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // Header
            Constraint::Min(0),                // Page
            Constraint::Length(1),             // Key hints
        ])
        .split(size);
    Areas {
        header: chunks[0],
        page: chunks[1],
        status: chunks[2],
    }
}

/// Where each header control sits on the bar row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSlots {
    pub brand: Rect,
    pub capsule: Option<Rect>,
    pub chip: Rect,
    pub cta: Option<Rect>,
    pub menu_button: Option<Rect>,
}

#[derive(Clone, Copy)]
enum Slot {
    Brand,
    Capsule,
    Chip,
    Cta,
    Menu,
}

/// Split the bar row. Right-to-left mirrors the order so the brand sits on
/// the right edge.
pub fn header_slots(bar: Rect, direction: TextDirection, cta_width: u16) -> HeaderSlots {
    let narrow = bar.width < NARROW_WIDTH;
    let wide = bar.width >= WIDE_WIDTH;

    let mut slots = vec![(Slot::Brand, Constraint::Length(BRAND_WIDTH))];
    slots.push(if narrow {
        (Slot::Capsule, Constraint::Min(0))
    } else {
        (Slot::Capsule, Constraint::Min(10))
    });
    slots.push((Slot::Chip, Constraint::Length(CHIP_WIDTH)));
    if wide {
        slots.push((Slot::Cta, Constraint::Length(cta_width)));
    }
    if narrow {
        slots.push((Slot::Menu, Constraint::Length(MENU_BUTTON_WIDTH)));
    }
    if direction.is_rtl() {
        slots.reverse();
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(slots.iter().map(|(_, c)| *c).collect::<Vec<_>>())
        .split(bar);

    let mut result = HeaderSlots {
        brand: Rect::default(),
        capsule: None,
        chip: Rect::default(),
        cta: None,
        menu_button: None,
    };
    for ((slot, _), rect) in slots.iter().zip(chunks.iter()) {
        match slot {
            Slot::Brand => result.brand = *rect,
            Slot::Capsule if !narrow => result.capsule = Some(*rect),
            Slot::Capsule => {}
            Slot::Chip => result.chip = *rect,
            Slot::Cta => result.cta = Some(*rect),
            Slot::Menu => result.menu_button = Some(*rect),
        }
    }
    result
}

/// Draw the main UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let theme = app.theme.clone();
    let size = f.size();
    let areas = layout_areas(size);
    let now = Instant::now();

    app.click_targets.clear();
    let mut regions = HitRegions::default();

    draw_page(f, areas.page, app, &theme);
    let chip = draw_header(f, areas.header, app, &theme, now, &mut regions);
    draw_status(f, areas.status, app, &theme);

    let toggles = app.header.toggles();
    if toggles.language_menu_open {
        draw_language_menu(f, chip, size, app, &theme, &mut regions);
    }
    if toggles.drawer_open {
        draw_drawer(f, size, app, &theme, now, &mut regions);
    }

    app.header.set_hit_regions(regions);
}

/// Returns the language chip's area
fn draw_header(
    f: &mut Frame,
    area: Rect,
    app: &mut App,
    theme: &HeaderTheme,
    now: Instant,
    regions: &mut HitRegions,
) -> Rect {
    let scrolled = app.header.is_scrolled();
    let direction = app.header.direction();
    f.render_widget(Clear, area);
    f.buffer_mut().set_style(area, theme.header_style(scrolled));

    let join = app.header.t("header.join", None);
    let bar = Rect::new(area.x, area.y, area.width, 1);
    let slots = header_slots(bar, direction, join.width() as u16 + 4);

    // Brand
    let brand = app.header.t("brand", Some("GYMX"));
    let brand_line = Line::from(Span::styled(brand, theme.brand_style()));
    let alignment = if direction.is_rtl() {
        Alignment::Right
    } else {
        Alignment::Left
    };
    f.render_widget(Paragraph::new(brand_line).alignment(alignment), pad(slots.brand));
    app.click_targets.push(
        slots.brand,
        ClickAction::Link {
            anchor: HOME_ANCHOR.to_string(),
            origin: LinkOrigin::Logo,
        },
    );

    // Capsule and sliding indicator
    if let Some(capsule) = slots.capsule {
        let bounds = Bounds {
            left: f64::from(capsule.x),
            width: f64::from(capsule.width),
        };
        let target = app
            .header
            .layout_capsule(bounds, app.page.prefers_reduced_motion());
        app.indicator.retarget(target, now);
        let shown = app.indicator.current(now);

        let focused = app
            .focused_link
            .and_then(|i| app.header.links().get(i))
            .map(|l| l.anchor_id.as_str());
        if let Some(layout) = app.header.capsule_layout() {
            let scroll = app.header.capsule_scroll();
            let row = Rect::new(capsule.x, area.y, capsule.width, 1);
            for item in &layout.items {
                if let Some(rect) = capsule_item_rect(row, item.bounds, scroll) {
                    app.click_targets.push(
                        rect,
                        ClickAction::Link {
                            anchor: item.anchor_id.clone(),
                            origin: LinkOrigin::Capsule,
                        },
                    );
                }
            }
            let widget = NavCapsule::new(layout, app.header.active(), theme)
                .scroll(scroll)
                .focused(focused)
                .indicator(shown)
                .scrolled(scrolled);
            f.render_widget(widget, Rect::new(capsule.x, area.y, capsule.width, 2u16.min(area.height)));
        }
    }

    // Language chip
    let open = app.header.toggles().language_menu_open;
    let chip_text = format!("{} ▾", app.header.language().chip_label());
    f.render_widget(
        HeaderButton::new(&chip_text, theme.chip_style(scrolled, open)),
        slots.chip,
    );
    app.click_targets.push(slots.chip, ClickAction::ToggleLanguageMenu);
    regions.language_button = Some(region(slots.chip));

    if let Some(cta) = slots.cta {
        f.render_widget(HeaderButton::new(&join, theme.cta_style()), cta);
        app.click_targets.push(cta, ClickAction::Join);
    }

    if let Some(menu) = slots.menu_button {
        let drawer_open = app.header.toggles().drawer_open;
        let glyph = if drawer_open { "✕" } else { "☰" };
        f.render_widget(HeaderButton::new(glyph, theme.link_style(scrolled)), menu);
        app.click_targets.push(menu, ClickAction::ToggleDrawer);
        regions.menu_button = Some(region(menu));
    }

    // Rule under the header
    if area.height >= HEADER_HEIGHT {
        let rule = Rect::new(area.x, area.y + HEADER_HEIGHT - 1, area.width, 1);
        f.render_widget(
            Paragraph::new("─".repeat(rule.width as usize)).style(theme.border_style()),
            rule,
        );
    }

    slots.chip
}

fn draw_page(f: &mut Frame, area: Rect, app: &App, theme: &HeaderTheme) {
    if area.height == 0 {
        return;
    }
    let scroll_row = app.page.scroll_row();
    let rtl = app.header.direction().is_rtl();
    let alignment = if rtl { Alignment::Right } else { Alignment::Left };

    for (index, (section, top)) in app.page.section_rows().enumerate() {
        let style = theme.section_style(index == 0);
        let icon = app
            .header
            .links()
            .iter()
            .find(|l| l.anchor_id == section.id)
            .and_then(|l| l.icon)
            .map(|icon| icon.glyph())
            .unwrap_or("•");
        let title = app.header.t(&section.title_key(), Some(section.id.as_str()));
        let body_key = section.body_key();
        let body = app.header.t(&body_key, None);
        let body = if body == body_key { String::new() } else { body };

        let mut lines = vec![Line::default(), icon_line(icon, title, theme.section_title_style()), Line::default()];
        lines.extend(body.lines().map(|l| Line::from(l.to_string())));

        for offset in 0..u32::from(section.rows) {
            let page_row = top + offset;
            let Some(screen_row) = page_row.checked_sub(scroll_row) else {
                continue;
            };
            if screen_row >= u32::from(area.height) {
                break;
            }
            let rect = Rect::new(area.x, area.y + screen_row as u16, area.width, 1);
            f.buffer_mut().set_style(rect, style);
            if let Some(line) = lines.get(offset as usize) {
                f.render_widget(
                    Paragraph::new(line.clone()).style(style).alignment(alignment),
                    pad(rect),
                );
            }
        }
    }
}

/// Translation key naming what the focused control does, if anything
pub fn control_hint_key(app: &App, narrow: bool) -> Option<&'static str> {
    let toggles = app.header.toggles();
    if toggles.language_menu_open {
        let focused = app.menu_focus.unwrap_or_else(|| app.header.language());
        Some(focused.switch_key())
    } else if toggles.drawer_open {
        Some("header.closeMenu")
    } else if narrow {
        Some("header.openMenu")
    } else {
        None
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App, theme: &HeaderTheme) {
    if area.height == 0 {
        return;
    }
    let hints = app.header.t("help.keys", None);
    let location = format!("#{} ", app.header.active());
    let mut spans = vec![Span::styled(format!(" {hints}"), theme.dimmed_style())];
    if let Some(key) = control_hint_key(app, area.width < NARROW_WIDTH) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(app.header.t(key, None), theme.focused_style()));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(location, theme.brand_style()));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_language_menu(
    f: &mut Frame,
    chip: Rect,
    screen: Rect,
    app: &mut App,
    theme: &HeaderTheme,
    regions: &mut HitRegions,
) {
    let layout = LanguageMenuLayout::new(chip, app.header.direction(), screen);
    let title = app.header.t("header.languageSwitcher", None);
    f.render_widget(Clear, layout.area);
    f.render_widget(
        LanguageMenu::new(layout, app.header.language(), theme)
            .title(&title)
            .focused(app.menu_focus),
        layout.area,
    );

    app.click_targets.push(layout.area, ClickAction::Inert);
    for (lang, rect) in layout.items {
        app.click_targets.push(
            rect,
            ClickAction::SelectLanguage {
                lang,
                origin: MenuOrigin::LanguageMenu,
            },
        );
    }
    regions.language_menu = Some(region(layout.area));
}

fn draw_drawer(
    f: &mut Frame,
    screen: Rect,
    app: &mut App,
    theme: &HeaderTheme,
    now: Instant,
    regions: &mut HitRegions,
) {
    f.render_widget(Backdrop::new(theme), screen);
    app.click_targets.push(screen, ClickAction::CloseDrawer);

    let reduced_motion = app.page.prefers_reduced_motion();
    let progress = app
        .drawer_slide
        .map(|started| drawer_progress(now.saturating_duration_since(started), reduced_motion))
        .unwrap_or(1.0);
    let layout = DrawerLayout::new(
        screen,
        app.header.links().len(),
        app.header.direction(),
        progress,
    );
    f.render_widget(Clear, layout.panel);

    let brand = app.header.t("brand", Some("GYMX"));
    let join = app.header.t("header.join", None);
    let panel = DrawerPanel::new(&layout, &brand, theme)
        .links(app.header.links(), app.header.language(), app.header.active())
        .cta(&join);
    f.render_widget(panel, layout.panel);

    app.click_targets.push(layout.panel, ClickAction::Inert);
    app.click_targets.push(layout.close_button, ClickAction::CloseDrawer);
    let anchors: Vec<String> = app
        .header
        .links()
        .iter()
        .map(|l| l.anchor_id.clone())
        .collect();
    for (anchor, rect) in anchors.into_iter().zip(&layout.links) {
        app.click_targets.push(
            *rect,
            ClickAction::Link {
                anchor,
                origin: LinkOrigin::Drawer,
            },
        );
    }
    app.click_targets.push(layout.cta, ClickAction::CloseDrawer);
    for (lang, rect) in layout.languages {
        app.click_targets.push(
            rect,
            ClickAction::SelectLanguage {
                lang,
                origin: MenuOrigin::Drawer,
            },
        );
    }
    regions.drawer_panel = Some(region(layout.panel));
}

fn region(rect: Rect) -> Region {
    Region::new(rect.x, rect.y, rect.width, rect.height)
}

/// One cell of horizontal padding on both sides
fn pad(area: Rect) -> Rect {
    if area.width <= 2 {
        return area;
    }
    Rect::new(area.x + 1, area.y, area.width - 2, area.height)
}
