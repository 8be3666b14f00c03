use ratatui::style::{Color, Modifier, Style};

use super::config::StyleVariant;

/// Colour palette for the header and the page behind it
#[derive(Debug, Clone)]
pub struct HeaderTheme {
    pub variant: StyleVariant,

    // Brand colors
    pub primary: Color,
    pub primary_soft: Color,

    // Surfaces
    pub page: Color,
    pub hero: Color,
    pub glass: Color,
    pub drawer: Color,
    pub backdrop: Color,

    // Text colors
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_on_hero: Color,
    pub text_disabled: Color,

    // Interactive colors
    pub selected: Color,
    pub border: Color,
    pub border_focused: Color,
}

impl Default for HeaderTheme {
    fn default() -> Self {
        Self::glass()
    }
}

impl HeaderTheme {
    pub fn for_variant(variant: StyleVariant) -> Self {
        match variant {
            StyleVariant::Glass => Self::glass(),
            StyleVariant::Transparent => Self::transparent(),
        }
    }

    /// Frosted header that stays opaque
    pub fn glass() -> Self {
        Self {
            variant: StyleVariant::Glass,

            primary: Color::Rgb(249, 115, 22),      // Orange-500
            primary_soft: Color::Rgb(254, 215, 170), // Orange-200

            page: Color::Rgb(17, 24, 39),   // Gray-900
            hero: Color::Rgb(28, 25, 23),   // Stone-900
            glass: Color::Rgb(243, 244, 246), // Gray-100
            drawer: Color::Rgb(255, 255, 255),
            backdrop: Color::Rgb(3, 7, 18), // Gray-950

            text_primary: Color::Rgb(17, 24, 39),    // Gray-900
            text_secondary: Color::Rgb(75, 85, 99),  // Gray-600
            text_on_hero: Color::Rgb(249, 250, 251), // Gray-50
            text_disabled: Color::Rgb(156, 163, 175), // Gray-400

            selected: Color::Rgb(255, 237, 213),      // Orange-100
            border: Color::Rgb(209, 213, 219),        // Gray-300
            border_focused: Color::Rgb(249, 115, 22), // Orange-500
        }
    }

    /// Header that sits transparently on the hero until the page scrolls
    pub fn transparent() -> Self {
        Self {
            variant: StyleVariant::Transparent,
            glass: Color::Rgb(255, 255, 255),
            ..Self::glass()
        }
    }

    /// Whether the header draws its own surface in the current state
    pub fn header_is_opaque(&self, scrolled: bool) -> bool {
        self.variant == StyleVariant::Glass || scrolled
    }

    /// Header bar background
    pub fn header_style(&self, scrolled: bool) -> Style {
        if self.header_is_opaque(scrolled) {
            Style::default().bg(self.glass).fg(self.text_primary)
        } else {
            Style::default().bg(self.hero).fg(self.text_on_hero)
        }
    }

    pub fn brand_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Inactive capsule link
    pub fn link_style(&self, scrolled: bool) -> Style {
        if self.header_is_opaque(scrolled) {
            Style::default().fg(self.text_secondary)
        } else {
            Style::default().fg(self.text_on_hero)
        }
    }

    pub fn link_active_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Sliding underline under the active link
    pub fn slider_style(&self) -> Style {
        Style::default().fg(self.primary)
    }

    /// Language chip button
    pub fn chip_style(&self, scrolled: bool, open: bool) -> Style {
        let style = self.link_style(scrolled).add_modifier(Modifier::BOLD);
        if open {
            style.fg(self.primary)
        } else {
            style
        }
    }

    pub fn cta_style(&self) -> Style {
        Style::default()
            .bg(self.primary)
            .fg(self.text_on_hero)
            .add_modifier(Modifier::BOLD)
    }

    pub fn menu_style(&self) -> Style {
        Style::default().bg(self.drawer).fg(self.text_primary)
    }

    pub fn menu_item_style(&self, current: bool) -> Style {
        if current {
            Style::default()
                .bg(self.selected)
                .fg(self.text_primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text_primary)
        }
    }

    /// Keyboard focus ring
    pub fn focused_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::REVERSED)
    }

    pub fn drawer_style(&self) -> Style {
        Style::default().bg(self.drawer).fg(self.text_primary)
    }

    pub fn backdrop_style(&self) -> Style {
        Style::default().bg(self.backdrop).fg(self.text_disabled)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn border_focused_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::BOLD)
    }

    /// Page section surface; the first section is the hero
    pub fn section_style(&self, hero: bool) -> Style {
        if hero {
            Style::default().bg(self.hero).fg(self.text_on_hero)
        } else {
            Style::default().bg(self.page).fg(self.text_on_hero)
        }
    }

    pub fn section_title_style(&self) -> Style {
        Style::default()
            .fg(self.primary_soft)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed_style(&self) -> Style {
        Style::default().fg(self.text_disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_glass() {
        let theme = HeaderTheme::default();
        assert_eq!(theme.variant, StyleVariant::Glass);
        assert_eq!(theme.glass, Color::Rgb(243, 244, 246));
    }

    #[test]
    fn test_glass_header_is_always_opaque() {
        let theme = HeaderTheme::for_variant(StyleVariant::Glass);
        assert!(theme.header_is_opaque(false));
        assert_eq!(theme.header_style(false), theme.header_style(true));
    }

    #[test]
    fn test_transparent_header_follows_scroll() {
        let theme = HeaderTheme::for_variant(StyleVariant::Transparent);
        assert!(!theme.header_is_opaque(false));
        assert!(theme.header_is_opaque(true));
        assert_eq!(theme.header_style(false).bg, Some(theme.hero));
        assert_eq!(theme.header_style(true).bg, Some(theme.glass));
        assert_eq!(theme.link_style(false).fg, Some(theme.text_on_hero));
        assert_eq!(theme.link_style(true).fg, Some(theme.text_secondary));
    }

    #[test]
    fn test_active_link_stands_out() {
        let theme = HeaderTheme::glass();
        assert_eq!(theme.link_active_style().fg, Some(theme.primary));
        assert!(theme.link_active_style().add_modifier.contains(Modifier::BOLD));
        assert_eq!(theme.slider_style().fg, theme.link_active_style().fg);
    }

    #[test]
    fn test_current_menu_item_is_highlighted() {
        let theme = HeaderTheme::glass();
        assert_eq!(theme.menu_item_style(true).bg, Some(theme.selected));
        assert_eq!(theme.menu_item_style(false).bg, None);
    }
}
