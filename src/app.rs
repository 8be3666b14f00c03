use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::header::{
    detect_platform_locale, Document, Effect, Header, HeaderEvent, HeaderOptions,
    IndicatorMotion, LanguageCode, LinkOrigin, MenuOrigin, Point, ScrollBehavior, ScrollSource,
};
use crate::page::{DocumentEnvironment, Page, ScrollTick};
use crate::shared::{Config, Dictionaries, HeaderTheme, LocalStorage};
use crate::ui;
use crate::widgets::DRAWER_SLIDE;

/// Frame interval while something is animating
const FRAME: Duration = Duration::from_millis(16);

/// Rows moved per wheel notch
const WHEEL_ROWS: i32 = 3;

/// Messages from the input reader
#[derive(Debug)]
pub enum AppEvent {
    Input(Event),
    InputClosed,
}

/// What a click on a screen area does
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    Link { anchor: String, origin: LinkOrigin },
    ToggleLanguageMenu,
    ToggleDrawer,
    CloseDrawer,
    SelectLanguage { lang: LanguageCode, origin: MenuOrigin },
    Join,
    /// Swallows the click, e.g. over the drawer panel
    Inert,
}

/// Clickable areas recorded by the last draw, bottom-most first
#[derive(Debug, Default)]
pub struct ClickTargets {
    targets: Vec<(Rect, ClickAction)>,
}

impl ClickTargets {
    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn push(&mut self, area: Rect, action: ClickAction) {
        if area.width > 0 && area.height > 0 {
            self.targets.push((area, action));
        }
    }

    /// Area of the top-most target with this action
    #[cfg(test)]
    pub fn area_of(&self, action: &ClickAction) -> Option<Rect> {
        self.targets
            .iter()
            .rev()
            .find(|(_, candidate)| candidate == action)
            .map(|(area, _)| *area)
    }

    /// Top-most target under the point
    pub fn hit(&self, column: u16, row: u16) -> Option<&ClickAction> {
        self.targets
            .iter()
            .rev()
            .find(|(area, _)| {
                column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
            })
            .map(|(_, action)| action)
    }
}

/// Application state
pub struct App {
    pub should_quit: bool,
    pub theme: HeaderTheme,
    pub page: Page,
    pub header: Header<DocumentEnvironment>,
    /// Keyboard focus, an index into the header's links
    pub focused_link: Option<usize>,
    /// Keyboard focus inside the open language menu
    pub menu_focus: Option<LanguageCode>,
    pub click_targets: ClickTargets,
    pub indicator: IndicatorMotion,
    /// When the drawer started sliding in; `None` once it is fully out
    pub drawer_slide: Option<Instant>,
    pub needs_redraw: bool,
}

impl App {
    /// Create a new App instance sized for a `width` x `height` terminal.
    /// Without `storage` the language preference is not remembered.
    pub fn new(
        config: Config,
        dictionaries: Arc<Dictionaries>,
        storage: Option<LocalStorage>,
        (width, height): (u16, u16),
    ) -> Self {
        let links = config.nav_links();
        let areas = ui::layout_areas(Rect::new(0, 0, width, height));
        let page = Page::from_links(&links, areas.page.height, config.reduced_motion);

        let env = DocumentEnvironment::new(&page, storage);
        let locale = detect_platform_locale();
        let options = HeaderOptions {
            links,
            dictionaries,
            style_variant: config.style_variant,
            scroll_threshold: config.scroll_threshold_px,
        };
        let header = Header::mount(options, env, locale.as_deref(), &page);
        info!(
            lang = %header.language(),
            style = config.style_display(),
            "Header ready"
        );

        Self {
            should_quit: false,
            theme: HeaderTheme::for_variant(header.style_variant()),
            page,
            header,
            focused_link: None,
            menu_focus: None,
            click_targets: ClickTargets::default(),
            indicator: IndicatorMotion::new(Instant::now()),
            drawer_slide: None,
            needs_redraw: true,
        }
    }

    /// Run the main application loop, unmounting the header when it ends
    pub async fn run(mut self) -> Result<()> {
        if !IsTty::is_tty(&io::stdout()) {
            eprintln!("This application requires a TTY terminal to run.");
            return Ok(());
        }

        let _guard = TerminalGuard::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

        let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_input_reader(tx, Arc::clone(&stop));
        let mut frames = tokio::time::interval(FRAME);

        while !self.should_quit {
            if self.needs_redraw {
                terminal.draw(|f| ui::draw(f, &mut self))?;
                self.needs_redraw = false;
            }

            tokio::select! {
                message = rx.recv() => match message {
                    Some(AppEvent::Input(event)) => self.handle_event(event),
                    Some(AppEvent::InputClosed) | None => {
                        warn!("Input reader stopped");
                        self.should_quit = true;
                    }
                },
                _ = frames.tick() => self.tick(Instant::now()),
            }
        }

        stop.store(true, Ordering::Relaxed);
        if let Err(e) = reader.await {
            warn!("Input reader did not shut down cleanly: {e}");
        }
        terminal.show_cursor()?;
        self.header.unmount();
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key_event(key.code, key.modifiers);
            }
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    /// Advance animations
    pub fn tick(&mut self, now: Instant) {
        match self.page.tick(now) {
            ScrollTick::Idle => {}
            ScrollTick::Moved => self.dispatch(HeaderEvent::Scrolled(ScrollSource::Programmatic)),
            ScrollTick::Settled => {
                self.dispatch(HeaderEvent::Scrolled(ScrollSource::Programmatic));
                self.dispatch(HeaderEvent::ScrollSettled);
            }
        }
        if self.indicator.is_moving(now) {
            self.needs_redraw = true;
        }
        if let Some(started) = self.drawer_slide {
            if now.saturating_duration_since(started) >= DRAWER_SLIDE {
                self.drawer_slide = None;
            }
            self.needs_redraw = true;
        }
    }

    /// Handle keyboard input
    pub fn handle_key_event(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        self.needs_redraw = true;
        let toggles = self.header.toggles();
        if toggles.language_menu_open && self.handle_menu_key(key) {
            return;
        }
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => self.should_quit = true,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.dispatch(HeaderEvent::EscapePressed),
            KeyCode::Char('l') => self.dispatch(HeaderEvent::ToggleLanguageMenu),
            KeyCode::Char('m') => self.dispatch(HeaderEvent::ToggleDrawer),
            KeyCode::Char(c @ ('a' | 'e')) if toggles.language_menu_open || toggles.drawer_open => {
                let lang = if c == 'a' { LanguageCode::Ar } else { LanguageCode::En };
                let origin = if toggles.language_menu_open {
                    MenuOrigin::LanguageMenu
                } else {
                    MenuOrigin::Drawer
                };
                self.dispatch(HeaderEvent::SelectLanguage { lang, origin });
            }
            KeyCode::Tab => self.move_focus(1),
            KeyCode::BackTab => self.move_focus(-1),
            KeyCode::Enter => {
                if let Some(index) = self.focused_link {
                    self.activate_link(index);
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < self.header.links().len() {
                    self.focused_link = Some(index);
                    self.activate_link(index);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.user_scroll(-1),
            KeyCode::Down | KeyCode::Char('j') => self.user_scroll(1),
            KeyCode::PageUp => self.user_scroll(-self.page_step()),
            KeyCode::PageDown => self.user_scroll(self.page_step()),
            _ => {}
        }
    }

    /// Keys that move through the open language menu; returns whether the
    /// key was used
    fn handle_menu_key(&mut self, key: KeyCode) -> bool {
        let focused = self.menu_focus.unwrap_or_else(|| self.header.language());
        match key {
            KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Up
            | KeyCode::Down
            | KeyCode::Char('j')
            | KeyCode::Char('k') => {
                self.menu_focus = Some(focused.other());
                true
            }
            KeyCode::Enter => {
                self.dispatch(HeaderEvent::SelectLanguage {
                    lang: focused,
                    origin: MenuOrigin::LanguageMenu,
                });
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.dispatch(HeaderEvent::PointerDown(Point {
                    x: mouse.column,
                    y: mouse.row,
                }));
                if let Some(action) = self.click_targets.hit(mouse.column, mouse.row).cloned() {
                    self.click(action);
                }
            }
            MouseEventKind::ScrollUp => self.user_scroll(-WHEEL_ROWS),
            MouseEventKind::ScrollDown => self.user_scroll(WHEEL_ROWS),
            _ => {}
        }
    }

    pub fn click(&mut self, action: ClickAction) {
        debug!(?action, "Click");
        match action {
            ClickAction::Link { anchor, origin } => {
                self.focused_link = self.header.links().iter().position(|l| l.anchor_id == anchor);
                self.dispatch(HeaderEvent::LinkClicked { anchor, origin });
            }
            ClickAction::ToggleLanguageMenu => self.dispatch(HeaderEvent::ToggleLanguageMenu),
            ClickAction::ToggleDrawer => self.dispatch(HeaderEvent::ToggleDrawer),
            ClickAction::CloseDrawer => self.dispatch(HeaderEvent::CloseDrawer),
            ClickAction::SelectLanguage { lang, origin } => {
                self.dispatch(HeaderEvent::SelectLanguage { lang, origin })
            }
            ClickAction::Join => info!("Join requested"),
            ClickAction::Inert => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let areas = ui::layout_areas(Rect::new(0, 0, width, height));
        self.page.set_viewport_rows(areas.page.height);
        self.dispatch(HeaderEvent::Resized);
    }

    fn page_step(&self) -> i32 {
        i32::from(self.page.viewport_rows().saturating_sub(2).max(1))
    }

    fn user_scroll(&mut self, rows: i32) {
        if self.page.scroll_by(rows) {
            self.dispatch(HeaderEvent::Scrolled(ScrollSource::User));
        }
    }

    fn move_focus(&mut self, step: isize) {
        let count = self.header.links().len() as isize;
        if count == 0 {
            return;
        }
        let next = match self.focused_link {
            Some(index) => (index as isize + step).rem_euclid(count),
            None if step > 0 => 0,
            None => count - 1,
        };
        self.focused_link = Some(next as usize);
    }

    fn activate_link(&mut self, index: usize) {
        let Some(link) = self.header.links().get(index) else {
            return;
        };
        let anchor = link.anchor_id.clone();
        let origin = if self.header.toggles().drawer_open {
            LinkOrigin::Drawer
        } else {
            LinkOrigin::Capsule
        };
        self.dispatch(HeaderEvent::LinkClicked { anchor, origin });
    }

    /// Feed an event to the header and carry out what it asks for. Platform
    /// events only reach it while a listener of their kind is registered.
    pub fn dispatch(&mut self, event: HeaderEvent) {
        if let Some(kind) = event.listener_kind() {
            if !self.page.is_listening(kind) {
                trace!(?event, "No listener, event dropped");
                return;
            }
        }
        let drawer_was_open = self.header.toggles().drawer_open;
        let effects = self.header.handle(event, &self.page);
        self.needs_redraw = true;

        let toggles = self.header.toggles();
        if !toggles.language_menu_open {
            self.menu_focus = None;
        }
        if toggles.drawer_open != drawer_was_open {
            let slide = toggles.drawer_open && !self.page.prefers_reduced_motion();
            self.drawer_slide = slide.then(Instant::now);
        }

        for effect in effects {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::ScrollIntoView { anchor, behavior } => {
                let scrolled = self.page.scroll_into_view(&anchor, behavior, Instant::now());
                if scrolled && behavior == ScrollBehavior::Instant {
                    self.dispatch(HeaderEvent::Scrolled(ScrollSource::Programmatic));
                    self.dispatch(HeaderEvent::ScrollSettled);
                }
            }
            Effect::PushHistory(hash) => self.page.push_history(&hash),
            Effect::SetLocationHash(hash) => {
                if self.page.set_location_hash(&hash) {
                    self.dispatch(HeaderEvent::HashChanged);
                }
            }
        }
    }
}

/// Restores the terminal on every exit path
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        let guard = TerminalGuard;
        enable_raw_mode().context("Failed to enable raw mode")?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter the alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to disable raw mode: {e}");
        }
        if let Err(e) = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen, cursor::Show) {
            warn!("Failed to restore the terminal: {e}");
        }
    }
}

/// Current terminal size, or a conventional default when there is none
pub fn terminal_size() -> (u16, u16) {
    terminal::size().unwrap_or((80, 24))
}

fn spawn_input_reader(
    tx: mpsc::UnboundedSender<AppEvent>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(50)) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if tx.send(AppEvent::Input(event)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read terminal event: {e}");
                        let _ = tx.send(AppEvent::InputClosed);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to poll terminal events: {e}");
                    let _ = tx.send(AppEvent::InputClosed);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{DictionariesBuilder, StyleVariant};

    fn app_with(config: Config, dir: &tempfile::TempDir) -> App {
        let dictionaries = DictionariesBuilder::with_builtin().unwrap().build();
        let storage = LocalStorage::new(dir.path().join("storage.json"));
        App::new(config, dictionaries, Some(storage), (120, 30))
    }

    fn app(dir: &tempfile::TempDir) -> App {
        app_with(Config::default(), dir)
    }

    #[test]
    fn test_click_targets_prefer_topmost() {
        let mut targets = ClickTargets::default();
        targets.push(Rect::new(0, 0, 80, 24), ClickAction::CloseDrawer);
        targets.push(Rect::new(0, 0, 30, 24), ClickAction::Join);
        targets.push(Rect::new(50, 0, 0, 1), ClickAction::ToggleDrawer);

        assert_eq!(targets.hit(5, 5), Some(&ClickAction::Join));
        assert_eq!(targets.hit(40, 5), Some(&ClickAction::CloseDrawer));
        assert_eq!(targets.hit(50, 0), Some(&ClickAction::CloseDrawer));
        assert_eq!(targets.hit(90, 5), None);
    }

    #[test]
    fn test_digit_key_navigates_smoothly() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.handle_key_event(KeyCode::Char('3'), KeyModifiers::NONE);
        assert_eq!(app.header.active(), "trainers");
        assert_eq!(app.focused_link, Some(2));
        assert!(app.page.is_animating());
        assert_eq!(app.page.location_hash().as_deref(), Some("#trainers"));

        let done = Instant::now() + Duration::from_secs(1);
        app.tick(done);
        assert!(!app.page.is_animating());
        assert_eq!(app.header.active(), "trainers");
    }

    #[test]
    fn test_reduced_motion_jumps() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            reduced_motion: true,
            ..Config::default()
        };
        let mut app = app_with(config, &dir);
        app.handle_key_event(KeyCode::Char('2'), KeyModifiers::NONE);
        assert!(!app.page.is_animating());
        assert_eq!(app.page.scroll_offset(), app.page.section("classes").unwrap().top);
        assert_eq!(app.header.active(), "classes");
    }

    #[test]
    fn test_tab_focus_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.handle_key_event(KeyCode::BackTab, KeyModifiers::NONE);
        assert_eq!(app.focused_link, Some(3));
        app.handle_key_event(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.focused_link, Some(0));
    }

    #[test]
    fn test_escape_and_quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.handle_key_event(KeyCode::Char('l'), KeyModifiers::NONE);
        assert!(app.header.toggles().language_menu_open);
        app.handle_key_event(KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.header.toggles().language_menu_open);
        assert!(!app.should_quit);
        app.handle_key_event(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(app.should_quit);
    }

    #[test]
    fn test_language_keys_only_work_in_menus() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        let before = app.header.language();
        app.handle_key_event(KeyCode::Char('e'), KeyModifiers::NONE);
        app.handle_key_event(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(app.header.language(), before);

        app.handle_key_event(KeyCode::Char('m'), KeyModifiers::NONE);
        app.handle_key_event(KeyCode::Char('e'), KeyModifiers::NONE);
        assert_eq!(app.header.language(), LanguageCode::En);
        assert!(!app.header.toggles().drawer_open);
    }

    #[test]
    fn test_theme_follows_header_style_variant() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            style_variant: StyleVariant::Transparent,
            ..Config::default()
        };
        let app = app_with(config, &dir);
        assert_eq!(app.header.style_variant(), StyleVariant::Transparent);
        assert_eq!(app.theme.variant, StyleVariant::Transparent);
    }

    #[test]
    fn test_language_menu_keyboard_focus() {
        let dir = tempfile::tempdir().unwrap();
        LocalStorage::new(dir.path().join("storage.json"))
            .set_item("site_lang", "ar")
            .unwrap();
        let mut app = app(&dir);
        app.handle_key_event(KeyCode::Char('l'), KeyModifiers::NONE);
        assert_eq!(app.menu_focus, None);

        app.handle_key_event(KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(app.menu_focus, Some(LanguageCode::En));
        app.handle_key_event(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.menu_focus, Some(LanguageCode::Ar));
        app.handle_key_event(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.focused_link, None);

        app.handle_key_event(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.header.language(), LanguageCode::En);
        assert!(!app.header.toggles().language_menu_open);
        assert_eq!(app.menu_focus, None);
    }

    #[test]
    fn test_drawer_slide_runs_once_per_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.handle_key_event(KeyCode::Char('m'), KeyModifiers::NONE);
        assert!(app.drawer_slide.is_some());
        app.tick(Instant::now() + DRAWER_SLIDE);
        assert!(app.drawer_slide.is_none());

        app.handle_key_event(KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.drawer_slide.is_none());

        let config = Config {
            reduced_motion: true,
            ..Config::default()
        };
        let mut still = app_with(config, &dir);
        still.handle_key_event(KeyCode::Char('m'), KeyModifiers::NONE);
        assert!(still.header.toggles().drawer_open);
        assert!(still.drawer_slide.is_none());
    }

    #[test]
    fn test_scrolling_is_blocked_while_drawer_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.handle_key_event(KeyCode::Char('m'), KeyModifiers::NONE);
        app.handle_key_event(KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(app.page.scroll_offset(), 0.0);

        app.handle_key_event(KeyCode::Esc, KeyModifiers::NONE);
        app.handle_key_event(KeyCode::PageDown, KeyModifiers::NONE);
        assert!(app.page.scroll_offset() > 0.0);
        assert!(app.header.is_scrolled());
    }
}
