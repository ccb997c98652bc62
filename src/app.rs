use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::Instant;

use crate::feed::Category;
use crate::poll::Poller;
use crate::theme::Theme;

/// How long a status message stays on the info line
const STATUS_MESSAGE_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

pub struct App {
    pub poller: Poller,
    pub theme: Theme,
    pub popup: Popup,

    // Which column has focus, and the selected row in each
    pub focus: Category,
    pub selected_cat: usize,
    pub selected_dog: usize,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(poller: Poller, theme: Theme) -> Self {
        Self {
            poller,
            theme,
            popup: Popup::None,
            focus: Category::Cat,
            selected_cat: 0,
            selected_dog: 0,
            status_message: None,
            status_message_time: None,
        }
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn selected(&self, category: Category) -> usize {
        match category {
            Category::Cat => self.selected_cat,
            Category::Dog => self.selected_dog,
        }
    }

    fn selected_mut(&mut self, category: Category) -> &mut usize {
        match category {
            Category::Cat => &mut self.selected_cat,
            Category::Dog => &mut self.selected_dog,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup == Popup::Help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                self.popup = Popup::None;
            }
            return Ok(());
        }

        match key.code {
            // Switch column
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                self.focus = self.focus.other();
            }

            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            // Fetch now
            KeyCode::Char('R') => {
                if self.poller.fetch_now() {
                    self.set_status("Fetching next image…");
                } else {
                    self.set_status("A fetch is already in progress");
                }
            }

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn move_down(&mut self) {
        let len = self.poller.state().feed(self.focus).len();
        let selected = self.selected_mut(self.focus);
        if *selected + 1 < len {
            *selected += 1;
        }
    }

    fn move_up(&mut self) {
        let selected = self.selected_mut(self.focus);
        *selected = selected.saturating_sub(1);
    }

    pub fn tick(&mut self) -> Result<()> {
        if !self.poller.is_active() {
            return Ok(());
        }

        // Clear status message after timeout
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        self.poller.advance_clock();
        self.poller.drain_outcomes();
        Ok(())
    }

    /// Tear down the view; late fetches are discarded from here on
    pub fn shutdown(&mut self) {
        self.poller.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ImageClient, NextImage};
    use crate::config::AppConfig;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let config = AppConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..AppConfig::default()
        };
        let client = ImageClient::new(&config.base_url, config.request_timeout()).unwrap();
        App::new(Poller::new(&config, client), Theme::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn add_dog(app: &mut App, data: &str) {
        app.poller.handle_outcome(Ok(NextImage {
            category: Category::Dog,
            image_base64: data.to_string(),
        }));
    }

    #[test]
    fn test_tab_switches_focus() {
        let mut app = app();
        assert_eq!(app.focus, Category::Cat);
        app.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.focus, Category::Dog);
        app.handle_key(key(KeyCode::Left)).unwrap();
        assert_eq!(app.focus, Category::Cat);
    }

    #[test]
    fn test_selection_stays_within_feed() {
        let mut app = app();
        add_dog(&mut app, "A");
        add_dog(&mut app, "B");
        app.handle_key(key(KeyCode::Tab)).unwrap();

        for _ in 0..5 {
            app.handle_key(key(KeyCode::Down)).unwrap();
        }
        assert_eq!(app.selected(Category::Dog), 1);
        assert_eq!(app.selected(Category::Cat), 0);

        for _ in 0..5 {
            app.handle_key(key(KeyCode::Char('k'))).unwrap();
        }
        assert_eq!(app.selected(Category::Dog), 0);
    }

    #[test]
    fn test_help_popup_toggles() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('?'))).unwrap();
        assert_eq!(app.popup, Popup::Help);

        // Keys other than close are swallowed while the popup is open
        app.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.focus, Category::Cat);

        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.popup, Popup::None);
    }

    #[tokio::test]
    async fn test_manual_fetch_refused_while_busy() {
        let mut app = app();
        app.poller.activate();
        app.handle_key(key(KeyCode::Char('R'))).unwrap();
        assert_eq!(app.status_message.as_deref(), Some("A fetch is already in progress"));
    }

    #[test]
    fn test_shutdown_stops_updates() {
        let mut app = app();
        app.shutdown();
        add_dog(&mut app, "late");
        app.tick().unwrap();
        assert!(app.poller.state().dogs.is_empty());
    }
}
