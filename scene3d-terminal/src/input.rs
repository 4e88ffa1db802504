/// Translate crossterm key events into scene key presses and releases
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use scene3d_core::Key;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a held key survives without a repeat on terminals that never report releases
pub const DEFAULT_HOLD_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down(Key),
    Up(Key),
}

pub fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(Key::W),
            's' => Some(Key::S),
            'a' => Some(Key::A),
            'd' => Some(Key::D),
            _ => None,
        },
        _ => None,
    }
}

/// Tracks held movement keys.
///
/// With release reporting the terminal tells us when a key goes up. Without
/// it, auto-repeat keeps a key alive and silence past the timeout releases it.
pub struct KeyTracker {
    reports_release: bool,
    hold_timeout: Duration,
    last_press: HashMap<Key, Instant>,
}

impl KeyTracker {
    pub fn new(reports_release: bool, hold_timeout: Duration) -> Self {
        Self {
            reports_release,
            hold_timeout,
            last_press: HashMap::new(),
        }
    }

    pub fn reports_release(&self) -> bool {
        self.reports_release
    }

    pub fn on_event(&mut self, event: &KeyEvent, now: Instant) -> Option<KeyAction> {
        let key = map_key(event.code)?;
        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if key.held_control().is_some() {
                    self.last_press.insert(key, now);
                }
                Some(KeyAction::Down(key))
            }
            KeyEventKind::Release => {
                self.last_press.remove(&key);
                Some(KeyAction::Up(key))
            }
        }
    }

    /// Release held keys that have gone quiet. No-op when releases are reported.
    pub fn expire(&mut self, now: Instant) -> Vec<Key> {
        if self.reports_release {
            return Vec::new();
        }
        let timeout = self.hold_timeout;
        let expired: Vec<Key> = self
            .last_press
            .iter()
            .filter(|(_, at)| now.duration_since(**at) >= timeout)
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            self.last_press.remove(key);
        }
        expired
    }
}
