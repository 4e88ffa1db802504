/// Keys the scene reacts to and the held-key state for continuous movement
use crate::camera::Control;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    S,
    A,
    D,
    Space,
}

impl Key {
    /// Map a DOM-style key code
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            38 => Some(Key::Up),
            40 => Some(Key::Down),
            37 => Some(Key::Left),
            39 => Some(Key::Right),
            87 => Some(Key::W),
            83 => Some(Key::S),
            65 => Some(Key::A),
            68 => Some(Key::D),
            32 => Some(Key::Space),
            _ => None,
        }
    }

    /// The one-shot camera control applied on key down (arrow keys)
    pub fn nudge(self) -> Option<Control> {
        match self {
            Key::Up => Some(Control::Forward),
            Key::Down => Some(Control::Backward),
            Key::Left => Some(Control::TurnLeft),
            Key::Right => Some(Control::TurnRight),
            _ => None,
        }
    }

    /// The control re-applied every frame while held (W/S/A/D)
    pub fn held_control(self) -> Option<Control> {
        match self {
            Key::W => Some(Control::Forward),
            Key::S => Some(Control::Backward),
            Key::A => Some(Control::TurnLeft),
            Key::D => Some(Control::TurnRight),
            _ => None,
        }
    }
}

/// Held flags for the four movement controls, in W, S, A, D order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    held: [bool; 4],
}

impl HeldKeys {
    fn slot(control: Control) -> usize {
        match control {
            Control::Forward => 0,
            Control::Backward => 1,
            Control::TurnLeft => 2,
            Control::TurnRight => 3,
        }
    }

    pub fn set(&mut self, control: Control, down: bool) {
        self.held[Self::slot(control)] = down;
    }

    pub fn is_held(&self, control: Control) -> bool {
        self.held[Self::slot(control)]
    }

    pub fn any(&self) -> bool {
        self.held.iter().any(|&h| h)
    }

    /// Held controls in application order
    pub fn controls(&self) -> impl Iterator<Item = Control> + '_ {
        [
            Control::Forward,
            Control::Backward,
            Control::TurnLeft,
            Control::TurnRight,
        ]
        .into_iter()
        .filter(|&c| self.is_held(c))
    }
}
