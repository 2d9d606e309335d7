//! User interface subsystem - character display + matrix keypad.
//!
//! The UI is a page state machine stepped once per main-loop iteration with
//! the key reported by the keypad scanner (if any). Each step may redraw the
//! current page, move to another page, fetch data or drive the alarm.
//!
//! ## Pages
//!
//! - **Welcome**: splash; any key continues to Data
//! - **Data**: two metrics at a time, scrollable
//! - **Settings**: Buzzer / WiFi
//! - **WifiSettings**: choose and join a scanned network
//! - **BuzzerSettings**: view and enter per-metric alarm thresholds

pub mod display;
pub mod entry;
pub mod input_logic;
mod state;

pub use state::Ui;

use crate::config::{KEY_BACK, KEY_DOWN, KEY_MUTE, KEY_REFRESH, KEY_SELECT, KEY_UP};

/// Pages the UI can be on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    Welcome,
    Data,
    Settings,
    WifiSettings,
    BuzzerSettings,
}

/// Keypad symbols as UI buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Up,
    Down,
    Select,
    Back,
    Mute,
    /// Fetch data now (Data page only).
    Refresh,
    /// Any other key; digits during numeric entry.
    Other(char),
}

impl Button {
    pub fn from_key(key: char) -> Self {
        match key {
            KEY_UP => Button::Up,
            KEY_DOWN => Button::Down,
            KEY_SELECT => Button::Select,
            KEY_BACK => Button::Back,
            KEY_MUTE => Button::Mute,
            KEY_REFRESH => Button::Refresh,
            other => Button::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings() {
        assert_eq!(Button::from_key('2'), Button::Up);
        assert_eq!(Button::from_key('8'), Button::Down);
        assert_eq!(Button::from_key('#'), Button::Select);
        assert_eq!(Button::from_key('*'), Button::Back);
        assert_eq!(Button::from_key('0'), Button::Mute);
        assert_eq!(Button::from_key('3'), Button::Refresh);
        assert_eq!(Button::from_key('5'), Button::Other('5'));
    }
}
