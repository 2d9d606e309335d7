//! Weather-station display terminal.
//!
//! Everything except the board glue is plain `no_std` logic that builds and
//! tests on the host:
//!
//! - [`display`]: parallel character-display driver over a [`gpio::GpioPort`]
//! - [`keypad`]: 4x3 matrix scanner with rising-edge detection
//! - [`ui`]: page state machine, numeric entry, page renderers
//! - [`alert`]: per-metric thresholds and the alarm condition
//! - [`payload`], [`storage`]: server response and settings codecs
//! - `sim` (feature `sim`): simulated controller, key matrix and collaborators
//!   for tests
//!
//! Usage: `cargo test` (host). The firmware is the `weather-terminal` binary,
//! built with `--features embedded` for `thumbv6m-none-eabi`.

#![cfg_attr(not(test), no_std)]

// Logging macros; must stay first so every module below can use them.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Core (host-testable)
// ═══════════════════════════════════════════════════════════════════════════

pub mod alert;
pub mod config;
pub mod display;
pub mod error;
pub mod gpio;
pub mod keypad;
pub mod link;
pub mod payload;
pub mod power_logic;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod storage;
pub mod ui;
pub mod weather;

// ═══════════════════════════════════════════════════════════════════════════
// Board glue (Pico W)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "embedded")]
pub mod board;
#[cfg(feature = "embedded")]
pub mod net;

pub use error::Error;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - configuration sanity
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::config::*;
    use super::display::uses_pin;
    use super::gpio::pin_bit;

    #[test]
    fn display_and_keypad_pins_do_not_overlap() {
        let keypad = KEYPAD_PINS.row_mask() | KEYPAD_PINS.col_mask();
        let display = DISPLAY_PINS.control_mask() | DISPLAY_PINS.data_mask();
        assert_eq!(keypad & display, 0);
        assert!(!uses_pin(&DISPLAY_PINS, BUZZER_PIN));
        assert_eq!(keypad & pin_bit(BUZZER_PIN), 0);
    }

    #[test]
    fn cyw43_pins_are_left_free() {
        let used = KEYPAD_PINS.row_mask()
            | KEYPAD_PINS.col_mask()
            | DISPLAY_PINS.control_mask()
            | DISPLAY_PINS.data_mask()
            | pin_bit(BUZZER_PIN);
        for cyw43 in [23, 24, 25, 29] {
            assert_eq!(used & pin_bit(cyw43), 0, "GP{} is reserved for CYW43", cyw43);
        }
    }

    #[test]
    fn every_button_is_on_the_keypad() {
        for key in [KEY_UP, KEY_DOWN, KEY_SELECT, KEY_BACK, KEY_MUTE, KEY_REFRESH] {
            assert!(KEY_MATRIX.iter().flatten().any(|&symbol| symbol == key));
        }
    }

    #[test]
    fn storage_region_is_sector_aligned_and_inside_flash() {
        assert_eq!(STORAGE_FLASH_START % 4096, 0);
        assert_eq!(STORAGE_FLASH_END % 4096, 0);
        assert!(STORAGE_FLASH_END as usize <= FLASH_SIZE);
        assert!(CYW43_CLM_ADDRESS + CYW43_CLM_LEN <= 0x1000_0000 + STORAGE_FLASH_START as usize);
    }

    #[test]
    fn visible_width_fits_a_ddram_row() {
        assert!(VISIBLE_COLUMNS <= ROW_LENGTH as usize);
        assert_eq!(DDRAM_SIZE, 2 * ROW_LENGTH);
    }
}
