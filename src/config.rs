//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::display::pins::DisplayPinConfig;
use crate::keypad::{KeyMatrix, KeypadPinConfig};

// GPIO pin assignments (Pico W defaults)
//
// These are logical GPIO numbers; `main.rs` binds the matching
// `embassy_rp::peripherals::PIN_*` to each one.  Adjust for your PCB.
//
//   LCD RS         → GP2
//   LCD RW         → GP3
//   LCD EN         → GP4
//   LCD DB0..DB7   → GP5..GP12
//   Keypad rows    → GP16..GP19 (pulled down)
//   Keypad columns → GP20..GP22 (driven)
//   Buzzer         → GP15

/// Character display wiring (8-bit parallel interface).
pub const DISPLAY_PINS: DisplayPinConfig = DisplayPinConfig {
    rs: 2,
    rw: 3,
    en: 4,
    data: [5, 6, 7, 8, 9, 10, 11, 12],
};

/// 4x3 keypad wiring.
pub const KEYPAD_PINS: KeypadPinConfig = KeypadPinConfig {
    rows: [16, 17, 18, 19],
    cols: [20, 21, 22],
};

/// Buzzer output pin.
pub const BUZZER_PIN: u8 = 15;

/// Symbols printed on the keypad, indexed `[row][column]`.
pub const KEY_MATRIX: KeyMatrix = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];

// Button bindings (keypad symbols)

pub const KEY_UP: char = '2';
pub const KEY_DOWN: char = '8';
pub const KEY_SELECT: char = '#';
pub const KEY_BACK: char = '*';
pub const KEY_MUTE: char = '0';
/// Data page only: request a fresh snapshot immediately.
pub const KEY_REFRESH: char = '3';

// Display controller timing & geometry

/// Settle time around every enable edge (µs).
pub const BUS_SETTLE_US: u32 = 1;

/// Status reads allowed before a write gives up with `DisplayTimeout`.
/// The controller's slowest instruction (clear) takes ~1.5 ms.
pub const BUSY_POLL_LIMIT: u32 = 10_000;

/// Internal DDRAM cells (two logical rows).
pub const DDRAM_SIZE: u8 = 80;

/// DDRAM cells per logical row; also the display-position modulus.
pub const ROW_LENGTH: u8 = 40;

/// Columns visible on the 16x2 glass.
pub const VISIBLE_COLUMNS: usize = 16;

// Keypad

/// Settle time after driving a column before sampling the rows (µs).
pub const KEYPAD_SETTLE_US: u32 = 10;

// UI timing

/// How long "Connected" / "Failed to connect" stays on screen (ms).
pub const MESSAGE_HOLD_MS: u32 = 5_000;

/// Data requests issued right after a successful Wi-Fi join.
pub const CONNECT_FETCH_ATTEMPTS: u8 = 3;

/// Pause between those post-connect attempts (ms).
pub const CONNECT_FETCH_SPACING_MS: u32 = 1_000;

/// Periodic data refresh while the Wi-Fi link is up (ms).
pub const FETCH_INTERVAL_MS: u64 = 60_000;

/// Enable automatic display power-off after inactivity.
pub const SCREEN_AUTO_OFF_ENABLED: bool = true;

/// Inactivity timeout before the display is powered off (ms).
pub const SCREEN_AUTO_OFF_TIMEOUT_MS: u64 = 120_000;

/// Main loop pacing (ms); keeps the Wi-Fi runner and buzzer task fed.
pub const MAIN_LOOP_PERIOD_MS: u64 = 10;

// Buzzer

/// Half period of the alarm tone (µs). 1136 µs ≈ 440 Hz.
pub const BUZZER_HALF_PERIOD_US: u64 = 1_136;

// Weather server

/// Server hosting the latest station snapshot.
pub const SERVER_ADDRESS: [u8; 4] = [217, 160, 149, 219];
pub const SERVER_PORT: u16 = 80;
pub const SERVER_PATH: &str = "/WeatherStation/latest/";

/// Socket timeout for a single request (ms).
pub const SERVER_TIMEOUT_MS: u64 = 5_000;

/// Maximum number of scanned networks kept for the Wi-Fi page.
pub const MAX_NETWORKS: usize = 8;

/// Time allowed for DHCP after a successful join (ms).
pub const DHCP_TIMEOUT_MS: u64 = 10_000;

// CYW43 firmware (flashed separately with probe-rs)
//
//   probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x10100000
//   probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x10140000

pub const CYW43_FW_ADDRESS: usize = 0x1010_0000;
pub const CYW43_FW_LEN: usize = 230_321;
pub const CYW43_CLM_ADDRESS: usize = 0x1014_0000;
pub const CYW43_CLM_LEN: usize = 4_752;

// Threshold storage

/// Size of the on-board QSPI flash.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Flash offsets (from the start of flash) reserved for threshold storage.
/// Four 4 KB sectors at the very end, clear of the CYW43 blobs.
pub const STORAGE_FLASH_START: u32 = 0x001F_C000;
pub const STORAGE_FLASH_END: u32 = 0x0020_0000;
