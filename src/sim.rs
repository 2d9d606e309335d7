//! Host-side doubles for the hardware and collaborators.
//!
//! [`SimController`] behaves like a parallel character controller wired to a
//! GPIO port: it latches bytes on the falling enable edge, answers reads on
//! the rising edge, keeps DDRAM/CGRAM and an address counter, and can hold
//! its busy flag for a number of status reads (or forever). Bus misuse, such
//! as writing while busy or driving the data lines during a read, is counted
//! in [`SimController::protocol_violations`].

use core::future::poll_fn;
use core::task::Poll;

use heapless::{String, Vec};

use crate::config::{DDRAM_SIZE, ROW_LENGTH};
use crate::display::pins::DisplayPinConfig;
use crate::error::Error;
use crate::gpio::{pin_bit, GpioPort};
use crate::keypad::{KeypadPinConfig, COLUMNS, ROWS};
use crate::link::{AlarmOutput, DataSource, WifiLink};
use crate::weather::WeatherStationData;

const CGRAM_SIZE: usize = 64;
const LOG_CAPACITY: usize = 256;
const HISTORY_CAPACITY: usize = 16;

/// Both DDRAM rows as text, see [`SimController::line`].
pub type Screen = (String<40>, String<40>);

// ═══════════════════════════════════════════════════════════════════════════
// Display controller
// ═══════════════════════════════════════════════════════════════════════════

pub struct SimController {
    pins: DisplayPinConfig,
    levels: u32,
    outputs: u32,

    ddram: [u8; DDRAM_SIZE as usize],
    cgram: [u8; CGRAM_SIZE],
    address: u8,
    cgram_address: u8,
    cgram_selected: bool,
    increment: bool,
    follow: bool,
    window: u8,
    power: bool,
    cursor: bool,
    blink: bool,
    function: Option<u8>,

    busy_reads: u32,
    busy_remaining: u32,
    stuck: bool,
    stall: Option<(u32, u32)>,

    instructions: Vec<u8, LOG_CAPACITY>,
    history: Vec<Screen, HISTORY_CAPACITY>,
    violations: u32,
}

impl SimController {
    pub fn new(pins: DisplayPinConfig) -> Self {
        Self {
            pins,
            levels: 0,
            outputs: 0,
            ddram: [b' '; DDRAM_SIZE as usize],
            cgram: [0; CGRAM_SIZE],
            address: 0,
            cgram_address: 0,
            cgram_selected: false,
            increment: true,
            follow: false,
            window: 0,
            power: false,
            cursor: false,
            blink: false,
            function: None,
            busy_reads: 0,
            busy_remaining: 0,
            stuck: false,
            stall: None,
            instructions: Vec::new(),
            history: Vec::new(),
            violations: 0,
        }
    }

    /// Report busy for this many status reads after every accepted write.
    pub fn set_busy_reads(&mut self, reads: u32) {
        self.busy_reads = reads;
    }

    /// Hold the busy flag forever, like an unpowered or miswired controller.
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// After `writes` more accepted writes, hold the busy flag for `reads`
    /// status reads once.
    pub fn stall_after_writes(&mut self, writes: u32, reads: u32) {
        self.stall = Some((writes, reads));
    }

    /// Instruction bytes written so far, oldest first (first 256 only).
    pub fn instructions(&self) -> &[u8] {
        &self.instructions
    }

    /// Screens wiped by a clear instruction, oldest first (last 16 only).
    /// Blank screens are skipped.
    pub fn cleared_screens(&self) -> &[Screen] {
        &self.history
    }

    pub fn clear_log(&mut self) {
        self.instructions.clear();
        self.history.clear();
    }

    pub fn protocol_violations(&self) -> u32 {
        self.violations
    }

    pub fn cell(&self, address: u8) -> u8 {
        self.ddram[(address % DDRAM_SIZE) as usize]
    }

    /// Eight rows of CGRAM glyph `slot`.
    pub fn glyph(&self, slot: u8) -> [u8; 8] {
        let start = (slot as usize & 0x07) * 8;
        let mut rows = [0; 8];
        rows.copy_from_slice(&self.cgram[start..start + 8]);
        rows
    }

    /// Text of a 40-cell DDRAM row with trailing blanks removed.
    /// Non-printable cells read as `?`.
    pub fn line(&self, row: u8) -> String<40> {
        let start = (row % 2) as usize * ROW_LENGTH as usize;
        let mut text = String::new();
        for &cell in &self.ddram[start..start + ROW_LENGTH as usize] {
            let c = if (0x20..0x7F).contains(&cell) { cell as char } else { '?' };
            let _ = text.push(c);
        }
        let trimmed = text.trim_end().len();
        text.truncate(trimmed);
        text
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn window(&self) -> u8 {
        self.window
    }

    pub fn is_on(&self) -> bool {
        self.power
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor
    }

    pub fn blinking(&self) -> bool {
        self.blink
    }

    /// Last function-set byte, if any.
    pub fn function(&self) -> Option<u8> {
        self.function
    }

    fn level(&self, pin: u8) -> bool {
        self.levels & pin_bit(pin) != 0
    }

    fn busy_now(&self) -> bool {
        self.stuck || self.busy_remaining > 0
    }

    fn set_levels(&mut self, levels: u32) {
        let en = pin_bit(self.pins.en);
        let rising = self.levels & en == 0 && levels & en != 0;
        let falling = self.levels & en != 0 && levels & en == 0;
        self.levels = levels;

        if rising && self.level(self.pins.rw) {
            self.present();
        }
        if falling && !self.level(self.pins.rw) {
            self.latch();
        }
    }

    /// Rising enable edge with RW high: drive the data lines.
    fn present(&mut self) {
        let data_mask = self.pins.data_mask();
        if self.outputs & data_mask != 0 {
            self.violations += 1;
        }

        let byte = if self.level(self.pins.rs) {
            self.read_data()
        } else {
            self.status()
        };
        self.levels = (self.levels & !data_mask) | self.pins.pack(byte);
    }

    fn status(&mut self) -> u8 {
        let busy = self.busy_now();
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
        }
        let counter = if self.cgram_selected { self.cgram_address } else { self.address };
        (busy as u8) << 7 | (counter & 0x7F)
    }

    fn read_data(&mut self) -> u8 {
        if self.cgram_selected {
            let byte = self.cgram[self.cgram_address as usize];
            self.step_cgram();
            byte
        } else {
            let byte = self.ddram[self.address as usize];
            self.step_ddram();
            byte
        }
    }

    /// Falling enable edge with RW low: take the byte on the data lines.
    fn latch(&mut self) {
        let data_mask = self.pins.data_mask();
        if self.outputs & data_mask != data_mask || self.busy_now() {
            self.violations += 1;
            return;
        }

        let byte = self.pins.extract(self.levels);
        if self.level(self.pins.rs) {
            self.write_data(byte);
        } else {
            let _ = self.instructions.push(byte);
            self.execute(byte);
        }
        self.busy_remaining = self.busy_reads;
        match self.stall {
            Some((writes, reads)) if writes <= 1 => {
                self.busy_remaining = reads;
                self.stall = None;
            }
            Some((writes, reads)) => self.stall = Some((writes - 1, reads)),
            None => {}
        }
    }

    fn write_data(&mut self, byte: u8) {
        if self.cgram_selected {
            self.cgram[self.cgram_address as usize] = byte;
            self.step_cgram();
        } else {
            self.ddram[self.address as usize] = byte;
            self.step_ddram();
            if self.follow {
                self.window = step(self.window, self.increment, ROW_LENGTH);
            }
        }
    }

    fn step_ddram(&mut self) {
        self.address = step(self.address, self.increment, DDRAM_SIZE);
    }

    fn remember_screen(&mut self) {
        let screen = (self.line(0), self.line(1));
        if screen.0.is_empty() && screen.1.is_empty() {
            return;
        }
        if self.history.is_full() {
            self.history.remove(0);
        }
        let _ = self.history.push(screen);
    }

    fn step_cgram(&mut self) {
        self.cgram_address = step(self.cgram_address, self.increment, CGRAM_SIZE as u8);
    }

    fn execute(&mut self, byte: u8) {
        match byte.leading_zeros() {
            0 => {
                self.address = (byte & 0x7F) % DDRAM_SIZE;
                self.cgram_selected = false;
            }
            1 => {
                self.cgram_address = byte & 0x3F;
                self.cgram_selected = true;
            }
            2 => self.function = Some(byte),
            3 => {
                let right = byte & 0x04 != 0;
                if byte & 0x08 != 0 {
                    self.window = step(self.window, right, ROW_LENGTH);
                } else {
                    self.address = step(self.address, right, DDRAM_SIZE);
                }
            }
            4 => {
                self.power = byte & 0x04 != 0;
                self.cursor = byte & 0x02 != 0;
                self.blink = byte & 0x01 != 0;
            }
            5 => {
                self.increment = byte & 0x02 != 0;
                self.follow = byte & 0x01 != 0;
            }
            6 => {
                self.address = 0;
                self.window = 0;
                self.cgram_selected = false;
            }
            7 => {
                self.remember_screen();
                self.ddram = [b' '; DDRAM_SIZE as usize];
                self.address = 0;
                self.window = 0;
                self.increment = true;
                self.cgram_selected = false;
            }
            _ => {}
        }
    }
}

fn step(value: u8, forward: bool, modulus: u8) -> u8 {
    if forward {
        (value + 1) % modulus
    } else {
        (value + modulus - 1) % modulus
    }
}

impl GpioPort for SimController {
    fn put(&mut self, pin: u8, high: bool) {
        let levels = if high {
            self.levels | pin_bit(pin)
        } else {
            self.levels & !pin_bit(pin)
        };
        self.set_levels(levels);
    }

    fn put_masked(&mut self, mask: u32, value: u32) {
        self.set_levels((self.levels & !mask) | (value & mask));
    }

    fn get_all(&mut self) -> u32 {
        self.levels
    }

    fn set_dir_out_masked(&mut self, mask: u32) {
        self.outputs |= mask;
    }

    fn set_dir_in_masked(&mut self, mask: u32) {
        self.outputs &= !mask;
    }

    fn pull_down(&mut self, _pin: u8) {}
}

// ═══════════════════════════════════════════════════════════════════════════
// Keypad matrix
// ═══════════════════════════════════════════════════════════════════════════

/// 4x3 switch matrix: a row reads high while a pressed key connects it to a
/// column that is driven high.
pub struct SimKeypad {
    pins: KeypadPinConfig,
    levels: u32,
    outputs: u32,
    pulls: u32,
    pressed: [[bool; COLUMNS]; ROWS],
}

impl SimKeypad {
    pub fn new(pins: KeypadPinConfig) -> Self {
        Self {
            pins,
            levels: 0,
            outputs: 0,
            pulls: 0,
            pressed: [[false; COLUMNS]; ROWS],
        }
    }

    pub fn press(&mut self, row: usize, col: usize) {
        self.pressed[row][col] = true;
    }

    pub fn release(&mut self, row: usize, col: usize) {
        self.pressed[row][col] = false;
    }

    pub fn release_all(&mut self) {
        self.pressed = [[false; COLUMNS]; ROWS];
    }

    /// Press the key labelled `key` in `matrix`; false if there is none.
    pub fn press_symbol(&mut self, matrix: &crate::keypad::KeyMatrix, key: char) -> bool {
        for (row, symbols) in matrix.iter().enumerate() {
            if let Some(col) = symbols.iter().position(|&symbol| symbol == key) {
                self.press(row, col);
                return true;
            }
        }
        false
    }

    pub fn is_pulled_down(&self, pin: u8) -> bool {
        self.pulls & pin_bit(pin) != 0
    }

    pub fn outputs(&self) -> u32 {
        self.outputs
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }
}

impl GpioPort for SimKeypad {
    fn put(&mut self, pin: u8, high: bool) {
        if high {
            self.levels |= pin_bit(pin);
        } else {
            self.levels &= !pin_bit(pin);
        }
    }

    fn put_masked(&mut self, mask: u32, value: u32) {
        self.levels = (self.levels & !mask) | (value & mask);
    }

    fn get_all(&mut self) -> u32 {
        let mut word = self.levels & self.outputs;
        for (row, &row_pin) in self.pins.rows.iter().enumerate() {
            let connected = self.pins.cols.iter().enumerate().any(|(col, &col_pin)| {
                self.pressed[row][col] && self.outputs & self.levels & pin_bit(col_pin) != 0
            });
            if connected {
                word |= pin_bit(row_pin);
            }
        }
        word
    }

    fn set_dir_out_masked(&mut self, mask: u32) {
        self.outputs |= mask;
    }

    fn set_dir_in_masked(&mut self, mask: u32) {
        self.outputs &= !mask;
    }

    fn pull_down(&mut self, pin: u8) {
        self.pulls |= pin_bit(pin);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Delays
// ═══════════════════════════════════════════════════════════════════════════

/// Blocking delay that returns immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDelay;

impl embedded_hal::delay::DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Blocking delay that counts calls and requested time.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordingDelay {
    pub calls: u32,
    pub total_ns: u64,
}

impl embedded_hal::delay::DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += ns as u64;
    }
}

/// Async pause that returns immediately and records each millisecond pause.
#[derive(Clone, Debug, Default)]
pub struct RecordingPause {
    pauses_ms: Vec<u32, 32>,
}

impl RecordingPause {
    pub fn pauses_ms(&self) -> &[u32] {
        &self.pauses_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.pauses_ms.iter().map(|&ms| ms as u64).sum()
    }
}

impl embedded_hal_async::delay::DelayNs for RecordingPause {
    async fn delay_ns(&mut self, ns: u32) {
        let _ = self.pauses_ms.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        let _ = self.pauses_ms.push(ms);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Collaborators
// ═══════════════════════════════════════════════════════════════════════════

/// Wi-Fi and data server with scripted answers.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    available: Vec<String<32>, 8>,
    scanned: Vec<String<32>, 8>,
    accept_connect: bool,
    connected: bool,
    pending_failures: u8,
    next_data: WeatherStationData,
    latest: WeatherStationData,
    fresh: bool,
    slow_scan: bool,

    pub scans: u32,
    pub connect_attempts: u32,
    pub last_connect_index: Option<u8>,
    pub requests: u32,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Networks the next scan will find.
    pub fn with_networks(mut self, ssids: &[&str]) -> Self {
        self.available.clear();
        for ssid in ssids {
            let mut name = String::new();
            let _ = name.push_str(ssid);
            let _ = self.available.push(name);
        }
        self
    }

    /// Scans suspend once before completing, like a radio scan would.
    pub fn with_slow_scan(mut self) -> Self {
        self.slow_scan = true;
        self
    }

    pub fn accepting_connections(mut self, accept: bool) -> Self {
        self.accept_connect = accept;
        self
    }

    /// Snapshot returned by every successful request.
    pub fn serving(mut self, data: WeatherStationData) -> Self {
        self.next_data = data;
        self
    }

    /// Fail the next `count` data requests.
    pub fn fail_requests(&mut self, count: u8) {
        self.pending_failures = count;
    }

    pub fn set_serving(&mut self, data: WeatherStationData) {
        self.next_data = data;
    }

    /// Make a snapshot arrive without a request.
    pub fn deliver(&mut self, data: WeatherStationData) {
        self.latest = data;
        self.fresh = true;
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl WifiLink for ScriptedNetwork {
    async fn scan_networks(&mut self) {
        if self.slow_scan {
            let mut suspended = false;
            poll_fn(|cx| {
                if suspended {
                    Poll::Ready(())
                } else {
                    suspended = true;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            })
            .await;
        }
        self.scans += 1;
        self.scanned = self.available.clone();
    }

    fn network_count(&self) -> u8 {
        self.scanned.len() as u8
    }

    fn network_name(&self, index: u8) -> &str {
        self.scanned
            .get(index as usize)
            .map(|name| name.as_str())
            .unwrap_or("")
    }

    async fn connect(&mut self, index: u8) -> Result<(), Error> {
        self.connect_attempts += 1;
        self.last_connect_index = Some(index);
        if self.accept_connect && (index as usize) < self.scanned.len() {
            self.connected = true;
            Ok(())
        } else {
            self.connected = false;
            Err(Error::ConnectFailed)
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl DataSource for ScriptedNetwork {
    async fn request_last_data(&mut self) -> Result<(), Error> {
        self.requests += 1;
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Err(Error::RequestFailed);
        }
        self.latest = self.next_data;
        self.fresh = true;
        Ok(())
    }

    fn has_new_data(&self) -> bool {
        self.fresh
    }

    fn consume_latest_data(&mut self) -> WeatherStationData {
        self.fresh = false;
        self.latest
    }
}

/// Alarm output that remembers its level and how often it was set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordingAlarm {
    pub on: bool,
    pub writes: u32,
}

impl AlarmOutput for RecordingAlarm {
    fn set_alarm_output(&mut self, on: bool) {
        self.on = on;
        self.writes += 1;
    }
}
