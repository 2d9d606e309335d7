//! 4x3 matrix keypad scanner.
//!
//! Columns are driven high one at a time and the rows (pulled down) are
//! sampled with a single masked port read. A key is reported only on its
//! rising edge, so holding a key yields exactly one event.

use crate::config::KEYPAD_SETTLE_US;
use crate::gpio::{pin_bit, GpioPort};
use embedded_hal::delay::DelayNs;

pub const ROWS: usize = 4;
pub const COLUMNS: usize = 3;

/// Character reported for each (row, column) position.
pub type KeyMatrix = [[char; COLUMNS]; ROWS];

/// GPIO numbers of the matrix lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeypadPinConfig {
    pub rows: [u8; ROWS],
    pub cols: [u8; COLUMNS],
}

impl KeypadPinConfig {
    pub fn row_mask(&self) -> u32 {
        self.rows.iter().fold(0, |mask, &pin| mask | pin_bit(pin))
    }

    pub fn col_mask(&self) -> u32 {
        self.cols.iter().fold(0, |mask, &pin| mask | pin_bit(pin))
    }
}

type Snapshot = [[bool; COLUMNS]; ROWS];

pub struct Keypad<P, D> {
    port: P,
    delay: D,
    pins: KeypadPinConfig,
    row_mask: u32,
    matrix: KeyMatrix,
    previous: Snapshot,
}

impl<P, D> Keypad<P, D>
where
    P: GpioPort,
    D: DelayNs,
{
    /// Pull the rows down and drive every column low.
    pub fn new(mut port: P, delay: D, pins: KeypadPinConfig, matrix: KeyMatrix) -> Self {
        for &row in &pins.rows {
            port.pull_down(row);
        }
        port.set_dir_in_masked(pins.row_mask());

        let col_mask = pins.col_mask();
        port.put_masked(col_mask, 0);
        port.set_dir_out_masked(col_mask);

        debug!("Keypad ready");
        Self {
            port,
            delay,
            row_mask: pins.row_mask(),
            pins,
            matrix,
            previous: [[false; COLUMNS]; ROWS],
        }
    }

    /// Scan the matrix once and return the key that was newly pressed since
    /// the previous scan, if any.
    ///
    /// Within a column the lowest row wins when several rows read high.
    /// If several keys go down in the same scan, the one found last
    /// (columns outer, rows inner) is reported.
    pub fn poll_key(&mut self) -> Option<char> {
        let current = self.scan();

        let mut pressed = None;
        for col in 0..COLUMNS {
            for row in 0..ROWS {
                if current[row][col] && !self.previous[row][col] {
                    pressed = Some(self.matrix[row][col]);
                }
            }
        }
        self.previous = current;

        if let Some(key) = pressed {
            debug!("Key pressed: {}", key);
        }
        pressed
    }

    pub fn release(self) -> (P, D) {
        (self.port, self.delay)
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    fn scan(&mut self) -> Snapshot {
        let mut snapshot = [[false; COLUMNS]; ROWS];

        for (col, &col_pin) in self.pins.cols.iter().enumerate() {
            self.port.put(col_pin, true);
            self.delay.delay_us(KEYPAD_SETTLE_US);

            let rows = self.port.get_all() & self.row_mask;
            if let Some(row) = self
                .pins
                .rows
                .iter()
                .position(|&row_pin| rows & pin_bit(row_pin) != 0)
            {
                snapshot[row][col] = true;
            }

            self.port.put(col_pin, false);
        }

        snapshot
    }
}
