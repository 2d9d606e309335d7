//! Pin map for the 8-bit parallel interface.
//!
//! Built once from eleven GPIO numbers and treated as immutable afterwards.
//! The two derived masks cover every bus operation: the control mask
//! (RS, RW, EN) and the data mask (DB0..DB7).

use crate::gpio::pin_bit;

/// Logical lines of the controller interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Register select: 0 = instruction, 1 = data.
    RegisterSelect,
    /// Read/write: 0 = write, 1 = read.
    ReadWrite,
    /// Enable strobe.
    Enable,
    /// Data bus bit 0..=7.
    Data(u8),
}

/// GPIO numbers of the eleven interface lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayPinConfig {
    pub rs: u8,
    pub rw: u8,
    pub en: u8,
    /// DB0..DB7, least significant bit first.
    pub data: [u8; 8],
}

impl DisplayPinConfig {
    /// GPIO number wired to `line`.
    pub const fn pin(&self, line: Line) -> u8 {
        match line {
            Line::RegisterSelect => self.rs,
            Line::ReadWrite => self.rw,
            Line::Enable => self.en,
            Line::Data(bit) => self.data[(bit & 0x07) as usize],
        }
    }

    /// RS | RW | EN.
    pub fn control_mask(&self) -> u32 {
        pin_bit(self.rs) | pin_bit(self.rw) | pin_bit(self.en)
    }

    /// DB0..DB7.
    pub fn data_mask(&self) -> u32 {
        self.data.iter().fold(0, |mask, &pin| mask | pin_bit(pin))
    }

    /// Spread `byte` over the data pins, for a masked port write.
    pub fn pack(&self, byte: u8) -> u32 {
        self.data
            .iter()
            .enumerate()
            .filter(|&(bit, _)| byte & (1u8 << bit) != 0)
            .fold(0, |word, (_, pin)| word | pin_bit(*pin))
    }

    /// Collect the data pins of a sampled port word back into a byte.
    pub fn extract(&self, word: u32) -> u8 {
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, pin)| word & pin_bit(*pin) != 0)
            .fold(0u8, |byte, (bit, _)| byte | (1u8 << bit))
    }
}
