//! Instruction set of the parallel character controller.
//!
//! Bit layout (instruction register, RS = 0):
//! ```text
//! 0000_0001  clear display
//! 0000_001x  return home
//! 0000_01IS  entry mode       I = increment, S = display follows cursor
//! 0000_1DCB  display control  D = on, C = cursor, B = blink
//! 0001_SRxx  shift            S = display (else cursor), R = right
//! 001D_NFxx  function set     D = 8-bit, N = two lines, F = 5x10 font
//! 01AA_AAAA  set CGRAM address
//! 1AAA_AAAA  set DDRAM address
//! ```
//! Reading the instruction register returns the busy flag in bit 7 and the
//! address counter in bits 0..=6.

/// Register addressed by the RS line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Instruction,
    Data,
}

/// Interface width selected by function set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceWidth {
    FourBit,
    EightBit,
}

/// Number of display lines selected by function set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineCount {
    One,
    Two,
}

/// Character font selected by function set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    Dots5x8,
    Dots5x10,
}

/// What a shift instruction moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftTarget {
    Cursor,
    Display,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftDirection {
    Left,
    Right,
}

/// Mask of the busy flag in a status byte.
pub const BUSY_FLAG: u8 = 0x80;

/// Mask of the address counter in a status byte.
pub const ADDRESS_MASK: u8 = 0x7F;

/// One controller instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Instruction {
    Clear,
    ReturnHome,
    EntryMode {
        increment: bool,
        follow: bool,
    },
    DisplayControl {
        on: bool,
        cursor: bool,
        blink: bool,
    },
    Shift {
        target: ShiftTarget,
        direction: ShiftDirection,
    },
    FunctionSet {
        width: InterfaceWidth,
        lines: LineCount,
        font: Font,
    },
    SetCgramAddress(u8),
    SetDdramAddress(u8),
}

impl Instruction {
    /// Byte written to the instruction register.
    pub const fn encode(self) -> u8 {
        match self {
            Instruction::Clear => 0x01,
            Instruction::ReturnHome => 0x02,
            Instruction::EntryMode { increment, follow } => {
                0x04 | (increment as u8) << 1 | follow as u8
            }
            Instruction::DisplayControl { on, cursor, blink } => {
                0x08 | (on as u8) << 2 | (cursor as u8) << 1 | blink as u8
            }
            Instruction::Shift { target, direction } => {
                0x10 | (matches!(target, ShiftTarget::Display) as u8) << 3
                    | (matches!(direction, ShiftDirection::Right) as u8) << 2
            }
            Instruction::FunctionSet { width, lines, font } => {
                0x20 | (matches!(width, InterfaceWidth::EightBit) as u8) << 4
                    | (matches!(lines, LineCount::Two) as u8) << 3
                    | (matches!(font, Font::Dots5x10) as u8) << 2
            }
            Instruction::SetCgramAddress(address) => 0x40 | (address & 0x3F),
            Instruction::SetDdramAddress(address) => 0x80 | (address & 0x7F),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_instructions() {
        assert_eq!(Instruction::Clear.encode(), 0x01);
        assert_eq!(Instruction::ReturnHome.encode(), 0x02);
    }

    #[test]
    fn entry_mode_bits() {
        let encode = |increment, follow| Instruction::EntryMode { increment, follow }.encode();
        assert_eq!(encode(false, false), 0x04);
        assert_eq!(encode(true, false), 0x06);
        assert_eq!(encode(false, true), 0x05);
        assert_eq!(encode(true, true), 0x07);
    }

    #[test]
    fn display_control_bits() {
        let on_plain = Instruction::DisplayControl {
            on: true,
            cursor: false,
            blink: false,
        };
        assert_eq!(on_plain.encode(), 0x0C);

        let all = Instruction::DisplayControl {
            on: true,
            cursor: true,
            blink: true,
        };
        assert_eq!(all.encode(), 0x0F);

        let off = Instruction::DisplayControl {
            on: false,
            cursor: true,
            blink: false,
        };
        assert_eq!(off.encode(), 0x0A);
    }

    #[test]
    fn shift_bits() {
        let shift = |target, direction| Instruction::Shift { target, direction }.encode();
        assert_eq!(shift(ShiftTarget::Cursor, ShiftDirection::Left), 0x10);
        assert_eq!(shift(ShiftTarget::Cursor, ShiftDirection::Right), 0x14);
        assert_eq!(shift(ShiftTarget::Display, ShiftDirection::Left), 0x18);
        assert_eq!(shift(ShiftTarget::Display, ShiftDirection::Right), 0x1C);
    }

    #[test]
    fn function_set_bits() {
        let boot = Instruction::FunctionSet {
            width: InterfaceWidth::EightBit,
            lines: LineCount::Two,
            font: Font::Dots5x8,
        };
        assert_eq!(boot.encode(), 0x38);

        let narrow = Instruction::FunctionSet {
            width: InterfaceWidth::FourBit,
            lines: LineCount::One,
            font: Font::Dots5x10,
        };
        assert_eq!(narrow.encode(), 0x24);
    }

    #[test]
    fn address_instructions_mask_out_of_range_bits() {
        assert_eq!(Instruction::SetCgramAddress(0x08).encode(), 0x48);
        assert_eq!(Instruction::SetCgramAddress(0xFF).encode(), 0x7F);
        assert_eq!(Instruction::SetDdramAddress(40).encode(), 0x80 | 40);
        assert_eq!(Instruction::SetDdramAddress(0xFF).encode(), 0xFF);
    }
}
