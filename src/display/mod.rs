//! Driver for a parallel (8-bit) character display controller.
//!
//! Every logical operation becomes one or more timed bus cycles on raw GPIO:
//!
//! ```text
//! write: poll busy → RW/RS → data out → 1µs → EN↑ → 1µs → drive DB → 1µs → EN↓
//! read:              RW/RS → data in  → 1µs → EN↑ → 1µs → sample DB → 1µs → EN↓
//! ```
//!
//! The driver keeps an in-memory mirror of the controller state (power,
//! cursor, entry mode, address counter, visible window offset) so that
//! state queries never touch the bus.
//!
//! ## Busy handling
//!
//! Each write first polls the busy flag.  With [`BusyPolicy::Spin`] the poll
//! never gives up, exactly like the bare controller protocol: a miswired or
//! unpowered display hangs the caller.  [`BusyPolicy::Bounded`] stops after a
//! fixed number of status reads and returns [`Error::DisplayTimeout`].
//! [`CharacterDisplay::busy`] and [`CharacterDisplay::read_address_counter`]
//! are exposed so callers can build their own strategy.

pub mod command;
pub mod pins;

use crate::config::{BUS_SETTLE_US, DDRAM_SIZE, ROW_LENGTH};
use crate::error::Error;
use crate::gpio::{pin_bit, GpioPort};
use command::{
    Font, Instruction, InterfaceWidth, LineCount, Register, ShiftDirection, ShiftTarget,
    ADDRESS_MASK, BUSY_FLAG,
};
use embedded_hal::delay::DelayNs;
use pins::DisplayPinConfig;

/// How long a write waits for the busy flag to clear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusyPolicy {
    /// Poll until the flag clears, however long that takes.
    Spin,
    /// Give up after this many status reads.
    Bounded(u32),
}

/// Mirror of the controller configuration and cursor bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayState {
    pub power: bool,
    pub cursor: bool,
    pub blink: bool,
    pub width: InterfaceWidth,
    pub lines: LineCount,
    pub font: Font,
    /// Address counter moves up (true) or down after each data access.
    pub increment: bool,
    /// Visible window follows the cursor on data access.
    pub follow: bool,
    /// DDRAM address counter, always `< DDRAM_SIZE`.
    pub address: u8,
    /// Visible window offset, always `< ROW_LENGTH`.
    pub display_position: u8,
}

impl DisplayState {
    /// State of a controller straight after power-up.
    pub const fn power_on_reset() -> Self {
        Self {
            power: false,
            cursor: false,
            blink: false,
            width: InterfaceWidth::EightBit,
            lines: LineCount::One,
            font: Font::Dots5x8,
            increment: true,
            follow: false,
            address: 0,
            display_position: 0,
        }
    }

    /// Step the address counter one cell after a data access, and the
    /// visible window with it when `window_moves` is set.
    fn advance(&mut self, forward: bool, window_moves: bool) {
        self.address = wrap_step(self.address, forward, DDRAM_SIZE);
        if window_moves {
            self.scroll(forward);
        }
    }

    /// Step only the visible window; the address counter stays put.
    fn scroll(&mut self, forward: bool) {
        self.display_position = wrap_step(self.display_position, forward, ROW_LENGTH);
    }
}

/// `value` moved one step up or down modulo `modulus`.
fn wrap_step(value: u8, forward: bool, modulus: u8) -> u8 {
    if forward {
        (value + 1) % modulus
    } else {
        (value + modulus - 1) % modulus
    }
}

/// Character display attached to a [`GpioPort`].
pub struct CharacterDisplay<P, D> {
    port: P,
    delay: D,
    pins: DisplayPinConfig,
    control_mask: u32,
    data_mask: u32,
    busy_policy: BusyPolicy,
    state: DisplayState,
}

impl<P, D> CharacterDisplay<P, D>
where
    P: GpioPort,
    D: DelayNs,
{
    /// Claim the pins and run the fixed power-up sequence:
    /// function set → clear → entry mode (increment, static window) →
    /// display on (cursor and blink off).
    ///
    /// The order matters: the controller ignores parts of the instruction
    /// set until function set has been issued.
    pub fn initialize(
        port: P,
        delay: D,
        pins: DisplayPinConfig,
        busy_policy: BusyPolicy,
    ) -> Result<Self, Error> {
        let mut display = Self {
            port,
            delay,
            pins,
            control_mask: pins.control_mask(),
            data_mask: pins.data_mask(),
            busy_policy,
            state: DisplayState::power_on_reset(),
        };

        display.port.put_masked(display.control_mask, 0);
        display.port.set_dir_out_masked(display.control_mask);

        debug!("Display: function set");
        display.function_set(InterfaceWidth::EightBit, LineCount::Two, Font::Dots5x8)?;
        debug!("Display: clear");
        display.clear()?;
        debug!("Display: entry mode");
        display.entry_mode(true, false)?;
        debug!("Display: on");
        display.control(true, false, false)?;

        info!("Display ready");
        Ok(display)
    }

    // Public operations

    /// Blank every cell and move the cursor home.
    ///
    /// The controller also resets the entry mode to increment.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.write_instruction(Instruction::Clear)?;
        self.state.address = 0;
        self.state.display_position = 0;
        self.state.increment = true;
        Ok(())
    }

    /// Move the cursor home and undo any display shift; DDRAM is untouched.
    pub fn return_home(&mut self) -> Result<(), Error> {
        self.write_instruction(Instruction::ReturnHome)?;
        self.state.address = 0;
        self.state.display_position = 0;
        Ok(())
    }

    /// Write one character at the cursor and advance the address counter.
    pub fn print_char(&mut self, character: u8) -> Result<(), Error> {
        self.write(character, Register::Data)?;
        self.state.advance(self.state.increment, self.state.follow);
        Ok(())
    }

    /// Write a string at the cursor. Text past the end of DDRAM wraps to
    /// the first cell.
    pub fn print_str(&mut self, text: &str) -> Result<(), Error> {
        text.bytes().try_for_each(|byte| self.print_char(byte))
    }

    /// Move the cursor to `row` (0 or 1) and `column`.
    ///
    /// DDRAM is addressed as two 40-cell rows whatever the visible width,
    /// so callers keep `column` inside the visible window themselves.
    /// Out-of-range values wrap: the row to 0/1, the column modulo 40.
    pub fn set_cursor(&mut self, row: u8, column: u8) -> Result<(), Error> {
        self.set_ddram_address((row & 1) * ROW_LENGTH + column % ROW_LENGTH)
    }

    pub fn power_on(&mut self) -> Result<(), Error> {
        self.control(true, self.state.cursor, self.state.blink)
    }

    pub fn power_off(&mut self) -> Result<(), Error> {
        self.control(false, self.state.cursor, self.state.blink)
    }

    pub fn show_cursor(&mut self, show: bool) -> Result<(), Error> {
        self.control(self.state.power, show, self.state.blink)
    }

    pub fn blink_cursor(&mut self, blink: bool) -> Result<(), Error> {
        self.control(self.state.power, self.state.cursor, blink)
    }

    /// Select address direction and whether the visible window follows
    /// the cursor on data access.
    pub fn entry_mode(&mut self, increment: bool, follow: bool) -> Result<(), Error> {
        self.write_instruction(Instruction::EntryMode { increment, follow })?;
        self.state.increment = increment;
        self.state.follow = follow;
        Ok(())
    }

    /// Move the cursor, or the whole visible window, one cell.
    pub fn shift(&mut self, target: ShiftTarget, direction: ShiftDirection) -> Result<(), Error> {
        self.write_instruction(Instruction::Shift { target, direction })?;
        let forward = direction == ShiftDirection::Right;
        match target {
            ShiftTarget::Cursor => {
                self.state.address = wrap_step(self.state.address, forward, DDRAM_SIZE);
            }
            ShiftTarget::Display => self.state.scroll(forward),
        }
        Ok(())
    }

    pub fn function_set(
        &mut self,
        width: InterfaceWidth,
        lines: LineCount,
        font: Font,
    ) -> Result<(), Error> {
        self.write_instruction(Instruction::FunctionSet { width, lines, font })?;
        self.state.width = width;
        self.state.lines = lines;
        self.state.font = font;
        Ok(())
    }

    /// Point subsequent data access at character-generator RAM.
    pub fn set_cgram_address(&mut self, address: u8) -> Result<(), Error> {
        self.write_instruction(Instruction::SetCgramAddress(address))
    }

    /// Point subsequent data access at display RAM.
    pub fn set_ddram_address(&mut self, address: u8) -> Result<(), Error> {
        self.write_instruction(Instruction::SetDdramAddress(address))?;
        self.state.address = address % DDRAM_SIZE;
        Ok(())
    }

    /// Load a 5x8 glyph into CGRAM slot `slot` (0..=7); it prints as
    /// character code `slot`. The cursor position is kept.
    ///
    /// The DDRAM address is restored even when a row write fails, so the
    /// next print does not land in glyph memory; the first error wins.
    pub fn define_glyph(&mut self, slot: u8, rows: [u8; 8]) -> Result<(), Error> {
        let address = self.state.address;
        self.set_cgram_address((slot & 0x07) << 3)?;
        let loaded = rows
            .iter()
            .try_for_each(|&row| self.write(row & 0x1F, Register::Data));
        let restored = self.set_ddram_address(address);
        loaded.and(restored)
    }

    /// Read the character under the cursor and advance the address counter.
    pub fn read_data(&mut self) -> Result<u8, Error> {
        self.wait_ready()?;
        let data = self.read(Register::Data);
        self.state.advance(self.state.increment, self.state.follow);
        Ok(data)
    }

    /// One raw status read: is the controller still busy?
    pub fn busy(&mut self) -> bool {
        self.read(Register::Instruction) & BUSY_FLAG != 0
    }

    /// One raw status read: the controller's own address counter.
    pub fn read_address_counter(&mut self) -> u8 {
        self.read(Register::Instruction) & ADDRESS_MASK
    }

    /// Driver-side mirror of the controller state.
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn busy_policy(&self) -> BusyPolicy {
        self.busy_policy
    }

    /// Give the port and delay back, e.g. to inspect a simulated bus.
    pub fn release(self) -> (P, D) {
        (self.port, self.delay)
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    // Instruction helpers

    fn control(&mut self, on: bool, cursor: bool, blink: bool) -> Result<(), Error> {
        self.write_instruction(Instruction::DisplayControl { on, cursor, blink })?;
        self.state.power = on;
        self.state.cursor = cursor;
        self.state.blink = blink;
        Ok(())
    }

    fn write_instruction(&mut self, instruction: Instruction) -> Result<(), Error> {
        self.write(instruction.encode(), Register::Instruction)
    }

    // Bus cycles

    /// Poll the busy flag according to the configured policy.
    fn wait_ready(&mut self) -> Result<(), Error> {
        match self.busy_policy {
            BusyPolicy::Spin => {
                while self.busy() {}
                Ok(())
            }
            BusyPolicy::Bounded(limit) => {
                for _ in 0..limit {
                    if !self.busy() {
                        return Ok(());
                    }
                }
                warn!("Display: busy flag stuck after {} polls", limit);
                Err(Error::DisplayTimeout)
            }
        }
    }

    fn select(&mut self, register: Register, read: bool) {
        self.port.put(self.pins.rw, read);
        self.port.put(self.pins.rs, register == Register::Data);
    }

    fn write(&mut self, byte: u8, register: Register) -> Result<(), Error> {
        self.wait_ready()?;

        self.select(register, false);
        self.port.set_dir_out_masked(self.data_mask);
        self.delay.delay_us(BUS_SETTLE_US);

        self.port.put(self.pins.en, true);
        self.delay.delay_us(BUS_SETTLE_US);

        self.port.put_masked(self.data_mask, self.pins.pack(byte));
        self.delay.delay_us(BUS_SETTLE_US);

        self.port.put(self.pins.en, false);
        Ok(())
    }

    fn read(&mut self, register: Register) -> u8 {
        self.select(register, true);
        self.port.set_dir_in_masked(self.data_mask);
        self.delay.delay_us(BUS_SETTLE_US);

        self.port.put(self.pins.en, true);
        self.delay.delay_us(BUS_SETTLE_US);

        let word = self.port.get_all();
        self.delay.delay_us(BUS_SETTLE_US);

        self.port.put(self.pins.en, false);
        self.pins.extract(word & self.data_mask)
    }
}

/// True when `pin` is part of the display wiring.
pub fn uses_pin(pins: &DisplayPinConfig, pin: u8) -> bool {
    (pins.control_mask() | pins.data_mask()) & pin_bit(pin) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DISPLAY_PINS;
    use crate::sim::{NoopDelay, RecordingDelay, SimController};

    fn display() -> CharacterDisplay<SimController, NoopDelay> {
        CharacterDisplay::initialize(
            SimController::new(DISPLAY_PINS),
            NoopDelay,
            DISPLAY_PINS,
            BusyPolicy::Bounded(10),
        )
        .unwrap()
    }

    #[test]
    fn init_sequence_is_fixed_and_ordered() {
        let display = display();
        let log = display.port().instructions();
        assert_eq!(log, &[0x38, 0x01, 0x06, 0x0C]);

        let state = display.state();
        assert!(state.power);
        assert!(!state.cursor);
        assert!(!state.blink);
        assert!(state.increment);
        assert!(!state.follow);
        assert_eq!(state.lines, LineCount::Two);
        assert_eq!(state.address, 0);
        assert_eq!(display.port().protocol_violations(), 0);
    }

    #[test]
    fn print_advances_address_modulo_80() {
        let mut display = display();
        display.set_cursor(1, 38).unwrap();
        display.print_str("abc").unwrap();
        assert_eq!(display.state().address, 1);
        assert_eq!(display.read_address_counter(), 1);
    }

    #[test]
    fn decrement_mode_wraps_below_zero() {
        let mut display = display();
        display.entry_mode(false, false).unwrap();
        display.print_str("xyz").unwrap();
        assert_eq!(display.state().address, 77);
        assert_eq!(display.read_address_counter(), 77);
    }

    #[test]
    fn address_after_n_prints_matches_formula() {
        for start in [0u8, 17, 39, 40, 79] {
            for increment in [true, false] {
                let mut display = display();
                display.entry_mode(increment, false).unwrap();
                display.set_ddram_address(start).unwrap();
                for _ in 0..123 {
                    display.print_char(b'#').unwrap();
                }
                let expected = if increment {
                    (start as u32 + 123) % 80
                } else {
                    (start as u32 + 80 * 2 - 123) % 80
                };
                assert_eq!(display.state().address as u32, expected);
                assert_eq!(display.read_address_counter() as u32, expected);
            }
        }
    }

    #[test]
    fn set_cursor_reads_back_row_times_40_plus_column() {
        let mut display = display();
        for row in 0..2u8 {
            for column in 0..40u8 {
                display.set_cursor(row, column).unwrap();
                assert_eq!(display.read_address_counter(), row * 40 + column);
            }
        }
    }

    #[test]
    fn window_only_moves_when_following() {
        let mut display = display();
        display.print_str("ab").unwrap();
        assert_eq!(display.state().display_position, 0);

        display.entry_mode(true, true).unwrap();
        display.print_str("cd").unwrap();
        assert_eq!(display.state().display_position, 2);

        display.entry_mode(false, true).unwrap();
        for _ in 0..3 {
            display.print_char(b'.').unwrap();
        }
        assert_eq!(display.state().display_position, 39);
    }

    #[test]
    fn clear_resets_address_and_entry_direction() {
        let mut display = display();
        display.entry_mode(false, true).unwrap();
        display.print_str("hello").unwrap();
        display.clear().unwrap();

        let state = display.state();
        assert_eq!(state.address, 0);
        assert_eq!(state.display_position, 0);
        assert!(state.increment);
        assert_eq!(display.port().line(0).as_str(), "");
    }

    #[test]
    fn text_lands_in_ddram() {
        let mut display = display();
        display.set_cursor(0, 4).unwrap();
        display.print_str("Welcome").unwrap();
        display.set_cursor(1, 0).unwrap();
        display.print_str("Pro+ 25").unwrap();

        assert_eq!(display.port().line(0).as_str(), "    Welcome");
        assert_eq!(display.port().line(1).as_str(), "Pro+ 25");
    }

    #[test]
    fn cursor_and_power_keep_other_flags() {
        let mut display = display();
        display.show_cursor(true).unwrap();
        display.blink_cursor(true).unwrap();
        display.power_off().unwrap();

        let state = display.state();
        assert!(!state.power);
        assert!(state.cursor);
        assert!(state.blink);
        assert_eq!(display.port().instructions().last(), Some(&0x0B));

        display.power_on().unwrap();
        assert_eq!(display.port().instructions().last(), Some(&0x0F));
        assert!(display.port().is_on());
    }

    #[test]
    fn cursor_shift_moves_address_only() {
        let mut display = display();
        display.set_cursor(0, 5).unwrap();
        display
            .shift(ShiftTarget::Cursor, ShiftDirection::Left)
            .unwrap();
        assert_eq!(display.state().address, 4);
        assert_eq!(display.state().display_position, 0);

        assert_eq!(display.read_address_counter(), 4);

        display
            .shift(ShiftTarget::Display, ShiftDirection::Right)
            .unwrap();
        assert_eq!(display.state().address, 4);
        assert_eq!(display.state().display_position, 1);
        assert_eq!(display.read_address_counter(), 4);
    }

    #[test]
    fn mirror_tracks_controller_through_display_shifts() {
        let mut display = display();
        display.set_cursor(0, 5).unwrap();
        display
            .shift(ShiftTarget::Display, ShiftDirection::Right)
            .unwrap();
        let hw = display.read_address_counter();
        assert_eq!(display.state().address, hw);
        assert_eq!(display.port().window(), display.state().display_position);

        display.print_char(b'X').unwrap();
        assert_eq!(display.port().cell(5), b'X');
        assert_eq!(display.state().address, 6);
        assert_eq!(display.read_address_counter(), 6);

        display
            .shift(ShiftTarget::Display, ShiftDirection::Left)
            .unwrap();
        display
            .shift(ShiftTarget::Display, ShiftDirection::Left)
            .unwrap();
        assert_eq!(display.state().display_position, 39);
        assert_eq!(display.port().window(), 39);
        let hw = display.read_address_counter();
        assert_eq!(display.state().address, hw);
    }

    #[test]
    fn cursor_shift_wraps_the_address_both_ways() {
        let mut display = display();
        display.set_cursor(1, 39).unwrap();
        display
            .shift(ShiftTarget::Cursor, ShiftDirection::Right)
            .unwrap();
        assert_eq!(display.state().address, 0);
        display
            .shift(ShiftTarget::Cursor, ShiftDirection::Left)
            .unwrap();
        assert_eq!(display.state().address, 79);
        assert_eq!(display.read_address_counter(), 79);
        assert_eq!(display.state().display_position, 0);
    }

    #[test]
    fn return_home_keeps_ddram() {
        let mut display = display();
        display.print_str("keep").unwrap();
        display.return_home().unwrap();
        assert_eq!(display.state().address, 0);
        assert_eq!(display.read_address_counter(), 0);
        assert_eq!(display.port().line(0).as_str(), "keep");
    }

    #[test]
    fn read_data_returns_cell_and_advances() {
        let mut display = display();
        display.print_str("AB").unwrap();
        display.set_cursor(0, 1).unwrap();
        assert_eq!(display.read_data().unwrap(), b'B');
        assert_eq!(display.state().address, 2);
    }

    #[test]
    fn glyph_goes_to_cgram_and_cursor_is_restored() {
        let mut display = display();
        display.set_cursor(1, 3).unwrap();
        let degree = [0x06, 0x09, 0x09, 0x06, 0x00, 0x00, 0x00, 0x00];
        display.define_glyph(1, degree).unwrap();

        assert_eq!(display.port().glyph(1), degree);
        assert_eq!(display.state().address, 43);
        assert_eq!(display.read_address_counter(), 43);

        display.print_char(1).unwrap();
        assert_eq!(display.port().cell(43), 1);
    }

    #[test]
    fn failed_glyph_load_still_returns_to_ddram() {
        let mut display = display();
        display.set_cursor(0, 7).unwrap();
        // Busy for 15 reads after CGRAM select + first row: the second row
        // gives up after 10 polls, the restore gets through.
        display.port_mut().stall_after_writes(2, 15);
        let result = display.define_glyph(2, [0x1F; 8]);
        assert_eq!(result, Err(Error::DisplayTimeout));

        assert_eq!(display.state().address, 7);
        assert_eq!(display.read_address_counter(), 7);
        display.print_char(b'k').unwrap();
        assert_eq!(display.port().cell(7), b'k');
        assert_eq!(display.port().glyph(2)[1], 0);
    }

    #[test]
    fn busy_controller_is_polled_until_ready() {
        let mut sim = SimController::new(DISPLAY_PINS);
        sim.set_busy_reads(3);
        let mut display =
            CharacterDisplay::initialize(sim, NoopDelay, DISPLAY_PINS, BusyPolicy::Bounded(4))
                .unwrap();
        display.print_char(b'x').unwrap();
        assert_eq!(display.port().cell(0), b'x');
        assert_eq!(display.port().protocol_violations(), 0);
    }

    #[test]
    fn stuck_controller_times_out_instead_of_hanging() {
        let mut sim = SimController::new(DISPLAY_PINS);
        sim.set_stuck(true);
        let result =
            CharacterDisplay::initialize(sim, NoopDelay, DISPLAY_PINS, BusyPolicy::Bounded(50));
        assert!(matches!(result, Err(Error::DisplayTimeout)));
    }

    #[test]
    fn stuck_after_init_reports_timeout_and_keeps_mirror() {
        let mut display = display();
        display.print_str("ab").unwrap();
        let (mut sim, delay) = display.release();
        sim.set_stuck(true);
        let mut display = CharacterDisplay {
            port: sim,
            delay,
            pins: DISPLAY_PINS,
            control_mask: DISPLAY_PINS.control_mask(),
            data_mask: DISPLAY_PINS.data_mask(),
            busy_policy: BusyPolicy::Bounded(10),
            state: DisplayState {
                address: 2,
                ..DisplayState::power_on_reset()
            },
        };
        assert_eq!(display.print_char(b'c'), Err(Error::DisplayTimeout));
        assert_eq!(display.state().address, 2);
        assert!(display.busy());
    }

    #[test]
    fn every_cycle_waits_three_settle_gaps() {
        let display = CharacterDisplay::initialize(
            SimController::new(DISPLAY_PINS),
            RecordingDelay::default(),
            DISPLAY_PINS,
            BusyPolicy::Spin,
        )
        .unwrap();
        let (sim, _) = display.release();
        let mut display = CharacterDisplay {
            port: sim,
            delay: RecordingDelay::default(),
            pins: DISPLAY_PINS,
            control_mask: DISPLAY_PINS.control_mask(),
            data_mask: DISPLAY_PINS.data_mask(),
            busy_policy: BusyPolicy::Spin,
            state: DisplayState::power_on_reset(),
        };

        // One ready status read plus the data write.
        display.print_char(b'a').unwrap();
        assert_eq!(display.delay.calls, 6);
        assert_eq!(display.delay.total_ns, 6 * 1_000);
    }

    #[test]
    fn pin_membership() {
        assert!(uses_pin(&DISPLAY_PINS, 4));
        assert!(uses_pin(&DISPLAY_PINS, 12));
        assert!(!uses_pin(&DISPLAY_PINS, 13));
    }
}
