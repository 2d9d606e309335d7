//! Masked GPIO port access.
//!
//! Both the display bus and the keypad matrix operate on groups of pins at
//! once (one masked write for the data bus, one masked read for the rows),
//! so drivers talk to a whole port addressed by logical GPIO number rather
//! than to individual `embedded_hal` pins.

/// Bit for a single GPIO number inside a port word.
pub const fn pin_bit(pin: u8) -> u32 {
    1 << pin
}

/// Port-wide GPIO access, indexed by GPIO number (0..=31).
pub trait GpioPort {
    /// Drive a single output pin.
    fn put(&mut self, pin: u8, high: bool);

    /// Drive every pin in `mask` to the matching bit of `value`.
    fn put_masked(&mut self, mask: u32, value: u32);

    /// Sample all pins; bit `n` is the level on GPIO `n`.
    fn get_all(&mut self) -> u32;

    /// Switch every pin in `mask` to output.
    fn set_dir_out_masked(&mut self, mask: u32);

    /// Switch every pin in `mask` to input.
    fn set_dir_in_masked(&mut self, mask: u32);

    /// Enable the internal pull-down on an input pin.
    fn pull_down(&mut self, pin: u8);
}

impl<T: GpioPort + ?Sized> GpioPort for &mut T {
    fn put(&mut self, pin: u8, high: bool) {
        (**self).put(pin, high)
    }

    fn put_masked(&mut self, mask: u32, value: u32) {
        (**self).put_masked(mask, value)
    }

    fn get_all(&mut self) -> u32 {
        (**self).get_all()
    }

    fn set_dir_out_masked(&mut self, mask: u32) {
        (**self).set_dir_out_masked(mask)
    }

    fn set_dir_in_masked(&mut self, mask: u32) {
        (**self).set_dir_in_masked(mask)
    }

    fn pull_down(&mut self, pin: u8) {
        (**self).pull_down(pin)
    }
}
