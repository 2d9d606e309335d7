//! Fixed-width numeric entry fed one key at a time.
//!
//! A threshold with precision `P` takes exactly `P` digits. The decimal
//! point is inserted automatically before the last digit, as soon as the
//! digit before it is typed, so `P = 3` and the keys `0 2 5` show `"02."`
//! then `"02.5"` = 2.5.

use heapless::String;

use crate::error::Error;

/// Widest supported entry: 7 digits and the decimal point.
pub const MAX_PRECISION: u8 = 7;

/// Result of feeding one key.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryStep {
    /// More digits needed.
    Pending,
    /// All digits collected.
    Done(f32),
    /// The user backed out; nothing is committed.
    Aborted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NumericEntry {
    precision: u8,
    digits: u8,
    text: String<8>,
}

impl NumericEntry {
    pub fn new(precision: u8) -> Self {
        let precision = precision.clamp(1, MAX_PRECISION);
        let mut text = String::new();
        if precision == 1 {
            let _ = text.push('.');
        }
        Self {
            precision,
            digits: 0,
            text,
        }
    }

    /// Typed characters so far, including the inserted decimal point.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Characters of a complete entry.
    pub fn width(&self) -> u8 {
        self.precision + 1
    }

    /// Feed one key. Digits are collected, `back` aborts, anything else is
    /// ignored.
    pub fn feed(&mut self, key: char, back: char) -> Result<EntryStep, Error> {
        if key == back {
            debug!("Entry aborted");
            return Ok(EntryStep::Aborted);
        }
        if !key.is_ascii_digit() {
            return Ok(EntryStep::Pending);
        }

        self.text.push(key).map_err(|_| Error::BufferOverflow)?;
        self.digits += 1;
        if self.digits + 1 == self.precision {
            self.text.push('.').map_err(|_| Error::BufferOverflow)?;
        }

        if self.digits < self.precision {
            return Ok(EntryStep::Pending);
        }

        let value = self
            .text
            .parse::<f32>()
            .map_err(|_| Error::InvalidNumber)?;
        Ok(EntryStep::Done(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(entry: &mut NumericEntry, keys: &str) -> EntryStep {
        let mut step = EntryStep::Pending;
        for key in keys.chars() {
            step = entry.feed(key, '*').unwrap();
        }
        step
    }

    #[test]
    fn decimal_goes_before_last_digit() {
        let mut entry = NumericEntry::new(3);
        assert_eq!(feed_all(&mut entry, "02"), EntryStep::Pending);
        assert_eq!(entry.text(), "02.");
        assert_eq!(feed_all(&mut entry, "5"), EntryStep::Done(2.5));
        assert_eq!(entry.text(), "02.5");
    }

    #[test]
    fn wide_entry() {
        let mut entry = NumericEntry::new(5);
        assert_eq!(feed_all(&mut entry, "10132"), EntryStep::Done(1013.2));
        assert_eq!(entry.width(), 6);
    }

    #[test]
    fn select_and_letters_are_ignored() {
        let mut entry = NumericEntry::new(3);
        assert_eq!(feed_all(&mut entry, "1#2"), EntryStep::Pending);
        assert_eq!(entry.text(), "12.");
    }

    #[test]
    fn back_aborts_at_any_point() {
        let mut entry = NumericEntry::new(4);
        feed_all(&mut entry, "12");
        assert_eq!(entry.feed('*', '*'), Ok(EntryStep::Aborted));
    }

    #[test]
    fn single_digit_precision_is_a_fraction() {
        let mut entry = NumericEntry::new(1);
        assert_eq!(feed_all(&mut entry, "7"), EntryStep::Done(0.7));
    }

    #[test]
    fn precision_is_clamped() {
        assert_eq!(NumericEntry::new(0).width(), 2);
        assert_eq!(NumericEntry::new(20).width(), MAX_PRECISION + 1);
    }
}
