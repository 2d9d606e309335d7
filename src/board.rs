//! RP2040 bindings: GPIO port over `Flex` pins and the buzzer driver.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_rp::gpio::{Flex, Level, Output, Pull};
use embassy_time::{Duration, Ticker, Timer};

use crate::config::BUZZER_HALF_PERIOD_US;
use crate::gpio::{pin_bit, GpioPort};
use crate::link::AlarmOutput;

/// Bank 0 user GPIOs.
const GPIO_COUNT: usize = 30;

/// Port built from individually claimed pins, addressed by GPIO number.
/// Operations on pins that were never attached are ignored and read low.
pub struct FlexPort {
    pins: [Option<Flex<'static>>; GPIO_COUNT],
}

impl FlexPort {
    pub fn new() -> Self {
        Self {
            pins: [const { None }; GPIO_COUNT],
        }
    }

    /// Bind `flex` as GPIO `gpio`.
    pub fn attach(&mut self, gpio: u8, flex: Flex<'static>) {
        if let Some(slot) = self.pins.get_mut(gpio as usize) {
            *slot = Some(flex);
        } else {
            warn!("GPIO {} out of range", gpio);
        }
    }

    fn pin(&mut self, gpio: u8) -> Option<&mut Flex<'static>> {
        self.pins.get_mut(gpio as usize).and_then(Option::as_mut)
    }

    fn each_in(&mut self, mask: u32, mut f: impl FnMut(u8, &mut Flex<'static>)) {
        for (gpio, slot) in self.pins.iter_mut().enumerate() {
            if let Some(flex) = slot {
                if mask & pin_bit(gpio as u8) != 0 {
                    f(gpio as u8, flex);
                }
            }
        }
    }
}

impl Default for FlexPort {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for FlexPort {
    fn put(&mut self, pin: u8, high: bool) {
        if let Some(flex) = self.pin(pin) {
            flex.set_level(Level::from(high));
        }
    }

    fn put_masked(&mut self, mask: u32, value: u32) {
        self.each_in(mask, |gpio, flex| {
            flex.set_level(Level::from(value & pin_bit(gpio) != 0));
        });
    }

    fn get_all(&mut self) -> u32 {
        let mut word = 0;
        self.each_in(u32::MAX, |gpio, flex| {
            if flex.is_high() {
                word |= pin_bit(gpio);
            }
        });
        word
    }

    fn set_dir_out_masked(&mut self, mask: u32) {
        self.each_in(mask, |_, flex| flex.set_as_output());
    }

    fn set_dir_in_masked(&mut self, mask: u32) {
        self.each_in(mask, |_, flex| flex.set_as_input());
    }

    fn pull_down(&mut self, pin: u8) {
        if let Some(flex) = self.pin(pin) {
            flex.set_pull(Pull::Down);
        }
    }
}

/// Alarm flag shared with [`buzzer_task`]. Written only by the UI.
pub static ALARM: AtomicBool = AtomicBool::new(false);

/// [`AlarmOutput`] that sets the shared flag.
pub struct AlarmFlag;

impl AlarmOutput for AlarmFlag {
    fn set_alarm_output(&mut self, on: bool) {
        ALARM.store(on, Ordering::Relaxed);
    }
}

/// Square wave on the buzzer pin while [`ALARM`] is set.
#[embassy_executor::task]
pub async fn buzzer_task(mut pin: Output<'static>) -> ! {
    let mut ticker = Ticker::every(Duration::from_micros(BUZZER_HALF_PERIOD_US));
    loop {
        if ALARM.load(Ordering::Relaxed) {
            pin.toggle();
            ticker.next().await;
        } else {
            pin.set_low();
            Timer::after_millis(50).await;
            ticker.reset();
        }
    }
}
