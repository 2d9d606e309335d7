//! Page renderers for the 16x2 character display.
//!
//! Each function clears the screen and draws a complete page, so calling it
//! twice with the same arguments leaves the same two lines on the display.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::alert::BuzzerSetting;
use crate::display::CharacterDisplay;
use crate::error::Error;
use crate::gpio::GpioPort;
use crate::weather::{render_metric, truncate, Metric, WeatherStationData};

use super::entry::NumericEntry;

/// Items on the settings page.
pub const SETTINGS_ITEMS: [&str; 2] = ["Buzzer", "WiFi"];

fn write_at<P, D>(display: &mut CharacterDisplay<P, D>, row: u8, column: u8, text: &str) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    display.set_cursor(row, column)?;
    display.print_str(text)
}

/// Render the Welcome page.
pub fn draw_welcome<P, D>(display: &mut CharacterDisplay<P, D>) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    display.clear()?;
    write_at(display, 0, 4, "Welcome")?;
    write_at(display, 1, 4, "Pro+ 25")
}

/// Render two consecutive metrics starting at `index`.
pub fn draw_data<P, D>(
    display: &mut CharacterDisplay<P, D>,
    index: u8,
    data: &WeatherStationData,
) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    let count = Metric::ALL.len();
    let first = Metric::ALL[index as usize % count];
    let second = Metric::ALL[(index as usize + 1) % count];

    display.clear()?;
    write_at(display, 0, 0, &render_metric(first, data))?;
    write_at(display, 1, 0, &render_metric(second, data))
}

pub fn draw_settings<P, D>(display: &mut CharacterDisplay<P, D>, index: u8) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    display.clear()?;
    write_at(display, 0, 4, "Settings")?;
    write_at(
        display,
        1,
        0,
        SETTINGS_ITEMS[index as usize % SETTINGS_ITEMS.len()],
    )
}

/// Shown while a Wi-Fi scan is running.
pub fn draw_scanning<P, D>(display: &mut CharacterDisplay<P, D>) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    display.clear()?;
    write_at(display, 0, 0, "Scanning for")?;
    write_at(display, 1, 0, "WiFi networks")
}

/// Network chooser; `ssid` is `None` when the scan found nothing.
pub fn draw_networks<P, D>(display: &mut CharacterDisplay<P, D>, ssid: Option<&str>) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    display.clear()?;
    match ssid {
        Some(ssid) => {
            write_at(display, 0, 0, "Choose network")?;
            write_at(display, 1, 0, &truncate(ssid))
        }
        None => write_at(display, 0, 0, "No networks"),
    }
}

pub fn draw_connected<P, D>(display: &mut CharacterDisplay<P, D>) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    display.clear()?;
    write_at(display, 0, 3, "Connected")
}

pub fn draw_connect_failed<P, D>(display: &mut CharacterDisplay<P, D>) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    display.clear()?;
    write_at(display, 0, 3, "Failed to")?;
    write_at(display, 1, 4, "connect")
}

/// Threshold of one metric, or "Not set".
pub fn draw_buzzer_setting<P, D>(
    display: &mut CharacterDisplay<P, D>,
    setting: &BuzzerSetting,
) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    let mut title: String<32> = String::new();
    let _ = write!(title, "Alarm {}", setting.name());

    let mut value: String<32> = String::new();
    if setting.initialized {
        let _ = write!(value, "> {:.1}{}", setting.threshold, setting.unit());
    } else {
        let _ = value.push_str("Not set");
    }

    display.clear()?;
    write_at(display, 0, 0, &truncate(&title))?;
    write_at(display, 1, 0, &truncate(&value))
}

/// Numeric entry in progress: typed characters, the unit after a gap and
/// the cursor parked after the last typed character.
pub fn draw_entry<P, D>(
    display: &mut CharacterDisplay<P, D>,
    setting: &BuzzerSetting,
    entry: &NumericEntry,
) -> Result<(), Error>
where
    P: GpioPort,
    D: DelayNs,
{
    let mut title: String<32> = String::new();
    let _ = write!(title, "Set {}", setting.name());

    display.clear()?;
    write_at(display, 0, 0, &truncate(&title))?;
    write_at(display, 1, entry.width() + 1, setting.unit())?;
    write_at(display, 1, 0, entry.text())
}
