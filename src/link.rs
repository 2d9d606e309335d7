//! Seams between the UI and the outside world.
//!
//! The UI only ever talks to Wi-Fi, the data server and the buzzer through
//! these traits. Firmware implements them over CYW43 / embassy-net and a GPIO
//! pin; tests use the doubles in [`crate::sim`].

use crate::error::Error;
use crate::weather::WeatherStationData;

/// Wi-Fi station control.
#[allow(async_fn_in_trait)]
pub trait WifiLink {
    /// Refresh the list of visible networks.
    async fn scan_networks(&mut self);

    fn network_count(&self) -> u8;

    /// SSID of a scanned network; empty when `index` is out of range.
    fn network_name(&self, index: u8) -> &str;

    async fn connect(&mut self, index: u8) -> Result<(), Error>;

    fn is_connected(&self) -> bool;
}

/// Source of weather-station snapshots.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    /// Fetch the latest snapshot from the server.
    ///
    /// On success the snapshot is held until [`consume_latest_data`] takes it.
    ///
    /// [`consume_latest_data`]: DataSource::consume_latest_data
    async fn request_last_data(&mut self) -> Result<(), Error>;

    fn has_new_data(&self) -> bool;

    /// Take the held snapshot and clear the new-data flag.
    fn consume_latest_data(&mut self) -> WeatherStationData;
}

/// Buzzer on/off.
pub trait AlarmOutput {
    fn set_alarm_output(&mut self, on: bool);
}

impl<T: AlarmOutput + ?Sized> AlarmOutput for &mut T {
    fn set_alarm_output(&mut self, on: bool) {
        (**self).set_alarm_output(on)
    }
}
