//! Weather-station snapshot and the metrics shown on the data page.

use core::fmt::Write;
use heapless::String;

use crate::config::VISIBLE_COLUMNS;

/// Latest readings fetched from the server. Replaced wholesale on each fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeatherStationData {
    pub temperature: f32,
    pub humidity: f32,
    pub wind_speed: f32,
    pub wind_direction: f32,
    pub pressure: f32,
    pub smoke: f32,
    pub ambient_light: f32,
}

/// One measurable quantity, in data-page order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Metric {
    Temperature,
    Humidity,
    WindSpeed,
    WindDirection,
    Pressure,
    Light,
    Smoke,
}

impl Metric {
    /// Data page lines, top to bottom.
    pub const ALL: [Metric; 7] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::WindSpeed,
        Metric::WindDirection,
        Metric::Pressure,
        Metric::Light,
        Metric::Smoke,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "Temp",
            Metric::Humidity => "Humid",
            Metric::WindSpeed => "W sp",
            Metric::WindDirection => "W dir",
            Metric::Pressure => "Pres",
            Metric::Light => "Light",
            Metric::Smoke => "Smoke",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "C",
            Metric::Humidity => "%",
            Metric::WindSpeed => "m/s",
            Metric::WindDirection => "deg",
            Metric::Pressure => "hPa",
            Metric::Light => "lx",
            Metric::Smoke => "ppm",
        }
    }

    pub fn reading(self, data: &WeatherStationData) -> f32 {
        match self {
            Metric::Temperature => data.temperature,
            Metric::Humidity => data.humidity,
            Metric::WindSpeed => data.wind_speed,
            Metric::WindDirection => data.wind_direction,
            Metric::Pressure => data.pressure,
            Metric::Light => data.ambient_light,
            Metric::Smoke => data.smoke,
        }
    }
}

/// One display row of text.
pub type Row = String<VISIBLE_COLUMNS>;

/// `"<label>: <value><unit>"`, cut to the visible width.
pub fn render_metric(metric: Metric, data: &WeatherStationData) -> Row {
    let mut text: String<32> = String::new();
    // String<32> holds any label, an f32 with one decimal up to ~1e20 and a unit.
    let _ = write!(
        text,
        "{}: {:.1}{}",
        metric.label(),
        metric.reading(data),
        metric.unit()
    );
    truncate(&text)
}

/// Cut `text` to the visible width on a character boundary.
pub fn truncate(text: &str) -> Row {
    let mut row = Row::new();
    for c in text.chars() {
        if row.push(c).is_err() {
            break;
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherStationData {
        WeatherStationData {
            temperature: 21.5,
            humidity: 48.0,
            wind_speed: 3.25,
            wind_direction: 270.0,
            pressure: 1013.2,
            smoke: 12.0,
            ambient_light: 880.0,
        }
    }

    #[test]
    fn metrics_render_label_value_and_unit() {
        let data = sample();
        assert_eq!(render_metric(Metric::Temperature, &data).as_str(), "Temp: 21.5C");
        assert_eq!(render_metric(Metric::Humidity, &data).as_str(), "Humid: 48.0%");
        assert_eq!(render_metric(Metric::WindDirection, &data).as_str(), "W dir: 270.0deg");
        assert_eq!(render_metric(Metric::Pressure, &data).as_str(), "Pres: 1013.2hPa");
    }

    #[test]
    fn long_lines_are_cut_to_the_visible_width() {
        let data = WeatherStationData {
            ambient_light: 123_456.0,
            ..sample()
        };
        let row = render_metric(Metric::Light, &data);
        assert_eq!(row.len(), VISIBLE_COLUMNS);
        assert_eq!(row.as_str(), "Light: 123456.0l");
    }

    #[test]
    fn every_metric_reads_its_own_field() {
        let data = sample();
        let readings: [f32; 7] = Metric::ALL.map(|metric| metric.reading(&data));
        assert_eq!(readings, [21.5, 48.0, 3.25, 270.0, 1013.2, 880.0, 12.0]);
    }
}
