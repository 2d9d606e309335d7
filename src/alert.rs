//! Buzzer thresholds and the alarm condition.

use crate::weather::{Metric, WeatherStationData};

pub const SETTING_COUNT: usize = 6;

/// User threshold for one metric. Ignored by the alarm until entered.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuzzerSetting {
    pub metric: Metric,
    /// Digits collected by numeric entry; the decimal point sits before the last.
    pub precision: u8,
    pub threshold: f32,
    pub initialized: bool,
}

impl BuzzerSetting {
    pub const fn new(metric: Metric, precision: u8) -> Self {
        Self {
            metric,
            precision,
            threshold: 0.0,
            initialized: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.metric.label()
    }

    pub fn unit(&self) -> &'static str {
        self.metric.unit()
    }

    pub fn commit(&mut self, threshold: f32) {
        self.threshold = threshold;
        self.initialized = true;
    }

    /// Reading strictly above an entered threshold.
    pub fn exceeded_by(&self, data: &WeatherStationData) -> bool {
        self.initialized && self.metric.reading(data) > self.threshold
    }
}

pub type BuzzerSettings = [BuzzerSetting; SETTING_COUNT];

/// Thresholds in evaluation order, all unset.
pub const fn default_settings() -> BuzzerSettings {
    [
        BuzzerSetting::new(Metric::Temperature, 3),
        BuzzerSetting::new(Metric::Humidity, 3),
        BuzzerSetting::new(Metric::WindSpeed, 3),
        BuzzerSetting::new(Metric::Pressure, 5),
        BuzzerSetting::new(Metric::Light, 5),
        BuzzerSetting::new(Metric::Smoke, 4),
    ]
}

/// True if any entered threshold is strictly exceeded by `data`.
pub fn compare_limit(data: &WeatherStationData, settings: &BuzzerSettings) -> bool {
    settings.iter().any(|setting| setting.exceeded_by(data))
}

/// Alarm condition gated by the user's mute toggle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm {
    muted: bool,
    sounding: bool,
}

impl Alarm {
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn sounding(&self) -> bool {
        self.sounding
    }

    /// Level for the buzzer output.
    pub fn evaluate(&mut self, data: &WeatherStationData, settings: &BuzzerSettings) -> bool {
        let sounding = compare_limit(data, settings) && !self.muted;
        if sounding != self.sounding {
            info!("Alarm {}", if sounding { "on" } else { "off" });
        }
        self.sounding = sounding;
        sounding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hot() -> WeatherStationData {
        WeatherStationData {
            temperature: 40.0,
            humidity: 99.0,
            wind_speed: 30.0,
            pressure: 1100.0,
            ambient_light: 90_000.0,
            smoke: 500.0,
            ..Default::default()
        }
    }

    #[test]
    fn unset_thresholds_never_alarm() {
        assert!(!compare_limit(&hot(), &default_settings()));
    }

    #[test]
    fn equal_reading_does_not_alarm() {
        let mut settings = default_settings();
        settings[0].commit(40.0);
        assert!(!compare_limit(&hot(), &settings));

        settings[0].commit(39.9);
        assert!(compare_limit(&hot(), &settings));
    }

    #[test]
    fn any_single_metric_can_trigger() {
        for index in 0..SETTING_COUNT {
            let mut settings = default_settings();
            settings[index].commit(1.0);
            assert!(compare_limit(&hot(), &settings), "setting {}", index);

            let calm = WeatherStationData::default();
            assert!(!compare_limit(&calm, &settings), "setting {}", index);
        }
    }

    #[test]
    fn wind_direction_is_not_a_threshold() {
        let settings = default_settings();
        assert!(settings
            .iter()
            .all(|setting| setting.metric != Metric::WindDirection));
    }

    #[test]
    fn precisions_follow_magnitudes() {
        let precisions = default_settings().map(|setting| setting.precision);
        assert_eq!(precisions, [3, 3, 3, 5, 5, 4]);
    }

    #[test]
    fn mute_gates_the_output() {
        let mut settings = default_settings();
        settings[5].commit(100.0);
        let mut alarm = Alarm::default();

        assert!(alarm.evaluate(&hot(), &settings));
        assert!(alarm.toggle_mute());
        assert!(!alarm.evaluate(&hot(), &settings));
        assert!(!alarm.sounding());
        assert!(!alarm.toggle_mute());
        assert!(alarm.evaluate(&hot(), &settings));
    }
}
