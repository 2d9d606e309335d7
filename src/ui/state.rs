use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as Pause;

use crate::alert::{default_settings, Alarm, BuzzerSettings, SETTING_COUNT};
use crate::config::{
    CONNECT_FETCH_ATTEMPTS, CONNECT_FETCH_SPACING_MS, FETCH_INTERVAL_MS, KEY_BACK,
    MESSAGE_HOLD_MS, SCREEN_AUTO_OFF_ENABLED, SCREEN_AUTO_OFF_TIMEOUT_MS,
};
use crate::display::CharacterDisplay;
use crate::error::Error;
use crate::gpio::GpioPort;
use crate::link::{AlarmOutput, DataSource, WifiLink};
use crate::power_logic::{display_should_be_on, fetch_due};
use crate::weather::{Metric, WeatherStationData};

use super::display::{
    draw_buzzer_setting, draw_connect_failed, draw_connected, draw_data, draw_entry,
    draw_networks, draw_scanning, draw_settings, draw_welcome, SETTINGS_ITEMS,
};
use super::entry::{EntryStep, NumericEntry};
use super::input_logic::{wrap_next, wrap_prev};
use super::{Button, Page};

const DATA_LINES: u8 = Metric::ALL.len() as u8;
const SETTING_LINES: u8 = SETTINGS_ITEMS.len() as u8;
const BUZZER_LINES: u8 = SETTING_COUNT as u8;

/// Page state machine on top of the display and the collaborators.
///
/// `N` is both the Wi-Fi link and the data source. `T` provides the
/// non-blocking pauses used to hold messages on screen.
pub struct Ui<P, D, N, A, T> {
    display: CharacterDisplay<P, D>,
    network: N,
    alarm_output: A,
    pause: T,

    page: Page,
    data_index: u8,
    settings_index: u8,
    wifi_index: u8,
    buzzer_index: u8,
    entry: Option<NumericEntry>,

    data: WeatherStationData,
    settings: BuzzerSettings,
    settings_dirty: bool,
    alarm: Alarm,

    screen_on: bool,
    last_key_ms: u64,
    last_fetch_ms: Option<u64>,
}

impl<P, D, N, A, T> Ui<P, D, N, A, T>
where
    P: GpioPort,
    D: DelayNs,
    N: WifiLink + DataSource,
    A: AlarmOutput,
    T: Pause,
{
    pub fn new(display: CharacterDisplay<P, D>, network: N, alarm_output: A, pause: T) -> Self {
        Self {
            display,
            network,
            alarm_output,
            pause,
            page: Page::Welcome,
            data_index: 0,
            settings_index: 0,
            wifi_index: 0,
            buzzer_index: 0,
            entry: None,
            data: WeatherStationData::default(),
            settings: default_settings(),
            settings_dirty: false,
            alarm: Alarm::default(),
            screen_on: true,
            last_key_ms: 0,
            last_fetch_ms: None,
        }
    }

    /// Draw the Welcome page.
    pub fn start(&mut self, now_ms: u64) -> Result<(), Error> {
        self.last_key_ms = now_ms;
        self.page = Page::Welcome;
        draw_welcome(&mut self.display)
    }

    /// Run one main-loop iteration with the key scanned this iteration.
    pub async fn step(&mut self, key: Option<char>, now_ms: u64) -> Result<(), Error> {
        let key = self.screen_power(key, now_ms)?;

        if fetch_due(
            self.network.is_connected(),
            self.last_fetch_ms,
            now_ms,
            FETCH_INTERVAL_MS,
        ) {
            self.last_fetch_ms = Some(now_ms);
            self.fetch().await;
        }

        let fresh = self.take_fresh_data();

        match key {
            Some(key) => self.handle_key(key, fresh, now_ms).await,
            None if fresh && self.page == Page::Data => self.show_data(true),
            None => Ok(()),
        }
    }

    // Accessors

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn data_index(&self) -> u8 {
        self.data_index
    }

    pub fn settings_index(&self) -> u8 {
        self.settings_index
    }

    pub fn wifi_index(&self) -> u8 {
        self.wifi_index
    }

    pub fn buzzer_index(&self) -> u8 {
        self.buzzer_index
    }

    pub fn entering(&self) -> bool {
        self.entry.is_some()
    }

    pub fn screen_on(&self) -> bool {
        self.screen_on
    }

    pub fn data(&self) -> &WeatherStationData {
        &self.data
    }

    pub fn settings(&self) -> &BuzzerSettings {
        &self.settings
    }

    pub fn alarm(&self) -> &Alarm {
        &self.alarm
    }

    pub fn display(&self) -> &CharacterDisplay<P, D> {
        &self.display
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn alarm_output(&self) -> &A {
        &self.alarm_output
    }

    pub fn pause(&self) -> &T {
        &self.pause
    }

    /// Replace thresholds, e.g. with ones restored from flash.
    pub fn load_settings(&mut self, settings: BuzzerSettings) {
        self.settings = settings;
    }

    /// True once after thresholds were changed by the user.
    pub fn take_settings_dirty(&mut self) -> bool {
        core::mem::take(&mut self.settings_dirty)
    }

    // Step phases

    /// Track keypad idleness and switch the display on or off.
    /// A key that wakes the display is consumed.
    fn screen_power(&mut self, key: Option<char>, now_ms: u64) -> Result<Option<char>, Error> {
        if key.is_some() {
            self.last_key_ms = now_ms;
            if !self.screen_on {
                info!("Display wake");
                self.display.power_on()?;
                self.screen_on = true;
                return Ok(None);
            }
            return Ok(key);
        }

        let idle_ms = now_ms.saturating_sub(self.last_key_ms);
        if self.screen_on
            && !display_should_be_on(SCREEN_AUTO_OFF_ENABLED, idle_ms, SCREEN_AUTO_OFF_TIMEOUT_MS)
        {
            info!("Display auto-off after {} ms idle", idle_ms);
            self.display.power_off()?;
            self.screen_on = false;
        }
        Ok(None)
    }

    async fn fetch(&mut self) -> bool {
        debug!("Requesting data");
        match self.network.request_last_data().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Data request failed: {}", e);
                false
            }
        }
    }

    fn take_fresh_data(&mut self) -> bool {
        if !self.network.has_new_data() {
            return false;
        }
        self.data = self.network.consume_latest_data();
        debug!("New data consumed");
        true
    }

    async fn handle_key(&mut self, key: char, fresh: bool, now_ms: u64) -> Result<(), Error> {
        let button = Button::from_key(key);
        match self.page {
            Page::Welcome => self.enter_data(),
            Page::Data => self.data_page(button, fresh, now_ms).await,
            Page::Settings => self.settings_page(button).await,
            Page::WifiSettings => self.wifi_page(button, now_ms).await,
            Page::BuzzerSettings => self.buzzer_page(key, button),
        }
    }

    // Pages

    async fn data_page(&mut self, button: Button, fresh: bool, now_ms: u64) -> Result<(), Error> {
        let mut evaluate = fresh;
        match button {
            Button::Up => self.data_index = wrap_prev(self.data_index, DATA_LINES),
            Button::Down => self.data_index = wrap_next(self.data_index, DATA_LINES),
            Button::Select => return self.enter_settings(),
            Button::Mute => {
                let muted = self.alarm.toggle_mute();
                info!("Alarm muted: {}", muted);
                evaluate = true;
            }
            Button::Refresh => {
                self.last_fetch_ms = Some(now_ms);
                if self.fetch().await {
                    evaluate |= self.take_fresh_data();
                }
            }
            Button::Back | Button::Other(_) => {}
        }
        self.show_data(evaluate)
    }

    async fn settings_page(&mut self, button: Button) -> Result<(), Error> {
        match button {
            Button::Up => self.settings_index = wrap_prev(self.settings_index, SETTING_LINES),
            Button::Down => self.settings_index = wrap_next(self.settings_index, SETTING_LINES),
            Button::Select if self.settings_index == 0 => return self.enter_buzzer(),
            Button::Select => return self.enter_wifi().await,
            Button::Back => return self.enter_data(),
            _ => {}
        }
        draw_settings(&mut self.display, self.settings_index)
    }

    async fn wifi_page(&mut self, button: Button, now_ms: u64) -> Result<(), Error> {
        let count = self.network.network_count();
        match button {
            Button::Up => self.wifi_index = wrap_prev(self.wifi_index, count),
            Button::Down => self.wifi_index = wrap_next(self.wifi_index, count),
            Button::Select if count > 0 => return self.connect_selected(now_ms).await,
            Button::Back => return self.enter_settings(),
            _ => {}
        }
        self.show_networks()
    }

    fn buzzer_page(&mut self, key: char, button: Button) -> Result<(), Error> {
        if let Some(entry) = self.entry.as_mut() {
            let step = entry.feed(key, KEY_BACK)?;
            return self.entry_step(step);
        }

        match button {
            Button::Up => self.buzzer_index = wrap_prev(self.buzzer_index, BUZZER_LINES),
            Button::Down => self.buzzer_index = wrap_next(self.buzzer_index, BUZZER_LINES),
            Button::Select => {
                let setting = &self.settings[self.buzzer_index as usize];
                let entry = NumericEntry::new(setting.precision);
                draw_entry(&mut self.display, setting, &entry)?;
                self.display.show_cursor(true)?;
                self.entry = Some(entry);
                return Ok(());
            }
            Button::Back => return self.enter_settings(),
            _ => {}
        }
        draw_buzzer_setting(&mut self.display, &self.settings[self.buzzer_index as usize])
    }

    fn entry_step(&mut self, step: EntryStep) -> Result<(), Error> {
        let index = self.buzzer_index as usize;
        match step {
            EntryStep::Pending => {
                if let Some(entry) = self.entry.as_ref() {
                    draw_entry(&mut self.display, &self.settings[index], entry)?;
                }
                return Ok(());
            }
            EntryStep::Done(threshold) => {
                info!("Threshold {} set to {}", self.settings[index].name(), threshold);
                self.settings[index].commit(threshold);
                self.settings_dirty = true;
            }
            EntryStep::Aborted => {}
        }
        self.entry = None;
        self.display.show_cursor(false)?;
        draw_buzzer_setting(&mut self.display, &self.settings[index])
    }

    // Transitions

    fn enter_data(&mut self) -> Result<(), Error> {
        self.set_page(Page::Data);
        self.take_fresh_data();
        self.show_data(true)
    }

    fn enter_settings(&mut self) -> Result<(), Error> {
        self.set_page(Page::Settings);
        draw_settings(&mut self.display, self.settings_index)
    }

    fn enter_buzzer(&mut self) -> Result<(), Error> {
        self.set_page(Page::BuzzerSettings);
        draw_buzzer_setting(&mut self.display, &self.settings[self.buzzer_index as usize])
    }

    /// Scan, then show the first network.
    async fn enter_wifi(&mut self) -> Result<(), Error> {
        self.set_page(Page::WifiSettings);
        draw_scanning(&mut self.display)?;
        self.network.scan_networks().await;
        self.wifi_index = 0;
        info!("Scan found {} networks", self.network.network_count());
        self.show_networks()
    }

    async fn connect_selected(&mut self, now_ms: u64) -> Result<(), Error> {
        let index = self.wifi_index;
        match self.network.connect(index).await {
            Ok(()) => {
                info!("Connected to network {}", index);
                draw_connected(&mut self.display)?;
                self.pause.delay_ms(MESSAGE_HOLD_MS).await;

                for attempt in 0..CONNECT_FETCH_ATTEMPTS {
                    if attempt > 0 {
                        self.pause.delay_ms(CONNECT_FETCH_SPACING_MS).await;
                    }
                    if self.fetch().await {
                        break;
                    }
                }
                self.last_fetch_ms = Some(now_ms);
                self.enter_data()
            }
            Err(e) => {
                warn!("Connect to network {} failed: {}", index, e);
                draw_connect_failed(&mut self.display)?;
                self.pause.delay_ms(MESSAGE_HOLD_MS).await;
                self.enter_settings()
            }
        }
    }

    // Rendering

    fn set_page(&mut self, page: Page) {
        if page != self.page {
            debug!("Page {} -> {}", self.page, page);
        }
        self.page = page;
    }

    fn show_data(&mut self, evaluate: bool) -> Result<(), Error> {
        draw_data(&mut self.display, self.data_index, &self.data)?;
        if evaluate {
            let on = self.alarm.evaluate(&self.data, &self.settings);
            self.alarm_output.set_alarm_output(on);
        }
        Ok(())
    }

    fn show_networks(&mut self) -> Result<(), Error> {
        let ssid = (self.network.network_count() > 0)
            .then(|| self.network.network_name(self.wifi_index));
        draw_networks(&mut self.display, ssid)
    }
}
