//! Weather terminal firmware for the Raspberry Pi Pico W.
//!
//! Wiring is described in `config.rs`. The CYW43 firmware blobs are not
//! linked into the image; flash them once to the addresses in `config.rs`.

#![no_std]
#![no_main]

use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::{error, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_net::{Config, StackResources};
use embassy_rp::bind_interrupts;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::gpio::{Flex, Level, Output};
use embassy_rp::peripherals::{DMA_CH0, FLASH, PIO0};
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_time::{Delay, Duration, Instant, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use weather_terminal::board::{buzzer_task, AlarmFlag, FlexPort};
use weather_terminal::config::{
    BUSY_POLL_LIMIT, CYW43_CLM_ADDRESS, CYW43_CLM_LEN, CYW43_FW_ADDRESS, CYW43_FW_LEN,
    DISPLAY_PINS, FLASH_SIZE, KEYPAD_PINS, KEY_MATRIX, MAIN_LOOP_PERIOD_MS,
};
use weather_terminal::display::{BusyPolicy, CharacterDisplay};
use weather_terminal::keypad::Keypad;
use weather_terminal::net::Station;
use weather_terminal::storage;
use weather_terminal::ui::Ui;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

#[embassy_executor::task]
async fn cyw43_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Weather terminal starting");
    let p = embassy_rp::init(Default::default());

    // ── Wi-Fi ──────────────────────────────────────────────────────────
    //   PIN_23: CYW43 power
    //   PIN_24: CYW43 SPI data
    //   PIN_25: CYW43 SPI CS
    //   PIN_29: CYW43 SPI clock
    let fw = unsafe { core::slice::from_raw_parts(CYW43_FW_ADDRESS as *const u8, CYW43_FW_LEN) };
    let clm = unsafe { core::slice::from_raw_parts(CYW43_CLM_ADDRESS as *const u8, CYW43_CLM_LEN) };

    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    unwrap!(spawner.spawn(cyw43_task(runner)));

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
    let seed = 0x5eed_d15b_1a7e_2025;
    let (stack, runner) = embassy_net::new(
        net_device,
        Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    unwrap!(spawner.spawn(net_task(runner)));

    // ── Buzzer ─────────────────────────────────────────────────────────
    unwrap!(spawner.spawn(buzzer_task(Output::new(p.PIN_15, Level::Low))));

    // ── Display (GP2..GP12) ───────────────────────────────────────────
    let mut lcd_port = FlexPort::new();
    lcd_port.attach(DISPLAY_PINS.rs, Flex::new(p.PIN_2));
    lcd_port.attach(DISPLAY_PINS.rw, Flex::new(p.PIN_3));
    lcd_port.attach(DISPLAY_PINS.en, Flex::new(p.PIN_4));
    lcd_port.attach(DISPLAY_PINS.data[0], Flex::new(p.PIN_5));
    lcd_port.attach(DISPLAY_PINS.data[1], Flex::new(p.PIN_6));
    lcd_port.attach(DISPLAY_PINS.data[2], Flex::new(p.PIN_7));
    lcd_port.attach(DISPLAY_PINS.data[3], Flex::new(p.PIN_8));
    lcd_port.attach(DISPLAY_PINS.data[4], Flex::new(p.PIN_9));
    lcd_port.attach(DISPLAY_PINS.data[5], Flex::new(p.PIN_10));
    lcd_port.attach(DISPLAY_PINS.data[6], Flex::new(p.PIN_11));
    lcd_port.attach(DISPLAY_PINS.data[7], Flex::new(p.PIN_12));

    let display = unwrap!(CharacterDisplay::initialize(
        lcd_port,
        Delay,
        DISPLAY_PINS,
        BusyPolicy::Bounded(BUSY_POLL_LIMIT),
    ));

    // ── Keypad (rows GP16..GP19, columns GP20..GP22) ────────────────────
    let mut keypad_port = FlexPort::new();
    keypad_port.attach(KEYPAD_PINS.rows[0], Flex::new(p.PIN_16));
    keypad_port.attach(KEYPAD_PINS.rows[1], Flex::new(p.PIN_17));
    keypad_port.attach(KEYPAD_PINS.rows[2], Flex::new(p.PIN_18));
    keypad_port.attach(KEYPAD_PINS.rows[3], Flex::new(p.PIN_19));
    keypad_port.attach(KEYPAD_PINS.cols[0], Flex::new(p.PIN_20));
    keypad_port.attach(KEYPAD_PINS.cols[1], Flex::new(p.PIN_21));
    keypad_port.attach(KEYPAD_PINS.cols[2], Flex::new(p.PIN_22));
    let mut keypad = Keypad::new(keypad_port, Delay, KEYPAD_PINS, KEY_MATRIX);

    // ── Thresholds ──────────────────────────────────────────────────────
    let mut flash: Flash<'_, FLASH, Async, FLASH_SIZE> = Flash::new(p.FLASH, p.DMA_CH1);

    let mut ui = Ui::new(display, Station::new(control, stack), AlarmFlag, Delay);
    match storage::load_from_flash(&mut flash).await {
        Ok(Some(settings)) => ui.load_settings(settings),
        Ok(None) => {}
        Err(e) => warn!("Using default thresholds: {}", e),
    }

    if let Err(e) = ui.start(Instant::now().as_millis()) {
        error!("Welcome page failed: {}", e);
    }
    info!("Weather terminal ready");

    let mut ticker = Ticker::every(Duration::from_millis(MAIN_LOOP_PERIOD_MS));
    loop {
        let key = keypad.poll_key();
        if let Err(e) = ui.step(key, Instant::now().as_millis()).await {
            error!("UI step failed: {}", e);
        }

        if ui.take_settings_dirty() {
            if let Err(e) = storage::save_to_flash(&mut flash, ui.settings()).await {
                error!("Saving thresholds failed: {}", e);
            }
        }

        ticker.next().await;
    }
}
