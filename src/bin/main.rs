#![no_std]
#![no_main]

use core::cell::RefCell;

use bt_hci::controller::ExternalController;
use embassy_executor::Spawner;
use embassy_futures::join::join3;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, timer::timg::TimerGroup};
use esp_radio::ble::controller::BleConnector;
use static_cell::StaticCell;
use trouble_host::prelude::*;

use humidity_beacon::{
    ble::{self, GattChannel, NotifySignal},
    config::{BLE_ADDRESS, DEVICE_NAME, HEAP_SIZE, POLL_PERIOD_MS, UPDATE_INTERVAL_MS},
    error::BleError,
    hardware::{self, Bme280Hardware, I2cBus},
    logic::PollLoop,
    state::LinkState,
    traits::{HumiditySensor, PublishChannel},
};

/// Number of HCI command slots for the external controller.
const HCI_SLOTS: usize = 20;

static LINK: LinkState = LinkState::new();
static NOTIFY: NotifySignal = Signal::new();
static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();

esp_bootloader_esp_idf::esp_app_desc!();

/// Idle forever; used when the device cannot do anything useful.
async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

async fn run_main_loop<S: HumiditySensor, P: PublishChannel>(sensor: &mut S, channel: &mut P) {
    let mut poll = PollLoop::new(UPDATE_INTERVAL_MS);
    loop {
        poll.poll(Instant::now().as_millis(), &LINK, sensor, channel);
        Timer::after(Duration::from_millis(POLL_PERIOD_MS)).await;
    }
}

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    esp_println::println!("\n=== ESP32 BME280 BLE Humidity Monitor ===");

    // Initialize RTOS timer for embassy
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Initialize BME280 sensor (SDA GPIO8, SCL GPIO9)
    esp_println::println!("Initializing BME280...");
    let i2c = match hardware::init_i2c(peripherals.I2C0, peripherals.GPIO8, peripherals.GPIO9) {
        Ok(i2c) => i2c,
        Err(e) => {
            log::error!("[ERROR] {}", e);
            halt().await
        }
    };
    let bus: &'static I2cBus = I2C_BUS.init(RefCell::new(i2c));

    let mut sensor = match Bme280Hardware::detect(bus) {
        Ok(sensor) => sensor,
        Err(e) => {
            log::error!("[ERROR] {}", e);
            hardware::scan(bus);
            halt().await
        }
    };
    esp_println::println!("BME280 initialized successfully at 0x{:02X}!", sensor.address());

    // Initialize BLE
    esp_println::println!("Initializing BLE...");
    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(e) => {
            log::error!("[ERROR] {}: {:?}", BleError::Radio, e);
            halt().await
        }
    };
    let connector = match BleConnector::new(&radio, peripherals.BT, Default::default()) {
        Ok(connector) => connector,
        Err(e) => {
            log::error!("[ERROR] {}: {:?}", BleError::Connector, e);
            halt().await
        }
    };
    let controller: ExternalController<_, HCI_SLOTS> = ExternalController::new(connector);

    let mut resources: HostResources<
        DefaultPacketPool,
        { ble::CONNECTIONS_MAX },
        { ble::L2CAP_CHANNELS_MAX },
    > = HostResources::new();
    let stack =
        trouble_host::new(controller, &mut resources).set_random_address(Address::random(BLE_ADDRESS));
    let Host {
        mut peripheral,
        runner,
        ..
    } = stack.build();

    let server = match ble::build_server() {
        Ok(server) => server,
        Err(e) => {
            log::error!("[ERROR] {}", e);
            halt().await
        }
    };
    let mut channel = GattChannel::new(&server, &NOTIFY);

    esp_println::println!("BLE Device is ready!");
    esp_println::println!("Device name: {}", DEVICE_NAME);
    esp_println::println!("Update interval: {} seconds", UPDATE_INTERVAL_MS / 1000);
    esp_println::println!("\nWaiting for connection...");
    esp_println::println!(
        "To get on-demand reading: Write any value to the Command characteristic"
    );

    join3(
        ble::ble_task(runner),
        ble::serve(&mut peripheral, &server, &LINK, &NOTIFY),
        run_main_loop(&mut sensor, &mut channel),
    )
    .await;
}
