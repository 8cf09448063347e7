#![no_std]
#![no_main]

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use humidity_beacon::{
    error::SensorError,
    hardware::{Bme280Hardware, I2cBus, init_i2c, read_settings, scan},
    humidity,
    logic::{PollLoop, PublishOutcome, SkipReason, Trigger, publish},
    sampling::SamplingSettings,
    state::LinkState,
    traits::{HumiditySensor, PublishChannel},
};

esp_bootloader_esp_idf::esp_app_desc!();

static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();

// Test result tracking
struct TestResults {
    passed: u32,
    failed: u32,
    total: u32,
}

impl TestResults {
    fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            total: 0,
        }
    }

    fn assert(&mut self, condition: bool, test_name: &str) {
        self.total += 1;
        if condition {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!("  ✗ {} FAILED", test_name);
        }
    }

    fn assert_eq<T: PartialEq + core::fmt::Debug>(&mut self, left: T, right: T, test_name: &str) {
        self.total += 1;
        if left == right {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!("  ✗ {} FAILED: {:?} != {:?}", test_name, left, right);
        }
    }

    fn print_summary(&self) {
        esp_println::println!("\n==========================================");
        esp_println::println!("Test Summary:");
        esp_println::println!("  Total:  {}", self.total);
        esp_println::println!("  Passed: {}", self.passed);
        esp_println::println!("  Failed: {}", self.failed);
        if self.failed == 0 {
            esp_println::println!("\n✓ ALL TESTS PASSED!");
        } else {
            esp_println::println!("\n✗ SOME TESTS FAILED");
        }
        esp_println::println!("==========================================");
    }
}

struct FixedSensor(f32);

impl HumiditySensor for FixedSensor {
    fn read_humidity(&mut self) -> Result<f32, SensorError> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct CountingChannel {
    last: Option<u16>,
    count: u32,
}

impl PublishChannel for CountingChannel {
    fn publish(&mut self, encoded: u16) {
        self.last = Some(encoded);
        self.count += 1;
    }
}

fn test_publish_logic(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Publish Logic Tests");

    results.assert_eq(humidity::encode(55.5), Ok(5550), "55.5 % encodes to 5550");
    results.assert_eq(
        humidity::encode(f32::NAN),
        Err(SensorError::InvalidReading),
        "NaN is rejected",
    );

    // Disconnected: nothing leaves the device
    let link = LinkState::new();
    let mut sensor = FixedSensor(40.0);
    let mut channel = CountingChannel::default();
    results.assert_eq(
        publish(&link, &mut sensor, &mut channel),
        PublishOutcome::Skipped(SkipReason::NotConnected),
        "publish skipped while disconnected",
    );
    results.assert_eq(channel.count, 0, "no notification while disconnected");

    // Connected with a bad reading: previous value kept
    link.on_connect();
    publish(&link, &mut sensor, &mut channel);
    let mut broken = FixedSensor(f32::NAN);
    publish(&link, &mut broken, &mut channel);
    results.assert_eq(channel.last, Some(4000), "NaN keeps previous value");
    results.assert_eq(channel.count, 1, "NaN sends nothing");

    // Two writes between iterations publish once
    let mut poll = PollLoop::new(60_000);
    let mut channel = CountingChannel::default();
    link.on_command(b"1");
    link.on_command(b"2");
    let first = poll.poll(100, &link, &mut sensor, &mut channel);
    let second = poll.poll(200, &link, &mut sensor, &mut channel);
    results.assert(
        matches!(first, Some(Trigger::Command(PublishOutcome::Published(4000)))),
        "command write triggers publish",
    );
    results.assert_eq(second, None, "coalesced writes publish once");
    results.assert_eq(channel.count, 1, "exactly one notification");
}

async fn test_bme280_sensor(results: &mut TestResults, bus: &'static I2cBus) {
    esp_println::println!("\n[TEST] BME280 Sensor Tests");

    esp_println::println!("  Running I2C scan...");
    scan(bus);
    results.assert(true, "I2C scan completed");

    match Bme280Hardware::detect(bus) {
        Ok(mut sensor) => {
            results.assert(true, "BME280 initialization");
            results.assert(
                sensor.address() == 0x76 || sensor.address() == 0x77,
                "BME280 at a known address",
            );

            // 1x on every channel, filter off
            results.assert_eq(
                read_settings(bus, sensor.address()),
                Ok(SamplingSettings::PLAIN),
                "BME280 sampling 1x/1x/1x, filter off",
            );

            // Test humidity reading (5 samples)
            esp_println::println!("  Reading humidity (5 samples)...");
            let mut samples = heapless::Vec::<f32, 5>::new();
            for i in 0..5 {
                Timer::after(Duration::from_millis(100)).await;
                match sensor.read_humidity() {
                    Ok(value) => {
                        esp_println::println!("    Sample {}: {:.2} %", i + 1, value);
                        let _ = samples.push(value);
                    }
                    Err(e) => {
                        esp_println::println!("    Failed to read humidity: {}", e);
                    }
                }
            }

            results.assert_eq(samples.len(), 5, "collected 5 humidity samples");

            for value in samples.iter() {
                results.assert(
                    (0.0..=100.0).contains(value),
                    "humidity in valid range",
                );
                results.assert(
                    humidity::encode(*value).is_ok(),
                    "sample encodes for the wire",
                );
            }
        }
        Err(e) => {
            esp_println::println!("  Failed to initialize BME280: {}", e);
            results.assert(false, "BME280 initialization");
        }
    }
}

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_println::println!("\n==========================================");
    esp_println::println!("=== Hardware Unit Test Runner ===");
    esp_println::println!("==========================================");

    let mut results = TestResults::new();

    // Run tests that don't need hardware
    test_publish_logic(&mut results);

    // Initialize RTOS timer for embassy (this consumes TIMG0)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Run hardware tests
    match init_i2c(peripherals.I2C0, peripherals.GPIO8, peripherals.GPIO9) {
        Ok(i2c) => {
            let bus: &'static I2cBus = I2C_BUS.init(RefCell::new(i2c));
            test_bme280_sensor(&mut results, bus).await;
        }
        Err(e) => {
            esp_println::println!("  Failed to set up I2C: {}", e);
            results.assert(false, "I2C bus setup");
        }
    }

    results.print_summary();

    esp_println::println!("\nTest run complete. Looping...");
    loop {
        if results.failed == 0 {
            Timer::after(Duration::from_millis(200)).await;
        } else {
            Timer::after(Duration::from_millis(1000)).await;
        }
    }
}
