//! Business logic layer (hardware-independent)

use crate::{
    config::UPDATE_INTERVAL_MS,
    humidity,
    state::LinkState,
    traits::{HumiditySensor, PublishChannel},
};

/// Why a publish did not reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotConnected,
    SensorFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(u16),
    Skipped(SkipReason),
}

/// Which path of the main loop fired on an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Command(PublishOutcome),
    Interval(PublishOutcome),
}

/// Read the sensor and push the encoded value to the client.
///
/// Never touches the sensor while no client is connected, and leaves the
/// characteristic untouched when the reading is unusable.
pub fn publish<S: HumiditySensor, P: PublishChannel>(
    link: &LinkState,
    sensor: &mut S,
    channel: &mut P,
) -> PublishOutcome {
    if !link.is_connected() {
        log::info!("No device connected - skipping reading");
        return PublishOutcome::Skipped(SkipReason::NotConnected);
    }

    let encoded = match sensor.read_humidity().and_then(humidity::encode) {
        Ok(encoded) => encoded,
        Err(e) => {
            log::warn!("Failed to read humidity: {}", e);
            return PublishOutcome::Skipped(SkipReason::SensorFault);
        }
    };

    channel.publish(encoded);
    log::info!(
        "Humidity {}.{:02} % sent via BLE",
        encoded / 100,
        encoded % 100
    );
    PublishOutcome::Published(encoded)
}

/// The polling half of the main loop; the caller owns the sleep.
pub struct PollLoop {
    interval_ms: u64,
    last_scheduled_ms: u64,
}

impl PollLoop {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            // the interval is measured from boot
            last_scheduled_ms: 0,
        }
    }

    /// Run one iteration at time `now_ms` (milliseconds since boot).
    pub fn poll<S: HumiditySensor, P: PublishChannel>(
        &mut self,
        now_ms: u64,
        link: &LinkState,
        sensor: &mut S,
        channel: &mut P,
    ) -> Option<Trigger> {
        if link.take_trigger() {
            return Some(Trigger::Command(publish(link, sensor, channel)));
        }

        if link.is_connected() && now_ms.saturating_sub(self.last_scheduled_ms) >= self.interval_ms
        {
            let outcome = publish(link, sensor, channel);
            self.last_scheduled_ms = now_ms;
            return Some(Trigger::Interval(outcome));
        }

        None
    }
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new(UPDATE_INTERVAL_MS)
    }
}
