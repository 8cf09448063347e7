//! Environmental Sensing GATT server.
//!
//! | Characteristic | UUID                                   | Perms       |
//! |----------------|----------------------------------------|-------------|
//! | Humidity       | `0x2A6F`                               | Read+Notify |
//! | Command        | `a3c87500-8ed3-4bdf-8a39-a01bebede295` | Write       |
//!
//! The humidity value is a `u16` in hundredths of a percent, described by a
//! presentation format descriptor. Any non-empty write to the command
//! characteristic requests an immediate reading.

use embassy_futures::select::select;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{Duration, Timer};
use trouble_host::prelude::*;

use crate::{
    config::{COMMAND_MAX_LEN, DEVICE_NAME},
    error::BleError,
    humidity::PRESENTATION_FORMAT,
    state::LinkState,
    traits::PublishChannel,
};

/// Max number of connections
pub const CONNECTIONS_MAX: usize = 1;

/// Max number of L2CAP channels (signal + ATT)
pub const L2CAP_CHANNELS_MAX: usize = 2;

const ENVIRONMENTAL_SENSING_UUID16: [u8; 2] = 0x181Au16.to_le_bytes();

const ADVERTISE_RETRY: Duration = Duration::from_secs(1);

/// Latest encoded value waiting to be notified.
pub type NotifySignal = Signal<CriticalSectionRawMutex, u16>;

#[gatt_server]
pub struct Server {
    pub environmental_sensing: EnvironmentalSensingService,
}

#[gatt_service(uuid = service::ENVIRONMENTAL_SENSING)]
pub struct EnvironmentalSensingService {
    #[descriptor(uuid = descriptors::CHARACTERISTIC_PRESENTATION_FORMAT, read, value = PRESENTATION_FORMAT)]
    #[characteristic(uuid = characteristic::HUMIDITY, read, notify)]
    pub humidity: u16,
    #[characteristic(uuid = "a3c87500-8ed3-4bdf-8a39-a01bebede295", write)]
    pub command: [u8; COMMAND_MAX_LEN],
}

pub fn build_server<'values>() -> Result<Server<'values>, BleError> {
    Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
        name: DEVICE_NAME,
        appearance: &appearance::sensor::GENERIC_SENSOR,
    }))
    .map_err(BleError::Gatt)
}

/// [`PublishChannel`] backed by the GATT table.
///
/// The value is stored in the attribute table right away so reads see it;
/// the notification is handed to the connection task.
pub struct GattChannel<'a, 'values> {
    server: &'a Server<'values>,
    notify: &'a NotifySignal,
}

impl<'a, 'values> GattChannel<'a, 'values> {
    pub fn new(server: &'a Server<'values>, notify: &'a NotifySignal) -> Self {
        Self { server, notify }
    }
}

impl PublishChannel for GattChannel<'_, '_> {
    fn publish(&mut self, encoded: u16) {
        let humidity = &self.server.environmental_sensing.humidity;
        if let Err(e) = self.server.set(humidity, &encoded) {
            log::warn!("[gatt] failed to store humidity value: {:?}", e);
        }
        self.notify.signal(encoded);
    }
}

/// Background task that keeps the BLE host stack running.
pub async fn ble_task<C: Controller, P: PacketPool>(mut runner: Runner<'_, C, P>) {
    loop {
        if let Err(e) = runner.run().await {
            log::error!("[ble_task] error: {:?}", e);
        }
    }
}

/// Advertise, serve one client until it leaves, then advertise again.
pub async fn serve<'values, C: Controller>(
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    server: &Server<'values>,
    link: &LinkState,
    notify: &NotifySignal,
) {
    loop {
        let conn = match advertise(DEVICE_NAME, peripheral, server).await {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("[adv] error: {:?}", e);
                Timer::after(ADVERTISE_RETRY).await;
                continue;
            }
        };

        link.on_connect();
        // a value queued before this client arrived is not theirs
        notify.reset();

        select(
            connection_events(server, &conn, link),
            notify_task(server, &conn, notify),
        )
        .await;

        link.on_disconnect();
    }
}

/// Handle GATT traffic until the client disconnects.
async fn connection_events<P: PacketPool>(
    server: &Server<'_>,
    conn: &GattConnection<'_, '_, P>,
    link: &LinkState,
) {
    let command = server.environmental_sensing.command;
    let reason = loop {
        match conn.next().await {
            GattConnectionEvent::Disconnected { reason } => break reason,
            GattConnectionEvent::Gatt { event } => {
                if let GattEvent::Write(write) = &event {
                    if write.handle() == command.handle {
                        link.on_command(write.data());
                    }
                }
                match event.accept() {
                    Ok(reply) => reply.send().await,
                    Err(e) => log::warn!("[gatt] error sending response: {:?}", e),
                }
            }
            _ => {}
        }
    };
    log::info!("[gatt] disconnected: {:?}", reason);
}

/// Forward values published by the main loop as notifications.
async fn notify_task<P: PacketPool>(
    server: &Server<'_>,
    conn: &GattConnection<'_, '_, P>,
    notify: &NotifySignal,
) {
    let humidity = server.environmental_sensing.humidity;
    loop {
        let encoded = notify.wait().await;
        if let Err(e) = humidity.notify(conn, &encoded).await {
            log::warn!("[gatt] humidity notification failed: {:?}", e);
        }
    }
}

async fn advertise<'values, 'server, C: Controller>(
    name: &'values str,
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    server: &'server Server<'values>,
) -> Result<GattConnection<'values, 'server, DefaultPacketPool>, BleHostError<C::Error>> {
    let mut advertiser_data = [0; 31];
    let adv_len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ServiceUuids16(&[ENVIRONMENTAL_SENSING_UUID16]),
        ],
        &mut advertiser_data[..],
    )?;

    let mut scan_data = [0; 31];
    let scan_len = AdStructure::encode_slice(
        &[AdStructure::CompleteLocalName(name.as_bytes())],
        &mut scan_data[..],
    )?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &advertiser_data[..adv_len],
                scan_data: &scan_data[..scan_len],
            },
        )
        .await?;
    log::info!("[adv] advertising as '{}'", name);

    let conn = advertiser.accept().await?.with_attribute_server(server)?;
    log::info!("[adv] connection established");
    Ok(conn)
}
