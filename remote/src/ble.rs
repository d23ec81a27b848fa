use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};
use uuid::Uuid;

use crate::gate::ReadyGate;
use crate::link::{handle_notification, CommandWriter, GatedLink};
use crate::Error;

pub const HUB_NAME: &str = "Pybricks Hub";

/// Command/event characteristic of the hub firmware.
pub const COMMAND_EVENT_CHAR: Uuid = Uuid::from_u128(0xc5f50002_8280_46da_89f4_6d8051e4aeef);

const SCAN_INTERVAL: Duration = Duration::from_millis(200);

/// A connected hub.
pub struct Hub {
    adapter: Adapter,
    peripheral: Peripheral,
    characteristic: Characteristic,
}

impl Hub {
    /// Scans for a hub advertising `name` and subscribes to its command
    /// characteristic.
    pub async fn connect(name: &str, uuid: Uuid, scan_timeout: Duration) -> Result<Self, Error> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoAdapter)?;

        info!("Scanning for {name}");
        adapter.start_scan(ScanFilter::default()).await?;
        let found = timeout(scan_timeout, find(&adapter, name)).await;
        adapter.stop_scan().await?;
        let peripheral = match found {
            Ok(peripheral) => peripheral?,
            Err(_) => return Err(Error::HubNotFound(name.into())),
        };

        peripheral.connect().await?;
        peripheral.discover_services().await?;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| Error::CharacteristicMissing(uuid.to_string()))?;
        peripheral.subscribe(&characteristic).await?;
        info!("Connected to {name}");

        Ok(Hub {
            adapter,
            peripheral,
            characteristic,
        })
    }

    /// The send path to the hub. Every write goes through `gate`.
    pub fn link(&self, gate: Arc<ReadyGate>) -> GatedLink<HubWriter> {
        let writer = HubWriter {
            peripheral: self.peripheral.clone(),
            characteristic: self.characteristic.clone(),
        };
        GatedLink::new(gate, writer)
    }

    /// Feeds notifications of the command characteristic into `gate` until
    /// the notification stream ends.
    pub async fn listen(&self, gate: &ReadyGate) -> Result<(), Error> {
        let mut notifications = self.peripheral.notifications().await?;
        while let Some(notification) = notifications.next().await {
            if notification.uuid == self.characteristic.uuid {
                handle_notification(gate, &notification.value);
            }
        }
        debug!("notification stream ended");
        Ok(())
    }

    /// Resolves once the hub drops the connection.
    pub async fn disconnected(&self) -> Result<(), Error> {
        let id = self.peripheral.id();
        let mut events = self.adapter.events().await?;
        while let Some(event) = events.next().await {
            if let CentralEvent::DeviceDisconnected(other) = event {
                if other == id {
                    break;
                }
            }
        }
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), Error> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }
}

async fn find(adapter: &Adapter, name: &str) -> Result<Peripheral, Error> {
    loop {
        for peripheral in adapter.peripherals().await? {
            let local_name = peripheral
                .properties()
                .await?
                .and_then(|properties| properties.local_name);
            if local_name.as_deref() == Some(name) {
                return Ok(peripheral);
            }
        }
        sleep(SCAN_INTERVAL).await;
    }
}

/// Writes to the command characteristic. Only exists inside the link
/// returned by [`Hub::link`], there is no ungated way to get one:
///
/// ```compile_fail
/// # async fn send(hub: &remote::ble::Hub) {
/// let mut writer = hub.writer();
/// # }
/// ```
///
/// ```compile_fail
/// # use remote::link::{CommandWriter, GatedLink};
/// # async fn send(link: &mut GatedLink<remote::ble::HubWriter>) {
/// link.writer.write(b"\x06fwd").await;
/// # }
/// ```
pub struct HubWriter {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

impl CommandWriter for HubWriter {
    async fn write(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.peripheral
            .write(&self.characteristic, payload, WriteType::WithResponse)
            .await?;
        Ok(())
    }
}
