//! Controller side of the command channel: samples the operator's input,
//! picks drive commands and sends them to the hub one at a time, each only
//! after the hub said it is ready.

use std::time::Duration;

#[cfg(feature = "ble")]
pub mod ble;
pub mod controller;
#[cfg(feature = "gamepad")]
pub mod gamepad;
pub mod gate;
pub mod input;
pub mod keyboard;
pub mod link;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("protocol error: {0}")]
    Protocol(protocol::Error),

    #[error("bluetooth error: {0}")]
    Bluetooth(Box<dyn std::error::Error + Send + Sync>),

    #[error("no bluetooth adapter found")]
    NoAdapter,

    #[error("could not find hub with name: {0}")]
    HubNotFound(String),

    #[error("hub has no characteristic {0}")]
    CharacteristicMissing(String),

    #[error("hub did not get ready within {0:?}")]
    ReadyTimeout(Duration),

    #[error("input error: {0}")]
    Input(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl From<protocol::Error> for Error {
    fn from(e: protocol::Error) -> Self {
        Error::Protocol(e)
    }
}

#[cfg(feature = "ble")]
impl From<btleplug::Error> for Error {
    fn from(e: btleplug::Error) -> Self {
        Error::Bluetooth(Box::new(e))
    }
}
