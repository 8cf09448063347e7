//! BME280 humidity over BLE.
//!
//! The modules without hardware dependencies (`humidity`, `sampling`,
//! `state`, `logic`) build on the host so `cargo test --lib` exercises them;
//! `hardware` and `ble` only exist for the ESP32-S3 target.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod humidity;
pub mod logic;
pub mod sampling;
pub mod state;
pub mod traits;

#[cfg(target_arch = "xtensa")]
pub mod ble;
#[cfg(target_arch = "xtensa")]
pub mod hardware;
