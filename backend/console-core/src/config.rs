//! Controller configuration document.
//!
//! The console only ever replaces this document wholesale
//! (`SetConfig`) or asks the controller to reset it
//! (`DefaultConfig`); the meaning of every field belongs to the
//! controller. The sections are typed so the presentation layer can
//! bind a form to them, and every section carries `#[serde(default)]`
//! so documents from older or newer controller firmware still decode.

use serde::{Deserialize, Serialize};

/// Station identity and master server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    pub server: String,
    pub port: u16,
    pub call: String,
    pub auth: String,
    pub fallback: Vec<(String, u16)>,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 43434,
            call: String::new(),
            auth: String::new(),
            fallback: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PttMethod {
    Gpio,
    SerialDtr,
    SerialRts,
    HidRaw,
}

/// Radio keying (push-to-talk) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PttConfig {
    pub method: PttMethod,
    pub inverted: bool,
    pub gpio_pin: usize,
    pub serial_port: String,
    pub hidraw_device: String,
}

impl Default for PttConfig {
    fn default() -> Self {
        Self {
            method: PttMethod::Gpio,
            inverted: false,
            gpio_pin: 0,
            serial_port: String::from("/dev/ttyS0"),
            hidraw_device: String::from("/dev/hidraw0"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub device: String,
    pub level: u8,
    pub inverted: bool,
    pub tx_delay: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: String::from("default"),
            level: 127,
            inverted: false,
            tx_delay: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaspagerConfig {
    pub freq: u32,
    pub freq_corr: i16,
    pub pa_output_level: u8,
    pub mod_deviation: u16,
}

impl Default for RaspagerConfig {
    fn default() -> Self {
        Self {
            freq: 439_987_500,
            freq_corr: 0,
            pa_output_level: 63,
            mod_deviation: 13,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct C9000Config {
    pub baudrate: u32,
    pub dummy_enabled: bool,
    pub dummy_port: String,
    pub dummy_pa_output_level: u8,
}

impl Default for C9000Config {
    fn default() -> Self {
        Self {
            baudrate: 38400,
            dummy_enabled: false,
            dummy_port: String::from("/dev/ttyUSB0"),
            dummy_pa_output_level: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rfm69Config {
    pub port: String,
}

impl Default for Rfm69Config {
    fn default() -> Self {
        Self {
            port: String::from("/dev/ttyUSB0"),
        }
    }
}

/// Hardware backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Transmitter {
    #[default]
    Dummy,
    Audio,
    C9000,
    Raspager,
    RFM69,
}

/// The controller's configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub master: MasterConfig,
    pub transmitter: Transmitter,
    pub ptt: PttConfig,
    pub audio: AudioConfig,
    pub raspager: RaspagerConfig,
    pub c9000: C9000Config,
    pub rfm69: Rfm69Config,
}
