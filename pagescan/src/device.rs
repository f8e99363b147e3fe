use crate::error::{OptionError, ScanError};
use image::DynamicImage;
use std::fmt;

/// Process-wide scanner library. Dropping the value tears the library down.
pub trait DeviceSubsystem: Send + Sync + 'static {
    fn devices(&self) -> Result<Vec<DeviceInfo>, ScanError>;

    fn open(&self, name: &str) -> Result<Box<dyn ScanDevice + '_>, ScanError>;
}

/// Opened scanner. Closed on drop.
pub trait ScanDevice {
    fn name(&self) -> &str;

    fn set_option(&mut self, name: &str, value: &OptionSetting) -> Result<(), OptionError>;

    fn start(&mut self) -> Result<Box<dyn ScanSession + '_>, ScanError>;
}

/// One capture in progress.
///
/// `read` is called until it returns [`Read::EndOfData`], then the produced
/// pages are taken with `into_images`.
pub trait ScanSession {
    fn read(&mut self) -> Result<Read, ScanError>;

    /// Total size of the data, if the device knows it in advance.
    fn expected_bytes(&self) -> Option<usize>;

    fn into_images(self: Box<Self>) -> Vec<DynamicImage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    Data(usize),
    EndOfData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionSetting {
    Number(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub model: String,
    pub ty: String,
}

#[cfg(test)]
impl DeviceInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vendor: String::new(),
            model: String::new(),
            ty: String::new(),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{name}' (vendor '{vendor}', model '{model}', type '{ty}')",
            name = self.name,
            vendor = self.vendor,
            model = self.model,
            ty = self.ty,
        )
    }
}

impl fmt::Display for OptionSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSetting::Number(number) => write!(f, "{number}"),
            OptionSetting::Text(text) => write!(f, "'{text}'"),
        }
    }
}
