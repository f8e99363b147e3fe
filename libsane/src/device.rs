use crate::{utils::cstr2bstr, Backend};
use bstr::BStr;
use libsane_sys::*;
use std::marker::PhantomData;

/// Entry of the device list. Borrowed from the backend, so it is only valid
/// until the next `sane_get_devices` call.
#[derive(Debug, Clone, Copy)]
pub struct Device<'b> {
    pub name: &'b BStr,
    pub vendor: &'b BStr,
    pub model: &'b BStr,
    pub ty: &'b BStr,

    _backend: PhantomData<&'b Backend>,
}

impl<'b> Device<'b> {
    pub(crate) fn new(_backend: &'b Backend, device: &'b SANE_Device) -> Self {
        Self::from_raw(device)
    }

    /// Missing strings are reported as empty ones.
    fn from_raw(device: &'b SANE_Device) -> Self {
        let field = |ptr| unsafe { cstr2bstr(ptr) }.unwrap_or(BStr::new(""));

        Device {
            name: field(device.name),
            vendor: field(device.vendor),
            model: field(device.model),
            ty: field(device.type_),
            _backend: PhantomData,
        }
    }
}

impl std::fmt::Display for Device<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
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
