use crate::{
    result::{sane_try, Result},
    utils::slice_from_c_array,
    Device,
};
use bstr::BStr;
use libsane_sys::*;
use std::{fmt::Debug, ptr::null_mut};

/// Initialized SANE library. `sane_exit` is called when the value is dropped,
/// so at most one `Backend` should be alive per process.
pub struct Backend {
    __private_field: (),
}

impl Backend {
    pub fn new() -> Result<Self> {
        log::trace!("Call sane_init(0x0, 0x0)");
        sane_try!(sane_init(null_mut(), None));

        Ok(Self {
            __private_field: (),
        })
    }

    pub fn get_all_devices(&self) -> Result<Vec<Device<'_>>> {
        let devices = self.get_devices()?;

        let devices = unsafe { slice_from_c_array(devices) }
            .iter()
            .map(|device| Device::new(self, device))
            .collect();

        Ok(devices)
    }

    pub fn find_device_by_name<N>(&self, name: N) -> Result<Option<Device<'_>>>
    where
        N: AsRef<[u8]>,
    {
        let devices = self.get_devices()?;

        let device = unsafe { slice_from_c_array(devices) }
            .iter()
            .map(|device| Device::new(self, device))
            .find(|device| device.name == BStr::new(&name));

        Ok(device)
    }

    fn get_devices(&self) -> Result<*const *const SANE_Device> {
        let mut device_list = null_mut();

        log::trace!("Call sane_get_devices({:p}, {})", &mut device_list, 0);
        sane_try!(sane_get_devices(&mut device_list, 0));

        Ok(device_list)
    }
}

impl Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish()
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        log::trace!("Call sane_exit()");
        unsafe { sane_exit() };
    }
}
