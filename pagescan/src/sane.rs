use crate::{
    device::{DeviceInfo, DeviceSubsystem, OptionSetting, Read, ScanDevice, ScanSession},
    error::{OptionError, ScanError},
    frame,
};
use bstr::ByteSlice;
use image::DynamicImage;
use libsane::{Backend, OptionType, OptionValue, PageReader, Parameters, Scanner};
use std::{io, mem};

const WINDOW_SIZE: usize = 128 * 1024;

impl DeviceSubsystem for Backend {
    fn devices(&self) -> Result<Vec<DeviceInfo>, ScanError> {
        let devices = self.get_all_devices().map_err(ScanError::Enumerate)?;

        Ok(devices
            .iter()
            .map(|device| DeviceInfo {
                name: device.name.to_string(),
                vendor: device.vendor.to_string(),
                model: device.model.to_string(),
                ty: device.ty.to_string(),
            })
            .collect())
    }

    fn open(&self, name: &str) -> Result<Box<dyn ScanDevice + '_>, ScanError> {
        let device = self
            .find_device_by_name(name)
            .map_err(ScanError::Enumerate)?
            .ok_or_else(|| ScanError::DeviceGone(name.to_owned()))?;

        log::debug!("Open device {device}");

        let scanner = Scanner::new(device).map_err(|source| ScanError::Open {
            name: name.to_owned(),
            source,
        })?;

        Ok(Box::new(SaneDevice {
            name: name.to_owned(),
            scanner,
        }))
    }
}

struct SaneDevice<'b> {
    name: String,
    scanner: Scanner<'b>,
}

impl ScanDevice for SaneDevice<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_option(&mut self, name: &str, value: &OptionSetting) -> Result<(), OptionError> {
        let option = self
            .scanner
            .find_option(name)
            .ok_or(OptionError::NotFound)?;

        log::trace!("Found option {option:?}");

        if !option.is_active() {
            return Err(OptionError::Inactive);
        }

        match (value, option.ty) {
            (OptionSetting::Number(number), OptionType::Int) => {
                let number =
                    i32::try_from(*number).map_err(|_| OptionError::TypeMismatch(option.ty))?;
                option.set_value(OptionValue::Int(number))?;
            }
            (OptionSetting::Number(number), OptionType::Fixed) => {
                option.set_value(OptionValue::Fixed(f64::from(*number)))?;
            }
            (OptionSetting::Text(text), OptionType::String) => {
                option.set_value(OptionValue::String(text.as_bytes().as_bstr()))?;
            }
            (_, ty) => return Err(OptionError::TypeMismatch(ty)),
        }

        Ok(())
    }

    fn start(&mut self) -> Result<Box<dyn ScanSession + '_>, ScanError> {
        let mut reader = self.scanner.start().map_err(ScanError::Start)?;
        let parameters = reader.get_parameters().map_err(ScanError::Parameters)?;

        log::debug!("Start scan with parameters {parameters:?}");

        let frame = FrameBuffer::with_capacity(parameters.expected_bytes().unwrap_or(WINDOW_SIZE));

        Ok(Box::new(SaneSession {
            reader,
            parameters,
            frame,
            images: Vec::new(),
        }))
    }
}

struct SaneSession<'b, 'd> {
    reader: PageReader<'b, 'd>,
    parameters: Parameters,
    frame: FrameBuffer,
    images: Vec<DynamicImage>,
}

impl ScanSession for SaneSession<'_, '_> {
    fn read(&mut self) -> Result<Read, ScanError> {
        let read = self.frame.fill(&mut self.reader).map_err(ScanError::Read)?;

        if read == Read::EndOfData {
            if let Some(data) = self.frame.take() {
                log::debug!("End of data after {} bytes", data.len());
                self.images.push(frame::to_image(&self.parameters, data)?);
            }
        }

        Ok(read)
    }

    fn expected_bytes(&self) -> Option<usize> {
        self.parameters.expected_bytes()
    }

    fn into_images(self: Box<Self>) -> Vec<DynamicImage> {
        self.images
    }
}

/// Frame data collected through a fixed-size read window.
///
/// Once the reader reports end of data it is never called again.
struct FrameBuffer {
    data: Vec<u8>,
    finished: bool,
}

impl FrameBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            finished: false,
        }
    }

    fn fill<R: io::Read>(&mut self, reader: &mut R) -> io::Result<Read> {
        if self.finished {
            return Ok(Read::EndOfData);
        }

        let offset = self.data.len();
        self.data.resize(offset + WINDOW_SIZE, 0);

        let read = reader.read(&mut self.data[offset..]);
        match read {
            Ok(0) => {
                self.data.truncate(offset);
                self.finished = true;
                Ok(Read::EndOfData)
            }
            Ok(count) => {
                self.data.truncate(offset + count);
                Ok(Read::Data(count))
            }
            Err(err) => {
                self.data.truncate(offset);
                Err(err)
            }
        }
    }

    /// Complete frame, handed out once after end of data.
    fn take(&mut self) -> Option<Vec<u8>> {
        (self.finished && !self.data.is_empty()).then(|| mem::take(&mut self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::VecDeque, io::Cursor};

    /// Returns the scripted results one call at a time, then end of data.
    struct Script(VecDeque<io::Result<Vec<u8>>>);

    impl io::Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(err)) => Err(err),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn reads_through_window() {
        let page: Vec<u8> = (0..300_000).map(|i| i as u8).collect();
        let mut reader = Cursor::new(page.clone());
        let mut frame = FrameBuffer::with_capacity(0);

        let mut reads = Vec::new();
        loop {
            match frame.fill(&mut reader).unwrap() {
                Read::Data(count) => reads.push(count),
                Read::EndOfData => break,
            }
        }

        assert_eq!(reads, [WINDOW_SIZE, WINDOW_SIZE, 300_000 - 2 * WINDOW_SIZE]);
        assert_eq!(frame.take(), Some(page));
    }

    #[test]
    fn end_of_data_is_sticky() {
        let mut reader = Script(VecDeque::from([Ok(vec![1, 2, 3])]));
        let mut frame = FrameBuffer::with_capacity(0);

        assert_eq!(frame.fill(&mut reader).unwrap(), Read::Data(3));
        assert_eq!(frame.fill(&mut reader).unwrap(), Read::EndOfData);

        // Data pushed after the end must not be read.
        reader.0.push_back(Ok(vec![4]));
        assert_eq!(frame.fill(&mut reader).unwrap(), Read::EndOfData);
        assert_eq!(reader.0.len(), 1);

        assert_eq!(frame.take(), Some(vec![1, 2, 3]));
        assert_eq!(frame.take(), None);
    }

    #[test]
    fn failed_read_keeps_received_data() {
        let mut reader = Script(VecDeque::from([
            Ok(vec![1, 2]),
            Err(io::ErrorKind::BrokenPipe.into()),
            Ok(vec![3]),
        ]));
        let mut frame = FrameBuffer::with_capacity(0);

        assert_eq!(frame.fill(&mut reader).unwrap(), Read::Data(2));
        assert_eq!(
            frame.fill(&mut reader).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
        assert_eq!(frame.take(), None);

        assert_eq!(frame.fill(&mut reader).unwrap(), Read::Data(1));
        assert_eq!(frame.fill(&mut reader).unwrap(), Read::EndOfData);
        assert_eq!(frame.take(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn empty_frame_has_no_data() {
        let mut frame = FrameBuffer::with_capacity(0);

        assert_eq!(frame.fill(&mut Cursor::new(Vec::new())).unwrap(), Read::EndOfData);
        assert_eq!(frame.take(), None);
    }
}
