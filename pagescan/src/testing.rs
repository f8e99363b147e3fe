//! In-memory scanner and dialog doubles for orchestrator tests.

use crate::{
    device::{DeviceInfo, DeviceSubsystem, OptionSetting, Read, ScanDevice, ScanSession},
    error::{OptionError, ScanError},
    export::ExportFormat,
    orchestrator::{Dialogs, Orchestrator},
};
use image::{DynamicImage, Rgb, RgbImage};
use libsane::SaneError;
use std::{
    collections::VecDeque,
    io,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

const CHUNK: usize = 1024;
const CHUNKS_PER_PAGE: usize = 3;

/// Small page whose pixels depend on `n`.
pub fn page(n: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| {
        Rgb([n.wrapping_mul(40), x as u8, y as u8])
    }))
}

pub fn wait_for_scan<S: DeviceSubsystem>(
    orchestrator: &mut Orchestrator<S>,
    dialogs: &mut RecordingDialogs,
) {
    let deadline = Instant::now() + Duration::from_secs(10);

    while orchestrator.is_scanning() {
        assert!(Instant::now() < deadline, "scan did not finish in time");

        orchestrator.poll(dialogs);
        thread::sleep(Duration::from_millis(1));
    }
}

pub fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);

    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

#[derive(Clone)]
pub struct FakeDevice {
    name: String,
    captures: VecDeque<Vec<DynamicImage>>,
    successful_captures: Option<usize>,
    reject_options: bool,
    endless: bool,
}

impl FakeDevice {
    /// Every capture consumes the next list of pages.
    pub fn new(name: &str, captures: Vec<Vec<DynamicImage>>) -> Self {
        Self {
            name: name.to_owned(),
            captures: captures.into(),
            successful_captures: None,
            reject_options: false,
            endless: false,
        }
    }

    /// Reads fail once `count` captures have succeeded.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.successful_captures = Some(count);
        self
    }

    pub fn rejecting_options(mut self) -> Self {
        self.reject_options = true;
        self
    }

    /// Sessions never reach end-of-data.
    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }
}

type Shared<T> = Arc<Mutex<T>>;

pub struct FakeSubsystem {
    devices: Shared<Vec<FakeDevice>>,
    opened: Shared<Vec<String>>,
    options: Shared<Vec<(String, OptionSetting)>>,
    teardowns: Arc<AtomicUsize>,
    fail_enumeration: bool,
}

impl FakeSubsystem {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices: Arc::new(Mutex::new(devices)),
            opened: Default::default(),
            options: Default::default(),
            teardowns: Default::default(),
            fail_enumeration: false,
        }
    }

    pub fn failing_enumeration() -> Self {
        let mut subsystem = Self::new(vec![]);
        subsystem.fail_enumeration = true;
        subsystem
    }

    pub fn with_teardowns(mut self, teardowns: Arc<AtomicUsize>) -> Self {
        self.teardowns = teardowns;
        self
    }

    pub fn devices_handle(&self) -> Shared<Vec<FakeDevice>> {
        Arc::clone(&self.devices)
    }

    /// Names of the devices opened so far.
    pub fn opened_handle(&self) -> Shared<Vec<String>> {
        Arc::clone(&self.opened)
    }

    /// Options accepted by the devices so far.
    pub fn options_handle(&self) -> Shared<Vec<(String, OptionSetting)>> {
        Arc::clone(&self.options)
    }

    pub fn teardowns_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.teardowns)
    }
}

impl Drop for FakeSubsystem {
    fn drop(&mut self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

impl DeviceSubsystem for FakeSubsystem {
    fn devices(&self) -> Result<Vec<DeviceInfo>, ScanError> {
        if self.fail_enumeration {
            return Err(ScanError::Enumerate(SaneError::IO));
        }

        let devices = self.devices.lock().unwrap();
        Ok(devices
            .iter()
            .map(|device| DeviceInfo::named(device.name.clone()))
            .collect())
    }

    fn open(&self, name: &str) -> Result<Box<dyn ScanDevice + '_>, ScanError> {
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .iter_mut()
            .find(|device| device.name == name)
            .ok_or_else(|| ScanError::DeviceGone(name.to_owned()))?;

        self.opened.lock().unwrap().push(name.to_owned());

        let plan = if device.endless {
            SessionPlan::Endless
        } else if device.successful_captures == Some(0) {
            SessionPlan::FailingRead
        } else {
            if let Some(count) = device.successful_captures.as_mut() {
                *count -= 1;
            }
            SessionPlan::Pages(device.captures.pop_front().unwrap_or_default())
        };

        Ok(Box::new(FakeScanner {
            name: name.to_owned(),
            reject_options: device.reject_options,
            options: Arc::clone(&self.options),
            plan: Some(plan),
        }))
    }
}

enum SessionPlan {
    Pages(Vec<DynamicImage>),
    FailingRead,
    Endless,
}

struct FakeScanner {
    name: String,
    reject_options: bool,
    options: Shared<Vec<(String, OptionSetting)>>,
    plan: Option<SessionPlan>,
}

impl ScanDevice for FakeScanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_option(&mut self, name: &str, value: &OptionSetting) -> Result<(), OptionError> {
        if self.reject_options {
            return Err(OptionError::NotFound);
        }

        self.options
            .lock()
            .unwrap()
            .push((name.to_owned(), value.clone()));

        Ok(())
    }

    fn start(&mut self) -> Result<Box<dyn ScanSession + '_>, ScanError> {
        let plan = self.plan.take().ok_or(ScanError::Start(SaneError::DeviceBusy))?;

        Ok(Box::new(FakeSession {
            plan,
            chunks_left: CHUNKS_PER_PAGE,
        }))
    }
}

struct FakeSession {
    plan: SessionPlan,
    chunks_left: usize,
}

impl ScanSession for FakeSession {
    fn read(&mut self) -> Result<Read, ScanError> {
        match self.plan {
            SessionPlan::FailingRead => Err(ScanError::Read(io::ErrorKind::BrokenPipe.into())),
            SessionPlan::Endless => {
                thread::sleep(Duration::from_millis(1));
                Ok(Read::Data(CHUNK))
            }
            SessionPlan::Pages(_) if self.chunks_left == 0 => Ok(Read::EndOfData),
            SessionPlan::Pages(_) => {
                self.chunks_left -= 1;
                Ok(Read::Data(CHUNK))
            }
        }
    }

    fn expected_bytes(&self) -> Option<usize> {
        match self.plan {
            SessionPlan::Pages(_) => Some(CHUNK * CHUNKS_PER_PAGE),
            _ => None,
        }
    }

    fn into_images(self: Box<Self>) -> Vec<DynamicImage> {
        match self.plan {
            SessionPlan::Pages(pages) => pages,
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

#[derive(Default)]
pub struct RecordingDialogs {
    pub shown: Vec<(DialogKind, String, String)>,
    pub save_prompts: Vec<ExportFormat>,
    save_path: Option<PathBuf>,
}

impl RecordingDialogs {
    /// Answers every save prompt with `path`.
    pub fn with_save_path(path: PathBuf) -> Self {
        Self {
            save_path: Some(path),
            ..Default::default()
        }
    }

    pub fn kinds(&self) -> Vec<DialogKind> {
        self.shown.iter().map(|(kind, _, _)| *kind).collect()
    }

    pub fn last_text(&self) -> &str {
        self.shown.last().map(|(_, _, text)| text.as_str()).unwrap_or("")
    }
}

impl Dialogs for RecordingDialogs {
    fn info(&mut self, title: &str, text: &str) {
        self.shown.push((DialogKind::Info, title.to_owned(), text.to_owned()));
    }

    fn warning(&mut self, title: &str, text: &str) {
        self.shown
            .push((DialogKind::Warning, title.to_owned(), text.to_owned()));
    }

    fn error(&mut self, title: &str, text: &str) {
        self.shown.push((DialogKind::Error, title.to_owned(), text.to_owned()));
    }

    fn ask_save_path(&mut self, format: ExportFormat) -> Option<PathBuf> {
        self.save_prompts.push(format);
        self.save_path.clone()
    }
}
