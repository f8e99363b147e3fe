use crate::{
    config::Config,
    device::DeviceSubsystem,
    error::{InitError, ScanError},
    export::{self, ExportFormat},
    messages as msg, preview,
    scan::{self, ScanJob, ScanState, Waker},
};
use image::{DynamicImage, RgbaImage};
use libsane::SaneError;
use std::{fmt, path::PathBuf, sync::Arc};

/// Blocking notifications and prompts shown to the user.
pub trait Dialogs {
    fn info(&mut self, title: &str, text: &str);

    fn warning(&mut self, title: &str, text: &str);

    fn error(&mut self, title: &str, text: &str);

    /// `None` when the user cancelled the dialog.
    fn ask_save_path(&mut self, format: ExportFormat) -> Option<PathBuf>;
}

pub enum Phase {
    Ready,
    ChoosingDevice { names: Vec<String> },
    Scanning(ScanJob),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    Ready,
    LookingForScanner,
    Scanning(f64),
}

enum Selection {
    Device(String),
    Prompt(Vec<String>),
}

/// Window controller state: device subsystem, held image and current phase.
///
/// The subsystem is torn down when the orchestrator is dropped, after any
/// running capture has been stopped.
pub struct Orchestrator<S: DeviceSubsystem> {
    phase: Phase,
    image: Option<DynamicImage>,
    preview: Option<RgbaImage>,
    status: Status,
    config: Config,
    waker: Waker,
    subsystem: Arc<S>,
}

impl<S: DeviceSubsystem> Orchestrator<S> {
    pub fn initialize<F>(init: F, config: Config) -> Result<Self, InitError>
    where
        F: FnOnce() -> Result<S, SaneError>,
    {
        let subsystem = init()?;

        log::info!("Scanner subsystem initialized");

        Ok(Self {
            phase: Phase::Ready,
            image: None,
            preview: None,
            status: Status::Ready,
            config,
            waker: Arc::new(|| {}),
            subsystem: Arc::new(subsystem),
        })
    }

    /// Called by the capture thread after every state update.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = waker;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn can_scan(&self) -> bool {
        matches!(self.phase, Phase::Ready)
    }

    pub fn can_export(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.phase, Phase::Scanning(_))
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    /// Device names to offer when several scanners are attached.
    pub fn device_prompt(&self) -> Option<&[String]> {
        match &self.phase {
            Phase::ChoosingDevice { names } => Some(names),
            _ => None,
        }
    }

    /// Preview produced since the last call.
    pub fn take_preview(&mut self) -> Option<RgbaImage> {
        self.preview.take()
    }

    pub fn request_scan(&mut self, dialogs: &mut dyn Dialogs) {
        if !self.can_scan() {
            log::debug!("Scan requested while busy, ignore");
            return;
        }

        self.status = Status::LookingForScanner;

        match self.select_device() {
            Ok(Selection::Device(name)) => self.begin_capture(name, dialogs),
            Ok(Selection::Prompt(names)) => {
                log::debug!("{} scanners found, ask user to choose", names.len());
                self.phase = Phase::ChoosingDevice { names };
            }
            Err(err) => self.scan_failed(err, dialogs),
        }
    }

    /// Answer to the device prompt. `None` means the prompt was cancelled.
    pub fn choose_device(&mut self, typed: Option<&str>, dialogs: &mut dyn Dialogs) {
        let names = match &mut self.phase {
            Phase::ChoosingDevice { names } => std::mem::take(names),
            _ => {
                log::debug!("No device prompt is open, ignore answer");
                return;
            }
        };
        self.phase = Phase::Ready;

        let Some(typed) = typed else {
            log::debug!("Device choice cancelled");
            self.status = Status::Ready;
            return;
        };

        match resolve_device(&names, typed) {
            Some(name) => self.begin_capture(name.to_owned(), dialogs),
            None => self.scan_failed(ScanError::NoDevice, dialogs),
        }
    }

    fn select_device(&self) -> Result<Selection, ScanError> {
        let devices = self.subsystem.devices()?;

        for device in &devices {
            log::debug!("Found device {device}");
        }

        match devices.len() {
            0 => Err(ScanError::NoDevice),
            1 => Ok(Selection::Device(devices[0].name.clone())),
            _ => Ok(Selection::Prompt(
                devices.into_iter().map(|device| device.name).collect(),
            )),
        }
    }

    fn begin_capture(&mut self, name: String, dialogs: &mut dyn Dialogs) {
        log::info!("Start scan on '{name}'");

        let job = scan::start(
            Arc::clone(&self.subsystem),
            name,
            self.config.scan.clone(),
            Arc::clone(&self.waker),
        );

        match job {
            Ok(job) => {
                self.status = Status::Scanning(0.0);
                self.phase = Phase::Scanning(job);
            }
            Err(err) => self.scan_failed(err, dialogs),
        }
    }

    /// Applies updates from a running capture. Returns `true` when the capture
    /// has finished.
    pub fn poll(&mut self, dialogs: &mut dyn Dialogs) -> bool {
        let Phase::Scanning(job) = &mut self.phase else {
            return false;
        };

        while let Some(state) = job.try_next() {
            match state {
                ScanState::Prepare => self.status = Status::Scanning(0.0),
                ScanState::Progress(progress) => self.status = Status::Scanning(progress),
                ScanState::Done(image) => {
                    self.finish_job();
                    self.accept(image, dialogs);
                    return true;
                }
                ScanState::Error(err) => {
                    self.finish_job();
                    self.scan_failed(err, dialogs);
                    return true;
                }
                ScanState::Cancelled => {
                    self.finish_job();
                    self.status = Status::Ready;
                    return true;
                }
            }
        }

        false
    }

    fn finish_job(&mut self) {
        if let Phase::Scanning(job) = std::mem::replace(&mut self.phase, Phase::Ready) {
            job.join();
        }
    }

    fn accept(&mut self, image: DynamicImage, dialogs: &mut dyn Dialogs) {
        log::info!("Scanned page {}x{}", image.width(), image.height());

        match preview::render(&image, &self.config.preview) {
            Ok(preview) => self.preview = Some(preview),
            Err(err) => {
                log::error!("Failed to render preview: {err}");
                dialogs.error(msg::ERROR_TITLE, &msg::DISPLAY_FAILED(&err));
            }
        }

        self.image = Some(image);
        self.status = Status::Ready;

        dialogs.info(msg::SUCCESS_TITLE, msg::SCAN_DONE);
    }

    fn scan_failed(&mut self, err: ScanError, dialogs: &mut dyn Dialogs) {
        log::error!("Scan failed: {err}");

        self.status = Status::Ready;
        dialogs.error(msg::ERROR_TITLE, &msg::SCAN_FAILED(&err));
    }

    pub fn export(&mut self, format: ExportFormat, dialogs: &mut dyn Dialogs) {
        let Some(image) = &self.image else {
            dialogs.warning(msg::NO_SCAN_TITLE, msg::NO_SCAN);
            return;
        };

        let Some(path) = dialogs.ask_save_path(format) else {
            log::debug!("{format} export cancelled");
            return;
        };

        let path = export::with_default_extension(path, format);

        match export::write(image, &path, format, &self.config.export) {
            Ok(()) => {
                log::info!("Saved {format} to '{}'", path.display());
                dialogs.info(msg::SAVED_TITLE, &msg::SAVED(format, &path));
            }
            Err(err) => {
                log::error!("Failed to save {format} to '{}': {err}", path.display());
                dialogs.error(msg::ERROR_TITLE, &msg::SAVE_FAILED(&err));
            }
        }
    }

    /// Stops a running capture and waits for its thread.
    pub fn shutdown(&mut self) {
        if let Phase::Scanning(job) = std::mem::replace(&mut self.phase, Phase::Ready) {
            log::info!("Cancel scan on '{}'", job.device);
            job.cancel();
        }
    }
}

impl<S: DeviceSubsystem> Drop for Orchestrator<S> {
    fn drop(&mut self) {
        self.shutdown();
        log::debug!("Release scanner subsystem");
    }
}

/// Device whose name matches exactly, or the first one when none does.
/// `None` only when there are no devices at all.
pub fn resolve_device<'a>(names: &'a [String], typed: &str) -> Option<&'a str> {
    if let Some(name) = names.iter().find(|name| *name == typed) {
        return Some(name);
    }

    let first = names.first()?;
    log::warn!("No scanner named '{typed}', use '{first}'");

    Some(first)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => write!(f, "Ready"),
            Status::LookingForScanner => write!(f, "Looking for scanner..."),
            Status::Scanning(progress) => write!(f, "Scanning... {progress:.0}%"),
        }
    }
}
