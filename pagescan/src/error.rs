use libsane::{FrameFormat, OptionType, SaneError};
use std::{io, path::PathBuf};
use thiserror::Error;

/// Device subsystem could not be brought up. The program cannot continue.
#[derive(Debug, Error)]
#[error("failed to initialize scanner subsystem: {0}")]
pub struct InitError(#[from] pub SaneError);

/// Failure of a single scan attempt. Reported to the user, the window stays usable.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("listing devices: {0}")]
    Enumerate(SaneError),

    #[error("no scanner found")]
    NoDevice,

    #[error("device '{0}' is not available anymore")]
    DeviceGone(String),

    #[error("opening device '{name}': {source}")]
    Open { name: String, source: SaneError },

    #[error("starting scan: {0}")]
    Start(SaneError),

    #[error("getting scan parameters: {0}")]
    Parameters(SaneError),

    #[error("reading from scanner: {0}")]
    Read(io::Error),

    #[error("unsupported image format '{format:?}' with depth {depth}")]
    UnsupportedFrame { format: FrameFormat, depth: usize },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("scanner did not produce any image")]
    NoImage,

    #[error("starting scan thread: {0}")]
    Worker(io::Error),

    #[error("scan thread stopped unexpectedly")]
    WorkerLost,
}

/// A scan option could not be applied. The device default is used instead.
#[derive(Debug, Error)]
pub enum OptionError {
    #[error("option is not supported by the device")]
    NotFound,

    #[error("option is inactive")]
    Inactive,

    #[error("option has type {0:?}, which does not fit the value")]
    TypeMismatch(OptionType),

    #[error("{0}")]
    Rejected(#[from] SaneError),
}

/// Captured image could not be shown. It stays available for export.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("saving '{path}': {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("opening '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("decoding '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("encoding PNG: {0}")]
    Png(#[from] image::ImageError),

    #[error("building PDF: {0}")]
    Pdf(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
