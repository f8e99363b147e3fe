use crate::export::ExportFormat;
use std::{fmt::Display, path::Path};

pub const WINDOW_TITLE: &str = "🖨️ Scanner";

pub const SCAN_BUTTON: &str = "📄 Scan a document";

pub const EXPORT_BUTTON: &dyn Fn(ExportFormat) -> String = &|format| match format {
    ExportFormat::Png => "💾 Save as PNG".to_owned(),
    ExportFormat::Pdf => "📁 Save as PDF".to_owned(),
};

pub const OK_BUTTON: &str = "OK";

pub const CANCEL_BUTTON: &str = "Cancel";

pub const ERROR_TITLE: &str = "Error";

pub const SUCCESS_TITLE: &str = "Success";

pub const SAVED_TITLE: &str = "Saved";

pub const NO_SCAN_TITLE: &str = "No scan";

pub const NO_SCAN: &str = "You need to scan a document first.";

pub const SCAN_DONE: &str = "Scan finished!";

pub const IMAGE_SIZE: &dyn Fn(u32, u32) -> String =
    &|width, height| format!("{width}×{height} px");

pub const ALL_FILES: &str = "All files";

pub const CHOOSE_SCANNER_TITLE: &str = "Choose scanner";

pub const CHOOSE_SCANNER: &dyn Fn(&[String]) -> String = &|names| {
    format!(
        "Available scanners:\n{}\nEnter the exact name:",
        names.join(", ")
    )
};

pub const INIT_FAILED: &dyn Fn(&dyn Display) -> String =
    &|err| format!("Unable to initialize the scanner: {err}");

pub const SCAN_FAILED: &dyn Fn(&dyn Display) -> String =
    &|err| format!("Error while scanning: {err}");

pub const DISPLAY_FAILED: &dyn Fn(&dyn Display) -> String =
    &|err| format!("Unable to display the image: {err}");

pub const SAVE_FAILED: &dyn Fn(&dyn Display) -> String =
    &|err| format!("Error while saving: {err}");

pub const SAVED: &dyn Fn(ExportFormat, &Path) -> String = &|format, path| match format {
    ExportFormat::Png => format!("Image saved to:\n{}", path.display()),
    ExportFormat::Pdf => format!("PDF saved to:\n{}", path.display()),
};
