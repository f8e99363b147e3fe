#![allow(non_upper_case_globals)]

mod backend;
mod device;
mod options;
mod parameters;
mod result;
mod scanner;
mod utils;

pub use backend::Backend;
pub use device::Device;
pub use options::{
    Capatibilities as OptionCapatibilities, Constraint as OptionConstraint, ScannerOption,
    ScannerOptions, Type as OptionType, Unit as OptionUnit, Value as OptionValue,
};
pub use parameters::{FrameFormat, Parameters};
pub use result::SaneError;
pub use scanner::{PageReader, Scanner};
