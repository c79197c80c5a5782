#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(
    clippy::needless_continue,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::struct_field_names
)]

pub mod convert;
pub mod instrumentation;
pub mod ir;
pub mod model;
pub mod naming;
pub mod notifications;
pub mod objects;
pub mod options;

pub use crate::convert::{ConversionInput, ConversionOutput, convert};
pub use crate::options::ConversionOptions;
