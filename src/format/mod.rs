//! Container formats
//!
//! Format descriptors shared by codecs and writers, and the AVI writer.

pub mod avi;
pub mod descriptor;

pub use descriptor::{DataClass, Encoding, FormatDescriptor, FormatKey, FormatValue, MimeType};
