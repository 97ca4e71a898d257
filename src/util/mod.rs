//! Common utilities and data structures

pub mod fourcc;
pub mod rational;

pub use fourcc::{fourcc_from_str, stream_chunk_id};
pub use rational::Rational;

use std::fmt;

/// Media type of a track or format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Video stream
    Video,
    /// Audio stream
    Audio,
    /// Whole container file
    File,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Audio => write!(f, "audio"),
            MediaType::File => write!(f, "file"),
        }
    }
}
