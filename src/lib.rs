//! avimux - AVI writing and pixel packing in Rust
//!
//! avimux multiplexes audio and video samples into AVI (RIFF) files and packs
//! in-memory raster images into the byte layouts AVI and related formats use.
//!
//! # Architecture
//!
//! - `format`: format descriptors and the AVI writer
//! - `codec`: codec trait, registry, frame buffers, images and pixel codecs
//! - `util`: rationals, FourCC helpers and media types
//!
//! # Example
//!
//! ```no_run
//! use avimux::codec::{CodecRegistry, Image};
//! use avimux::format::avi::{self, AviWriter};
//! use avimux::util::Rational;
//!
//! # fn main() -> avimux::Result<()> {
//! let registry = CodecRegistry::with_defaults();
//! let mut writer = AviWriter::create("out.avi", &registry)?;
//! let track = writer.add_track(
//!     avi::video_raw()
//!         .with_width(320)
//!         .with_height(240)
//!         .with_depth(24)
//!         .with_frame_rate(Rational::new(30, 1)),
//! )?;
//! let frame = Image::rgb(320, 240, vec![0x336699; 320 * 240])?;
//! writer.write_image(track, &frame, 1)?;
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod format;
pub mod util;

pub use error::{Error, Result};

/// avimux version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Configuration for the avimux library
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

/// Initialize the avimux library with the given configuration
///
/// Installs a `tracing` subscriber when logging is requested. Calling it
/// again, or after another subscriber was installed, is not an error.
pub fn init(config: Config) -> Result<()> {
    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        // Another subscriber may already be installed
        let _ = tracing_subscriber::fmt().with_env_filter(level).try_init();
    }

    Ok(())
}
