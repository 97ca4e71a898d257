//! AVI (Audio Video Interleave) container writing
//!
//! [`AviWriter`] drives codecs and palette tracking on top of a
//! [`ChunkWriter`], which owns the RIFF structure. [`AviOutputStream`] is the
//! RIFF implementation for seekable outputs.

pub mod stream;
pub mod track;
pub mod writer;

pub use stream::AviOutputStream;
pub use track::{Track, TrackKind};
pub use writer::AviWriter;

use super::descriptor::{DataClass, Encoding, FormatDescriptor, MimeType};
use crate::codec::Palette;
use crate::error::Result;
use crate::util::MediaType;

/// avih flag: the file has an idx1 index
pub const AVIF_HASINDEX: u32 = 0x10;
/// idx1 flag: the chunk is a key frame
pub const AVIIF_KEYFRAME: u32 = 0x10;
/// idx1 flag: the chunk does not advance time (palette changes)
pub const AVIIF_NO_TIME: u32 = 0x100;
/// Largest size a RIFF stream can address
pub const MAX_STREAM_SIZE: u64 = u32::MAX as u64;

/// WAVE_FORMAT_PCM
pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// Video stream parameters handed to [`ChunkWriter::add_video_track`]
#[derive(Debug, Clone, PartialEq)]
pub struct VideoTrackParams {
    pub encoding: Encoding,
    /// Frame rate denominator (strh scale)
    pub time_scale: u32,
    /// Frame rate numerator (strh rate)
    pub rate: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Integer frames per second, used for the avih max bytes per second
    pub fps: u32,
}

/// Audio stream parameters handed to [`ChunkWriter::add_audio_track`]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrackParams {
    /// WAVEFORMATEX format tag
    pub format_tag: u16,
    pub time_scale: u32,
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_size_in_bits: u16,
    /// Compressed streams get a zero strh sample size
    pub compressed: bool,
    pub frame_duration: u32,
    /// Bytes per sample frame (block align)
    pub frame_size: u32,
}

/// Low-level container I/O used by [`AviWriter`]
///
/// Implementations own the RIFF lists, the sample index and the stream
/// position. Tracks are identified by the index `add_*_track` returns.
pub trait ChunkWriter {
    /// Declare a video stream. Only valid before the container has started.
    fn add_video_track(&mut self, params: VideoTrackParams) -> Result<usize>;

    /// Declare an audio stream. Only valid before the container has started.
    fn add_audio_track(&mut self, params: AudioTrackParams) -> Result<usize>;

    /// Replace the palette stored in the stream format of a video track
    fn set_palette(&mut self, track: usize, palette: &Palette) -> Result<()>;

    /// Write the headers if that has not happened yet
    fn ensure_started(&mut self) -> Result<()>;

    fn write_sample(&mut self, track: usize, data: &[u8], keyframe: bool) -> Result<()> {
        self.write_samples(track, 1, data, keyframe)
    }

    /// Write one chunk holding `count` samples
    fn write_samples(&mut self, track: usize, count: u32, data: &[u8], keyframe: bool) -> Result<()>;

    /// Write a palette change chunk for a video track
    fn write_palette(&mut self, track: usize, data: &[u8], keyframe: bool) -> Result<()>;

    /// Duration of a track in units of its time scale
    fn media_duration(&self, track: usize) -> u64;

    /// Bytes written since the start of the container
    fn relative_stream_position(&mut self) -> Result<u64>;

    /// Write the index and patch the headers. Further writes fail.
    fn finish(&mut self) -> Result<()>;
}

/// Format tag for an audio encoding; anything unknown is PCM
pub fn audio_format_tag(encoding: Option<&Encoding>) -> u16 {
    match encoding {
        Some(Encoding::Alaw) => 0x0006,
        Some(Encoding::Ulaw) => 0x0007,
        Some(Encoding::Mp3) => 0x0055,
        _ => WAVE_FORMAT_PCM,
    }
}

/// Format of the AVI file itself
pub fn file_format() -> FormatDescriptor {
    FormatDescriptor::new()
        .with_media_type(MediaType::File)
        .with_mime_type(MimeType::Avi)
}

fn avi_video(encoding: Encoding) -> FormatDescriptor {
    FormatDescriptor::new()
        .with_media_type(MediaType::Video)
        .with_mime_type(MimeType::Avi)
        .with_encoding(encoding)
}

/// Uncompressed DIB video
pub fn video_raw() -> FormatDescriptor {
    avi_video(Encoding::AviDib).with_compressor_name("None")
}

/// Motion JPEG video
pub fn video_jpeg() -> FormatDescriptor {
    avi_video(Encoding::AviMjpg)
        .with_compressor_name("Motion JPEG")
        .with_data_class(DataClass::Bytes)
}

/// PNG video
pub fn video_png() -> FormatDescriptor {
    avi_video(Encoding::AviPng)
        .with_compressor_name("PNG")
        .with_data_class(DataClass::Bytes)
}

/// Run length encoded video
pub fn video_rle() -> FormatDescriptor {
    avi_video(Encoding::AviRle).with_compressor_name("Run Length")
}

/// TechSmith screen capture video
pub fn video_screen_capture() -> FormatDescriptor {
    avi_video(Encoding::AviTechsmithScreenCapture).with_compressor_name("Techsmith Screen Capture")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_tag() {
        assert_eq!(audio_format_tag(None), WAVE_FORMAT_PCM);
        assert_eq!(audio_format_tag(Some(&Encoding::PcmSigned)), WAVE_FORMAT_PCM);
        assert_eq!(audio_format_tag(Some(&Encoding::Mp3)), 0x0055);
        assert_eq!(audio_format_tag(Some(&Encoding::Other("xyz".into()))), WAVE_FORMAT_PCM);
    }

    #[test]
    fn test_well_known_formats() {
        assert_eq!(file_format().mime_type(), Some(MimeType::Avi));
        assert_eq!(video_raw().encoding(), Some(&Encoding::AviDib));
        assert_eq!(video_jpeg().encoding(), Some(&Encoding::AviMjpg));
        assert!(video_png().matches(&FormatDescriptor::new().with_encoding(Encoding::AviPng)));
        assert!(!video_rle().matches(&video_raw()));
    }
}
