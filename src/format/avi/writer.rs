//! AVI writer
//!
//! Validates track formats, binds codecs, tracks key frame cadence and
//! palette changes, and hands finished samples to a [`ChunkWriter`].

use super::stream::AviOutputStream;
use super::track::{CodecSlot, Track, TrackKind};
use super::{audio_format_tag, file_format, AudioTrackParams, ChunkWriter, VideoTrackParams};
use super::{MAX_STREAM_SIZE, WAVE_FORMAT_PCM};
use crate::codec::{Codec, CodecRegistry, CodecStatus, FrameBuffer, Image, Palette};
use crate::error::{Error, Result};
use crate::format::{DataClass, Encoding, FormatDescriptor, FormatKey, MimeType};
use crate::util::{MediaType, Rational};
use std::borrow::Cow;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, warn};

/// Default audio sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Default audio channel count
pub const DEFAULT_CHANNELS: u16 = 1;
/// Default audio sample size
pub const DEFAULT_SAMPLE_SIZE_IN_BITS: u16 = 16;

const VIDEO_DEPTHS: [u32; 5] = [4, 8, 16, 24, 32];

/// Writes audio and video tracks into an AVI container
///
/// Codecs are looked up in the borrowed registry the first time a track
/// needs one. All calls for a track must come from one thread.
pub struct AviWriter<'r, C: ChunkWriter> {
    chunks: C,
    registry: &'r CodecRegistry,
    tracks: Vec<Track>,
}

impl<'r> AviWriter<'r, AviOutputStream<BufWriter<File>>> {
    /// Create an AVI file at `path`
    pub fn create<P: AsRef<Path>>(path: P, registry: &'r CodecRegistry) -> Result<Self> {
        Ok(Self::new(AviOutputStream::create(path)?, registry))
    }
}

impl<'r, C: ChunkWriter> AviWriter<'r, C> {
    pub fn new(chunks: C, registry: &'r CodecRegistry) -> Self {
        AviWriter {
            chunks,
            registry,
            tracks: Vec::new(),
        }
    }

    /// Format of the container
    pub fn file_format(&self) -> FormatDescriptor {
        file_format()
    }

    /// AVI streams have a fixed frame rate
    pub fn is_vfr_supported(&self) -> bool {
        false
    }

    /// Add a track and return its index.
    ///
    /// Video formats need an encoding, frame rate, width, height and depth.
    /// Everything else is treated as audio, with PCM defaults for missing keys.
    pub fn add_track(&mut self, format: FormatDescriptor) -> Result<usize> {
        match format.media_type() {
            Some(MediaType::Video) => self.add_video_track(format),
            _ => self.add_audio_track(format),
        }
    }

    fn add_video_track(&mut self, format: FormatDescriptor) -> Result<usize> {
        for key in [
            FormatKey::Encoding,
            FormatKey::FrameRate,
            FormatKey::Width,
            FormatKey::Height,
            FormatKey::Depth,
        ] {
            if !format.contains_key(key) {
                return Err(Error::config(format!("Video format is missing {}", key.name())));
            }
        }
        let (Some(encoding), Some(frame_rate), Some(width), Some(height), Some(depth)) = (
            format.encoding().cloned(),
            format.frame_rate(),
            format.width(),
            format.height(),
            format.depth(),
        ) else {
            return Err(Error::config("Incomplete video format"));
        };
        let Some((scale, rate)) = frame_rate.to_scale_and_rate() else {
            return Err(Error::config(format!("Invalid frame rate {}", frame_rate)));
        };
        if width == 0 || height == 0 {
            return Err(Error::config(format!("Invalid frame size {}x{}", width, height)));
        }
        if !VIDEO_DEPTHS.contains(&depth) {
            return Err(Error::config(format!("Unsupported depth {}", depth)));
        }

        let index = self.chunks.add_video_track(VideoTrackParams {
            encoding,
            time_scale: scale,
            rate,
            width,
            height,
            depth,
            fps: frame_rate.floor() as u32,
        })?;
        debug!("Added video track {}: {}", index, format);
        self.tracks.push(Track::video(format, depth, scale, rate));
        Ok(index)
    }

    fn add_audio_track(&mut self, format: FormatDescriptor) -> Result<usize> {
        let format_tag = audio_format_tag(format.encoding());
        let sample_rate = format.sample_rate().unwrap_or(DEFAULT_SAMPLE_RATE);
        let channels = format.channels().unwrap_or(DEFAULT_CHANNELS);
        let sample_size_in_bits = format.sample_size_in_bits().unwrap_or(DEFAULT_SAMPLE_SIZE_IN_BITS);
        let frame_size = format
            .frame_size()
            .unwrap_or((sample_size_in_bits as u32).div_ceil(8) * channels as u32);

        let index = self.chunks.add_audio_track(AudioTrackParams {
            format_tag,
            time_scale: 1,
            sample_rate,
            channels,
            sample_size_in_bits,
            compressed: format_tag != WAVE_FORMAT_PCM,
            frame_duration: 1,
            frame_size,
        })?;
        debug!("Added audio track {}: {}", index, format);
        self.tracks.push(Track::audio(format, sample_rate));
        Ok(index)
    }

    fn track(&self, track: usize) -> Result<&Track> {
        self.tracks
            .get(track)
            .ok_or_else(|| Error::invalid_input(format!("Invalid track index {}", track)))
    }

    fn track_mut(&mut self, track: usize) -> Result<&mut Track> {
        self.tracks
            .get_mut(track)
            .ok_or_else(|| Error::invalid_input(format!("Invalid track index {}", track)))
    }

    /// Configured format of a track
    pub fn format(&self, track: usize) -> Result<&FormatDescriptor> {
        Ok(&self.track(track)?.format)
    }

    /// Duration of a track in seconds
    pub fn duration(&self, track: usize) -> Result<Rational> {
        let t = self.track(track)?;
        let ticks = self.chunks.media_duration(track);
        Ok(Rational::from_ticks(ticks, t.scale, t.rate))
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// The underlying chunk writer
    pub fn chunk_writer(&self) -> &C {
        &self.chunks
    }

    /// Number of samples written to a track
    pub fn sample_count(&self, track: usize) -> Result<u64> {
        Ok(self.track(track)?.sample_count)
    }

    /// Codec bound to a track, if any
    pub fn codec(&self, track: usize) -> Result<Option<&dyn Codec>> {
        Ok(self.track(track)?.codec.get())
    }

    /// Bind a codec to a track and negotiate its formats
    pub fn set_codec(&mut self, track: usize, codec: Box<dyn Codec>) -> Result<()> {
        let t = self.track_mut(track)?;
        let codec = negotiate(t, codec)?;
        debug!("Track {} uses {}", track, codec.name());
        t.codec = CodecSlot::Bound(codec);
        Ok(())
    }

    /// Force a key frame every `interval` samples; 0 disables forced key frames
    pub fn set_sync_interval(&mut self, track: usize, interval: u32) -> Result<()> {
        self.track_mut(track)?.sync_interval = interval;
        Ok(())
    }

    pub fn sync_interval(&self, track: usize) -> Result<u32> {
        Ok(self.track(track)?.sync_interval)
    }

    /// Set the palette stored in the stream format of an indexed video track.
    ///
    /// Only possible before the first sample is written.
    pub fn set_palette(&mut self, track: usize, palette: Palette) -> Result<()> {
        self.track(track)?;
        self.chunks.set_palette(track, &palette)?;
        if let TrackKind::Video { palette: p, .. } = &mut self.tracks[track].kind {
            *p = Some(palette);
        }
        Ok(())
    }

    /// Encode and write one image.
    ///
    /// The image must have the dimensions of the track. AVI streams have a
    /// fixed frame rate, so `duration` only has to be positive.
    pub fn write_image(&mut self, track: usize, image: &Image, duration: u64) -> Result<()> {
        if duration == 0 {
            return Err(Error::invalid_input("Duration must be positive"));
        }
        self.track(track)?;
        self.chunks.ensure_started()?;
        self.bind_codec(track)?;

        let t = &mut self.tracks[track];
        check_dimensions(track, t, image)?;

        let mut input = FrameBuffer::from_image(image.clone());
        input.flags.keyframe = t.is_sync_sample();
        input.format = Some(raw_image_format(&t.format));

        let Track { codec, output, .. } = t;
        let CodecSlot::Bound(codec) = codec else {
            return Err(Error::unsupported(format!("No codec for track {}", track)));
        };
        let status = codec.process(&input, output);
        if output.flags.discard {
            if status == CodecStatus::Failed {
                warn!("{} failed on track {}; frame dropped", codec.name(), track);
            }
            return Ok(());
        }
        let keyframe = output.flags.keyframe;

        let palette_changed = match image.palette() {
            Some(palette) => self.emit_palette_change(track, palette, keyframe)?,
            None => false,
        };

        let t = &mut self.tracks[track];
        let data = t
            .output
            .bytes()
            .ok_or_else(|| Error::codec(format!("Codec produced no bytes for track {}", track)))?;
        self.chunks.write_sample(track, data, keyframe && !palette_changed)?;
        t.sample_count += 1;
        self.check_stream_size()
    }

    /// Write a buffer, encoding it first unless it already has the track format.
    ///
    /// Byte payloads whose format matches the track (frame rate aside) are
    /// written as they are, honoring their sample count. Everything else goes
    /// through the track codec, which must complete in a single step.
    pub fn write(&mut self, track: usize, buffer: &FrameBuffer) -> Result<()> {
        self.track(track)?;
        self.chunks.ensure_started()?;
        if buffer.flags.discard {
            return Ok(());
        }

        let t = &self.tracks[track];
        let mut keyframe = buffer.flags.keyframe;
        if let Some(image) = buffer.image() {
            check_dimensions(track, t, image)?;
            keyframe |= t.is_sync_sample();
        }

        let palette = match (&t.kind, buffer.image()) {
            (TrackKind::Video { .. }, Some(image)) => image.palette(),
            (TrackKind::Video { .. }, None) => buffer.header.as_ref(),
            (TrackKind::Audio, _) => None,
        };
        let fast_path = buffer.bytes().filter(|_| {
            buffer
                .format
                .as_ref()
                .is_some_and(|f| f.remove(&[FormatKey::FrameRate]).matches(&t.format))
        });
        let palette_changed = match palette {
            Some(palette) => self.emit_palette_change(track, palette, keyframe)?,
            None => false,
        };

        if let Some(data) = fast_path {
            self.chunks.write_samples(
                track,
                buffer.sample_count,
                data,
                buffer.flags.keyframe && !palette_changed,
            )?;
            self.tracks[track].sample_count += buffer.sample_count as u64;
            return self.check_stream_size();
        }

        self.bind_codec(track)?;
        let t = &mut self.tracks[track];
        let input = if keyframe != buffer.flags.keyframe {
            let mut flagged = buffer.clone();
            flagged.flags.keyframe = keyframe;
            Cow::Owned(flagged)
        } else {
            Cow::Borrowed(buffer)
        };

        let Track {
            codec,
            output,
            sample_count,
            ..
        } = t;
        let CodecSlot::Bound(codec) = codec else {
            return Err(Error::unsupported(format!("No codec for track {}", track)));
        };
        if codec.process(&input, output) != CodecStatus::Ok {
            return Err(Error::codec(format!(
                "{} did not encode {} in a single step",
                codec.name(),
                input
            )));
        }
        if output.flags.discard {
            return Ok(());
        }
        let data = output
            .bytes()
            .ok_or_else(|| Error::codec(format!("Codec produced no bytes for track {}", track)))?;
        self.chunks.write_samples(
            track,
            output.sample_count,
            data,
            keyframe && !palette_changed,
        )?;
        *sample_count += output.sample_count as u64;
        self.check_stream_size()
    }

    /// Write the index and patch the headers
    pub fn finish(&mut self) -> Result<()> {
        debug!("Finishing AVI with {} tracks", self.tracks.len());
        self.chunks.finish()
    }

    /// Finish the container and return the chunk writer
    pub fn into_inner(mut self) -> Result<C> {
        self.finish()?;
        Ok(self.chunks)
    }

    /// Look up and negotiate a codec for the track unless one was tried before
    fn bind_codec(&mut self, track: usize) -> Result<()> {
        let t = &mut self.tracks[track];
        match t.codec {
            CodecSlot::Bound(_) => return Ok(()),
            CodecSlot::Failed => {
                return Err(Error::unsupported(format!("No codec for format {}", t.format)));
            }
            CodecSlot::Unset => {}
        }

        let desired = FormatDescriptor::new()
            .with_mime_type(MimeType::Avi)
            .append(&t.format);
        let Some(codec) = self.registry.lookup_encoders(&desired).into_iter().next() else {
            t.codec = CodecSlot::Failed;
            return Err(Error::unsupported(format!("No codec for format {}", t.format)));
        };
        match negotiate(t, codec) {
            Ok(codec) => {
                debug!("Track {} uses {}", track, codec.name());
                t.codec = CodecSlot::Bound(codec);
                Ok(())
            }
            Err(e) => {
                t.codec = CodecSlot::Failed;
                Err(e)
            }
        }
    }

    fn emit_palette_change(&mut self, track: usize, palette: &Palette, keyframe: bool) -> Result<bool> {
        match self.tracks[track].palette_change(palette, keyframe) {
            Some(record) => {
                debug!("Palette change on track {} ({} bytes)", track, record.len());
                self.chunks.write_palette(track, &record, keyframe)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn check_stream_size(&mut self) -> Result<()> {
        let size = self.chunks.relative_stream_position()?;
        if size > MAX_STREAM_SIZE {
            return Err(Error::SizeLimit {
                size,
                limit: MAX_STREAM_SIZE,
            });
        }
        Ok(())
    }
}

/// Fix the input and output formats of a codec for a track
fn negotiate(track: &Track, mut codec: Box<dyn Codec>) -> Result<Box<dyn Codec>> {
    let output = match track.kind {
        TrackKind::Video { .. } => {
            codec.set_input_format(Some(raw_image_format(&track.format)));
            FormatDescriptor::new()
                .with_fixed_frame_rate(true)
                .append(&track.format)
        }
        TrackKind::Audio => {
            codec.set_input_format(None);
            track.format.clone()
        }
    };
    if codec.set_output_format(output).is_none() {
        return Err(Error::unsupported(format!(
            "{} cannot produce {}",
            codec.name(),
            track.format
        )));
    }
    Ok(codec)
}

/// Format of decoded images fed to the codec of a video track
fn raw_image_format(track_format: &FormatDescriptor) -> FormatDescriptor {
    FormatDescriptor::new()
        .with_mime_type(MimeType::Native)
        .with_encoding(Encoding::RawImage)
        .with_data_class(DataClass::Image)
        .append(track_format)
}

/// Images must match the track dimensions exactly
fn check_dimensions(index: usize, track: &Track, image: &Image) -> Result<()> {
    let (width, height) = (track.format.width(), track.format.height());
    if width != Some(image.width() as u32) || height != Some(image.height() as u32) {
        return Err(Error::config(format!(
            "Image is {}x{}, track {} is {}x{}",
            image.width(),
            image.height(),
            index,
            width.unwrap_or(0),
            height.unwrap_or(0)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::avi::video_raw;
    use std::io::Cursor;

    fn dib_format(depth: u32) -> FormatDescriptor {
        video_raw()
            .with_width(2)
            .with_height(2)
            .with_depth(depth)
            .with_frame_rate(Rational::new(15, 1))
    }

    #[test]
    fn test_missing_depth_is_named() {
        let registry = CodecRegistry::with_defaults();
        let mut writer = AviWriter::new(AviOutputStream::new(Cursor::new(Vec::new())), &registry);
        let format = video_raw()
            .with_width(2)
            .with_height(2)
            .with_frame_rate(Rational::new(15, 1));
        match writer.add_track(format) {
            Err(Error::Config(msg)) => assert!(msg.contains("Depth"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(writer.track_count(), 0);
    }

    #[test]
    fn test_audio_defaults() {
        let registry = CodecRegistry::new();
        let mut writer = AviWriter::new(AviOutputStream::new(Cursor::new(Vec::new())), &registry);
        let index = writer
            .add_track(FormatDescriptor::new().with_media_type(MediaType::Audio))
            .unwrap();
        assert_eq!(writer.sync_interval(index).unwrap(), 1);
        assert_eq!(writer.tracks[index].rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_video_defaults() {
        let registry = CodecRegistry::with_defaults();
        let mut writer = AviWriter::new(AviOutputStream::new(Cursor::new(Vec::new())), &registry);
        let index = writer.add_track(dib_format(24)).unwrap();
        assert_eq!(writer.sync_interval(index).unwrap(), 30);
        assert!(writer.codec(index).unwrap().is_none());
        assert!(!writer.is_vfr_supported());
        assert_eq!(writer.file_format().mime_type(), Some(MimeType::Avi));
    }

    #[test]
    fn test_codec_bound_on_first_write() {
        let registry = CodecRegistry::with_defaults();
        let mut writer = AviWriter::new(AviOutputStream::new(Cursor::new(Vec::new())), &registry);
        let index = writer.add_track(dib_format(24)).unwrap();
        let image = Image::rgb(2, 2, vec![0; 4]).unwrap();
        writer.write_image(index, &image, 1).unwrap();
        assert_eq!(writer.codec(index).unwrap().map(|c| c.name()), Some("DIB Codec"));
        assert_eq!(writer.sample_count(index).unwrap(), 1);
        assert_eq!(writer.duration(index).unwrap(), Rational::new(1, 15));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let registry = CodecRegistry::with_defaults();
        let mut writer = AviWriter::new(AviOutputStream::new(Cursor::new(Vec::new())), &registry);
        let index = writer.add_track(dib_format(24)).unwrap();
        let image = Image::rgb(2, 2, vec![0; 4]).unwrap();
        assert!(matches!(writer.write_image(index, &image, 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_failed_lookup_not_retried() {
        let registry = CodecRegistry::new();
        let mut writer = AviWriter::new(AviOutputStream::new(Cursor::new(Vec::new())), &registry);
        let index = writer.add_track(dib_format(24)).unwrap();
        let image = Image::rgb(2, 2, vec![0; 4]).unwrap();
        assert!(matches!(writer.write_image(index, &image, 1), Err(Error::Unsupported(_))));
        assert!(matches!(writer.tracks[index].codec, CodecSlot::Failed));
        assert!(matches!(writer.write_image(index, &image, 1), Err(Error::Unsupported(_))));
    }
}
