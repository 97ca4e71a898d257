//! Common test utilities for avimux integration tests
//!
//! Test images, unpacking helpers for the pixel codecs, a chunk writer that
//! records every call, and small codecs with scripted behavior.

#![allow(dead_code)]

use avimux::codec::{Codec, CodecFormats, CodecStatus, FrameBuffer, Image, Palette};
use avimux::error::Result;
use avimux::format::avi::{self, AudioTrackParams, ChunkWriter, VideoTrackParams};
use avimux::format::{Encoding, FormatDescriptor, MimeType};
use avimux::util::{MediaType, Rational};

// ============================================================================
// Images
// ============================================================================

/// Indexed image whose pixel values depend on their position
pub fn indexed_pattern(width: usize, height: usize, depth: u32) -> Image {
    let mask = ((1u32 << depth) - 1) as usize;
    let pixels = (0..width * height).map(|i| ((i * 7 + i / width) & mask) as u8).collect();
    Image::indexed(width, height, pixels, Palette::grayscale(depth)).unwrap()
}

/// True color image whose pixel values depend on their position
pub fn rgb_pattern(width: usize, height: usize) -> Image {
    let pixels = (0..width * height)
        .map(|i| ((i as u32 * 0x010305) ^ ((i / width) as u32 * 0x110000)) & 0x00ff_ffff)
        .collect();
    Image::rgb(width, height, pixels).unwrap()
}

/// Palette of `len` entries, entry `i` being `(i, 255 - i, i / 2)`
pub fn ramp_palette(len: usize) -> Palette {
    Palette::from_rgb_values(
        &(0..len as u32)
            .map(|i| (i << 16) | ((255 - i) << 8) | (i / 2))
            .collect::<Vec<_>>(),
    )
    .unwrap()
}

// ============================================================================
// Unpacking
// ============================================================================

/// Inverse of the 4-bit DIB packer
pub fn dib_unpack4(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let row_bytes = width.div_ceil(2);
    let mut pixels = Vec::with_capacity(width * height);
    for row in data.chunks(row_bytes).rev().take(height) {
        for x in 0..width {
            let byte = row[x / 2];
            pixels.push(if x % 2 == 0 { byte >> 4 } else { byte & 0x0f });
        }
    }
    pixels
}

/// Inverse of the 8-bit DIB packer
pub fn dib_unpack8(data: &[u8], width: usize) -> Vec<u8> {
    data.chunks(width).rev().flatten().copied().collect()
}

/// Inverse of the 24-bit DIB packer
pub fn dib_unpack24(data: &[u8], width: usize) -> Vec<u32> {
    data.chunks(width * 3)
        .rev()
        .flat_map(|row| row.chunks(3))
        .map(|p| (p[2] as u32) << 16 | (p[1] as u32) << 8 | p[0] as u32)
        .collect()
}

/// Inverse of the 24-bit raw packer
pub fn raw_unpack24(data: &[u8]) -> Vec<u32> {
    data.chunks(3)
        .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32)
        .collect()
}

// ============================================================================
// Formats
// ============================================================================

/// DIB track format at 15 fps
pub fn dib_format(width: u32, height: u32, depth: u32) -> FormatDescriptor {
    avi::video_raw()
        .with_width(width)
        .with_height(height)
        .with_depth(depth)
        .with_frame_rate(Rational::new(15, 1))
}

// ============================================================================
// Recording chunk writer
// ============================================================================

/// A call received by [`RecordingChunkWriter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Sample {
        track: usize,
        count: u32,
        data: Vec<u8>,
        keyframe: bool,
    },
    Palette {
        track: usize,
        data: Vec<u8>,
        keyframe: bool,
    },
}

#[derive(Debug, Clone)]
pub enum Declared {
    Video(VideoTrackParams),
    Audio(AudioTrackParams),
}

/// Chunk writer that keeps everything in memory
#[derive(Debug, Default)]
pub struct RecordingChunkWriter {
    pub tracks: Vec<Declared>,
    pub palettes: Vec<Option<Palette>>,
    pub calls: Vec<Call>,
    pub durations: Vec<u64>,
    pub started: bool,
    pub finished: bool,
    pub position: u64,
}

impl RecordingChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer that reports `position` bytes already written
    pub fn with_position(position: u64) -> Self {
        RecordingChunkWriter {
            position,
            ..Self::default()
        }
    }

    /// Keyframe flags of the samples written to `track`
    pub fn sample_keyframes(&self, track: usize) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Sample { track: t, keyframe, .. } if *t == track => Some(*keyframe),
                _ => None,
            })
            .collect()
    }

    /// Palette records written to `track`
    pub fn palette_records(&self, track: usize) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Palette { track: t, data, .. } if *t == track => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ChunkWriter for RecordingChunkWriter {
    fn add_video_track(&mut self, params: VideoTrackParams) -> Result<usize> {
        self.tracks.push(Declared::Video(params));
        self.palettes.push(None);
        self.durations.push(0);
        Ok(self.tracks.len() - 1)
    }

    fn add_audio_track(&mut self, params: AudioTrackParams) -> Result<usize> {
        self.tracks.push(Declared::Audio(params));
        self.palettes.push(None);
        self.durations.push(0);
        Ok(self.tracks.len() - 1)
    }

    fn set_palette(&mut self, track: usize, palette: &Palette) -> Result<()> {
        self.palettes[track] = Some(palette.clone());
        Ok(())
    }

    fn ensure_started(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn write_samples(&mut self, track: usize, count: u32, data: &[u8], keyframe: bool) -> Result<()> {
        self.calls.push(Call::Sample {
            track,
            count,
            data: data.to_vec(),
            keyframe,
        });
        self.durations[track] += count as u64;
        self.position += 8 + data.len() as u64;
        Ok(())
    }

    fn write_palette(&mut self, track: usize, data: &[u8], keyframe: bool) -> Result<()> {
        self.calls.push(Call::Palette {
            track,
            data: data.to_vec(),
            keyframe,
        });
        self.position += 8 + data.len() as u64;
        Ok(())
    }

    fn media_duration(&self, track: usize) -> u64 {
        self.durations.get(track).copied().unwrap_or(0)
    }

    fn relative_stream_position(&mut self) -> Result<u64> {
        Ok(self.position)
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

// ============================================================================
// Scripted codecs
// ============================================================================

fn any_video_formats() -> CodecFormats {
    CodecFormats::new(
        vec![FormatDescriptor::new().with_encoding(Encoding::RawImage)],
        vec![FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Avi)],
    )
}

/// Emits one byte per pixel and keeps the key frame flag of its input
pub struct PassthroughCodec {
    formats: CodecFormats,
}

impl PassthroughCodec {
    pub fn new() -> Self {
        PassthroughCodec {
            formats: any_video_formats(),
        }
    }
}

impl Codec for PassthroughCodec {
    fn name(&self) -> &str {
        "Passthrough"
    }

    fn formats(&self) -> &CodecFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CodecFormats {
        &mut self.formats
    }

    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer) -> CodecStatus {
        output.set_meta_to(input);
        let Some(image) = input.image() else {
            output.flags.discard = true;
            return CodecStatus::Failed;
        };
        output.set_bytes(vec![0; image.width() * image.height()]);
        output.sample_count = 1;
        CodecStatus::Ok
    }
}

/// Drops every frame with the given status
pub struct DiscardingCodec {
    formats: CodecFormats,
    status: CodecStatus,
}

impl DiscardingCodec {
    pub fn new(status: CodecStatus) -> Self {
        DiscardingCodec {
            formats: any_video_formats(),
            status,
        }
    }
}

impl Codec for DiscardingCodec {
    fn name(&self) -> &str {
        "Discarding"
    }

    fn formats(&self) -> &CodecFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CodecFormats {
        &mut self.formats
    }

    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer) -> CodecStatus {
        output.set_meta_to(input);
        output.flags.discard = true;
        self.status
    }
}
