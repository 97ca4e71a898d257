//! Raw video codec
//!
//! Writes pixels top-down in the QuickTime `raw ` layout. Multi-byte pixels
//! are big-endian: 16-bit `0RRRRRGGGGGBBBBB`, 24-bit R,G,B and 32-bit A,R,G,B.

use super::buffer::FrameBuffer;
use super::image::{scanline, PixelRegion};
use super::{discard, Codec, CodecFormats, CodecStatus};
use crate::format::{DataClass, Encoding, FormatDescriptor, MimeType};
use crate::util::MediaType;
use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};
use tracing::warn;

/// Depths the raw codec can produce
pub const RAW_DEPTHS: [u32; 4] = [8, 16, 24, 32];

/// Encodes images as uncompressed top-down frames
pub struct RawCodec {
    formats: CodecFormats,
}

impl RawCodec {
    pub fn new() -> Self {
        let input = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Native)
            .with_encoding(Encoding::RawImage);
        let outputs = RAW_DEPTHS
            .iter()
            .map(|&depth| {
                FormatDescriptor::new()
                    .with_media_type(MediaType::Video)
                    .with_mime_type(MimeType::QuickTime)
                    .with_encoding(Encoding::QuickTimeRaw)
                    .with_data_class(DataClass::Bytes)
                    .with_depth(depth)
            })
            .collect();
        RawCodec {
            formats: CodecFormats::new(vec![input], outputs),
        }
    }
}

impl Default for RawCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for RawCodec {
    fn name(&self) -> &str {
        "Raw Codec"
    }

    fn formats(&self) -> &CodecFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CodecFormats {
        &mut self.formats
    }

    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer) -> CodecStatus {
        output.set_meta_to(input);
        if input.flags.discard {
            return CodecStatus::Ok;
        }
        if let Some(format) = self.formats.output() {
            output.format = Some(format.clone());
        }

        let Some(region) = PixelRegion::from_buffer(input, self.formats.output()) else {
            return discard(output);
        };
        let depth = self
            .formats
            .output()
            .and_then(|f| f.depth())
            .or_else(|| input.image().map(|image| image.depth()));

        let mut data = output.take_byte_storage();
        let (w, h, off, stride) = (region.width, region.height, region.offset, region.scanline_stride);
        let written = match depth {
            Some(8) => region
                .indexed8()
                .map(|pixels| write_key8(&mut data, pixels, w, h, off, stride)),
            Some(16) => region
                .rgb15()
                .map(|pixels| write_key16(&mut data, &pixels, w, h, off, stride)),
            Some(24) => region
                .rgb24()
                .map(|pixels| write_key24(&mut data, &pixels, w, h, off, stride)),
            Some(32) => region
                .argb32()
                .map(|pixels| write_key32(&mut data, &pixels, w, h, off, stride)),
            _ => None,
        };

        match written {
            Some(Ok(())) => {
                output.set_bytes(data);
                output.sample_count = 1;
                output.flags.keyframe = true;
                CodecStatus::Ok
            }
            Some(Err(e)) => {
                warn!("{}: {}", self.name(), e);
                data.clear();
                output.set_bytes(data);
                discard(output)
            }
            None => {
                warn!("{}: cannot pack {} at depth {:?}", self.name(), input, depth);
                output.set_bytes(data);
                discard(output)
            }
        }
    }
}

/// Encode an 8-bit key frame
pub fn write_key8<W: Write>(
    out: &mut W,
    pixels: &[u8],
    width: usize,
    height: usize,
    offset: usize,
    scanline_stride: usize,
) -> io::Result<()> {
    for y in 0..height {
        out.write_all(scanline(pixels, offset + y * scanline_stride, width)?)?;
    }
    Ok(())
}

/// Encode a 16-bit key frame
pub fn write_key16<W: Write>(
    out: &mut W,
    pixels: &[u16],
    width: usize,
    height: usize,
    offset: usize,
    scanline_stride: usize,
) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(width * 2);
    for y in 0..height {
        bytes.clear();
        for &p in scanline(pixels, offset + y * scanline_stride, width)? {
            bytes.write_u16::<BigEndian>(p)?;
        }
        out.write_all(&bytes)?;
    }
    Ok(())
}

/// Encode a 24-bit key frame from `0x00RRGGBB` pixels
pub fn write_key24<W: Write>(
    out: &mut W,
    pixels: &[u32],
    width: usize,
    height: usize,
    offset: usize,
    scanline_stride: usize,
) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(width * 3);
    for y in 0..height {
        bytes.clear();
        for &p in scanline(pixels, offset + y * scanline_stride, width)? {
            bytes.write_u24::<BigEndian>(p & 0x00ff_ffff)?;
        }
        out.write_all(&bytes)?;
    }
    Ok(())
}

/// Encode a 32-bit key frame from `0xAARRGGBB` pixels
pub fn write_key32<W: Write>(
    out: &mut W,
    pixels: &[u32],
    width: usize,
    height: usize,
    offset: usize,
    scanline_stride: usize,
) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(width * 4);
    for y in 0..height {
        bytes.clear();
        for &p in scanline(pixels, offset + y * scanline_stride, width)? {
            bytes.write_u32::<BigEndian>(p)?;
        }
        out.write_all(&bytes)?;
    }
    Ok(())
}
