//! Device independent bitmap codec
//!
//! Packs images into the uncompressed `DIB ` frames of AVI files. Rows are
//! stored bottom-up, pixels left to right:
//!
//! - 4 bit: two palette indices per byte, high nibble first
//! - 8 bit: one palette index per byte
//! - 24 bit: blue, green, red

use super::buffer::FrameBuffer;
use super::image::{scanline, PixelRegion};
use super::{discard, Codec, CodecFormats, CodecStatus};
use crate::format::{DataClass, Encoding, FormatDescriptor, MimeType};
use crate::util::MediaType;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};
use tracing::warn;

/// Depths the DIB codec can produce
pub const DIB_DEPTHS: [u32; 3] = [4, 8, 24];

/// Encodes images as AVI DIB frames
pub struct DibCodec {
    formats: CodecFormats,
}

impl DibCodec {
    pub fn new() -> Self {
        let input = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Native)
            .with_encoding(Encoding::RawImage)
            .with_fixed_frame_rate(true);
        let outputs = DIB_DEPTHS
            .iter()
            .map(|&depth| {
                FormatDescriptor::new()
                    .with_media_type(MediaType::Video)
                    .with_mime_type(MimeType::Avi)
                    .with_encoding(Encoding::AviDib)
                    .with_data_class(DataClass::Bytes)
                    .with_fixed_frame_rate(true)
                    .with_depth(depth)
            })
            .collect();
        DibCodec {
            formats: CodecFormats::new(vec![input], outputs),
        }
    }
}

impl Default for DibCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for DibCodec {
    fn name(&self) -> &str {
        "DIB Codec"
    }

    fn formats(&self) -> &CodecFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CodecFormats {
        &mut self.formats
    }

    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer) -> CodecStatus {
        output.set_meta_to(input);
        if let Some(format) = self.formats.output() {
            output.format = Some(format.clone());
        }
        if input.flags.discard {
            return CodecStatus::Ok;
        }

        let Some(region) = PixelRegion::from_buffer(input, self.formats.output()) else {
            return discard(output);
        };
        output.header = region.palette().cloned();
        let depth = self
            .formats
            .output()
            .and_then(|f| f.depth())
            .or_else(|| input.image().map(|image| image.depth()));

        let mut data = output.take_byte_storage();
        let (w, h, off, stride) = (region.width, region.height, region.offset, region.scanline_stride);
        let written = match depth {
            Some(4) => region
                .indexed8()
                .map(|pixels| write_key4(&mut data, pixels, w, h, off, stride)),
            Some(8) => region
                .indexed8()
                .map(|pixels| write_key8(&mut data, pixels, w, h, off, stride)),
            Some(24) => region
                .rgb24()
                .map(|pixels| write_key24(&mut data, &pixels, w, h, off, stride)),
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

/// Encode a 4-bit key frame. Odd widths leave the low nibble of the last byte zero.
pub fn write_key4<W: Write>(
    out: &mut W,
    pixels: &[u8],
    width: usize,
    height: usize,
    offset: usize,
    scanline_stride: usize,
) -> io::Result<()> {
    let mut bytes = vec![0u8; width.div_ceil(2)];
    for y in (0..height).rev() {
        let row = scanline(pixels, offset + y * scanline_stride, width)?;
        for (dst, pair) in bytes.iter_mut().zip(row.chunks(2)) {
            let low = pair.get(1).map_or(0, |p| p & 0x0f);
            *dst = ((pair[0] & 0x0f) << 4) | low;
        }
        out.write_all(&bytes)?;
    }
    Ok(())
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
    for y in (0..height).rev() {
        out.write_all(scanline(pixels, offset + y * scanline_stride, width)?)?;
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
    for y in (0..height).rev() {
        bytes.clear();
        for &p in scanline(pixels, offset + y * scanline_stride, width)? {
            bytes.write_u24::<LittleEndian>(p & 0x00ff_ffff)?;
        }
        out.write_all(&bytes)?;
    }
    Ok(())
}
