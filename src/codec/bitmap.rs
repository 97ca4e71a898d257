//! Planar bitmaps
//!
//! [`BitmapImage`] stores pixels as interleaved bit planes, the layout used by
//! ILBM/ANIM files: every scanline holds `depth` planes of `bitplane_stride`
//! bytes each, most significant bit leftmost. [`BitmapCodec`] converts chunky
//! images into that layout.

use super::buffer::{FrameBuffer, Payload};
use super::image::Image;
use super::palette::Palette;
use super::{discard, Codec, CodecFormats, CodecStatus};
use crate::error::{Error, Result};
use crate::format::{DataClass, Encoding, FormatDescriptor, MimeType};
use crate::util::MediaType;
use tracing::warn;

/// An image stored as interleaved bit planes
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapImage {
    width: usize,
    height: usize,
    depth: u32,
    bitplane_stride: usize,
    scanline_stride: usize,
    bitmap: Vec<u8>,
    planar_color_model: Option<Palette>,
}

impl BitmapImage {
    /// Allocate a cleared bitmap. Depth must be 1 to 8, or 24 for true color.
    pub fn new(width: usize, height: usize, depth: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_input("Bitmap dimensions must be positive"));
        }
        if !(1..=8).contains(&depth) && depth != 24 {
            return Err(Error::unsupported(format!("Bitmap depth {}", depth)));
        }
        // planes are padded to 16-bit words
        let bitplane_stride = width.div_ceil(16) * 2;
        let scanline_stride = bitplane_stride * depth as usize;
        Ok(BitmapImage {
            width,
            height,
            depth,
            bitplane_stride,
            scanline_stride,
            bitmap: vec![0; scanline_stride * height],
            planar_color_model: None,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Bytes per bit plane row
    pub fn bitplane_stride(&self) -> usize {
        self.bitplane_stride
    }

    /// Bytes per scanline, all planes included
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    /// Color map of the planar data; `None` for true color
    pub fn planar_color_model(&self) -> Option<&Palette> {
        self.planar_color_model.as_ref()
    }

    pub fn set_planar_color_model(&mut self, palette: Option<Palette>) {
        self.planar_color_model = palette;
    }

    /// Whether this bitmap can be reused for the given geometry
    pub fn has_geometry(&self, width: usize, height: usize, depth: u32) -> bool {
        self.width == width && self.height == height && self.depth == depth
    }

    /// Replace the bitmap contents with the pixels of a chunky image.
    ///
    /// Indexed depths take the palette indices of the image. Depth 24 spreads
    /// red over planes 0-7, green over 8-15 and blue over 16-23.
    pub fn convert_from_chunky(&mut self, image: &Image) -> Result<()> {
        if image.width() != self.width || image.height() != self.height {
            return Err(Error::invalid_input(format!(
                "Image is {}x{}, bitmap is {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }
        let stride = image.scanline_stride();
        let base = image.pixel_offset();
        self.bitmap.fill(0);

        if self.depth == 24 {
            let pixels = image
                .rgb24()
                .ok_or_else(|| Error::invalid_input("Image has no true color raster"))?;
            for y in 0..self.height {
                for x in 0..self.width {
                    let rgb = pixels[base + y * stride + x];
                    let v = ((rgb >> 16) & 0xff) | (rgb & 0xff00) | ((rgb & 0xff) << 16);
                    self.set_chunky_pixel(x, y, v);
                }
            }
            self.planar_color_model = None;
        } else {
            let pixels = image
                .indexed8()
                .ok_or_else(|| Error::invalid_input("Indexed bitmap needs an indexed image"))?;
            let mask = (1u32 << self.depth) - 1;
            for y in 0..self.height {
                for x in 0..self.width {
                    let v = pixels[base + y * stride + x] as u32 & mask;
                    self.set_chunky_pixel(x, y, v);
                }
            }
            self.planar_color_model = image.palette().cloned();
        }
        Ok(())
    }

    fn set_chunky_pixel(&mut self, x: usize, y: usize, value: u32) {
        let bit = 0x80u8 >> (x % 8);
        let row = y * self.scanline_stride + x / 8;
        for plane in 0..self.depth as usize {
            if value & (1 << plane) != 0 {
                self.bitmap[row + plane * self.bitplane_stride] |= bit;
            }
        }
    }

    /// Gather the plane bits of one pixel back into its chunky value
    pub fn chunky_pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bit = 0x80u8 >> (x % 8);
        let row = y * self.scanline_stride + x / 8;
        let value = (0..self.depth as usize)
            .filter(|plane| self.bitmap[row + plane * self.bitplane_stride] & bit != 0)
            .fold(0u32, |v, plane| v | (1 << plane));
        Some(value)
    }
}

/// Converts chunky images into planar [`BitmapImage`]s
pub struct BitmapCodec {
    formats: CodecFormats,
}

impl BitmapCodec {
    pub fn new() -> Self {
        let input = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Native)
            .with_encoding(Encoding::RawImage);
        let output = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Anim)
            .with_encoding(Encoding::Bitmap)
            .with_data_class(DataClass::Bitmap);
        BitmapCodec {
            formats: CodecFormats::new(vec![input], vec![output]),
        }
    }
}

impl Default for BitmapCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for BitmapCodec {
    fn name(&self) -> &str {
        "ILBM Codec"
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

        let Some(image) = input.image() else {
            return discard(output);
        };
        let format = self.formats.output();
        let width = format.and_then(|f| f.width()).map_or(image.width(), |w| w as usize);
        let height = format.and_then(|f| f.height()).map_or(image.height(), |h| h as usize);
        let depth = format.and_then(|f| f.depth()).unwrap_or(8);

        let mut bitmap = match std::mem::take(&mut output.payload) {
            Payload::Bitmap(bitmap) if bitmap.has_geometry(width, height, depth) => bitmap,
            _ => match BitmapImage::new(width, height, depth) {
                Ok(bitmap) => bitmap,
                Err(e) => {
                    warn!("{}: {}", self.name(), e);
                    return discard(output);
                }
            },
        };
        if let Err(e) = bitmap.convert_from_chunky(image) {
            warn!("{}: {}", self.name(), e);
            return discard(output);
        }

        output.offset = 0;
        output.length = bitmap.bitmap().len();
        output.payload = Payload::Bitmap(bitmap);
        output.sample_count = 1;
        output.flags.keyframe = true;
        CodecStatus::Ok
    }
}
