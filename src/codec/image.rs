//! In-memory raster images
//!
//! An [`Image`] is a rectangular view into a shared raster. Sub-images share
//! the parent's storage and keep its scanline stride, so a region of a large
//! frame can be encoded without copying.

use super::buffer::FrameBuffer;
use super::palette::{Palette, Rgb};
use crate::error::{Error, Result};
use crate::format::FormatDescriptor;
use std::borrow::Cow;
use std::io;
use std::sync::Arc;

/// Pixel storage
#[derive(Debug, Clone)]
pub enum Raster {
    /// One byte per pixel (indexed or gray)
    Bytes(Arc<[u8]>),
    /// One 16-bit word per pixel
    Shorts(Arc<[u16]>),
    /// One 32-bit word per pixel
    Ints(Arc<[u32]>),
}

impl Raster {
    fn len(&self) -> usize {
        match self {
            Raster::Bytes(d) => d.len(),
            Raster::Shorts(d) => d.len(),
            Raster::Ints(d) => d.len(),
        }
    }
}

/// How raster values map to colors
#[derive(Debug, Clone, PartialEq)]
pub enum ColorModel {
    /// Byte raster indexing into a palette
    Indexed(Palette),
    /// Byte raster of gray levels
    Gray,
    /// Short raster, `0RRRRRGGGGGBBBBB`
    Rgb555,
    /// Int raster, `0x00RRGGBB`
    Rgb,
    /// Int raster, `0xAARRGGBB`
    Argb,
}

/// Pixel rectangle within a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// A decoded image
#[derive(Debug, Clone)]
pub struct Image {
    raster: Raster,
    color_model: ColorModel,
    scanline_stride: usize,
    bounds: Rect,
}

impl Image {
    /// Create an image over a whole raster.
    ///
    /// The raster must hold at least `width * height` elements and its kind
    /// must fit the color model.
    pub fn new(width: usize, height: usize, raster: Raster, color_model: ColorModel) -> Result<Self> {
        let compatible = matches!(
            (&raster, &color_model),
            (Raster::Bytes(_), ColorModel::Indexed(_) | ColorModel::Gray)
                | (Raster::Shorts(_), ColorModel::Rgb555)
                | (Raster::Ints(_), ColorModel::Rgb | ColorModel::Argb)
        );
        if !compatible {
            return Err(Error::invalid_input(format!(
                "Color model {:?} cannot describe this raster",
                color_model
            )));
        }
        if width == 0 || height == 0 {
            return Err(Error::invalid_input("Image dimensions must be positive"));
        }
        let need = width * height;
        if raster.len() < need {
            return Err(Error::invalid_input(format!(
                "Raster holds {} pixels, {}x{} needs {}",
                raster.len(),
                width,
                height,
                need
            )));
        }
        Ok(Image {
            raster,
            color_model,
            scanline_stride: width,
            bounds: Rect {
                x: 0,
                y: 0,
                width,
                height,
            },
        })
    }

    /// Indexed image with one palette index per byte
    pub fn indexed(width: usize, height: usize, pixels: Vec<u8>, palette: Palette) -> Result<Self> {
        Self::new(width, height, Raster::Bytes(pixels.into()), ColorModel::Indexed(palette))
    }

    /// 8-bit grayscale image
    pub fn gray(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        Self::new(width, height, Raster::Bytes(pixels.into()), ColorModel::Gray)
    }

    /// 15-bit direct color image
    pub fn rgb555(width: usize, height: usize, pixels: Vec<u16>) -> Result<Self> {
        Self::new(width, height, Raster::Shorts(pixels.into()), ColorModel::Rgb555)
    }

    /// 24-bit true color image, `0x00RRGGBB` per pixel
    pub fn rgb(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self> {
        Self::new(width, height, Raster::Ints(pixels.into()), ColorModel::Rgb)
    }

    /// 32-bit true color image with alpha, `0xAARRGGBB` per pixel
    pub fn argb(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self> {
        Self::new(width, height, Raster::Ints(pixels.into()), ColorModel::Argb)
    }

    /// A view of a region of this image sharing the same raster
    pub fn sub_image(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Image> {
        if width == 0 || height == 0 || x + width > self.bounds.width || y + height > self.bounds.height {
            return Err(Error::invalid_input(format!(
                "Region {}x{}+{}+{} is outside of the {}x{} image",
                width, height, x, y, self.bounds.width, self.bounds.height
            )));
        }
        Ok(Image {
            raster: self.raster.clone(),
            color_model: self.color_model.clone(),
            scanline_stride: self.scanline_stride,
            bounds: Rect {
                x: self.bounds.x + x,
                y: self.bounds.y + y,
                width,
                height,
            },
        })
    }

    pub fn width(&self) -> usize {
        self.bounds.width
    }

    pub fn height(&self) -> usize {
        self.bounds.height
    }

    /// Region of the raster covered by this image
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Elements between the starts of two consecutive rows
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    /// Raster index of the top-left pixel
    pub fn pixel_offset(&self) -> usize {
        self.bounds.x + self.bounds.y * self.scanline_stride
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn color_model(&self) -> &ColorModel {
        &self.color_model
    }

    /// Palette of an indexed image
    pub fn palette(&self) -> Option<&Palette> {
        match &self.color_model {
            ColorModel::Indexed(p) => Some(p),
            _ => None,
        }
    }

    /// Natural bit depth of the color model
    pub fn depth(&self) -> u32 {
        match &self.color_model {
            ColorModel::Indexed(_) | ColorModel::Gray => 8,
            ColorModel::Rgb555 => 16,
            ColorModel::Rgb => 24,
            ColorModel::Argb => 32,
        }
    }

    /// Raw bytes of an indexed or gray image
    pub fn indexed8(&self) -> Option<&[u8]> {
        match &self.raster {
            Raster::Bytes(d) => Some(&d[..]),
            _ => None,
        }
    }

    /// Raster as `0x00RRGGBB` values, converting byte and short rasters.
    pub fn rgb24(&self) -> Option<Cow<'_, [u32]>> {
        match (&self.raster, &self.color_model) {
            (Raster::Ints(d), _) => Some(Cow::Borrowed(&d[..])),
            (Raster::Bytes(d), ColorModel::Indexed(palette)) => Some(Cow::Owned(
                d.iter().map(|&i| palette.lookup(i).to_u32()).collect(),
            )),
            (Raster::Bytes(d), _) => Some(Cow::Owned(
                d.iter().map(|&v| Rgb::new(v, v, v).to_u32()).collect(),
            )),
            (Raster::Shorts(d), _) => Some(Cow::Owned(d.iter().map(|&v| rgb555_to_rgb(v)).collect())),
        }
    }

    /// Raster as 16-bit values. Int rasters are truncated to their low 16 bits.
    pub fn rgb15(&self) -> Option<Cow<'_, [u16]>> {
        match &self.raster {
            Raster::Shorts(d) => Some(Cow::Borrowed(&d[..])),
            Raster::Ints(d) => Some(Cow::Owned(d.iter().map(|&v| v as u16).collect())),
            Raster::Bytes(_) => None,
        }
    }

    /// Raster as `0xAARRGGBB` values; opaque unless the image carries alpha.
    pub fn argb32(&self) -> Option<Cow<'_, [u32]>> {
        match (&self.raster, &self.color_model) {
            (Raster::Ints(d), ColorModel::Argb) => Some(Cow::Borrowed(&d[..])),
            _ => self
                .rgb24()
                .map(|rgb| Cow::Owned(rgb.iter().map(|&v| 0xff00_0000 | (v & 0x00ff_ffff)).collect())),
        }
    }
}

/// Pixels a packing codec reads: a rectangle of a raster with its stride.
///
/// Built from an image payload, or from a byte payload of indexed pixels
/// whose geometry comes from the negotiated output format.
pub(crate) struct PixelRegion<'a> {
    image: Option<&'a Image>,
    bytes: Option<&'a [u8]>,
    pub width: usize,
    pub height: usize,
    /// Raster index of the top-left pixel
    pub offset: usize,
    pub scanline_stride: usize,
}

impl<'a> PixelRegion<'a> {
    pub fn from_buffer(input: &'a FrameBuffer, format: Option<&FormatDescriptor>) -> Option<Self> {
        if let Some(image) = input.image() {
            return Some(PixelRegion {
                image: Some(image),
                bytes: None,
                width: image.width(),
                height: image.height(),
                offset: image.pixel_offset(),
                scanline_stride: image.scanline_stride(),
            });
        }
        let bytes = input.bytes()?;
        let width = format?.width()? as usize;
        let height = format?.height()? as usize;
        Some(PixelRegion {
            image: None,
            bytes: Some(bytes),
            width,
            height,
            offset: 0,
            scanline_stride: width,
        })
    }

    /// Palette of the source, if it is an indexed image
    pub fn palette(&self) -> Option<&'a Palette> {
        self.image.and_then(|image| image.palette())
    }

    pub fn indexed8(&self) -> Option<&'a [u8]> {
        match self.image {
            Some(image) => image.indexed8(),
            None => self.bytes,
        }
    }

    pub fn rgb15(&self) -> Option<Cow<'a, [u16]>> {
        self.image.and_then(|image| image.rgb15())
    }

    pub fn rgb24(&self) -> Option<Cow<'a, [u32]>> {
        self.image.and_then(|image| image.rgb24())
    }

    pub fn argb32(&self) -> Option<Cow<'a, [u32]>> {
        self.image.and_then(|image| image.argb32())
    }
}

/// One row of `width` elements starting at `start`
pub(crate) fn scanline<T>(pixels: &[T], start: usize, width: usize) -> io::Result<&[T]> {
    start
        .checked_add(width)
        .and_then(|end| pixels.get(start..end))
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "Scanline is outside of the raster"))
}

fn rgb555_to_rgb(v: u16) -> u32 {
    let expand = |c: u16| -> u32 {
        let c = (c & 0x1f) as u32;
        (c << 3) | (c >> 2)
    };
    (expand(v >> 10) << 16) | (expand(v >> 5) << 8) | expand(v)
}
