//! Codecs
//!
//! A [`Codec`] negotiates an input/output [`FormatDescriptor`] pair and
//! transforms one [`FrameBuffer`] into another. The pixel codecs in this
//! module pack raster images into the byte layouts container formats expect;
//! the JPEG and PNG adapters hand whole frames to the `image` crate.

pub mod bitmap;
pub mod buffer;
pub mod dib;
pub mod image;
pub mod jpeg;
pub mod palette;
pub mod png;
pub mod raw;
pub mod registry;

pub use bitmap::{BitmapCodec, BitmapImage};
pub use buffer::{BufferFlags, FrameBuffer, Payload};
pub use dib::DibCodec;
pub use self::image::{ColorModel, Image, Raster, Rect};
pub use jpeg::JpegCodec;
pub use palette::{Palette, Rgb};
pub use png::PngCodec;
pub use raw::RawCodec;
pub use registry::CodecRegistry;

use crate::format::FormatDescriptor;
use tracing::warn;

/// Outcome of [`Codec::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecStatus {
    /// The input was consumed and the output is complete
    Ok,
    /// The output could not be produced; it carries the DISCARD flag
    Failed,
}

/// Encoder/decoder interface
pub trait Codec: Send {
    /// Display name
    fn name(&self) -> &str;

    /// Negotiation state shared by all codecs
    fn formats(&self) -> &CodecFormats;

    fn formats_mut(&mut self) -> &mut CodecFormats;

    /// Formats this codec accepts
    fn supported_input_formats(&self) -> &[FormatDescriptor] {
        self.formats().supported_inputs()
    }

    /// Formats this codec can produce
    fn supported_output_formats(&self) -> &[FormatDescriptor] {
        self.formats().supported_outputs()
    }

    /// Constrain the input format. `None` leaves the input unconstrained.
    ///
    /// Returns the negotiated input format, or `None` if unsupported.
    fn set_input_format(&mut self, format: Option<FormatDescriptor>) -> Option<FormatDescriptor> {
        self.formats_mut().set_input(format)
    }

    /// Select the output format. Returns `None` if the codec cannot produce it.
    fn set_output_format(&mut self, format: FormatDescriptor) -> Option<FormatDescriptor> {
        self.formats_mut().set_output(format)
    }

    fn input_format(&self) -> Option<&FormatDescriptor> {
        self.formats().input()
    }

    fn output_format(&self) -> Option<&FormatDescriptor> {
        self.formats().output()
    }

    /// Transform `input` into `output`. Must not retain either buffer.
    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer) -> CodecStatus;
}

/// Supported and negotiated formats of a codec
#[derive(Debug, Clone, Default)]
pub struct CodecFormats {
    supported_inputs: Vec<FormatDescriptor>,
    supported_outputs: Vec<FormatDescriptor>,
    input: Option<FormatDescriptor>,
    output: Option<FormatDescriptor>,
}

impl CodecFormats {
    pub fn new(supported_inputs: Vec<FormatDescriptor>, supported_outputs: Vec<FormatDescriptor>) -> Self {
        CodecFormats {
            supported_inputs,
            supported_outputs,
            input: None,
            output: None,
        }
    }

    pub fn supported_inputs(&self) -> &[FormatDescriptor] {
        &self.supported_inputs
    }

    pub fn supported_outputs(&self) -> &[FormatDescriptor] {
        &self.supported_outputs
    }

    pub fn input(&self) -> Option<&FormatDescriptor> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&FormatDescriptor> {
        self.output.as_ref()
    }

    /// Negotiate the input. The requested values win over the supported entry.
    pub fn set_input(&mut self, format: Option<FormatDescriptor>) -> Option<FormatDescriptor> {
        self.input = format.and_then(|requested| {
            self.supported_inputs
                .iter()
                .find(|supported| supported.matches(&requested))
                .map(|supported| requested.append(supported))
        });
        self.input.clone()
    }

    /// Negotiate the output against the first matching supported entry.
    pub fn set_output(&mut self, requested: FormatDescriptor) -> Option<FormatDescriptor> {
        self.output = self
            .supported_outputs
            .iter()
            .find(|supported| supported.matches(&requested))
            .map(|supported| requested.append(supported));
        self.output.clone()
    }

    /// Whether any supported output matches `desired`
    pub fn can_produce(&self, desired: &FormatDescriptor) -> bool {
        self.supported_outputs.iter().any(|f| f.matches(desired))
    }
}

/// Mark `output` as dropped and report failure
pub(crate) fn discard(output: &mut FrameBuffer) -> CodecStatus {
    output.flags.discard = true;
    CodecStatus::Failed
}

/// Run a whole-frame image encoder over the RGB pixels of `input`.
///
/// Shared by the image-library adapters: copies metadata, passes DISCARD
/// through, reuses the output byte storage and marks every frame as a key
/// frame.
pub(crate) fn encode_rgb_frame<F>(
    name: &str,
    formats: &CodecFormats,
    input: &FrameBuffer,
    output: &mut FrameBuffer,
    encode: F,
) -> CodecStatus
where
    F: FnOnce(&[u8], u32, u32, &mut Vec<u8>) -> ::image::ImageResult<()>,
{
    output.set_meta_to(input);
    if let Some(format) = formats.output() {
        output.format = Some(format.clone());
    }
    if input.flags.discard {
        return CodecStatus::Ok;
    }

    let Some(region) = self::image::PixelRegion::from_buffer(input, formats.output()) else {
        return discard(output);
    };
    let Some(pixels) = region.rgb24() else {
        warn!("{}: no RGB raster in {}", name, input);
        return discard(output);
    };
    let mut rgb = Vec::with_capacity(region.width * region.height * 3);
    if let Err(e) = raw::write_key24(
        &mut rgb,
        &pixels,
        region.width,
        region.height,
        region.offset,
        region.scanline_stride,
    ) {
        warn!("{}: {}", name, e);
        return discard(output);
    }

    let mut data = output.take_byte_storage();
    match encode(&rgb, region.width as u32, region.height as u32, &mut data) {
        Ok(()) => {
            output.set_bytes(data);
            output.sample_count = 1;
            output.flags.keyframe = true;
            CodecStatus::Ok
        }
        Err(e) => {
            warn!("{}: {}", name, e);
            data.clear();
            output.set_bytes(data);
            discard(output)
        }
    }
}
