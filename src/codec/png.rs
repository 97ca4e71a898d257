//! PNG adapter over the `image` crate encoder

use super::buffer::FrameBuffer;
use super::{encode_rgb_frame, Codec, CodecFormats, CodecStatus};
use crate::format::{DataClass, Encoding, FormatDescriptor, MimeType};
use crate::util::MediaType;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Encodes every frame as a PNG image
pub struct PngCodec {
    formats: CodecFormats,
}

impl PngCodec {
    pub fn new() -> Self {
        let input = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Native)
            .with_encoding(Encoding::RawImage);
        let output = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Avi)
            .with_encoding(Encoding::AviPng)
            .with_data_class(DataClass::Bytes)
            .with_depth(24);
        PngCodec {
            formats: CodecFormats::new(vec![input], vec![output]),
        }
    }
}

impl Default for PngCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for PngCodec {
    fn name(&self) -> &str {
        "PNG Codec"
    }

    fn formats(&self) -> &CodecFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CodecFormats {
        &mut self.formats
    }

    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer) -> CodecStatus {
        encode_rgb_frame(self.name(), &self.formats, input, output, |rgb, width, height, out| {
            PngEncoder::new(out).write_image(rgb, width, height, ExtendedColorType::Rgb8)
        })
    }
}
