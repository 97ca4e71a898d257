//! Motion JPEG adapter over the `image` crate encoder

use super::buffer::FrameBuffer;
use super::{encode_rgb_frame, Codec, CodecFormats, CodecStatus};
use crate::format::{DataClass, Encoding, FormatDescriptor, MimeType};
use crate::util::MediaType;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// Quality used when the output format carries none
pub const DEFAULT_QUALITY: f32 = 1.0;

/// Encodes every frame as a baseline JPEG image
pub struct JpegCodec {
    formats: CodecFormats,
}

impl JpegCodec {
    pub fn new() -> Self {
        let input = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Native)
            .with_encoding(Encoding::RawImage);
        let output = FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Avi)
            .with_encoding(Encoding::AviMjpg)
            .with_data_class(DataClass::Bytes)
            .with_depth(24);
        JpegCodec {
            formats: CodecFormats::new(vec![input], vec![output]),
        }
    }

    /// Encoder quality in percent, from the 0.0 to 1.0 quality of the output format
    fn quality_percent(&self) -> u8 {
        let quality = self
            .formats
            .output()
            .and_then(|f| f.quality())
            .unwrap_or(DEFAULT_QUALITY);
        (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JpegCodec {
    fn name(&self) -> &str {
        "JPEG Codec"
    }

    fn formats(&self) -> &CodecFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CodecFormats {
        &mut self.formats
    }

    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer) -> CodecStatus {
        let quality = self.quality_percent();
        encode_rgb_frame(self.name(), &self.formats, input, output, |rgb, width, height, out| {
            JpegEncoder::new_with_quality(out, quality).encode(rgb, width, height, ExtendedColorType::Rgb8)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Image, Palette};

    #[test]
    fn test_encodes_jpeg_stream() {
        let mut codec = JpegCodec::new();
        let format = FormatDescriptor::new()
            .with_encoding(Encoding::AviMjpg)
            .with_depth(24)
            .with_quality(0.5);
        assert!(codec.set_output_format(format).is_some());
        assert_eq!(codec.quality_percent(), 50);

        let input = FrameBuffer::from_image(Image::rgb(8, 8, vec![0x336699; 64]).unwrap());
        let mut output = FrameBuffer::new();
        assert_eq!(codec.process(&input, &mut output), CodecStatus::Ok);
        assert!(output.flags.keyframe);
        let bytes = output.bytes().unwrap();
        assert_eq!(&bytes[..2], &[0xff, 0xd8]);
    }

    #[test]
    fn test_default_quality() {
        let codec = JpegCodec::new();
        assert_eq!(codec.quality_percent(), 100);
    }

    #[test]
    fn test_indexed_images_are_expanded() {
        let mut codec = JpegCodec::new();
        let image = Image::indexed(2, 2, vec![0, 1, 1, 0], Palette::vga16()).unwrap();
        let mut output = FrameBuffer::new();
        assert_eq!(codec.process(&FrameBuffer::from_image(image), &mut output), CodecStatus::Ok);
    }
}
