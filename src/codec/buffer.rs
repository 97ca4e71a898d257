//! Frame buffers exchanged between the writer and codecs
//!
//! The writer keeps one output [`FrameBuffer`] per track and hands it to the
//! track's codec on every call. Codecs recycle the byte storage they find in
//! it, so the encoded bytes of the previous frame are overwritten by the next
//! call. Copy them out if they must outlive the call.

use super::bitmap::BitmapImage;
use super::image::Image;
use super::palette::Palette;
use crate::format::FormatDescriptor;
use std::fmt;

/// Buffer flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferFlags {
    /// The buffer can be decoded without reference to other samples
    pub keyframe: bool,
    /// Nothing must be emitted for this buffer
    pub discard: bool,
}

impl BufferFlags {
    /// Flags of a keyframe
    pub fn keyframe() -> Self {
        BufferFlags {
            keyframe: true,
            discard: false,
        }
    }
}

/// Contents of a buffer
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No data
    #[default]
    Empty,
    /// Decoded raster image
    Image(Image),
    /// Encoded bytes; the valid region is `offset..offset + length`
    Bytes(Vec<u8>),
    /// Planar bitmap
    Bitmap(BitmapImage),
}

/// One unit of media data
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    pub payload: Payload,
    /// Start of the valid byte region
    pub offset: usize,
    /// Length of the valid byte region
    pub length: usize,
    /// Number of samples the buffer represents
    pub sample_count: u32,
    pub flags: BufferFlags,
    /// Side channel: palette of an indexed payload
    pub header: Option<Palette>,
    /// Format of the payload
    pub format: Option<FormatDescriptor>,
}

impl FrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer wrapping a decoded image
    pub fn from_image(image: Image) -> Self {
        FrameBuffer {
            payload: Payload::Image(image),
            sample_count: 1,
            ..Self::default()
        }
    }

    /// Buffer holding already encoded bytes
    pub fn from_bytes(data: Vec<u8>, format: FormatDescriptor) -> Self {
        let length = data.len();
        FrameBuffer {
            payload: Payload::Bytes(data),
            offset: 0,
            length,
            sample_count: 1,
            format: Some(format),
            ..Self::default()
        }
    }

    /// Copy flags, sample count, side channel and format from `other`
    pub fn set_meta_to(&mut self, other: &FrameBuffer) {
        self.flags = other.flags;
        self.sample_count = other.sample_count;
        self.header = other.header.clone();
        self.format = other.format.clone();
    }

    /// The valid byte region of a byte payload
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Bytes(data) => data.get(self.offset..self.offset.checked_add(self.length)?),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&Image> {
        match &self.payload {
            Payload::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Take the byte storage for reuse, cleared but with its capacity kept
    pub fn take_byte_storage(&mut self) -> Vec<u8> {
        match std::mem::take(&mut self.payload) {
            Payload::Bytes(mut data) => {
                data.clear();
                data
            }
            _ => Vec::new(),
        }
    }

    /// Store encoded bytes as the payload, covering the whole vector
    pub fn set_bytes(&mut self, data: Vec<u8>) {
        self.offset = 0;
        self.length = data.len();
        self.payload = Payload::Bytes(data);
    }
}

impl fmt::Display for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.payload {
            Payload::Empty => "empty",
            Payload::Image(_) => "image",
            Payload::Bytes(_) => "bytes",
            Payload::Bitmap(_) => "bitmap",
        };
        write!(
            f,
            "FrameBuffer({}, len={}, samples={}, key={}, discard={})",
            kind, self.length, self.sample_count, self.flags.keyframe, self.flags.discard
        )
    }
}
