//! Format descriptors
//!
//! A [`FormatDescriptor`] describes a track's configured format, a sample's
//! ad-hoc format, or one entry in a codec's set of supported formats. Every
//! field is optional: a missing field acts as a wildcard in [`FormatDescriptor::matches`].
//! Descriptors are immutable; the `with_*`, [`FormatDescriptor::remove`] and
//! [`FormatDescriptor::append`] methods all produce a new descriptor.

use crate::util::{fourcc_from_str, MediaType, Rational};
use std::fmt;

/// Keys of the fixed descriptor schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKey {
    MediaType,
    MimeType,
    Encoding,
    CompressorName,
    DataClass,
    Width,
    Height,
    Depth,
    FrameRate,
    FixedFrameRate,
    Quality,
    KeyFrameInterval,
    SampleRate,
    Channels,
    SampleSizeInBits,
    FrameSize,
}

impl FormatKey {
    /// All keys in schema order
    pub const ALL: [FormatKey; 16] = [
        FormatKey::MediaType,
        FormatKey::MimeType,
        FormatKey::Encoding,
        FormatKey::CompressorName,
        FormatKey::DataClass,
        FormatKey::Width,
        FormatKey::Height,
        FormatKey::Depth,
        FormatKey::FrameRate,
        FormatKey::FixedFrameRate,
        FormatKey::Quality,
        FormatKey::KeyFrameInterval,
        FormatKey::SampleRate,
        FormatKey::Channels,
        FormatKey::SampleSizeInBits,
        FormatKey::FrameSize,
    ];

    /// Human readable key name
    pub fn name(&self) -> &'static str {
        match self {
            FormatKey::MediaType => "mediaType",
            FormatKey::MimeType => "mimeType",
            FormatKey::Encoding => "encoding",
            FormatKey::CompressorName => "compressorName",
            FormatKey::DataClass => "dataClass",
            FormatKey::Width => "width",
            FormatKey::Height => "height",
            FormatKey::Depth => "depth",
            FormatKey::FrameRate => "frameRate",
            FormatKey::FixedFrameRate => "fixedFrameRate",
            FormatKey::Quality => "quality",
            FormatKey::KeyFrameInterval => "keyFrameInterval",
            FormatKey::SampleRate => "sampleRate",
            FormatKey::Channels => "channels",
            FormatKey::SampleSizeInBits => "sampleSizeInBits",
            FormatKey::FrameSize => "frameSize",
        }
    }

    /// Whether the key takes part in [`FormatDescriptor::matches`].
    ///
    /// Compressor name, quality and keyframe interval are encoder hints.
    pub fn is_comparable(&self) -> bool {
        !matches!(
            self,
            FormatKey::CompressorName | FormatKey::Quality | FormatKey::KeyFrameInterval
        )
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Container (MIME-like) tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    /// AVI 1.0 RIFF file
    Avi,
    /// QuickTime movie
    QuickTime,
    /// Amiga IFF ANIM
    Anim,
    /// In-memory data, not bound to any container
    Native,
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MimeType::Avi => "video/avi",
            MimeType::QuickTime => "video/quicktime",
            MimeType::Anim => "x-iff/anim",
            MimeType::Native => "native",
        };
        f.write_str(name)
    }
}

/// Encoding identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Uncompressed device independent bitmap
    AviDib,
    /// Motion JPEG
    AviMjpg,
    /// PNG per frame
    AviPng,
    /// Run length encoded DIB
    AviRle,
    /// TechSmith screen capture
    AviTechsmithScreenCapture,
    /// Decoded in-memory raster image
    RawImage,
    /// QuickTime uncompressed
    QuickTimeRaw,
    /// ANIM op 5 delta compression
    AnimOp5,
    /// Planar bitmap image
    Bitmap,
    PcmSigned,
    PcmUnsigned,
    Alaw,
    Ulaw,
    Mp3,
    /// Any other FourCC
    Other(String),
}

impl Encoding {
    /// FourCC written to the stream header for this encoding
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Encoding::AviDib => *b"DIB ",
            Encoding::AviMjpg => *b"MJPG",
            Encoding::AviPng => *b"png ",
            Encoding::AviRle => *b"RLE ",
            Encoding::AviTechsmithScreenCapture => *b"tscc",
            Encoding::RawImage => *b"    ",
            Encoding::QuickTimeRaw => *b"raw ",
            Encoding::AnimOp5 => *b"op5 ",
            Encoding::Bitmap => *b"ILBM",
            Encoding::PcmSigned | Encoding::PcmUnsigned => *b"PCM ",
            Encoding::Alaw => *b"alaw",
            Encoding::Ulaw => *b"ulaw",
            Encoding::Mp3 => *b".mp3",
            Encoding::Other(s) => fourcc_from_str(s),
        }
    }

    /// Whether samples of this encoding are stored uncompressed (`db` chunks)
    pub fn is_uncompressed_video(&self) -> bool {
        matches!(self, Encoding::AviDib)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Other(s) => f.write_str(s),
            Encoding::RawImage => f.write_str("image"),
            Encoding::Bitmap => f.write_str("bitmap"),
            other => f.write_str(String::from_utf8_lossy(&other.fourcc()).trim_end()),
        }
    }
}

/// Kind of payload a format is carried in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataClass {
    /// Decoded raster image
    Image,
    /// Encoded byte region
    Bytes,
    /// Planar bitmap image
    Bitmap,
}

/// A single typed value, tagged with its key
#[derive(Debug, Clone, PartialEq)]
pub enum FormatValue {
    MediaType(MediaType),
    MimeType(MimeType),
    Encoding(Encoding),
    CompressorName(String),
    DataClass(DataClass),
    Width(u32),
    Height(u32),
    Depth(u32),
    FrameRate(Rational),
    FixedFrameRate(bool),
    Quality(f32),
    KeyFrameInterval(u32),
    SampleRate(u32),
    Channels(u16),
    SampleSizeInBits(u16),
    FrameSize(u32),
}

impl FormatValue {
    /// The key this value belongs to
    pub fn key(&self) -> FormatKey {
        match self {
            FormatValue::MediaType(_) => FormatKey::MediaType,
            FormatValue::MimeType(_) => FormatKey::MimeType,
            FormatValue::Encoding(_) => FormatKey::Encoding,
            FormatValue::CompressorName(_) => FormatKey::CompressorName,
            FormatValue::DataClass(_) => FormatKey::DataClass,
            FormatValue::Width(_) => FormatKey::Width,
            FormatValue::Height(_) => FormatKey::Height,
            FormatValue::Depth(_) => FormatKey::Depth,
            FormatValue::FrameRate(_) => FormatKey::FrameRate,
            FormatValue::FixedFrameRate(_) => FormatKey::FixedFrameRate,
            FormatValue::Quality(_) => FormatKey::Quality,
            FormatValue::KeyFrameInterval(_) => FormatKey::KeyFrameInterval,
            FormatValue::SampleRate(_) => FormatKey::SampleRate,
            FormatValue::Channels(_) => FormatKey::Channels,
            FormatValue::SampleSizeInBits(_) => FormatKey::SampleSizeInBits,
            FormatValue::FrameSize(_) => FormatKey::FrameSize,
        }
    }
}

impl fmt::Display for FormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatValue::MediaType(v) => write!(f, "{}", v),
            FormatValue::MimeType(v) => write!(f, "{}", v),
            FormatValue::Encoding(v) => write!(f, "{}", v),
            FormatValue::CompressorName(v) => write!(f, "{}", v),
            FormatValue::DataClass(v) => write!(f, "{:?}", v),
            FormatValue::Width(v)
            | FormatValue::Height(v)
            | FormatValue::Depth(v)
            | FormatValue::KeyFrameInterval(v)
            | FormatValue::SampleRate(v)
            | FormatValue::FrameSize(v) => write!(f, "{}", v),
            FormatValue::FrameRate(v) => write!(f, "{}", v),
            FormatValue::FixedFrameRate(v) => write!(f, "{}", v),
            FormatValue::Quality(v) => write!(f, "{}", v),
            FormatValue::Channels(v) | FormatValue::SampleSizeInBits(v) => write!(f, "{}", v),
        }
    }
}

/// Immutable capability descriptor with a fixed, optional-field schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatDescriptor {
    media_type: Option<MediaType>,
    mime_type: Option<MimeType>,
    encoding: Option<Encoding>,
    compressor_name: Option<String>,
    data_class: Option<DataClass>,
    width: Option<u32>,
    height: Option<u32>,
    depth: Option<u32>,
    frame_rate: Option<Rational>,
    fixed_frame_rate: Option<bool>,
    quality: Option<f32>,
    key_frame_interval: Option<u32>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    sample_size_in_bits: Option<u16>,
    frame_size: Option<u32>,
}

impl FormatDescriptor {
    /// Create an empty descriptor; it matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a descriptor from a list of values. Later values replace earlier ones.
    pub fn from_values<I: IntoIterator<Item = FormatValue>>(values: I) -> Self {
        let mut desc = Self::default();
        for value in values {
            desc.set(value);
        }
        desc
    }

    /// Video track descriptor carrying every key a video track requires
    pub fn video(encoding: Encoding, width: u32, height: u32, depth: u32, frame_rate: Rational) -> Self {
        Self::new()
            .with_media_type(MediaType::Video)
            .with_encoding(encoding)
            .with_width(width)
            .with_height(height)
            .with_depth(depth)
            .with_frame_rate(frame_rate)
    }

    /// Audio track descriptor
    pub fn audio(encoding: Encoding, sample_rate: u32, channels: u16, sample_size_in_bits: u16) -> Self {
        Self::new()
            .with_media_type(MediaType::Audio)
            .with_encoding(encoding)
            .with_sample_rate(sample_rate)
            .with_channels(channels)
            .with_sample_size_in_bits(sample_size_in_bits)
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: FormatKey) -> Option<FormatValue> {
        match key {
            FormatKey::MediaType => self.media_type.map(FormatValue::MediaType),
            FormatKey::MimeType => self.mime_type.map(FormatValue::MimeType),
            FormatKey::Encoding => self.encoding.clone().map(FormatValue::Encoding),
            FormatKey::CompressorName => {
                self.compressor_name.clone().map(FormatValue::CompressorName)
            }
            FormatKey::DataClass => self.data_class.map(FormatValue::DataClass),
            FormatKey::Width => self.width.map(FormatValue::Width),
            FormatKey::Height => self.height.map(FormatValue::Height),
            FormatKey::Depth => self.depth.map(FormatValue::Depth),
            FormatKey::FrameRate => self.frame_rate.map(FormatValue::FrameRate),
            FormatKey::FixedFrameRate => self.fixed_frame_rate.map(FormatValue::FixedFrameRate),
            FormatKey::Quality => self.quality.map(FormatValue::Quality),
            FormatKey::KeyFrameInterval => {
                self.key_frame_interval.map(FormatValue::KeyFrameInterval)
            }
            FormatKey::SampleRate => self.sample_rate.map(FormatValue::SampleRate),
            FormatKey::Channels => self.channels.map(FormatValue::Channels),
            FormatKey::SampleSizeInBits => self.sample_size_in_bits.map(FormatValue::SampleSizeInBits),
            FormatKey::FrameSize => self.frame_size.map(FormatValue::FrameSize),
        }
    }

    /// Get the value stored under `key`, or `default` when absent
    pub fn get_or(&self, key: FormatKey, default: FormatValue) -> FormatValue {
        self.get(key).unwrap_or(default)
    }

    /// Whether a value is stored under `key`
    pub fn contains_key(&self, key: FormatKey) -> bool {
        match key {
            FormatKey::MediaType => self.media_type.is_some(),
            FormatKey::MimeType => self.mime_type.is_some(),
            FormatKey::Encoding => self.encoding.is_some(),
            FormatKey::CompressorName => self.compressor_name.is_some(),
            FormatKey::DataClass => self.data_class.is_some(),
            FormatKey::Width => self.width.is_some(),
            FormatKey::Height => self.height.is_some(),
            FormatKey::Depth => self.depth.is_some(),
            FormatKey::FrameRate => self.frame_rate.is_some(),
            FormatKey::FixedFrameRate => self.fixed_frame_rate.is_some(),
            FormatKey::Quality => self.quality.is_some(),
            FormatKey::KeyFrameInterval => self.key_frame_interval.is_some(),
            FormatKey::SampleRate => self.sample_rate.is_some(),
            FormatKey::Channels => self.channels.is_some(),
            FormatKey::SampleSizeInBits => self.sample_size_in_bits.is_some(),
            FormatKey::FrameSize => self.frame_size.is_some(),
        }
    }

    /// Returns true if every comparable key present in both descriptors holds
    /// the same value. Keys missing on either side are wildcards.
    pub fn matches(&self, other: &FormatDescriptor) -> bool {
        FormatKey::ALL
            .iter()
            .filter(|key| key.is_comparable())
            .all(|&key| match (self.get(key), other.get(key)) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            })
    }

    /// New descriptor with the given keys erased
    pub fn remove(&self, keys: &[FormatKey]) -> FormatDescriptor {
        let mut desc = self.clone();
        for &key in keys {
            desc.clear(key);
        }
        desc
    }

    /// New descriptor holding every value of `self` plus the values of `other`
    /// for keys `self` does not define. Values in `self` win.
    pub fn append(&self, other: &FormatDescriptor) -> FormatDescriptor {
        let mut desc = self.clone();
        for value in other.values() {
            if !desc.contains_key(value.key()) {
                desc.set(value);
            }
        }
        desc
    }

    /// All present values in schema order
    pub fn values(&self) -> Vec<FormatValue> {
        FormatKey::ALL.iter().filter_map(|&key| self.get(key)).collect()
    }

    fn set(&mut self, value: FormatValue) {
        match value {
            FormatValue::MediaType(v) => self.media_type = Some(v),
            FormatValue::MimeType(v) => self.mime_type = Some(v),
            FormatValue::Encoding(v) => self.encoding = Some(v),
            FormatValue::CompressorName(v) => self.compressor_name = Some(v),
            FormatValue::DataClass(v) => self.data_class = Some(v),
            FormatValue::Width(v) => self.width = Some(v),
            FormatValue::Height(v) => self.height = Some(v),
            FormatValue::Depth(v) => self.depth = Some(v),
            FormatValue::FrameRate(v) => self.frame_rate = Some(v),
            FormatValue::FixedFrameRate(v) => self.fixed_frame_rate = Some(v),
            FormatValue::Quality(v) => self.quality = Some(v),
            FormatValue::KeyFrameInterval(v) => self.key_frame_interval = Some(v),
            FormatValue::SampleRate(v) => self.sample_rate = Some(v),
            FormatValue::Channels(v) => self.channels = Some(v),
            FormatValue::SampleSizeInBits(v) => self.sample_size_in_bits = Some(v),
            FormatValue::FrameSize(v) => self.frame_size = Some(v),
        }
    }

    fn clear(&mut self, key: FormatKey) {
        match key {
            FormatKey::MediaType => self.media_type = None,
            FormatKey::MimeType => self.mime_type = None,
            FormatKey::Encoding => self.encoding = None,
            FormatKey::CompressorName => self.compressor_name = None,
            FormatKey::DataClass => self.data_class = None,
            FormatKey::Width => self.width = None,
            FormatKey::Height => self.height = None,
            FormatKey::Depth => self.depth = None,
            FormatKey::FrameRate => self.frame_rate = None,
            FormatKey::FixedFrameRate => self.fixed_frame_rate = None,
            FormatKey::Quality => self.quality = None,
            FormatKey::KeyFrameInterval => self.key_frame_interval = None,
            FormatKey::SampleRate => self.sample_rate = None,
            FormatKey::Channels => self.channels = None,
            FormatKey::SampleSizeInBits => self.sample_size_in_bits = None,
            FormatKey::FrameSize => self.frame_size = None,
        }
    }

    pub fn media_type(&self) -> Option<MediaType> {
        self.media_type
    }

    pub fn mime_type(&self) -> Option<MimeType> {
        self.mime_type
    }

    pub fn encoding(&self) -> Option<&Encoding> {
        self.encoding.as_ref()
    }

    pub fn compressor_name(&self) -> Option<&str> {
        self.compressor_name.as_deref()
    }

    pub fn data_class(&self) -> Option<DataClass> {
        self.data_class
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn depth(&self) -> Option<u32> {
        self.depth
    }

    pub fn frame_rate(&self) -> Option<Rational> {
        self.frame_rate
    }

    pub fn fixed_frame_rate(&self) -> Option<bool> {
        self.fixed_frame_rate
    }

    pub fn quality(&self) -> Option<f32> {
        self.quality
    }

    pub fn key_frame_interval(&self) -> Option<u32> {
        self.key_frame_interval
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn channels(&self) -> Option<u16> {
        self.channels
    }

    pub fn sample_size_in_bits(&self) -> Option<u16> {
        self.sample_size_in_bits
    }

    pub fn frame_size(&self) -> Option<u32> {
        self.frame_size
    }

    pub fn with_media_type(self, v: MediaType) -> Self {
        self.with(FormatValue::MediaType(v))
    }

    pub fn with_mime_type(self, v: MimeType) -> Self {
        self.with(FormatValue::MimeType(v))
    }

    pub fn with_encoding(self, v: Encoding) -> Self {
        self.with(FormatValue::Encoding(v))
    }

    pub fn with_compressor_name<S: Into<String>>(self, v: S) -> Self {
        self.with(FormatValue::CompressorName(v.into()))
    }

    pub fn with_data_class(self, v: DataClass) -> Self {
        self.with(FormatValue::DataClass(v))
    }

    pub fn with_width(self, v: u32) -> Self {
        self.with(FormatValue::Width(v))
    }

    pub fn with_height(self, v: u32) -> Self {
        self.with(FormatValue::Height(v))
    }

    pub fn with_depth(self, v: u32) -> Self {
        self.with(FormatValue::Depth(v))
    }

    pub fn with_frame_rate(self, v: Rational) -> Self {
        self.with(FormatValue::FrameRate(v))
    }

    pub fn with_fixed_frame_rate(self, v: bool) -> Self {
        self.with(FormatValue::FixedFrameRate(v))
    }

    pub fn with_quality(self, v: f32) -> Self {
        self.with(FormatValue::Quality(v))
    }

    pub fn with_key_frame_interval(self, v: u32) -> Self {
        self.with(FormatValue::KeyFrameInterval(v))
    }

    pub fn with_sample_rate(self, v: u32) -> Self {
        self.with(FormatValue::SampleRate(v))
    }

    pub fn with_channels(self, v: u16) -> Self {
        self.with(FormatValue::Channels(v))
    }

    pub fn with_sample_size_in_bits(self, v: u16) -> Self {
        self.with(FormatValue::SampleSizeInBits(v))
    }

    pub fn with_frame_size(self, v: u32) -> Self {
        self.with(FormatValue::FrameSize(v))
    }

    /// New descriptor with `value` stored under its key
    pub fn with(mut self, value: FormatValue) -> Self {
        self.set(value);
        self
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Format{{")?;
        for (i, value) in self.values().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", value.key(), value)?;
        }
        write!(f, "}}")
    }
}
