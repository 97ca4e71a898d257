//! Codec registry
//!
//! The registry is an ordinary value built once and borrowed by writers.
//! Lookups instantiate a fresh codec for every matching factory, in
//! registration order.

use super::{BitmapCodec, Codec, DibCodec, JpegCodec, PngCodec, RawCodec};
use crate::format::FormatDescriptor;
use std::fmt;

type Factory = Box<dyn Fn() -> Box<dyn Codec> + Send + Sync>;

struct Entry {
    name: String,
    outputs: Vec<FormatDescriptor>,
    factory: Factory,
}

/// Ordered set of codec factories
#[derive(Default)]
pub struct CodecRegistry {
    entries: Vec<Entry>,
}

impl CodecRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in codecs: DIB, PNG, JPEG, raw and bitmap
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(|| Box::new(DibCodec::new()));
        registry.register(|| Box::new(PngCodec::new()));
        registry.register(|| Box::new(JpegCodec::new()));
        registry.register(|| Box::new(RawCodec::new()));
        registry.register(|| Box::new(BitmapCodec::new()));
        registry
    }

    /// Add a factory. Its supported output formats are captured once here.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Codec> + Send + Sync + 'static,
    {
        let probe = factory();
        self.entries.push(Entry {
            name: probe.name().to_string(),
            outputs: probe.supported_output_formats().to_vec(),
            factory: Box::new(factory),
        });
    }

    /// New instances of every codec that can produce `desired`.
    ///
    /// An empty list means no codec is available; the first entry is the
    /// preferred one.
    pub fn lookup_encoders(&self, desired: &FormatDescriptor) -> Vec<Box<dyn Codec>> {
        self.entries
            .iter()
            .filter(|entry| entry.outputs.iter().any(|f| f.matches(desired)))
            .map(|entry| (entry.factory)())
            .collect()
    }

    /// Names of the registered codecs
    pub fn codec_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.codec_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Encoding, MimeType};
    use crate::util::MediaType;

    fn avi(encoding: Encoding, depth: u32) -> FormatDescriptor {
        FormatDescriptor::new()
            .with_media_type(MediaType::Video)
            .with_mime_type(MimeType::Avi)
            .with_encoding(encoding)
            .with_depth(depth)
    }

    #[test]
    fn test_defaults_order() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(
            registry.codec_names(),
            vec!["DIB Codec", "PNG Codec", "JPEG Codec", "Raw Codec", "ILBM Codec"]
        );
    }

    #[test]
    fn test_lookup_by_encoding() {
        let registry = CodecRegistry::with_defaults();
        let found = registry.lookup_encoders(&avi(Encoding::AviDib, 8));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "DIB Codec");

        let found = registry.lookup_encoders(&avi(Encoding::AviPng, 24));
        assert_eq!(found[0].name(), "PNG Codec");
    }

    #[test]
    fn test_lookup_miss_is_empty() {
        let registry = CodecRegistry::with_defaults();
        assert!(registry.lookup_encoders(&avi(Encoding::AviRle, 8)).is_empty());
        assert!(registry.lookup_encoders(&avi(Encoding::AviDib, 16)).is_empty());
        assert!(CodecRegistry::new().lookup_encoders(&avi(Encoding::AviDib, 8)).is_empty());
    }

    #[test]
    fn test_first_registered_wins() {
        let mut registry = CodecRegistry::new();
        registry.register(|| Box::new(RawCodec::new()));
        registry.register(|| Box::new(DibCodec::new()));
        let any_video = FormatDescriptor::new().with_media_type(MediaType::Video);
        let found = registry.lookup_encoders(&any_video);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name(), "Raw Codec");
    }
}
