//! Per-track writer state

use crate::codec::{Codec, FrameBuffer, Palette};
use crate::format::FormatDescriptor;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Default key frame interval of video tracks
pub const DEFAULT_VIDEO_SYNC_INTERVAL: u32 = 30;
/// Default key frame interval of audio tracks
pub const DEFAULT_AUDIO_SYNC_INTERVAL: u32 = 1;

/// Codec binding of a track
///
/// A track starts `Unset`. The first write that needs a codec moves it to
/// `Bound` or `Failed`; a failed lookup is not retried.
pub(crate) enum CodecSlot {
    Unset,
    Bound(Box<dyn Codec>),
    Failed,
}

impl CodecSlot {
    pub(crate) fn get(&self) -> Option<&dyn Codec> {
        match self {
            CodecSlot::Bound(codec) => Some(codec.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Debug for CodecSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecSlot::Unset => f.write_str("Unset"),
            CodecSlot::Bound(codec) => write!(f, "Bound({})", codec.name()),
            CodecSlot::Failed => f.write_str("Failed"),
        }
    }
}

/// Media specific track state
#[derive(Debug, Clone)]
pub enum TrackKind {
    Video {
        depth: u32,
        /// Palette assumed before the first palette change of a 4-bit track
        palette: Option<Palette>,
        /// Last palette written to the stream
        previous_palette: Option<Palette>,
    },
    Audio,
}

/// A stream of the container and everything needed to write to it
#[derive(Debug)]
pub struct Track {
    pub(crate) format: FormatDescriptor,
    pub(crate) codec: CodecSlot,
    pub(crate) sync_interval: u32,
    pub(crate) sample_count: u64,
    /// Reused for every codec call; overwritten each time
    pub(crate) output: FrameBuffer,
    pub(crate) kind: TrackKind,
    /// Time scale and rate of the stream: a sample lasts `scale / rate` seconds
    pub(crate) scale: u32,
    pub(crate) rate: u32,
}

impl Track {
    pub(crate) fn video(format: FormatDescriptor, depth: u32, scale: u32, rate: u32) -> Self {
        let palette = (depth == 4).then(Palette::vga16);
        Track {
            format,
            codec: CodecSlot::Unset,
            sync_interval: DEFAULT_VIDEO_SYNC_INTERVAL,
            sample_count: 0,
            output: FrameBuffer::new(),
            kind: TrackKind::Video {
                depth,
                palette,
                previous_palette: None,
            },
            scale,
            rate,
        }
    }

    pub(crate) fn audio(format: FormatDescriptor, sample_rate: u32) -> Self {
        Track {
            format,
            codec: CodecSlot::Unset,
            sync_interval: DEFAULT_AUDIO_SYNC_INTERVAL,
            sample_count: 0,
            output: FrameBuffer::new(),
            kind: TrackKind::Audio,
            scale: 1,
            rate: sample_rate,
        }
    }

    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    pub fn kind(&self) -> &TrackKind {
        &self.kind
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn sync_interval(&self) -> u32 {
        self.sync_interval
    }

    /// Whether the next sample must be a key frame
    pub(crate) fn is_sync_sample(&self) -> bool {
        self.sync_interval != 0 && self.sample_count % self.sync_interval as u64 == 0
    }

    /// Compare `palette` with the one last written and build a palette change
    /// record if it differs or `keyframe` is set.
    ///
    /// Only 4 and 8 bit video tracks have palettes; everything else returns
    /// `None`. The record always covers the whole palette:
    ///
    /// ```text
    /// u8 first entry, u8 entry count (256 wraps to 0), u16 flags = 0,
    /// then red, green, blue, 0 per entry
    /// ```
    pub(crate) fn palette_change(&mut self, palette: &Palette, keyframe: bool) -> Option<Bytes> {
        let TrackKind::Video {
            depth,
            palette: default_palette,
            previous_palette,
        } = &mut self.kind
        else {
            return None;
        };
        if *depth != 4 && *depth != 8 {
            return None;
        }

        let max_entries = 1usize << *depth;
        let active = |p: &Palette| p.entries().iter().take(max_entries).copied().collect::<Vec<_>>();
        let entries = active(palette);
        let baseline = match (previous_palette.as_ref(), *depth) {
            (Some(previous), _) => Some(active(previous)),
            (None, 4) => default_palette.as_ref().map(active),
            (None, _) => None,
        };
        if !keyframe && baseline.as_ref() == Some(&entries) {
            return None;
        }

        let mut record = BytesMut::with_capacity(4 + entries.len() * 4);
        record.put_u8(0);
        record.put_u8(entries.len() as u8);
        record.put_u16_le(0);
        for c in &entries {
            record.put_slice(&[c.r, c.g, c.b, 0]);
        }
        *previous_palette = Some(palette.clone());
        Some(record.freeze())
    }
}
