//! RIFF AVI output stream
//!
//! Layout written by [`AviOutputStream`]:
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'
//!     avih
//!     LIST 'strl' (per track)
//!       strh
//!       strf   BITMAPINFOHEADER (+ RGBQUAD palette) or WAVEFORMATEX
//!   LIST 'movi'
//!     NNdb | NNdc | NNwb | NNpc chunks
//!   idx1
//! ```
//!
//! Sizes that are unknown while streaming are written as placeholders and
//! patched by [`ChunkWriter::finish`].

use super::{
    AudioTrackParams, ChunkWriter, VideoTrackParams, AVIF_HASINDEX, AVIIF_KEYFRAME, AVIIF_NO_TIME,
    MAX_STREAM_SIZE,
};
use crate::codec::Palette;
use crate::error::{Error, Result};
use crate::util::stream_chunk_id;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

/// Entry of the idx1 chunk
#[derive(Debug, Clone)]
struct IndexEntry {
    chunk_id: [u8; 4],
    flags: u32,
    /// Offset of the chunk header from the 'movi' fourcc
    offset: u32,
    size: u32,
}

#[derive(Debug, Clone)]
enum StreamFormat {
    Video {
        params: VideoTrackParams,
        palette: Option<Palette>,
    },
    Audio(AudioTrackParams),
}

#[derive(Debug, Clone)]
struct OutputTrack {
    format: StreamFormat,
    /// Chunk type suffix, `db`, `dc` or `wb`
    chunk_type: [u8; 2],
    /// Samples written, in units of the time scale
    length: u64,
    max_chunk_size: u32,
    strh_length_pos: u64,
    strh_buffer_size_pos: u64,
}

impl OutputTrack {
    fn scale_and_rate(&self) -> (u32, u32) {
        match &self.format {
            StreamFormat::Video { params, .. } => (params.time_scale, params.rate),
            StreamFormat::Audio(params) => (params.time_scale, params.sample_rate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Started,
    Finished,
}

/// Writes an AVI RIFF file to a seekable output
pub struct AviOutputStream<W: Write + Seek> {
    writer: W,
    tracks: Vec<OutputTrack>,
    index: Vec<IndexEntry>,
    state: State,
    riff_start: u64,
    riff_size_pos: u64,
    movi_size_pos: u64,
    /// Position of the 'movi' fourcc, base of idx1 offsets
    movi_pos: u64,
    avih_max_bytes_pos: u64,
    avih_frames_pos: u64,
    avih_buffer_size_pos: u64,
}

impl AviOutputStream<BufWriter<File>> {
    /// Create (or truncate) a file for writing
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> AviOutputStream<W> {
    pub fn new(writer: W) -> Self {
        AviOutputStream {
            writer,
            tracks: Vec::new(),
            index: Vec::new(),
            state: State::Created,
            riff_start: 0,
            riff_size_pos: 0,
            movi_size_pos: 0,
            movi_pos: 0,
            avih_max_bytes_pos: 0,
            avih_frames_pos: 0,
            avih_buffer_size_pos: 0,
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Finish the file if needed and hand back the output
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.writer)
    }

    fn add_track(&mut self, format: StreamFormat, chunk_type: [u8; 2]) -> Result<usize> {
        if self.state != State::Created {
            return Err(Error::invalid_state("Cannot add a track after the file has started"));
        }
        if self.tracks.len() >= 100 {
            return Err(Error::invalid_state("AVI files hold at most 100 tracks"));
        }
        self.tracks.push(OutputTrack {
            format,
            chunk_type,
            length: 0,
            max_chunk_size: 0,
            strh_length_pos: 0,
            strh_buffer_size_pos: 0,
        });
        Ok(self.tracks.len() - 1)
    }

    fn check_writable(&self, track: usize) -> Result<()> {
        if self.state == State::Finished {
            return Err(Error::invalid_state("The file has been finished"));
        }
        if track >= self.tracks.len() {
            return Err(Error::invalid_input(format!("Invalid track index {}", track)));
        }
        Ok(())
    }

    /// Write a size placeholder and return its position
    fn size_placeholder(&mut self) -> Result<u64> {
        let pos = self.writer.stream_position()?;
        self.writer.write_u32::<LittleEndian>(0)?;
        Ok(pos)
    }

    /// Patch the size at `size_pos` with the bytes written after it
    fn fill_size(&mut self, size_pos: u64) -> Result<()> {
        let current = self.writer.stream_position()?;
        let size = checked_u32(current - size_pos - 4)?;
        self.patch_u32(size_pos, size)?;
        self.writer.seek(SeekFrom::Start(current))?;
        Ok(())
    }

    fn patch_u32(&mut self, pos: u64, value: u32) -> Result<()> {
        self.writer.seek(SeekFrom::Start(pos))?;
        self.writer.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    fn write_main_header(&mut self) -> Result<()> {
        let video = self.tracks.iter().find_map(|t| match &t.format {
            StreamFormat::Video { params, .. } => Some(params.clone()),
            StreamFormat::Audio(_) => None,
        });
        let (micro_sec_per_frame, width, height) = match &video {
            Some(v) if v.rate > 0 => (
                checked_u32(1_000_000u64 * v.time_scale as u64 / v.rate as u64)?,
                v.width,
                v.height,
            ),
            Some(v) => (0, v.width, v.height),
            None => (0, 0, 0),
        };

        let w = &mut self.writer;
        w.write_all(b"avih")?;
        w.write_u32::<LittleEndian>(56)?;
        w.write_u32::<LittleEndian>(micro_sec_per_frame)?;
        self.avih_max_bytes_pos = w.stream_position()?;
        w.write_u32::<LittleEndian>(0)?; // max bytes per sec
        w.write_u32::<LittleEndian>(0)?; // padding granularity
        w.write_u32::<LittleEndian>(AVIF_HASINDEX)?;
        self.avih_frames_pos = w.stream_position()?;
        w.write_u32::<LittleEndian>(0)?; // total frames
        w.write_u32::<LittleEndian>(0)?; // initial frames
        w.write_u32::<LittleEndian>(self.tracks.len() as u32)?;
        self.avih_buffer_size_pos = w.stream_position()?;
        w.write_u32::<LittleEndian>(0)?; // suggested buffer size
        w.write_u32::<LittleEndian>(width)?;
        w.write_u32::<LittleEndian>(height)?;
        for _ in 0..4 {
            w.write_u32::<LittleEndian>(0)?; // reserved
        }
        Ok(())
    }

    fn write_stream_list(&mut self, track: usize) -> Result<()> {
        self.writer.write_all(b"LIST")?;
        let list_size_pos = self.size_placeholder()?;
        self.writer.write_all(b"strl")?;

        let format = self.tracks[track].format.clone();
        let (scale, rate) = self.tracks[track].scale_and_rate();
        let w = &mut self.writer;

        w.write_all(b"strh")?;
        w.write_u32::<LittleEndian>(56)?;
        match &format {
            StreamFormat::Video { params, .. } => {
                w.write_all(b"vids")?;
                w.write_all(&params.encoding.fourcc())?;
            }
            StreamFormat::Audio(_) => {
                w.write_all(b"auds")?;
                w.write_u32::<LittleEndian>(0)?;
            }
        }
        w.write_u32::<LittleEndian>(0)?; // flags
        w.write_u16::<LittleEndian>(0)?; // priority
        w.write_u16::<LittleEndian>(0)?; // language
        w.write_u32::<LittleEndian>(0)?; // initial frames
        w.write_u32::<LittleEndian>(scale)?;
        w.write_u32::<LittleEndian>(rate)?;
        w.write_u32::<LittleEndian>(0)?; // start
        let strh_length_pos = w.stream_position()?;
        w.write_u32::<LittleEndian>(0)?; // length
        let strh_buffer_size_pos = w.stream_position()?;
        w.write_u32::<LittleEndian>(0)?; // suggested buffer size
        w.write_i32::<LittleEndian>(-1)?; // quality: driver default
        match &format {
            StreamFormat::Video { params, .. } => {
                w.write_u32::<LittleEndian>(0)?; // sample size
                w.write_i16::<LittleEndian>(0)?;
                w.write_i16::<LittleEndian>(0)?;
                w.write_i16::<LittleEndian>(params.width.min(i16::MAX as u32) as i16)?;
                w.write_i16::<LittleEndian>(params.height.min(i16::MAX as u32) as i16)?;
            }
            StreamFormat::Audio(params) => {
                // Compressed audio has variable sized samples
                let sample_size = if params.compressed { 0 } else { params.frame_size };
                w.write_u32::<LittleEndian>(sample_size)?;
                w.write_u64::<LittleEndian>(0)?; // rcFrame
            }
        }

        w.write_all(b"strf")?;
        match &format {
            StreamFormat::Video { params, palette } => {
                let colors = match (params.depth, palette) {
                    (1..=8, Some(p)) => p.rgbs(1 << params.depth),
                    _ => Vec::new(),
                };
                w.write_u32::<LittleEndian>(40 + 4 * colors.len() as u32)?;
                w.write_u32::<LittleEndian>(40)?; // biSize
                w.write_u32::<LittleEndian>(params.width)?;
                w.write_u32::<LittleEndian>(params.height)?; // positive: bottom-up
                w.write_u16::<LittleEndian>(1)?; // planes
                w.write_u16::<LittleEndian>(params.depth as u16)?;
                if params.encoding.is_uncompressed_video() {
                    w.write_u32::<LittleEndian>(0)?; // BI_RGB
                } else {
                    w.write_all(&params.encoding.fourcc())?;
                }
                let stride = (params.width as u64 * params.depth as u64).div_ceil(32) * 4;
                w.write_u32::<LittleEndian>(checked_u32(stride * params.height as u64)?)?;
                w.write_u32::<LittleEndian>(0)?; // x pels per meter
                w.write_u32::<LittleEndian>(0)?; // y pels per meter
                w.write_u32::<LittleEndian>(colors.len() as u32)?;
                w.write_u32::<LittleEndian>(0)?; // colors important
                for c in &colors {
                    w.write_all(&[c.b, c.g, c.r, 0])?;
                }
            }
            StreamFormat::Audio(params) => {
                w.write_u32::<LittleEndian>(18)?;
                w.write_u16::<LittleEndian>(params.format_tag)?;
                w.write_u16::<LittleEndian>(params.channels)?;
                w.write_u32::<LittleEndian>(params.sample_rate)?;
                w.write_u32::<LittleEndian>(params.sample_rate.saturating_mul(params.frame_size))?;
                w.write_u16::<LittleEndian>(params.frame_size.min(u16::MAX as u32) as u16)?;
                w.write_u16::<LittleEndian>(params.sample_size_in_bits)?;
                w.write_u16::<LittleEndian>(0)?; // cbSize
            }
        }

        self.tracks[track].strh_length_pos = strh_length_pos;
        self.tracks[track].strh_buffer_size_pos = strh_buffer_size_pos;
        self.fill_size(list_size_pos)
    }

    fn write_chunk(&mut self, chunk_id: [u8; 4], data: &[u8], flags: u32) -> Result<()> {
        let offset = checked_u32(self.writer.stream_position()? - self.movi_pos)?;
        let size = checked_u32(data.len() as u64)?;
        self.writer.write_all(&chunk_id)?;
        self.writer.write_u32::<LittleEndian>(size)?;
        self.writer.write_all(data)?;
        if size % 2 == 1 {
            self.writer.write_u8(0)?;
        }
        self.index.push(IndexEntry {
            chunk_id,
            flags,
            offset,
            size,
        });
        Ok(())
    }

    fn write_index(&mut self) -> Result<()> {
        self.writer.write_all(b"idx1")?;
        let size = checked_u32(self.index.len() as u64 * 16)?;
        self.writer.write_u32::<LittleEndian>(size)?;
        for entry in &self.index {
            self.writer.write_all(&entry.chunk_id)?;
            self.writer.write_u32::<LittleEndian>(entry.flags)?;
            self.writer.write_u32::<LittleEndian>(entry.offset)?;
            self.writer.write_u32::<LittleEndian>(entry.size)?;
        }
        Ok(())
    }
}

impl<W: Write + Seek> ChunkWriter for AviOutputStream<W> {
    fn add_video_track(&mut self, params: VideoTrackParams) -> Result<usize> {
        let chunk_type = if params.encoding.is_uncompressed_video() {
            *b"db"
        } else {
            *b"dc"
        };
        let palette = match params.depth {
            4 => Some(Palette::vga16()),
            1..=8 => Some(Palette::grayscale(params.depth)),
            _ => None,
        };
        self.add_track(StreamFormat::Video { params, palette }, chunk_type)
    }

    fn add_audio_track(&mut self, params: AudioTrackParams) -> Result<usize> {
        self.add_track(StreamFormat::Audio(params), *b"wb")
    }

    fn set_palette(&mut self, track: usize, palette: &Palette) -> Result<()> {
        if self.state != State::Created {
            return Err(Error::invalid_state("The stream format is already written"));
        }
        match self.tracks.get_mut(track).map(|t| &mut t.format) {
            Some(StreamFormat::Video { palette: p, .. }) => {
                *p = Some(palette.clone());
                Ok(())
            }
            Some(StreamFormat::Audio(_)) => Err(Error::invalid_input("Audio tracks have no palette")),
            None => Err(Error::invalid_input(format!("Invalid track index {}", track))),
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        match self.state {
            State::Started => return Ok(()),
            State::Finished => return Err(Error::invalid_state("The file has been finished")),
            State::Created => {}
        }
        if self.tracks.is_empty() {
            return Err(Error::invalid_state("No tracks added"));
        }

        self.riff_start = self.writer.stream_position()?;
        self.writer.write_all(b"RIFF")?;
        self.riff_size_pos = self.size_placeholder()?;
        self.writer.write_all(b"AVI ")?;

        self.writer.write_all(b"LIST")?;
        let hdrl_size_pos = self.size_placeholder()?;
        self.writer.write_all(b"hdrl")?;
        self.write_main_header()?;
        for track in 0..self.tracks.len() {
            self.write_stream_list(track)?;
        }
        self.fill_size(hdrl_size_pos)?;

        self.writer.write_all(b"LIST")?;
        self.movi_size_pos = self.size_placeholder()?;
        self.movi_pos = self.writer.stream_position()?;
        self.writer.write_all(b"movi")?;

        self.state = State::Started;
        debug!("AVI header written for {} tracks", self.tracks.len());
        Ok(())
    }

    fn write_samples(&mut self, track: usize, count: u32, data: &[u8], keyframe: bool) -> Result<()> {
        self.check_writable(track)?;
        self.ensure_started()?;
        let chunk_type = self.tracks[track].chunk_type;
        let chunk_id = stream_chunk_id(track, &chunk_type);
        let flags = if keyframe { AVIIF_KEYFRAME } else { 0 };
        self.write_chunk(chunk_id, data, flags)?;

        let t = &mut self.tracks[track];
        t.length += count as u64;
        t.max_chunk_size = t.max_chunk_size.max(data.len() as u32);
        Ok(())
    }

    fn write_palette(&mut self, track: usize, data: &[u8], keyframe: bool) -> Result<()> {
        self.check_writable(track)?;
        if !matches!(self.tracks[track].format, StreamFormat::Video { .. }) {
            return Err(Error::invalid_input("Palette changes need a video track"));
        }
        self.ensure_started()?;
        let chunk_id = stream_chunk_id(track, b"pc");
        let flags = AVIIF_NO_TIME | if keyframe { AVIIF_KEYFRAME } else { 0 };
        self.write_chunk(chunk_id, data, flags)
    }

    fn media_duration(&self, track: usize) -> u64 {
        self.tracks.get(track).map_or(0, |t| match &t.format {
            StreamFormat::Video { .. } => t.length,
            StreamFormat::Audio(params) => t.length * params.frame_duration.max(1) as u64,
        })
    }

    fn relative_stream_position(&mut self) -> Result<u64> {
        if self.state == State::Created {
            return Ok(0);
        }
        Ok(self.writer.stream_position()? - self.riff_start)
    }

    fn finish(&mut self) -> Result<()> {
        match self.state {
            State::Finished => return Ok(()),
            State::Created => self.ensure_started()?,
            State::Started => {}
        }

        self.fill_size(self.movi_size_pos)?;
        self.write_index()?;
        let end = self.writer.stream_position()?;
        if end - self.riff_start > MAX_STREAM_SIZE {
            return Err(Error::SizeLimit {
                size: end - self.riff_start,
                limit: MAX_STREAM_SIZE,
            });
        }
        self.fill_size(self.riff_size_pos)?;

        let (total_frames, max_bytes_per_sec) = self
            .tracks
            .iter()
            .find_map(|t| match &t.format {
                StreamFormat::Video { params, .. } => {
                    Some((t.length, t.max_chunk_size.saturating_mul(params.fps)))
                }
                StreamFormat::Audio(_) => None,
            })
            .unwrap_or((0, 0));
        self.patch_u32(self.avih_max_bytes_pos, max_bytes_per_sec)?;
        self.patch_u32(self.avih_frames_pos, checked_u32(total_frames)?)?;
        let max_chunk = self.tracks.iter().map(|t| t.max_chunk_size).max().unwrap_or(0);
        self.patch_u32(self.avih_buffer_size_pos, max_chunk)?;

        let patches: Vec<_> = self
            .tracks
            .iter()
            .map(|t| (t.strh_length_pos, t.length, t.strh_buffer_size_pos, t.max_chunk_size))
            .collect();
        for (length_pos, length, buffer_pos, max_chunk_size) in patches {
            self.patch_u32(length_pos, checked_u32(length)?)?;
            self.patch_u32(buffer_pos, max_chunk_size)?;
        }

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        self.state = State::Finished;
        debug!("AVI finished: {} index entries, {} bytes", self.index.len(), end - self.riff_start);
        Ok(())
    }
}

fn checked_u32(size: u64) -> Result<u32> {
    u32::try_from(size).map_err(|_| Error::SizeLimit {
        size,
        limit: MAX_STREAM_SIZE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Encoding;
    use std::io::Cursor;

    fn video_params(encoding: Encoding, depth: u32) -> VideoTrackParams {
        VideoTrackParams {
            encoding,
            time_scale: 1,
            rate: 10,
            width: 4,
            height: 2,
            depth,
            fps: 10,
        }
    }

    fn u32_at(data: &[u8], pos: usize) -> u32 {
        u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
    }

    fn find(data: &[u8], tag: &[u8; 4]) -> Option<usize> {
        data.windows(4).position(|w| w == tag)
    }

    #[test]
    fn test_no_tracks_cannot_start() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        assert!(matches!(out.ensure_started(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_tracks_only_before_start() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        out.add_video_track(video_params(Encoding::AviDib, 24)).unwrap();
        out.ensure_started().unwrap();
        assert!(out.add_video_track(video_params(Encoding::AviDib, 24)).is_err());
        assert!(out.set_palette(0, &Palette::vga16()).is_err());
    }

    #[test]
    fn test_chunk_ids_and_index() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        assert_eq!(out.add_video_track(video_params(Encoding::AviDib, 8)).unwrap(), 0);
        assert_eq!(out.add_video_track(video_params(Encoding::AviMjpg, 24)).unwrap(), 1);
        out.write_palette(0, &[0, 1, 0, 0, 9, 9, 9, 0], true).unwrap();
        out.write_sample(0, &[1, 2, 3], false).unwrap();
        out.write_sample(1, &[4, 5], true).unwrap();
        assert_eq!(out.media_duration(0), 1);

        let data = out.into_inner().unwrap().into_inner();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(u32_at(&data, 4) as usize, data.len() - 8);
        assert_eq!(&data[8..12], b"AVI ");

        let movi = find(&data, b"movi").unwrap();
        assert_eq!(&data[movi + 4..movi + 8], b"00pc");
        let idx1 = find(&data, b"idx1").unwrap();
        assert_eq!(u32_at(&data, movi - 4) as usize, idx1 - movi);
        assert_eq!(u32_at(&data, idx1 + 4), 48);

        let entry = |i: usize| idx1 + 8 + i * 16;
        assert_eq!(&data[entry(0)..entry(0) + 4], b"00pc");
        assert_eq!(u32_at(&data, entry(0) + 4), AVIIF_NO_TIME | AVIIF_KEYFRAME);
        assert_eq!(u32_at(&data, entry(0) + 8), 4);
        assert_eq!(&data[entry(1)..entry(1) + 4], b"00db");
        assert_eq!(u32_at(&data, entry(1) + 4), 0);
        // 8 byte header, 3 bytes of data, 1 byte of padding
        assert_eq!(u32_at(&data, entry(2) + 8), u32_at(&data, entry(1) + 8) + 12);
        assert_eq!(&data[entry(2)..entry(2) + 4], b"01dc");
        assert_eq!(u32_at(&data, entry(2) + 4), AVIIF_KEYFRAME);
    }

    #[test]
    fn test_header_patching() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        out.add_video_track(video_params(Encoding::AviDib, 24)).unwrap();
        for _ in 0..3 {
            out.write_sample(0, &[0; 24], true).unwrap();
        }
        let data = out.into_inner().unwrap().into_inner();

        let avih = find(&data, b"avih").unwrap();
        assert_eq!(u32_at(&data, avih + 8), 100_000);
        assert_eq!(u32_at(&data, avih + 8 + 4), 24 * 10);
        assert_eq!(u32_at(&data, avih + 8 + 16), 3);
        let strh = find(&data, b"strh").unwrap();
        assert_eq!(&data[strh + 8..strh + 12], b"vids");
        assert_eq!(&data[strh + 12..strh + 16], b"DIB ");
        assert_eq!(u32_at(&data, strh + 8 + 32), 3);
        let strf = find(&data, b"strf").unwrap();
        assert_eq!(u32_at(&data, strf + 4), 40);
        assert_eq!(u32_at(&data, strf + 8 + 16), 0);
    }

    #[test]
    fn test_palette_in_stream_format() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        out.add_video_track(video_params(Encoding::AviDib, 4)).unwrap();
        let palette = Palette::from_rgb_values(&[0x112233]).unwrap();
        out.set_palette(0, &palette).unwrap();
        let data = out.into_inner().unwrap().into_inner();

        let strf = find(&data, b"strf").unwrap();
        assert_eq!(u32_at(&data, strf + 4), 40 + 16 * 4);
        assert_eq!(u32_at(&data, strf + 8 + 32), 16);
        assert_eq!(&data[strf + 48..strf + 52], &[0x33, 0x22, 0x11, 0]);
    }

    #[test]
    fn test_audio_stream_format() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        out.add_audio_track(AudioTrackParams {
            format_tag: 1,
            time_scale: 1,
            sample_rate: 8000,
            channels: 2,
            sample_size_in_bits: 16,
            compressed: false,
            frame_duration: 1,
            frame_size: 4,
        })
        .unwrap();
        out.write_samples(0, 10, &[0; 40], true).unwrap();
        assert_eq!(out.media_duration(0), 10);
        let data = out.into_inner().unwrap().into_inner();

        let strf = find(&data, b"strf").unwrap();
        assert_eq!(u32_at(&data, strf + 4), 18);
        assert_eq!(u32_at(&data, strf + 12), 8000);
        assert_eq!(u32_at(&data, strf + 16), 32000);
        assert!(find(&data, b"00wb").is_some());
        let strh = find(&data, b"strh").unwrap();
        assert_eq!(u32_at(&data, strh + 8 + 44), 4);
    }

    #[test]
    fn test_compressed_audio_has_no_sample_size() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        out.add_audio_track(AudioTrackParams {
            format_tag: 0x0055,
            time_scale: 1,
            sample_rate: 44100,
            channels: 2,
            sample_size_in_bits: 16,
            compressed: true,
            frame_duration: 1152,
            frame_size: 4,
        })
        .unwrap();
        out.write_samples(0, 1, &[0; 417], true).unwrap();
        assert_eq!(out.media_duration(0), 1152);
        let data = out.into_inner().unwrap().into_inner();

        let strh = find(&data, b"strh").unwrap();
        assert_eq!(&data[strh + 8..strh + 12], b"auds");
        assert_eq!(u32_at(&data, strh + 8 + 44), 0);
    }

    #[test]
    fn test_writes_after_finish_fail() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        out.add_video_track(video_params(Encoding::AviDib, 24)).unwrap();
        out.finish().unwrap();
        out.finish().unwrap();
        assert!(matches!(out.write_sample(0, &[0], true), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_invalid_track() {
        let mut out = AviOutputStream::new(Cursor::new(Vec::new()));
        out.add_video_track(video_params(Encoding::AviDib, 24)).unwrap();
        assert!(matches!(out.write_sample(3, &[0], true), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_relative_stream_position() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_all(&[0xaa; 10]).unwrap();
        let mut out = AviOutputStream::new(cursor);
        out.add_video_track(video_params(Encoding::AviDib, 24)).unwrap();
        assert_eq!(out.relative_stream_position().unwrap(), 0);
        out.ensure_started().unwrap();
        let before = out.relative_stream_position().unwrap();
        out.write_sample(0, &[0; 6], true).unwrap();
        assert_eq!(out.relative_stream_position().unwrap(), before + 14);
    }
}
