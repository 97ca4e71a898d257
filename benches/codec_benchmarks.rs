//! Pixel codec performance benchmarks
//!
//! Benchmarks for DIB and raw scanline packing and for whole-frame AVI writes

use std::io::Cursor;

use avimux::codec::{Codec, CodecRegistry, DibCodec, FrameBuffer, Image, Palette, RawCodec};
use avimux::format::avi::{self, AviOutputStream, AviWriter};
use avimux::format::{Encoding, FormatDescriptor};
use avimux::util::Rational;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SIZES: [(usize, usize); 3] = [(320, 240), (640, 480), (1280, 720)];

/// Create an indexed test image with a diagonal pattern
fn create_indexed_image(width: usize, height: usize) -> Image {
    let pixels = (0..width * height)
        .map(|i| ((i % width) + (i / width)) as u8)
        .collect();
    Image::indexed(width, height, pixels, Palette::grayscale(8)).expect("valid image")
}

/// Create a true color test image with a gradient
fn create_rgb_image(width: usize, height: usize) -> Image {
    let pixels = (0..width * height)
        .map(|i| {
            let (x, y) = ((i % width) as u32, (i / width) as u32);
            ((x & 0xff) << 16) | ((y & 0xff) << 8) | ((x + y) & 0xff)
        })
        .collect();
    Image::rgb(width, height, pixels).expect("valid image")
}

fn dib_codec(depth: u32) -> DibCodec {
    let mut codec = DibCodec::new();
    codec
        .set_output_format(FormatDescriptor::new().with_encoding(Encoding::AviDib).with_depth(depth))
        .expect("supported depth");
    codec
}

/// Benchmark DIB packing at 8 and 24 bits
fn bench_dib_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("dib_encode");

    for &(width, height) in &SIZES {
        group.throughput(Throughput::Elements((width * height) as u64));

        let indexed = FrameBuffer::from_image(create_indexed_image(width, height));
        group.bench_with_input(
            BenchmarkId::new("depth8", format!("{}x{}", width, height)),
            &indexed,
            |b, input| {
                let mut codec = dib_codec(8);
                let mut output = FrameBuffer::new();
                b.iter(|| black_box(codec.process(black_box(input), &mut output)));
            },
        );

        let rgb = FrameBuffer::from_image(create_rgb_image(width, height));
        group.bench_with_input(
            BenchmarkId::new("depth24", format!("{}x{}", width, height)),
            &rgb,
            |b, input| {
                let mut codec = dib_codec(24);
                let mut output = FrameBuffer::new();
                b.iter(|| black_box(codec.process(black_box(input), &mut output)));
            },
        );
    }

    group.finish();
}

/// Benchmark top-down raw packing at 24 bits
fn bench_raw_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_encode");

    for &(width, height) in &SIZES {
        group.throughput(Throughput::Elements((width * height) as u64));
        let input = FrameBuffer::from_image(create_rgb_image(width, height));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &input,
            |b, input| {
                let mut codec = RawCodec::new();
                let mut output = FrameBuffer::new();
                b.iter(|| black_box(codec.process(black_box(input), &mut output)));
            },
        );
    }

    group.finish();
}

/// Benchmark writing indexed frames with palette tracking into memory
fn bench_avi_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("avi_write");
    let registry = CodecRegistry::with_defaults();

    for &(width, height) in &SIZES {
        group.throughput(Throughput::Bytes((width * height) as u64));
        let image = create_indexed_image(width, height);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &image,
            |b, image| {
                b.iter(|| {
                    let mut writer = AviWriter::new(AviOutputStream::new(Cursor::new(Vec::new())), &registry);
                    let track = writer
                        .add_track(
                            avi::video_raw()
                                .with_width(width as u32)
                                .with_height(height as u32)
                                .with_depth(8)
                                .with_frame_rate(Rational::new(30, 1)),
                        )
                        .expect("valid track");
                    for _ in 0..10 {
                        writer.write_image(track, image, 1).expect("frame written");
                    }
                    black_box(writer.into_inner().expect("finished"));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_dib_encode, bench_raw_encode, bench_avi_write);
criterion_main!(benches);
