use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};

use panorama_reel::config::ChromaKeyConfig;
use panorama_reel::video::{ChromaKey, Clip, Frame, PanClip};

fn panorama(width: u32, height: u32) -> Arc<RgbImage> {
    Arc::new(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn bench_pan_frame(c: &mut Criterion) {
    let mut pan = PanClip::new(panorama(9600, 1080), 50.0, (1920, 1080)).unwrap();
    let mut t = 0.0;

    c.bench_function("pan_frame_1080p", |b| {
        b.iter(|| {
            t = (t + 1.0 / 30.0) % 50.0;
            black_box(pan.frame_at(black_box(t)).unwrap())
        })
    });
}

fn bench_chroma_composite(c: &mut Criterion) {
    let key = ChromaKey::new(&ChromaKeyConfig::default());
    let overlay = Frame::new_filled(1920, 1080, [0, 255, 22]);
    let mut base = Frame::new_filled(1920, 1080, [30, 40, 50]);

    c.bench_function("chroma_composite_1080p", |b| {
        b.iter(|| key.composite_centered(black_box(&mut base), black_box(&overlay)))
    });
}

criterion_group!(benches, bench_pan_frame, bench_chroma_composite);
criterion_main!(benches);
