use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use vtf::*;

/// A smooth image with some noise, closer to real textures than pure noise.
fn test_image(width: u32, height: u32) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(123456789);
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let noise: u8 = rng.gen_range(0..16);
            out.extend_from_slice(&[
                (x * 255 / width) as u8 ^ noise,
                (y * 255 / height) as u8,
                ((x + y) * 127 / (width + height)) as u8 + noise,
                if (x / 8 + y / 8) % 2 == 0 { 255 } else { 64 },
            ]);
        }
    }
    out
}

fn bench_format(c: &mut Criterion, format: ImageFormat) {
    let size = Size::new(256, 256);
    let rgba = test_image(size.width, size.height);

    c.bench_function(&format!("encode {:?} {}x{}", format, size.width, size.height), |b| {
        b.iter(|| {
            let result = encode_from_rgba(black_box(&rgba), format, size.width, size.height);
            black_box(result).unwrap();
        });
    });
}

fn bench_file(c: &mut Criterion) {
    let surface = Surface::new(512, 512, test_image(512, 512)).unwrap();
    let image = DecodedImage::from_surface(surface).unwrap();

    for parallel in [false, true] {
        let mut options = EncodeOptions::default();
        options.format = ImageFormat::DXT1;
        options.parallel = parallel;
        let name = format!("encode DXT1 512x512 file with mipmaps (parallel: {parallel})");
        c.bench_function(&name, |b| {
            b.iter(|| black_box(encode(black_box(&image), &options)).unwrap());
        });
    }
}

pub fn encode_benchmark(c: &mut Criterion) {
    for format in [
        ImageFormat::RGBA8888,
        ImageFormat::BGRA4444,
        ImageFormat::RGBA16161616F,
        ImageFormat::DXT1,
        ImageFormat::DXT1_ONEBITALPHA,
        ImageFormat::DXT3,
        ImageFormat::DXT5,
        ImageFormat::ATI2N,
    ] {
        bench_format(c, format);
    }
    bench_file(c);
}

criterion_group!(benches, encode_benchmark);
criterion_main!(benches);
