//! strlcpy benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use portshim_core::string;
use portshim_membrane::SafetyLevel;
use portshim_membrane::config::set_safety_level;

const SIZES: &[usize] = &[16, 64, 256, 1024, 4096];

fn source(len: usize) -> Vec<u8> {
    let mut s = vec![b'A'; len];
    s.push(0);
    s
}

fn bench_strlcpy_core(c: &mut Criterion) {
    let mut group = c.benchmark_group("strlcpy_core");

    for &size in SIZES {
        let src = source(size);
        group.throughput(Throughput::Bytes(size as u64));

        // Destination large enough to hold the whole string.
        group.bench_with_input(BenchmarkId::new("fits", size), &size, |b, &sz| {
            let mut dst = vec![0u8; sz + 1];
            b.iter(|| black_box(string::strlcpy(&mut dst, black_box(&src))));
        });

        // Destination of half the length: truncated copy, full-length scan.
        group.bench_with_input(BenchmarkId::new("truncated", size), &size, |b, &sz| {
            let mut dst = vec![0u8; sz / 2];
            b.iter(|| black_box(string::strlcpy(&mut dst, black_box(&src))));
        });
    }
    group.finish();
}

fn bench_strlcpy_abi_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("strlcpy_abi");

    for level in [SafetyLevel::Off, SafetyLevel::Strict, SafetyLevel::Hardened] {
        set_safety_level(level);
        for &size in SIZES {
            let src = source(size);
            let mut dst = vec![0u8; size + 1];
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(level.as_str(), size), &size, |b, _| {
                b.iter(|| {
                    // SAFETY: src is NUL-terminated; dst holds size + 1 bytes.
                    let ret = unsafe {
                        portshim_abi::string_abi::strlcpy(
                            dst.as_mut_ptr().cast(),
                            src.as_ptr().cast(),
                            dst.len(),
                        )
                    };
                    black_box(ret)
                });
            });
        }
    }
    set_safety_level(SafetyLevel::Strict);
    group.finish();
}

criterion_group!(benches, bench_strlcpy_core, bench_strlcpy_abi_modes);
criterion_main!(benches);
