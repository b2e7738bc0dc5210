use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ear::EnvironmentBuilder;

fn make_entries(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("VAR_{}=/usr/local/lib/value/{}", i, i).into_bytes())
        .collect()
}

fn bench_build(c: &mut Criterion) {
    for count in [16, 128, 1024] {
        let entries = make_entries(count);
        c.bench_function(&format!("build_env_append_{}", count), |b| {
            b.iter(|| {
                let mut builder =
                    EnvironmentBuilder::new(black_box(&entries).iter().map(Vec::as_slice));
                builder.set_wrapper(b"/opt/ear/wrapper").unwrap();
                builder.set_target(b"/tmp/ear-target").unwrap();
                builder.set_library(b"/usr/lib/libear.so").unwrap();
                builder.build().unwrap()
            })
        });
    }

    // Every distinguished key already present: replace in place.
    {
        let mut entries = make_entries(128);
        entries.insert(10, b"WRAPPER_PATH=/old/wrapper".to_vec());
        entries.insert(50, b"TARGET_PATH=/old/target".to_vec());
        c.bench_function("build_env_replace_128", |b| {
            b.iter(|| {
                let mut builder =
                    EnvironmentBuilder::new(black_box(&entries).iter().map(Vec::as_slice));
                builder.set_wrapper(b"/opt/ear/wrapper").unwrap();
                builder.set_target(b"/tmp/ear-target").unwrap();
                builder.build().unwrap()
            })
        });
    }
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
