mod common;

use chi2lang::compiler;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_compiler(c: &mut Criterion) {
    for (label, source) in common::workloads() {
        let tree = common::load_tree(&source);

        c.bench_function(&format!("compiler_emit_{label}"), |b| {
            b.iter(|| {
                let out = compiler::compile(black_box(&tree)).expect("compile");
                black_box(out);
            })
        });

        c.bench_function(&format!("compiler_render_{label}"), |b| {
            let assembly = compiler::compile(&tree).expect("compile");
            b.iter(|| black_box(black_box(&assembly).to_string()))
        });

        c.bench_function(&format!("compiler_total_{label}"), |b| {
            b.iter(|| {
                let out = chi2lang::compile_source(black_box(&source)).expect("compile");
                black_box(out);
            })
        });
    }
}

criterion_group!(benches, bench_compiler);
criterion_main!(benches);
