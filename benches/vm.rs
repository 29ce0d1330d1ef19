mod common;

use chi2lang::asm::Assembly;
use chi2lang::vm::{self, VM};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_vm(c: &mut Criterion) {
    let source = common::long_source(50);
    let assembly = chi2lang::compile_source(&source).expect("compile");
    let text = assembly.to_string();

    c.bench_function("vm_parse_assembly", |b| {
        b.iter(|| {
            let out: Assembly = black_box(&text).parse().expect("parse assembly");
            black_box(out);
        })
    });

    c.bench_function("vm_link_only", |b| {
        b.iter(|| {
            let out = vm::link(black_box(&assembly)).expect("link");
            black_box(out);
        })
    });

    c.bench_function("vm_execute_linked", |b| {
        let executable = vm::link(&assembly).expect("link");
        let vm = VM::new();
        b.iter(|| {
            let state = vm.run(black_box(&executable)).expect("run");
            black_box(state);
        })
    });

    c.bench_function("vm_total_from_text", |b| {
        let vm = VM::new();
        b.iter(|| {
            let state = vm.run_text(black_box(&text)).expect("run text");
            black_box(state);
        })
    });
}

criterion_group!(benches, bench_vm);
criterion_main!(benches);
