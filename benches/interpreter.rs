mod common;

use std::io;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use plc::backend::interpreter::Interpreter;

fn bench_interpreter(c: &mut Criterion) {
    for (label, input) in common::workloads("interpreter") {
        let source = common::load_source(&label, &input);

        c.bench_function(&format!("backend_interpreter_total_{label}"), |b| {
            b.iter(|| {
                let mut interpreter = Interpreter::with_output(io::sink());
                let result = interpreter.run(black_box(&source)).expect("run");
                black_box(result);
            })
        });
    }
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
