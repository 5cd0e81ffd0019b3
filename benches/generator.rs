mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use plc::backend::generator::Generator;

fn bench_generator(c: &mut Criterion) {
    for (label, input) in common::workloads("generator") {
        let source = common::load_source(&label, &input);
        let annotations = plc::analyze(&source).expect("analyze");

        c.bench_function(&format!("backend_generator_emit_{label}"), |b| {
            let generator = Generator::new(&annotations);
            b.iter(|| {
                let output = generator.generate(black_box(&source)).expect("generate");
                black_box(output);
            })
        });
    }
}

criterion_group!(benches, bench_generator);
criterion_main!(benches);
