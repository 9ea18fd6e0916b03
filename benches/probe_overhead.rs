/// Probe Overhead Benchmarks
///
/// Measures the cost of reading the stack pointer register, of resolving
/// the thread stack region, and of rendering a report.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stackprobe::probe::{read_stack_pointer, StackPointer};
use stackprobe::report::ProbeReport;
use stackprobe::stack_region::StackRegion;

fn bench_read_stack_pointer(c: &mut Criterion) {
    c.bench_function("read_stack_pointer", |b| {
        b.iter(|| black_box(read_stack_pointer()))
    });
}

fn bench_region_lookup(c: &mut Criterion) {
    c.bench_function("stack_region_current_thread", |b| {
        b.iter(|| black_box(StackRegion::current_thread().ok()))
    });
}

fn bench_text_render(c: &mut Criterion) {
    let report = ProbeReport::from_parts(vec![StackPointer::new(0x7ffd5e8c1a30); 16], None, None);
    c.bench_function("render_text_16_samples", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(512);
            report.write_text(&mut out).ok();
            black_box(out)
        })
    });
}

criterion_group!(
    benches,
    bench_read_stack_pointer,
    bench_region_lookup,
    bench_text_render
);
criterion_main!(benches);
