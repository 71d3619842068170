//! Benchmark classification and handler dispatch throughput
//!
//! Measures the classifier alone, single-instruction dispatch per category,
//! and whole-method preparation, sequential and parallel.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dexsimplify::{
    classify, prepare_method, prepare_methods, Instruction, MethodBody, OpHandlerFactory, Opcode,
    Operand, SimplifyConfig, VmContext,
};
use dexsimplify::config::DiagnosticPolicy;
use std::sync::Arc;
use std::time::Duration;

fn context() -> VmContext {
    let config = SimplifyConfig {
        unimplemented_policy: DiagnosticPolicy::Ignore,
        not_wired_policy: DiagnosticPolicy::Ignore,
        fold_constants: true,
        ..Default::default()
    };
    VmContext::new("LBench;->run()V", Arc::new(config))
}

fn regs(rs: &[u16]) -> Vec<Operand> {
    rs.iter().map(|&r| Operand::Register(r)).collect()
}

/// A method body mixing every category
fn build_method(len: usize) -> Vec<Instruction> {
    (0..len)
        .map(|i| match i % 5 {
            0 => Instruction::new(
                Opcode::Const16,
                [Operand::Register(0), Operand::Literal(i as i64 % 1000)],
            ),
            1 => Instruction::new(Opcode::AddInt, regs(&[1, 0, 0])),
            2 => Instruction::new(
                Opcode::MulIntLit8,
                [Operand::Register(2), Operand::Register(1), Operand::Literal(3)],
            ),
            3 => {
                Instruction::new(Opcode::IfEqz, [Operand::Register(2), Operand::Label("l".into())])
            }
            _ => Instruction::new(Opcode::MoveResult, regs(&[3])),
        })
        .collect()
}

// ============================================================================
// Benchmark 1: Classification
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(Opcode::ALL.len() as u64));
    group.bench_function("all_opcodes", |b| {
        b.iter(|| {
            for &op in Opcode::ALL {
                black_box(classify(black_box(op)));
            }
        })
    });
    group.finish();
}

// ============================================================================
// Benchmark 2: Single dispatch per category
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let factory = OpHandlerFactory::new();
    let ctx = context();

    let cases = [
        ("binary_math", Instruction::new(Opcode::AddInt, regs(&[0, 1, 2]))),
        (
            "const",
            Instruction::new(
                Opcode::ConstString,
                [Operand::Register(0), Operand::StringRef("s".into())],
            ),
        ),
        (
            "not_wired",
            Instruction::new(
                Opcode::IfNe,
                [Operand::Register(0), Operand::Register(1), Operand::Label("l".into())],
            ),
        ),
        (
            "fallback",
            Instruction::new(
                Opcode::InvokeVirtual,
                [Operand::Register(0), Operand::MethodRef("LFoo;->a()V".into())],
            ),
        ),
    ];

    for (name, insn) in cases.iter() {
        group.bench_with_input(BenchmarkId::new("create", name), insn, |b, insn| {
            b.iter(|| factory.create(&ctx, black_box(insn), black_box(5)))
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark 3: Method preparation
// ============================================================================

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare");
    group.measurement_time(Duration::from_secs(5));
    let factory = OpHandlerFactory::new();
    let ctx = context();

    for len in [16, 256, 4096].iter() {
        let method = build_method(*len);
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::new("method", len), &method, |b, method| {
            b.iter(|| prepare_method(&factory, &ctx, black_box(method)))
        });
    }

    let bodies: Vec<MethodBody> = (0..256)
        .map(|i| MethodBody::new(format!("LBench;->m{}()V", i), build_method(64)))
        .collect();
    group.throughput(Throughput::Elements(256 * 64));
    group.bench_function("parallel_256x64", |b| {
        b.iter(|| prepare_methods(&factory, &ctx, black_box(&bodies)))
    });
    group.finish();
}

criterion_group!(benches, bench_classify, bench_dispatch, bench_prepare);
criterion_main!(benches);
