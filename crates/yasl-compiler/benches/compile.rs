use criterion::{Criterion, black_box, criterion_group, criterion_main};
use yasl_compiler::compile_source;
use yasl_compiler::lexer::tokenize;

const FIB: &str = r#"
func fib: n -> {
    if n < 2 { return n }
    return fib(n - 1) + fib(n - 2)
}
print fib(20)
"#;

const WORDS: &str = r#"
let counts = [->]
let words = "the quick brown fox jumps over the lazy dog the end".split(" ")
let i = 0
while i < #words {
    let w = words[i]
    counts[w] = (counts[w] ?? 0) + 1
    i += 1
}
print counts
"#;

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_words", |b| {
        b.iter(|| tokenize(black_box(WORDS)).unwrap());
    });
}

fn bench_compile_fib(c: &mut Criterion) {
    c.bench_function("compile_fib", |b| {
        b.iter(|| compile_source(black_box(FIB)).unwrap());
    });
}

fn bench_compile_words(c: &mut Criterion) {
    c.bench_function("compile_words", |b| {
        b.iter(|| compile_source(black_box(WORDS)).unwrap());
    });
}

fn bench_compile_many_globals(c: &mut Criterion) {
    let mut src = String::new();
    for i in 0..200 {
        src.push_str(&format!("let x{i} = {i}\n"));
    }
    src.push_str("print x0\n");
    c.bench_function("compile_many_globals", |b| {
        b.iter(|| compile_source(black_box(&src)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_compile_fib,
    bench_compile_words,
    bench_compile_many_globals
);
criterion_main!(benches);
