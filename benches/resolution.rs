use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jvm_remap::access::AccessFlags;
use jvm_remap::classfile::{ClassBuilder, ClassDef, MethodDef};
use jvm_remap::entry::{Entry, MethodEntry};
use jvm_remap::{EntryResolver, JarIndex, ResolutionStrategy};

const DEPTH: usize = 64;
const WIDTH: usize = 16;

/// A chain of `DEPTH` classes, each overriding `WIDTH` methods of its parent.
fn hierarchy() -> Vec<ClassDef> {
    (0..DEPTH)
        .map(|n| {
            let mut class = ClassBuilder::new(&format!("c{n}"));
            if n > 0 {
                class = class.extends(&format!("c{}", n - 1));
            }
            for m in 0..WIDTH {
                class = class.method(MethodDef::new(
                    format!("m_{m}"),
                    "(Ljava/lang/String;)I",
                    AccessFlags::PUBLIC,
                ));
            }
            class.build()
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let classes = hierarchy();
    c.bench_function("index hierarchy", |b| {
        b.iter(|| JarIndex::index(black_box(&classes)))
    });

    let index = JarIndex::index(&classes);
    let resolver = index.entry_resolver();
    let leaf = MethodEntry::parse(&format!("c{}", DEPTH - 1), "m_0", "(Ljava/lang/String;)I");

    c.bench_function("resolve root", |b| {
        let entry = Entry::Method(leaf.clone());
        b.iter(|| resolver.resolve_entry(black_box(&entry), ResolutionStrategy::ResolveRoot))
    });
    c.bench_function("resolve equivalent methods", |b| {
        b.iter(|| resolver.resolve_equivalent_methods(black_box(&leaf)))
    });
}

criterion_group!{
    name = benches;
    config = Criterion::default().sample_size(25);
    targets = criterion_benchmark
}
criterion_main!(benches);
