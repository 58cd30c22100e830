use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use simgpi::vpi::defs::{vpiModule, vpiNet, vpiReg};
use simgpi::vpi::VpiBackend;
use simgpi::{Edge, Gpi, IterSelector, LookupMode, ObjId};

#[path = "../tests/common/mod.rs"]
mod common;

use common::FakeVpi;

const SIGNALS: usize = 256;

fn make_design() -> (FakeVpi, Gpi, ObjId) {
    let vpi = FakeVpi::new();
    let top = vpi.add(None, "top", vpiModule);
    for i in 0..SIGNALS {
        let kind = if i % 2 == 0 { vpiNet } else { vpiReg };
        vpi.add(Some(top), &format!("sig_{i}"), kind);
    }

    let gpi = Gpi::new();
    gpi.register_backend(Box::new(VpiBackend::new(vpi.clone()))).unwrap();
    let root = gpi.get_root_handle(Some("top")).unwrap();
    (vpi, gpi, root)
}

fn bench_cached_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(1));

    group.bench_function("by_name_cached", |b| {
        let (_vpi, gpi, top) = make_design();
        let names: Vec<String> = (0..SIGNALS).map(|i| format!("sig_{i}")).collect();
        for name in &names {
            gpi.get_handle_by_name(top, name, LookupMode::Auto).unwrap();
        }

        let mut i = 0;
        b.iter(|| {
            let name = &names[i % SIGNALS];
            i += 1;
            black_box(gpi.get_handle_by_name(top, name, LookupMode::Auto).unwrap())
        });
    });

    group.bench_function("by_name_first_discovery", |b| {
        b.iter_custom(|iters| {
            let mut elapsed = std::time::Duration::ZERO;
            for n in 0..iters {
                // Fresh store per sample so every lookup reaches the backend.
                let (_vpi, gpi, top) = make_design();
                let name = format!("sig_{}", n as usize % SIGNALS);
                let start = Instant::now();
                black_box(gpi.get_handle_by_name(top, &name, LookupMode::Auto).unwrap());
                elapsed += start.elapsed();
            }
            elapsed
        });
    });

    group.finish();
}

fn bench_iteration(c: &mut Criterion) {
    c.bench_function("iterate/module_children", |b| {
        let (_vpi, gpi, top) = make_design();
        b.iter(|| black_box(gpi.children(top, IterSelector::Objects).unwrap().len()));
    });
}

fn bench_callback_dispatch(c: &mut Criterion) {
    c.bench_function("callback/value_change_fire", |b| {
        let (vpi, gpi, top) = make_design();
        let sig = gpi
            .get_handle_by_name(top, "sig_0", LookupMode::Auto)
            .unwrap()
            .unwrap();
        let id = gpi
            .register_value_change_callback(sig, Edge::ValueChange, |_| Ok(()))
            .unwrap();
        let word = id.to_user_data();
        let _keep = vpi;

        b.iter(|| gpi.handle_raw_callback(black_box(word)).unwrap());
    });
}

criterion_group!(benches, bench_cached_lookup, bench_iteration, bench_callback_dispatch);
criterion_main!(benches);
