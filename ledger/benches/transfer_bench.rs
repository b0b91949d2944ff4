// Exchange hot-path benchmarks.
//
// Covers credential derivation for both hash schemes, the full transfer path
// (re-authentication, balance moves, snapshot save) against the in-memory
// store, and JSON snapshot saves at a few registry sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lyc_ledger::{
    Amount, CredentialStore, Exchange, HashScheme, JsonFileStore, LedgerConfig, LedgerSnapshot,
    LedgerStore, MemoryStore, ScriptedSecrets,
};

fn bench_credential_derive(c: &mut Criterion) {
    let salt = [7u8; 16];
    for scheme in [HashScheme::Sha256, HashScheme::Blake3] {
        let store = CredentialStore::new(scheme);
        c.bench_function(&format!("credential/derive_{scheme}"), |b| {
            b.iter(|| store.derive("correct horse battery staple", &salt));
        });
    }
}

fn bench_transfer_memory(c: &mut Criterion) {
    let mut exchange = Exchange::open(LedgerConfig::default(), MemoryStore::new()).unwrap();
    let alice = exchange.create_wallet("alice", "pw1").unwrap();
    let bob = exchange.create_wallet("bob", "pw2").unwrap();
    exchange.redeem_voucher(&alice, "Amazon_Festive").unwrap();
    exchange.redeem_voucher(&bob, "Flipkart_BigBillion").unwrap();

    let cent = Amount::from_units(1);
    c.bench_function("exchange/transfer_round_trip", |b| {
        b.iter(|| {
            exchange
                .transfer(&alice, &bob.address(), cent, &mut ScriptedSecrets::new(["pw1"]))
                .unwrap();
            exchange
                .transfer(&bob, &alice.address(), cent, &mut ScriptedSecrets::new(["pw2"]))
                .unwrap();
        });
    });
}

fn bench_snapshot_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage/json_save");
    let dir = tempfile::tempdir().unwrap();

    for size in [10usize, 100, 1_000] {
        let mut exchange = Exchange::open(LedgerConfig::default(), MemoryStore::new()).unwrap();
        for i in 0..size {
            exchange.create_wallet(&format!("owner-{i:05}"), "pw").unwrap();
        }
        let snapshot: LedgerSnapshot = exchange.into_store().snapshot();
        let mut store = JsonFileStore::new(dir.path().join(format!("wallets-{size}.json")));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| store.save(snapshot).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_credential_derive,
    bench_transfer_memory,
    bench_snapshot_save,
);
criterion_main!(benches);
