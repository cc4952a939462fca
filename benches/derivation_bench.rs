//! 派生性能基准测试
//! 使用criterion测量种子与账户派生耗时

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use walletx::domain::{
    derivation::{derive_ethereum, derive_solana, SolanaDerivation},
    mnemonic,
};

const MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn bench_seed(c: &mut Criterion) {
    // PBKDF2 2048 轮，占派生耗时大头
    c.bench_function("mnemonic_to_seed", |b| {
        b.iter(|| mnemonic::to_seed(black_box(MNEMONIC)).unwrap())
    });
}

fn bench_accounts(c: &mut Criterion) {
    let seed = mnemonic::to_seed(MNEMONIC).unwrap();

    c.bench_function("derive_ethereum", |b| {
        b.iter(|| derive_ethereum(black_box(seed.as_bytes()), black_box(7)).unwrap())
    });

    let mut group = c.benchmark_group("derive_solana");
    for (name, scheme) in [
        ("slip10", SolanaDerivation::Slip10),
        ("legacy_xor", SolanaDerivation::LegacyXor),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| derive_solana(black_box(seed.as_bytes()), black_box(7), scheme).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_seed, bench_accounts);
criterion_main!(benches);
