use criterion::{black_box, criterion_group, criterion_main, Criterion};

use abicodec::Context;

const TOKEN_ABI: &str = r#"{
    "version": "eosio::abi/1.1",
    "types": [{"new_type_name": "account_name", "type": "name"}],
    "structs": [{
        "name": "transfer",
        "base": "",
        "fields": [
            {"name": "from", "type": "account_name"},
            {"name": "to", "type": "account_name"},
            {"name": "quantity", "type": "asset"},
            {"name": "memo", "type": "string"}
        ]
    }]
}"#;

const TRANSFER: &str =
    r#"{"from":"useraaaaaaaa","to":"useraaaaaaab","quantity":"0.0001 SYS","memo":"benchmark"}"#;

fn encode_bench(c: &mut Criterion) {
    let mut ctx = Context::new();
    let contract = ctx.string_to_name("eosio.token");
    ctx.set_abi(contract, TOKEN_ABI).unwrap();

    c.bench_function("transfer_json_to_bin", |b| {
        b.iter(|| {
            ctx.json_to_bin(contract, "transfer", black_box(TRANSFER))
                .unwrap()
        })
    });
}

fn decode_bench(c: &mut Criterion) {
    let mut ctx = Context::new();
    let contract = ctx.string_to_name("eosio.token");
    ctx.set_abi(contract, TOKEN_ABI).unwrap();
    ctx.json_to_bin(contract, "transfer", TRANSFER).unwrap();
    let bin = ctx.bin().to_vec();

    c.bench_function("transfer_bin_to_json", |b| {
        b.iter(|| {
            ctx.bin_to_json(contract, "transfer", black_box(&bin))
                .unwrap()
        })
    });
}

fn install_bench(c: &mut Criterion) {
    c.bench_function("set_abi", |b| {
        b.iter(|| {
            let mut ctx = Context::new();
            ctx.set_abi(1, black_box(TOKEN_ABI)).unwrap()
        })
    });
}

criterion_group! {
    name = codec_benches;
    config = Criterion::default();
    targets = encode_bench, decode_bench, install_bench
}

criterion_main!(codec_benches);
