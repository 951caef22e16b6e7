use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pathlock_core::{
    cipher, decapsulate, encapsulate, keypair, pack12, Graph, Path, Puzzle, HEADER_BYTES,
    NONCE_BYTES, SHARED_SECRET_BYTES,
};
use rand::RngCore;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

fn bench_kem(c: &mut Criterion) {
    let mut group = c.benchmark_group("kem");
    group.bench_function("keypair", |b| b.iter(|| black_box(keypair())));

    let (pk, sk) = keypair();
    group.bench_function("encaps", |b| b.iter(|| encapsulate(&pk).unwrap()));

    let (ct, _) = encapsulate(&pk).unwrap();
    group.bench_function("decaps", |b| b.iter(|| decapsulate(&ct, &sk).unwrap()));
}

fn bench_cipher(c: &mut Criterion) {
    let mut group = c.benchmark_group("cipher");
    let key = [0x24u8; SHARED_SECRET_BYTES];
    let preimage = random_bytes(HEADER_BYTES + NONCE_BYTES);
    group.bench_function("encrypt_preimage", |b| {
        b.iter(|| cipher::encrypt(&preimage, &key).unwrap())
    });

    let (enc, iv) = cipher::encrypt(&preimage, &key).unwrap();
    group.bench_function("decrypt_preimage", |b| {
        b.iter(|| cipher::decrypt(&enc, &key, &iv).unwrap())
    });
}

fn bench_pack(c: &mut Criterion) {
    let data = random_bytes(144);
    c.bench_function("pack12_enc_sized", |b| b.iter(|| pack12(black_box(&data))));
}

fn bench_graph_hash(c: &mut Criterion) {
    let mut graph = Graph::new();
    for node in 0u16..2048 {
        graph.add_edge(node, node + 1).unwrap();
    }
    c.bench_function("graph_hash_2mib", |b| b.iter(|| graph.hash()));
}

fn bench_dfs(c: &mut Criterion) {
    let mut group = c.benchmark_group("dfs");
    let mut graph = Graph::new();
    for node in 0u16..2048 {
        graph.add_edge(node, node + 1).unwrap();
    }
    group.bench_function("single_thread_chain", |b| {
        b.iter(|| {
            let mut path = Path::new();
            path.find_longest(graph.view());
            black_box(path.len())
        })
    });

    graph.set_num_threads(4);
    group.bench_function("four_thread_chain", |b| {
        b.iter(|| {
            let mut path = Path::new();
            path.find_longest(graph.view());
            black_box(path.len())
        })
    });
}

fn bench_mine_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("puzzle");
    group.sample_size(20);

    let (pk, sk) = keypair();
    let mut puzzle = Puzzle::new();
    puzzle.initialize(&pk, &sk);
    puzzle.enable_parallel_dfs();
    puzzle.set_header(&random_bytes(HEADER_BYTES));
    puzzle.set_nonce(&random_bytes(NONCE_BYTES));

    group.bench_function("mine", |b| b.iter(|| assert!(puzzle.mine())));

    assert!(puzzle.mine());
    let solution = puzzle.solution.as_bytes().to_vec();
    group.bench_function("validate", |b| b.iter(|| assert!(puzzle.validate(&solution))));
}

criterion_group!(
    benches,
    bench_kem,
    bench_cipher,
    bench_pack,
    bench_graph_hash,
    bench_dfs,
    bench_mine_validate
);
criterion_main!(benches);
