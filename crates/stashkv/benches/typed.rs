use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde::{Deserialize, Serialize};
use stashfs::{BucketConfig, FileCache};
use stashkv::{CborStorage, IdentityNames, JsonStorage, Sha256Names, TextStorage};
use tempfile::TempDir;

#[derive(Clone, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
    tags: Vec<String>,
}

fn user(id: u64) -> User {
    User {
        id,
        name: format!("user_{}", id),
        tags: vec!["a".to_string(), "b".to_string()],
    }
}

fn cache(dir: &TempDir) -> FileCache {
    FileCache::open(BucketConfig::new(dir.path(), "bench", 100)).unwrap()
}

fn bench_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("json_get", |b| {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::json(cache(&dir), IdentityNames);
        storage.put("user", &user(1)).unwrap();

        b.iter(|| {
            black_box(storage.get("user").unwrap());
        });
    });

    group.bench_function("cbor_get", |b| {
        let dir = TempDir::new().unwrap();
        let storage = CborStorage::cbor(cache(&dir), IdentityNames);
        storage.put("user", &user(1)).unwrap();

        b.iter(|| {
            black_box(storage.get("user").unwrap());
        });
    });

    group.finish();
}

fn bench_mixed_50_50(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_read_50_write_hashed", |b| {
        let dir = TempDir::new().unwrap();
        let storage = TextStorage::text(cache(&dir), Sha256Names);
        let value = "x".repeat(1024);

        let keys: Vec<String> = (0..100).map(|i| format!("key_{}", i)).collect();
        for key in &keys {
            storage.put(key, &value).unwrap();
        }

        let mut counter = 0usize;
        b.iter(|| {
            let key = &keys[counter % 100];
            if counter % 2 == 0 {
                black_box(storage.get(key).ok());
            } else {
                black_box(storage.put(key, &value).ok());
            }
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_codecs, bench_mixed_50_50);
criterion_main!(benches);
