use core::hash::Hash;
use core::hash::Hasher;
use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::BenchmarkGroup;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::measurement::WallTime;
use hashbrown::hash_table::Entry as HashbrownEntry;
use hashbrown::hash_table::HashTable as HashbrownHashTable;
use oa_hash::HashTable as OaHashTable;
use oa_hash::config::DefaultPolicy;
use oa_hash::config::Policy;
use oa_hash::config::UncachedPolicy;
use oa_hash::hash_table::Entry as OaEntry;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use siphasher::sip::SipHasher;

trait KeyValuePair: Clone {
    fn new(key: u64) -> Self;

    fn hash_key(&self) -> u64;
    fn eq_key(&self, other: &Self) -> bool;
}

#[derive(Clone)]
struct SmallTestItem {
    key: u64,
}

impl KeyValuePair for SmallTestItem {
    fn new(key: u64) -> Self {
        black_box(Self { key })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

#[derive(Clone)]
struct StringTestItem {
    key: String,
    _value: u64,
}

impl KeyValuePair for StringTestItem {
    fn new(key: u64) -> Self {
        black_box(Self {
            key: format!("key_{:016X}", key),
            _value: key,
        })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// The operations every benchmarked table supports.
trait Contender<T: KeyValuePair> {
    fn name() -> String;

    fn with_capacity(capacity: usize) -> Self;

    /// Inserts `item`, replacing an equal item if one is present.
    fn insert(&mut self, hash: u64, item: T);

    fn find(&self, hash: u64, item: &T) -> bool;

    fn remove(&mut self, hash: u64, item: &T) -> bool;

    fn visit_all(&self) -> usize;
}

struct Oa<T, P: Policy>(OaHashTable<T, P>);

impl<T, P> Contender<T> for Oa<T, P>
where
    T: KeyValuePair,
    P: Policy + Default,
{
    fn name() -> String {
        let policy = core::any::type_name::<P>();
        format!("oa_hash/{}", policy.rsplit("::").next().unwrap_or(policy))
    }

    fn with_capacity(capacity: usize) -> Self {
        Oa(OaHashTable::with_capacity_and_policy(capacity, P::default()))
    }

    fn insert(&mut self, hash: u64, item: T) {
        match self.0.entry(hash, |v| v.eq_key(&item), |v| v.hash_key()) {
            OaEntry::Vacant(entry) => {
                black_box(entry.insert(item));
            }
            OaEntry::Occupied(mut entry) => {
                *entry.get_mut() = item;
            }
        }
    }

    fn find(&self, hash: u64, item: &T) -> bool {
        self.0.find(hash, |v| v.eq_key(item)).is_some()
    }

    fn remove(&mut self, hash: u64, item: &T) -> bool {
        self.0.remove(hash, |v| v.eq_key(item)).is_some()
    }

    fn visit_all(&self) -> usize {
        let mut visited = 0;
        let mut pos = 0;
        while let Some((next, item)) = self.0.next_from(pos) {
            black_box(item);
            visited += 1;
            pos = next;
        }
        visited
    }
}

struct Hashbrown<T>(HashbrownHashTable<T>);

impl<T: KeyValuePair> Contender<T> for Hashbrown<T> {
    fn name() -> String {
        "hashbrown".to_string()
    }

    fn with_capacity(capacity: usize) -> Self {
        Hashbrown(HashbrownHashTable::with_capacity(capacity))
    }

    fn insert(&mut self, hash: u64, item: T) {
        match self.0.entry(hash, |v| v.eq_key(&item), |v| v.hash_key()) {
            HashbrownEntry::Vacant(entry) => {
                black_box(entry.insert(item));
            }
            HashbrownEntry::Occupied(mut entry) => {
                *entry.get_mut() = item;
            }
        }
    }

    fn find(&self, hash: u64, item: &T) -> bool {
        self.0.find(hash, |v| v.eq_key(item)).is_some()
    }

    fn remove(&mut self, hash: u64, item: &T) -> bool {
        match self.0.find_entry(hash, |v| v.eq_key(item)) {
            Ok(entry) => {
                black_box(entry.remove());
                true
            }
            Err(_) => false,
        }
    }

    fn visit_all(&self) -> usize {
        self.0.iter().map(black_box).count()
    }
}

type Cached<T> = Oa<T, DefaultPolicy>;
type Uncached<T> = Oa<T, UncachedPolicy>;

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
];

fn hashed_items<T: KeyValuePair>(keys: impl Iterator<Item = u64>) -> Vec<(u64, T)> {
    keys.map(|key| {
        let item = T::new(key);
        (item.hash_key(), item)
    })
    .collect()
}

fn filled<T: KeyValuePair, C: Contender<T>>(items: &[(u64, T)]) -> C {
    let mut table = C::with_capacity(0);
    for (hash, item) in items.iter().cloned() {
        table.insert(hash, item);
    }
    table
}

fn insert_case<T: KeyValuePair, C: Contender<T>>(
    group: &mut BenchmarkGroup<'_, WallTime>,
    items: &[(u64, T)],
    presize: bool,
) {
    group.bench_with_input(BenchmarkId::new(C::name(), items.len()), items, |b, items| {
        b.iter_batched(
            || {
                let mut items = items.to_vec();
                items.shuffle(&mut SmallRng::from_os_rng());
                items
            },
            |items| {
                let mut table = C::with_capacity(if presize { items.len() * 2 } else { 0 });
                for (hash, item) in items {
                    table.insert(hash, item);
                }
                black_box(table)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_random<T: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    for presize in [false, true] {
        let mut group = c.benchmark_group(format!(
            "insert_random{}_{}",
            if presize { "_preallocated" } else { "" },
            core::any::type_name::<T>()
        ));
        group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

        let mut rng = SmallRng::from_os_rng();
        for &size in &SIZES[..=MAX_SIZE] {
            let items = hashed_items::<T>((0..size).map(|_| rng.random::<u64>()));
            group.throughput(Throughput::Elements(size as u64));

            insert_case::<T, Cached<T>>(&mut group, &items, presize);
            insert_case::<T, Uncached<T>>(&mut group, &items, presize);
            insert_case::<T, Hashbrown<T>>(&mut group, &items, presize);
        }

        group.finish();
    }
}

fn find_case<T: KeyValuePair, C: Contender<T>>(
    group: &mut BenchmarkGroup<'_, WallTime>,
    stored: &[(u64, T)],
    probes: &[(u64, T)],
) {
    let table: C = filled(stored);
    group.bench_with_input(BenchmarkId::new(C::name(), stored.len()), probes, |b, probes| {
        b.iter(|| {
            let mut found = 0usize;
            for (hash, item) in probes {
                found += table.find(*hash, item) as usize;
            }
            black_box(found)
        })
    });
}

fn bench_find<T: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    for hit in [true, false] {
        let mut group = c.benchmark_group(format!(
            "find_{}_{}",
            if hit { "hit" } else { "miss" },
            core::any::type_name::<T>()
        ));
        group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

        for &size in &SIZES[..=MAX_SIZE] {
            let stored = hashed_items::<T>(0..size as u64);
            let mut probes = if hit {
                stored.clone()
            } else {
                hashed_items::<T>(size as u64..2 * size as u64)
            };
            probes.shuffle(&mut SmallRng::from_os_rng());
            group.throughput(Throughput::Elements(size as u64));

            find_case::<T, Cached<T>>(&mut group, &stored, &probes);
            find_case::<T, Uncached<T>>(&mut group, &stored, &probes);
            find_case::<T, Hashbrown<T>>(&mut group, &stored, &probes);
        }

        group.finish();
    }
}

fn churn_case<T: KeyValuePair, C: Contender<T>>(
    group: &mut BenchmarkGroup<'_, WallTime>,
    items: &[(u64, T)],
    window: usize,
) {
    group.bench_with_input(BenchmarkId::new(C::name(), window), items, |b, items| {
        b.iter_batched(
            || filled::<T, C>(&items[..window]),
            |mut table| {
                // Sliding window: every insert is paired with the removal of
                // the oldest key, so removed slots pile up as tombstones.
                for (i, (hash, item)) in items[window..].iter().cloned().enumerate() {
                    let (old_hash, old_item) = &items[i];
                    black_box(table.remove(*old_hash, old_item));
                    table.insert(hash, item);
                }
                black_box(table)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_tombstone_churn<T: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "tombstone_churn_{}",
        core::any::type_name::<T>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in &SIZES[..=MAX_SIZE] {
        let items = hashed_items::<T>(0..(size * 4) as u64);
        group.throughput(Throughput::Elements((size * 3) as u64));

        churn_case::<T, Cached<T>>(&mut group, &items, size);
        churn_case::<T, Uncached<T>>(&mut group, &items, size);
        churn_case::<T, Hashbrown<T>>(&mut group, &items, size);
    }

    group.finish();
}

#[derive(Clone, Copy)]
enum Operation {
    Find,
    Insert,
    Remove,
}

fn mixed_case<T: KeyValuePair, C: Contender<T>>(
    group: &mut BenchmarkGroup<'_, WallTime>,
    operations: &[(Operation, u64)],
    size: usize,
) {
    group.bench_with_input(BenchmarkId::new(C::name(), size), operations, |b, operations| {
        b.iter(|| {
            let mut table = C::with_capacity(0);
            for &(operation, key) in operations {
                let item = T::new(key);
                let hash = item.hash_key();
                match operation {
                    Operation::Insert => table.insert(hash, item),
                    Operation::Remove => {
                        black_box(table.remove(hash, &item));
                    }
                    Operation::Find => {
                        black_box(table.find(hash, &item));
                    }
                }
            }
            black_box(table.visit_all())
        })
    });
}

fn bench_mixed_zipf<T: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("mixed_zipf_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    const KEY_SPACE_MULTIPLIER: usize = 2;

    for &size in &SIZES[..=MAX_SIZE] {
        let mut rng = SmallRng::from_os_rng();
        let keys = Zipf::new((size * KEY_SPACE_MULTIPLIER) as f64, 1.0).unwrap();
        let operations = (0..size * 3)
            .map(|_| {
                let operation = match rng.random_range(0..4) {
                    0 | 1 => Operation::Find,
                    2 => Operation::Insert,
                    _ => Operation::Remove,
                };
                (operation, rng.sample(keys) as u64)
            })
            .collect::<Vec<_>>();
        group.throughput(Throughput::Elements(operations.len() as u64));

        mixed_case::<T, Cached<T>>(&mut group, &operations, size);
        mixed_case::<T, Uncached<T>>(&mut group, &operations, size);
        mixed_case::<T, Hashbrown<T>>(&mut group, &operations, size);
    }

    group.finish();
}

fn iterate_case<T: KeyValuePair, C: Contender<T>>(
    group: &mut BenchmarkGroup<'_, WallTime>,
    items: &[(u64, T)],
) {
    let mut table: C = filled(items);
    for (hash, item) in items.iter().step_by(3) {
        table.remove(*hash, item);
    }
    group.bench_function(BenchmarkId::new(C::name(), items.len()), |b| {
        b.iter(|| black_box(table.visit_all()))
    });
}

fn bench_iteration<T: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("iteration_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in &SIZES[..=MAX_SIZE] {
        let items = hashed_items::<T>(0..size as u64);
        group.throughput(Throughput::Elements(size as u64));

        iterate_case::<T, Cached<T>>(&mut group, &items);
        iterate_case::<T, Hashbrown<T>>(&mut group, &items);
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<SmallTestItem, 4>,
    bench_insert_random::<StringTestItem, 4>,
    bench_find::<SmallTestItem, 4>,
    bench_find::<StringTestItem, 4>,
    bench_tombstone_churn::<SmallTestItem, 4>,
    bench_tombstone_churn::<StringTestItem, 3>,
    bench_mixed_zipf::<SmallTestItem, 4>,
    bench_mixed_zipf::<StringTestItem, 3>,
    bench_iteration::<SmallTestItem, 4>,
    bench_iteration::<StringTestItem, 4>,
);

criterion_main!(benches);
