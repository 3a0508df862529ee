use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use oa_hash::HashTable;
use oa_hash::config::DefaultPolicy;
use oa_hash::config::Policy;
use oa_hash::config::UncachedPolicy;
use oa_hash::hash_table::Entry;
use siphasher::sip::SipHasher;

#[derive(Parser, Debug)]
struct Args {
    /// Number of values to insert.
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: usize,

    /// Presize the table for this many values before inserting.
    #[arg(short = 'c', long = "target_capacity", default_value_t = 0)]
    target_capacity: usize,

    /// Fraction of the inserted values to remove afterwards.
    #[arg(short = 'r', long = "remove_fraction", default_value_t = 0.25)]
    remove_fraction: f64,

    /// Run without hash caching.
    #[arg(long = "uncached")]
    uncached: bool,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = SipHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn run<P: Policy + Default>(args: &Args) {
    let mut table: HashTable<u64, P> =
        HashTable::with_capacity_and_policy(args.target_capacity, P::default());

    println!(
        "Requested capacity: {}, actual capacity: {}",
        args.target_capacity,
        table.capacity()
    );

    let mut grows = 0;
    for i in 0..args.count {
        let value = i as u64;
        let capacity = table.capacity();
        match table.entry(hash_u64(value), |&v| v == value, |&v| hash_u64(v)) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }
        if table.capacity() != capacity {
            grows += 1;
        }
    }

    println!(
        "Inserted {} values, capacity {} after {} resizes",
        table.len(),
        table.capacity(),
        grows
    );

    let to_remove = (args.count as f64 * args.remove_fraction.clamp(0.0, 1.0)) as usize;
    for value in (0..to_remove as u64).map(|i| i * 7 % args.count.max(1) as u64) {
        table.remove(hash_u64(value), |&v| v == value);
    }

    println!(
        "Removed values, {} live entries and {} tombstones remain",
        table.len(),
        table.tombstones()
    );
    println!(
        "Fill: {:.2}% (live {:.2}%)",
        (table.len() + table.tombstones()) as f64 / table.capacity() as f64 * 100.0,
        table.len() as f64 / table.capacity() as f64 * 100.0
    );

    table.probe_histogram(|&v| hash_u64(v)).print();
    table.debug_stats().print();
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.uncached {
        run::<UncachedPolicy>(&args);
    } else {
        run::<DefaultPolicy>(&args);
    }
}
