//! Compile-time configuration for the tables in this crate.
//!
//! A table is configured along two axes:
//!
//! - [`KeyOps`] supplies the hash function and key equality. Every
//!   [`BuildHasher`] is a `KeyOps` for keys that implement `Hash + Eq`, and
//!   [`FnKeyOps`] turns a pair of closures into one.
//! - [`Policy`] supplies the minimum capacity, the growth heuristic, whether
//!   each occupied slot caches its hash, and what happens when an allocation
//!   fails.

use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::error::TryReserveError;

/// Hashing and equality for keys of type `K`.
///
/// `hash_key` must be deterministic and consistent with `keys_equal`: two
/// keys that compare equal must hash to the same value.
pub trait KeyOps<K> {
    /// Hashes a key.
    fn hash_key(&self, key: &K) -> u64;

    /// Returns `true` if both keys identify the same entry.
    fn keys_equal(&self, a: &K, b: &K) -> bool;
}

impl<K, S> KeyOps<K> for S
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.hash_one(key)
    }

    #[inline]
    fn keys_equal(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// A [`KeyOps`] built from a hash closure and an equality closure.
///
/// Useful when the key type has no `Hash` impl, or when the table should
/// compare keys by something other than `Eq`.
///
/// # Examples
///
/// ```rust
/// use oa_hash::HashMap;
/// use oa_hash::config::FnKeyOps;
///
/// // Case-insensitive keys.
/// let ops = FnKeyOps::new(
///     |k: &String| {
///         k.bytes()
///             .map(|b| b.to_ascii_lowercase() as u64)
///             .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b).wrapping_mul(0x100_0000_01b3))
///     },
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
/// );
///
/// let mut map = HashMap::with_hasher(ops);
/// map.insert("Hello".to_string(), 1);
/// assert_eq!(map.get(&"HELLO".to_string()), Some(&1));
/// ```
#[derive(Clone, Copy)]
pub struct FnKeyOps<H, E> {
    hash: H,
    eq: E,
}

impl<H, E> FnKeyOps<H, E> {
    /// Wraps a hash function and an equality function.
    pub const fn new(hash: H, eq: E) -> Self {
        Self { hash, eq }
    }
}

impl<H, E> Debug for FnKeyOps<H, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnKeyOps").finish_non_exhaustive()
    }
}

impl<K, H, E> KeyOps<K> for FnKeyOps<H, E>
where
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn keys_equal(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::CachedHash {}
    impl Sealed for super::NoHashCache {}
}

/// Per-slot hash storage. Either [`CachedHash`] or [`NoHashCache`].
///
/// A cached hash is compared before the equality predicate runs and is
/// reused when the table grows. It never changes lookup results.
pub trait HashCache: Copy + Debug + sealed::Sealed {
    /// Builds the cache entry for an item with the given hash.
    fn store(hash: u64) -> Self;

    /// The stored hash, if this cache keeps one.
    fn get(self) -> Option<u64>;

    /// Cheap pre-filter: `false` only if the item certainly does not have
    /// `hash`.
    #[inline(always)]
    fn may_match(self, hash: u64) -> bool {
        self.get().is_none_or(|cached| cached == hash)
    }
}

/// Stores the full 64-bit hash next to every occupied slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedHash(u64);

impl HashCache for CachedHash {
    #[inline(always)]
    fn store(hash: u64) -> Self {
        CachedHash(hash)
    }

    #[inline(always)]
    fn get(self) -> Option<u64> {
        Some(self.0)
    }
}

/// Stores nothing; hashes are recomputed when the table grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoHashCache;

impl HashCache for NoHashCache {
    #[inline(always)]
    fn store(_hash: u64) -> Self {
        NoHashCache
    }

    #[inline(always)]
    fn get(self) -> Option<u64> {
        None
    }
}

/// Capacity, growth and out-of-memory behavior of a table.
///
/// All knobs are associated items so a policy costs nothing at runtime.
/// Override only what you need:
///
/// ```rust
/// use oa_hash::config::{NoHashCache, Policy};
/// use oa_hash::HashTable;
///
/// struct Compact;
///
/// impl Policy for Compact {
///     type HashCache = NoHashCache;
///     const MIN_CAPACITY: usize = 64;
/// }
///
/// let table: HashTable<u32, Compact> = HashTable::with_policy(Compact);
/// assert_eq!(table.capacity(), 64);
/// ```
pub trait Policy {
    /// Whether occupied slots cache their hash.
    type HashCache: HashCache;

    /// The smallest slot count a table is ever allocated with. Must be a
    /// power of two.
    const MIN_CAPACITY: usize = 8;

    /// Above this many live items the table grows by
    /// [`LARGE_TABLE_GROWTH`](Policy::LARGE_TABLE_GROWTH) instead of
    /// [`SMALL_TABLE_GROWTH`](Policy::SMALL_TABLE_GROWTH).
    const LARGE_TABLE_THRESHOLD: usize = 50_000;

    /// Growth multiplier applied to the live count for small tables. At
    /// least 2.
    const SMALL_TABLE_GROWTH: usize = 4;

    /// Growth multiplier applied to the live count for large tables. At
    /// least 2.
    const LARGE_TABLE_GROWTH: usize = 2;

    /// Called when an infallible operation cannot allocate its slot array or
    /// the requested capacity overflows. Must not return.
    fn out_of_memory(error: TryReserveError) -> ! {
        default_out_of_memory(error)
    }
}

/// The default out-of-memory behavior: log the failure, then panic on
/// capacity overflow or call [`handle_alloc_error`] on allocation failure.
///
/// [`handle_alloc_error`]: alloc::alloc::handle_alloc_error
#[cold]
#[inline(never)]
pub fn default_out_of_memory(error: TryReserveError) -> ! {
    log::error!("hash table allocation failed: {error}");
    match error {
        TryReserveError::CapacityOverflow => panic!("hash table capacity overflow"),
        TryReserveError::AllocError { layout } => alloc::alloc::handle_alloc_error(layout),
    }
}

/// Caches hashes, minimum capacity 8, growth x4 (x2 above 50 000 items).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultPolicy;

impl Policy for DefaultPolicy {
    type HashCache = CachedHash;
}

/// Same as [`DefaultPolicy`] but without per-slot hash caching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UncachedPolicy;

impl Policy for UncachedPolicy {
    type HashCache = NoHashCache;
}

/// The slot count a growing table asks for once it holds `used` items.
#[inline]
pub(crate) fn growth_target<P: Policy>(used: usize) -> Option<usize> {
    let factor = if used > P::LARGE_TABLE_THRESHOLD {
        P::LARGE_TABLE_GROWTH
    } else {
        P::SMALL_TABLE_GROWTH
    };
    used.checked_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EagerGrowth;

    impl Policy for EagerGrowth {
        type HashCache = NoHashCache;

        const LARGE_TABLE_THRESHOLD: usize = 10;
        const LARGE_TABLE_GROWTH: usize = 3;
    }

    #[test]
    fn growth_factor_switches_at_threshold() {
        assert_eq!(growth_target::<DefaultPolicy>(6), Some(24));
        assert_eq!(growth_target::<DefaultPolicy>(50_000), Some(200_000));
        assert_eq!(growth_target::<DefaultPolicy>(50_001), Some(100_002));

        assert_eq!(growth_target::<EagerGrowth>(10), Some(40));
        assert_eq!(growth_target::<EagerGrowth>(11), Some(33));
    }

    struct NeverLarge;

    impl Policy for NeverLarge {
        type HashCache = NoHashCache;

        const LARGE_TABLE_THRESHOLD: usize = usize::MAX;
    }

    #[test]
    fn growth_target_overflow() {
        assert_eq!(
            growth_target::<DefaultPolicy>(usize::MAX / 2),
            Some(usize::MAX - 1)
        );
        assert_eq!(growth_target::<DefaultPolicy>(usize::MAX / 2 + 1), None);

        assert_eq!(
            growth_target::<NeverLarge>(usize::MAX / 4),
            Some(usize::MAX / 4 * 4)
        );
        assert_eq!(growth_target::<NeverLarge>(usize::MAX / 4 + 1), None);
    }

    #[test]
    fn hash_cache_filters() {
        let cached = CachedHash::store(7);
        assert_eq!(cached.get(), Some(7));
        assert!(cached.may_match(7));
        assert!(!cached.may_match(8));

        let none = NoHashCache::store(7);
        assert_eq!(none.get(), None);
        assert!(none.may_match(7));
        assert!(none.may_match(8));
    }

    #[test]
    fn fn_key_ops_forwards() {
        let ops = FnKeyOps::new(|k: &u32| *k as u64 + 42, |a: &u32, b: &u32| a % 10 == b % 10);
        assert_eq!(ops.hash_key(&5), 47);
        assert!(ops.keys_equal(&3, &13));
        assert!(!ops.keys_equal(&3, &4));
    }
}
