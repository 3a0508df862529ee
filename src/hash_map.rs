use core::fmt::Debug;
use core::iter::FusedIterator;

use allocator_api2::alloc::Allocator;
use allocator_api2::alloc::Global;

use crate::DefaultHashBuilder;
use crate::config::DefaultPolicy;
use crate::config::KeyOps;
use crate::config::Policy;
use crate::error::TryReserveError;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::hash_table::Probe;

/// A hash map backed by the open addressing [`HashTable`].
///
/// `HashMap<K, V, S, P, A>` stores key-value pairs and uses a [`KeyOps`]
/// value `S` to hash and compare keys. Any [`BuildHasher`] works as `S` for
/// keys that implement `Hash + Eq`; [`FnKeyOps`] covers everything else. The
/// policy `P` and the allocator `A` are forwarded to the underlying table.
///
/// Removing a key leaves a tombstone in its slot; tombstones are purged the
/// next time the map grows. The map never shrinks.
///
/// [`BuildHasher`]: core::hash::BuildHasher
/// [`FnKeyOps`]: crate::config::FnKeyOps
///
/// # Examples
///
/// ```rust
/// use oa_hash::HashMap;
///
/// let mut map = HashMap::new();
/// map.insert(5u64, 42);
/// map.insert(400, 9);
///
/// assert_eq!(map.get_or(&400, &999), &9);
/// assert_eq!(map.get_or(&827, &999), &999);
/// assert_eq!(map.len(), 2);
/// ```
pub struct HashMap<
    K,
    V,
    S = DefaultHashBuilder,
    P: Policy = DefaultPolicy,
    A: Allocator + Clone = Global,
> {
    table: HashTable<(K, V), P, A>,
    hash_builder: S,
}

impl<K, V, S, P, A> Clone for HashMap<K, V, S, P, A>
where
    K: Clone,
    V: Clone,
    S: Clone,
    P: Policy,
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S, P, A> Debug for HashMap<K, V, S, P, A>
where
    K: Debug,
    V: Debug,
    P: Policy,
    A: Allocator + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V> HashMap<K, V, DefaultHashBuilder, DefaultPolicy> {
    /// Creates an empty map with the default hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let map: HashMap<u64, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map with at least `capacity` slots and the default
    /// hasher.
    ///
    /// See [`HashTable::with_capacity`] for how the slot count is chosen.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V, A: Allocator + Clone> HashMap<K, V, DefaultHashBuilder, DefaultPolicy, A> {
    /// Creates an empty map with the default hasher whose slots are
    /// allocated from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_hasher_in(DefaultHashBuilder::default(), alloc)
    }

    /// Creates an empty map with at least `capacity` slots allocated from
    /// `alloc` and the default hasher.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        Self::with_capacity_and_hasher_in(capacity, DefaultHashBuilder::default(), alloc)
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty map that hashes and compares keys with
    /// `hash_builder`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use oa_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_hasher_and_policy(hash_builder, DefaultPolicy)
    }

    /// Creates an empty map with at least `capacity` slots that hashes and
    /// compares keys with `hash_builder`.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_capacity_hasher_and_policy(capacity, hash_builder, DefaultPolicy)
    }

    /// Fallible version of
    /// [`with_capacity_and_hasher`](HashMap::with_capacity_and_hasher).
    pub fn try_with_capacity_and_hasher(
        capacity: usize,
        hash_builder: S,
    ) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_hasher_and_policy(capacity, hash_builder, DefaultPolicy)
    }
}

impl<K, V, S, A: Allocator + Clone> HashMap<K, V, S, DefaultPolicy, A> {
    /// Creates an empty map that hashes keys with `hash_builder` and
    /// allocates its slots from `alloc`.
    pub fn with_hasher_in(hash_builder: S, alloc: A) -> Self {
        Self::with_capacity_hasher_policy_in(
            DefaultPolicy::MIN_CAPACITY,
            hash_builder,
            DefaultPolicy,
            alloc,
        )
    }

    /// Creates an empty map with at least `capacity` slots allocated from
    /// `alloc` that hashes keys with `hash_builder`.
    pub fn with_capacity_and_hasher_in(capacity: usize, hash_builder: S, alloc: A) -> Self {
        Self::with_capacity_hasher_policy_in(capacity, hash_builder, DefaultPolicy, alloc)
    }
}

impl<K, V, S, P: Policy> HashMap<K, V, S, P> {
    /// Creates an empty map configured by `policy`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    /// use oa_hash::config::UncachedPolicy;
    /// use std::hash::RandomState;
    ///
    /// let mut map = HashMap::with_hasher_and_policy(RandomState::new(), UncachedPolicy);
    /// map.insert("key", 1);
    /// assert_eq!(map.get(&"key"), Some(&1));
    /// ```
    pub fn with_hasher_and_policy(hash_builder: S, policy: P) -> Self {
        Self::with_capacity_hasher_policy_in(P::MIN_CAPACITY, hash_builder, policy, Global)
    }

    /// Creates an empty map configured by `policy` with at least `capacity`
    /// slots.
    pub fn with_capacity_hasher_and_policy(capacity: usize, hash_builder: S, policy: P) -> Self {
        Self::with_capacity_hasher_policy_in(capacity, hash_builder, policy, Global)
    }

    /// Fallible version of
    /// [`with_capacity_hasher_and_policy`](HashMap::with_capacity_hasher_and_policy).
    pub fn try_with_capacity_hasher_and_policy(
        capacity: usize,
        hash_builder: S,
        policy: P,
    ) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_hasher_policy_in(capacity, hash_builder, policy, Global)
    }
}

impl<K, V, S, P: Policy, A: Allocator + Clone> HashMap<K, V, S, P, A> {
    /// Creates an empty map configured by `policy` with at least `capacity`
    /// slots allocated from `alloc`.
    pub fn with_capacity_hasher_policy_in(
        capacity: usize,
        hash_builder: S,
        policy: P,
        alloc: A,
    ) -> Self {
        Self {
            table: HashTable::with_capacity_and_policy_in(capacity, policy, alloc),
            hash_builder,
        }
    }

    /// Fallible version of
    /// [`with_capacity_hasher_policy_in`](HashMap::with_capacity_hasher_policy_in).
    pub fn try_with_capacity_hasher_policy_in(
        capacity: usize,
        hash_builder: S,
        policy: P,
        alloc: A,
    ) -> Result<Self, TryReserveError> {
        Ok(Self {
            table: HashTable::try_with_capacity_and_policy_in(capacity, policy, alloc)?,
            hash_builder,
        })
    }

    /// Returns a reference to the allocator backing the map.
    pub fn allocator(&self) -> &A {
        self.table.allocator()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the underlying table.
    ///
    /// The map grows before two thirds of the slots are taken, so this is
    /// always larger than the number of entries it can hold.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of tombstones left by removals since the map last
    /// grew or was cleared.
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    /// Returns a reference to the map's key-ops value.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Clears the map, removing all key-value pairs and tombstones. Keeps
    /// the allocated slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// The iterator yields `(&K, &V)` pairs in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// for (key, value) in map.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the key-value pairs with mutable references
    /// to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, P> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values of the map.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, P> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Clears the map, returning all key-value pairs as an iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let mut drained: Vec<_> = map.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, vec![(1, "a"), (2, "b")]);
    /// assert!(map.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V, P, A> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Cursor-based iteration.
    ///
    /// Returns the first entry at or after slot `pos` together with the
    /// position to resume from, or `None` once the map is exhausted. Start
    /// with `pos = 0`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(5u64, 42);
    /// map.insert(400, 9);
    ///
    /// let (mut keys, mut values) = (0, 0);
    /// let mut pos = 0;
    /// while let Some((next, &k, &v)) = map.next_from(pos) {
    ///     keys += k;
    ///     values += v;
    ///     pos = next;
    /// }
    /// assert_eq!((keys, values), (405, 51));
    /// ```
    pub fn next_from(&self, pos: usize) -> Option<(usize, &K, &V)> {
        self.table
            .next_from(pos)
            .map(|(next, (key, value))| (next, key, value))
    }

    /// Retains only the entries for which `f` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, i32> = (0..8).map(|x| (x, x * 10)).collect();
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert_eq!(map.len(), 4);
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        self.table.retain(|(key, value)| f(key, value));
    }

    /// Returns occupancy and memory statistics of the underlying table.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }
}

impl<K, V, S, P, A> HashMap<K, V, S, P, A>
where
    S: KeyOps<K>,
    P: Policy,
    A: Allocator + Clone,
{
    /// Reserves room for at least `additional` more entries without
    /// growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, i32> = HashMap::new();
    /// map.reserve(100);
    /// let capacity = map.capacity();
    ///
    /// for i in 0..100 {
    ///     map.insert(i, i);
    /// }
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let ops = &self.hash_builder;
        self.table.reserve(additional, |(key, _)| ops.hash_key(key));
    }

    /// Fallible version of [`reserve`](HashMap::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let ops = &self.hash_builder;
        self.table
            .try_reserve(additional, |(key, _)| ops.hash_key(key))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present its value is replaced in place and
    /// the old value is returned; the stored key is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let ops = &self.hash_builder;
        let hash = ops.hash_key(&key);
        match self.table.entry(
            hash,
            |(k, _)| ops.keys_equal(k, &key),
            |(k, _)| ops.hash_key(k),
        ) {
            TableEntry::Occupied(mut entry) => {
                Some(core::mem::replace(&mut entry.get_mut().1, value))
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                None
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the value corresponding to the key, or `default` if the key
    /// is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(5, 42);
    /// assert_eq!(map.get_or(&5, &999), &42);
    /// assert_eq!(map.get_or(&6, &999), &999);
    /// ```
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Returns the stored key and its value.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let ops = &self.hash_builder;
        self.table
            .find(ops.hash_key(key), |(k, _)| ops.keys_equal(k, key))
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, 10);
    /// if let Some(v) = map.get_mut(&1) {
    ///     *v += 1;
    /// }
    /// assert_eq!(map.get(&1), Some(&11));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let ops = &self.hash_builder;
        self.table
            .find_mut(ops.hash_key(key), |(k, _)| ops.keys_equal(k, key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains the key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get_key_value(key).is_some()
    }

    /// Removes a key from the map, returning its value if it was present.
    ///
    /// The slot becomes a tombstone; the map does not shrink.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// assert_eq!(map.tombstones(), 1);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let ops = &self.hash_builder;
        self.table
            .remove(ops.hash_key(key), |(k, _)| ops.keys_equal(k, key))
    }

    /// Gets the entry for the given key for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    /// assert_eq!(counts.get(&"b"), Some(&1));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, P, A> {
        let Self {
            table,
            hash_builder,
        } = self;
        let hash = hash_builder.hash_key(&key);
        match table.find_slot(hash, |(k, _)| hash_builder.keys_equal(k, &key)) {
            Probe::Found(index) => Entry::Occupied(OccupiedEntry {
                entry: table.occupied_entry(index),
            }),
            Probe::Vacant(index) => Entry::Vacant(VacantEntry {
                table,
                hash_builder,
                hash,
                index,
                key,
            }),
        }
    }

    /// Computes the probe distance distribution of the underlying table.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        let ops = &self.hash_builder;
        self.table.probe_histogram(|(key, _)| ops.hash_key(key))
    }
}

impl<K, V, S, P, A> Default for HashMap<K, V, S, P, A>
where
    S: Default,
    P: Policy + Default,
    A: Allocator + Clone + Default,
{
    fn default() -> Self {
        Self::with_capacity_hasher_policy_in(P::MIN_CAPACITY, S::default(), P::default(), A::default())
    }
}

impl<K, V, S, P, A> PartialEq for HashMap<K, V, S, P, A>
where
    V: PartialEq,
    S: KeyOps<K>,
    P: Policy,
    A: Allocator + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl<K, V, S, P, A> Eq for HashMap<K, V, S, P, A>
where
    V: Eq,
    S: KeyOps<K>,
    P: Policy,
    A: Allocator + Clone,
{
}

impl<K, V, S, P, A> FromIterator<(K, V)> for HashMap<K, V, S, P, A>
where
    S: KeyOps<K> + Default,
    P: Policy + Default,
    A: Allocator + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S, P, A> Extend<(K, V)> for HashMap<K, V, S, P, A>
where
    S: KeyOps<K>,
    P: Policy,
    A: Allocator + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S, P: Policy, A: Allocator + Clone> IntoIterator for HashMap<K, V, S, P, A> {
    type IntoIter = IntoIter<K, V, P, A>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S, P: Policy, A: Allocator + Clone> IntoIterator for &'a HashMap<K, V, S, P, A> {
    type IntoIter = Iter<'a, K, V, P>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, P: Policy, A: Allocator + Clone> IntoIterator
    for &'a mut HashMap<K, V, S, P, A>
{
    type IntoIter = IterMut<'a, K, V, P>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<
    'a,
    K,
    V,
    S = DefaultHashBuilder,
    P: Policy = DefaultPolicy,
    A: Allocator + Clone = Global,
> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, S, P, A>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, P, A>),
}

impl<'a, K, V, S, P, A> Entry<'a, K, V, S, P, A>
where
    S: KeyOps<K>,
    P: Policy,
    A: Allocator + Clone,
{
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, S, P, A> Entry<'a, K, V, S, P, A>
where
    V: Default,
    S: KeyOps<K>,
    P: Policy,
    A: Allocator + Clone,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
///
/// Creating or dropping one never reallocates; only
/// [`insert`](VacantEntry::insert) may grow the map.
pub struct VacantEntry<
    'a,
    K,
    V,
    S = DefaultHashBuilder,
    P: Policy = DefaultPolicy,
    A: Allocator + Clone = Global,
> {
    table: &'a mut HashTable<(K, V), P, A>,
    hash_builder: &'a S,
    hash: u64,
    index: usize,
    key: K,
}

impl<'a, K, V, S, P, A> VacantEntry<'a, K, V, S, P, A>
where
    S: KeyOps<K>,
    P: Policy,
    A: Allocator + Clone,
{
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry {
            table,
            hash_builder,
            hash,
            index,
            key,
        } = self;
        &mut table
            .insert_at(index, hash, (key, value), |(k, _)| hash_builder.hash_key(k))
            .1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V), P, A>,
}

impl<'a, K, V, P: Policy, A: Allocator + Clone> OccupiedEntry<'a, K, V, P, A> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V, P: Policy = DefaultPolicy> {
    inner: crate::hash_table::Iter<'a, (K, V), P>,
}

impl<'a, K, V, P: Policy> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: Policy> ExactSizeIterator for Iter<'_, K, V, P> {}
impl<K, V, P: Policy> FusedIterator for Iter<'_, K, V, P> {}

/// A mutable iterator over the key-value pairs of a `HashMap`.
pub struct IterMut<'a, K, V, P: Policy = DefaultPolicy> {
    inner: crate::hash_table::IterMut<'a, (K, V), P>,
}

impl<'a, K, V, P: Policy> Iterator for IterMut<'a, K, V, P> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.0, &mut entry.1))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: Policy> ExactSizeIterator for IterMut<'_, K, V, P> {}
impl<K, V, P: Policy> FusedIterator for IterMut<'_, K, V, P> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V, P: Policy = DefaultPolicy> {
    inner: Iter<'a, K, V, P>,
}

impl<'a, K, V, P: Policy> Iterator for Keys<'a, K, V, P> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: Policy> ExactSizeIterator for Keys<'_, K, V, P> {}
impl<K, V, P: Policy> FusedIterator for Keys<'_, K, V, P> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V, P: Policy = DefaultPolicy> {
    inner: Iter<'a, K, V, P>,
}

impl<'a, K, V, P: Policy> Iterator for Values<'a, K, V, P> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: Policy> ExactSizeIterator for Values<'_, K, V, P> {}
impl<K, V, P: Policy> FusedIterator for Values<'_, K, V, P> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V, P: Policy = DefaultPolicy> {
    inner: IterMut<'a, K, V, P>,
}

impl<'a, K, V, P: Policy> Iterator for ValuesMut<'a, K, V, P> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: Policy> ExactSizeIterator for ValuesMut<'_, K, V, P> {}
impl<K, V, P: Policy> FusedIterator for ValuesMut<'_, K, V, P> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    inner: crate::hash_table::Drain<'a, (K, V), P, A>,
}

impl<K, V, P: Policy, A: Allocator + Clone> Iterator for Drain<'_, K, V, P, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: Policy, A: Allocator + Clone> ExactSizeIterator for Drain<'_, K, V, P, A> {}
impl<K, V, P: Policy, A: Allocator + Clone> FusedIterator for Drain<'_, K, V, P, A> {}

/// An owning iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    inner: crate::hash_table::IntoIter<(K, V), P, A>,
}

impl<K, V, P: Policy, A: Allocator + Clone> Iterator for IntoIter<K, V, P, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P: Policy, A: Allocator + Clone> ExactSizeIterator for IntoIter<K, V, P, A> {}
impl<K, V, P: Policy, A: Allocator + Clone> FusedIterator for IntoIter<K, V, P, A> {}
