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

/// A hash set backed by the open addressing [`HashTable`].
///
/// `HashSet<T, S, P, A>` is the value-less form of
/// [`HashMap`](crate::HashMap): it stores values of type `T`, hashed and
/// compared by the [`KeyOps`] value `S`, in a table configured by the policy
/// `P` whose slots come from the allocator `A`.
pub struct HashSet<
    T,
    S = DefaultHashBuilder,
    P: Policy = DefaultPolicy,
    A: Allocator + Clone = Global,
> {
    table: HashTable<T, P, A>,
    hash_builder: S,
}

impl<T, S, P, A> Clone for HashSet<T, S, P, A>
where
    T: Clone,
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

impl<T, S, P, A> PartialEq for HashSet<T, S, P, A>
where
    S: KeyOps<T>,
    P: Policy,
    A: Allocator + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S, P, A> Eq for HashSet<T, S, P, A>
where
    S: KeyOps<T>,
    P: Policy,
    A: Allocator + Clone,
{
}

impl<T, S, P, A> Debug for HashSet<T, S, P, A>
where
    T: Debug,
    P: Policy,
    A: Allocator + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<T> HashSet<T, DefaultHashBuilder, DefaultPolicy> {
    /// Creates an empty set with the default hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty set with at least `capacity` slots and the default
    /// hasher.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<T, A: Allocator + Clone> HashSet<T, DefaultHashBuilder, DefaultPolicy, A> {
    /// Creates an empty set with the default hasher whose slots are
    /// allocated from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_hasher_in(DefaultHashBuilder::default(), alloc)
    }

    /// Creates an empty set with at least `capacity` slots allocated from
    /// `alloc` and the default hasher.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        Self::with_capacity_and_hasher_in(capacity, DefaultHashBuilder::default(), alloc)
    }
}

impl<T, S> HashSet<T, S> {
    /// Creates an empty set that hashes and compares values with
    /// `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_hasher_and_policy(hash_builder, DefaultPolicy)
    }

    /// Creates an empty set with at least `capacity` slots that hashes and
    /// compares values with `hash_builder`.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_capacity_hasher_and_policy(capacity, hash_builder, DefaultPolicy)
    }

    /// Fallible version of
    /// [`with_capacity_and_hasher`](HashSet::with_capacity_and_hasher).
    pub fn try_with_capacity_and_hasher(
        capacity: usize,
        hash_builder: S,
    ) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_hasher_and_policy(capacity, hash_builder, DefaultPolicy)
    }
}

impl<T, S, A: Allocator + Clone> HashSet<T, S, DefaultPolicy, A> {
    /// Creates an empty set that hashes values with `hash_builder` and
    /// allocates its slots from `alloc`.
    pub fn with_hasher_in(hash_builder: S, alloc: A) -> Self {
        Self::with_capacity_hasher_policy_in(
            DefaultPolicy::MIN_CAPACITY,
            hash_builder,
            DefaultPolicy,
            alloc,
        )
    }

    /// Creates an empty set with at least `capacity` slots allocated from
    /// `alloc`.
    pub fn with_capacity_and_hasher_in(capacity: usize, hash_builder: S, alloc: A) -> Self {
        Self::with_capacity_hasher_policy_in(capacity, hash_builder, DefaultPolicy, alloc)
    }
}

impl<T, S, P: Policy> HashSet<T, S, P> {
    /// Creates an empty set configured by `policy`.
    pub fn with_hasher_and_policy(hash_builder: S, policy: P) -> Self {
        Self::with_capacity_hasher_policy_in(P::MIN_CAPACITY, hash_builder, policy, Global)
    }

    /// Creates an empty set configured by `policy` with at least `capacity`
    /// slots.
    pub fn with_capacity_hasher_and_policy(capacity: usize, hash_builder: S, policy: P) -> Self {
        Self::with_capacity_hasher_policy_in(capacity, hash_builder, policy, Global)
    }

    /// Fallible version of
    /// [`with_capacity_hasher_and_policy`](HashSet::with_capacity_hasher_and_policy).
    pub fn try_with_capacity_hasher_and_policy(
        capacity: usize,
        hash_builder: S,
        policy: P,
    ) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_hasher_policy_in(capacity, hash_builder, policy, Global)
    }
}

impl<T, S, P: Policy, A: Allocator + Clone> HashSet<T, S, P, A> {
    /// Creates an empty set configured by `policy` with at least `capacity`
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
    /// [`with_capacity_hasher_policy_in`](HashSet::with_capacity_hasher_policy_in).
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

    /// Returns a reference to the allocator backing the set.
    pub fn allocator(&self) -> &A {
        self.table.allocator()
    }

    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of tombstones in the underlying table.
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    /// Returns a reference to the set's key-ops value.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Clears the set, removing all values and tombstones. Keeps the
    /// allocated slots.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the values of the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// for value in set.iter() {
    ///     println!("Value: {}", value);
    /// }
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, T, P> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator that removes and yields all values from the
    /// set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// let mut drained: Vec<i32> = set.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, vec![1, 2]);
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn drain(&mut self) -> Drain<'_, T, P, A> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Cursor-based iteration.
    ///
    /// Returns the first value at or after slot `pos` together with the
    /// position to resume from, or `None` once the set is exhausted. Start
    /// with `pos = 0`.
    pub fn next_from(&self, pos: usize) -> Option<(usize, &T)> {
        self.table.next_from(pos)
    }

    /// Retains only the values for which `f` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = (0..10).collect();
    /// set.retain(|&v| v % 2 == 0);
    /// assert_eq!(set.len(), 5);
    /// # }
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        self.table.retain(|v| f(v));
    }

    /// Returns occupancy and memory statistics of the underlying table.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }
}

impl<T, S, P, A> HashSet<T, S, P, A>
where
    S: KeyOps<T>,
    P: Policy,
    A: Allocator + Clone,
{
    /// Reserves room for at least `additional` more values without growing.
    pub fn reserve(&mut self, additional: usize) {
        let ops = &self.hash_builder;
        self.table.reserve(additional, |v| ops.hash_key(v));
    }

    /// Fallible version of [`reserve`](HashSet::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let ops = &self.hash_builder;
        self.table.try_reserve(additional, |v| ops.hash_key(v))
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. An equal value already
    /// in the set is kept and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        let ops = &self.hash_builder;
        match self.table.entry(
            ops.hash_key(&value),
            |v| ops.keys_equal(v, &value),
            |v| ops.hash_key(v),
        ) {
            TableEntry::Occupied(_) => false,
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// Adds a value to the set, replacing the existing value, if any, that is
    /// equal to the given one. Returns the replaced value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.replace(1), Some(1));
    /// assert_eq!(set.replace(2), None);
    /// assert_eq!(set.len(), 2);
    /// # }
    /// ```
    pub fn replace(&mut self, value: T) -> Option<T> {
        let ops = &self.hash_builder;
        match self.table.entry(
            ops.hash_key(&value),
            |v| ops.keys_equal(v, &value),
            |v| ops.hash_key(v),
        ) {
            TableEntry::Occupied(mut entry) => Some(entry.insert(value)),
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns `true` if the set contains a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// # }
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Returns a reference to the value in the set, if any, that is equal to
    /// the given value.
    pub fn get(&self, value: &T) -> Option<&T> {
        let ops = &self.hash_builder;
        self.table
            .find(ops.hash_key(value), |v| ops.keys_equal(v, value))
    }

    /// Removes a value from the set. Returns whether the value was
    /// present in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use oa_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), true);
    /// assert_eq!(set.remove(&1), false);
    /// # }
    /// ```
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the value in the set, if any, that is equal to the
    /// given one.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let ops = &self.hash_builder;
        self.table
            .remove(ops.hash_key(value), |v| ops.keys_equal(v, value))
    }

    /// Computes the probe distance distribution of the underlying table.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        let ops = &self.hash_builder;
        self.table.probe_histogram(|v| ops.hash_key(v))
    }
}

impl<T, S, P, A> Default for HashSet<T, S, P, A>
where
    S: Default,
    P: Policy + Default,
    A: Allocator + Clone + Default,
{
    fn default() -> Self {
        Self::with_capacity_hasher_policy_in(P::MIN_CAPACITY, S::default(), P::default(), A::default())
    }
}

impl<T, S, P, A> FromIterator<T> for HashSet<T, S, P, A>
where
    S: KeyOps<T> + Default,
    P: Policy + Default,
    A: Allocator + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, S, P, A> Extend<T> for HashSet<T, S, P, A>
where
    S: KeyOps<T>,
    P: Policy,
    A: Allocator + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, S, P: Policy, A: Allocator + Clone> IntoIterator for HashSet<T, S, P, A> {
    type IntoIter = IntoIter<T, P, A>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S, P: Policy, A: Allocator + Clone> IntoIterator for &'a HashSet<T, S, P, A> {
    type IntoIter = Iter<'a, T, P>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of a `HashSet`.
pub struct Iter<'a, T, P: Policy = DefaultPolicy> {
    inner: crate::hash_table::Iter<'a, T, P>,
}

impl<'a, T, P: Policy> Iterator for Iter<'a, T, P> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, P: Policy> ExactSizeIterator for Iter<'_, T, P> {}
impl<T, P: Policy> FusedIterator for Iter<'_, T, P> {}

/// A draining iterator over the values of a `HashSet`.
pub struct Drain<'a, T, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    inner: crate::hash_table::Drain<'a, T, P, A>,
}

impl<T, P: Policy, A: Allocator + Clone> Iterator for Drain<'_, T, P, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, P: Policy, A: Allocator + Clone> ExactSizeIterator for Drain<'_, T, P, A> {}
impl<T, P: Policy, A: Allocator + Clone> FusedIterator for Drain<'_, T, P, A> {}

/// An owning iterator over the values of a `HashSet`.
pub struct IntoIter<T, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    inner: crate::hash_table::IntoIter<T, P, A>,
}

impl<T, P: Policy, A: Allocator + Clone> Iterator for IntoIter<T, P, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, P: Policy, A: Allocator + Clone> ExactSizeIterator for IntoIter<T, P, A> {}
impl<T, P: Policy, A: Allocator + Clone> FusedIterator for IntoIter<T, P, A> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::config::FnKeyOps;
    use crate::config::UncachedPolicy;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            Self {
                k1: OsRng.try_next_u64().unwrap_or(0),
                k2: OsRng.try_next_u64().unwrap_or(0),
            }
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let set: HashSet<i32, SipHashBuilder> = HashSet::default();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);

        let set2 = HashSet::<i32, _>::with_hasher(SipHashBuilder::default());
        assert!(set2.is_empty());
        assert_eq!(set2.len(), 0);
        assert_eq!(set2.capacity(), 8);
    }

    #[test]
    fn test_with_capacity() {
        let set = HashSet::<i32, _>::with_capacity_and_hasher(100, SipHashBuilder::default());
        assert_eq!(set.capacity(), 128);
        assert!(set.is_empty());

        let overflow = HashSet::<i32, _>::try_with_capacity_and_hasher(
            usize::MAX,
            SipHashBuilder::default(),
        );
        assert_eq!(overflow.err(), Some(TryReserveError::CapacityOverflow));
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());

        assert!(set.insert(1));
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
        assert!(set.contains(&1));

        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&1));

        assert!(set.insert(2));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&1));
        assert!(set.contains(&2));
        assert!(!set.contains(&3));
    }

    #[test]
    fn insert_keeps_stored_value() {
        let ops = FnKeyOps::new(
            |v: &(u32, &str)| v.0 as u64,
            |a: &(u32, &str), b: &(u32, &str)| a.0 == b.0,
        );
        let mut set: HashSet<(u32, &str), _> = HashSet::with_hasher(ops);

        assert!(set.insert((1, "first")));
        assert!(!set.insert((1, "second")));
        assert_eq!(set.get(&(1, "")), Some(&(1, "first")));

        assert_eq!(set.replace((1, "third")), Some((1, "first")));
        assert_eq!(set.get(&(1, "")), Some(&(1, "third")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);

        assert!(set.remove(&2));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&1));
        assert!(!set.contains(&2));
        assert!(set.contains(&3));
        assert_eq!(set.tombstones(), 1);

        assert!(!set.remove(&2));
        assert!(!set.remove(&4));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_take() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);

        assert_eq!(set.take(&1), Some(1));
        assert_eq!(set.len(), 1);
        assert!(!set.contains(&1));
        assert!(set.contains(&2));

        assert_eq!(set.take(&1), None);
        assert_eq!(set.take(&3), None);
    }

    #[test]
    fn test_get() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(42);

        assert_eq!(set.get(&42), Some(&42));
        assert_eq!(set.get(&1), None);
    }

    #[test]
    fn test_clear() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);
        set.remove(&3);

        assert_eq!(set.len(), 2);
        set.clear();
        assert_eq!(set.len(), 0);
        assert_eq!(set.tombstones(), 0);
        assert!(set.is_empty());
        assert!(!set.contains(&1));
        assert!(!set.contains(&2));
        assert!(!set.contains(&3));
    }

    #[test]
    fn test_reserve() {
        let mut set = HashSet::<i32, _>::with_hasher(SipHashBuilder::default());
        let initial_capacity = set.capacity();

        set.reserve(1000);
        assert!(set.capacity() >= initial_capacity + 1000);

        let capacity = set.capacity();
        set.extend(0..1000);
        assert_eq!(set.capacity(), capacity);
        assert_eq!(set.len(), 1000);
    }

    #[test]
    fn test_iter() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);

        let values: Vec<i32> = set.iter().copied().collect();
        assert_eq!(values.len(), 3);
        assert!(values.contains(&1));
        assert!(values.contains(&2));
        assert!(values.contains(&3));
    }

    #[test]
    fn test_into_iterator() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);

        let values: Vec<i32> = (&set).into_iter().copied().collect();
        assert_eq!(values.len(), 3);
        assert!(values.contains(&1));
        assert!(values.contains(&2));
        assert!(values.contains(&3));

        let mut owned: Vec<i32> = set.into_iter().collect();
        owned.sort();
        assert_eq!(owned, vec![1, 2, 3]);
    }

    #[test]
    fn test_drain() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        for i in 0..10 {
            set.insert(i);
        }

        let mut drained: Vec<i32> = set.drain().collect();
        drained.sort();
        assert_eq!(drained, (0..10).collect::<Vec<_>>());
        assert!(set.is_empty());
        assert_eq!(set.tombstones(), 0);
    }

    #[test]
    fn cursor_visits_every_value_once() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        for i in 0..100u32 {
            set.insert(i);
        }
        for i in (0..100u32).step_by(4) {
            set.remove(&i);
        }

        let mut seen = Vec::new();
        let mut pos = 0;
        while let Some((next, &v)) = set.next_from(pos) {
            seen.push(v);
            pos = next;
        }
        seen.sort();

        let expected: Vec<u32> = (0..100).filter(|i| i % 4 != 0).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_retain() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.extend(0..20);

        set.retain(|v| v % 5 == 0);
        assert_eq!(set.len(), 4);
        assert_eq!(set.tombstones(), 16);
        for v in [0, 5, 10, 15] {
            assert!(set.contains(&v));
        }
    }

    #[test]
    fn test_string_values() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        for word in ["open", "addressing", "linear", "probing"] {
            assert!(set.insert(word.to_string()));
        }

        assert!(set.contains(&"linear".to_string()));
        assert!(!set.contains(&"quadratic".to_string()));
        assert_eq!(set.take(&"open".to_string()), Some(String::from("open")));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_eq_and_from_iter() {
        let a: HashSet<i32, SipHashBuilder> = (0..30).collect();
        let mut b: HashSet<i32, SipHashBuilder> = (0..30).rev().collect();
        assert_eq!(a, b);

        b.remove(&7);
        assert_ne!(a, b);
        b.insert(31);
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.extend(0..25);
        set.remove(&12);

        let mut cloned = set.clone();
        assert_eq!(cloned, set);
        assert_eq!(cloned.capacity(), set.capacity());
        assert_eq!(cloned.tombstones(), set.tombstones());

        cloned.insert(12);
        assert!(!set.contains(&12));
    }

    #[test]
    fn uncached_policy_set() {
        let mut set = HashSet::with_hasher_and_policy(SipHashBuilder::default(), UncachedPolicy);
        for i in 0..1000 {
            assert!(set.insert(i));
        }
        for i in (0..1000).step_by(3) {
            assert!(set.remove(&i));
        }
        for i in 0..1000 {
            assert_eq!(set.contains(&i), i % 3 != 0);
        }
    }

    #[test]
    fn set_with_explicit_allocator() {
        let mut set =
            HashSet::with_capacity_and_hasher_in(4, SipHashBuilder::default(), Global);
        for i in 0..50 {
            assert!(set.insert(i));
        }
        assert_eq!(set.len(), 50);
        assert!(set.contains(&49));

        let cloned = set.clone();
        let _: &Global = cloned.allocator();
        assert_eq!(cloned, set);
    }

    #[derive(Clone, Copy)]
    struct RefusingAlloc;

    unsafe impl Allocator for RefusingAlloc {
        fn allocate(
            &self,
            _layout: core::alloc::Layout,
        ) -> Result<core::ptr::NonNull<[u8]>, allocator_api2::alloc::AllocError> {
            Err(allocator_api2::alloc::AllocError)
        }

        unsafe fn deallocate(&self, _ptr: core::ptr::NonNull<u8>, _layout: core::alloc::Layout) {}
    }

    #[test]
    fn set_reports_allocator_failure() {
        let result = HashSet::<u32, _, _, _>::try_with_capacity_hasher_policy_in(
            8,
            SipHashBuilder::default(),
            DefaultPolicy,
            RefusingAlloc,
        );
        assert!(matches!(
            result.err(),
            Some(TryReserveError::AllocError { .. })
        ));
    }

    #[test]
    fn test_debug() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(5);
        assert_eq!(alloc::format!("{set:?}"), "{5}");
    }
}
