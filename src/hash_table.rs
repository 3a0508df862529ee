use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use allocator_api2::alloc::Allocator;
use allocator_api2::alloc::Global;
use allocator_api2::boxed::Box;

use crate::config::DefaultPolicy;
use crate::config::HashCache;
use crate::config::Policy;
use crate::config::growth_target;
use crate::error::Fallibility;
use crate::error::TryReserveError;

/// One storage cell of the slot array.
#[derive(Clone)]
enum Slot<T, C> {
    /// Never written since the array was allocated or cleared. Ends every
    /// probe sequence.
    Empty,
    /// Tombstone left by a removal. Probes continue through it.
    Deleted,
    Occupied { hash: C, item: T },
}

impl<T, C> Slot<T, C> {
    #[inline(always)]
    fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline(always)]
    fn item(&self) -> Option<&T> {
        match self {
            Slot::Occupied { item, .. } => Some(item),
            _ => None,
        }
    }

    #[inline(always)]
    fn item_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Occupied { item, .. } => Some(item),
            _ => None,
        }
    }

    #[inline(always)]
    fn occupied(&self) -> &T {
        match self {
            Slot::Occupied { item, .. } => item,
            _ => unreachable!("occupied entry points at a vacant slot"),
        }
    }

    #[inline(always)]
    fn occupied_mut(&mut self) -> &mut T {
        match self {
            Slot::Occupied { item, .. } => item,
            _ => unreachable!("occupied entry points at a vacant slot"),
        }
    }
}

/// Outcome of walking a probe sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The slot holding a matching item.
    Found(usize),
    /// No match. The earliest tombstone on the path, or the terminating
    /// empty slot if the path had none.
    Vacant(usize),
}

/// Debug statistics for hash table analysis.
///
/// Only available with the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live items
    pub populated: usize,
    /// Number of tombstones
    pub tombstones: usize,
    /// Total number of slots allocated
    pub capacity: usize,
    /// Load factor counting tombstones ((populated + tombstones) / capacity)
    pub fill_ratio: f64,
    /// Load factor counting only live items (populated / capacity)
    pub load_factor: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
    /// Bytes held by empty slots and tombstones
    pub wasted_bytes: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Fill: {} tombstones ({:.2}% fill ratio)",
            self.tombstones,
            self.fill_ratio * 100.0
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// Distribution of probe distances.
///
/// `bins[d]` counts the live items stored `d` slots past their home slot
/// (`hash & mask`), wrapping around the end of the array.
///
/// Only available with the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// Item counts indexed by probe distance.
    pub bins: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ProbeHistogram {
    /// The largest probe distance of any live item.
    pub fn max_distance(&self) -> Option<usize> {
        self.bins.iter().rposition(|&count| count != 0)
    }

    /// Average probe distance over all live items.
    pub fn mean_distance(&self) -> f64 {
        let total: usize = self.bins.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = self
            .bins
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum();
        weighted as f64 / total as f64
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = *self.bins.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "probe histogram ({} entries):",
            self.bins.iter().sum::<usize>()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let full = units / 8;
            let rem = units % 8;
            let mut bar = "█".repeat(full);
            if rem > 0 {
                let ch = match rem {
                    1 => '▏',
                    2 => '▎',
                    3 => '▍',
                    4 => '▌',
                    5 => '▋',
                    6 => '▊',
                    7 => '▉',
                    _ => unreachable!(),
                };
                bar.push(ch);
            }
            bar
        };

        for (distance, &count) in self.bins.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// An open addressing hash table with linear probing and tombstone deletion.
///
/// `HashTable<T, P, A>` stores items of type `T` in a single power-of-two sized
/// slot array. Like the raw tables of other hash table crates it does not
/// know how to hash or compare its items: every lookup takes the item's hash
/// and an equality predicate, and every operation that may grow the table
/// also takes a re-hasher closure. [`HashMap`] and [`HashSet`] wrap it with
/// a [`KeyOps`] to provide the usual keyed interfaces.
///
/// Removed items leave tombstones behind so that probe sequences running
/// through them stay intact. Tombstones count toward the load factor and are
/// only purged when the table grows. The table grows once occupied slots plus
/// tombstones reach two thirds of the slot count, and never shrinks on its
/// own.
///
/// The policy `P` decides the minimum capacity, the growth factors, whether
/// hashes are cached per slot and what happens when an allocation fails. The
/// slot array is allocated from `A`, the global allocator unless one is
/// passed to a `*_in` constructor.
///
/// [`HashMap`]: crate::HashMap
/// [`HashSet`]: crate::HashSet
/// [`KeyOps`]: crate::config::KeyOps
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use oa_hash::hash_table::Entry;
/// # use oa_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::with_capacity(100);
///
/// match table.entry(hash_id(123), |p: &Person| p.id == 123, |p| hash_id(p.id)) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
///
/// assert_eq!(table.find(hash_id(123), |p| p.id == 123).map(|p| p.name.as_str()), Some("Alice"));
/// ```
pub struct HashTable<T, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    slots: Box<[Slot<T, P::HashCache>], A>,
    /// Occupied slots plus tombstones.
    fill: usize,
    /// Occupied slots.
    used: usize,
    _policy: PhantomData<fn() -> P>,
}

impl<T, P, A> Debug for HashTable<T, P, A>
where
    T: Debug,
    P: Policy,
    A: Allocator + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::string::String;

        f.debug_struct("HashTable")
            .field("used", &self.used)
            .field("fill", &self.fill)
            .field("capacity", &self.capacity())
            .field(
                "popmap",
                &self
                    .slots
                    .chunks(64)
                    .map(|chunk| {
                        chunk
                            .iter()
                            .map(|slot| match slot {
                                Slot::Empty => '.',
                                Slot::Deleted => 'x',
                                Slot::Occupied { .. } => '#',
                            })
                            .collect::<String>()
                    })
                    .collect::<Vec<_>>(),
            )
            .field("items", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<T, P, A> Clone for HashTable<T, P, A>
where
    T: Clone,
    P: Policy,
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        let mut slots = Self::allocate_slots(
            self.slots.len(),
            self.allocator().clone(),
            Fallibility::Infallible,
        )
            .unwrap_or_else(|error| P::out_of_memory(error));
        debug_assert_eq!(slots.len(), self.slots.len());
        slots.clone_from_slice(&self.slots);

        Self {
            slots,
            fill: self.fill,
            used: self.used,
            _policy: PhantomData,
        }
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table with the minimum capacity of the default
    /// policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use oa_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::new();
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty table with at least `capacity` slots.
    ///
    /// The slot count is the smallest power of two that is at least
    /// `capacity` and at least the policy's minimum capacity. Note that the
    /// table grows once two thirds of its slots are in use, so this is not
    /// the number of items it can hold without growing; use
    /// [`reserve`](HashTable::reserve) for that.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use oa_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }

    /// Fallible version of [`with_capacity`](HashTable::with_capacity).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use oa_hash::TryReserveError;
    /// # use oa_hash::hash_table::HashTable;
    /// #
    /// let table = HashTable::<u64>::try_with_capacity(usize::MAX);
    /// assert_eq!(table.err(), Some(TryReserveError::CapacityOverflow));
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_in(capacity, Global)
    }
}

impl<T, A: Allocator + Clone> HashTable<T, DefaultPolicy, A> {
    /// Creates an empty table that allocates its slots from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_capacity_and_policy_in(DefaultPolicy::MIN_CAPACITY, DefaultPolicy, alloc)
    }

    /// Creates an empty table with at least `capacity` slots allocated from
    /// `alloc`.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        Self::with_capacity_and_policy_in(capacity, DefaultPolicy, alloc)
    }

    /// Fallible version of [`with_capacity_in`](HashTable::with_capacity_in).
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_and_policy_in(capacity, DefaultPolicy, alloc)
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P: Policy> HashTable<T, P> {
    /// Creates an empty table configured by `P`.
    ///
    /// The policy value itself is not stored; policies are zero-sized
    /// markers and passing one lets the compiler infer `P`.
    pub fn with_policy(policy: P) -> Self {
        Self::with_capacity_and_policy_in(P::MIN_CAPACITY, policy, Global)
    }

    /// Creates an empty table configured by `P` with at least `capacity`
    /// slots.
    ///
    /// Capacity overflow and allocation failure are passed to
    /// [`Policy::out_of_memory`].
    pub fn with_capacity_and_policy(capacity: usize, policy: P) -> Self {
        Self::with_capacity_and_policy_in(capacity, policy, Global)
    }

    /// Fallible version of
    /// [`with_capacity_and_policy`](HashTable::with_capacity_and_policy).
    pub fn try_with_capacity_and_policy(
        capacity: usize,
        policy: P,
    ) -> Result<Self, TryReserveError> {
        Self::try_with_capacity_and_policy_in(capacity, policy, Global)
    }
}

impl<T, P: Policy, A: Allocator + Clone> HashTable<T, P, A> {
    /// Creates an empty table configured by `P` with at least `capacity`
    /// slots allocated from `alloc`.
    ///
    /// Capacity overflow and allocation failure are passed to
    /// [`Policy::out_of_memory`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use allocator_api2::alloc::Global;
    /// # use oa_hash::config::UncachedPolicy;
    /// # use oa_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64, _, _> =
    ///     HashTable::with_capacity_and_policy_in(100, UncachedPolicy, Global);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity_and_policy_in(capacity: usize, policy: P, alloc: A) -> Self {
        Self::with_capacity_inner(capacity, policy, alloc, Fallibility::Infallible)
            .unwrap_or_else(|error| P::out_of_memory(error))
    }

    /// Fallible version of
    /// [`with_capacity_and_policy_in`](HashTable::with_capacity_and_policy_in).
    pub fn try_with_capacity_and_policy_in(
        capacity: usize,
        policy: P,
        alloc: A,
    ) -> Result<Self, TryReserveError> {
        Self::with_capacity_inner(capacity, policy, alloc, Fallibility::Fallible)
    }

    fn with_capacity_inner(
        capacity: usize,
        _policy: P,
        alloc: A,
        fallibility: Fallibility,
    ) -> Result<Self, TryReserveError> {
        Ok(Self {
            slots: Self::allocate_slots(capacity, alloc, fallibility)?,
            fill: 0,
            used: 0,
            _policy: PhantomData,
        })
    }

    /// Returns a reference to the allocator backing the slot array.
    pub fn allocator(&self) -> &A {
        Box::allocator(&self.slots)
    }

    /// Allocates `max(MIN_CAPACITY, min_size).next_power_of_two()` empty
    /// slots from `alloc`.
    fn allocate_slots(
        min_size: usize,
        alloc: A,
        fallibility: Fallibility,
    ) -> Result<Box<[Slot<T, P::HashCache>], A>, TryReserveError> {
        const {
            assert!(
                P::MIN_CAPACITY.is_power_of_two(),
                "Policy::MIN_CAPACITY must be a power of two"
            );
            assert!(
                P::SMALL_TABLE_GROWTH >= 2 && P::LARGE_TABLE_GROWTH >= 2,
                "Policy growth factors must be at least 2"
            );
        }

        let capacity = min_size
            .max(P::MIN_CAPACITY)
            .checked_next_power_of_two()
            .ok_or_else(|| fallibility.capacity_overflow::<P>())?;
        let layout = Layout::array::<Slot<T, P::HashCache>>(capacity)
            .map_err(|_| fallibility.capacity_overflow::<P>())?;

        let mut slots = allocator_api2::vec::Vec::new_in(alloc);
        if slots.try_reserve_exact(capacity).is_err() {
            return Err(fallibility.alloc_err::<P>(layout));
        }
        slots.resize_with(capacity, || Slot::Empty);

        Ok(slots.into_boxed_slice())
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Returns the number of items in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use oa_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.len(), 0);
    ///
    /// table
    ///     .entry(hash_u64(1), |&n: &u64| n == 1, |&n| hash_u64(n))
    ///     .or_insert(1);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.used
    }

    /// Returns `true` if the table contains no items.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Returns the number of slots, always a power of two.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstones left by removals since the table
    /// last grew or was cleared.
    pub fn tombstones(&self) -> usize {
        self.fill - self.used
    }

    /// Returns an iterator over all items in the table.
    ///
    /// Items are yielded in slot order, which is unrelated to insertion
    /// order.
    pub fn iter(&self) -> Iter<'_, T, P> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.used,
        }
    }

    /// Returns an iterator over mutable references to all items.
    ///
    /// Modifying an item in a way that changes its hash or equality breaks
    /// later lookups of that item.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, P> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.used,
        }
    }

    /// Returns an iterator that removes and yields all items from the table.
    ///
    /// Once the iterator is exhausted or dropped the table is empty, keeps
    /// its capacity and holds no tombstones.
    pub fn drain(&mut self) -> Drain<'_, T, P, A> {
        Drain {
            table: self,
            index: 0,
        }
    }

    /// Cursor-based iteration.
    ///
    /// Scans forward from slot `pos` and returns the first live item together
    /// with the position to resume from, or `None` once no live item remains
    /// at or after `pos`. Start with `pos = 0`. Resume positions are always
    /// at least 1.
    ///
    /// The cursor keeps no borrow between calls, so the table may be mutated
    /// in between; items may then be skipped or visited twice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use oa_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// for n in [3, 5, 7] {
    ///     table.entry(n, |&v| v == n, |&v| v).or_insert(n);
    /// }
    ///
    /// let mut sum = 0;
    /// let mut pos = 0;
    /// while let Some((next, &n)) = table.next_from(pos) {
    ///     sum += n;
    ///     pos = next;
    /// }
    /// assert_eq!(sum, 15);
    /// ```
    pub fn next_from(&self, pos: usize) -> Option<(usize, &T)> {
        self.slots
            .get(pos..)?
            .iter()
            .enumerate()
            .find_map(|(offset, slot)| slot.item().map(|item| (pos + offset + 1, item)))
    }

    /// Removes all items, keeping the capacity.
    ///
    /// Tombstones are cleared as well.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Empty);
        self.fill = 0;
        self.used = 0;
    }

    /// Makes sure `additional` more items can be inserted without the table
    /// growing.
    ///
    /// If the table has to be reallocated, tombstones are purged along the
    /// way. The capacity never decreases. `hasher` recomputes an item's hash when the policy does not
    /// cache hashes. Failure is passed to [`Policy::out_of_memory`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use oa_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.reserve(100, |&n| n);
    /// let capacity = table.capacity();
    ///
    /// for n in 0..100 {
    ///     table.entry(n, |&v| v == n, |&v| v).or_insert(n);
    /// }
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&T) -> u64) {
        if let Err(error) = self.reserve_inner(additional, hasher, Fallibility::Infallible) {
            P::out_of_memory(error)
        }
    }

    /// Fallible version of [`reserve`](HashTable::reserve).
    pub fn try_reserve(
        &mut self,
        additional: usize,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<(), TryReserveError> {
        self.reserve_inner(additional, hasher, Fallibility::Fallible)
    }

    fn reserve_inner(
        &mut self,
        additional: usize,
        hasher: impl Fn(&T) -> u64,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        if (self.fill as u128 + additional as u128) * 3 < self.slots.len() as u128 * 2 {
            log::trace!(
                "reserve({additional}) fits in {} slots without growing",
                self.slots.len()
            );
            return Ok(());
        }

        let min_size = self
            .used
            .checked_add(additional)
            .and_then(|required| required.checked_mul(3))
            .map(|n| n / 2 + 1)
            .ok_or_else(|| fallibility.capacity_overflow::<P>())?;
        self.resize(min_size.max(self.slots.len()), hasher, fallibility, None)
            .map(|_| ())
    }

    /// Finds an item by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use oa_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table
    ///     .entry(hash_u64(42), |&n: &u64| n == 42, |&n| hash_u64(n))
    ///     .or_insert(42);
    ///
    /// assert_eq!(table.find(hash_u64(42), |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(hash_u64(99), |&n| n == 99), None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&T> {
        if self.used == 0 {
            return None;
        }

        match self.find_slot(hash, eq) {
            Probe::Found(index) => self.slots[index].item(),
            Probe::Vacant(_) => None,
        }
    }

    /// Finds an item by hash and equality predicate, returning a mutable
    /// reference.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        if self.used == 0 {
            return None;
        }

        match self.find_slot(hash, eq) {
            Probe::Found(index) => self.slots[index].item_mut(),
            Probe::Vacant(_) => None,
        }
    }

    /// Removes and returns an item.
    ///
    /// The slot becomes a tombstone: the length drops by one, the fill does
    /// not, and the table never shrinks.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use oa_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(42, |&n: &u64| n == 42, |&n| n).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.tombstones(), 1);
    ///
    /// assert_eq!(table.remove(99, |&n| n == 99), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<T> {
        if self.used == 0 {
            return None;
        }

        match self.find_slot(hash, eq) {
            Probe::Found(index) => Some(self.take_slot(index)),
            Probe::Vacant(_) => None,
        }
    }

    /// Keeps only the items for which `f` returns `true`. Removed items
    /// leave tombstones.
    pub fn retain(&mut self, mut f: impl FnMut(&mut T) -> bool) {
        for slot in self.slots.iter_mut() {
            if let Slot::Occupied { item, .. } = &mut *slot
                && !f(item)
            {
                *slot = Slot::Deleted;
                self.used -= 1;
            }
        }
    }

    /// Gets the entry for the given hash and equality predicate.
    ///
    /// Looking up an entry never reallocates. If inserting through a vacant
    /// entry takes the table to two thirds full, the table grows right after
    /// the write; `hasher` recomputes item hashes during that growth when the
    /// policy does not cache them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use oa_hash::hash_table::Entry;
    /// # use oa_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("hello");
    ///
    /// match table.entry(hash, |s: &String| s == "hello", |s| hash_str(s)) {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert("hello".to_string());
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         entry.get_mut().push('!');
    ///     }
    /// }
    ///
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn entry<H>(
        &mut self,
        hash: u64,
        eq: impl Fn(&T) -> bool,
        hasher: H,
    ) -> Entry<'_, T, H, P, A>
    where
        H: Fn(&T) -> u64,
    {
        match self.find_slot(hash, eq) {
            Probe::Found(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Probe::Vacant(index) => Entry::Vacant(VacantEntry {
                table: self,
                hash,
                index,
                hasher,
            }),
        }
    }

    pub(crate) fn occupied_entry(&mut self, index: usize) -> OccupiedEntry<'_, T, P, A> {
        debug_assert!(self.slots[index].item().is_some());
        OccupiedEntry { table: self, index }
    }

    /// Writes `value` into the vacant slot `index` found by
    /// [`find_slot`](HashTable::find_slot), growing the table if the write
    /// reaches the fill threshold.
    pub(crate) fn insert_at(
        &mut self,
        index: usize,
        hash: u64,
        value: T,
        hasher: impl Fn(&T) -> u64,
    ) -> &mut T {
        match self.slots[index] {
            Slot::Empty => self.fill += 1,
            Slot::Deleted => {}
            Slot::Occupied { .. } => unreachable!("vacant entry points at an occupied slot"),
        }
        self.used += 1;
        self.slots[index] = Slot::Occupied {
            hash: <P::HashCache as HashCache>::store(hash),
            item: value,
        };

        let index = if self.at_fill_threshold() {
            self.grow_after_insert(index, hasher)
        } else {
            index
        };
        debug_assert!(!self.at_fill_threshold());
        self.slots[index].occupied_mut()
    }

    /// Walks the probe sequence for `hash`.
    ///
    /// Tombstones are skipped over but the first one is remembered as the
    /// insertion point. Terminates because at least one slot is always
    /// empty.
    #[inline]
    pub(crate) fn find_slot(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Probe {
        let mask = self.mask();
        let mut pos = hash as usize & mask;
        let mut tombstone = None;

        loop {
            match &self.slots[pos] {
                Slot::Empty => return Probe::Vacant(tombstone.unwrap_or(pos)),
                Slot::Deleted => {
                    if tombstone.is_none() {
                        tombstone = Some(pos);
                    }
                }
                Slot::Occupied { hash: cached, item } => {
                    if cached.may_match(hash) && eq(item) {
                        return Probe::Found(pos);
                    }
                }
            }
            pos = (pos + 1) & mask;
        }
    }

    /// First empty slot on the probe sequence for `hash`.
    #[inline]
    fn find_empty_slot(&self, hash: u64) -> usize {
        let mask = self.mask();
        let mut pos = hash as usize & mask;
        while !self.slots[pos].is_empty() {
            pos = (pos + 1) & mask;
        }
        pos
    }

    /// Whether occupied slots plus tombstones reach two thirds of the slots.
    #[inline(always)]
    fn at_fill_threshold(&self) -> bool {
        self.fill as u128 * 3 >= self.slots.len() as u128 * 2
    }

    /// Grows the table after a write and returns the new slot of the item
    /// that was written at `index`.
    #[cold]
    #[inline(never)]
    fn grow_after_insert(&mut self, index: usize, hasher: impl Fn(&T) -> u64) -> usize {
        let min_size = growth_target::<P>(self.used)
            .unwrap_or_else(|| P::out_of_memory(TryReserveError::CapacityOverflow));
        match self.resize(min_size, hasher, Fallibility::Infallible, Some(index)) {
            Ok(Some(moved)) => moved,
            Ok(None) => unreachable!("inserted item was not carried over by the resize"),
            Err(error) => P::out_of_memory(error),
        }
    }

    /// Moves every live item into a fresh slot array of at least `min_size`
    /// slots. Tombstones are dropped.
    ///
    /// Returns the new slot of the item that lived at `track`, if any.
    fn resize(
        &mut self,
        min_size: usize,
        hasher: impl Fn(&T) -> u64,
        fallibility: Fallibility,
        track: Option<usize>,
    ) -> Result<Option<usize>, TryReserveError> {
        debug_assert!(min_size > self.used);

        let new_slots = Self::allocate_slots(min_size, self.allocator().clone(), fallibility)?;
        let old_slots = core::mem::replace(&mut self.slots, new_slots);
        let old_capacity = old_slots.len();
        let purged = self.fill - self.used;
        let mut tracked = None;

        for (old_index, slot) in old_slots.into_vec().into_iter().enumerate() {
            if let Slot::Occupied { hash, item } = slot {
                let full_hash = hash.get().unwrap_or_else(|| hasher(&item));
                let index = self.find_empty_slot(full_hash);
                self.slots[index] = Slot::Occupied { hash, item };
                if track == Some(old_index) {
                    tracked = Some(index);
                }
            }
        }
        self.fill = self.used;

        log::debug!(
            "resized hash table from {old_capacity} to {} slots ({} live, {purged} tombstones purged)",
            self.slots.len(),
            self.used,
        );
        Ok(tracked)
    }

    fn take_slot(&mut self, index: usize) -> T {
        self.used -= 1;
        match core::mem::replace(&mut self.slots[index], Slot::Deleted) {
            Slot::Occupied { item, .. } => item,
            _ => unreachable!("probe reported a vacant slot as occupied"),
        }
    }

    /// Returns occupancy and memory statistics.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> DebugStats {
        let capacity = self.slots.len();
        let slot_size = core::mem::size_of::<Slot<T, P::HashCache>>();

        DebugStats {
            populated: self.used,
            tombstones: self.tombstones(),
            capacity,
            fill_ratio: self.fill as f64 / capacity as f64,
            load_factor: self.used as f64 / capacity as f64,
            total_bytes: capacity * slot_size,
            wasted_bytes: (capacity - self.used) * slot_size,
        }
    }

    /// Computes the distribution of probe distances of the live items.
    ///
    /// `hasher` is used when the policy does not cache hashes.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self, hasher: impl Fn(&T) -> u64) -> ProbeHistogram {
        let mask = self.mask();
        let mut histogram = ProbeHistogram::default();

        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { hash, item } = slot {
                let home = hash.get().unwrap_or_else(|| hasher(item)) as usize & mask;
                let distance = index.wrapping_sub(home) & mask;
                if histogram.bins.len() <= distance {
                    histogram.bins.resize(distance + 1, 0);
                }
                histogram.bins[distance] += 1;
            }
        }

        histogram
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, T, H, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    /// A vacant entry - the item is not present in the table
    Vacant(VacantEntry<'a, T, H, P, A>),
    /// An occupied entry - the item is present in the table
    Occupied(OccupiedEntry<'a, T, P, A>),
}

impl<'a, T, H, P, A> Entry<'a, T, H, P, A>
where
    H: Fn(&T) -> u64,
    P: Policy,
    A: Allocator + Clone,
{
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the item.
    pub fn or_insert(self, default: T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the item.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Runs `f` on the item if the entry is occupied.
    pub fn and_modify(self, f: impl FnOnce(&mut T)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
///
/// Points at the slot the item will occupy: the earliest tombstone on its
/// probe sequence, or the empty slot that ended it. Dropping it leaves the
/// table untouched.
pub struct VacantEntry<'a, T, H, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    table: &'a mut HashTable<T, P, A>,
    hash: u64,
    index: usize,
    hasher: H,
}

impl<'a, T, H, P, A> VacantEntry<'a, T, H, P, A>
where
    H: Fn(&T) -> u64,
    P: Policy,
    A: Allocator + Clone,
{
    /// Inserts the item and returns a mutable reference to it.
    ///
    /// Grows the table if the write takes it to two thirds full.
    pub fn insert(self, value: T) -> &'a mut T {
        let VacantEntry {
            table,
            hash,
            index,
            hasher,
        } = self;
        table.insert_at(index, hash, value, hasher)
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, T, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    table: &'a mut HashTable<T, P, A>,
    index: usize,
}

impl<'a, T, P: Policy, A: Allocator + Clone> OccupiedEntry<'a, T, P, A> {
    /// Gets a reference to the item.
    pub fn get(&self) -> &T {
        self.table.slots[self.index].occupied()
    }

    /// Gets a mutable reference to the item.
    pub fn get_mut(&mut self) -> &mut T {
        self.table.slots[self.index].occupied_mut()
    }

    /// Converts the entry into a mutable reference bound to the table's
    /// lifetime.
    pub fn into_mut(self) -> &'a mut T {
        let OccupiedEntry { table, index } = self;
        table.slots[index].occupied_mut()
    }

    /// Replaces the item, returning the old one.
    pub fn insert(&mut self, value: T) -> T {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the item, leaving a tombstone.
    pub fn remove(self) -> T {
        self.table.take_slot(self.index)
    }
}

/// An iterator over the items of a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, T, P: Policy = DefaultPolicy> {
    slots: core::slice::Iter<'a, Slot<T, P::HashCache>>,
    remaining: usize,
}

impl<'a, T, P: Policy> Iterator for Iter<'a, T, P> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let item = self.slots.find_map(Slot::item)?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, P: Policy> ExactSizeIterator for Iter<'_, T, P> {}
impl<T, P: Policy> FusedIterator for Iter<'_, T, P> {}

/// A mutable iterator over the items of a [`HashTable`].
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, T, P: Policy = DefaultPolicy> {
    slots: core::slice::IterMut<'a, Slot<T, P::HashCache>>,
    remaining: usize,
}

impl<'a, T, P: Policy> Iterator for IterMut<'a, T, P> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let item = self.slots.find_map(Slot::item_mut)?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, P: Policy> ExactSizeIterator for IterMut<'_, T, P> {}
impl<T, P: Policy> FusedIterator for IterMut<'_, T, P> {}

/// A draining iterator over the items of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, T, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    table: &'a mut HashTable<T, P, A>,
    index: usize,
}

impl<T, P: Policy, A: Allocator + Clone> Drop for Drain<'_, T, P, A> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

impl<T, P: Policy, A: Allocator + Clone> Iterator for Drain<'_, T, P, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.table.slots.len() {
            let slot = core::mem::replace(&mut self.table.slots[self.index], Slot::Empty);
            self.index += 1;
            match slot {
                Slot::Empty => {}
                Slot::Deleted => self.table.fill -= 1,
                Slot::Occupied { item, .. } => {
                    self.table.fill -= 1;
                    self.table.used -= 1;
                    return Some(item);
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.used, Some(self.table.used))
    }
}

impl<T, P: Policy, A: Allocator + Clone> ExactSizeIterator for Drain<'_, T, P, A> {}
impl<T, P: Policy, A: Allocator + Clone> FusedIterator for Drain<'_, T, P, A> {}

/// An owning iterator over the items of a [`HashTable`].
pub struct IntoIter<T, P: Policy = DefaultPolicy, A: Allocator + Clone = Global> {
    slots: allocator_api2::vec::IntoIter<Slot<T, P::HashCache>, A>,
    remaining: usize,
}

impl<T, P: Policy, A: Allocator + Clone> Iterator for IntoIter<T, P, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let item = self.slots.find_map(|slot| match slot {
            Slot::Occupied { item, .. } => Some(item),
            _ => None,
        })?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, P: Policy, A: Allocator + Clone> ExactSizeIterator for IntoIter<T, P, A> {}
impl<T, P: Policy, A: Allocator + Clone> FusedIterator for IntoIter<T, P, A> {}

impl<T, P: Policy, A: Allocator + Clone> IntoIterator for HashTable<T, P, A> {
    type IntoIter = IntoIter<T, P, A>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.used,
            slots: self.slots.into_vec().into_iter(),
        }
    }
}

impl<'a, T, P: Policy, A: Allocator + Clone> IntoIterator for &'a HashTable<T, P, A> {
    type IntoIter = Iter<'a, T, P>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
