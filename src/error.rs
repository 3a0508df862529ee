use core::alloc::Layout;

/// The error type for operations that allocate a new slot array.
///
/// Returned by the `try_*` constructors and by `try_reserve`. The infallible
/// counterparts hand the same value to [`Policy::out_of_memory`] instead.
///
/// [`Policy::out_of_memory`]: crate::config::Policy::out_of_memory
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TryReserveError {
    /// The requested slot count does not fit in a power-of-two `usize`, or
    /// the slot array would exceed `isize::MAX` bytes.
    #[error("hash table capacity overflow")]
    CapacityOverflow,

    /// The global allocator could not provide the slot array.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocError {
        /// The layout of the allocation request that failed.
        layout: Layout,
    },
}

/// Whether a failed allocation is reported to the caller or routed to the
/// policy's out-of-memory hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fallibility {
    Fallible,
    Infallible,
}

impl Fallibility {
    #[inline]
    pub(crate) fn capacity_overflow<P: crate::config::Policy>(self) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::CapacityOverflow,
            Fallibility::Infallible => P::out_of_memory(TryReserveError::CapacityOverflow),
        }
    }

    #[inline]
    pub(crate) fn alloc_err<P: crate::config::Policy>(self, layout: Layout) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::AllocError { layout },
            Fallibility::Infallible => P::out_of_memory(TryReserveError::AllocError { layout }),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TryReserveError::CapacityOverflow.to_string(),
            "hash table capacity overflow"
        );

        let layout = Layout::array::<u64>(4).unwrap();
        assert_eq!(
            TryReserveError::AllocError { layout }.to_string(),
            "memory allocation of 32 bytes failed"
        );
    }

    #[test]
    fn fallible_returns_errors() {
        let layout = Layout::new::<u8>();
        assert_eq!(
            Fallibility::Fallible.capacity_overflow::<crate::config::DefaultPolicy>(),
            TryReserveError::CapacityOverflow
        );
        assert_eq!(
            Fallibility::Fallible.alloc_err::<crate::config::DefaultPolicy>(layout),
            TryReserveError::AllocError { layout }
        );
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn infallible_overflow_diverges() {
        let _ = Fallibility::Infallible.capacity_overflow::<crate::config::DefaultPolicy>();
    }
}
