use std::{cell::Cell, marker::PhantomData, ptr::NonNull};

use crate::allocator::Allocator;

/// Per-thread allocation counters collected by [`TrackingAllocator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
  pub allocations: usize,
  pub frees: usize,
  pub reallocations: usize,
}

impl AllocStats {
  /// Blocks allocated and not yet released.
  ///
  /// Blocks allocated before the last [`TrackingAllocator::reset`] but freed
  /// after it are not counted, so the result bottoms out at zero.
  pub fn live_blocks(&self) -> usize {
    self.allocations.saturating_sub(self.frees)
  }
}

thread_local! {
  static STATS: Cell<AllocStats> = const {
    Cell::new(AllocStats {
      allocations: 0,
      frees: 0,
      reallocations: 0,
    })
  };
}

fn record(update: impl FnOnce(&mut AllocStats)) {
  STATS.with(|stats| {
    let mut current = stats.get();
    update(&mut current);
    stats.set(current);
  });
}

/// Wraps another strategy and counts the calls made through it.
///
/// Counters live in thread-local storage and are shared by every
/// `TrackingAllocator<_>` instantiation on the thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrackingAllocator<A> {
  _inner: PhantomData<A>,
}

impl<A: Allocator> TrackingAllocator<A> {
  /// Snapshot of this thread's counters.
  pub fn stats() -> AllocStats {
    STATS.with(Cell::get)
  }

  /// Zeroes this thread's counters.
  pub fn reset() {
    STATS.with(|stats| stats.set(AllocStats::default()));
  }
}

unsafe impl<A: Allocator> Allocator for TrackingAllocator<A> {
  fn alloc_raw(size: usize) -> NonNull<u8> {
    let block = A::alloc_raw(size);
    record(|stats| stats.allocations += 1);
    block
  }

  unsafe fn free_raw(block: NonNull<u8>) {
    unsafe { A::free_raw(block) };
    record(|stats| stats.frees += 1);
  }

  unsafe fn realloc_raw(
    block: NonNull<u8>,
    new_size: usize,
  ) -> NonNull<u8> {
    let block = unsafe { A::realloc_raw(block, new_size) };
    record(|stats| stats.reallocations += 1);
    block
  }

  unsafe fn block_size(block: NonNull<u8>) -> Option<usize> {
    unsafe { A::block_size(block) }
  }
}
