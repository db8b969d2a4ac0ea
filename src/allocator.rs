use std::{
  alloc::{Layout, handle_alloc_error},
  marker::PhantomData,
  mem,
  ptr::NonNull,
};

use crate::MAX_ALIGN;

/// A static allocation strategy.
///
/// Implementors are capabilities rather than objects: every operation is an
/// associated function, so containers select a strategy purely through a type
/// parameter and carry no allocator state.
///
/// Raw blocks are untyped, uninitialized and aligned to [`MAX_ALIGN`]. A block
/// must only ever be released or resized through the allocator that produced
/// it.
///
/// Running out of memory is fatal: implementations call
/// [`handle_alloc_error`] instead of returning.
///
/// # Safety
///
/// Implementations must return blocks valid for reads and writes of at least
/// the requested size, aligned to `MAX_ALIGN`, and `realloc_raw` must preserve
/// the first `min(old, new)` bytes.
pub unsafe trait Allocator: Sized {
  /// Allocates an uninitialized block of at least `size` bytes.
  ///
  /// `size` must be non-zero.
  fn alloc_raw(size: usize) -> NonNull<u8>;

  /// Releases a block obtained from [`Allocator::alloc_raw`] or
  /// [`Allocator::realloc_raw`].
  ///
  /// # Safety
  ///
  /// `block` must come from this allocator and must not have been released or
  /// resized since. Double frees are not detected.
  unsafe fn free_raw(block: NonNull<u8>);

  /// Resizes `block` to `new_size` bytes, preserving its leading content.
  ///
  /// The returned pointer may differ from `block`. Either way `block` is
  /// invalid once this returns and must not be used again.
  ///
  /// # Safety
  ///
  /// Same as [`Allocator::free_raw`]; `new_size` must be non-zero.
  unsafe fn realloc_raw(
    block: NonNull<u8>,
    new_size: usize,
  ) -> NonNull<u8>;

  /// Size recorded for `block`, when the strategy keeps one.
  ///
  /// # Safety
  ///
  /// `block` must be a live block from this allocator.
  unsafe fn block_size(_block: NonNull<u8>) -> Option<usize> {
    None
  }

  /// Moves `value` into a freshly allocated slot.
  fn alloc<T>(value: T) -> NonNull<T> {
    Self::alloc_with(move || value)
  }

  /// Allocates a slot for a `T` and constructs the value in place from
  /// `init`.
  ///
  /// If `init` panics the slot is released before unwinding continues.
  fn alloc_with<T, F>(init: F) -> NonNull<T>
  where
    F: FnOnce() -> T,
  {
    const {
      assert!(
        mem::align_of::<T>() <= MAX_ALIGN,
        "type alignment exceeds the allocator's block alignment"
      )
    };

    let slot = Self::alloc_raw(mem::size_of::<T>().max(1)).cast::<T>();
    let guard = SlotGuard::<Self> {
      block: slot.cast(),
      _allocator: PhantomData,
    };

    unsafe { slot.write(init()) };
    mem::forget(guard);

    slot
  }

  /// Drops the object behind `object` and releases its slot.
  ///
  /// # Safety
  ///
  /// `object` must come from [`Allocator::alloc`] or
  /// [`Allocator::alloc_with`] on this allocator and must not be used after
  /// this call.
  unsafe fn free<T>(object: NonNull<T>) {
    unsafe {
      object.drop_in_place();
      Self::free_raw(object.cast());
    }
  }
}

/// Releases a typed slot whose constructor unwound.
struct SlotGuard<A: Allocator> {
  block: NonNull<u8>,
  _allocator: PhantomData<fn() -> A>,
}

impl<A: Allocator> Drop for SlotGuard<A> {
  fn drop(&mut self) {
    unsafe { A::free_raw(self.block) };
  }
}

/// Aborts through the global OOM hook for a failed request of `size` bytes.
pub(crate) fn out_of_memory(size: usize) -> ! {
  match Layout::from_size_align(size, MAX_ALIGN) {
    Ok(layout) => handle_alloc_error(layout),
    Err(_) => panic!("allocation of {size} bytes exceeds the address space"),
  }
}
