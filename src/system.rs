use std::ptr::NonNull;

use libc::c_void;

use crate::allocator::{Allocator, out_of_memory};

/// Pass-through to the platform C allocator.
///
/// No bookkeeping, no poisoning: `realloc_raw` is the native `realloc(3)` and
/// may resize in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

unsafe impl Allocator for SystemAllocator {
  fn alloc_raw(size: usize) -> NonNull<u8> {
    debug_assert!(size > 0, "zero-sized raw allocation");

    let address = unsafe { libc::malloc(size) };

    match NonNull::new(address.cast::<u8>()) {
      Some(block) => block,
      None => out_of_memory(size),
    }
  }

  unsafe fn free_raw(block: NonNull<u8>) {
    unsafe { libc::free(block.as_ptr().cast::<c_void>()) };
  }

  unsafe fn realloc_raw(
    block: NonNull<u8>,
    new_size: usize,
  ) -> NonNull<u8> {
    debug_assert!(new_size > 0, "zero-sized reallocation");

    let address = unsafe { libc::realloc(block.as_ptr().cast::<c_void>(), new_size) };

    match NonNull::new(address.cast::<u8>()) {
      Some(block) => block,
      None => out_of_memory(new_size),
    }
  }
}
