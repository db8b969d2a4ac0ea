use std::{cmp, ptr, ptr::NonNull};

use libc::c_void;
use tracing::trace;

use crate::{
  allocator::{Allocator, out_of_memory},
  config::{FREED_POISON, UNINIT_FILL},
  header::{HEADER_SIZE, Header},
};

/// Instrumented allocator for debug builds.
///
/// ```text
///   base (from malloc)                 pointer returned to caller
///   │                                  │
///   ▼                                  ▼
///   ┌──────────────┬───────────────────┬──────────────────────────┐
///   │   padding    │   size: usize     │      size bytes          │
///   └──────────────┴───────────────────┴──────────────────────────┘
///   └──────────── HEADER_SIZE ─────────┘
/// ```
///
/// Fresh blocks are filled with [`UNINIT_FILL`], released blocks are poisoned
/// with [`FREED_POISON`], and `realloc_raw` always moves the block so callers
/// that keep a stale pointer read poison instead of plausible data.
#[derive(Clone, Copy, Debug, Default)]
pub struct DebugAllocator;

unsafe impl Allocator for DebugAllocator {
  fn alloc_raw(size: usize) -> NonNull<u8> {
    assert!(size > 0, "zero-sized raw allocation");

    let Some(total) = size.checked_add(HEADER_SIZE) else {
      out_of_memory(size)
    };

    let Some(base) = NonNull::new(unsafe { libc::malloc(total) }.cast::<u8>()) else {
      out_of_memory(total)
    };

    unsafe {
      let payload = Header::install(base, size);
      ptr::write_bytes(payload.as_ptr(), UNINIT_FILL, size);

      trace!(size, address = ?payload, "alloc");

      payload
    }
  }

  unsafe fn free_raw(block: NonNull<u8>) {
    unsafe {
      let Header { size } = Header::read(block);
      ptr::write_bytes(block.as_ptr(), FREED_POISON, size);

      trace!(size, address = ?block, "free");

      libc::free(Header::base(block).as_ptr().cast::<c_void>());
    }
  }

  unsafe fn realloc_raw(
    block: NonNull<u8>,
    new_size: usize,
  ) -> NonNull<u8> {
    assert!(new_size > 0, "zero-sized reallocation");

    unsafe {
      let Header { size: old_size } = Header::read(block);
      let moved = Self::alloc_raw(new_size);

      ptr::copy_nonoverlapping(block.as_ptr(), moved.as_ptr(), cmp::min(old_size, new_size));

      trace!(old_size, new_size, from = ?block, to = ?moved, "realloc");

      Self::free_raw(block);

      moved
    }
  }

  unsafe fn block_size(block: NonNull<u8>) -> Option<usize> {
    Some(unsafe { Header::read(block) }.size)
  }
}
