use std::{mem, ptr::NonNull};

use crate::{MAX_ALIGN, align_to};

/// Bytes reserved in front of every debug block.
///
/// The slot is padded up to [`MAX_ALIGN`] so the payload keeps the platform's
/// fundamental alignment. Only its last machine word holds data.
pub const HEADER_SIZE: usize = align_to!(mem::size_of::<Header>(), MAX_ALIGN);

/// The hidden word stored immediately before a debug block's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Header {
  pub size: usize,
}

impl Header {
  pub fn new(size: usize) -> Self {
    Self { size }
  }

  /// Writes a header for `size` bytes into a fresh allocation starting at
  /// `base` and returns the payload pointer handed to callers.
  ///
  /// # Safety
  ///
  /// `base` must point to at least `HEADER_SIZE + size` writable bytes aligned
  /// to `MAX_ALIGN`.
  pub unsafe fn install(
    base: NonNull<u8>,
    size: usize,
  ) -> NonNull<u8> {
    unsafe {
      let payload = base.add(HEADER_SIZE);
      Self::slot(payload).write(Self::new(size));
      payload
    }
  }

  /// Reads the header that precedes `payload`.
  ///
  /// # Safety
  ///
  /// `payload` must have been returned by [`Header::install`] and not yet
  /// released.
  pub unsafe fn read(payload: NonNull<u8>) -> Self {
    unsafe { Self::slot(payload).read() }
  }

  /// Rewinds `payload` to the base address originally obtained from the
  /// platform allocator.
  ///
  /// # Safety
  ///
  /// Same as [`Header::read`].
  pub unsafe fn base(payload: NonNull<u8>) -> NonNull<u8> {
    unsafe { payload.sub(HEADER_SIZE) }
  }

  unsafe fn slot(payload: NonNull<u8>) -> NonNull<Header> {
    unsafe { payload.sub(mem::size_of::<Header>()).cast::<Header>() }
  }
}
