//! # mist - Allocator Capabilities and a Placement-Constructed Dynamic Array
//!
//! This crate provides a small **static allocator abstraction** and a
//! **dynamic array** that stores its elements in a single untyped block
//! obtained from that allocator.
//!
//! ## Overview
//!
//! An allocator here is a *capability*, not an object: a type whose
//! associated functions allocate, free and resize raw blocks. Containers are
//! generic over it, so the storage strategy is picked at compile time and
//! costs nothing at runtime.
//!
//! ```text
//!   Layering:
//!
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                  DynamicArray<V, A>                          │
//!   │   memory ──► ┌─────┬─────┬─────┬───────────────────────┐     │
//!   │              │ V₀  │ V₁  │ V₂  │   raw, unconstructed  │     │
//!   │              └─────┴─────┴─────┴───────────────────────┘     │
//!   │              ◄─ item_count ───►                              │
//!   │              ◄──────────── memory_size (bytes) ──────────►   │
//!   └──────────────────────────────┬───────────────────────────────┘
//!                                  │ alloc_raw / realloc_raw / free_raw
//!                                  ▼
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │  A: Allocator   (SystemAllocator | DebugAllocator | ...)     │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   mist
//!   ├── align          - Alignment macro (align_to!)
//!   ├── allocator      - The Allocator capability trait
//!   ├── config         - Growth policy and fill patterns
//!   ├── copy           - Explicit deep copy and collection helpers
//!   ├── debug          - DebugAllocator (size header, poisoning)
//!   ├── dynamic_array  - DynamicArray
//!   ├── error          - ArrayError for the checked operations
//!   ├── header         - Hidden size header (internal)
//!   ├── system         - SystemAllocator (libc pass-through)
//!   └── tracking       - TrackingAllocator (per-thread counters)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use mist::DynamicArray;
//!
//! let mut array = DynamicArray::<i32>::new();
//!
//! for _ in 0..10 {
//!     array.insert_as_last(5);
//! }
//! assert_eq!(array.size(), 10);
//! assert_eq!(*array.first_value(), 5);
//!
//! array.remove_last();
//! array.shrink_to_size();
//! assert_eq!(array.reserved_size(), array.size());
//!
//! array.clear();
//! assert_eq!(array.reserved_size(), 0);
//! ```
//!
//! ## Debug vs. Release
//!
//! [`DefaultAllocator`] is resolved at build time. With `debug_assertions` on,
//! or with the `debug-alloc` feature, it is [`DebugAllocator`]:
//!
//! ```text
//!   ┌──────────────────────┬────────────────────────────────┐
//!   │    Header slot       │         User Data              │
//!   │  ┌────────────────┐  │                                │
//!   │  │ size: N        │  │   N bytes, filled with 0xCD    │
//!   │  └────────────────┘  │   poisoned with 0xDD on free   │
//!   │  MAX_ALIGN bytes     │                                │
//!   └──────────────────────┴────────────────────────────────┘
//!                          ▲
//!                          └── Pointer returned to user
//! ```
//!
//! Otherwise it is [`SystemAllocator`], which forwards straight to
//! `malloc`/`realloc`/`free`.
//!
//! ## Contract Violations
//!
//! Out-of-bounds indexing, removing from an empty array and resizing to zero
//! panic. The `try_*` methods report the same conditions as [`ArrayError`],
//! and the `unsafe` `*_unchecked` methods skip the check entirely outside of
//! debug builds. Allocation failure always aborts through
//! [`std::alloc::handle_alloc_error`].
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization anywhere
//! - **Tail-only removal**: no removal from the middle of an array
//! - **Alignment**: blocks are aligned to [`MAX_ALIGN`]; over-aligned types
//!   are rejected at compile time
//! - **Unix-only**: requires `libc`

pub mod align;
pub mod allocator;
pub mod config;
pub mod copy;
mod debug;
mod dynamic_array;
pub mod error;
mod header;
mod system;
mod tracking;

pub use allocator::Allocator;
pub use config::Growth;
pub use debug::DebugAllocator;
pub use dynamic_array::DynamicArray;
pub use error::ArrayError;
pub use system::SystemAllocator;
pub use tracking::{AllocStats, TrackingAllocator};

/// Alignment of every raw block handed out by the allocators in this crate.
pub const MAX_ALIGN: usize = std::mem::align_of::<libc::max_align_t>();

cfg_if::cfg_if! {
  if #[cfg(any(debug_assertions, feature = "debug-alloc"))] {
    /// Allocator used when none is named: [`DebugAllocator`] in this build.
    pub type DefaultAllocator = DebugAllocator;
  } else {
    /// Allocator used when none is named: [`SystemAllocator`] in this build.
    pub type DefaultAllocator = SystemAllocator;
  }
}
