//! Tunables shared by the allocators and containers.

/// Number of elements the reference growth policy adds per step.
pub const GROWTH_BLOCK_SIZE: usize = 5;

/// Byte pattern written over fresh debug blocks.
pub const UNINIT_FILL: u8 = 0xCD;

/// Byte pattern written over debug blocks as they are released.
pub const FREED_POISON: u8 = 0xDD;

/// Byte pattern written over an array slot after its element is dropped
/// (debug builds only).
pub const REMOVED_FILL: u8 = 0xDB;

/// How a [`DynamicArray`](crate::DynamicArray) extends its backing block when
/// an append runs out of room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Growth {
  /// Add a constant number of elements each time.
  ///
  /// Every growth step copies the whole array, so sustained appends cost
  /// O(n^2) in total.
  Fixed(usize),
  /// Double the capacity, adding at least [`GROWTH_BLOCK_SIZE`] elements.
  #[default]
  Geometric,
}

impl Growth {
  /// Fixed-step growth by [`GROWTH_BLOCK_SIZE`] elements.
  pub const REFERENCE: Growth = Growth::Fixed(GROWTH_BLOCK_SIZE);

  /// Number of extra elements to reserve when `capacity` slots are full.
  pub fn additional(
    self,
    capacity: usize,
  ) -> usize {
    match self {
      Growth::Fixed(step) => step.max(1),
      Growth::Geometric => capacity.max(GROWTH_BLOCK_SIZE),
    }
  }
}
