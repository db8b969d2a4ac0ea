//! Explicit duplication for move-only containers.

use crate::{allocator::Allocator, config::Growth, dynamic_array::DynamicArray};

/// Builds a new array holding clones of every element of `source`, in order.
///
/// The copy reserves exactly `source.size()` slots and inherits the growth
/// policy; spare capacity of the source is not carried over.
pub fn deep_copy<V, A>(source: &DynamicArray<V, A>) -> DynamicArray<V, A>
where
  V: Clone,
  A: Allocator,
{
  let mut copy = DynamicArray::with_growth(source.growth());
  copy.reserve_additional(source.size());

  for value in source {
    copy.insert_as_last(value.clone());
  }

  copy
}

/// Builds an array from an iterator, reserving by the iterator's lower size
/// hint up front.
pub fn collect_into<V, A, I>(
  values: I,
  growth: Growth,
) -> DynamicArray<V, A>
where
  A: Allocator,
  I: IntoIterator<Item = V>,
{
  let values = values.into_iter();
  let mut array = DynamicArray::with_growth(growth);
  array.reserve_additional(values.size_hint().0);

  for value in values {
    array.insert_as_last(value);
  }

  array
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{DebugAllocator, TrackingAllocator};

  #[test]
  fn deep_copy_is_independent() {
    let mut source = DynamicArray::<String, DebugAllocator>::with_growth(Growth::REFERENCE);
    source.insert_as_last("a".to_owned());
    source.insert_as_last("b".to_owned());

    let mut copy = deep_copy(&source);
    copy.get_value_mut(0).push('!');

    assert_eq!(source.as_slice(), &["a", "b"]);
    assert_eq!(copy.as_slice(), &["a!", "b"]);
    assert_eq!(copy.reserved_size(), 2);
    assert_eq!(copy.growth(), Growth::REFERENCE);
  }

  #[test]
  fn deep_copy_of_empty_allocates_nothing() {
    type Tracked = TrackingAllocator<DebugAllocator>;
    Tracked::reset();

    let source = DynamicArray::<u8, Tracked>::new();
    let copy = deep_copy(&source);

    assert!(copy.is_empty());
    assert_eq!(Tracked::stats().allocations, 0);
  }

  #[test]
  fn collect_reserves_from_size_hint() {
    type Tracked = TrackingAllocator<DebugAllocator>;
    Tracked::reset();

    let array: DynamicArray<u32, Tracked> = collect_into(0..50, Growth::Geometric);

    assert_eq!(array.size(), 50);
    assert_eq!(array.reserved_size(), 50);
    assert_eq!(Tracked::stats().reallocations, 0);
    assert_eq!(array.as_slice(), (0..50).collect::<Vec<_>>().as_slice());
  }
}
