use std::{
  fmt,
  marker::PhantomData,
  mem,
  ops::{Deref, DerefMut, Index, IndexMut},
  ptr::{self, NonNull},
  slice,
};

use tracing::debug;

use crate::{
  DefaultAllocator, MAX_ALIGN,
  allocator::Allocator,
  config::Growth,
  error::ArrayError,
};

/// A contiguous, growable sequence that owns a single untyped block.
///
/// Only the first `size()` slots of the block hold live values; the rest of
/// the reserved capacity is raw memory and is never treated as a `V`. Values
/// are constructed in place on append and dropped individually from the tail.
///
/// The backing block comes from `A`, a static [`Allocator`]. Swapping `A` for
/// another strategy leaves the array logic untouched.
///
/// `DynamicArray` is move-only. There is no `Clone`; use
/// [`deep_copy`](crate::copy::deep_copy) when a duplicate is really wanted.
///
/// # Invalidation
///
/// References and raw pointers obtained from the array (`get_value`,
/// `first_value`, `last_value`, `as_raw_array`, slices) become dangling after
/// any call that may touch the block: `insert_as_last`, `resize`,
/// `reserve_additional`, `shrink_to_size` and `clear`. The borrow checker
/// rejects this for references; raw pointers are the caller's problem.
pub struct DynamicArray<V, A: Allocator = DefaultAllocator> {
  memory: Option<NonNull<u8>>,
  item_count: usize,
  memory_size: usize,
  growth: Growth,
  _marker: PhantomData<(V, A)>,
}

impl<V, A: Allocator> DynamicArray<V, A> {
  const ITEM_SIZE: usize = {
    assert!(mem::size_of::<V>() != 0, "zero-sized element types are not supported");
    assert!(
      mem::align_of::<V>() <= MAX_ALIGN,
      "element alignment exceeds the allocator's block alignment"
    );
    mem::size_of::<V>()
  };

  /// Creates an empty array. Nothing is allocated until the first insert.
  pub const fn new() -> Self {
    Self::with_growth(Growth::Geometric)
  }

  /// Creates an empty array with a custom growth policy.
  pub const fn with_growth(growth: Growth) -> Self {
    Self {
      memory: None,
      item_count: 0,
      memory_size: 0,
      growth,
      _marker: PhantomData,
    }
  }

  /// Creates an empty array with room for `reserved` elements.
  ///
  /// No element is constructed, so indexing is still out of bounds.
  pub fn with_reserved(reserved: usize) -> Self {
    let mut array = Self::new();
    array.reserve_additional(reserved);
    array
  }

  /// Appends `value` at the end, growing the block if it is full.
  pub fn insert_as_last(
    &mut self,
    value: V,
  ) {
    self.insert_as_last_with(move || value);
  }

  /// Appends the value produced by `init`, constructed directly in its slot.
  pub fn insert_as_last_with<F>(
    &mut self,
    init: F,
  ) where
    F: FnOnce() -> V,
  {
    if self.memory_size < self.byte_len(self.item_count + 1) {
      let previous = self.memory_size;
      self.reserve_additional(self.growth.additional(self.reserved_size()));
      debug_assert!(self.memory_size > previous);
    }

    unsafe { self.slot(self.item_count).write(init()) };
    self.item_count += 1;
  }

  /// Drops the last element. Capacity is left as is.
  ///
  /// # Panics
  ///
  /// Panics if the array is empty.
  pub fn remove_last(&mut self) {
    assert!(self.item_count > 0, "remove_last on an empty array");
    unsafe { self.remove_last_unchecked() };
  }

  /// Drops the last element, or reports that there was none.
  pub fn try_remove_last(&mut self) -> Result<(), ArrayError> {
    if self.item_count == 0 {
      return Err(ArrayError::Empty);
    }
    unsafe { self.remove_last_unchecked() };
    Ok(())
  }

  /// Drops the last element without checking that one exists.
  ///
  /// # Safety
  ///
  /// The array must not be empty. Only debug builds verify this.
  pub unsafe fn remove_last_unchecked(&mut self) {
    debug_assert!(self.item_count > 0, "remove_last on an empty array");

    self.item_count -= 1;
    let slot = self.slot(self.item_count);

    unsafe {
      slot.drop_in_place();

      #[cfg(debug_assertions)]
      ptr::write_bytes(slot.as_ptr().cast::<u8>(), crate::config::REMOVED_FILL, Self::ITEM_SIZE);
    }
  }

  /// Reallocates the block to exactly `size()` elements.
  ///
  /// An empty array releases its block altogether.
  pub fn shrink_to_size(&mut self) {
    let exact = self.byte_len(self.item_count);
    if self.memory_size == exact {
      return;
    }

    match self.memory {
      Some(block) if exact == 0 => {
        unsafe { A::free_raw(block) };
        self.memory = None;
      }
      Some(block) => {
        self.memory = Some(unsafe { A::realloc_raw(block, exact) });
      }
      None => unreachable!("reserved bytes without a block"),
    }

    debug!(from = self.memory_size, to = exact, "shrunk dynamic array");
    self.memory_size = exact;
  }

  /// Grows or shrinks to exactly `size` elements.
  ///
  /// New slots are filled with clones of `value`. Shrinking drops trailing
  /// elements, last first.
  ///
  /// # Panics
  ///
  /// Panics if `size` is zero; use [`clear`](Self::clear) to empty the array.
  pub fn resize(
    &mut self,
    size: usize,
    value: V,
  ) where
    V: Clone,
  {
    self.resize_with(size, || value.clone());
  }

  /// Like [`resize`](Self::resize), producing new elements with `fill`.
  pub fn resize_with<F>(
    &mut self,
    size: usize,
    mut fill: F,
  ) where
    F: FnMut() -> V,
  {
    assert!(size > 0, "resize to zero elements, use clear instead");

    if size > self.item_count {
      let missing = size - self.item_count;
      let spare = self.reserved_size() - self.item_count;
      if missing > spare {
        self.reserve_additional(missing - spare);
      }

      for _ in 0..missing {
        self.insert_as_last_with(&mut fill);
      }
    } else {
      for _ in size..self.item_count {
        unsafe { self.remove_last_unchecked() };
      }
    }

    debug_assert_eq!(self.item_count, size);
  }

  /// Checked form of [`resize`](Self::resize).
  pub fn try_resize(
    &mut self,
    size: usize,
    value: V,
  ) -> Result<(), ArrayError>
  where
    V: Clone,
  {
    if size == 0 {
      return Err(ArrayError::ZeroResize);
    }
    self.resize(size, value);
    Ok(())
  }

  /// Extends the block by room for `additional` more elements without
  /// constructing any.
  pub fn reserve_additional(
    &mut self,
    additional: usize,
  ) {
    if additional == 0 {
      return;
    }

    let new_size = self
      .byte_len(additional)
      .checked_add(self.memory_size)
      .unwrap_or_else(|| capacity_overflow());

    self.memory = Some(match self.memory {
      Some(block) => unsafe { A::realloc_raw(block, new_size) },
      None => A::alloc_raw(new_size),
    });

    debug!(from = self.memory_size, to = new_size, "grew dynamic array");
    self.memory_size = new_size;
  }

  /// Reference to the element at `index`.
  ///
  /// # Panics
  ///
  /// Panics if `index >= size()`.
  pub fn get_value(
    &self,
    index: usize,
  ) -> &V {
    &self.as_slice()[index]
  }

  pub fn get_value_mut(
    &mut self,
    index: usize,
  ) -> &mut V {
    &mut self.as_mut_slice()[index]
  }

  pub fn try_get_value(
    &self,
    index: usize,
  ) -> Result<&V, ArrayError> {
    self.as_slice().get(index).ok_or(ArrayError::IndexOutOfBounds {
      index,
      size: self.item_count,
    })
  }

  /// Reference to the element at `index` without a bounds check.
  ///
  /// # Safety
  ///
  /// `index` must be less than `size()`. Only debug builds verify this.
  pub unsafe fn get_value_unchecked(
    &self,
    index: usize,
  ) -> &V {
    debug_assert!(index < self.item_count, "index {index} out of bounds");
    unsafe { self.slot(index).as_ref() }
  }

  /// # Panics
  ///
  /// Panics if the array is empty.
  pub fn first_value(&self) -> &V {
    self.as_slice().first().expect("first_value on an empty array")
  }

  pub fn first_value_mut(&mut self) -> &mut V {
    self.as_mut_slice().first_mut().expect("first_value on an empty array")
  }

  /// # Panics
  ///
  /// Panics if the array is empty.
  pub fn last_value(&self) -> &V {
    self.as_slice().last().expect("last_value on an empty array")
  }

  pub fn last_value_mut(&mut self) -> &mut V {
    self.as_mut_slice().last_mut().expect("last_value on an empty array")
  }

  /// Raw pointer to the start of the block, null when nothing is reserved.
  ///
  /// Slots past `size()` are uninitialized. The pointer dangles after the next
  /// mutating call.
  pub fn as_raw_array(&mut self) -> *mut V {
    self.memory.map_or(ptr::null_mut(), |block| block.as_ptr().cast::<V>())
  }

  pub fn as_slice(&self) -> &[V] {
    match self.memory {
      Some(block) => unsafe { slice::from_raw_parts(block.as_ptr().cast::<V>(), self.item_count) },
      None => &[],
    }
  }

  pub fn as_mut_slice(&mut self) -> &mut [V] {
    match self.memory {
      Some(block) => unsafe { slice::from_raw_parts_mut(block.as_ptr().cast::<V>(), self.item_count) },
      None => &mut [],
    }
  }

  /// Number of live elements.
  pub fn size(&self) -> usize {
    self.item_count
  }

  pub fn is_empty(&self) -> bool {
    self.item_count == 0
  }

  /// Number of elements the current block can hold.
  pub fn reserved_size(&self) -> usize {
    self.memory_size / Self::ITEM_SIZE
  }

  pub fn growth(&self) -> Growth {
    self.growth
  }

  /// Drops every element, last first, and releases the block.
  pub fn clear(&mut self) {
    while self.item_count > 0 {
      unsafe { self.remove_last_unchecked() };
    }

    if let Some(block) = self.memory.take() {
      unsafe { A::free_raw(block) };
    }
    self.memory_size = 0;
  }

  /// Moves the contents out, leaving `self` empty with the same growth
  /// policy.
  pub fn take(&mut self) -> Self {
    let growth = self.growth;
    mem::replace(self, Self::with_growth(growth))
  }

  fn slot(
    &self,
    index: usize,
  ) -> NonNull<V> {
    debug_assert!(self.byte_len(index + 1) <= self.memory_size);

    match self.memory {
      Some(block) => unsafe { block.cast::<V>().add(index) },
      None => unreachable!("slot access without a block"),
    }
  }

  fn byte_len(
    &self,
    count: usize,
  ) -> usize {
    count.checked_mul(Self::ITEM_SIZE).unwrap_or_else(|| capacity_overflow())
  }
}

#[cold]
fn capacity_overflow() -> ! {
  panic!("capacity overflow")
}

impl<V, A: Allocator> Drop for DynamicArray<V, A> {
  fn drop(&mut self) {
    self.clear();
  }
}

impl<V, A: Allocator> Default for DynamicArray<V, A> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V, A: Allocator> Deref for DynamicArray<V, A> {
  type Target = [V];

  fn deref(&self) -> &[V] {
    self.as_slice()
  }
}

impl<V, A: Allocator> DerefMut for DynamicArray<V, A> {
  fn deref_mut(&mut self) -> &mut [V] {
    self.as_mut_slice()
  }
}

impl<V, A: Allocator> Index<usize> for DynamicArray<V, A> {
  type Output = V;

  fn index(
    &self,
    index: usize,
  ) -> &V {
    self.get_value(index)
  }
}

impl<V, A: Allocator> IndexMut<usize> for DynamicArray<V, A> {
  fn index_mut(
    &mut self,
    index: usize,
  ) -> &mut V {
    self.get_value_mut(index)
  }
}

impl<'a, V, A: Allocator> IntoIterator for &'a DynamicArray<V, A> {
  type Item = &'a V;
  type IntoIter = slice::Iter<'a, V>;

  fn into_iter(self) -> Self::IntoIter {
    self.as_slice().iter()
  }
}

impl<'a, V, A: Allocator> IntoIterator for &'a mut DynamicArray<V, A> {
  type Item = &'a mut V;
  type IntoIter = slice::IterMut<'a, V>;

  fn into_iter(self) -> Self::IntoIter {
    self.as_mut_slice().iter_mut()
  }
}

impl<V, A: Allocator> FromIterator<V> for DynamicArray<V, A> {
  fn from_iter<I: IntoIterator<Item = V>>(values: I) -> Self {
    crate::copy::collect_into(values, Growth::default())
  }
}

impl<V, A: Allocator> Extend<V> for DynamicArray<V, A> {
  fn extend<I: IntoIterator<Item = V>>(
    &mut self,
    values: I,
  ) {
    for value in values {
      self.insert_as_last(value);
    }
  }
}

impl<V: fmt::Debug, A: Allocator> fmt::Debug for DynamicArray<V, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.as_slice()).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use super::*;
  use crate::{DebugAllocator, SystemAllocator, TrackingAllocator};

  type Tracked = TrackingAllocator<DebugAllocator>;

  struct Tracker {
    live: Rc<Cell<usize>>,
  }

  impl Tracker {
    fn new(live: &Rc<Cell<usize>>) -> Self {
      live.set(live.get() + 1);
      Self { live: Rc::clone(live) }
    }
  }

  impl Clone for Tracker {
    fn clone(&self) -> Self {
      Tracker::new(&self.live)
    }
  }

  impl Drop for Tracker {
    fn drop(&mut self) {
      self.live.set(self.live.get() - 1);
    }
  }

  #[test]
  fn insert_remove_clear() {
    let mut array = DynamicArray::<i32, DebugAllocator>::new();

    for _ in 0..10 {
      array.insert_as_last(5);
    }

    assert_eq!(array.size(), 10);
    assert!((0..10).all(|i| *array.get_value(i) == 5));
    assert_eq!(*array.first_value(), 5);
    assert_eq!(*array.last_value(), 5);

    for _ in 0..5 {
      array.remove_last();
    }
    assert_eq!(array.size(), 5);
    assert!(array.reserved_size() >= 10);

    array.clear();
    assert_eq!(array.size(), 0);
    assert_eq!(array.reserved_size(), 0);
    assert!(array.as_raw_array().is_null());
  }

  #[test]
  fn resize_fills_then_truncates() {
    let mut array = DynamicArray::<usize, SystemAllocator>::new();

    array.resize(10, 0);
    assert_eq!(array.size(), 10);
    assert!(array.iter().all(|&v| v == 0));

    array[3] = 7;
    array.resize(12, 1);
    assert_eq!(array.as_slice(), &[0, 0, 0, 7, 0, 0, 0, 0, 0, 0, 1, 1]);

    array.resize(4, 9);
    assert_eq!(array.as_slice(), &[0, 0, 0, 7]);
  }

  #[test]
  fn resize_reserves_once() {
    Tracked::reset();

    let mut array = DynamicArray::<u64, Tracked>::with_growth(Growth::REFERENCE);
    array.resize(100, 3);

    assert_eq!(Tracked::stats().allocations, 1);
    assert_eq!(Tracked::stats().reallocations, 0);
    assert_eq!(array.reserved_size(), 100);
  }

  #[test]
  #[should_panic(expected = "resize to zero elements")]
  fn resize_to_zero_is_rejected() {
    let mut array = DynamicArray::<u8, DebugAllocator>::new();
    array.insert_as_last(1);
    array.resize(0, 0);
  }

  #[test]
  #[should_panic(expected = "remove_last on an empty array")]
  fn remove_from_empty_is_rejected() {
    DynamicArray::<u8, DebugAllocator>::new().remove_last();
  }

  #[test]
  fn checked_variants_report_violations() {
    let mut array = DynamicArray::<u8, DebugAllocator>::new();

    assert_eq!(array.try_remove_last(), Err(ArrayError::Empty));
    assert_eq!(array.try_resize(0, 1), Err(ArrayError::ZeroResize));
    assert_eq!(
      array.try_get_value(0),
      Err(ArrayError::IndexOutOfBounds { index: 0, size: 0 })
    );

    assert_eq!(array.try_resize(2, 1), Ok(()));
    assert_eq!(array.try_get_value(1), Ok(&1));
    assert_eq!(array.try_remove_last(), Ok(()));
    assert_eq!(array.size(), 1);
  }

  #[test]
  fn reserved_slots_are_not_constructed() {
    let live = Rc::new(Cell::new(0));

    {
      let mut array = DynamicArray::<Tracker, DebugAllocator>::with_reserved(10);
      assert!(array.reserved_size() >= 10);
      assert_eq!(live.get(), 0);

      array.insert_as_last(Tracker::new(&live));
      assert_eq!(live.get(), 1);

      array.resize(10, Tracker::new(&live));
      assert_eq!(live.get(), 10);
      assert_eq!(array.size(), 10);

      array.reserve_additional(10);
      assert!(array.reserved_size() >= array.size() + 10);
      array.shrink_to_size();
      assert_eq!(array.reserved_size(), array.size());

      let mut moved = array.take();
      assert_eq!(array.size(), 0);
      assert_eq!(array.reserved_size(), 0);
      assert_eq!(live.get(), 10);

      moved.clear();
      assert_eq!(live.get(), 0);
    }

    assert_eq!(live.get(), 0);
  }

  #[test]
  fn trailing_elements_drop_last_first() {
    struct Ordered {
      id: usize,
      dropped: Rc<RefCell<Vec<usize>>>,
    }

    impl Drop for Ordered {
      fn drop(&mut self) {
        self.dropped.borrow_mut().push(self.id);
      }
    }

    let dropped = Rc::new(RefCell::new(Vec::new()));
    let mut array = DynamicArray::<Ordered, DebugAllocator>::new();

    for id in 0..6 {
      array.insert_as_last(Ordered {
        id,
        dropped: Rc::clone(&dropped),
      });
    }

    array.resize_with(3, || unreachable!("shrinking constructs nothing"));
    assert_eq!(*dropped.borrow(), vec![5, 4, 3]);

    array.clear();
    assert_eq!(*dropped.borrow(), vec![5, 4, 3, 2, 1, 0]);
  }

  #[test]
  fn drop_releases_elements_and_block() {
    let live = Rc::new(Cell::new(0));
    Tracked::reset();

    {
      let mut array = DynamicArray::<Tracker, Tracked>::new();
      for _ in 0..7 {
        array.insert_as_last(Tracker::new(&live));
      }
    }

    assert_eq!(live.get(), 0);
    assert_eq!(Tracked::stats().live_blocks(), 0);
  }

  #[test]
  fn shrinking_an_empty_array_releases_the_block() {
    Tracked::reset();

    let mut array = DynamicArray::<u32, Tracked>::with_reserved(8);
    array.shrink_to_size();

    assert_eq!(array.reserved_size(), 0);
    assert_eq!(Tracked::stats().live_blocks(), 0);
  }

  #[test]
  fn fixed_growth_steps_by_block_size() {
    let mut array = DynamicArray::<u16, DebugAllocator>::with_growth(Growth::REFERENCE);

    array.insert_as_last(1);
    assert_eq!(array.reserved_size(), crate::config::GROWTH_BLOCK_SIZE);

    for v in 0..5 {
      array.insert_as_last(v);
    }
    assert_eq!(array.reserved_size(), 2 * crate::config::GROWTH_BLOCK_SIZE);
  }

  #[test]
  fn geometric_growth_doubles() {
    let mut array = DynamicArray::<u16, DebugAllocator>::new();

    for v in 0..6 {
      array.insert_as_last(v);
    }
    assert_eq!(array.reserved_size(), 10);

    for v in 0..5 {
      array.insert_as_last(v);
    }
    assert_eq!(array.reserved_size(), 20);
  }

  #[test]
  fn block_size_matches_reserved_bytes() {
    let mut array = DynamicArray::<u32, DebugAllocator>::with_reserved(3);
    array.insert_as_last(1);

    let block = NonNull::new(array.as_raw_array().cast::<u8>()).unwrap();
    assert_eq!(unsafe { DebugAllocator::block_size(block) }, Some(12));
  }

  #[cfg(debug_assertions)]
  #[test]
  fn removed_slot_is_scrambled() {
    let mut array = DynamicArray::<u32, SystemAllocator>::new();
    array.insert_as_last(1);
    array.insert_as_last(2);
    array.remove_last();

    let raw = array.as_raw_array();
    let removed = unsafe { raw.add(1).cast::<u8>().cast_const() };
    let bytes = unsafe { slice::from_raw_parts(removed, 4) };
    assert!(bytes.iter().all(|&b| b == crate::config::REMOVED_FILL));
  }

  #[test]
  fn unchecked_access() {
    let mut array = DynamicArray::<char, SystemAllocator>::new();
    array.insert_as_last('a');
    array.insert_as_last('b');

    unsafe {
      assert_eq!(*array.get_value_unchecked(1), 'b');
      array.remove_last_unchecked();
    }
    assert_eq!(array.as_slice(), &['a']);
  }

  #[test]
  fn debug_format() {
    let mut array = DynamicArray::<i32, SystemAllocator>::new();
    array.insert_as_last(1);
    array.insert_as_last(2);

    assert_eq!(format!("{array:?}"), "[1, 2]");
  }
}
