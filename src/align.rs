/// Rounds `value` up to the next multiple of `alignment`, which must be a
/// power of two.
///
/// # Examples
///
/// ```rust
/// use mist::{MAX_ALIGN, align_to};
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(32, 16), 32);
/// assert_eq!(align_to!(1, MAX_ALIGN), MAX_ALIGN);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}
