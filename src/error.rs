use thiserror::Error;

/// Contract violations reported by the checked `try_*` operations of
/// [`DynamicArray`](crate::DynamicArray).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ArrayError {
  #[error("index {index} out of bounds for array of size {size}")]
  IndexOutOfBounds { index: usize, size: usize },

  #[error("array is empty")]
  Empty,

  #[error("cannot resize to zero elements, use clear instead")]
  ZeroResize,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages() {
    assert_eq!(
      ArrayError::IndexOutOfBounds { index: 4, size: 2 }.to_string(),
      "index 4 out of bounds for array of size 2"
    );
    assert_eq!(ArrayError::Empty.to_string(), "array is empty");
  }
}
