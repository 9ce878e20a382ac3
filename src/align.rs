use std::mem;

/// Width of the page-link slot at the front of every page.
pub const WORD: usize = mem::size_of::<usize>();

/// Calculates the filler bytes that follow `value` bytes so the next field
/// starts on an `alignment` boundary.
///
/// An already aligned value still gets a full `alignment` of filler. Pools
/// are laid out with this rule, so it must not be "fixed" to return zero.
///
/// # Examples
///
/// ```rust
/// use objalloc::align_padding;
///
/// assert_eq!(align_padding!(13, 8), 3);
/// assert_eq!(align_padding!(16, 8), 8);
/// ```
#[macro_export]
macro_rules! align_padding {
  ($value:expr, $alignment:expr) => {
    $alignment - (($value) % $alignment)
  };
}
