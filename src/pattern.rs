//! Sentinel byte patterns stamped over pool memory in debug mode.

use std::ptr;

/// Object bytes of a block that has never been handed out.
pub const UNALLOCATED: u8 = 0xAA;
/// Object bytes of a block that is currently in use.
pub const ALLOCATED: u8 = 0xBB;
/// Object bytes of a block that was returned to the pool.
pub const FREED: u8 = 0xCC;
/// Guard bytes on either side of every object.
pub const PAD: u8 = 0xDD;
/// Filler used to satisfy the alignment requirement.
pub const ALIGN: u8 = 0xEE;

/// Fills `len` bytes at `start` with `pattern` when `debug` is set.
///
/// # Safety
///
/// `start..start + len` must be valid for writes.
pub unsafe fn stamp(
  debug: bool,
  start: *mut u8,
  len: usize,
  pattern: u8,
) {
  if debug && len > 0 {
    unsafe { ptr::write_bytes(start, pattern, len) };
  }
}

/// Checks that every byte in `start..start + len` equals `pattern`.
///
/// # Safety
///
/// `start..start + len` must be valid for reads.
pub unsafe fn holds(
  start: *const u8,
  len: usize,
  pattern: u8,
) -> bool {
  (0..len).all(|i| unsafe { *start.add(i) } == pattern)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_patterns_are_distinct() {
    let patterns = [UNALLOCATED, ALLOCATED, FREED, PAD, ALIGN];
    for (i, a) in patterns.iter().enumerate() {
      for b in &patterns[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }

  #[test]
  fn test_stamp_only_in_debug() {
    let mut bytes = [0u8; 8];

    unsafe {
      stamp(false, bytes.as_mut_ptr(), 8, PAD);
      assert_eq!(bytes, [0; 8]);

      stamp(true, bytes.as_mut_ptr().add(2), 4, PAD);
      assert_eq!(bytes, [0, 0, PAD, PAD, PAD, PAD, 0, 0]);

      assert!(holds(bytes.as_ptr().add(2), 4, PAD));
      assert!(!holds(bytes.as_ptr().add(1), 4, PAD));
      assert!(holds(bytes.as_ptr(), 0, PAD));
    }
  }
}
