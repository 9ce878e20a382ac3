use std::ptr::NonNull;

use libc::c_void;

/// Source of the raw bytes a pool is carved from.
///
/// `allocate` returning `None` is the only exhaustion signal the pool
/// understands; it is reported to callers as
/// [`Error::NoMemory`](crate::Error::NoMemory).
pub trait RawMemory {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>>;

  /// # Safety
  ///
  /// `ptr` must come from `allocate` on this source with the same `size`
  /// and must not be used afterwards.
  unsafe fn deallocate(
    &mut self,
    ptr: NonNull<u8>,
    size: usize,
  );
}

/// `malloc`/`free` from the C runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcMemory;

impl RawMemory for LibcMemory {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    NonNull::new(unsafe { libc::malloc(size.max(1)) } as *mut u8)
  }

  unsafe fn deallocate(
    &mut self,
    ptr: NonNull<u8>,
    _size: usize,
  ) {
    unsafe { libc::free(ptr.as_ptr() as *mut c_void) };
  }
}

/// Wraps another source and refuses to hand out more than `budget` bytes
/// at once. Released bytes are credited back.
#[derive(Debug, Clone)]
pub struct BudgetedMemory<M = LibcMemory> {
  inner: M,
  budget: usize,
  in_use: usize,
}

impl<M: RawMemory> BudgetedMemory<M> {
  pub fn new(
    inner: M,
    budget: usize,
  ) -> Self {
    Self {
      inner,
      budget,
      in_use: 0,
    }
  }

  pub fn in_use(&self) -> usize {
    self.in_use
  }
}

impl<M: RawMemory> RawMemory for BudgetedMemory<M> {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if self.in_use + size > self.budget {
      log::debug!("[objalloc] budget exhausted: {} + {} > {}", self.in_use, size, self.budget);
      return None;
    }

    let ptr = self.inner.allocate(size)?;
    self.in_use += size;
    Some(ptr)
  }

  unsafe fn deallocate(
    &mut self,
    ptr: NonNull<u8>,
    size: usize,
  ) {
    unsafe { self.inner.deallocate(ptr, size) };
    self.in_use -= size;
  }
}
