use std::ptr::{self, NonNull};

/// One raw page. Its first word links to the next page of the pool.
///
/// ```text
///   page list:
///
///   head ──▶ ┌──────┬─────────────┐   ┌──────┬─────────────┐
///            │ next ┼─ blocks ... │──▶│ null │ blocks ...  │
///            └──────┴─────────────┘   └──────┴─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  base: NonNull<u8>,
}

impl Page {
  pub fn new(base: NonNull<u8>) -> Self {
    Self { base }
  }

  pub fn base(self) -> NonNull<u8> {
    self.base
  }

  pub fn addr(self) -> usize {
    self.base.as_ptr() as usize
  }

  /// Pointer `offset` bytes into the page.
  ///
  /// # Safety
  ///
  /// `offset` must not exceed the page size.
  pub unsafe fn at(
    self,
    offset: usize,
  ) -> NonNull<u8> {
    unsafe { self.base.add(offset) }
  }

  /// Whether `addr` lies inside the page, past its link word's first byte.
  pub fn contains(
    self,
    addr: usize,
    page_size: usize,
  ) -> bool {
    addr > self.addr() && addr < self.addr() + page_size
  }

  /// # Safety
  ///
  /// The page must still be owned by the pool.
  pub unsafe fn next(self) -> Option<Page> {
    let next = unsafe { ptr::read_unaligned(self.base.as_ptr() as *const *mut u8) };
    NonNull::new(next).map(Page::new)
  }

  /// # Safety
  ///
  /// The page must still be owned by the pool.
  pub unsafe fn set_next(
    self,
    next: Option<Page>,
  ) {
    let next = next.map_or(ptr::null_mut(), |page| page.base.as_ptr());
    unsafe { ptr::write_unaligned(self.base.as_ptr() as *mut *mut u8, next) };
  }
}

/// Walks the page list from `head`.
///
/// The list must not be modified while the walk is in progress.
pub struct Pages {
  current: Option<Page>,
}

impl Pages {
  pub fn new(head: Option<Page>) -> Self {
    Self { current: head }
  }
}

impl Iterator for Pages {
  type Item = Page;

  fn next(&mut self) -> Option<Page> {
    let page = self.current?;
    self.current = unsafe { page.next() };
    Some(page)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_link_and_walk() {
    let mut first = [0u8; 32];
    let mut second = [0u8; 32];

    let first = Page::new(NonNull::new(first.as_mut_ptr()).unwrap());
    let second = Page::new(NonNull::new(second.as_mut_ptr()).unwrap());

    unsafe {
      second.set_next(None);
      first.set_next(Some(second));
    }

    let walked: Vec<Page> = Pages::new(Some(first)).collect();
    assert_eq!(walked, vec![first, second]);
    assert_eq!(Pages::new(None).count(), 0);
  }

  #[test]
  fn test_contains() {
    let mut bytes = [0u8; 16];
    let page = Page::new(NonNull::new(bytes.as_mut_ptr()).unwrap());

    assert!(!page.contains(page.addr(), 16));
    assert!(page.contains(page.addr() + 1, 16));
    assert!(page.contains(page.addr() + 15, 16));
    assert!(!page.contains(page.addr() + 16, 16));
  }
}
