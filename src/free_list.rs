use std::ptr::NonNull;

/// Unallocated blocks, identified by the address of their object bytes.
///
/// Singly linked in LIFO order: the head is the block freed (or created)
/// most recently and is the next one handed out.
#[derive(Debug, Default)]
pub struct FreeList {
  // Top of the stack is the head of the list.
  blocks: Vec<NonNull<u8>>,
}

impl FreeList {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn head(&self) -> Option<NonNull<u8>> {
    self.blocks.last().copied()
  }

  pub fn push(
    &mut self,
    object: NonNull<u8>,
  ) {
    self.blocks.push(object);
  }

  pub fn pop(&mut self) -> Option<NonNull<u8>> {
    self.blocks.pop()
  }

  /// Linear membership scan.
  pub fn contains(
    &self,
    addr: usize,
  ) -> bool {
    self.iter().any(|object| object.as_ptr() as usize == addr)
  }

  /// Drops every block `filter` matches, keeping the order of the rest.
  /// Returns how many were removed.
  pub fn remove_where<F>(
    &mut self,
    mut filter: F,
  ) -> usize
  where
    F: FnMut(usize) -> bool,
  {
    let before = self.blocks.len();
    self.blocks.retain(|object| !filter(object.as_ptr() as usize));
    before - self.blocks.len()
  }

  /// Iterates from the head.
  pub fn iter(&self) -> impl Iterator<Item = NonNull<u8>> + '_ {
    self.blocks.iter().rev().copied()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn node(
    bytes: &mut [u8],
    index: usize,
  ) -> NonNull<u8> {
    NonNull::new(unsafe { bytes.as_mut_ptr().add(index) }).unwrap()
  }

  #[test]
  fn test_lifo() {
    let mut bytes = [0u8; 4];
    let mut list = FreeList::new();

    let (a, b, c) = (node(&mut bytes, 0), node(&mut bytes, 1), node(&mut bytes, 2));
    list.push(a);
    list.push(b);
    list.push(c);

    assert_eq!(list.head(), Some(c));
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![c, b, a]);
    assert_eq!(list.pop(), Some(c));
    assert_eq!(list.pop(), Some(b));
    assert_eq!(list.len(), 1);
    assert_eq!(list.pop(), Some(a));
    assert!(list.pop().is_none());
    assert!(list.is_empty());
  }

  #[test]
  fn test_contains_and_remove() {
    let mut bytes = [0u8; 8];
    let mut list = FreeList::new();

    for i in 0..8 {
      list.push(node(&mut bytes, i));
    }

    let base = bytes.as_ptr() as usize;
    assert!(list.contains(base + 3));
    assert!(!list.contains(base + 8));

    let removed = list.remove_where(|addr| addr >= base + 2 && addr < base + 6);
    assert_eq!(removed, 4);
    assert!(!list.contains(base + 3));
    assert_eq!(list.head(), Some(node(&mut bytes, 7)));
    assert_eq!(list.len(), 4);
  }
}
