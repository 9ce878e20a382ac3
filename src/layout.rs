use std::ops::Range;

use crate::{align::WORD, config::Config};

/// Byte geometry of a pool, computed once per allocator.
///
/// ```text
///   page:
///   ┌──────┬────────────┬─────────┬─────────┬───┬─────────┐
///   │ next │ left align │ block 0 │ block 1 │...│ block N │
///   └──────┴────────────┴─────────┴─────────┴───┴─────────┘
///
///   block:
///   ┌────────┬──────────┬────────┬───────────┬─────────────┐
///   │ header │ left pad │ object │ right pad │ inter align │  (no inter
///   └────────┴──────────┴────────┴───────────┴─────────────┘   align on N)
/// ```
///
/// All offsets are relative to the start of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
  pub object_size: usize,
  pub objects_per_page: usize,
  pub header_size: usize,
  pub pad_bytes: usize,
  pub left_align: usize,
  pub inter_align: usize,
  pub block_size: usize,
  pub page_size: usize,
}

impl BlockLayout {
  pub fn new(
    object_size: usize,
    config: &Config,
  ) -> Self {
    let header_size = config.header.size();
    let pad_bytes = config.pad_bytes;

    let (left_align, inter_align) = if config.alignment > 1 {
      (
        crate::align_padding!(WORD + header_size + pad_bytes, config.alignment),
        crate::align_padding!(object_size + 2 * pad_bytes + header_size, config.alignment),
      )
    } else {
      (0, 0)
    };

    let block_size = header_size + object_size + 2 * pad_bytes + inter_align;
    let page_size = WORD + left_align + block_size * config.objects_per_page - inter_align;

    Self {
      object_size,
      objects_per_page: config.objects_per_page,
      header_size,
      pad_bytes,
      left_align,
      inter_align,
      block_size,
      page_size,
    }
  }

  pub fn left_align_region(&self) -> Range<usize> {
    WORD..WORD + self.left_align
  }

  pub fn block_start(
    &self,
    index: usize,
  ) -> usize {
    WORD + self.left_align + index * self.block_size
  }

  pub fn header(
    &self,
    index: usize,
  ) -> Range<usize> {
    let start = self.block_start(index);
    start..start + self.header_size
  }

  pub fn left_pad(
    &self,
    index: usize,
  ) -> Range<usize> {
    let start = self.header(index).end;
    start..start + self.pad_bytes
  }

  pub fn object(
    &self,
    index: usize,
  ) -> Range<usize> {
    let start = self.left_pad(index).end;
    start..start + self.object_size
  }

  pub fn right_pad(
    &self,
    index: usize,
  ) -> Range<usize> {
    let start = self.object(index).end;
    start..start + self.pad_bytes
  }

  /// Filler after block `index`; empty for the last block of a page.
  pub fn inter_align_region(
    &self,
    index: usize,
  ) -> Range<usize> {
    let start = self.right_pad(index).end;
    if index + 1 == self.objects_per_page {
      start..start
    } else {
      start..start + self.inter_align
    }
  }

  /// Maps an offset inside a page back to the block whose object starts
  /// there. `None` means the offset is not on a block boundary.
  pub fn object_index(
    &self,
    offset: usize,
  ) -> Option<usize> {
    let first = self.object(0).start;
    if offset < first {
      return None;
    }

    let delta = offset - first;
    if delta % self.block_size != 0 {
      return None;
    }

    let index = delta / self.block_size;
    (index < self.objects_per_page).then_some(index)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::HeaderBlock;

  #[test]
  fn test_plain_layout() {
    let layout = BlockLayout::new(4, &Config::new().with_objects_per_page(4));

    assert_eq!(layout.left_align, 0);
    assert_eq!(layout.inter_align, 0);
    assert_eq!(layout.block_size, 4);
    assert_eq!(layout.page_size, WORD + 16);
    assert_eq!(layout.object(0), WORD..WORD + 4);
    assert_eq!(layout.object(3), WORD + 12..WORD + 16);
  }

  #[test]
  fn test_aligned_layout() {
    let config = Config::new()
      .with_objects_per_page(3)
      .with_pad_bytes(2)
      .with_header(HeaderBlock::Basic)
      .with_alignment(16);
    let layout = BlockLayout::new(10, &config);

    assert_eq!(layout.left_align, 16 - (WORD + 5 + 2) % 16);
    assert_eq!(layout.inter_align, 16 - (10 + 4 + 5) % 16);
    assert_eq!(layout.block_size, 5 + 10 + 4 + layout.inter_align);
    assert_eq!(
      layout.page_size,
      WORD + layout.left_align + layout.block_size * 3 - layout.inter_align
    );

    // Every object starts on an alignment boundary.
    for index in 0..3 {
      assert_eq!((layout.header(index).end + 2) % 16, 0);
      assert_eq!(layout.block_start(index), WORD + layout.left_align + index * layout.block_size);
    }

    assert_eq!(layout.inter_align_region(2).len(), 0);
    assert_eq!(layout.inter_align_region(2).end, layout.page_size);
    assert_eq!(layout.inter_align_region(0).len(), layout.inter_align);
  }

  #[test]
  fn test_alignment_one_is_disabled() {
    let layout = BlockLayout::new(7, &Config::new().with_alignment(1).with_pad_bytes(1));

    assert_eq!(layout.left_align, 0);
    assert_eq!(layout.inter_align, 0);
    assert_eq!(layout.block_size, 9);
  }

  #[test]
  fn test_object_index() {
    let config = Config::new()
      .with_objects_per_page(4)
      .with_pad_bytes(3)
      .with_header(HeaderBlock::Extended { additional: 2 })
      .with_alignment(8);
    let layout = BlockLayout::new(12, &config);

    for index in 0..4 {
      assert_eq!(layout.object_index(layout.object(index).start), Some(index));
      assert_eq!(layout.object_index(layout.object(index).start + 1), None);
    }

    assert_eq!(layout.object_index(0), None);
    assert_eq!(layout.object_index(layout.header(0).start), None);
    assert_eq!(layout.object_index(layout.object(0).start + 4 * layout.block_size), None);
  }
}
