//! Reading and writing the per-block header region.

use std::ptr;

use crate::config::HeaderBlock;

/// Allocator-owned metadata of a block in a pool with external headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
  pub allocation: u32,
  pub in_use: bool,
  pub label: Option<Box<[u8]>>,
}

/// Decoded view of a block's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
  /// Value of the allocation counter when the block was handed out; zero
  /// while free.
  pub allocation: u32,
  pub in_use: bool,
  /// Times the block was handed out. Extended headers only.
  pub reuse_count: Option<u16>,
  /// Caller label. External headers only.
  pub label: Option<Box<[u8]>>,
}

/// Stamps an allocation into the header starting at `header`.
///
/// External headers only record the allocation number inline; the rest
/// lives in a [`BlockInfo`] kept by the allocator.
///
/// # Safety
///
/// `header` must point at `kind.size()` writable bytes.
pub unsafe fn write(
  kind: HeaderBlock,
  header: *mut u8,
  allocation: u32,
) {
  unsafe {
    match kind {
      HeaderBlock::None => {},
      HeaderBlock::Basic => {
        ptr::write_unaligned(header as *mut u32, allocation);
        *header.add(4) = 1;
      },
      HeaderBlock::Extended { additional } => {
        let counter = header.add(additional) as *mut u16;
        ptr::write_unaligned(counter, ptr::read_unaligned(counter).wrapping_add(1));
        ptr::write_unaligned(header.add(additional + 2) as *mut u32, allocation);
        *header.add(additional + 6) = 1;
      },
      HeaderBlock::External => {
        ptr::write_unaligned(header as *mut usize, allocation as usize);
      },
    }
  }
}

/// Marks the header starting at `header` as free. The extended reuse
/// counter survives.
///
/// # Safety
///
/// `header` must point at `kind.size()` writable bytes.
pub unsafe fn clear(
  kind: HeaderBlock,
  header: *mut u8,
) {
  unsafe {
    match kind {
      HeaderBlock::None => {},
      HeaderBlock::Basic => ptr::write_bytes(header, 0, 5),
      HeaderBlock::Extended { additional } => ptr::write_bytes(header.add(additional + 2), 0, 5),
      HeaderBlock::External => ptr::write_unaligned(header as *mut usize, 0),
    }
  }
}

/// Decodes the inline part of a header. For external headers the caller
/// merges in the [`BlockInfo`].
///
/// # Safety
///
/// `header` must point at `kind.size()` readable bytes.
pub unsafe fn read(
  kind: HeaderBlock,
  header: *const u8,
) -> Option<HeaderInfo> {
  unsafe {
    match kind {
      HeaderBlock::None => None,
      HeaderBlock::Basic => Some(HeaderInfo {
        allocation: ptr::read_unaligned(header as *const u32),
        in_use: *header.add(4) != 0,
        reuse_count: None,
        label: None,
      }),
      HeaderBlock::Extended { additional } => Some(HeaderInfo {
        allocation: ptr::read_unaligned(header.add(additional + 2) as *const u32),
        in_use: *header.add(additional + 6) != 0,
        reuse_count: Some(ptr::read_unaligned(header.add(additional) as *const u16)),
        label: None,
      }),
      HeaderBlock::External => {
        let allocation = ptr::read_unaligned(header as *const usize) as u32;
        Some(HeaderInfo {
          allocation,
          in_use: allocation != 0,
          reuse_count: None,
          label: None,
        })
      },
    }
  }
}
