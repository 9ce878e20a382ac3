//! # objalloc - A Fixed-Size Object Pool Allocator
//!
//! This crate provides an **object pool allocator**: every object it hands
//! out has the same size, and objects are carved out of larger pages that
//! the pool requests from a raw memory source (`malloc` by default).
//!
//! ## Overview
//!
//! ```text
//!   Object Pool Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │  page list                                                           │
//!   │                                                                      │
//!   │  head ─▶ ┌──────┬─────┬─────┬─────┬─────┐    ┌──────┬─────┬─────┐    │
//!   │          │ next │ A1  │ F1  │ A2  │ F2  │ ─▶ │ null │ F3  │ A3  │    │
//!   │          └──────┴─────┴──▲──┴─────┴──▲──┘    └──────┴──▲──┴─────┘    │
//!   │                          │           │                 │             │
//!   │  free list:  head ───────┴─────▶ ────┴──────────▶ ─────┘             │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   A = object in use, F = free object.
//!   Allocation pops the head of the free list: O(1).
//!   Free pushes the object back on the head: O(1) (plus debug checks).
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   objalloc
//!   ├── align      - align_padding! macro and the word size
//!   ├── allocator  - ObjectAllocator (allocate, free, diagnostics)
//!   ├── config     - Config and HeaderBlock
//!   ├── error      - Error, ErrorKind, ConfigError
//!   ├── free_list  - LIFO list of free objects (internal)
//!   ├── header     - per-block header encoding
//!   ├── layout     - BlockLayout: page and block geometry
//!   ├── memory     - RawMemory sources (libc, budgeted)
//!   ├── page       - page list links (internal)
//!   ├── pattern    - debug sentinel bytes
//!   └── stats      - Stats counters
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use objalloc::{Config, ObjectAllocator};
//!
//! let config = Config::new().with_objects_per_page(8).with_debug(true);
//! let mut pool = ObjectAllocator::new(24, config).unwrap();
//!
//! let object = pool.allocate(None).unwrap();
//! unsafe {
//!   object.as_ptr().write_bytes(7, 24);
//!   pool.free(object).unwrap();
//! }
//!
//! assert_eq!(pool.stats().allocations, 1);
//! assert_eq!(pool.stats().deallocations, 1);
//! ```
//!
//! ## Block Layout
//!
//! Each block wraps its object in optional bookkeeping:
//!
//! ```text
//!   ┌────────┬──────────┬──────────────────┬───────────┬─────────────┐
//!   │ header │ left pad │      object      │ right pad │ inter align │
//!   │ 0..W+n │  0xDD..  │ 0xAA / BB / CC.. │  0xDD..   │   0xEE..    │
//!   └────────┴──────────┴──────────────────┴───────────┴─────────────┘
//!                       ▲
//!                       └── Pointer returned to user
//! ```
//!
//! - **header**: none, basic (allocation number + in-use flag), extended
//!   (caller bytes + reuse counter + basic) or external (label and flags
//!   kept by the allocator).
//! - **pads**: guard bytes checked when an object is freed in debug mode.
//! - **inter align**: filler so every object starts on the configured
//!   alignment.
//!
//! ## Debug Mode
//!
//! With debug on, regions are stamped with sentinel bytes (see [`pattern`])
//! and [`ObjectAllocator::free`] rejects double frees, pointers that are
//! not on a block boundary, and objects whose pad bytes were overwritten.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **One object size per pool**
//! - **Unchecked frees outside debug mode** corrupt the pool silently
//!
//! ## Safety
//!
//! Objects are raw pointers into pool-owned pages. Writing past an object
//! or freeing a foreign pointer is only caught in debug mode, so
//! [`ObjectAllocator::free`] is `unsafe`.

pub mod align;
mod allocator;
pub mod config;
pub mod error;
mod free_list;
pub mod header;
pub mod layout;
pub mod memory;
mod page;
pub mod pattern;
pub mod stats;

pub use allocator::ObjectAllocator;
pub use config::{Config, HeaderBlock};
pub use error::{ConfigError, Error, ErrorKind, PadSide, Result};
pub use header::HeaderInfo;
pub use layout::BlockLayout;
pub use memory::{BudgetedMemory, LibcMemory, RawMemory};
pub use stats::Stats;
