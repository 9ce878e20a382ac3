use std::{collections::HashMap, ops::Range, ptr::NonNull};

use crate::{
  config::{Config, HeaderBlock},
  error::{Error, PadSide, Result},
  free_list::FreeList,
  header::{self, BlockInfo, HeaderInfo},
  layout::BlockLayout,
  memory::{LibcMemory, RawMemory},
  page::{Page, Pages},
  pattern,
  stats::Stats,
};

/// Pool of fixed-size objects carved out of pages.
///
/// Objects are handed out from a LIFO free list. A new page is requested
/// from the [`RawMemory`] source whenever the free list runs dry, up to
/// `max_pages`. With `use_fallback_allocator` set the pool is bypassed and
/// every object comes straight from the source.
///
/// Not thread safe: every call needs exclusive access.
pub struct ObjectAllocator<M: RawMemory = LibcMemory> {
  memory: M,
  config: Config,
  layout: BlockLayout,
  stats: Stats,
  debug: bool,
  pages: Option<Page>,
  free_list: FreeList,
  // Records of in-use blocks when headers are external, keyed by object
  // address.
  external: HashMap<usize, BlockInfo>,
}

impl ObjectAllocator<LibcMemory> {
  /// Creates a pool of `object_size`-byte objects backed by `malloc`.
  pub fn new(
    object_size: usize,
    config: Config,
  ) -> Result<Self> {
    Self::with_memory(object_size, config, LibcMemory)
  }
}

impl<M: RawMemory> ObjectAllocator<M> {
  /// Creates a pool drawing its pages from `memory`.
  ///
  /// A pooled allocator allowed any pages at all gets its first page right
  /// away, so this can fail with [`Error::NoMemory`].
  pub fn with_memory(
    object_size: usize,
    mut config: Config,
    memory: M,
  ) -> Result<Self> {
    config.validate(object_size)?;

    let layout = BlockLayout::new(object_size, &config);
    config.left_align = layout.left_align;
    config.inter_align = layout.inter_align;

    let stats = Stats {
      object_size,
      page_size: layout.page_size,
      ..Stats::default()
    };

    let mut allocator = Self {
      memory,
      debug: config.debug_on,
      config,
      layout,
      stats,
      pages: None,
      free_list: FreeList::new(),
      external: HashMap::new(),
    };

    if !allocator.config.use_fallback_allocator && allocator.config.max_pages > 0 {
      allocator.new_page()?;
    }

    Ok(allocator)
  }

  /// Hands out one object.
  ///
  /// `label` is copied into the block's record when headers are external
  /// and ignored otherwise.
  pub fn allocate(
    &mut self,
    label: Option<&[u8]>,
  ) -> Result<NonNull<u8>> {
    if self.config.use_fallback_allocator {
      let object = self.memory.allocate(self.layout.object_size).ok_or(Error::NoMemory {
        requested: self.layout.object_size,
      })?;
      self.stats.record_allocation();
      log::trace!("[objalloc] allocate -> {:p} (fallback)", object);
      return Ok(object);
    }

    if self.free_list.is_empty() {
      if self.stats.pages_in_use >= self.config.max_pages {
        log::warn!("[objalloc] allocate: no pages left (max {})", self.config.max_pages);
        return Err(Error::NoPages {
          max_pages: self.config.max_pages,
        });
      }
      self.new_page()?;
    }

    let object = self.free_list.pop().ok_or(Error::NoPages {
      max_pages: self.config.max_pages,
    })?;

    unsafe {
      pattern::stamp(self.debug, object.as_ptr(), self.layout.object_size, pattern::ALLOCATED);
    }

    self.stats.record_allocation();
    self.stats.free_objects -= 1;

    let allocation = self.stats.allocations as u32;
    unsafe { header::write(self.config.header, self.header_of(object), allocation) };

    if self.config.header == HeaderBlock::External {
      self.external.insert(
        object.as_ptr() as usize,
        BlockInfo {
          allocation,
          in_use: true,
          label: label.map(Box::from),
        },
      );
    }

    log::trace!("[objalloc] allocate -> {:p} (#{})", object, allocation);
    Ok(object)
  }

  /// Returns `object` to the pool.
  ///
  /// In debug mode the address is checked, in order, for a double free, for
  /// lying on a block boundary of a managed page, and for overwritten pad
  /// bytes. Nothing changes when a check fails.
  ///
  /// # Safety
  ///
  /// Outside debug mode nothing is checked: `object` must have come from
  /// [`allocate`](Self::allocate) on this allocator and must not have been
  /// freed since. In fallback mode this holds even in debug mode.
  pub unsafe fn free(
    &mut self,
    object: NonNull<u8>,
  ) -> Result<()> {
    if self.config.use_fallback_allocator {
      unsafe { self.memory.deallocate(object, self.layout.object_size) };
      self.stats.record_deallocation();
      log::trace!("[objalloc] free {:p} (fallback)", object);
      return Ok(());
    }

    if self.debug {
      self.check_free(object.as_ptr() as usize)?;
    }

    unsafe {
      pattern::stamp(self.debug, object.as_ptr(), self.layout.object_size, pattern::FREED);
      header::clear(self.config.header, self.header_of(object));
    }

    if self.config.header == HeaderBlock::External {
      self.external.remove(&(object.as_ptr() as usize));
    }

    self.free_list.push(object);
    self.stats.free_objects += 1;
    self.stats.record_deallocation();

    log::trace!("[objalloc] free {:p}", object);
    Ok(())
  }

  /// Calls `callback(object, object_size)` for every block in use and
  /// returns how many there were.
  pub fn dump_memory_in_use<F>(
    &self,
    mut callback: F,
  ) -> usize
  where
    F: FnMut(NonNull<u8>, usize),
  {
    let mut in_use = 0;

    for object in self.objects() {
      if !self.free_list.contains(object.as_ptr() as usize) {
        callback(object, self.layout.object_size);
        in_use += 1;
      }
    }

    in_use
  }

  /// Calls `callback(object, object_size)` for every block whose pad bytes
  /// were overwritten and returns how many there were.
  ///
  /// Only meaningful in debug mode with pad bytes; returns 0 otherwise.
  pub fn validate_pages<F>(
    &self,
    mut callback: F,
  ) -> usize
  where
    F: FnMut(NonNull<u8>, usize),
  {
    if !self.debug || self.layout.pad_bytes == 0 {
      return 0;
    }

    let mut corrupted = 0;

    for (page, index) in self.blocks() {
      if let Some(side) = self.corrupted_pad(page, index) {
        let object = unsafe { page.at(self.layout.object(index).start) };
        log::warn!("[objalloc] validate: {:p} has a corrupted {} pad", object, side);
        callback(object, self.layout.object_size);
        corrupted += 1;
      }
    }

    corrupted
  }

  /// Releases every page whose blocks are all free. Returns how many.
  pub fn free_empty_pages(&mut self) -> usize {
    if self.config.use_fallback_allocator {
      return 0;
    }

    let page_size = self.layout.page_size;
    let per_page = self.layout.objects_per_page;

    let mut reclaimed = 0;
    let mut previous: Option<Page> = None;
    let mut current = self.pages;

    while let Some(page) = current {
      let next = unsafe { page.next() };

      let free = (0..per_page)
        .filter(|&index| {
          let object = page.addr() + self.layout.object(index).start;
          self.free_list.contains(object)
        })
        .count();

      if free == per_page {
        self.free_list.remove_where(|object| page.contains(object, page_size));

        match previous {
          Some(previous) => unsafe { previous.set_next(next) },
          None => self.pages = next,
        }

        log::debug!("[objalloc] releasing empty page {:p}", page.base());
        unsafe { self.memory.deallocate(page.base(), page_size) };

        self.stats.pages_in_use -= 1;
        self.stats.free_objects -= per_page;
        reclaimed += 1;
      } else {
        previous = Some(page);
      }

      current = next;
    }

    debug_assert_eq!(self.free_list.len(), self.stats.free_objects);
    reclaimed
  }

  /// Turns pattern stamping and free-time checks on or off. Memory already
  /// stamped is left alone.
  pub fn set_debug_state(
    &mut self,
    state: bool,
  ) {
    self.debug = state;
  }

  pub fn debug_state(&self) -> bool {
    self.debug
  }

  /// Next object [`allocate`](Self::allocate) would hand out, if any.
  pub fn free_list_head(&self) -> Option<NonNull<u8>> {
    self.free_list.head()
  }

  /// Free objects, head first.
  pub fn free_objects(&self) -> impl Iterator<Item = NonNull<u8>> + '_ {
    self.free_list.iter()
  }

  /// Most recently created page. Its first word links to the next one.
  pub fn page_list_head(&self) -> Option<NonNull<u8>> {
    self.pages.map(Page::base)
  }

  /// Every page, newest first.
  pub fn pages(&self) -> impl Iterator<Item = NonNull<u8>> + '_ {
    Pages::new(self.pages).map(Page::base)
  }

  pub fn config(&self) -> Config {
    self.config.clone()
  }

  pub fn stats(&self) -> Stats {
    self.stats
  }

  pub fn layout(&self) -> BlockLayout {
    self.layout
  }

  /// Reads back the header of the block whose object starts at `object`.
  ///
  /// `None` when headers are disabled or `object` is not a block of this
  /// pool.
  pub fn header_info(
    &self,
    object: NonNull<u8>,
  ) -> Option<HeaderInfo> {
    let addr = object.as_ptr() as usize;
    self.locate(addr).ok()?;

    let mut info = unsafe { header::read(self.config.header, self.header_of(object)) }?;

    if self.config.header == HeaderBlock::External {
      match self.external.get(&addr) {
        Some(record) => {
          info.allocation = record.allocation;
          info.in_use = record.in_use;
          info.label = record.label.clone();
        },
        None => info.in_use = false,
      }
    }

    Some(info)
  }

  fn new_page(&mut self) -> Result<()> {
    let layout = self.layout;

    let base = self.memory.allocate(layout.page_size).ok_or(Error::NoMemory {
      requested: layout.page_size,
    })?;
    let page = Page::new(base);

    unsafe {
      page.set_next(self.pages);

      let left = layout.left_align_region();
      pattern::stamp(self.debug, page.at(left.start).as_ptr(), left.len(), pattern::ALIGN);

      for index in 0..layout.objects_per_page {
        let header = layout.header(index);
        page.at(header.start).as_ptr().write_bytes(0, header.len());

        self.stamp_region(page, layout.left_pad(index), pattern::PAD);
        self.stamp_region(page, layout.object(index), pattern::UNALLOCATED);
        self.stamp_region(page, layout.right_pad(index), pattern::PAD);
        self.stamp_region(page, layout.inter_align_region(index), pattern::ALIGN);
      }

      // Back to front so the first block in the page is the head.
      for index in (0..layout.objects_per_page).rev() {
        self.free_list.push(page.at(layout.object(index).start));
      }
    }

    self.pages = Some(page);
    self.stats.free_objects += layout.objects_per_page;
    self.stats.pages_in_use += 1;

    log::debug!(
      "[objalloc] new page {:p}: {} bytes, {} blocks of {}",
      base,
      layout.page_size,
      layout.objects_per_page,
      layout.block_size
    );
    Ok(())
  }

  unsafe fn stamp_region(
    &self,
    page: Page,
    region: Range<usize>,
    byte: u8,
  ) {
    unsafe { pattern::stamp(self.debug, page.at(region.start).as_ptr(), region.len(), byte) };
  }

  fn check_free(
    &self,
    addr: usize,
  ) -> Result<()> {
    if self.free_list.contains(addr) {
      log::warn!("[objalloc] free {:#x}: already freed", addr);
      return Err(Error::MultipleFree { address: addr });
    }

    let (page, index) = self.locate(addr).inspect_err(|_| {
      log::warn!("[objalloc] free {:#x}: not on a block boundary", addr);
    })?;

    if let Some(side) = self.corrupted_pad(page, index) {
      log::warn!("[objalloc] free {:#x}: {} pad overwritten", addr, side);
      return Err(Error::CorruptedBlock { address: addr, side });
    }

    Ok(())
  }

  /// Finds the page and block index whose object starts at `addr`.
  fn locate(
    &self,
    addr: usize,
  ) -> Result<(Page, usize)> {
    let bad_boundary = Error::BadBoundary { address: addr };

    for page in Pages::new(self.pages) {
      if addr == page.addr() {
        return Err(bad_boundary);
      }
      if page.contains(addr, self.layout.page_size) {
        return self
          .layout
          .object_index(addr - page.addr())
          .map(|index| (page, index))
          .ok_or(bad_boundary);
      }
    }

    Err(bad_boundary)
  }

  fn corrupted_pad(
    &self,
    page: Page,
    index: usize,
  ) -> Option<PadSide> {
    let left = self.layout.left_pad(index);
    let right = self.layout.right_pad(index);

    unsafe {
      if !pattern::holds(page.at(left.start).as_ptr(), left.len(), pattern::PAD) {
        return Some(PadSide::Left);
      }
      if !pattern::holds(page.at(right.start).as_ptr(), right.len(), pattern::PAD) {
        return Some(PadSide::Right);
      }
    }

    None
  }

  fn header_of(
    &self,
    object: NonNull<u8>,
  ) -> *mut u8 {
    object
      .as_ptr()
      .wrapping_sub(self.layout.pad_bytes + self.layout.header_size)
  }

  fn blocks(&self) -> impl Iterator<Item = (Page, usize)> + '_ {
    let per_page = self.layout.objects_per_page;
    Pages::new(self.pages).flat_map(move |page| (0..per_page).map(move |index| (page, index)))
  }

  fn objects(&self) -> impl Iterator<Item = NonNull<u8>> + '_ {
    self
      .blocks()
      .map(move |(page, index)| unsafe { page.at(self.layout.object(index).start) })
  }
}

impl<M: RawMemory> Drop for ObjectAllocator<M> {
  fn drop(&mut self) {
    let mut current = self.pages.take();

    while let Some(page) = current {
      current = unsafe { page.next() };
      unsafe { self.memory.deallocate(page.base(), self.layout.page_size) };
    }
  }
}
