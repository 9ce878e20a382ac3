//! Property tests for pool bookkeeping over random configurations and
//! allocate/free sequences.

use std::{mem, ptr::NonNull};

use objalloc::{BlockLayout, Config, ErrorKind, HeaderBlock, ObjectAllocator};
use proptest::prelude::*;

fn header_strategy() -> impl Strategy<Value = HeaderBlock> {
  prop_oneof![
    Just(HeaderBlock::None),
    Just(HeaderBlock::Basic),
    (0usize..8).prop_map(|additional| HeaderBlock::Extended { additional }),
    Just(HeaderBlock::External),
  ]
}

fn config_strategy() -> impl Strategy<Value = Config> {
  (
    1usize..6,
    1usize..4,
    0usize..4,
    header_strategy(),
    prop_oneof![Just(0usize), Just(1), Just(4), Just(8), Just(16)],
  )
    .prop_map(|(per_page, max_pages, pad_bytes, header, alignment)| {
      Config::new()
        .with_objects_per_page(per_page)
        .with_max_pages(max_pages)
        .with_pad_bytes(pad_bytes)
        .with_header(header)
        .with_alignment(alignment)
    })
}

fn assert_balanced(pool: &ObjectAllocator) {
  let stats = pool.stats();
  let per_page = pool.config().objects_per_page;

  assert_eq!(stats.free_objects + stats.objects_in_use, stats.pages_in_use * per_page);
  assert_eq!(pool.dump_memory_in_use(|_, _| {}), stats.objects_in_use);
  assert_eq!(pool.free_objects().count(), stats.free_objects);
  assert_eq!(pool.pages().count(), stats.pages_in_use);
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn page_size_matches_block_size(
    object_size in 1usize..64,
    config in config_strategy(),
  ) {
    let layout = BlockLayout::new(object_size, &config);

    prop_assert_eq!(
      layout.page_size,
      mem::size_of::<usize>() + layout.left_align + layout.block_size * config.objects_per_page - layout.inter_align
    );
    prop_assert_eq!(layout.object(config.objects_per_page - 1).end + config.pad_bytes, layout.page_size);
    if config.alignment > 1 {
      prop_assert_eq!(layout.block_size % config.alignment, 0);
      prop_assert_eq!(layout.object(0).start % config.alignment, 0);
    }
  }

  #[test]
  fn runs_out_of_pages_exactly_at_capacity(
    object_size in 1usize..32,
    config in config_strategy(),
    debug in any::<bool>(),
  ) {
    let capacity = config.max_pages * config.objects_per_page;
    let mut pool = ObjectAllocator::new(object_size, config.with_debug(debug)).unwrap();

    for _ in 0..capacity {
      prop_assert!(pool.allocate(None).is_ok());
    }
    prop_assert_eq!(pool.allocate(None).unwrap_err().kind(), ErrorKind::NoPages);
  }

  #[test]
  fn bookkeeping_stays_balanced(
    object_size in 1usize..32,
    config in config_strategy(),
    ops in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 1..64),
  ) {
    let mut pool = ObjectAllocator::new(object_size, config.with_debug(true)).unwrap();
    let mut live: Vec<NonNull<u8>> = Vec::new();

    for (allocate, pick) in ops {
      if allocate || live.is_empty() {
        match pool.allocate(Some(&b"prop"[..])) {
          Ok(object) => live.push(object),
          Err(err) => {
            prop_assert_eq!(err.kind(), ErrorKind::NoPages);
          },
        }
      } else {
        let object = live.swap_remove(pick.index(live.len()));
        unsafe { pool.free(object).unwrap() };

        // Freed objects come back first.
        prop_assert_eq!(pool.free_list_head(), Some(object));
      }

      assert_balanced(&pool);
    }

    prop_assert_eq!(pool.validate_pages(|_, _| {}), 0);

    for object in live.drain(..) {
      unsafe { pool.free(object).unwrap() };
    }

    let pages = pool.stats().pages_in_use;
    prop_assert_eq!(pool.free_empty_pages(), pages);
    assert_balanced(&pool);
  }

  #[test]
  fn debug_free_rejects_misuse(
    object_size in 1usize..32,
    config in config_strategy(),
    offset in 1usize..4,
  ) {
    let block_size = BlockLayout::new(object_size, &config).block_size;
    prop_assume!(offset % block_size != 0);

    let mut pool = ObjectAllocator::new(object_size, config.with_debug(true)).unwrap();
    let object = pool.allocate(None).unwrap();

    let shifted = NonNull::new(object.as_ptr().wrapping_add(offset)).unwrap();
    prop_assert_eq!(
      unsafe { pool.free(shifted) }.unwrap_err().kind(),
      ErrorKind::BadBoundary
    );

    unsafe { pool.free(object).unwrap() };
    prop_assert_eq!(
      unsafe { pool.free(object) }.unwrap_err().kind(),
      ErrorKind::MultipleFree
    );
  }
}
