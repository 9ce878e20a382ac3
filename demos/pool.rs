use std::{io::Read, ptr::NonNull};

use objalloc::{Config, HeaderBlock, ObjectAllocator, Stats};

/// Waits until the user presses ENTER when the demo runs with `--step`.
/// Useful when you want to inspect the pool with `gdb` between steps.
fn block_until_enter_pressed(step: bool) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

fn print_stats(
  label: &str,
  stats: &Stats,
) {
  println!(
    "[{}] in use = {}, free = {}, pages = {}, allocs = {}, frees = {}, most = {}",
    label,
    stats.objects_in_use,
    stats.free_objects,
    stats.pages_in_use,
    stats.allocations,
    stats.deallocations,
    stats.most_objects,
  );
}

fn print_object(
  object: NonNull<u8>,
  size: usize,
) {
  println!("    {:p} ({} bytes)", object, size);
}

fn main() -> objalloc::Result<()> {
  let step = std::env::args().any(|arg| arg == "--step");

  // 24-byte objects, 4 per page, at most 2 pages, guarded by 2 pad bytes on
  // each side and aligned to 8 bytes.
  let config = Config::new()
    .with_objects_per_page(4)
    .with_max_pages(2)
    .with_pad_bytes(2)
    .with_alignment(8)
    .with_header(HeaderBlock::External)
    .with_debug(true);

  let mut pool = ObjectAllocator::new(24, config)?;
  let layout = pool.layout();

  println!(
    "block size = {}, page size = {}, left align = {}, inter align = {}",
    layout.block_size, layout.page_size, layout.left_align, layout.inter_align
  );
  print_stats("start", &pool.stats());
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 1) Fill the first page.
  // --------------------------------------------------------------------
  let mut objects = Vec::new();
  for i in 0..4 {
    let label = format!("object-{}", i);
    let object = pool.allocate(Some(label.as_bytes()))?;
    println!("\n[1] Allocated {:p} labelled {:?}", object, label);
    objects.push(object);
  }
  print_stats("1", &pool.stats());
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 2) One more object forces a second page.
  // --------------------------------------------------------------------
  let extra = pool.allocate(None)?;
  println!("\n[2] Allocated {:p} from a new page", extra);
  print_stats("2", &pool.stats());
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 3) Free an object and allocate again: the freed block comes back first.
  // --------------------------------------------------------------------
  unsafe { pool.free(objects[1])? };
  let reused = pool.allocate(None)?;
  println!(
    "\n[3] reused == freed? {}",
    if reused == objects[1] { "Yes, LIFO reuse" } else { "No" }
  );
  objects[1] = reused;
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 4) Misuse is caught in debug mode.
  // --------------------------------------------------------------------
  unsafe {
    pool.free(extra)?;
    match pool.free(extra) {
      Err(err) => println!("\n[4] Double free rejected: {}", err),
      Ok(()) => println!("\n[4] Double free went unnoticed"),
    }

    objects[0].as_ptr().add(24).write(0);
  }

  let corrupted = pool.validate_pages(print_object);
  println!("[4] {} corrupted block(s)", corrupted);

  match unsafe { pool.free(objects[0]) } {
    Err(err) => println!("[4] Free rejected: {}", err),
    Ok(()) => println!("[4] Corrupted free went unnoticed"),
  }
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 5) Dump what is still in use and give back the empty page.
  // --------------------------------------------------------------------
  println!("\n[5] In use:");
  let in_use = pool.dump_memory_in_use(print_object);
  println!("[5] {} object(s) in use", in_use);

  let reclaimed = pool.free_empty_pages();
  println!("[5] Reclaimed {} empty page(s)", reclaimed);
  print_stats("5", &pool.stats());

  println!("\n[6] End of example. Dropping the pool releases every page.");
  Ok(())
}
