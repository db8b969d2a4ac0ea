use std::{io::Read, ptr::NonNull};

use libc::sbrk;
use mist::{Allocator, DebugAllocator, DynamicArray, Growth, SystemAllocator};
use tracing_subscriber::EnvFilter;

/// Waits until the user presses ENTER.
/// Handy for inspecting the process with `pmap`, `gdb` or `htop` between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn print_block<A: Allocator>(
  label: &str,
  block: NonNull<u8>,
) {
  println!(
    "[{}] address = {:?}, recorded size = {:?}",
    label,
    block,
    unsafe { A::block_size(block) },
  );
}

fn main() {
  // RUST_LOG=trace shows every alloc/free/realloc made by DebugAllocator.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Raw block from the debug allocator. The size lives in the word
    //    just before the returned pointer.
    // --------------------------------------------------------------------
    let block = DebugAllocator::alloc_raw(100);
    println!("\n[1] DebugAllocator::alloc_raw(100)");
    print_block::<DebugAllocator>("1", block);

    block.cast::<usize>().write(10);
    println!("[1] Value written = {}", block.cast::<usize>().read());

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Realloc. The debug allocator always moves the block, so any pointer
    //    kept from step 1 now points at poisoned, freed memory.
    // --------------------------------------------------------------------
    let grown = DebugAllocator::realloc_raw(block, 200);
    println!("\n[2] DebugAllocator::realloc_raw(block, 200)");
    print_block::<DebugAllocator>("2", grown);
    println!("[2] moved? {}", if grown != block { "Yes" } else { "No" });
    println!("[2] Value carried over = {}", grown.cast::<usize>().read());

    DebugAllocator::free_raw(grown);

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) The same with the system allocator, which may resize in place.
    // --------------------------------------------------------------------
    let block = SystemAllocator::alloc_raw(100);
    let grown = SystemAllocator::realloc_raw(block, 200);
    println!("\n[3] SystemAllocator::realloc_raw(block, 200)");
    print_block::<SystemAllocator>("3", grown);
    println!("[3] moved? {}", if grown != block { "Yes" } else { "No" });

    SystemAllocator::free_raw(grown);

    block_until_enter_pressed();
  }

  // --------------------------------------------------------------------
  // 4) Growth policies. Fixed steps reallocate far more often than doubling.
  // --------------------------------------------------------------------
  for growth in [Growth::REFERENCE, Growth::Geometric] {
    let mut array = DynamicArray::<u64, DebugAllocator>::with_growth(growth);
    let mut moves = 0;
    let mut last = array.as_raw_array();

    for value in 0..1000 {
      array.insert_as_last(value);
      if array.as_raw_array() != last {
        moves += 1;
        last = array.as_raw_array();
      }
    }

    println!(
      "\n[4] {:?}: size = {}, reserved = {}, block moved {} times",
      growth,
      array.size(),
      array.reserved_size(),
      moves
    );
  }

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Large array to observe heap growth.
  // --------------------------------------------------------------------
  unsafe { print_program_break("before large array") };

  let mut big = DynamicArray::<u8, SystemAllocator>::with_reserved(64 * 1024);
  big.resize(64 * 1024, 0xAB);
  println!("\n[5] 64 KiB array, first = {:#X}, last = {:#X}", big.first_value(), big.last_value());

  unsafe { print_program_break("after large array") };

  big.clear();
  println!("\n[6] End of example. Array cleared, reserved = {}", big.reserved_size());
}
