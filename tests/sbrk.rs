//! Runs against the real program break, so it lives in its own test binary.
//!
//! The break is shared with the system allocator. Only `initialize` grows the
//! heap here; the allocations below fit in the first chunk, so nothing after
//! it can race with a foreign `brk`.

#![cfg(unix)]

use rmalloc::{FreeListAllocator, HeapError, SbrkSource};

#[test]
fn test_sbrk_heap() {
  let before = SbrkSource::program_break() as usize;
  let mut heap = match FreeListAllocator::initialize(SbrkSource::new()) {
    Ok(heap) => heap,
    // Someone else moved the break between the two grants of `initialize`.
    Err(err @ HeapError::NonContiguous { .. }) => {
      eprintln!("skipping: {err}");
      return;
    },
    Err(err) => panic!("initialize failed: {err}"),
  };
  let size = heap.heap_size();

  let start = heap.blocks().next().unwrap().ptr.addr();
  assert!(start >= before);
  assert_eq!(start % 8, 0);

  let a = heap.allocate(24).unwrap();
  let b = heap.allocate(100).unwrap();
  unsafe {
    a.as_ptr().write_bytes(0xab, 24);
    b.as_ptr().write_bytes(0xcd, 100);
    heap.deallocate(a.as_ptr());
  }

  let c = heap.allocate(24).unwrap();
  assert_eq!(a, c);
  assert_eq!(unsafe { b.as_ptr().read() }, 0xcd);
  assert_eq!(heap.heap_size(), size);

  heap.check_heap(false);
}
