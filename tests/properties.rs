use std::{collections::BTreeSet, ptr::NonNull};

use proptest::prelude::*;
use rmalloc::{ArenaSource, FitPolicy, FreeListAllocator, HeapConfig};

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  Free(usize),
  Reallocate(usize, usize),
  ZeroAllocate(usize, usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => (1usize..600).prop_map(Op::Allocate),
    3 => any::<usize>().prop_map(Op::Free),
    2 => (any::<usize>(), 1usize..900).prop_map(|(i, s)| Op::Reallocate(i, s)),
    1 => (1usize..20, 1usize..40).prop_map(|(n, s)| Op::ZeroAllocate(n, s)),
  ]
}

fn arb_fit() -> impl Strategy<Value = FitPolicy> {
  prop_oneof![Just(FitPolicy::FirstFit), (0usize..6).prop_map(|window| FitPolicy::BestOf { window }),]
}

/// A live allocation and the byte its payload was filled with.
struct Live {
  ptr: NonNull<u8>,
  len: usize,
  byte: u8,
}

impl Live {
  fn new(
    ptr: NonNull<u8>,
    len: usize,
    byte: u8,
  ) -> Self {
    unsafe { ptr.as_ptr().write_bytes(byte, len) };
    Self { ptr, len, byte }
  }

  fn intact(&self) -> bool {
    let payload = unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) };
    payload.iter().all(|&b| b == self.byte)
  }
}

fn assert_heap_invariants(
  heap: &FreeListAllocator,
  live: &[Live],
) -> Result<(), TestCaseError> {
  prop_assert_eq!(heap.verify(), Ok(()));

  let blocks: Vec<_> = heap.blocks().collect();

  for pair in blocks.windows(2) {
    prop_assert!(pair[0].allocated || pair[1].allocated, "adjacent free blocks at {:?}", pair[0].ptr);
    prop_assert_eq!(pair[0].end(), pair[1].ptr.addr() - 4);
  }

  let free: BTreeSet<_> = blocks.iter().filter(|b| !b.allocated).map(|b| b.ptr).collect();
  let listed: BTreeSet<_> = heap.free_blocks().map(|b| b.ptr).collect();
  prop_assert_eq!(&free, &listed);
  prop_assert_eq!(heap.free_blocks().count(), listed.len());

  let allocated: BTreeSet<_> = blocks.iter().filter(|b| b.allocated).map(|b| b.ptr.addr()).collect();
  for entry in live {
    let addr = entry.ptr.as_ptr() as usize;
    prop_assert_eq!(addr % 8, 0);
    prop_assert!(allocated.contains(&addr), "live payload {:#x} is not an allocated block", addr);
    prop_assert!(entry.intact(), "payload {:#x} was overwritten", addr);
  }

  Ok(())
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(128))]

  #[test]
  fn random_workload_keeps_heap_consistent(
    fit in arb_fit(),
    chunk in prop_oneof![Just(512usize), Just(64), Just(4096)],
    ops in prop::collection::vec(arb_op(), 1..80),
  ) {
    let config = HeapConfig::default().with_chunk_size(chunk).with_fit(fit);
    let mut heap = FreeListAllocator::with_config(ArenaSource::new(1 << 20), config).unwrap();
    let mut live: Vec<Live> = Vec::new();
    let mut next_byte = 1u8;

    for op in ops {
      next_byte = next_byte.wrapping_add(1).max(1);

      match op {
        Op::Allocate(size) => {
          let ptr = heap.allocate(size).unwrap();
          live.push(Live::new(ptr, size, next_byte));
        },
        Op::Free(index) if !live.is_empty() => {
          let entry = live.swap_remove(index % live.len());
          unsafe { heap.deallocate(entry.ptr.as_ptr()) };
        },
        Op::Reallocate(index, size) if !live.is_empty() => {
          let entry = live.swap_remove(index % live.len());
          let ptr = unsafe { heap.reallocate(entry.ptr.as_ptr(), size) }.unwrap();

          let kept = entry.len.min(size);
          let payload = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), kept) };
          prop_assert!(payload.iter().all(|&b| b == entry.byte));

          live.push(Live::new(ptr, size, next_byte));
        },
        Op::ZeroAllocate(count, size) => {
          let ptr = heap.zero_allocate(count, size).unwrap();
          let payload = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), count * size) };
          prop_assert!(payload.iter().all(|&b| b == 0));

          live.push(Live::new(ptr, count * size, next_byte));
        },
        _ => {},
      }

      assert_heap_invariants(&heap, &live)?;
    }

    for entry in live.drain(..) {
      unsafe { heap.deallocate(entry.ptr.as_ptr()) };
    }

    prop_assert_eq!(heap.verify(), Ok(()));
    prop_assert_eq!(heap.blocks().count(), 1);
  }

  #[test]
  fn freed_block_is_reused_first(size in 1usize..400) {
    let mut heap = FreeListAllocator::initialize(ArenaSource::new(1 << 16)).unwrap();

    let a = heap.allocate(size).unwrap();
    let _guard = heap.allocate(size).unwrap();
    let grown = heap.heap_size();

    unsafe { heap.deallocate(a.as_ptr()) };
    let b = heap.allocate(size).unwrap();

    prop_assert_eq!(a, b);
    prop_assert_eq!(heap.heap_size(), grown);
  }
}
