//! Hand-built heaps for unit tests.

use std::ptr::NonNull;

use crate::{
  block::{BlockPtr, DSIZE, Tag, pack},
  freelist::FreeList,
  heap::RawHeap,
};

pub(crate) struct Fixture {
  _storage: Vec<u64>,
  pub(crate) heap: RawHeap,
  pub(crate) list: FreeList,
  pub(crate) blocks: Vec<BlockPtr>,
}

impl Fixture {
  /// Lays out padding, prologue, the given `(size, allocated)` blocks and the
  /// epilogue. The free list starts out empty whatever the tags say.
  pub(crate) fn new(layout: &[(usize, bool)]) -> Self {
    Self::with_skew(layout, 0)
  }

  /// Like [`Fixture::new`], with the region starting `skew` bytes past an
  /// 8-byte boundary.
  pub(crate) fn with_skew(
    layout: &[(usize, bool)],
    skew: usize,
  ) -> Self {
    let len = 2 * DSIZE + layout.iter().map(|(size, _)| size).sum::<usize>();
    let mut storage = vec![0u64; len / DSIZE + 1];
    let origin = NonNull::new(storage.as_mut_ptr().cast::<u8>()).unwrap();
    let origin = unsafe { origin.add(skew) };
    let mut heap = RawHeap::new(origin, len);

    heap.set_word(heap.lo(), 0);
    heap.set_tags(heap.prologue(), pack(DSIZE as u32, true));

    let mut blocks = Vec::with_capacity(layout.len());
    let mut bp = heap.first_block();
    for &(size, allocated) in layout {
      heap.set_tags(bp, pack(size as u32, allocated));
      blocks.push(bp);
      bp = bp.offset(size);
    }
    heap.set_header(bp, Tag::EPILOGUE);

    Self {
      _storage: storage,
      heap,
      list: FreeList::new(),
      blocks,
    }
  }

  /// Pushes blocks onto the free list, by layout index, in the given order.
  pub(crate) fn push_free(
    &mut self,
    indices: &[usize],
  ) {
    for &index in indices {
      self.list.insert_head(&mut self.heap, self.blocks[index]);
    }
  }

  /// Marks block `index` free and pushes it, as deallocation does.
  pub(crate) fn release(
    &mut self,
    index: usize,
  ) -> BlockPtr {
    let bp = self.blocks[index];
    let size = self.heap.header(bp).size();
    self.heap.set_tags(bp, pack(size as u32, false));
    self.list.insert_head(&mut self.heap, bp);
    bp
  }

  pub(crate) fn order(&self) -> Vec<BlockPtr> {
    self.list.iter(&self.heap).collect()
  }

  pub(crate) fn size(
    &self,
    bp: BlockPtr,
  ) -> usize {
    self.heap.header(bp).size()
  }
}
