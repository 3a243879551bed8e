//! Boundary-tag coalescing.
//!
//! A block that has just been freed, or that was just added by growing the
//! heap, sits at the head of the free list. Its physical neighbours are found
//! through the previous block's footer and the next block's header; the
//! prologue and epilogue are always allocated, so those reads never leave the
//! heap.
//!
//! Merging two free blocks means one of them has to leave the free list. How
//! that is done depends on whether the two are also neighbours in list order:
//! if they are, the surviving node simply skips past the other; if they are
//! not, the absorbed node is unlinked from wherever it sits. Treating both
//! situations the same way would make a node point at itself.

use crate::{
  block::{BlockPtr, pack},
  compress::Link,
  freelist::FreeList,
  heap::RawHeap,
};

/// Merges the free block `bp` with any free physical neighbours and returns
/// the block that now covers it. `bp` must be the head of the free list.
pub(crate) fn coalesce(
  list: &mut FreeList,
  heap: &mut RawHeap,
  bp: BlockPtr,
) -> BlockPtr {
  debug_assert_eq!(list.head(), Link::Block(bp));

  let prev_alloc = heap.prev_footer(bp).is_allocated();
  let next = heap.next_block(bp);
  let next_alloc = heap.header(next).is_allocated();
  let mut size = heap.header(bp).size();

  match (prev_alloc, next_alloc) {
    (true, true) => {
      log::trace!("coalesce {bp:?}: both neighbours allocated");
      bp
    },
    (true, false) => {
      size += heap.header(next).size();
      absorb_next(list, heap, bp, next);
      heap.set_tags(bp, pack(size as u32, false));
      bp
    },
    (false, true) => {
      let prev = heap.prev_block(bp);
      size += heap.header(prev).size();
      absorb_into_prev(list, heap, bp, prev);
      heap.set_tags(prev, pack(size as u32, false));
      prev
    },
    (false, false) => {
      let prev = heap.prev_block(bp);
      size += heap.header(prev).size() + heap.header(next).size();
      absorb_next(list, heap, bp, next);
      absorb_into_prev(list, heap, bp, prev);
      heap.set_tags(prev, pack(size as u32, false));
      prev
    },
  }
}

/// Drops `next`, the physical successor of `bp`, from the free list.
fn absorb_next(
  list: &mut FreeList,
  heap: &mut RawHeap,
  bp: BlockPtr,
  next: BlockPtr,
) {
  if heap.succ(bp) == Link::Block(next) {
    log::debug!("coalesce {bp:?} with next {next:?}: adjacent in list");
    let after = heap.succ(next);
    heap.set_succ(bp, after);
    if let Link::Block(after) = after {
      heap.set_pred(after, Link::Block(bp));
    }
  } else {
    log::debug!("coalesce {bp:?} with next {next:?}: apart in list");
    let (pred, succ) = (heap.pred(next), heap.succ(next));
    list.remove(heap, next, pred, succ);
  }
}

/// Drops `bp` from the head of the free list and leaves `prev`, its physical
/// predecessor, at the head in its place.
fn absorb_into_prev(
  list: &mut FreeList,
  heap: &mut RawHeap,
  bp: BlockPtr,
  prev: BlockPtr,
) {
  if heap.succ(bp) == Link::Block(prev) {
    log::debug!("coalesce {bp:?} into prev {prev:?}: adjacent in list");
    heap.set_pred(prev, Link::Nil);
    list.set_head(Link::Block(prev));
  } else {
    log::debug!("coalesce {bp:?} into prev {prev:?}: apart in list");
    let (pred, succ) = (heap.pred(prev), heap.succ(prev));
    list.remove(heap, prev, pred, succ);
    let succ = heap.succ(bp);
    list.replace(heap, bp, prev, Link::Nil, succ);
  }
}
