use crate::{
  align::ALIGNMENT,
  block::{BlockPtr, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, MIN_PAYLOAD, OVERHEAD, pack},
  config::FitPolicy,
  freelist::FreeList,
  heap::RawHeap,
};

/// Block size needed for a `size`-byte payload: tags added, rounded to the
/// alignment, never below [`MIN_BLOCK_SIZE`]. `None` if a boundary tag could
/// not encode it. `size` must be non-zero.
pub(crate) fn adjust_size(size: usize) -> Option<usize> {
  if size <= MIN_PAYLOAD {
    return Some(MIN_BLOCK_SIZE);
  }

  let asize = size.checked_add(OVERHEAD + ALIGNMENT - 1)? & !(ALIGNMENT - 1);
  (asize <= MAX_BLOCK_SIZE).then_some(asize)
}

fn fits(
  heap: &RawHeap,
  bp: BlockPtr,
  asize: usize,
) -> bool {
  let tag = heap.header(bp);
  !tag.is_allocated() && tag.size() >= asize
}

/// Searches the free list for a block of at least `asize` bytes.
pub(crate) fn find_fit(
  list: &FreeList,
  heap: &RawHeap,
  asize: usize,
  policy: FitPolicy,
) -> Option<BlockPtr> {
  let mut candidates = list.iter(heap);
  let first = candidates.find(|&bp| fits(heap, bp, asize))?;

  match policy {
    FitPolicy::FirstFit => Some(first),
    FitPolicy::BestOf { window } => {
      let mut best = first;
      let mut best_size = heap.header(first).size();

      for bp in candidates.take(window) {
        if best_size == asize {
          break;
        }
        let size = heap.header(bp).size();
        if fits(heap, bp, asize) && size < best_size {
          best = bp;
          best_size = size;
        }
      }

      Some(best)
    },
  }
}

/// Allocates `asize` bytes at the start of the free block `bp`.
///
/// If the rest would make a block of its own, it stays free and takes `bp`'s
/// place in the list. Otherwise the whole block is handed out and unlinked.
pub(crate) fn place(
  list: &mut FreeList,
  heap: &mut RawHeap,
  bp: BlockPtr,
  asize: usize,
) {
  let csize = heap.header(bp).size();
  let (pred, succ) = (heap.pred(bp), heap.succ(bp));
  debug_assert!(csize >= asize);

  if csize - asize >= MIN_BLOCK_SIZE {
    heap.set_tags(bp, pack(asize as u32, true));
    let rest = bp.offset(asize);
    heap.set_tags(rest, pack((csize - asize) as u32, false));
    list.replace(heap, bp, rest, pred, succ);
    log::trace!("place {asize} bytes at {bp:?}, split off {} at {rest:?}", csize - asize);
  } else {
    heap.set_tags(bp, pack(csize as u32, true));
    list.remove(heap, bp, pred, succ);
    log::trace!("place {asize} bytes at {bp:?}, whole block of {csize}");
  }
}
