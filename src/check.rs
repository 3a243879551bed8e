//! Heap consistency checker.
//!
//! Walks the heap block by block and then the free list, without modifying
//! either, and reports the first invariant that does not hold.

use crate::{
  align::is_aligned,
  block::{BlockPtr, DSIZE, MIN_BLOCK_SIZE, Tag, WSIZE, pack},
  compress::Link,
  error::CheckError,
  freelist::FreeList,
  heap::RawHeap,
};

pub(crate) fn verify(
  heap: &RawHeap,
  list: &FreeList,
) -> Result<(), CheckError> {
  let prologue = heap.prologue();
  let expected = pack(DSIZE as u32, true);
  if heap.header(prologue) != expected || heap.prev_footer(heap.first_block()) != expected {
    return Err(CheckError::BadPrologue);
  }

  let epilogue_header = heap.hi() - WSIZE;
  let mut free = 0;
  let mut prev_free: Option<BlockPtr> = None;
  let mut bp = heap.first_block();

  loop {
    if !is_aligned(bp.addr()) {
      return Err(CheckError::Misaligned { addr: bp.addr() });
    }

    let header = heap.header(bp);
    if header.size() == 0 {
      break;
    }

    let addr = bp.addr();
    if header.size() < MIN_BLOCK_SIZE {
      return Err(CheckError::Undersized { addr });
    }
    if bp.header_addr() + header.size() > epilogue_header {
      return Err(CheckError::OutOfBounds { addr });
    }

    let footer = heap.footer(bp);
    if header != footer {
      return Err(CheckError::TagMismatch {
        addr,
        header: header.raw(),
        footer: footer.raw(),
      });
    }

    if header.is_allocated() {
      prev_free = None;
    } else {
      if let Some(prev) = prev_free {
        return Err(CheckError::Uncoalesced { addr: prev.addr() });
      }
      if heap.succ(bp) == Link::Block(bp) {
        return Err(CheckError::SelfCycle { addr });
      }
      if !list.contains(heap, bp) {
        return Err(CheckError::NotInFreeList { addr });
      }
      prev_free = Some(bp);
      free += 1;
    }

    bp = bp.offset(header.size());
  }

  if bp.header_addr() != epilogue_header || heap.header(bp) != Tag::EPILOGUE {
    return Err(CheckError::BadEpilogue);
  }

  let mut listed = 0;
  let mut expected_pred = Link::Nil;
  let mut broken = None;
  let mut nodes = list.iter(heap);
  for node in nodes.by_ref() {
    let addr = node.addr();
    if !heap.holds(node) {
      return Err(CheckError::OutOfBounds { addr });
    }
    if broken.is_none() {
      if heap.header(node).is_allocated() {
        broken = Some(CheckError::ListedNotFree { addr });
      } else if heap.pred(node) != expected_pred {
        broken = Some(CheckError::BrokenBackLink { addr });
      }
    }
    expected_pred = Link::Block(node);
    listed += 1;
  }

  if nodes.exhausted() {
    return Err(CheckError::ListCycle);
  }
  if let Some(err) = broken {
    return Err(err);
  }
  if listed != free {
    return Err(CheckError::CountMismatch { listed, free });
  }

  Ok(())
}

/// Prints every block from the prologue to the epilogue.
pub(crate) fn print_heap(heap: &RawHeap) {
  println!("Heap ({:?}):", heap.prologue());
  print_block(heap, heap.prologue());

  let mut end = heap.first_block();
  for block in heap.blocks() {
    print_block(heap, block.ptr);
    end = block.ptr.offset(block.size);
  }

  print_block(heap, end);
}

fn print_block(
  heap: &RawHeap,
  bp: BlockPtr,
) {
  let header = heap.header(bp);
  if header.size() == 0 {
    println!("{bp:?}: EOL");
    return;
  }

  println!("{bp:?}: header: {header} footer: {}", heap.footer(bp));
}
