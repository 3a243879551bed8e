//! Intrusive, doubly linked, LIFO list of free blocks.
//!
//! The list owns no memory: its nodes are the free blocks themselves, with the
//! predecessor and successor links stored as compressed offsets in the first
//! two payload words. Only the head lives outside the heap.

use crate::{
  block::{BlockPtr, MIN_BLOCK_SIZE},
  compress::Link,
  heap::RawHeap,
};

pub(crate) struct FreeList {
  head: Link,
}

impl FreeList {
  pub(crate) const fn new() -> Self {
    Self { head: Link::Nil }
  }

  pub(crate) const fn head(&self) -> Link {
    self.head
  }

  pub(crate) fn set_head(
    &mut self,
    head: Link,
  ) {
    self.head = head;
  }

  /// Pushes `bp` to the front of the list.
  pub(crate) fn insert_head(
    &mut self,
    heap: &mut RawHeap,
    bp: BlockPtr,
  ) {
    heap.set_pred(bp, Link::Nil);
    heap.set_succ(bp, self.head);
    if let Link::Block(old_head) = self.head {
      heap.set_pred(old_head, Link::Block(bp));
    }
    self.head = Link::Block(bp);
  }

  /// Unlinks `bp`, whose current neighbours in the list are `pred` and `succ`.
  pub(crate) fn remove(
    &mut self,
    heap: &mut RawHeap,
    bp: BlockPtr,
    pred: Link,
    succ: Link,
  ) {
    match pred {
      Link::Block(pred) => heap.set_succ(pred, succ),
      Link::Nil => {
        debug_assert_eq!(self.head, Link::Block(bp));
        self.head = succ;
      },
    }
    if let Link::Block(succ) = succ {
      heap.set_pred(succ, pred);
    }
  }

  /// Puts `new` into the list slot held by `old`, whose neighbours are `pred`
  /// and `succ`. `old` is no longer reachable afterwards.
  pub(crate) fn replace(
    &mut self,
    heap: &mut RawHeap,
    old: BlockPtr,
    new: BlockPtr,
    pred: Link,
    succ: Link,
  ) {
    heap.set_pred(new, pred);
    heap.set_succ(new, succ);
    match pred {
      Link::Block(pred) => heap.set_succ(pred, Link::Block(new)),
      Link::Nil => {
        debug_assert_eq!(self.head, Link::Block(old));
        self.head = Link::Block(new);
      },
    }
    if let Link::Block(succ) = succ {
      heap.set_pred(succ, Link::Block(new));
    }
  }

  /// Linear scan from the head.
  pub(crate) fn contains(
    &self,
    heap: &RawHeap,
    bp: BlockPtr,
  ) -> bool {
    self.iter(heap).any(|node| node == bp)
  }

  /// Walks the successor links from the head. The walk gives up after as many
  /// steps as the heap could possibly hold free blocks, so a corrupted list
  /// with a cycle cannot hang it.
  pub(crate) fn iter<'a>(
    &self,
    heap: &'a RawHeap,
  ) -> Iter<'a> {
    Iter {
      heap,
      cursor: self.head,
      budget: heap.len() / MIN_BLOCK_SIZE + 1,
    }
  }
}

pub(crate) struct Iter<'a> {
  heap: &'a RawHeap,
  cursor: Link,
  budget: usize,
}

impl Iter<'_> {
  /// `true` once the walk has been cut short by the step budget.
  pub(crate) fn exhausted(&self) -> bool {
    self.budget == 0 && !self.cursor.is_nil()
  }
}

impl Iterator for Iter<'_> {
  type Item = BlockPtr;

  fn next(&mut self) -> Option<Self::Item> {
    let bp = self.cursor.block()?;
    if self.budget == 0 {
      return None;
    }
    self.budget -= 1;
    self.cursor = if self.heap.holds(bp) { self.heap.succ(bp) } else { Link::Nil };
    Some(bp)
  }
}
