use std::ptr::NonNull;

use crate::{
  block::{BlockInfo, BlockPtr, DSIZE, Tag, WSIZE},
  compress::{Compressor, Link},
};

/// Word-level view of the grown heap region `[lo, hi)`.
///
/// Every read and write is bounds-checked against the region, so a corrupted
/// size tag turns into a panic instead of a stray access outside the heap.
pub(crate) struct RawHeap {
  origin: NonNull<u8>,
  lo: usize,
  hi: usize,
  codec: Compressor,
}

impl RawHeap {
  /// Wraps a region that starts at `origin` and is `len` bytes long. The
  /// prologue block pointer (one double word in) becomes the heap base.
  pub(crate) fn new(
    origin: NonNull<u8>,
    len: usize,
  ) -> Self {
    let lo = origin.as_ptr() as usize;

    Self {
      origin,
      lo,
      hi: lo + len,
      codec: Compressor::new(lo + DSIZE),
    }
  }

  pub(crate) const fn lo(&self) -> usize {
    self.lo
  }

  pub(crate) const fn hi(&self) -> usize {
    self.hi
  }

  pub(crate) const fn len(&self) -> usize {
    self.hi - self.lo
  }

  /// Accepts `increment` more bytes right after the current end.
  pub(crate) fn grow(
    &mut self,
    increment: usize,
  ) {
    self.hi += increment;
  }

  pub(crate) const fn prologue(&self) -> BlockPtr {
    BlockPtr::new(self.codec.base())
  }

  /// The first block after the prologue (the epilogue on an empty heap).
  pub(crate) const fn first_block(&self) -> BlockPtr {
    self.prologue().offset(DSIZE)
  }

  /// `true` if `bp` could address a real block: past the prologue, aligned,
  /// and with room for the two link words before the end of the heap.
  pub(crate) fn holds(
    &self,
    bp: BlockPtr,
  ) -> bool {
    bp.addr() > self.codec.base() && bp.addr() + DSIZE <= self.hi && crate::align::is_aligned(bp.addr())
  }

  #[inline]
  fn word_ptr(
    &self,
    addr: usize,
  ) -> *mut u32 {
    assert!(
      addr >= self.lo && addr + WSIZE <= self.hi && addr % WSIZE == 0,
      "heap access at {addr:#x} outside [{:#x}, {:#x})",
      self.lo,
      self.hi
    );
    unsafe { self.origin.as_ptr().add(addr - self.lo) }.cast()
  }

  #[inline]
  pub(crate) fn word(
    &self,
    addr: usize,
  ) -> u32 {
    unsafe { self.word_ptr(addr).read() }
  }

  #[inline]
  pub(crate) fn set_word(
    &mut self,
    addr: usize,
    value: u32,
  ) {
    unsafe { self.word_ptr(addr).write(value) }
  }

  #[inline]
  pub(crate) fn header(
    &self,
    bp: BlockPtr,
  ) -> Tag {
    Tag(self.word(bp.header_addr()))
  }

  #[inline]
  pub(crate) fn footer(
    &self,
    bp: BlockPtr,
  ) -> Tag {
    Tag(self.word(self.footer_addr(bp)))
  }

  /// Footer address derived from the header's size.
  #[inline]
  pub(crate) fn footer_addr(
    &self,
    bp: BlockPtr,
  ) -> usize {
    bp.addr() + self.header(bp).size() - DSIZE
  }

  /// Footer of the block physically before `bp`.
  #[inline]
  pub(crate) fn prev_footer(
    &self,
    bp: BlockPtr,
  ) -> Tag {
    Tag(self.word(bp.prev_footer_addr()))
  }

  #[inline]
  pub(crate) fn set_header(
    &mut self,
    bp: BlockPtr,
    tag: Tag,
  ) {
    self.set_word(bp.header_addr(), tag.raw());
  }

  /// Writes `tag` as the footer of a block of `tag.size()` bytes at `bp`.
  #[inline]
  pub(crate) fn set_footer(
    &mut self,
    bp: BlockPtr,
    tag: Tag,
  ) {
    self.set_word(bp.addr() + tag.size() - DSIZE, tag.raw());
  }

  /// Writes matching header and footer.
  #[inline]
  pub(crate) fn set_tags(
    &mut self,
    bp: BlockPtr,
    tag: Tag,
  ) {
    self.set_header(bp, tag);
    self.set_footer(bp, tag);
  }

  #[inline]
  pub(crate) fn next_block(
    &self,
    bp: BlockPtr,
  ) -> BlockPtr {
    bp.offset(self.header(bp).size())
  }

  #[inline]
  pub(crate) fn prev_block(
    &self,
    bp: BlockPtr,
  ) -> BlockPtr {
    BlockPtr::new(bp.addr() - self.prev_footer(bp).size())
  }

  #[inline]
  pub(crate) fn pred(
    &self,
    bp: BlockPtr,
  ) -> Link {
    self.codec.decompress(self.word(bp.addr()))
  }

  #[inline]
  pub(crate) fn succ(
    &self,
    bp: BlockPtr,
  ) -> Link {
    self.codec.decompress(self.word(bp.addr() + WSIZE))
  }

  #[inline]
  pub(crate) fn set_pred(
    &mut self,
    bp: BlockPtr,
    link: Link,
  ) {
    let offset = self.codec.compress(link);
    self.set_word(bp.addr(), offset);
  }

  #[inline]
  pub(crate) fn set_succ(
    &mut self,
    bp: BlockPtr,
    link: Link,
  ) {
    let offset = self.codec.compress(link);
    self.set_word(bp.addr() + WSIZE, offset);
  }

  pub(crate) fn info(
    &self,
    bp: BlockPtr,
  ) -> BlockInfo {
    let tag = self.header(bp);
    BlockInfo {
      ptr: bp,
      size: tag.size(),
      allocated: tag.is_allocated(),
    }
  }

  /// Caller-visible pointer to the payload of `bp`.
  pub(crate) fn payload(
    &self,
    bp: BlockPtr,
  ) -> NonNull<u8> {
    assert!(bp.addr() > self.lo && bp.addr() < self.hi);
    unsafe { self.origin.add(bp.addr() - self.lo) }
  }

  /// Block owning the payload at `ptr`.
  pub(crate) fn block_of(
    &self,
    ptr: *const u8,
  ) -> BlockPtr {
    BlockPtr::new(ptr as usize)
  }

  /// Physical walk over every block between the prologue and the epilogue.
  pub(crate) fn blocks(&self) -> Blocks<'_> {
    Blocks {
      heap: self,
      cursor: Some(self.first_block()),
    }
  }
}

/// Iterator returned by [`RawHeap::blocks`]. Stops at the epilogue, or early
/// if a size tag would step outside the heap.
pub struct Blocks<'a> {
  heap: &'a RawHeap,
  cursor: Option<BlockPtr>,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let bp = self.cursor.take()?;
    let info = self.heap.info(bp);

    if info.size == 0 || info.end() > self.heap.hi() - WSIZE {
      return None;
    }

    self.cursor = Some(bp.offset(info.size));
    Some(info)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::pack;

  fn with_heap<F: FnOnce(&mut RawHeap)>(f: F) {
    let mut storage = vec![0u64; 16];
    let origin = NonNull::new(storage.as_mut_ptr().cast::<u8>()).unwrap();
    let mut heap = RawHeap::new(origin, storage.len() * 8);
    f(&mut heap);
  }

  #[test]
  fn test_tags_and_neighbours() {
    with_heap(|heap| {
      let first = heap.first_block();
      heap.set_tags(heap.prologue(), pack(8, true));
      heap.set_tags(first, pack(24, false));
      let second = heap.next_block(first);
      heap.set_tags(second, pack(32, true));

      assert_eq!(heap.header(first), pack(24, false));
      assert_eq!(heap.footer(first), pack(24, false));
      assert_eq!(second.addr(), first.addr() + 24);
      assert_eq!(heap.prev_block(second), first);
      assert_eq!(heap.prev_block(first), heap.prologue());
    });
  }

  #[test]
  fn test_links_are_compressed() {
    with_heap(|heap| {
      let first = heap.first_block();
      let other = first.offset(48);

      heap.set_pred(first, Link::Nil);
      heap.set_succ(first, Link::Block(other));

      assert_eq!(heap.word(first.addr()), 0);
      assert_eq!(heap.word(first.addr() + WSIZE), (other.addr() - heap.prologue().addr()) as u32);
      assert_eq!(heap.pred(first), Link::Nil);
      assert_eq!(heap.succ(first), Link::Block(other));
    });
  }

  #[test]
  #[should_panic(expected = "outside")]
  fn test_out_of_bounds_access_panics() {
    with_heap(|heap| {
      let end = heap.hi();
      heap.word(end);
    });
  }
}
