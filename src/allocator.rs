use std::ptr::{self, NonNull};

use crate::{
  align::is_aligned,
  block::{BlockInfo, BlockPtr, DSIZE, MAX_BLOCK_SIZE, Tag, pack},
  check,
  coalesce::coalesce,
  config::HeapConfig,
  error::{CheckError, HeapError, Result},
  freelist::FreeList,
  heap::{Blocks, RawHeap},
  place::{adjust_size, find_fit, place},
  source::{ArenaSource, MemorySource},
};

/// Explicit free-list allocator over one growable heap region.
///
/// Every operation takes `&mut self`: the allocator is single-threaded and
/// not reentrant.
pub struct FreeListAllocator<S: MemorySource = ArenaSource> {
  source: S,
  heap: RawHeap,
  free: FreeList,
  config: HeapConfig,
}

impl<S: MemorySource> FreeListAllocator<S> {
  /// Sets up the prologue and epilogue and grows the heap by one chunk.
  pub fn initialize(source: S) -> Result<Self> {
    Self::with_config(source, HeapConfig::default())
  }

  pub fn with_config(
    mut source: S,
    config: HeapConfig,
  ) -> Result<Self> {
    let len = 2 * DSIZE;
    let origin = source
      .grow(len)
      .ok_or(HeapError::OutOfMemory { requested: len })?;

    let lo = origin.as_ptr() as usize;
    if !is_aligned(lo) {
      return Err(HeapError::Misaligned { addr: lo });
    }

    let mut heap = RawHeap::new(origin, len);
    heap.set_word(heap.lo(), 0);
    heap.set_tags(heap.prologue(), pack(DSIZE as u32, true));
    heap.set_header(heap.first_block(), Tag::EPILOGUE);

    let mut allocator = Self {
      source,
      heap,
      free: FreeList::new(),
      config,
    };
    allocator.extend_heap(config.effective_chunk_size())?;

    log::debug!(
      "heap initialized at {:#x}, {} bytes, {:?}",
      lo,
      allocator.heap.len(),
      config.fit
    );
    Ok(allocator)
  }

  /// Grows the heap by `bytes` (rounded to the alignment) and returns the free
  /// block covering the new space, already merged with a free last block.
  fn extend_heap(
    &mut self,
    bytes: usize,
  ) -> Result<BlockPtr> {
    let size = crate::align!(bytes);
    let within_limit = self
      .heap
      .len()
      .checked_add(size)
      .is_some_and(|len| len <= MAX_BLOCK_SIZE);
    if !within_limit {
      return Err(HeapError::TooLarge { requested: size });
    }

    let start = self
      .source
      .grow(size)
      .ok_or(HeapError::OutOfMemory { requested: size })?;

    let expected = self.heap.hi();
    let actual = start.as_ptr() as usize;
    if actual != expected {
      log::warn!("memory source moved: heap ends at {expected:#x}, new region at {actual:#x}");
      return Err(HeapError::NonContiguous { expected, actual });
    }

    self.heap.grow(size);

    // The new block's header takes the place of the old epilogue.
    let bp = BlockPtr::new(actual);
    self.heap.set_tags(bp, pack(size as u32, false));
    let epilogue = self.heap.next_block(bp);
    self.heap.set_header(epilogue, Tag::EPILOGUE);

    log::debug!("heap extended by {size} bytes at {bp:?}, now {} bytes", self.heap.len());

    self.free.insert_head(&mut self.heap, bp);
    Ok(coalesce(&mut self.free, &mut self.heap, bp))
  }

  /// Allocates a block with at least `size` bytes of payload.
  ///
  /// Returns `None` for a zero-sized request or when the heap cannot grow
  /// enough. The payload is 8-byte aligned and uninitialized.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if size == 0 {
      return None;
    }

    let Some(asize) = adjust_size(size) else {
      log::warn!("allocate({size}): larger than any block can be");
      return None;
    };

    let bp = match find_fit(&self.free, &self.heap, asize, self.config.fit) {
      Some(bp) => bp,
      None => {
        let extend = asize.max(self.config.effective_chunk_size());
        match self.extend_heap(extend) {
          Ok(bp) => bp,
          Err(err) => {
            log::warn!("allocate({size}): {err}");
            return None;
          },
        }
      },
    };

    place(&mut self.free, &mut self.heap, bp, asize);

    let ptr = self.heap.payload(bp);
    log::trace!("allocate({size}) -> {ptr:?}");
    Some(ptr)
  }

  /// Returns the block at `ptr` to the free list and merges it with free
  /// neighbours. A null `ptr` is ignored.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a pointer returned by this allocator that has not
  /// been deallocated since.
  pub unsafe fn deallocate(
    &mut self,
    ptr: *mut u8,
  ) {
    if ptr.is_null() {
      return;
    }

    let bp = self.heap.block_of(ptr);
    let size = self.heap.header(bp).size();

    self.heap.set_tags(bp, pack(size as u32, false));
    self.free.insert_head(&mut self.heap, bp);
    let merged = coalesce(&mut self.free, &mut self.heap, bp);

    log::trace!("deallocate({ptr:?}): {size} bytes, free block now {merged:?}");
  }

  /// Moves the allocation at `ptr` into a fresh block of `size` bytes.
  ///
  /// A zero `size` frees `ptr` and returns `None`; a null `ptr` is a plain
  /// allocation. The first `min(old payload, size)` bytes are copied. If no
  /// new block can be had, `ptr` is left untouched and `None` is returned.
  ///
  /// # Safety
  ///
  /// Same contract as [`deallocate`](Self::deallocate).
  pub unsafe fn reallocate(
    &mut self,
    ptr: *mut u8,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if size == 0 {
      unsafe { self.deallocate(ptr) };
      return None;
    }

    let Some(old) = NonNull::new(ptr) else {
      return self.allocate(size);
    };

    let old_payload = self.heap.info(self.heap.block_of(ptr)).payload_size();
    let new = self.allocate(size)?;

    unsafe {
      ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), old_payload.min(size));
      self.deallocate(ptr);
    }

    log::trace!("reallocate({ptr:?}, {size}) -> {new:?}");
    Some(new)
  }

  /// Allocates `count * size` bytes, all zero. `None` if the product
  /// overflows or the allocation fails.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let bytes = count.checked_mul(size)?;
    let ptr = self.allocate(bytes)?;

    unsafe { ptr.as_ptr().write_bytes(0, bytes) };

    Some(ptr)
  }

  /// Runs the consistency checker. With `verbose`, prints every block first.
  ///
  /// # Panics
  ///
  /// On any violation. A corrupted heap cannot be repaired, so there is
  /// nothing for the caller to recover. The panic only unwinds the calling
  /// thread; build with `panic = "abort"` to have a violation end the process.
  pub fn check_heap(
    &self,
    verbose: bool,
  ) {
    if verbose {
      check::print_heap(&self.heap);
    }

    if let Err(err) = self.verify() {
      log::error!("heap check failed: {err}");
      panic!("heap check failed: {err}");
    }
  }

  /// Runs the consistency checker and reports the first violation.
  pub fn verify(&self) -> core::result::Result<(), CheckError> {
    check::verify(&self.heap, &self.free)
  }

  /// Blocks in address order, prologue and epilogue excluded.
  pub fn blocks(&self) -> Blocks<'_> {
    self.heap.blocks()
  }

  /// Free blocks in list order, most recently freed first.
  pub fn free_blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
    self.free.iter(&self.heap).map(|bp| self.heap.info(bp))
  }

  /// Bytes obtained from the memory source so far.
  pub fn heap_size(&self) -> usize {
    self.heap.len()
  }

  pub fn config(&self) -> &HeapConfig {
    &self.config
  }

  pub fn source(&self) -> &S {
    &self.source
  }
}
