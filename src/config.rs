use crate::block::{DEFAULT_CHUNK_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};

/// How the free list is searched for a block to place a request in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitPolicy {
  /// Take the first block, in list order, that is large enough.
  #[default]
  FirstFit,
  /// Find the first fit, then look at up to `window` more list entries and
  /// take the smallest block that still fits. An exact fit ends the search.
  BestOf { window: usize },
}

/// Runtime knobs of a [`FreeListAllocator`](crate::FreeListAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  /// Minimum number of bytes requested from the memory source whenever the
  /// heap has to grow.
  pub chunk_size: usize,
  pub fit: FitPolicy,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      chunk_size: DEFAULT_CHUNK_SIZE,
      fit: FitPolicy::FirstFit,
    }
  }
}

impl HeapConfig {
  pub fn with_chunk_size(
    mut self,
    chunk_size: usize,
  ) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  pub fn with_fit(
    mut self,
    fit: FitPolicy,
  ) -> Self {
    self.fit = fit;
    self
  }

  /// Chunk size actually used: aligned, and between one minimum block and the
  /// largest block a tag can describe.
  pub(crate) fn effective_chunk_size(&self) -> usize {
    crate::align!(self.chunk_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE))
  }
}
