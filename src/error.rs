use thiserror::Error;

/// Errors raised while setting up or growing the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
  #[error("out of memory: could not grow the heap by {requested} bytes")]
  OutOfMemory { requested: usize },
  #[error("heap growth is not contiguous: expected {expected:#x}, got {actual:#x}")]
  NonContiguous { expected: usize, actual: usize },
  #[error("request of {requested} bytes exceeds the 32-bit heap limit")]
  TooLarge { requested: usize },
  #[error("heap region start {addr:#x} is not 8-byte aligned")]
  Misaligned { addr: usize },
}

/// Invariant violations found by the heap checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckError {
  #[error("bad prologue header")]
  BadPrologue,
  #[error("bad epilogue header")]
  BadEpilogue,
  #[error("block {addr:#x} is not doubleword aligned")]
  Misaligned { addr: usize },
  #[error("block {addr:#x}: header {header:#x} does not match footer {footer:#x}")]
  TagMismatch { addr: usize, header: u32, footer: u32 },
  #[error("block {addr:#x} is smaller than the minimum block size")]
  Undersized { addr: usize },
  #[error("block {addr:#x} runs past the end of the heap")]
  OutOfBounds { addr: usize },
  #[error("free block {addr:#x} is not in the free list")]
  NotInFreeList { addr: usize },
  #[error("free block {addr:#x} is its own successor")]
  SelfCycle { addr: usize },
  #[error("free block {addr:#x} and the block after it were not coalesced")]
  Uncoalesced { addr: usize },
  #[error("free list entry {addr:#x} is not a free block")]
  ListedNotFree { addr: usize },
  #[error("free list entry {addr:#x} has a broken back link")]
  BrokenBackLink { addr: usize },
  #[error("free list does not terminate")]
  ListCycle,
  #[error("free list holds {listed} blocks but the heap has {free} free blocks")]
  CountMismatch { listed: usize, free: usize },
}

pub type Result<T> = core::result::Result<T, HeapError>;
