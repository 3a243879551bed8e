use std::fmt;

/// Size of a boundary tag (header or footer) in bytes.
pub const WSIZE: usize = 4;

/// Double word size in bytes.
pub const DSIZE: usize = 8;

/// Bytes of every block spent on its header and footer.
pub const OVERHEAD: usize = 2 * WSIZE;

/// Smallest block the heap ever carves out.
///
/// A free block must hold both tags plus the two compressed list links, which
/// rounds up to three double words. The same value is the split threshold in
/// placement: a remainder smaller than this stays with the allocated block.
pub const MIN_BLOCK_SIZE: usize = 3 * DSIZE;

/// Largest request that still rounds to [`MIN_BLOCK_SIZE`].
pub const MIN_PAYLOAD: usize = 2 * DSIZE;

/// Largest block size a boundary tag can encode.
pub const MAX_BLOCK_SIZE: usize = (u32::MAX & !0x7) as usize;

/// Default number of bytes the heap grows by when no free block fits.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 9;

const ALLOCATED_BIT: u32 = 0x1;
const SIZE_MASK: u32 = !0x7;

/// Packs a block size and its allocation state into a boundary tag.
#[inline]
pub const fn pack(
  size: u32,
  allocated: bool,
) -> Tag {
  Tag(size | if allocated { ALLOCATED_BIT } else { 0 })
}

/// A header or footer word.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Tag(pub(crate) u32);

impl Tag {
  /// The epilogue marker: zero size, permanently allocated.
  pub const EPILOGUE: Tag = pack(0, true);

  #[inline]
  pub const fn size(self) -> usize {
    (self.0 & SIZE_MASK) as usize
  }

  #[inline]
  pub const fn is_allocated(self) -> bool {
    self.0 & ALLOCATED_BIT != 0
  }

  #[inline]
  pub const fn raw(self) -> u32 {
    self.0
  }
}

impl fmt::Debug for Tag {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "[{}:{}]", self.size(), if self.is_allocated() { 'a' } else { 'f' })
  }
}

impl fmt::Display for Tag {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// Address of a block's payload, the byte right after its header.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPtr(usize);

impl BlockPtr {
  #[inline]
  pub(crate) const fn new(addr: usize) -> Self {
    Self(addr)
  }

  #[inline]
  pub const fn addr(self) -> usize {
    self.0
  }

  /// Address of the header word.
  #[inline]
  pub(crate) const fn header_addr(self) -> usize {
    self.0 - WSIZE
  }

  /// Address of the previous block's footer word.
  #[inline]
  pub(crate) const fn prev_footer_addr(self) -> usize {
    self.0 - DSIZE
  }

  #[inline]
  pub(crate) const fn offset(
    self,
    bytes: usize,
  ) -> Self {
    Self(self.0 + bytes)
  }
}

impl fmt::Debug for BlockPtr {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{:#x}", self.0)
  }
}

/// Snapshot of one block, as seen by a heap walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub ptr: BlockPtr,
  pub size: usize,
  pub allocated: bool,
}

impl BlockInfo {
  /// Bytes usable by the caller.
  pub const fn payload_size(&self) -> usize {
    self.size - OVERHEAD
  }

  /// Address one past the end of the block.
  pub const fn end(&self) -> usize {
    self.ptr.addr() - WSIZE + self.size
  }
}
