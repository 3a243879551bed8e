//! 32-bit free-list links relative to the heap base.
//!
//! A minimum-size free block only has 8 bytes of payload, which is not enough
//! for two native pointers on 64-bit hosts. Links are therefore stored as the
//! distance from the heap base, which fits in a `u32` as long as the heap
//! stays below 4 GiB. Offset 0 is the base itself (the prologue), which is
//! never a free block and doubles as the end-of-list marker.

use crate::block::BlockPtr;

/// A free-list link: either the end of the list or a free block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
  Nil,
  Block(BlockPtr),
}

impl Link {
  #[inline]
  pub const fn block(self) -> Option<BlockPtr> {
    match self {
      Link::Nil => None,
      Link::Block(bp) => Some(bp),
    }
  }

  #[inline]
  pub const fn is_nil(self) -> bool {
    matches!(self, Link::Nil)
  }
}

impl From<BlockPtr> for Link {
  fn from(bp: BlockPtr) -> Self {
    Link::Block(bp)
  }
}

/// Converts between absolute addresses and base-relative offsets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Compressor {
  base: usize,
}

impl Compressor {
  pub(crate) const fn new(base: usize) -> Self {
    Self { base }
  }

  #[inline]
  pub(crate) const fn base(&self) -> usize {
    self.base
  }

  /// Truncates to 32 bits. The heap never grows past `u32::MAX` bytes, so no
  /// information is lost for addresses inside it.
  #[inline]
  pub(crate) const fn compress(
    &self,
    link: Link,
  ) -> u32 {
    match link {
      Link::Nil => 0,
      Link::Block(bp) => (bp.addr() - self.base) as u32,
    }
  }

  #[inline]
  pub(crate) const fn decompress(
    &self,
    offset: u32,
  ) -> Link {
    if offset == 0 {
      Link::Nil
    } else {
      Link::Block(BlockPtr::new(self.base + offset as usize))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_nil_is_base() {
    let codec = Compressor::new(0x7f00_0000_1008);
    assert_eq!(codec.compress(Link::Nil), 0);
    assert_eq!(codec.decompress(0), Link::Nil);
  }

  #[test]
  fn test_wide_addresses_fit() {
    let base = 0x7f00_0000_1008;
    let codec = Compressor::new(base);
    let bp = BlockPtr::new(base + 0x00ff_fff0);

    let offset = codec.compress(Link::Block(bp));
    assert_eq!(offset, 0x00ff_fff0);
    assert_eq!(codec.decompress(offset), Link::Block(bp));
  }

  #[test]
  fn test_link_block() {
    let bp = BlockPtr::new(0x2000);
    assert_eq!(Link::from(bp).block(), Some(bp));
    assert_eq!(Link::Nil.block(), None);
    assert!(Link::Nil.is_nil());
    assert!(!Link::Block(bp).is_nil());
  }
}
