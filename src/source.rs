use std::ptr::{self, NonNull};

/// The host primitive the heap grows through.
///
/// # Safety
///
/// An implementation must hand out memory that is valid for reads and writes,
/// owned by nobody else, and stays mapped for as long as the source lives.
/// Successive grants are expected to be contiguous; the allocator checks this
/// and refuses regions that are not.
pub unsafe trait MemorySource {
  /// Extends the region by `increment` bytes and returns the start of the new
  /// bytes (the previous break), or `None` if the host cannot grow further.
  fn grow(
    &mut self,
    increment: usize,
  ) -> Option<NonNull<u8>>;
}

/// A fixed-capacity buffer with a movable break.
///
/// Models a process heap inside an owned allocation, so several independent
/// heaps can coexist in one process (and in one test binary).
pub struct ArenaSource {
  base: NonNull<u64>,
  words: usize,
  brk: usize,
}

impl ArenaSource {
  /// Capacity used by [`Default`]: 20 MiB.
  pub const DEFAULT_CAPACITY: usize = 20 * (1 << 20);

  /// Reserves `capacity` bytes (rounded up to the alignment). Nothing is
  /// handed out until [`MemorySource::grow`] is called.
  pub fn new(capacity: usize) -> Self {
    let words = crate::align!(capacity) / size_of::<u64>();
    let storage: Box<[u64]> = vec![0u64; words].into_boxed_slice();
    let base = NonNull::from(Box::leak(storage)).cast::<u64>();

    Self { base, words, brk: 0 }
  }

  pub fn capacity(&self) -> usize {
    self.words * size_of::<u64>()
  }

  /// Bytes handed out so far.
  pub fn len(&self) -> usize {
    self.brk
  }

  pub fn is_empty(&self) -> bool {
    self.brk == 0
  }
}

impl Default for ArenaSource {
  fn default() -> Self {
    Self::new(Self::DEFAULT_CAPACITY)
  }
}

unsafe impl MemorySource for ArenaSource {
  fn grow(
    &mut self,
    increment: usize,
  ) -> Option<NonNull<u8>> {
    if increment > self.capacity() - self.brk {
      log::warn!(
        "arena exhausted: {} of {} bytes in use, {} requested",
        self.brk,
        self.capacity(),
        increment
      );
      return None;
    }

    let old_brk = unsafe { self.base.cast::<u8>().add(self.brk) };
    self.brk += increment;

    Some(old_brk)
  }
}

impl Drop for ArenaSource {
  fn drop(&mut self) {
    let storage = ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.words);
    drop(unsafe { Box::from_raw(storage) });
  }
}

/// The process data segment, grown with `sbrk(2)`.
///
/// The first grant is preceded by enough padding to put the break on an
/// 8-byte boundary. Memory is never given back to the OS.
#[cfg(unix)]
#[derive(Debug, Default)]
pub struct SbrkSource {
  aligned: bool,
}

#[cfg(unix)]
impl SbrkSource {
  pub const fn new() -> Self {
    Self { aligned: false }
  }

  /// Current program break.
  pub fn program_break() -> *mut u8 {
    unsafe { libc::sbrk(0) }.cast()
  }

  fn sbrk(increment: usize) -> Option<NonNull<u8>> {
    let increment = libc::intptr_t::try_from(increment).ok()?;
    let address = unsafe { libc::sbrk(increment) };

    if address == usize::MAX as *mut libc::c_void {
      return None;
    }

    NonNull::new(address.cast())
  }
}

#[cfg(unix)]
unsafe impl MemorySource for SbrkSource {
  fn grow(
    &mut self,
    increment: usize,
  ) -> Option<NonNull<u8>> {
    if !self.aligned {
      let current = Self::program_break() as usize;
      let padding = crate::align!(current) - current;
      if padding > 0 {
        Self::sbrk(padding)?;
      }
      self.aligned = true;
    }

    Self::sbrk(increment)
  }
}
