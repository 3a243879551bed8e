//! # rmalloc - An Explicit Free-List Allocator
//!
//! This crate implements a general-purpose heap allocator on top of a single
//! contiguous region that grows through an `sbrk`-like primitive. Free blocks
//! are kept on an **explicit, doubly linked free list**, and neighbouring free
//! blocks are merged immediately through **boundary tags**.
//!
//! ## Overview
//!
//! ```text
//!   Heap Region:
//!
//!   lo                                                                 hi
//!   ┌─────┬──────────┬────────────┬────────────┬──────────────┬──────────┐
//!   │ pad │ prologue │  block A   │  block B   │   block C    │ epilogue │
//!   │  4  │   8|a    │  alloc'd   │    free    │   alloc'd    │   0|a    │
//!   └─────┴──────────┴────────────┴────────────┴──────────────┴──────────┘
//!                    ▲                                          ▲
//!                    │                                          │
//!               first block                             header of the
//!                                                       (empty) epilogue
//! ```
//!
//! The prologue and epilogue are permanently allocated sentinels, so
//! coalescing never has to special-case the edges of the heap.
//!
//! ## Block Layout
//!
//! ```text
//!   Allocated block:
//!   ┌──────────┬────────────────────────────────────┬──────────┐
//!   │  header  │             payload                │  footer  │
//!   │ size | a │                                    │ size | a │
//!   └──────────┴────────────────────────────────────┴──────────┘
//!              ▲
//!              └── Pointer returned to the caller (8-byte aligned)
//!
//!   Free block:
//!   ┌──────────┬──────────┬──────────┬──────────────┬──────────┐
//!   │  header  │   pred   │   succ   │    unused    │  footer  │
//!   │ size | f │  u32 off │  u32 off │              │ size | f │
//!   └──────────┴──────────┴──────────┴──────────────┴──────────┘
//! ```
//!
//! List links are stored as 32-bit offsets from the prologue, which is why a
//! single heap is limited to 4 GiB. Offset zero means "no block".
//!
//! ## Crate Structure
//!
//! ```text
//!   rmalloc
//!   ├── align      - Alignment macro and helpers
//!   ├── allocator  - FreeListAllocator, the public entry point
//!   ├── block      - Boundary tags and block pointers
//!   ├── check      - Heap consistency checker
//!   ├── coalesce   - Merging of free neighbours
//!   ├── compress   - 32-bit link encoding
//!   ├── config     - Chunk size and fit policy
//!   ├── error      - HeapError and CheckError
//!   ├── freelist   - The intrusive LIFO free list
//!   ├── heap       - Bounds-checked word access to the region
//!   ├── place      - Fit search and block splitting
//!   └── source     - Where heap memory comes from (arena, sbrk)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rmalloc::{ArenaSource, FreeListAllocator};
//!
//! let mut heap = FreeListAllocator::initialize(ArenaSource::default()).unwrap();
//!
//! let ptr = heap.allocate(64).unwrap();
//! unsafe {
//!   ptr.as_ptr().cast::<u64>().write(42);
//!   assert_eq!(ptr.as_ptr().cast::<u64>().read(), 42);
//!   heap.deallocate(ptr.as_ptr());
//! }
//!
//! heap.check_heap(false);
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the allocator is neither `Send` nor `Sync`
//! - **Never shrinks**: memory is not returned to the memory source
//! - **4 GiB per heap**: a consequence of the compressed links

pub mod align;
mod allocator;
mod block;
mod check;
mod coalesce;
mod compress;
mod config;
mod error;
#[cfg(test)]
mod fixture;
mod freelist;
mod heap;
mod place;
mod source;

pub use allocator::FreeListAllocator;
pub use block::{BlockInfo, BlockPtr, DEFAULT_CHUNK_SIZE, DSIZE, MIN_BLOCK_SIZE, Tag, WSIZE, pack};
pub use config::{FitPolicy, HeapConfig};
pub use error::{CheckError, HeapError, Result};
pub use heap::Blocks;
#[cfg(unix)]
pub use source::SbrkSource;
pub use source::{ArenaSource, MemorySource};
