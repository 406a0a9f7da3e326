//! In-memory index layer for a log-structured key-value store whose files
//! live on byte-addressable persistent memory.
//!
//! Two sibling index structures make up the layer, plus a background
//! writer that keeps index maintenance off the critical write path:
//!
//! ```text
//!  producers ──► IndexWriter ──► queue ──► worker ──► Index ──► delegate
//!                (submit /                 (drain)    (flush     B-tree
//!                 add_queue)                           + publish)
//!
//!  readers ────────────────────────────────────────► Index::get
//!
//!  SkipList: independent ordered byte-string map of the same layer,
//!  with a crash-consistent level-0 spine.
//! ```
//!
//! # Components
//!
//! - [`SkipList`]: a persistent skip list keyed by opaque byte strings,
//!   storing key/value bytes in place. Bidirectional links at every
//!   level; only level-0 forward links are flushed, because recovery
//!   rebuilds the upper levels from that spine.
//! - [`Index`]: a thin ordering/persistence shell over a delegate
//!   [`NumericTree`] keyed by 32-bit integers. Metadata records are
//!   flushed before publication so the tree never exposes an unflushed
//!   payload.
//! - [`IndexWriter`]: a lazily started single-consumer worker that drains
//!   a FIFO of [`KeyAndMeta`] work items into the index, batching whole
//!   queues per wakeup.
//! - [`CacheFlush`]: the cache-line write-back capability everything
//!   above reduces to; injectable so tests can observe exactly which
//!   extents a mutation published.
//!
//! The skip list is single-writer; the writer queue is the only
//! cross-thread state in the layer.

pub mod comparator;
pub mod error;
pub mod flush;
pub mod index;
pub mod meta;
pub mod skiplist;
pub mod writer;

pub use comparator::{BytewiseComparator, Comparator};
pub use error::{Error, Result};
pub use flush::{CacheFlush, Clflush, RecordingFlush};
pub use index::{parse_key_prefix, Index, NumericTree};
pub use meta::{IndexMeta, KeyAndMeta};
pub use skiplist::{NodeRef, SkipList, MAX_LEVEL};
pub use writer::IndexWriter;
