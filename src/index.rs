//! Numeric index shell over the delegate NVM-resident B-tree.
//!
//! The index layer does not own the tree; it is an ordering and
//! persistence shell. Before a record is published through the tree, the
//! metadata payload and the key are written back to the persistent medium,
//! so a recovered tree never points at an unflushed record. Lookups parse
//! the caller's byte-slice key through an explicit numeric key schema and
//! delegate to the tree's search.

use std::mem;
use std::sync::Arc;

use crate::flush::CacheFlush;
use crate::meta::IndexMeta;

/// Opaque delegate tree consumed by the index shell.
///
/// Implementations must be internally thread-safe for a single background
/// writer plus arbitrary concurrent readers, and are responsible for their
/// own persistence beyond the pre-flushes the shell performs.
pub trait NumericTree: Send + Sync {
    fn search(&self, key: u32) -> Option<Arc<IndexMeta>>;

    fn insert(&self, key: u32, meta: Arc<IndexMeta>);

    /// Versioned update; `prev_file_number` is the compare-and-set
    /// predicate the tree checks against the installed record.
    fn update(&self, key: u32, prev_file_number: u32, meta: Arc<IndexMeta>);
}

/// Ordering and persistence shell over a [`NumericTree`].
pub struct Index<T: NumericTree> {
    tree: T,
    flush: Arc<dyn CacheFlush>,
}

impl<T: NumericTree> Index<T> {
    pub fn new(tree: T, flush: Arc<dyn CacheFlush>) -> Self {
        Self { tree, flush }
    }

    /// Looks up the metadata installed for a numeric key given in its
    /// byte-slice form. A key without a decimal prefix is simply absent.
    pub fn get(&self, key: &[u8]) -> Option<Arc<IndexMeta>> {
        let key = parse_key_prefix(key)?;
        self.tree.search(key)
    }

    /// Publishes `meta` under `key`.
    ///
    /// The metadata record is flushed first and the key second, before the
    /// tree insert: the tree may publish the record by writing the key
    /// field, so the payload must already be durable at that point.
    pub fn insert(&self, key: u32, meta: &Arc<IndexMeta>) {
        let record: &IndexMeta = meta.as_ref();
        self.flush.flush(
            record as *const IndexMeta as *const u8,
            mem::size_of::<IndexMeta>(),
        );
        self.flush
            .flush(&key as *const u32 as *const u8, mem::size_of::<u32>());
        self.tree.insert(key, Arc::clone(meta));
    }

    /// Replaces the record under `key` if the installed file number still
    /// matches `prev_file_number`. Version semantics belong to the tree.
    pub fn update(&self, key: u32, prev_file_number: u32, meta: &Arc<IndexMeta>) {
        self.tree.update(key, prev_file_number, Arc::clone(meta));
    }

    /// Range scans are not supported by the numeric index.
    pub fn range(&self, _lo: &[u8], _hi: &[u8]) {}

    pub fn tree(&self) -> &T {
        &self.tree
    }
}

/// Numeric key schema: reads the ASCII decimal prefix of `key`.
///
/// Parsing stops at the first non-digit byte; a key with no leading digit
/// has no numeric form. Overflow wraps, mirroring the fast parsers used on
/// this path.
pub fn parse_key_prefix(key: &[u8]) -> Option<u32> {
    let mut value: u32 = 0;
    let mut digits = 0;
    for &b in key {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add(u32::from(b - b'0'));
        digits += 1;
    }
    (digits > 0).then_some(value)
}
