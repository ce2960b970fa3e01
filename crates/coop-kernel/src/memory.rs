//! Per-process address space
//!
//! A sparse byte store keyed by address. There are no page tables and no
//! protection; paging is a convention callers impose by writing at
//! `page_index * page_size`.

use std::collections::BTreeMap;

/// Page size used by paging demonstrations
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Sparse, process-private byte store.
///
/// Addresses are `u64`, so negative addresses cannot be expressed.
/// Unwritten addresses read as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSpace {
    bytes: BTreeMap<u64, u8>,
}

impl AddressSpace {
    /// Create an empty address space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one byte, overwriting any prior value.
    pub fn write(&mut self, address: u64, value: u8) {
        self.bytes.insert(address, value);
    }

    /// Read one byte; zero if never written.
    pub fn read(&self, address: u64) -> u8 {
        self.bytes.get(&address).copied().unwrap_or(0)
    }

    /// Store a run of bytes starting at `address`.
    ///
    /// Bytes that would land past `u64::MAX` are dropped.
    pub fn write_bytes(&mut self, address: u64, data: &[u8]) {
        for (offset, value) in data.iter().enumerate() {
            let Some(target) = address.checked_add(offset as u64) else {
                break;
            };
            self.write(target, *value);
        }
    }

    /// Read `len` bytes starting at `address`.
    ///
    /// Positions past `u64::MAX` read as zero.
    pub fn read_bytes(&self, address: u64, len: usize) -> Vec<u8> {
        (0..len as u64)
            .map(|offset| address.checked_add(offset).map_or(0, |a| self.read(a)))
            .collect()
    }

    /// Whether `address` has ever been written.
    pub fn is_mapped(&self, address: u64) -> bool {
        self.bytes.contains_key(&address)
    }

    /// Number of distinct addresses written.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Distinct page indices that hold at least one written byte, ascending.
    pub fn touched_pages(&self, page_size: u64) -> Vec<u64> {
        let page_size = page_size.max(1);
        let mut pages: Vec<u64> = self.bytes.keys().map(|addr| addr / page_size).collect();
        pages.dedup();
        pages
    }
}
