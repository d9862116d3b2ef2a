//! Row sequence: `{ base_timestamp, data }` (spec §3, C2).

/// One row of bit-packed `(qualifier, value)` pairs, anchored at
/// `base_timestamp`. Qualifiers inside a row are strictly ordered by
/// offset unless a dedup pass has run (spec §3 invariant).
#[derive(Debug, Clone, PartialEq)]
pub struct RowSeq {
    pub base_timestamp: i64,
    pub data: Vec<u8>,
}

impl RowSeq {
    pub fn new(base_timestamp: i64, data: Vec<u8>) -> Self {
        RowSeq {
            base_timestamp,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len() + std::mem::size_of::<i64>()
    }
}
