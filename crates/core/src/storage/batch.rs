use super::{Record, RecordKey};

/// Maximum keys per batch read request.
pub const BATCH_GET_LIMIT: usize = 100;

/// Maximum operations per batch write request.
pub const BATCH_WRITE_LIMIT: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchWriteOp {
    Put(Record),
    Delete(RecordKey),
}

impl BatchWriteOp {
    pub fn key(&self) -> RecordKey {
        match self {
            BatchWriteOp::Put(record) => record.key(),
            BatchWriteOp::Delete(key) => key.clone(),
        }
    }
}

/// Splits write operations into request-sized chunks, in order.
///
/// Backends send the chunks one at a time, awaiting each before the next.
pub fn write_chunks(ops: &[BatchWriteOp]) -> std::slice::Chunks<'_, BatchWriteOp> {
    ops.chunks(BATCH_WRITE_LIMIT)
}

/// Splits keys into request-sized chunks for batch reads.
pub fn get_chunks(keys: &[RecordKey]) -> std::slice::Chunks<'_, RecordKey> {
    keys.chunks(BATCH_GET_LIMIT)
}
