pub mod local;
pub mod r#trait;

pub use local::LocalVectorIndex;
pub use r#trait::{IndexHit, IndexRecord, RecordMetadata, VectorIndex};

const RECORD_ID_PREFIX: &str = "meme_";

/// Index identifier for the catalogue entry at `ordinal`
pub fn record_id(ordinal: usize) -> String {
    format!("{}{}", RECORD_ID_PREFIX, ordinal)
}

/// Recover the catalogue ordinal from an index identifier
pub fn parse_record_id(id: &str) -> Option<usize> {
    id.strip_prefix(RECORD_ID_PREFIX)?.parse().ok()
}
