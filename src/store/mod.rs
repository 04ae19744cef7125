//! Evidence store
//!
//! - [`BlockPool`]: arena of blocks, free list and last-block cache
//! - [`EvidenceStore`]: ingestion, watermark release and point queries
//! - [`CandidateBatch`]: what a release hands out

mod batch;
mod cache;
mod config;
mod evidence;
mod pool;

pub use batch::CandidateBatch;
pub use cache::{LastBlockCache, SlotId};
pub use config::{StoreConfig, DEFAULT_BLOCK_SIZE, DEFAULT_MIN_BASE_QUALITY};
pub use evidence::EvidenceStore;
pub use pool::BlockPool;
