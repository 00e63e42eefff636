//! Webhook delivery reconciliation: finds notifications whose deliveries never
//! succeeded since the last checkpoint and asks GitHub to redeliver them.

pub mod checkpoint;
pub mod decision;
pub mod executor;
pub mod fetcher;
pub mod grouper;
pub mod reconciler;
pub mod source;
pub mod window;

#[cfg(test)]
mod testing;

pub use checkpoint::{
    CheckpointBackend, CheckpointStore, RedisCheckpointStore, StoredCheckpoint,
    VariableCheckpointStore,
};
pub use reconciler::{Reconciler, ReconcilerOptions, RunReport};
pub use source::HookApi;
