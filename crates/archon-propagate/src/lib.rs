//! # archon-propagate
//!
//! Applying a finalized policy beyond the edited object: content-model
//! plugins contribute [`QueryChoice`] propagation scopes, the user picks one,
//! and [`BatchPropagator`] walks the selected object set on a background
//! task, writing the serialized policy one object at a time.
//!
//! Per-target failures are collected, never thrown: a batch over an
//! unbounded hierarchy must finish and report, not abort halfway with some
//! targets already rewritten. Progress is observable while the batch runs.

pub mod batch;
pub mod error;
pub mod selector;

pub use batch::{BatchHandle, BatchJob, BatchProgress, BatchPropagator, BatchReport, BatchState};
pub use error::{BatchError, PropagationError};
pub use selector::{
    ChildSelector, QueryChoice, ALL_CHILDREN_KEY, FLAT_COLLECTION_KEY, NEW_CHILDREN_KEY,
};
