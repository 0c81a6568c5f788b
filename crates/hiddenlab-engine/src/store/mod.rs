pub mod atomic;
pub mod fs_store;

pub use fs_store::FsDecisionStore;
