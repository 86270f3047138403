//! Database layer: camera registry and daily summaries

pub mod cameras;
pub mod init;
pub mod summary;

pub use cameras::*;
pub use init::*;
pub use summary::*;
