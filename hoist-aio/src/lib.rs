// hoist-aio/src/lib.rs
//! Filesystem, archive and process primitives for hoist

pub mod extract;
pub mod fs;
pub mod process;

pub use extract::{extract_zip, extract_zip_async, extract_zip_file};
pub use fs::*;
pub use process::spawn_detached;
