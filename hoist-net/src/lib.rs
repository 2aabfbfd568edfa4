// hoist-net/src/lib.rs
pub mod http;
pub mod remote;
pub mod validation;

pub use http::build_http_client;
pub use remote::{fetch_archive_or_fail, resolve_version_or_default, DownloadedArchive};
pub use validation::validate_url;
