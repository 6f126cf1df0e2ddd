pub mod cli;
pub mod config;
pub mod http;
pub mod log;
pub mod models;

pub use crate::http::{BackendError, BackendHttpClient};
pub use crate::models::{Compatibility, CompatibilityReport, ServerVersions, SoftwareVersion};

/// Major version of the backend API this client speaks; also the `/api/v{N}` prefix.
pub const BACKEND_MAJOR_VERSION: u32 = 3;

/// Version of this client, compared against the minimum the backend reports.
pub const CLIENT_VERSION: SoftwareVersion = SoftwareVersion::with_build(1, 0, 0);
