//! The upload orchestration pipeline.
//!
//! One request carries one or more files. The request as a whole passes
//! the plan's single-file ceiling, the rolling request window, and a
//! single batch storage reservation; after that each file runs its own
//! place, reference, persist sequence and fails alone, handing its
//! reservation share back without touching its siblings.

mod error;
mod service;
mod types;

pub use error::UploadError;
pub use service::{DEFAULT_CONCURRENCY, UploadService};
pub use types::{
    IncomingFile, MAX_EXPIRE_DELETE_SECS, UploadOptions, UploadOutcome, UploadReport, UploadedFile,
};
