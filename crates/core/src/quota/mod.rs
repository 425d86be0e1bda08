//! Storage and request-rate accounting.
//!
//! A successful storage reservation is the charge itself. Callers that
//! later fail a file hand its share back with a negative commit, so
//! usage converges on the sum of live objects.

mod error;
mod ledger;
mod types;

pub use error::QuotaError;
pub use ledger::{QuotaLedger, QuotaRepository};
pub use types::{ChargeOutcome, CountOutcome, REQUEST_WINDOW_SECS, RequestOrigin};
