//! Signed download references for private objects.
//!
//! Public objects resolve to a plain download URL. Private objects get
//! a URL carrying a short-lived authorization token; tokens are
//! remembered per file and a background sweep renews any that come
//! within a configured margin of expiry, so handed-out links keep
//! working without client involvement.

mod error;
mod issuer;
mod types;

pub use error::ReferenceError;
pub use issuer::{BACKEND_MAX_TTL_SECS, ReferenceIssuer, SignedReferenceRepository, clamp_ttl};
pub use types::{Locator, PreparedReference, RenewalContext, RenewalStats, SignedReference};
