//! Data types shared by the normalization and reconciliation pipeline.
//!
//! Everything here is created per call and owned by that call.

mod content;
mod message;
mod request;
mod response;

pub use content::ContentValue;
pub use message::{Message, Role};
pub use request::{NormalizedRequest, RequestOptions, WireMessage};
pub use response::{
    RawBackendOutput, ReconcileOutcome, ReconciledResponse, ResponseMode, Usage,
};
