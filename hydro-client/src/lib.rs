pub mod client;
pub mod domain;
pub mod error;
pub mod parse;
pub mod range;
pub mod session;

pub use client::{PortalClient, PortalConfig};
pub use domain::{UsageRecord, PORTAL_OFFSET};
pub use range::DateRange;
