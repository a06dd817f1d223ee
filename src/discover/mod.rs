//! Passive subdomain discovery via Certificate Transparency logs.

pub mod crtsh;
pub mod extract;
pub mod subdomain;

pub use crtsh::{CrtShFetcher, FetchOutcome, HttpReply, Sleeper, Transport};
pub use extract::{CtLogEntry, SubdomainSet};
pub use subdomain::{QueryVariant, SubdomainFinder};
