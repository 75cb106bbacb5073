//! Built-in interceptors.
//!
//! - [`xroad_header`] - fills and cleans the X-Road SOAP header
//! - [`history`] - records the transaction id and date of responses

pub mod history;
pub mod xroad_header;

pub use history::{TransactionHistory, TRANSACTION_ID_HEADER};
pub use xroad_header::{XRoadHeaderInterceptor, ECHOED_FIELDS};
