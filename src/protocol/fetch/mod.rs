//! Fetch messages from a broker.
//!
//! Topics listed as forgotten in an incremental fetch session are reported
//! along with the fetched ones.

pub mod request;
