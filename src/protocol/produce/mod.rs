//! Send messages to a broker.
//!
//! The proxy only needs the topic names a produce request writes to; the
//! record batches themselves are carried through untouched.

pub mod request;
