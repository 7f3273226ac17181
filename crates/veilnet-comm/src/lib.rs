//! Dialog transport interface
//!
//! A dialog is a reliable, ordered, bidirectional message channel between two
//! identified peers, established through a broker named by a proposal
//! contact. The concrete transport lives outside the connection core; the
//! core consumes these traits only.

mod dialog;

pub use dialog::{Dialog, DialogError, DialogFactory};
