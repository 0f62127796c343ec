//! External integrations
//!
//! - [`search`] - scroll-cursor search backend client
//! - [`target`] - replay targets reached over HTTP

pub mod search;
pub mod target;
