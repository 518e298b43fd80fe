//! Wage-table fetching: request tokens and the sources tables are read from.

pub mod request;
pub mod source;

pub use request::*;
pub use source::*;
