//! Selection state machine coordinating occupation, salary, region selection
//! and popup lifecycle, plus the async driver that runs its fetches.

pub mod config;
pub mod driver;
pub mod machine;
pub mod output;

pub use config::*;
pub use driver::*;
pub use machine::*;
pub use output::*;
