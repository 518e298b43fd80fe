pub mod index;
pub mod level;
pub mod region;
pub mod region_key;
pub mod selection;
pub mod state_codes;
pub mod wage_table;

pub use index::*;
pub use level::*;
pub use region::*;
pub use region_key::*;
pub use selection::*;
pub use state_codes::*;
pub use wage_table::*;
