pub mod digest;
pub mod occupation;
pub mod region_collection;
pub mod wage_table;

pub use digest::*;
pub use occupation::*;
pub use region_collection::*;
pub use wage_table::*;
