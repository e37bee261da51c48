pub mod sync_logic;

pub use sync_logic::*;
