pub mod business_id;
pub mod organization;
pub mod ovo;

pub use business_id::*;
pub use organization::*;
pub use ovo::*;
