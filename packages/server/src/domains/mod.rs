// Business domains
pub mod organization;
