//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod locks;
pub mod pg_store;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use locks::{OrgLockGuard, OrgLocks, SweepGuard, SweepPermit};
pub use pg_store::{connect_options, PgOrganizationStore};
pub use scheduled_tasks::{run_scheduled_sweep, start_scheduler};
pub use test_dependencies::TestDependencies;
pub use traits::*;
