pub mod reconcile;
pub mod sweep;
pub mod sync_one;

pub use reconcile::{
    reconcile_organization, reconcile_record, resolve_ovo, OvoAction, ReconciliationDecision,
};
pub use sweep::{run_sweep, sweep_with_permit, SweepOutcome, SweepSummary};
pub use sync_one::{sync_one, SyncResult};
