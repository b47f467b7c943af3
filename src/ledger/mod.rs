pub mod guard;
pub mod storage;
pub mod types;

pub use guard::RefreshGuard;
pub use storage::{get_ledger_path, load_ledger, save_ledger};
pub use types::{Ledger, LockedBlock, LEDGER_VERSION};
