//! # Batch Ledger
//!
//! 外部協作者介面、原子化生產確認、成品帳本對帳與餘額監看

pub mod memory;
pub mod production;
pub mod reconciler;
pub mod store;
pub mod watcher;

// Re-export 主要類型
pub use memory::MemoryStore;
pub use production::{ProductionRun, ProductionService, RunStage};
pub use reconciler::{reconcile, LedgerBalance, LedgerReconciler};
pub use store::{
    ChangeFeed, ConsumptionLog, Deduction, LedgerChange, ProductionGateway, ProductionLog,
    ProductionOrder, ProductionReceipt, StockStore, UsageLog,
};
pub use watcher::{BalanceWatchHandle, BalanceWatcher};
