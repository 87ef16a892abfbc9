//! # Batch
//!
//! 門市飲品批次生產：單位換算、配方需求計算、原子化生產確認與成品帳本對帳。

pub use batch_calc::{max_producible, validate_recipe, BatchCalculator, RequirementReport};
pub use batch_core::{
    convert, format_quantity, BatchError, ProductionConfig, Recipe, Result, StockLevel,
};
pub use batch_ledger::{
    BalanceWatcher, LedgerBalance, LedgerReconciler, MemoryStore, ProductionRun,
    ProductionService, RunStage,
};
