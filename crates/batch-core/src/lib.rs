//! # Batch Core
//!
//! 核心資料模型、單位換算與錯誤類型

pub mod config;
pub mod events;
pub mod recipe;
pub mod stock;
pub mod units;

// Re-export 主要類型
pub use config::ProductionConfig;
pub use events::{ConsumptionEvent, ProductionEvent, UsageLogEntry};
pub use recipe::{IngredientRequirement, Recipe};
pub use stock::{StockLevel, StockLookup, StockSnapshot};
pub use units::{convert, format_quantity, to_base_unit, Conversion, Dimension, FormattedQuantity, Unit};

use rust_decimal::Decimal;
use uuid::Uuid;

/// 生產確認流程的步驟
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CommitStep {
    /// 讀取最新庫存
    ReadStock,
    /// 建立生產事件
    CreateProductionEvent,
    /// 扣減原料庫存
    DeductStock,
    /// 寫入原料使用紀錄
    AppendUsageLog,
}

impl std::fmt::Display for CommitStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommitStep::ReadStock => "讀取庫存",
            CommitStep::CreateProductionEvent => "建立生產事件",
            CommitStep::DeductStock => "扣減庫存",
            CommitStep::AppendUsageLog => "寫入使用紀錄",
        };
        f.write_str(name)
    }
}

/// 批次生產錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("找不到配方: {0}")]
    RecipeNotFound(Uuid),

    #[error("配方格式錯誤: {0}")]
    MalformedRecipe(String),

    #[error("配方已停用: {0}")]
    RecipeInactive(Uuid),

    #[error("無效的數量: {0}")]
    InvalidQuantity(Decimal),

    #[error("庫存不足：原料 {raw_material_id} 需要 {requested}, 可用 {available}")]
    InsufficientStock {
        raw_material_id: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("找不到原料庫存: {0}")]
    StockNotFound(String),

    #[error("生產確認失敗（步驟：{step}）: {reason}")]
    CommitFailed { step: CommitStep, reason: String },

    #[error("外部服務無法使用: {0}")]
    StoreUnavailable(String),

    #[error("配置錯誤: {0}")]
    Config(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

impl BatchError {
    /// 生產確認失敗時對應的步驟
    pub fn failed_step(&self) -> Option<CommitStep> {
        match self {
            BatchError::CommitFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
