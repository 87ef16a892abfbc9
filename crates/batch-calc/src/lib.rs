//! # Batch Calculation Engine
//!
//! 配方批次需求計算、可生產量與配方驗證

pub mod calculator;
pub mod capacity;
pub mod requirement;
pub mod validation;

// Re-export 主要類型
pub use calculator::BatchCalculator;
pub use capacity::max_producible;
pub use requirement::{RequirementReport, RequirementRow};
pub use validation::{validate_quantity, validate_recipe, ValidationIssue, ValidationOutcome};

use serde::{Deserialize, Serialize};

/// 計算警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcWarning {
    pub raw_material_id: Option<String>,
    pub message: String,
    pub severity: WarningSeverity,
}

impl CalcWarning {
    pub fn new(raw_material_id: Option<String>, message: String, severity: WarningSeverity) -> Self {
        Self {
            raw_material_id,
            message,
            severity,
        }
    }

    pub fn info(raw_material_id: String, message: String) -> Self {
        Self::new(Some(raw_material_id), message, WarningSeverity::Info)
    }

    pub fn warning(raw_material_id: String, message: String) -> Self {
        Self::new(Some(raw_material_id), message, WarningSeverity::Warning)
    }

    /// 與單一原料無關的配方層級警告
    pub fn recipe(message: String, severity: WarningSeverity) -> Self {
        Self::new(None, message, severity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
