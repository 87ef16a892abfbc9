//! 批次需求計算結果

use batch_core::{format_quantity, FormattedQuantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CalcWarning;

/// 單一原料需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRow {
    /// 原料ID
    pub raw_material_id: String,
    /// 需求量（已按批次比例放大）
    pub needed: Decimal,
    /// 可用庫存（已換算為需求單位）
    pub available: Decimal,
    /// 單位（配方原料單位）
    pub unit: String,
    /// 庫存是否足夠
    pub sufficient: bool,
    /// 缺口（needed - available，足夠時為 0）
    pub shortfall: Decimal,
}

impl RequirementRow {
    /// 創建新的需求行
    pub fn new(raw_material_id: String, needed: Decimal, available: Decimal, unit: String) -> Self {
        let sufficient = available >= needed;
        let shortfall = if sufficient {
            Decimal::ZERO
        } else {
            needed - available
        };
        Self {
            raw_material_id,
            needed,
            available,
            unit,
            sufficient,
            shortfall,
        }
    }

    /// 顯示用需求量
    pub fn formatted_needed(&self) -> FormattedQuantity {
        format_quantity(self.needed, &self.unit)
    }

    /// 顯示用缺口
    pub fn formatted_shortfall(&self) -> FormattedQuantity {
        format_quantity(self.shortfall, &self.unit)
    }
}

/// 批次需求報告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementReport {
    /// 配方ID
    pub recipe_id: Uuid,

    /// 目標產量
    pub requested_quantity: Decimal,

    /// 批次比例（無效輸入時為 None）
    pub batch_ratio: Option<Decimal>,

    /// 原料需求（與配方原料順序一致）
    pub rows: Vec<RequirementRow>,

    /// 是否可生產
    pub feasible: bool,

    /// 警告信息
    pub warnings: Vec<CalcWarning>,
}

impl RequirementReport {
    /// 創建不可生產的空報告
    pub fn infeasible(recipe_id: Uuid, requested_quantity: Decimal) -> Self {
        Self {
            recipe_id,
            requested_quantity,
            batch_ratio: None,
            rows: Vec::new(),
            feasible: false,
            warnings: Vec::new(),
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: CalcWarning) {
        self.warnings.push(warning);
    }

    /// 庫存不足的原料
    pub fn shortfalls(&self) -> impl Iterator<Item = &RequirementRow> {
        self.rows.iter().filter(|row| !row.sufficient)
    }

    /// 查找原料需求
    pub fn row(&self, raw_material_id: &str) -> Option<&RequirementRow> {
        self.rows
            .iter()
            .find(|row| row.raw_material_id == raw_material_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_sufficient() {
        let row = RequirementRow::new(
            "TEA-LEAF".to_string(),
            Decimal::from(200),
            Decimal::from(800),
            "g".to_string(),
        );

        assert!(row.sufficient);
        assert_eq!(row.shortfall, Decimal::ZERO);
    }

    #[test]
    fn test_row_exactly_enough_is_sufficient() {
        let row = RequirementRow::new(
            "MILK".to_string(),
            Decimal::from(4),
            Decimal::from(4),
            "L".to_string(),
        );

        assert!(row.sufficient);
    }

    #[test]
    fn test_row_shortfall_formatting() {
        let row = RequirementRow::new(
            "MILK".to_string(),
            Decimal::from(4),
            Decimal::new(35, 1),
            "L".to_string(),
        );

        assert!(!row.sufficient);
        assert_eq!(row.shortfall, Decimal::new(5, 1));

        let formatted = row.formatted_shortfall();
        assert_eq!(formatted.unit, "ml");
        assert_eq!(formatted.display_text, "500 ml");
        assert_eq!(row.formatted_needed().display_text, "4.00 L (4000 ml)");
    }
}
