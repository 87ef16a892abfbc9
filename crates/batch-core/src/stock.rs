//! 原料庫存模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BatchError, Result};

/// 原料庫存水位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// 原料ID
    pub raw_material_id: String,

    /// 現有庫存
    pub quantity: Decimal,

    /// 庫存單位
    pub unit: String,

    /// 補貨點
    pub reorder_level: Option<Decimal>,
}

impl StockLevel {
    /// 創建新的庫存記錄
    pub fn new(raw_material_id: String, quantity: Decimal, unit: String) -> Self {
        Self {
            raw_material_id,
            quantity,
            unit,
            reorder_level: None,
        }
    }

    /// 建構器模式：設置補貨點
    pub fn with_reorder_level(mut self, reorder_level: Decimal) -> Self {
        self.reorder_level = Some(reorder_level);
        self
    }

    /// 檢查庫存是否低於補貨點
    pub fn is_below_reorder_level(&self) -> bool {
        self.reorder_level
            .map(|level| self.quantity < level)
            .unwrap_or(false)
    }

    /// 獲取需要補充的數量
    pub fn replenishment_needed(&self) -> Decimal {
        match self.reorder_level {
            Some(level) if self.quantity < level => level - self.quantity,
            _ => Decimal::ZERO,
        }
    }

    /// 扣減庫存，超量扣減直接拒絕（不允許負庫存）
    pub fn deduct(&mut self, amount: Decimal) -> Result<Decimal> {
        if amount > self.quantity {
            return Err(BatchError::InsufficientStock {
                raw_material_id: self.raw_material_id.clone(),
                requested: amount,
                available: self.quantity,
            });
        }
        self.quantity -= amount;
        Ok(self.quantity)
    }
}

/// 庫存查詢能力
///
/// 計算器只透過此介面讀取庫存，不持有也不修改。
pub trait StockLookup {
    /// 查詢原料目前可用庫存
    fn stock_of(&self, raw_material_id: &str) -> Option<StockLevel>;
}

/// 單次計算用的庫存快照
#[derive(Debug, Clone, Default)]
pub struct StockSnapshot {
    levels: HashMap<String, StockLevel>,
}

impl StockSnapshot {
    /// 創建空快照
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一筆庫存
    pub fn insert(&mut self, level: StockLevel) {
        self.levels.insert(level.raw_material_id.clone(), level);
    }

    /// 建構器模式：加入一筆庫存
    pub fn with_level(mut self, level: StockLevel) -> Self {
        self.insert(level);
        self
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl FromIterator<StockLevel> for StockSnapshot {
    fn from_iter<I: IntoIterator<Item = StockLevel>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for level in iter {
            snapshot.insert(level);
        }
        snapshot
    }
}

impl StockLookup for StockSnapshot {
    fn stock_of(&self, raw_material_id: &str) -> Option<StockLevel> {
        self.levels.get(raw_material_id).cloned()
    }
}
