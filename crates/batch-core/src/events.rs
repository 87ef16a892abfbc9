//! 生產 / 消耗事件模型
//!
//! 所有事件皆為不可變紀錄，只追加、不修改、不刪除。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 生產事件（每次確認生產恰好一筆）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionEvent {
    /// 事件ID
    pub id: Uuid,

    /// 配方ID
    pub batch_id: Uuid,

    /// 門市ID
    pub store_id: String,

    /// 生產數量
    pub quantity: Decimal,

    /// 數量單位
    pub unit: String,

    /// 生產時間
    pub produced_at: DateTime<Utc>,

    /// 生產人員
    pub producer: String,
}

impl ProductionEvent {
    /// 創建新的生產事件
    pub fn new(
        batch_id: Uuid,
        store_id: String,
        quantity: Decimal,
        unit: String,
        producer: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_id,
            store_id,
            quantity,
            unit,
            produced_at: Utc::now(),
            producer,
        }
    }

    /// 建構器模式：設置生產時間
    pub fn with_produced_at(mut self, produced_at: DateTime<Utc>) -> Self {
        self.produced_at = produced_at;
        self
    }
}

/// 消耗事件（例：銷售扣減成品）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionEvent {
    /// 事件ID
    pub id: Uuid,

    /// 門市ID
    pub store_id: String,

    /// 消耗數量
    pub quantity: Decimal,

    /// 數量單位
    pub unit: String,

    /// 消耗時間
    pub consumed_at: DateTime<Utc>,

    /// 來源單據（如銷售單號）
    pub source_ref: Option<String>,
}

impl ConsumptionEvent {
    /// 創建新的消耗事件
    pub fn new(store_id: String, quantity: Decimal, unit: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            quantity,
            unit,
            consumed_at: Utc::now(),
            source_ref: None,
        }
    }

    /// 建構器模式：設置來源單據
    pub fn with_source_ref(mut self, source_ref: String) -> Self {
        self.source_ref = Some(source_ref);
        self
    }

    /// 建構器模式：設置消耗時間
    pub fn with_consumed_at(mut self, consumed_at: DateTime<Utc>) -> Self {
        self.consumed_at = consumed_at;
        self
    }
}

/// 原料使用紀錄（稽核追溯用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// 紀錄ID
    pub id: Uuid,

    /// 原料ID
    pub raw_material_id: String,

    /// 使用數量
    pub quantity_used: Decimal,

    /// 數量單位
    pub unit: String,

    /// 對應生產事件
    pub production_event_id: Uuid,
}

impl UsageLogEntry {
    /// 創建新的使用紀錄
    pub fn new(
        raw_material_id: String,
        quantity_used: Decimal,
        unit: String,
        production_event_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_material_id,
            quantity_used,
            unit,
            production_event_id,
        }
    }
}
