//! 外部協作者介面
//!
//! 庫存、生產事件、消耗事件與使用紀錄都由外部系統持有，
//! 核心只透過這些介面讀寫。所有方法都以門市ID明確限定範圍。

use async_trait::async_trait;
use batch_core::{ConsumptionEvent, ProductionEvent, Result, StockLevel, UsageLogEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// 原料庫存存取
#[async_trait]
pub trait StockStore: Send + Sync {
    /// 讀取最新已提交的庫存
    async fn get_stock(&self, store_id: &str, raw_material_id: &str) -> Result<Option<StockLevel>>;

    /// 列出門市所有原料庫存
    async fn list_stock(&self, store_id: &str) -> Result<Vec<StockLevel>>;

    /// 扣減庫存，超過現有量時拒絕
    async fn deduct(&self, store_id: &str, raw_material_id: &str, amount: Decimal) -> Result<Decimal>;
}

/// 生產事件紀錄（只追加）
#[async_trait]
pub trait ProductionLog: Send + Sync {
    /// 追加生產事件，返回事件ID
    async fn append_production(&self, event: &ProductionEvent) -> Result<Uuid>;

    /// 列出門市所有生產事件
    async fn list_production(&self, store_id: &str) -> Result<Vec<ProductionEvent>>;
}

/// 消耗事件紀錄（只追加）
#[async_trait]
pub trait ConsumptionLog: Send + Sync {
    /// 追加消耗事件，返回事件ID
    async fn append_consumption(&self, event: &ConsumptionEvent) -> Result<Uuid>;

    /// 列出門市所有消耗事件
    async fn list_consumption(&self, store_id: &str) -> Result<Vec<ConsumptionEvent>>;
}

/// 原料使用紀錄（只追加）
#[async_trait]
pub trait UsageLog: Send + Sync {
    /// 追加使用紀錄
    async fn append_usage(&self, entry: &UsageLogEntry) -> Result<()>;

    /// 查詢某次生產的使用紀錄
    async fn usage_for(&self, production_event_id: Uuid) -> Result<Vec<UsageLogEntry>>;
}

/// 單筆原料扣減
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub raw_material_id: String,
    pub amount: Decimal,
    pub unit: String,
}

/// 生產確認請求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    /// 配方ID
    pub recipe_id: Uuid,
    /// 門市ID
    pub store_id: String,
    /// 生產數量
    pub quantity: Decimal,
    /// 數量單位
    pub unit: String,
    /// 生產人員
    pub producer: String,
    /// 原料扣減（單位為配方原料單位）
    pub deductions: Vec<Deduction>,
}

/// 生產確認結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionReceipt {
    /// 已建立的生產事件
    pub event: ProductionEvent,
    /// 已寫入的使用紀錄
    pub usage: Vec<UsageLogEntry>,
    /// 扣減後的庫存
    pub updated_stock: Vec<StockLevel>,
}

impl ProductionReceipt {
    /// 扣減後低於補貨點的原料
    pub fn below_reorder_level(&self) -> impl Iterator<Item = &StockLevel> {
        self.updated_stock
            .iter()
            .filter(|level| level.is_below_reorder_level())
    }
}

/// 原子化生產確認
///
/// 建立生產事件、扣減所有原料、寫入使用紀錄必須在同一個程序內完成：
/// 任一步驟失敗時不得留下任何部分變更。
#[async_trait]
pub trait ProductionGateway: Send + Sync {
    async fn commit_production(&self, order: ProductionOrder) -> Result<ProductionReceipt>;
}

/// 帳本變更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    /// 生產已確認
    ProductionCommitted { store_id: String, event_id: Uuid },
    /// 消耗已記錄
    ConsumptionRecorded { store_id: String, event_id: Uuid },
    /// 原料庫存變動
    StockAdjusted {
        store_id: String,
        raw_material_id: String,
    },
}

impl LedgerChange {
    pub fn store_id(&self) -> &str {
        match self {
            LedgerChange::ProductionCommitted { store_id, .. }
            | LedgerChange::ConsumptionRecorded { store_id, .. }
            | LedgerChange::StockAdjusted { store_id, .. } => store_id,
        }
    }

    /// 是否影響成品可用餘額
    pub fn affects_balance(&self) -> bool {
        !matches!(self, LedgerChange::StockAdjusted { .. })
    }
}

/// 變更訂閱
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<LedgerChange>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerChange::ProductionCommitted { store_id: "S1".to_string(), event_id: Uuid::nil() }, true)]
    #[case(LedgerChange::ConsumptionRecorded { store_id: "S1".to_string(), event_id: Uuid::nil() }, true)]
    #[case(LedgerChange::StockAdjusted { store_id: "S1".to_string(), raw_material_id: "MILK".to_string() }, false)]
    fn test_change_affects_balance(#[case] change: LedgerChange, #[case] expected: bool) {
        assert_eq!(change.store_id(), "S1");
        assert_eq!(change.affects_balance(), expected);
    }

    #[test]
    fn test_receipt_lists_items_below_reorder_level() {
        let event = ProductionEvent::new(
            Uuid::new_v4(),
            "S1".to_string(),
            Decimal::from(5),
            "L".to_string(),
            "alice".to_string(),
        );
        let receipt = ProductionReceipt {
            event,
            usage: Vec::new(),
            updated_stock: vec![
                StockLevel::new("MILK".to_string(), Decimal::ONE, "L".to_string())
                    .with_reorder_level(Decimal::from(2)),
                StockLevel::new("SUGAR".to_string(), Decimal::from(5), "kg".to_string())
                    .with_reorder_level(Decimal::from(2)),
                StockLevel::new("TEA-LEAF".to_string(), Decimal::ZERO, "g".to_string()),
            ],
        };

        let below: Vec<_> = receipt
            .below_reorder_level()
            .map(|l| l.raw_material_id.as_str())
            .collect();
        assert_eq!(below, vec!["MILK"]);
    }
}
