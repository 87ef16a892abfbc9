//! 記憶體協作者實現
//!
//! 以單一 RwLock 保護所有狀態，生產確認在同一把寫鎖內完成，
//! 主要用於測試與展示。

use async_trait::async_trait;
use batch_core::{
    to_base_unit, BatchError, CommitStep, ConsumptionEvent, ProductionEvent, Result, StockLevel,
    UsageLogEntry,
};
use rust_decimal::Decimal;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::store::{
    ChangeFeed, ConsumptionLog, LedgerChange, ProductionGateway, ProductionLog, ProductionOrder,
    ProductionReceipt, StockStore, UsageLog,
};

/// (門市ID, 原料ID)
type StockKey = (String, String);

#[derive(Debug, Default)]
struct StoreState {
    stock: HashMap<StockKey, StockLevel>,
    production: Vec<ProductionEvent>,
    consumption: Vec<ConsumptionEvent>,
    usage: Vec<UsageLogEntry>,
    // 下一次生產確認在此步驟模擬失敗
    injected_fault: Option<CommitStep>,
}

/// 生產確認前的狀態，用於失敗時還原
struct Checkpoint {
    production_len: usize,
    usage_len: usize,
    stock: Vec<(StockKey, Option<StockLevel>)>,
}

impl StoreState {
    fn checkpoint<'a>(
        &self,
        store_id: &str,
        raw_material_ids: impl Iterator<Item = &'a String>,
    ) -> Checkpoint {
        Checkpoint {
            production_len: self.production.len(),
            usage_len: self.usage.len(),
            stock: raw_material_ids
                .map(|id| {
                    let key = (store_id.to_string(), id.clone());
                    let previous = self.stock.get(&key).cloned();
                    (key, previous)
                })
                .collect(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.production.truncate(checkpoint.production_len);
        self.usage.truncate(checkpoint.usage_len);
        for (key, previous) in checkpoint.stock {
            match previous {
                Some(level) => {
                    self.stock.insert(key, level);
                }
                None => {
                    self.stock.remove(&key);
                }
            }
        }
    }

    /// 寫入生產事件、扣減後庫存與使用紀錄，返回扣減後庫存
    fn apply_commit(
        &mut self,
        store_id: &str,
        event: &ProductionEvent,
        staged: HashMap<String, StockLevel>,
        usage: &[UsageLogEntry],
    ) -> Result<Vec<StockLevel>> {
        self.check_fault(CommitStep::CreateProductionEvent)?;
        self.production.push(event.clone());

        self.check_fault(CommitStep::DeductStock)?;
        let mut updated_stock = Vec::with_capacity(staged.len());
        for (raw_material_id, level) in staged {
            updated_stock.push(level.clone());
            self.stock
                .insert((store_id.to_string(), raw_material_id), level);
        }
        updated_stock.sort_by(|a, b| a.raw_material_id.cmp(&b.raw_material_id));

        self.check_fault(CommitStep::AppendUsageLog)?;
        self.usage.extend(usage.iter().cloned());

        Ok(updated_stock)
    }

    fn check_fault(&mut self, step: CommitStep) -> Result<()> {
        if self.injected_fault == Some(step) {
            self.injected_fault = None;
            return Err(BatchError::CommitFailed {
                step,
                reason: "模擬的外部服務錯誤".to_string(),
            });
        }
        Ok(())
    }
}

/// 記憶體存儲
#[derive(Debug)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
    changes: broadcast::Sender<LedgerChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(64)
    }
}

impl MemoryStore {
    /// 創建新的記憶體存儲
    pub fn new(notify_capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(notify_capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            changes,
        }
    }

    /// 設置原料庫存（進貨 / 盤點）
    pub async fn set_stock(&self, store_id: &str, level: StockLevel) {
        let raw_material_id = level.raw_material_id.clone();
        {
            let mut state = self.state.write().await;
            state
                .stock
                .insert((store_id.to_string(), raw_material_id.clone()), level);
        }
        self.notify(LedgerChange::StockAdjusted {
            store_id: store_id.to_string(),
            raw_material_id,
        });
    }

    /// 讓下一次生產確認在指定步驟失敗
    pub async fn fail_next_commit_at(&self, step: CommitStep) {
        self.state.write().await.injected_fault = Some(step);
    }

    /// 所有使用紀錄筆數
    pub async fn usage_count(&self) -> usize {
        self.state.read().await.usage.len()
    }

    fn notify(&self, change: LedgerChange) {
        // 沒有訂閱者時發送失敗是正常情況
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn get_stock(&self, store_id: &str, raw_material_id: &str) -> Result<Option<StockLevel>> {
        let state = self.state.read().await;
        Ok(state
            .stock
            .get(&(store_id.to_string(), raw_material_id.to_string()))
            .cloned())
    }

    async fn list_stock(&self, store_id: &str) -> Result<Vec<StockLevel>> {
        let state = self.state.read().await;
        let mut levels: Vec<StockLevel> = state
            .stock
            .iter()
            .filter(|((store, _), _)| store == store_id)
            .map(|(_, level)| level.clone())
            .collect();
        levels.sort_by(|a, b| a.raw_material_id.cmp(&b.raw_material_id));
        Ok(levels)
    }

    async fn deduct(&self, store_id: &str, raw_material_id: &str, amount: Decimal) -> Result<Decimal> {
        let remaining = {
            let mut state = self.state.write().await;
            let level = state
                .stock
                .get_mut(&(store_id.to_string(), raw_material_id.to_string()))
                .ok_or_else(|| BatchError::StockNotFound(raw_material_id.to_string()))?;
            level.deduct(amount)?
        };
        self.notify(LedgerChange::StockAdjusted {
            store_id: store_id.to_string(),
            raw_material_id: raw_material_id.to_string(),
        });
        Ok(remaining)
    }
}

#[async_trait]
impl ProductionLog for MemoryStore {
    async fn append_production(&self, event: &ProductionEvent) -> Result<Uuid> {
        self.state.write().await.production.push(event.clone());
        self.notify(LedgerChange::ProductionCommitted {
            store_id: event.store_id.clone(),
            event_id: event.id,
        });
        Ok(event.id)
    }

    async fn list_production(&self, store_id: &str) -> Result<Vec<ProductionEvent>> {
        let state = self.state.read().await;
        Ok(state
            .production
            .iter()
            .filter(|e| e.store_id == store_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConsumptionLog for MemoryStore {
    async fn append_consumption(&self, event: &ConsumptionEvent) -> Result<Uuid> {
        self.state.write().await.consumption.push(event.clone());
        self.notify(LedgerChange::ConsumptionRecorded {
            store_id: event.store_id.clone(),
            event_id: event.id,
        });
        Ok(event.id)
    }

    async fn list_consumption(&self, store_id: &str) -> Result<Vec<ConsumptionEvent>> {
        let state = self.state.read().await;
        Ok(state
            .consumption
            .iter()
            .filter(|e| e.store_id == store_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UsageLog for MemoryStore {
    async fn append_usage(&self, entry: &UsageLogEntry) -> Result<()> {
        self.state.write().await.usage.push(entry.clone());
        Ok(())
    }

    async fn usage_for(&self, production_event_id: Uuid) -> Result<Vec<UsageLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .usage
            .iter()
            .filter(|e| e.production_event_id == production_event_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductionGateway for MemoryStore {
    async fn commit_production(&self, order: ProductionOrder) -> Result<ProductionReceipt> {
        let receipt = {
            let mut state = self.state.write().await;

            // 1. 讀取最新庫存並在暫存副本上檢查所有扣減
            state.check_fault(CommitStep::ReadStock)?;
            let mut staged: HashMap<String, StockLevel> = HashMap::new();
            for deduction in &order.deductions {
                let level = match staged.entry(deduction.raw_material_id.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        let current = state
                            .stock
                            .get(&(order.store_id.clone(), deduction.raw_material_id.clone()))
                            .cloned()
                            .ok_or_else(|| BatchError::CommitFailed {
                                step: CommitStep::ReadStock,
                                reason: format!("找不到原料庫存: {}", deduction.raw_material_id),
                            })?;
                        entry.insert(current)
                    }
                };
                let amount = to_base_unit(deduction.amount, &deduction.unit, &level.unit);
                level.deduct(amount)?;
            }

            let event = ProductionEvent::new(
                order.recipe_id,
                order.store_id.clone(),
                order.quantity,
                order.unit.clone(),
                order.producer.clone(),
            );
            let usage: Vec<UsageLogEntry> = order
                .deductions
                .iter()
                .map(|d| {
                    UsageLogEntry::new(d.raw_material_id.clone(), d.amount, d.unit.clone(), event.id)
                })
                .collect();

            // 2-4. 依序寫入，任一步驟失敗即在同一把鎖內還原
            let checkpoint = state.checkpoint(&order.store_id, staged.keys());
            let updated_stock = match state.apply_commit(&order.store_id, &event, staged, &usage) {
                Ok(updated_stock) => updated_stock,
                Err(e) => {
                    state.rollback(checkpoint);
                    return Err(e);
                }
            };

            ProductionReceipt {
                event,
                usage,
                updated_stock,
            }
        };

        for level in &receipt.updated_stock {
            self.notify(LedgerChange::StockAdjusted {
                store_id: order.store_id.clone(),
                raw_material_id: level.raw_material_id.clone(),
            });
        }
        self.notify(LedgerChange::ProductionCommitted {
            store_id: order.store_id.clone(),
            event_id: receipt.event.id,
        });

        Ok(receipt)
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self) -> broadcast::Receiver<LedgerChange> {
        self.changes.subscribe()
    }
}
