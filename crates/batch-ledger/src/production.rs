//! 生產流程
//!
//! 選擇配方 → 輸入數量 → 需求計算 → 庫存足夠才能確認 → 原子化提交。

use batch_calc::{max_producible, validate_quantity, validate_recipe, BatchCalculator, RequirementReport};
use batch_core::{
    BatchError, CommitStep, ConsumptionEvent, ProductionConfig, Recipe, Result, StockSnapshot,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::store::{
    ConsumptionLog, Deduction, ProductionGateway, ProductionOrder, ProductionReceipt, StockStore,
};

/// 生產服務
pub struct ProductionService {
    stock: Arc<dyn StockStore>,
    gateway: Arc<dyn ProductionGateway>,
    consumption: Arc<dyn ConsumptionLog>,
    config: ProductionConfig,
}

impl ProductionService {
    /// 創建新的生產服務
    pub fn new(
        stock: Arc<dyn StockStore>,
        gateway: Arc<dyn ProductionGateway>,
        consumption: Arc<dyn ConsumptionLog>,
        config: ProductionConfig,
    ) -> Self {
        Self {
            stock,
            gateway,
            consumption,
            config,
        }
    }

    /// 讀取配方所需原料的最新庫存（只在單次計算內使用）
    pub async fn snapshot(&self, recipe: &Recipe) -> Result<StockSnapshot> {
        let mut snapshot = StockSnapshot::new();
        for ingredient in &recipe.ingredients {
            if let Some(level) = self
                .stock
                .get_stock(&recipe.store_id, &ingredient.raw_material_id)
                .await?
            {
                snapshot.insert(level);
            }
        }
        Ok(snapshot)
    }

    /// 計算目標產量的原料需求
    pub async fn plan(&self, recipe: &Recipe, quantity: Decimal) -> Result<RequirementReport> {
        let snapshot = self.snapshot(recipe).await?;
        Ok(BatchCalculator::calculate(recipe, quantity, &snapshot))
    }

    /// 以目前庫存計算最多可生產量
    pub async fn max_producible(&self, recipe: &Recipe) -> Result<Decimal> {
        let snapshot = self.snapshot(recipe).await?;
        Ok(max_producible(recipe, &snapshot))
    }

    /// 確認生產
    ///
    /// 重新讀取庫存並計算，確認足夠後以單一原子程序提交。
    pub async fn confirm(
        &self,
        recipe: &Recipe,
        quantity: Decimal,
        producer: &str,
    ) -> Result<ProductionReceipt> {
        validate_recipe(recipe).into_result()?;
        if !recipe.is_active {
            return Err(BatchError::RecipeInactive(recipe.id));
        }
        if !validate_quantity(quantity).valid {
            return Err(BatchError::InvalidQuantity(quantity));
        }

        let report = self.plan(recipe, quantity).await?;
        if let Some(row) = report.shortfalls().next() {
            tracing::info!(
                "配方 {} 庫存不足，無法生產 {} {}",
                recipe.name,
                quantity,
                recipe.output_unit
            );
            return Err(BatchError::InsufficientStock {
                raw_material_id: row.raw_material_id.clone(),
                requested: row.needed,
                available: row.available,
            });
        }

        let order = ProductionOrder {
            recipe_id: recipe.id,
            store_id: recipe.store_id.clone(),
            quantity,
            unit: recipe.output_unit.clone(),
            producer: producer.to_string(),
            deductions: report
                .rows
                .iter()
                .map(|row| Deduction {
                    raw_material_id: row.raw_material_id.clone(),
                    amount: row.needed,
                    unit: row.unit.clone(),
                })
                .collect(),
        };

        let receipt = self.gateway.commit_production(order).await.map_err(|e| {
            tracing::warn!("配方 {} 生產提交失敗: {}", recipe.name, e);
            e
        })?;

        tracing::info!(
            "配方 {} 生產完成：{} {}，事件 {}",
            recipe.name,
            quantity,
            recipe.output_unit,
            receipt.event.id
        );

        if self.config.reorder_alerts {
            for level in receipt.below_reorder_level() {
                tracing::warn!(
                    "原料 {} 低於補貨點，需補充 {} {}",
                    level.raw_material_id,
                    level.replenishment_needed(),
                    level.unit
                );
            }
        }

        Ok(receipt)
    }

    /// 記錄成品消耗（例：完成銷售）
    pub async fn record_consumption(
        &self,
        store_id: &str,
        quantity: Decimal,
        source_ref: Option<String>,
    ) -> Result<Uuid> {
        if quantity <= Decimal::ZERO {
            return Err(BatchError::InvalidQuantity(quantity));
        }

        let mut event = ConsumptionEvent::new(
            store_id.to_string(),
            quantity,
            self.config.ledger_unit.clone(),
        );
        if let Some(source_ref) = source_ref {
            event = event.with_source_ref(source_ref);
        }

        let id = self.consumption.append_consumption(&event).await?;
        tracing::debug!("門市 {} 記錄消耗 {} {}", store_id, quantity, event.unit);
        Ok(id)
    }

    /// 配置引用
    pub fn config(&self) -> &ProductionConfig {
        &self.config
    }
}

/// 生產流程階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// 尚未選擇配方
    SelectRecipe,
    /// 等待輸入數量
    EnterQuantity,
    /// 庫存不足（修改數量或配方後重新計算）
    Insufficient,
    /// 庫存足夠，可確認
    Sufficient,
    /// 已完成
    Done,
    /// 提交失敗，未完成
    Failed { step: Option<CommitStep> },
}

/// 單次生產流程
#[derive(Debug)]
pub struct ProductionRun {
    stage: RunStage,
    recipe: Option<Recipe>,
    quantity: Option<Decimal>,
    report: Option<RequirementReport>,
    receipt: Option<ProductionReceipt>,
}

impl Default for ProductionRun {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductionRun {
    pub fn new() -> Self {
        Self {
            stage: RunStage::SelectRecipe,
            recipe: None,
            quantity: None,
            report: None,
            receipt: None,
        }
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn report(&self) -> Option<&RequirementReport> {
        self.report.as_ref()
    }

    pub fn receipt(&self) -> Option<&ProductionReceipt> {
        self.receipt.as_ref()
    }

    /// 選擇配方（會清除先前的數量與計算結果）
    pub fn select_recipe(&mut self, recipe: Recipe) -> Result<()> {
        self.ensure_not_done()?;
        self.recipe = Some(recipe);
        self.quantity = None;
        self.report = None;
        self.stage = RunStage::EnterQuantity;
        Ok(())
    }

    /// 輸入數量並計算需求
    pub async fn enter_quantity(
        &mut self,
        service: &ProductionService,
        quantity: Decimal,
    ) -> Result<&RequirementReport> {
        self.ensure_not_done()?;
        let recipe = self
            .recipe
            .as_ref()
            .ok_or_else(|| BatchError::Other("尚未選擇配方".to_string()))?;

        let report = service.plan(recipe, quantity).await?;
        self.stage = if report.feasible {
            RunStage::Sufficient
        } else {
            RunStage::Insufficient
        };
        self.quantity = Some(quantity);
        Ok(self.report.insert(report))
    }

    /// 確認生產（只允許在庫存足夠時）
    pub async fn confirm(
        &mut self,
        service: &ProductionService,
        producer: &str,
    ) -> Result<&ProductionReceipt> {
        if self.stage != RunStage::Sufficient {
            return Err(BatchError::Other(format!(
                "目前階段 {:?} 無法確認生產",
                self.stage
            )));
        }
        let (Some(recipe), Some(quantity)) = (self.recipe.as_ref(), self.quantity) else {
            return Err(BatchError::Other("生產流程缺少配方或數量".to_string()));
        };

        match service.confirm(recipe, quantity, producer).await {
            Ok(receipt) => {
                self.stage = RunStage::Done;
                Ok(self.receipt.insert(receipt))
            }
            Err(err) => {
                self.stage = match &err {
                    // 確認前庫存已被其他操作改變
                    BatchError::InsufficientStock { .. } => RunStage::Insufficient,
                    other => RunStage::Failed {
                        step: other.failed_step(),
                    },
                };
                Err(err)
            }
        }
    }

    fn ensure_not_done(&self) -> Result<()> {
        if self.stage == RunStage::Done {
            return Err(BatchError::Other("生產流程已完成".to_string()));
        }
        Ok(())
    }
}
