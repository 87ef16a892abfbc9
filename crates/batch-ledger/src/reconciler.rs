//! 成品帳本對帳
//!
//! 可用餘額 = 生產總量 - 消耗總量，每次查詢都由完整事件重新計算，
//! 不保存任何遞增計數器。

use batch_core::{
    convert, format_quantity, ConsumptionEvent, FormattedQuantity, ProductionConfig,
    ProductionEvent, Result, Unit,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{ConsumptionLog, ProductionLog};

/// 帳本餘額
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    /// 生產總量
    pub produced: Decimal,
    /// 消耗總量
    pub consumed: Decimal,
    /// 帳本單位
    pub unit: String,
    /// 未計入總量的事件數（單位無法換算為帳本單位或數值溢位）
    #[serde(default)]
    pub excluded: usize,
}

impl LedgerBalance {
    /// 帶正負號的餘額（診斷用）
    pub fn signed(&self) -> Decimal {
        self.produced - self.consumed
    }

    /// 顯示用餘額（最小為 0）
    pub fn available(&self) -> Decimal {
        self.signed().max(Decimal::ZERO)
    }

    /// 餘額為負代表上游事件順序或帳務異常
    pub fn is_anomalous(&self) -> bool {
        self.signed() < Decimal::ZERO
    }

    /// 顯示用數量
    pub fn formatted(&self) -> FormattedQuantity {
        format_quantity(self.available(), &self.unit)
    }
}

/// 由事件加總計算餘額（事件數量換算至帳本單位）
///
/// 無法換算的事件不計入總量，只計入 `excluded`。
pub fn reconcile(
    production: &[ProductionEvent],
    consumption: &[ConsumptionEvent],
    ledger_unit: &str,
) -> LedgerBalance {
    let mut excluded = 0;

    let produced = sum_in_unit(
        production.iter().map(|e| (e.quantity, e.unit.as_str())),
        ledger_unit,
        &mut excluded,
    );
    let consumed = sum_in_unit(
        consumption.iter().map(|e| (e.quantity, e.unit.as_str())),
        ledger_unit,
        &mut excluded,
    );

    LedgerBalance {
        produced,
        consumed,
        unit: ledger_unit.to_string(),
        excluded,
    }
}

fn sum_in_unit<'a>(
    quantities: impl Iterator<Item = (Decimal, &'a str)>,
    ledger_unit: &str,
    excluded: &mut usize,
) -> Decimal {
    let target = Unit::parse(ledger_unit);
    let mut total = Decimal::ZERO;

    for (quantity, unit) in quantities {
        let conversion = convert(quantity, unit, ledger_unit);
        if !conversion.converted && Unit::parse(unit) != target {
            *excluded += 1;
            continue;
        }
        match total.checked_add(conversion.value) {
            Some(sum) => total = sum,
            None => *excluded += 1,
        }
    }

    total
}

/// 帳本對帳器
///
/// 無內部可變狀態，可被多個呼叫端同時使用。
pub struct LedgerReconciler {
    production: Arc<dyn ProductionLog>,
    consumption: Arc<dyn ConsumptionLog>,
    config: ProductionConfig,
}

impl LedgerReconciler {
    /// 創建新的對帳器
    pub fn new(
        production: Arc<dyn ProductionLog>,
        consumption: Arc<dyn ConsumptionLog>,
        config: ProductionConfig,
    ) -> Self {
        Self {
            production,
            consumption,
            config,
        }
    }

    /// 查詢門市目前的成品餘額
    pub async fn balance(&self, store_id: &str) -> Result<LedgerBalance> {
        let (production, consumption) = tokio::try_join!(
            self.production.list_production(store_id),
            self.consumption.list_consumption(store_id),
        )?;

        let balance = reconcile(&production, &consumption, &self.config.ledger_unit);

        if balance.excluded > 0 {
            tracing::warn!(
                store_id = store_id,
                excluded = balance.excluded,
                ledger_unit = %balance.unit,
                "部分帳本事件無法換算為帳本單位，未計入餘額"
            );
        }

        if balance.is_anomalous() && self.config.report_negative_balance {
            tracing::warn!(
                store_id = store_id,
                produced = %balance.produced,
                consumed = %balance.consumed,
                signed = %balance.signed(),
                "成品帳本餘額為負，消耗事件可能早於對應的生產事件"
            );
        } else {
            tracing::debug!(
                "門市 {} 成品餘額: {} {}（生產 {}，消耗 {}）",
                store_id,
                balance.available(),
                balance.unit,
                balance.produced,
                balance.consumed
            );
        }

        Ok(balance)
    }

    /// 配置引用
    pub fn config(&self) -> &ProductionConfig {
        &self.config
    }
}
