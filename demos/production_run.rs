//! 批次生產示例
//!
//! 執行：`cargo run --example production_run`

use anyhow::Result;
use batch::*;
use batch_core::ConsumptionEvent;
use batch_ledger::ConsumptionLog;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

const STORE: &str = "STORE-01";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = ProductionConfig::from_json(r#"{ "ledger_unit": "L", "refresh_interval_secs": 5 }"#)?;

    // 1. 準備庫存
    let store = Arc::new(MemoryStore::new(config.notify_capacity));
    store
        .set_stock(
            STORE,
            StockLevel::new("MILK".to_string(), Decimal::new(35, 1), "L".to_string())
                .with_reorder_level(Decimal::ONE),
        )
        .await;
    store
        .set_stock(
            STORE,
            StockLevel::new("TEA-LEAF".to_string(), Decimal::from(500), "g".to_string()),
        )
        .await;

    // 2. 配方
    let recipe = Recipe::new(
        STORE.to_string(),
        "Morning Tea".to_string(),
        Decimal::from(5),
        "L".to_string(),
    )
    .with_ingredient("MILK", Decimal::from(2), "L")
    .with_ingredient("TEA-LEAF", Decimal::new(1, 1), "kg");

    let outcome = validate_recipe(&recipe);
    println!("配方驗證: {}", if outcome.valid { "通過" } else { "失敗" });

    // 3. 服務與餘額監看
    let service = ProductionService::new(store.clone(), store.clone(), store.clone(), config.clone());
    let reconciler = Arc::new(LedgerReconciler::new(store.clone(), store.clone(), config.clone()));
    let mut watch = BalanceWatcher::new(reconciler, STORE)
        .with_feed(store.as_ref())
        .start()?;
    watch.changed().await?;

    println!(
        "最多可生產: {}",
        format_quantity(service.max_producible(&recipe).await?, "L").display_text
    );

    // 4. 第一次嘗試：10 L（庫存不足）
    let mut run = ProductionRun::new();
    run.select_recipe(recipe.clone())?;
    let report = run.enter_quantity(&service, Decimal::from(10)).await?;
    print_report(report);
    println!("階段: {:?}", run.stage());

    // 5. 調整為 5 L 後確認
    let report = run.enter_quantity(&service, Decimal::from(5)).await?;
    print_report(report);

    let receipt = run.confirm(&service, "alice").await?;
    println!("生產完成，事件 {}", receipt.event.id);
    for level in &receipt.updated_stock {
        println!(
            "  {} 剩餘 {}",
            level.raw_material_id,
            format_quantity(level.quantity, &level.unit).display_text
        );
    }

    // 6. 銷售消耗
    service
        .record_consumption(STORE, Decimal::new(15, 1), Some("ORDER-1".to_string()))
        .await?;
    store
        .append_consumption(&ConsumptionEvent::new(
            STORE.to_string(),
            Decimal::from(250),
            "ml".to_string(),
        ))
        .await?;

    // 等待監看器反映最新餘額
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        let balance = tokio::time::timeout(Duration::from_millis(200), watch.changed()).await;
        if let Ok(Ok(balance)) = balance {
            if balance.consumed > Decimal::new(15, 1) {
                break;
            }
        }
    }

    if let Some(balance) = watch.latest() {
        println!("成品可用: {}", balance.formatted().display_text);
    }

    watch.stop().await;
    Ok(())
}

fn print_report(report: &RequirementReport) {
    println!(
        "需求計算 {} → {}",
        report.requested_quantity,
        if report.feasible { "庫存足夠" } else { "庫存不足" }
    );
    for row in &report.rows {
        println!(
            "  {:<10} 需要 {:<20} 可用 {:<10} {}",
            row.raw_material_id,
            row.formatted_needed().display_text,
            row.available,
            if row.sufficient {
                String::from("✓")
            } else {
                format!("缺 {}", row.formatted_shortfall().display_text)
            }
        );
    }
}
