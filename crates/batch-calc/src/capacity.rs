//! 可生產量計算

use batch_core::{convert, Recipe, StockLookup};
use rust_decimal::{Decimal, RoundingStrategy};

/// 可生產量保留的小數位數（向零捨去，確保結果一定可行）
const CAPACITY_DP: u32 = 4;

/// 以目前庫存計算配方最多可生產的數量（配方產量單位）
///
/// 取各原料「可用量 / 每批用量 × 產量」的最小值。
/// 產量無效、沒有原料或缺少庫存紀錄時返回 0。
pub fn max_producible<S>(recipe: &Recipe, stock: &S) -> Decimal
where
    S: StockLookup + ?Sized,
{
    if !recipe.has_valid_yield() || recipe.ingredients.is_empty() {
        return Decimal::ZERO;
    }

    let mut limit: Option<Decimal> = None;

    for ingredient in &recipe.ingredients {
        if ingredient.quantity_needed <= Decimal::ZERO {
            continue;
        }

        let available = stock
            .stock_of(&ingredient.raw_material_id)
            .map(|level| convert(level.quantity, &level.unit, &ingredient.unit).value)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);

        // 溢位代表此原料不是限制因素
        let producible = available
            .checked_div(ingredient.quantity_needed)
            .and_then(|batches| batches.checked_mul(recipe.producible_quantity))
            .unwrap_or(Decimal::MAX);

        tracing::debug!(
            "原料 {} 可支撐產量 {} {}",
            ingredient.raw_material_id,
            producible,
            recipe.output_unit
        );

        limit = Some(match limit {
            Some(current) => current.min(producible),
            None => producible,
        });
    }

    limit
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(CAPACITY_DP, RoundingStrategy::ToZero)
}
