//! 批次需求計算器

use batch_core::{convert, IngredientRequirement, Recipe, StockLookup, Unit};
use rust_decimal::Decimal;

use crate::requirement::{RequirementReport, RequirementRow};
use crate::{CalcWarning, WarningSeverity};

/// 批次需求計算器
///
/// 純計算，不寫入任何狀態，可在每次輸入變更時重複呼叫。
pub struct BatchCalculator;

impl BatchCalculator {
    /// 計算目標產量所需的原料與可行性
    ///
    /// # 參數
    /// * `recipe` - 配方
    /// * `quantity` - 目標產量（配方產量單位）
    /// * `stock` - 已限定門市的庫存查詢
    ///
    /// 產量或目標量 <= 0 時，在計算比例前直接返回空的不可行報告。
    pub fn calculate<S>(recipe: &Recipe, quantity: Decimal, stock: &S) -> RequirementReport
    where
        S: StockLookup + ?Sized,
    {
        if recipe.producible_quantity <= Decimal::ZERO || quantity <= Decimal::ZERO {
            tracing::debug!(
                "配方 {} 輸入無效：產量 {}，目標 {}",
                recipe.name,
                recipe.producible_quantity,
                quantity
            );
            let mut report = RequirementReport::infeasible(recipe.id, quantity);
            report.add_warning(CalcWarning::recipe(
                format!(
                    "產量與目標量必須大於 0（產量 {}，目標 {}）",
                    recipe.producible_quantity, quantity
                ),
                WarningSeverity::Error,
            ));
            return report;
        }

        let Some(batch_ratio) = quantity.checked_div(recipe.producible_quantity) else {
            return Self::out_of_range(recipe, quantity);
        };
        tracing::debug!(
            "配方 {} 目標 {} {}，批次比例 {}",
            recipe.name,
            quantity,
            recipe.output_unit,
            batch_ratio
        );

        let mut report = RequirementReport::infeasible(recipe.id, quantity);
        report.batch_ratio = Some(batch_ratio);

        for ingredient in &recipe.ingredients {
            let Some(row) = Self::calculate_row(ingredient, batch_ratio, stock, &mut report) else {
                return Self::out_of_range(recipe, quantity);
            };
            tracing::debug!(
                "原料 {}: 需要 {} {}, 可用 {}, 足夠 {}",
                row.raw_material_id,
                row.needed,
                row.unit,
                row.available,
                row.sufficient
            );
            report.rows.push(row);
        }

        if report.rows.is_empty() {
            report.add_warning(CalcWarning::recipe(
                "配方沒有任何原料，無法生產".to_string(),
                WarningSeverity::Error,
            ));
        }

        if !recipe.is_active {
            report.add_warning(CalcWarning::recipe(
                format!("配方 {} 已停用", recipe.name),
                WarningSeverity::Error,
            ));
        }

        report.feasible = recipe.is_active
            && !report.rows.is_empty()
            && report.rows.iter().all(|row| row.sufficient);

        report
    }

    /// 數值超出 Decimal 範圍時的不可行報告
    fn out_of_range(recipe: &Recipe, quantity: Decimal) -> RequirementReport {
        tracing::warn!("配方 {} 目標 {} 計算溢位", recipe.name, quantity);
        let mut report = RequirementReport::infeasible(recipe.id, quantity);
        report.add_warning(CalcWarning::recipe(
            format!("目標量 {} 超出可計算範圍", quantity),
            WarningSeverity::Error,
        ));
        report
    }

    /// 單一原料需求（溢位時返回 None）
    fn calculate_row<S>(
        ingredient: &IngredientRequirement,
        batch_ratio: Decimal,
        stock: &S,
        report: &mut RequirementReport,
    ) -> Option<RequirementRow>
    where
        S: StockLookup + ?Sized,
    {
        let needed = ingredient.quantity_needed.checked_mul(batch_ratio)?;

        let available = match stock.stock_of(&ingredient.raw_material_id) {
            Some(level) => Self::available_in_unit(
                &ingredient.raw_material_id,
                level.quantity,
                &level.unit,
                &ingredient.unit,
                report,
            ),
            None => {
                report.add_warning(CalcWarning::warning(
                    ingredient.raw_material_id.clone(),
                    "找不到庫存紀錄，視為 0".to_string(),
                ));
                Decimal::ZERO
            }
        };

        Some(RequirementRow::new(
            ingredient.raw_material_id.clone(),
            needed,
            available,
            ingredient.unit.clone(),
        ))
    }

    /// 將庫存換算為原料需求單位
    ///
    /// 無法換算（跨維度或未知單位）時數值原樣使用，並附上警告。
    fn available_in_unit(
        raw_material_id: &str,
        quantity: Decimal,
        stock_unit: &str,
        ingredient_unit: &str,
        report: &mut RequirementReport,
    ) -> Decimal {
        let conversion = convert(quantity, stock_unit, ingredient_unit);
        if !conversion.converted && Unit::parse(stock_unit) != Unit::parse(ingredient_unit) {
            report.add_warning(CalcWarning::warning(
                raw_material_id.to_string(),
                format!(
                    "庫存單位 {} 無法換算為配方單位 {}，數值原樣比較",
                    stock_unit, ingredient_unit
                ),
            ));
        }
        conversion.value.max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batch_core::{StockLevel, StockSnapshot};
    use proptest::prelude::*;

    fn morning_tea() -> Recipe {
        Recipe::new(
            "STORE-01".to_string(),
            "Morning Tea".to_string(),
            Decimal::from(5),
            "L".to_string(),
        )
        .with_ingredient("MILK", Decimal::from(2), "L")
    }

    fn milk_stock(quantity: Decimal) -> StockSnapshot {
        StockSnapshot::new().with_level(StockLevel::new(
            "MILK".to_string(),
            quantity,
            "L".to_string(),
        ))
    }

    #[test]
    fn test_morning_tea_shortfall() {
        let recipe = morning_tea();
        let stock = milk_stock(Decimal::new(35, 1));

        let report = BatchCalculator::calculate(&recipe, Decimal::from(10), &stock);

        assert_eq!(report.batch_ratio, Some(Decimal::from(2)));
        assert_eq!(report.rows.len(), 1);

        let milk = &report.rows[0];
        assert_eq!(milk.needed, Decimal::from(4));
        assert_eq!(milk.available, Decimal::new(35, 1));
        assert!(!milk.sufficient);
        assert_eq!(milk.shortfall, Decimal::new(5, 1));
        assert!(!report.feasible);

        let formatted = milk.formatted_shortfall();
        assert_eq!(formatted.unit, "ml");
        assert_eq!(formatted.display_text, "500 ml");
    }

    #[test]
    fn test_out_of_range_quantity_is_infeasible() {
        let recipe = Recipe::new(
            "STORE-01".to_string(),
            "Morning Tea".to_string(),
            Decimal::new(1, 3),
            "L".to_string(),
        )
        .with_ingredient("MILK", Decimal::from(2), "L");
        let stock = milk_stock(Decimal::from(4));

        let report =
            BatchCalculator::calculate(&recipe, Decimal::MAX / Decimal::from(10), &stock);

        assert!(!report.feasible);
        assert!(report.rows.is_empty());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.severity == WarningSeverity::Error));

        // 比例可計算但用量溢位
        let recipe = Recipe::new(
            "STORE-01".to_string(),
            "Morning Tea".to_string(),
            Decimal::from(5),
            "L".to_string(),
        )
        .with_ingredient("MILK", Decimal::from(10), "L");
        let report = BatchCalculator::calculate(&recipe, Decimal::MAX, &stock);
        assert!(!report.feasible);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_sufficient_stock_is_feasible() {
        let recipe = morning_tea();
        let stock = milk_stock(Decimal::from(4));

        let report = BatchCalculator::calculate(&recipe, Decimal::from(10), &stock);

        assert!(report.feasible);
        assert_eq!(report.shortfalls().count(), 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_rows_follow_recipe_order() {
        let recipe = morning_tea()
            .with_ingredient("TEA-LEAF", Decimal::from(50), "g")
            .with_ingredient("SUGAR", Decimal::new(2, 1), "kg");
        let stock = milk_stock(Decimal::from(10))
            .with_level(StockLevel::new("TEA-LEAF".to_string(), Decimal::from(1), "kg".to_string()))
            .with_level(StockLevel::new("SUGAR".to_string(), Decimal::from(100), "g".to_string()));

        let report = BatchCalculator::calculate(&recipe, Decimal::from(5), &stock);

        let ids: Vec<_> = report.rows.iter().map(|r| r.raw_material_id.as_str()).collect();
        assert_eq!(ids, vec!["MILK", "TEA-LEAF", "SUGAR"]);

        // 1 kg 茶葉換算為 1000 g
        assert_eq!(report.row("TEA-LEAF").unwrap().available, Decimal::from(1000));
        // 100 g 糖換算為 0.1 kg，需要 0.2 kg
        let sugar = report.row("SUGAR").unwrap();
        assert_eq!(sugar.available, Decimal::new(1, 1));
        assert!(!sugar.sufficient);
        assert!(!report.feasible);
    }

    #[test]
    fn test_empty_recipe_is_infeasible() {
        let recipe = Recipe::new(
            "STORE-01".to_string(),
            "Empty".to_string(),
            Decimal::from(5),
            "L".to_string(),
        );

        let report = BatchCalculator::calculate(&recipe, Decimal::from(1), &StockSnapshot::new());

        assert!(report.rows.is_empty());
        assert!(!report.feasible);
    }

    #[test]
    fn test_invalid_inputs_return_empty_report() {
        let recipe = morning_tea();
        let stock = milk_stock(Decimal::from(100));

        let zero = BatchCalculator::calculate(&recipe, Decimal::ZERO, &stock);
        assert!(zero.rows.is_empty());
        assert!(!zero.feasible);
        assert_eq!(zero.batch_ratio, None);

        let negative = BatchCalculator::calculate(&recipe, Decimal::from(-3), &stock);
        assert!(negative.rows.is_empty());
        assert!(!negative.feasible);

        let mut broken = morning_tea();
        broken.producible_quantity = Decimal::ZERO;
        let report = BatchCalculator::calculate(&broken, Decimal::from(10), &stock);
        assert!(report.rows.is_empty());
        assert!(!report.feasible);
    }

    #[test]
    fn test_missing_stock_counts_as_zero() {
        let recipe = morning_tea();

        let report = BatchCalculator::calculate(&recipe, Decimal::from(5), &StockSnapshot::new());

        assert_eq!(report.rows[0].available, Decimal::ZERO);
        assert!(!report.feasible);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_unconvertible_unit_passes_through_with_warning() {
        let recipe = Recipe::new(
            "STORE-01".to_string(),
            "Boxed".to_string(),
            Decimal::ONE,
            "pcs".to_string(),
        )
        .with_ingredient("CUP", Decimal::from(3), "pcs");
        let stock = StockSnapshot::new().with_level(StockLevel::new(
            "CUP".to_string(),
            Decimal::from(5),
            "box".to_string(),
        ));

        let report = BatchCalculator::calculate(&recipe, Decimal::ONE, &stock);

        assert_eq!(report.rows[0].available, Decimal::from(5));
        assert!(report.feasible);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_inactive_recipe_is_infeasible() {
        let mut recipe = morning_tea();
        recipe.deactivate();

        let report = BatchCalculator::calculate(&recipe, Decimal::from(5), &milk_stock(Decimal::from(10)));

        assert!(report.rows[0].sufficient);
        assert!(!report.feasible);
    }

    proptest! {
        #[test]
        fn prop_batch_scaling_is_linear(
            yield_hundredths in 1i64..100_000,
            need_hundredths in 1i64..100_000,
            k_hundredths in 1i64..10_000,
        ) {
            let p = Decimal::new(yield_hundredths, 2);
            let r = Decimal::new(need_hundredths, 2);
            let k = Decimal::new(k_hundredths, 2);
            let recipe = Recipe::new("S".to_string(), "R".to_string(), p, "L".to_string())
                .with_ingredient("X", r, "L");

            let report = BatchCalculator::calculate(&recipe, k * p, &StockSnapshot::new());

            prop_assert_eq!(report.rows[0].needed, k * r);
        }

        #[test]
        fn prop_smaller_batch_never_creates_shortfall(
            stock_tenths in 0i64..10_000,
            q_tenths in 1i64..10_000,
            smaller_tenths in 1i64..10_000,
        ) {
            prop_assume!(smaller_tenths < q_tenths);
            let recipe = morning_tea();
            let stock = milk_stock(Decimal::new(stock_tenths, 1));

            let larger = BatchCalculator::calculate(&recipe, Decimal::new(q_tenths, 1), &stock);
            let smaller = BatchCalculator::calculate(&recipe, Decimal::new(smaller_tenths, 1), &stock);

            if larger.feasible {
                prop_assert!(smaller.feasible);
            }
        }
    }
}
