//! 配方（批次定義）模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 配方原料需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    /// 原料ID
    pub raw_material_id: String,

    /// 每批用量（對應配方產量）
    pub quantity_needed: Decimal,

    /// 用量單位
    pub unit: String,
}

impl IngredientRequirement {
    /// 創建新的原料需求
    pub fn new(raw_material_id: String, quantity_needed: Decimal, unit: String) -> Self {
        Self {
            raw_material_id,
            quantity_needed,
            unit,
        }
    }
}

/// 配方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// 配方ID
    pub id: Uuid,

    /// 門市ID
    pub store_id: String,

    /// 批次名稱
    pub name: String,

    /// 單次產量
    pub producible_quantity: Decimal,

    /// 產量單位（例：L）
    pub output_unit: String,

    /// 原料清單（保持輸入順序）
    pub ingredients: Vec<IngredientRequirement>,

    /// 是否啟用（停用即軟刪除）
    pub is_active: bool,

    /// 建立時間
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// 創建新的配方
    pub fn new(
        store_id: String,
        name: String,
        producible_quantity: Decimal,
        output_unit: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            name,
            producible_quantity,
            output_unit,
            ingredients: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// 建構器模式：添加原料
    pub fn with_ingredient(
        mut self,
        raw_material_id: impl Into<String>,
        quantity_needed: Decimal,
        unit: impl Into<String>,
    ) -> Self {
        self.ingredients.push(IngredientRequirement::new(
            raw_material_id.into(),
            quantity_needed,
            unit.into(),
        ));
        self
    }

    /// 建構器模式：設置原料清單
    pub fn with_ingredients(mut self, ingredients: Vec<IngredientRequirement>) -> Self {
        self.ingredients = ingredients;
        self
    }

    /// 停用配方
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// 重新啟用配方
    pub fn activate(&mut self) {
        self.is_active = true;
    }

    /// 查找原料
    pub fn ingredient(&self, raw_material_id: &str) -> Option<&IngredientRequirement> {
        self.ingredients
            .iter()
            .find(|i| i.raw_material_id == raw_material_id)
    }

    /// 檢查產量是否有效
    pub fn has_valid_yield(&self) -> bool {
        self.producible_quantity > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_recipe() {
        let recipe = Recipe::new(
            "STORE-01".to_string(),
            "Morning Tea".to_string(),
            Decimal::from(5),
            "L".to_string(),
        )
        .with_ingredient("MILK", Decimal::from(2), "L")
        .with_ingredient("TEA-LEAF", Decimal::from(100), "g");

        assert_eq!(recipe.name, "Morning Tea");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].raw_material_id, "MILK");
        assert!(recipe.is_active);
        assert!(recipe.has_valid_yield());
        assert_eq!(
            recipe.ingredient("TEA-LEAF").map(|i| i.quantity_needed),
            Some(Decimal::from(100))
        );
    }

    #[test]
    fn test_soft_delete() {
        let mut recipe = Recipe::new(
            "STORE-01".to_string(),
            "Ginger Tea".to_string(),
            Decimal::ZERO,
            "L".to_string(),
        );

        assert!(!recipe.has_valid_yield());

        recipe.deactivate();
        assert!(!recipe.is_active);

        recipe.activate();
        assert!(recipe.is_active);
    }
}
