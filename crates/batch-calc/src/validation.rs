//! 配方與數量驗證
//!
//! 驗證結果以結構化資料返回，不以錯誤中斷，方便呼叫端逐項顯示。

use batch_core::{BatchError, Recipe};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// 驗證問題
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssue {
    /// 配方名稱為空
    EmptyName,
    /// 產量 <= 0
    NonPositiveYield(Decimal),
    /// 沒有任何原料
    NoIngredients,
    /// 原料重複
    DuplicateIngredient(String),
    /// 第 N 行未選擇原料
    MissingRawMaterial { row: usize },
    /// 第 N 行用量 <= 0
    NonPositiveIngredientQuantity { row: usize, quantity: Decimal },
    /// 目標數量 <= 0
    NonPositiveQuantity(Decimal),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyName => write!(f, "配方名稱不可為空"),
            ValidationIssue::NonPositiveYield(q) => write!(f, "產量必須大於 0（目前 {}）", q),
            ValidationIssue::NoIngredients => write!(f, "至少需要一項原料"),
            ValidationIssue::DuplicateIngredient(id) => write!(f, "原料重複: {}", id),
            ValidationIssue::MissingRawMaterial { row } => write!(f, "第 {} 行未選擇原料", row + 1),
            ValidationIssue::NonPositiveIngredientQuantity { row, quantity } => {
                write!(f, "第 {} 行用量必須大於 0（目前 {}）", row + 1, quantity)
            }
            ValidationIssue::NonPositiveQuantity(q) => write!(f, "數量必須大於 0（目前 {}）", q),
        }
    }
}

/// 驗證結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }

    /// 第一個問題的說明文字
    pub fn reason(&self) -> Option<String> {
        self.issues.first().map(|issue| issue.to_string())
    }

    /// 轉為硬錯誤（生產確認前使用）
    pub fn into_result(self) -> batch_core::Result<()> {
        if self.valid {
            return Ok(());
        }
        let reasons: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        Err(BatchError::MalformedRecipe(reasons.join("; ")))
    }
}

/// 驗證配方內容
pub fn validate_recipe(recipe: &Recipe) -> ValidationOutcome {
    let mut issues = Vec::new();

    if recipe.name.trim().is_empty() {
        issues.push(ValidationIssue::EmptyName);
    }

    if recipe.producible_quantity <= Decimal::ZERO {
        issues.push(ValidationIssue::NonPositiveYield(recipe.producible_quantity));
    }

    if recipe.ingredients.is_empty() {
        issues.push(ValidationIssue::NoIngredients);
    }

    let mut seen = HashSet::new();
    for (row, ingredient) in recipe.ingredients.iter().enumerate() {
        let raw_material_id = ingredient.raw_material_id.trim();

        if raw_material_id.is_empty() {
            issues.push(ValidationIssue::MissingRawMaterial { row });
        } else if !seen.insert(raw_material_id) {
            issues.push(ValidationIssue::DuplicateIngredient(raw_material_id.to_string()));
        }

        if ingredient.quantity_needed <= Decimal::ZERO {
            issues.push(ValidationIssue::NonPositiveIngredientQuantity {
                row,
                quantity: ingredient.quantity_needed,
            });
        }
    }

    ValidationOutcome::from_issues(issues)
}

/// 驗證目標數量
pub fn validate_quantity(quantity: Decimal) -> ValidationOutcome {
    if quantity <= Decimal::ZERO {
        ValidationOutcome::from_issues(vec![ValidationIssue::NonPositiveQuantity(quantity)])
    } else {
        ValidationOutcome::from_issues(Vec::new())
    }
}
