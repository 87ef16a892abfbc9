//! 單位換算
//!
//! 體積（L / ml）與重量（kg / g）之間以 ×1000 / ÷1000 精確換算，
//! 其他單位（如 pcs、box）一律原樣傳遞，不報錯也不誤換。

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 大單位與小單位之間的倍率
const SUB_UNIT_FACTOR: i64 = 1000;

/// 物理維度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    /// 體積
    Volume,
    /// 重量
    Weight,
}

/// 單位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// 公升
    Liter,
    /// 毫升
    Milliliter,
    /// 公斤
    Kilogram,
    /// 公克
    Gram,
    /// 無法辨識的單位（保留原字串）
    Other(String),
}

impl Unit {
    /// 解析單位字串（不分大小寫，接受常見拼法）
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "l" | "ltr" | "ltrs" | "litre" | "litres" | "liter" | "liters" => Unit::Liter,
            "ml" | "mls" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Unit::Milliliter
            }
            "kg" | "kgs" | "kilogram" | "kilograms" => Unit::Kilogram,
            "g" | "gm" | "gms" | "gram" | "grams" => Unit::Gram,
            _ => Unit::Other(trimmed.to_string()),
        }
    }

    /// 所屬維度，無法辨識的單位返回 None
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Unit::Liter | Unit::Milliliter => Some(Dimension::Volume),
            Unit::Kilogram | Unit::Gram => Some(Dimension::Weight),
            Unit::Other(_) => None,
        }
    }

    /// 檢查是否為小單位（ml / g）
    pub fn is_sub_unit(&self) -> bool {
        matches!(self, Unit::Milliliter | Unit::Gram)
    }

    /// 標準符號
    pub fn symbol(&self) -> &str {
        match self {
            Unit::Liter => "L",
            Unit::Milliliter => "ml",
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Other(raw) => raw,
        }
    }

    /// 同維度的大單位
    fn major(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Volume => Unit::Liter,
            Dimension::Weight => Unit::Kilogram,
        }
    }

    /// 同維度的小單位
    fn minor(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Volume => Unit::Milliliter,
            Dimension::Weight => Unit::Gram,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 換算結果
///
/// `converted` 為 false 表示數值原樣傳遞（相同單位、無法辨識或跨維度）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub value: Decimal,
    pub converted: bool,
}

impl Conversion {
    fn passthrough(value: Decimal) -> Self {
        Self {
            value,
            converted: false,
        }
    }
}

/// 換算並標記是否真的發生換算
pub fn convert(value: Decimal, from_unit: &str, to_unit: &str) -> Conversion {
    let from = Unit::parse(from_unit);
    let to = Unit::parse(to_unit);

    if from == to {
        return Conversion::passthrough(value);
    }

    match (from.dimension(), to.dimension()) {
        (Some(a), Some(b)) if a == b => {
            let factor = Decimal::from(SUB_UNIT_FACTOR);
            let scaled = if from.is_sub_unit() {
                value.checked_div(factor)
            } else {
                value.checked_mul(factor)
            };
            // 超出 Decimal 範圍時原樣傳遞
            match scaled {
                Some(value) => Conversion {
                    value,
                    converted: true,
                },
                None => Conversion::passthrough(value),
            }
        }
        _ => Conversion::passthrough(value),
    }
}

/// 將數值從 `from_unit` 換算為 `to_unit`
///
/// 無法換算時返回原值，從不報錯。需要區分「已換算」與「原樣傳遞」時請用 [`convert`]。
pub fn to_base_unit(value: Decimal, from_unit: &str, to_unit: &str) -> Decimal {
    convert(value, from_unit, to_unit).value
}

/// 顯示用數量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedQuantity {
    /// 顯示單位下的數值
    pub value: Decimal,
    /// 顯示單位
    pub unit: String,
    /// 顯示文字
    pub display_text: String,
}

/// 依維度選擇合適的顯示單位
///
/// - 小於 1 個大單位：只顯示小單位（例：`500 ml`）
/// - 大於等於 1 個大單位：大單位加小單位括號（例：`1.25 L (1250 ml)`）
/// - 無法辨識的單位：`"{value:.2} {unit}"`
pub fn format_quantity(value: Decimal, unit: &str) -> FormattedQuantity {
    let parsed = Unit::parse(unit);

    let Some(dimension) = parsed.dimension() else {
        return format_plain(value, unit);
    };

    let factor = Decimal::from(SUB_UNIT_FACTOR);
    let scaled = if parsed.is_sub_unit() {
        value.checked_div(factor).map(|major| (major, value))
    } else {
        value.checked_mul(factor).map(|minor| (value, minor))
    };
    let Some((major_value, minor_value)) = scaled else {
        return format_plain(value, unit);
    };

    let major = Unit::major(dimension);
    let minor = Unit::minor(dimension);

    if major_value < Decimal::ONE {
        let shown = round_to(minor_value, 0);
        FormattedQuantity {
            value: shown,
            unit: minor.symbol().to_string(),
            display_text: format!("{:.0} {}", shown, minor),
        }
    } else {
        let shown = round_to(major_value, 2);
        FormattedQuantity {
            value: shown,
            unit: major.symbol().to_string(),
            display_text: format!(
                "{:.2} {} ({:.0} {})",
                shown,
                major,
                round_to(minor_value, 0),
                minor
            ),
        }
    }
}

/// 不換算顯示單位，原樣輸出
fn format_plain(value: Decimal, unit: &str) -> FormattedQuantity {
    let rounded = round_to(value, 2);
    FormattedQuantity {
        value: rounded,
        unit: unit.to_string(),
        display_text: format!("{:.2} {}", rounded, unit),
    }
}

/// 四捨五入（中點遠離零）
fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
