//! 生產核心配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{BatchError, Result};

/// 生產核心配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// 成品帳本單位（生產 / 消耗事件換算至此單位後加總）
    pub ledger_unit: String,

    /// 輪詢刷新間隔（秒）
    pub refresh_interval_secs: u64,

    /// 變更通知通道容量
    pub notify_capacity: usize,

    /// 是否回報負餘額
    /// - true: 帳本餘額為負時記錄警告（預設）
    /// - false: 只做顯示歸零
    pub report_negative_balance: bool,

    /// 生產後是否回報低於補貨點的原料
    pub reorder_alerts: bool,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductionConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            ledger_unit: "L".to_string(),
            refresh_interval_secs: 10,
            notify_capacity: 64,
            report_negative_balance: true,
            reorder_alerts: true,
        }
    }

    /// 從 JSON 載入配置（缺少的欄位使用預設值）
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| BatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置帳本單位
    pub fn with_ledger_unit(mut self, unit: impl Into<String>) -> Self {
        self.ledger_unit = unit.into();
        self
    }

    /// 建構器模式：設置刷新間隔
    pub fn with_refresh_interval_secs(mut self, secs: u64) -> Self {
        self.refresh_interval_secs = secs;
        self
    }

    /// 建構器模式：設置通知通道容量
    pub fn with_notify_capacity(mut self, capacity: usize) -> Self {
        self.notify_capacity = capacity;
        self
    }

    /// 建構器模式：設置是否回報負餘額
    pub fn with_report_negative_balance(mut self, report: bool) -> Self {
        self.report_negative_balance = report;
        self
    }

    /// 建構器模式：設置是否回報補貨提醒
    pub fn with_reorder_alerts(mut self, enabled: bool) -> Self {
        self.reorder_alerts = enabled;
        self
    }

    /// 刷新間隔
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// 檢查配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.ledger_unit.trim().is_empty() {
            return Err(BatchError::Config("帳本單位不可為空".to_string()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(BatchError::Config("刷新間隔必須大於 0".to_string()));
        }
        if self.notify_capacity == 0 {
            return Err(BatchError::Config("通知通道容量必須大於 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProductionConfig::new();

        assert_eq!(config.ledger_unit, "L");
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
        assert!(config.report_negative_balance);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ProductionConfig::new()
            .with_ledger_unit("kg")
            .with_refresh_interval_secs(30)
            .with_notify_capacity(8)
            .with_report_negative_balance(false)
            .with_reorder_alerts(false);

        assert_eq!(config.ledger_unit, "kg");
        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.notify_capacity, 8);
        assert!(!config.report_negative_balance);
        assert!(!config.reorder_alerts);
    }

    #[test]
    fn test_config_from_json() {
        let config = ProductionConfig::from_json(r#"{ "refresh_interval_secs": 5 }"#).unwrap();

        assert_eq!(config.refresh_interval_secs, 5);
        // 未指定的欄位保留預設值
        assert_eq!(config.ledger_unit, "L");
        assert_eq!(config.notify_capacity, 64);
    }

    #[test]
    fn test_config_rejects_invalid() {
        assert!(ProductionConfig::from_json(r#"{ "refresh_interval_secs": 0 }"#).is_err());
        assert!(ProductionConfig::from_json(r#"{ "ledger_unit": " " }"#).is_err());
        assert!(ProductionConfig::from_json("not json").is_err());
    }
}
