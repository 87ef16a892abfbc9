//! 成品餘額監看
//!
//! 收到變更通知時立即重新對帳，沒有通知時以固定間隔輪詢。
//! 停止或丟棄 handle 都會結束背景任務。

use batch_core::{BatchError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::reconciler::{LedgerBalance, LedgerReconciler};
use crate::store::{ChangeFeed, LedgerChange};

/// 餘額監看器
pub struct BalanceWatcher {
    reconciler: Arc<LedgerReconciler>,
    store_id: String,
    feed: Option<broadcast::Receiver<LedgerChange>>,
    interval: Duration,
}

impl BalanceWatcher {
    /// 創建監看器（輪詢間隔取自配置）
    pub fn new(reconciler: Arc<LedgerReconciler>, store_id: impl Into<String>) -> Self {
        let interval = reconciler.config().refresh_interval();
        Self {
            reconciler,
            store_id: store_id.into(),
            feed: None,
            interval,
        }
    }

    /// 訂閱變更通知
    pub fn with_feed(mut self, feed: &dyn ChangeFeed) -> Self {
        self.feed = Some(feed.subscribe());
        self
    }

    /// 覆寫輪詢間隔
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// 啟動背景任務（輪詢間隔必須大於 0）
    pub fn start(self) -> Result<BalanceWatchHandle> {
        if self.interval.is_zero() {
            return Err(BatchError::Config(format!(
                "門市 {} 的餘額輪詢間隔必須大於 0",
                self.store_id
            )));
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (balance_tx, balance_rx) = watch::channel(None);

        let BalanceWatcher {
            reconciler,
            store_id,
            mut feed,
            interval,
        } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!("門市 {} 餘額監看啟動，輪詢間隔 {:?}", store_id, interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    relevant = next_relevant_change(&mut feed, &store_id) => {
                        if !relevant {
                            continue;
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }

                match reconciler.balance(&store_id).await {
                    Ok(balance) => {
                        balance_tx.send_replace(Some(balance));
                    }
                    // 保留上一次的結果，等下次通知或輪詢
                    Err(e) => tracing::warn!("門市 {} 餘額刷新失敗: {}", store_id, e),
                }
            }

            tracing::debug!("門市 {} 餘額監看停止", store_id);
        });

        Ok(BalanceWatchHandle {
            shutdown_tx,
            balance_rx,
            task: Some(task),
        })
    }
}

/// 等待下一個與本門市餘額相關的變更
///
/// 通知通道關閉後只剩輪詢。
async fn next_relevant_change(
    feed: &mut Option<broadcast::Receiver<LedgerChange>>,
    store_id: &str,
) -> bool {
    let Some(rx) = feed.as_mut() else {
        return std::future::pending().await;
    };

    match rx.recv().await {
        Ok(change) => change.store_id() == store_id && change.affects_balance(),
        Err(RecvError::Lagged(skipped)) => {
            tracing::debug!("變更通知落後 {} 筆，直接重新對帳", skipped);
            true
        }
        Err(RecvError::Closed) => {
            *feed = None;
            false
        }
    }
}

/// 監看任務 handle
pub struct BalanceWatchHandle {
    shutdown_tx: watch::Sender<bool>,
    balance_rx: watch::Receiver<Option<LedgerBalance>>,
    task: Option<JoinHandle<()>>,
}

impl BalanceWatchHandle {
    /// 最近一次的餘額（尚未完成第一次對帳時為 None）
    pub fn latest(&self) -> Option<LedgerBalance> {
        self.balance_rx.borrow().clone()
    }

    /// 等待下一次餘額更新
    pub async fn changed(&mut self) -> Result<LedgerBalance> {
        self.balance_rx
            .changed()
            .await
            .map_err(|_| BatchError::Other("餘額監看已停止".to_string()))?;
        self.balance_rx
            .borrow_and_update()
            .clone()
            .ok_or_else(|| BatchError::Other("尚無餘額資料".to_string()))
    }

    /// 另一個餘額接收端
    pub fn subscribe(&self) -> watch::Receiver<Option<LedgerBalance>> {
        self.balance_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// 停止監看並等待任務結束
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("餘額監看任務異常結束: {}", e);
            }
        }
    }
}

impl Drop for BalanceWatchHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
