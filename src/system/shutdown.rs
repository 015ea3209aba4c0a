use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 等待 Ctrl+C，然后取消 `token`
///
/// 取消后删除 worker 不再拉取新的意图，正在处理的意图会执行完。
pub async fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Shutdown signal received, stopping deletion worker..."),
                Err(e) => warn!(
                    "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                    e
                ),
            }
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

/// 在超时内等待后台任务结束
///
/// 返回任务是否在超时前正常退出。
pub async fn join_with_timeout(name: &str, handle: JoinHandle<()>, limit: Duration) -> bool {
    match timeout(limit, handle).await {
        Ok(Ok(())) => {
            info!("{} stopped", name);
            true
        }
        Ok(Err(e)) => {
            error!("{} terminated abnormally: {}", name, e);
            false
        }
        Err(_) => {
            error!("{} did not stop within {} ms", name, limit.as_millis());
            false
        }
    }
}
