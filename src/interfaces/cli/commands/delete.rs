//! Delete command
//!
//! 与服务端相同的路径：请求进入删除队列，再由 worker 应用。
//! CLI 进程随后关闭队列并等待 worker 清空。

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::deletion::{DeleteIntent, DeletionPipeline};
use crate::interfaces::cli::CliError;
use crate::storage::Storage;
use crate::system::shutdown::{cancel_on_ctrl_c, join_with_timeout};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn delete_links(
    storage: Arc<dyn Storage>,
    queue_capacity: usize,
    owner: String,
    short_ids: Vec<String>,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let count = short_ids.len();
    let removed = apply_delete(storage, queue_capacity, &owner, short_ids, cancel).await?;

    if removed == 0 {
        println!(
            "{} Nothing to delete: ids unknown, already deleted or not owned by {}",
            "ℹ".bold().blue(),
            owner.cyan()
        );
    } else {
        println!(
            "{} Deleted {} of {} link(s)",
            "✓".bold().green(),
            removed,
            count
        );
    }
    Ok(())
}

/// 经删除队列应用一次请求，返回实际被删除的映射数
///
/// 后端在没有匹配时不一定报告，所以按请求前后 owner 名下存活的 ID 计数。
async fn apply_delete(
    storage: Arc<dyn Storage>,
    queue_capacity: usize,
    owner: &str,
    short_ids: Vec<String>,
    cancel: CancellationToken,
) -> Result<usize, CliError> {
    let before = owned_live(storage.as_ref(), owner, &short_ids).await?;
    let (queue, stats, worker) =
        DeletionPipeline::spawn(Arc::clone(&storage), queue_capacity, cancel.clone());

    let count = short_ids.len();
    let ids = short_ids.clone();
    queue.submit(DeleteIntent::new(owner, short_ids)).await?;
    println!(
        "{} Delete of {} link(s) for {} accepted",
        "ℹ".bold().blue(),
        count,
        owner.cyan()
    );

    drop(queue);
    let finished = join_with_timeout("deletion worker", worker, DRAIN_TIMEOUT).await;
    cancel.cancel();
    if !finished {
        return Err(CliError::CommandError(
            "Deletion worker did not finish in time".to_string(),
        ));
    }

    if stats.failed() > 0 {
        return Err(CliError::CommandError(
            "Delete failed, see log for details".to_string(),
        ));
    }

    let after = owned_live(storage.as_ref(), owner, &ids).await?;
    Ok(before.saturating_sub(after))
}

async fn owned_live(
    storage: &dyn Storage,
    owner: &str,
    short_ids: &[String],
) -> Result<usize, CliError> {
    let live = storage.get_user_urls(owner).await?;
    Ok(live
        .iter()
        .filter(|u| short_ids.contains(&u.short_id))
        .count())
}
