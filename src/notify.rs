//! Notification fan-out. Dispatch is strictly best-effort: a failed insert
//! is logged and swallowed, it never fails the operation that emitted it.

use uuid::Uuid;

use crate::model::ModelManager;
use crate::model::entity::Notification;

pub async fn notify_best_effort(
    mm: &ModelManager,
    account_id: Uuid,
    notif_type: &str,
    message: &str,
    related_type: Option<&str>,
    related_id: Option<Uuid>,
) {
    if let Err(e) = Notification::insert(
        mm,
        account_id,
        notif_type,
        message,
        related_type,
        related_id,
    )
    .await
    {
        tracing::warn!("failed to notify account {account_id}: {e}");
    }
}
