use store::KvStore;

/// `POST /bot/start|stop|arm|disarm` (§6): each call sets a flag in the
/// key-value region and is idempotent — calling `start` twice, or `disarm`
/// when already disarmed, both succeed and leave state unchanged.
pub async fn start(kv: &KvStore) -> Result<(), sqlx::Error> {
    kv.set_bot_running(true).await
}

pub async fn stop(kv: &KvStore) -> Result<(), sqlx::Error> {
    kv.set_bot_running(false).await
}

pub async fn arm_auto_execute(kv: &KvStore) -> Result<(), sqlx::Error> {
    kv.set_auto_execute_armed(true).await
}

pub async fn disarm_auto_execute(kv: &KvStore) -> Result<(), sqlx::Error> {
    kv.set_auto_execute_armed(false).await
}
