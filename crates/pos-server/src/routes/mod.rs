pub mod analytics;
pub mod auth;
pub mod config;
pub mod customers;
pub mod events;
pub mod health;
pub mod inventory;
pub mod kitchen;
pub mod permissions;
pub mod products;
pub mod users;
pub mod ws;

use crate::error::AppError;

/// Run blocking store work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> pos_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f).await.map_err(AppError::join)?;
    Ok(result?)
}
