//! # NotificationCounter
//!
//! Unread badge count. Anonymous callers poll this often, so they get `0`
//! without touching the port.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::traits::NotificationPort;

pub struct NotificationCounter {
    port: Arc<dyn NotificationPort>,
}

impl NotificationCounter {
    pub fn new(port: Arc<dyn NotificationPort>) -> Self {
        Self { port }
    }

    pub async fn unread_count(&self, user_id: Option<Uuid>) -> Result<u64> {
        let Some(user_id) = user_id else {
            return Ok(0);
        };

        let count = self
            .port
            .count_unread(user_id)
            .await
            .map_err(AppError::from_port)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockNotificationPort;

    #[tokio::test]
    async fn anonymous_is_zero_without_port_call() {
        let mut port = MockNotificationPort::new();
        port.expect_count_unread().never();

        let count = NotificationCounter::new(Arc::new(port)).unread_count(None).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn returns_port_count_for_user() {
        let user = Uuid::now_v7();
        let mut port = MockNotificationPort::new();
        port.expect_count_unread()
            .withf(move |id| *id == user)
            .times(1)
            .returning(|_| Ok(7));

        let count = NotificationCounter::new(Arc::new(port)).unread_count(Some(user)).await.unwrap();
        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn negative_counts_clamp_to_zero() {
        let mut port = MockNotificationPort::new();
        port.expect_count_unread().returning(|_| Ok(-3));

        let count = NotificationCounter::new(Arc::new(port))
            .unread_count(Some(Uuid::now_v7()))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn port_failure_is_internal() {
        let mut port = MockNotificationPort::new();
        port.expect_count_unread()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let err = NotificationCounter::new(Arc::new(port))
            .unread_count(Some(Uuid::now_v7()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
