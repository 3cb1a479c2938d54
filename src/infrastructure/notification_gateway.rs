use crate::domain::models::NotificationRequest;
use std::collections::HashMap;
use std::sync::Mutex;

// Requests are keyed by the prayer identifier, so scheduling the same prayer
// twice overwrites rather than duplicates. Delivery itself is the host
// platform's job.
pub trait NotificationGateway: Send + Sync {
    fn schedule(&self, request: &NotificationRequest);
    fn cancel_all(&self);
    fn pending(&self) -> Vec<NotificationRequest>;
}

#[derive(Debug, Default)]
pub struct InMemoryNotificationGateway {
    requests: Mutex<HashMap<&'static str, NotificationRequest>>,
}

impl NotificationGateway for InMemoryNotificationGateway {
    fn schedule(&self, request: &NotificationRequest) {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        requests.insert(request.prayer.name(), request.clone());
    }

    fn cancel_all(&self) {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        requests.clear();
    }

    fn pending(&self) -> Vec<NotificationRequest> {
        let requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut pending: Vec<NotificationRequest> = requests.values().cloned().collect();
        pending.sort_by_key(|request| request.fire_at);
        pending
    }
}
