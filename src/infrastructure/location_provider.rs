use crate::domain::models::Coordinates;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Authorized,
    Denied,
    Restricted,
}

pub trait LocationObserver: Send + Sync {
    fn on_fix(&self, coordinates: Coordinates);
    fn on_failure(&self, reason: &str);
    fn on_authorization_changed(&self, status: AuthorizationStatus);
}

// Device positioning is platform-owned; the engine only ever sees it through
// this port. The resolver subscribes exactly once at startup.
pub trait DeviceLocationProvider: Send + Sync {
    fn subscribe(&self, observer: Arc<dyn LocationObserver>);
    fn authorization_status(&self) -> AuthorizationStatus;
    fn request_fix(&self);
    fn request_permission(&self);
}
