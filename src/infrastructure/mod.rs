pub mod alerts;
pub mod astronomy;
pub mod error;
pub mod geocoding_client;
pub mod location_provider;
pub mod logging;
pub mod manual_location_repository;
pub mod notification_gateway;
pub mod storage;
pub mod timezone_locator;
