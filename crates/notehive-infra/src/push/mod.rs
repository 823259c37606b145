mod fcm;
mod service;

pub use fcm::{is_permanent_error_code, FcmMessage, FcmNotification, FcmResponse, FcmResult};
pub use service::{DeliveryOutcome, PushService, PushServiceConfig};
