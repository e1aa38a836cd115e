use std::sync::Arc;

use tokio::time::Duration;
use tripdesk_core::intake::IntakeService;
use tripdesk_core::notify::Notifier;
use tripdesk_core::pii::Masked;
use tripdesk_core::repository::{AdminRepository, BookingRepository};

use crate::auth::AuthService;
use crate::middleware::LoginRateLimiter;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct LoginLimits {
    pub attempts: u32,
    pub window: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub intake: Arc<IntakeService>,
    pub auth: Arc<AuthService>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        admins: Arc<dyn AdminRepository>,
        notifier: Arc<dyn Notifier>,
        auth: AuthConfig,
        limits: LoginLimits,
    ) -> Self {
        Self {
            intake: Arc::new(IntakeService::new(bookings.clone(), notifier)),
            auth: Arc::new(AuthService::new(admins, auth)),
            login_limiter: Arc::new(LoginRateLimiter::new(limits.attempts, limits.window)),
            bookings,
        }
    }
}
