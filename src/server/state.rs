use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::mail::MailTransport;
use crate::ratelimit::RateLimiter;
use crate::template::EmailRenderer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub renderer: Arc<EmailRenderer>,
    pub mailer: Arc<dyn MailTransport>,
    pub rate_limiter: Arc<RateLimiter>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        renderer: Arc<EmailRenderer>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(settings.ratelimit.clone()));

        Self {
            settings: Arc::new(settings),
            renderer,
            mailer,
            rate_limiter,
            start_time: Instant::now(),
        }
    }
}
