//! Bounded cooldown pacing for rate-limited post fetches

use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug)]
pub struct CooldownExhausted;

impl std::fmt::Display for CooldownExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rate-limit cooldown attempts exhausted")
    }
}

impl std::error::Error for CooldownExhausted {}

/// Doubling cooldown with a delay cap and a hard attempt limit. The
/// provider's rate-limit signal is the only condition routed through
/// here; every other fetch error is terminal without retry.
#[derive(Debug)]
pub struct CooldownBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl CooldownBackoff {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
            attempt: 0,
        }
    }

    /// Sleep out the next cooldown, or report exhaustion once the
    /// attempt limit is reached.
    pub async fn cool_down(&mut self) -> Result<(), CooldownExhausted> {
        if self.attempt >= self.max_attempts {
            return Err(CooldownExhausted);
        }

        let delay = std::cmp::min(
            self.initial_delay.saturating_mul(2_u32.saturating_pow(self.attempt)),
            self.max_delay,
        );

        log::warn!(
            "⏳ Rate limited, cooling down {}s (attempt {} of {})",
            delay.as_secs(),
            self.attempt + 1,
            self.max_attempts
        );

        sleep(delay).await;
        self.attempt += 1;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let mut backoff =
            CooldownBackoff::new(Duration::from_millis(0), Duration::from_millis(0), 2);

        assert!(backoff.cool_down().await.is_ok());
        assert!(backoff.cool_down().await.is_ok());
        assert!(backoff.cool_down().await.is_err());
    }

    #[tokio::test]
    async fn test_reset_restores_attempts() {
        let mut backoff =
            CooldownBackoff::new(Duration::from_millis(0), Duration::from_millis(0), 1);

        assert!(backoff.cool_down().await.is_ok());
        assert!(backoff.cool_down().await.is_err());

        backoff.reset();
        assert!(backoff.cool_down().await.is_ok());
    }
}
