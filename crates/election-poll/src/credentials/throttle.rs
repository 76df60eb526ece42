use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket awaited before every outbound send.
#[derive(Debug)]
pub struct Throttle {
    capacity: f64,
    refill_interval: Duration,
    bucket: Option<Mutex<Bucket>>,
}

impl Throttle {
    /// `capacity` sends may burst; one token returns every `refill_interval`.
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        if refill_interval.is_zero() {
            return Self::unthrottled();
        }
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            refill_interval,
            bucket: Some(Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            })),
        }
    }

    pub fn unthrottled() -> Self {
        Self {
            capacity: f64::INFINITY,
            refill_interval: Duration::ZERO,
            bucket: None,
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };

        loop {
            let wait = {
                let mut bucket = bucket.lock().await;
                self.refill(&mut bucket);
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                self.refill_interval.mul_f64(1.0 - bucket.tokens)
            };
            sleep(wait).await;
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        let earned = elapsed / self.refill_interval.as_secs_f64();
        // absorb float drift so a full interval always yields a whole token
        bucket.tokens = (bucket.tokens + earned + 1e-9).min(self.capacity);
    }
}
