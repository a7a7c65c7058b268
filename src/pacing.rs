use async_trait::async_trait;
use rand::Rng;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Remembers requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingPacer {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(delay);
    }
}

pub fn uniform_delay<R: Rng + ?Sized>(rng: &mut R, lo_secs: f64, hi_secs: f64) -> Duration {
    if hi_secs <= lo_secs {
        return Duration::from_secs_f64(lo_secs.max(0.0));
    }
    Duration::from_secs_f64(rng.gen_range(lo_secs..=hi_secs))
}

pub fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
