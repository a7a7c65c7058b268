//! Paced like/comment loop for a fanpage.
//!
//! Only the timing is exercised: each action is a log line followed by a
//! randomized pause. Nothing is sent to the platform.

use crate::config::Config;
use crate::error::ConfigError;
use crate::log::Log;
use crate::pacing::{Pacer, uniform_delay};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;

pub const DEFAULT_LIKES: usize = 200;
pub const DEFAULT_COMMENTS: usize = 50;

const LIKE_DELAY_SECS: (f64, f64) = (30.0, 60.0);
const BREAK_DELAY_SECS: (f64, f64) = (300.0, 600.0);
const BREAK_EVERY: usize = 50;
const COMMENT_DELAY_SECS: (f64, f64) = (120.0, 300.0);

pub const COMMENTS: &[&str] = &["🔥", "Incredible", "Wow", "🎬"];

pub struct EngagementBot<'a> {
    fanpage: u32,
    // Checked at startup; no request ever carries it.
    _api_key: String,
    pacer: &'a dyn Pacer,
    rng: StdRng,
    log: Log,
}

impl<'a> EngagementBot<'a> {
    pub fn new(
        cfg: &Config,
        fanpage: u32,
        pacer: &'a dyn Pacer,
        rng: StdRng,
        log: Log,
    ) -> Result<Self, ConfigError> {
        let api_key = cfg.fanpage_key(fanpage)?.to_string();
        log.info(format!("Bot initialised for fanpage {}", fanpage));
        Ok(Self {
            fanpage,
            _api_key: api_key,
            pacer,
            rng,
            log,
        })
    }

    pub fn fanpage(&self) -> u32 {
        self.fanpage
    }

    fn like_delay(&mut self, i: usize) -> (Duration, bool) {
        if i > 0 && i % BREAK_EVERY == 0 {
            (uniform_delay(&mut self.rng, BREAK_DELAY_SECS.0, BREAK_DELAY_SECS.1), true)
        } else {
            (uniform_delay(&mut self.rng, LIKE_DELAY_SECS.0, LIKE_DELAY_SECS.1), false)
        }
    }

    pub async fn run_likes(&mut self, count: usize) {
        self.log.info(format!("Like loop: {} likes", count));

        for i in 0..count {
            self.log.info(format!("Like {}/{}", i + 1, count));

            let (delay, is_break) = self.like_delay(i);
            if is_break {
                self.log
                    .info(format!("Taking a break: {:.1} min", delay.as_secs_f64() / 60.0));
            }
            self.pacer.pause(delay).await;
        }

        self.log.ok("Like loop complete");
    }

    pub async fn run_comments(&mut self, count: usize) {
        for i in 0..count {
            let comment = COMMENTS.choose(&mut self.rng).copied().unwrap_or(COMMENTS[0]);
            self.log.info(format!("Comment {}: {}", i + 1, comment));
            let delay = uniform_delay(&mut self.rng, COMMENT_DELAY_SECS.0, COMMENT_DELAY_SECS.1);
            self.pacer.pause(delay).await;
        }

        self.log.ok(format!("{} comments done", count));
    }
}
