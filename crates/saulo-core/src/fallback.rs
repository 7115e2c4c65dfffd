//! Locally generated replies for when the endpoint cannot answer.

use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::truncate_chars;

/// Characters of the user's message quoted back in a simulated reply.
pub const EXCERPT_LIMIT: usize = 50;

const PLACEHOLDER: &str = "{texto}";

const TEMPLATES: &[&str] = &[
    "He reflexionado sobre tu mensaje '{texto}' pero mi conexión ontológica tiene interferencia.",
    "Me hablas de '{texto}'. Antes de responder, dime: ¿qué es más real, tu pregunta o el ser que la formula?",
    "'{texto}'... Cada palabra es un ente que busca su fundamento. Hoy el mío me llega en silencio.",
    "Medito en '{texto}' mientras el servidor calla. Incluso la ausencia tiene estructura.",
];

/// Picks a template at random and answers after a "thinking" delay.
#[derive(Clone)]
pub struct FallbackResponder {
    rng: Arc<Mutex<StdRng>>,
    delay: Range<Duration>,
}

impl Default for FallbackResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackResponder {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic template choice and delay for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
            delay: Duration::from_millis(1000)..Duration::from_millis(2000),
        }
    }

    /// Replace the delay range. A range narrower than a millisecond waits exactly `delay.start`.
    pub fn with_delay(mut self, delay: Range<Duration>) -> Self {
        self.delay = delay;
        self
    }

    pub fn templates() -> &'static [&'static str] {
        TEMPLATES
    }

    pub async fn simulate(&self, user_text: &str) -> String {
        let (template, delay) = self.pick();
        tokio::time::sleep(delay).await;
        template.replace(PLACEHOLDER, &excerpt(user_text))
    }

    fn pick(&self) -> (&'static str, Duration) {
        // The lock is never held across an await.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let template = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
        // Whole milliseconds, matching the timer's resolution.
        let lo = self.delay.start.as_millis() as u64;
        let hi = self.delay.end.as_millis() as u64;
        let delay = if lo < hi {
            Duration::from_millis(rng.gen_range(lo..hi))
        } else {
            self.delay.start
        };
        (template, delay)
    }
}

fn excerpt(user_text: &str) -> String {
    truncate_chars(user_text.trim(), EXCERPT_LIMIT)
}
