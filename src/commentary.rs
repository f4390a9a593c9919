//! Milestone commentary
//!
//! Text generation is slow and may fail, so every request runs on its own
//! thread and reports back through a channel the frame loop drains without
//! blocking. Failures never reach the caller; they become default lines.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use thiserror::Error;

/// Shown when the service fails
pub const FALLBACK_TEXT: &str = "Connection unstable. Override initiated.";
/// Shown when no service is configured
pub const OFFLINE_TEXT: &str = "System Online. Waiting for neural link...";
/// Shown when the service answers with nothing
pub const EMPTY_TEXT: &str = "Signal interrupted... keep moving!";

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("commentary service unavailable: {0}")]
    Unavailable(String),
    #[error("commentary request failed: {0}")]
    Request(String),
}

/// Generates a one-line cheer for a score. May block.
pub trait CommentaryService: Send + Sync {
    fn generate(&self, score: u32) -> Result<String, CommentaryError>;
}

/// Offline announcer with a fixed set of lines
#[derive(Debug, Clone)]
pub struct CannedCommentary {
    lines: Vec<&'static str>,
}

impl Default for CannedCommentary {
    fn default() -> Self {
        Self {
            lines: vec![
                "Nova moves, keep that chrome shining!",
                "Turbo reflexes detected, {score} and climbing!",
                "Glitched the grid for {score}, don't stop now!",
                "Chrome jaw, nova heart: {score} points of pure signal!",
                "{score}? The net is watching, choom. Go turbo!",
            ],
        }
    }
}

impl CommentaryService for CannedCommentary {
    fn generate(&self, score: u32) -> Result<String, CommentaryError> {
        if self.lines.is_empty() {
            return Err(CommentaryError::Unavailable("no lines".into()));
        }
        let line = self.lines[(score as usize / 10) % self.lines.len()];
        Ok(line.replace("{score}", &score.to_string()))
    }
}

/// A finished commentary request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commentary {
    /// Score the request was made for
    pub score: u32,
    pub text: String,
}

/// Runs commentary requests in the background
pub struct CommentaryDispatcher {
    service: Option<Arc<dyn CommentaryService>>,
    tx: Sender<Commentary>,
    rx: Receiver<Commentary>,
}

impl CommentaryDispatcher {
    pub fn new(service: Option<Arc<dyn CommentaryService>>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { service, tx, rx }
    }

    /// Fire a request and return immediately
    pub fn request(&self, score: u32) {
        let Some(service) = self.service.clone() else {
            log::warn!("No commentary service configured, using default text");
            let _ = self.tx.send(Commentary {
                score,
                text: OFFLINE_TEXT.to_string(),
            });
            return;
        };

        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("neon-pulse-commentary".into())
            .spawn(move || {
                let text = match catch_unwind(AssertUnwindSafe(|| service.generate(score))) {
                    Ok(Ok(text)) if !text.trim().is_empty() => text,
                    Ok(Ok(_)) => EMPTY_TEXT.to_string(),
                    Ok(Err(e)) => {
                        log::error!("Commentary error: {e}");
                        FALLBACK_TEXT.to_string()
                    }
                    Err(_) => {
                        log::error!("Commentary service panicked");
                        FALLBACK_TEXT.to_string()
                    }
                };
                // Receiver gone means the game shut down; nothing to do
                let _ = tx.send(Commentary { score, text });
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn commentary thread: {e}");
            let _ = self.tx.send(Commentary {
                score,
                text: FALLBACK_TEXT.to_string(),
            });
        }
    }

    /// Completed responses since the last poll, without blocking
    pub fn poll(&self) -> Vec<Commentary> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct Slow(Duration);
    impl CommentaryService for Slow {
        fn generate(&self, score: u32) -> Result<String, CommentaryError> {
            thread::sleep(self.0);
            Ok(format!("slow {score}"))
        }
    }

    struct Failing;
    impl CommentaryService for Failing {
        fn generate(&self, _score: u32) -> Result<String, CommentaryError> {
            Err(CommentaryError::Request("timeout".into()))
        }
    }

    struct Blank;
    impl CommentaryService for Blank {
        fn generate(&self, _score: u32) -> Result<String, CommentaryError> {
            Ok("   ".into())
        }
    }

    fn wait_for(dispatcher: &CommentaryDispatcher) -> Commentary {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(c) = dispatcher.poll().into_iter().next() {
                return c;
            }
            assert!(Instant::now() < deadline, "no commentary arrived");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_request_does_not_block() {
        let dispatcher =
            CommentaryDispatcher::new(Some(Arc::new(Slow(Duration::from_millis(300)))));
        let started = Instant::now();
        dispatcher.request(50);
        assert!(started.elapsed() < Duration::from_millis(150));
        assert!(dispatcher.poll().is_empty());
        assert_eq!(
            wait_for(&dispatcher),
            Commentary {
                score: 50,
                text: "slow 50".into()
            }
        );
    }

    #[test]
    fn test_failure_uses_fallback() {
        let dispatcher = CommentaryDispatcher::new(Some(Arc::new(Failing)));
        dispatcher.request(100);
        assert_eq!(wait_for(&dispatcher).text, FALLBACK_TEXT);
    }

    #[test]
    fn test_blank_uses_empty_text() {
        let dispatcher = CommentaryDispatcher::new(Some(Arc::new(Blank)));
        dispatcher.request(100);
        assert_eq!(wait_for(&dispatcher).text, EMPTY_TEXT);
    }

    #[test]
    fn test_missing_service() {
        let dispatcher = CommentaryDispatcher::new(None);
        dispatcher.request(50);
        assert_eq!(dispatcher.poll()[0].text, OFFLINE_TEXT);
    }

    #[test]
    fn test_canned_lines_mention_score() {
        let canned = CannedCommentary::default();
        let text = canned.generate(50).unwrap();
        assert!(!text.is_empty());
        assert!(!text.contains("{score}"));
        assert_ne!(canned.generate(50).unwrap(), canned.generate(60).unwrap());
    }
}
