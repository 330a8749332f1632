//! Retry policy: decides whether a failed action goes back into the queue.

/// Outcome of one failed sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep the action queued with the incremented counter.
    Requeue { retries: u32 },

    /// Give up; the action is removed and reported.
    Drop { reason: String },
}

/// Bounded retry counter.
///
/// `retries` counts failed attempts so far. An action whose attempt fails
/// while `retries < max_retries` is requeued with `retries + 1`; otherwise it
/// is dropped. With the default ceiling of 3 an action gets four attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn decide(&self, retries: u32) -> RetryDecision {
        if retries < self.max_retries {
            RetryDecision::Requeue {
                retries: retries + 1,
            }
        } else {
            RetryDecision::Drop {
                reason: format!("failed after {retries} retries"),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
