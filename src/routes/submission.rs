use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

/// How many consumed tokens are remembered before the oldest are forgotten.
const REMEMBERED: usize = 4096;

#[derive(Default)]
struct Consumed {
    order: VecDeque<String>,
    tokens: HashSet<String>,
}

/// One-time tokens embedded in every rendered note form. A token is accepted
/// once, so a resent or double-clicked form does not create a second note.
#[derive(Clone, Default)]
pub struct SubmissionLedger {
    consumed: Arc<Mutex<Consumed>>,
}

impl SubmissionLedger {
    pub fn issue(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// `true` the first time a well-formed token is seen.
    pub fn consume(&self, token: &str) -> bool {
        if Uuid::parse_str(token).is_err() {
            return false;
        }

        let mut consumed = self.consumed.lock().unwrap_or_else(PoisonError::into_inner);
        if !consumed.tokens.insert(token.to_string()) {
            return false;
        }
        consumed.order.push_back(token.to_string());
        if consumed.order.len() > REMEMBERED {
            if let Some(oldest) = consumed.order.pop_front() {
                consumed.tokens.remove(&oldest);
            }
        }
        true
    }
}
