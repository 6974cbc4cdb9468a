//! Response Selector: picks the reply text for a resolved intent.
//!
//! Bucket choice is deterministic. The only randomness is the index inside the
//! bucket, which comes from an injected [`IndexPicker`].

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::chat::intent::{Company, Intent};
use crate::chat::knowledge::KnowledgeBase;

/// Chooses a position inside a bucket of `len` candidates (`len > 0`).
pub trait IndexPicker: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Uniform picker over a seedable `StdRng`.
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl RandomPicker {
    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl IndexPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        self.rng.lock().random_range(0..len)
    }
}

/// Always answers with the same index.
#[cfg(test)]
pub struct FixedPicker(pub usize);

#[cfg(test)]
impl IndexPicker for FixedPicker {
    fn pick(&self, _len: usize) -> usize {
        self.0
    }
}

/// A bucket was requested that the knowledge base does not hold.
/// Always a configuration defect, never a user-input problem.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("No response bucket for intent '{0}'")]
pub struct UnknownIntentError(pub Intent);

#[derive(Clone)]
pub struct Responder {
    knowledge: Arc<KnowledgeBase>,
    picker: Arc<dyn IndexPicker>,
}

impl Responder {
    pub fn new(knowledge: Arc<KnowledgeBase>, picker: Arc<dyn IndexPicker>) -> Self {
        Self { knowledge, picker }
    }

    /// Selects the reply for `intent`.
    ///
    /// Dispatch order:
    /// 1. `capabilities` and greetings use their own buckets
    /// 2. `*Questions` intents use their question bucket
    /// 3. an utterance mentioning "interview" and a company uses that company's bucket
    /// 4. `default` uses the fallback list
    /// 5. everything else uses the intent's topic bucket
    pub fn respond(&self, intent: Intent, utterance: &str) -> Result<&str, UnknownIntentError> {
        let bucket = match intent {
            Intent::Capabilities => self.topic(intent)?,
            Intent::Hello | Intent::Help => self
                .knowledge
                .greeting(intent)
                .ok_or(UnknownIntentError(intent))?,
            Intent::CompanyQuestions(_) => self.topic(intent)?,
            _ => match interview_company(utterance) {
                Some(company) => self.topic(Intent::Company(company))?,
                None if intent == Intent::Default => self.knowledge.defaults(),
                None => self.topic(intent)?,
            },
        };
        Ok(self.choose(bucket))
    }

    fn topic(&self, intent: Intent) -> Result<&[String], UnknownIntentError> {
        self.knowledge
            .topic(intent)
            .ok_or(UnknownIntentError(intent))
    }

    fn choose<'a>(&self, bucket: &'a [String]) -> &'a str {
        // Validated buckets are never empty.
        let index = self.picker.pick(bucket.len()) % bucket.len();
        &bucket[index]
    }
}

/// Company named in an utterance that also mentions an interview.
fn interview_company(utterance: &str) -> Option<Company> {
    let lower = utterance.to_lowercase();
    if !lower.contains("interview") {
        return None;
    }
    Company::find_in(&lower)
}
