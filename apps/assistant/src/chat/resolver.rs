//! Intent Resolver: maps one utterance plus the prior turn's intent to an intent.
//!
//! The resolver is an ordered cascade of guard rules. The first rule that fires
//! decides the intent and every later rule is skipped, so rule order is the
//! contract: reordering `RULES` changes behaviour.
//!
//! Pure and total. No I/O, no shared state; conversation memory arrives as an
//! explicit `Option<Intent>`.

use tracing::trace;

use crate::chat::intent::{Company, Intent};

const CAPABILITY_PHRASES: &[&str] = &[
    "what can you do",
    "how can you help",
    "what do you do",
    "capabilities",
];
const CAPABILITY_EXACT: &[&str] = &["help", "help me"];

const HELLO_EXACT: &[&str] = &["hi", "hello", "hey", "greetings"];
const HELLO_PHRASES: &[&str] = &[
    "hello",
    "hi there",
    "good morning",
    "good afternoon",
    "good evening",
];
const HELP_EXACT: &[&str] = &["help"];
const HELP_PHRASES: &[&str] = &[
    "how can you help",
    "what can you do",
    "help me",
    "what do you do",
    "how do you help",
    "what can you help with",
];

const QUESTION_KEYWORDS: &[&str] = &["question", "ask", "what should i expect", "example"];
const INTERVIEW_KEYWORD: &str = "interview";
const RESUME_KEYWORDS: &[&str] = &["resume", "cv", "portfolio", "template", "format"];
const SKILL_KEYWORDS: &[&str] = &[
    "skill",
    "learn",
    "knowledge",
    "ability",
    "certification",
    "project",
];
const JOB_SEARCH_KEYWORDS: &[&str] = &[
    "job",
    "apply",
    "application",
    "career",
    "company",
    "opportunity",
    "position",
    "search",
];
const PREPARATION_KEYWORDS: &[&str] = &[
    "prepare",
    "preparation",
    "ready",
    "plan",
    "strategy",
    "approach",
];

/// Follow-ups shorter than this many tokens inherit the open topic.
const CARRY_OVER_MAX_TOKENS: usize = 4;

/// One turn as seen by the rules: normalized text and the prior intent.
struct Turn {
    text: String,
    last_intent: Option<Intent>,
}

impl Turn {
    fn new(utterance: &str, last_intent: Option<Intent>) -> Self {
        Self {
            text: utterance.trim().to_lowercase(),
            last_intent,
        }
    }

    fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.text.contains(n))
    }

    fn equals_any(&self, candidates: &[&str]) -> bool {
        candidates.iter().any(|c| self.text == *c)
    }

    fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

type Rule = fn(&Turn) -> Option<Intent>;

/// The cascade, highest precedence first.
const RULES: &[(&str, Rule)] = &[
    ("capability_query", capability_query),
    ("greeting", greeting),
    ("question_request", question_request),
    ("interview", interview),
    ("resume", resume),
    ("skills", skills),
    ("job_search", job_search),
    ("preparation", preparation),
    ("company_repeat", company_repeat),
    ("carry_over", carry_over),
];

/// Resolves the intent of `utterance` given the previous turn's intent.
///
/// Always returns a member of the closed intent set; unmatched input
/// resolves to [`Intent::Default`].
pub fn resolve(utterance: &str, last_intent: Option<Intent>) -> Intent {
    let turn = Turn::new(utterance, last_intent);
    RULES
        .iter()
        .find_map(|(name, rule)| {
            rule(&turn).inspect(|intent| trace!(rule = *name, %intent, "resolver rule fired"))
        })
        .unwrap_or(Intent::Default)
}

/// Greeting family of a normalized text, if it reads as a greeting at all.
///
/// Hello-style greetings are checked before help-style ones.
fn greeting_kind(turn: &Turn) -> Option<Intent> {
    if turn.equals_any(HELLO_EXACT) || turn.contains_any(HELLO_PHRASES) {
        return Some(Intent::Hello);
    }
    if turn.equals_any(HELP_EXACT) || turn.contains_any(HELP_PHRASES) {
        return Some(Intent::Help);
    }
    None
}

fn capability_query(turn: &Turn) -> Option<Intent> {
    (turn.contains_any(CAPABILITY_PHRASES) || turn.equals_any(CAPABILITY_EXACT))
        .then_some(Intent::Capabilities)
}

fn greeting(turn: &Turn) -> Option<Intent> {
    if turn.last_intent.is_some() {
        return None;
    }
    greeting_kind(turn)
}

/// Only a bare company intent carries its company into a question request.
/// A prior `*Questions` intent does not.
fn question_request(turn: &Turn) -> Option<Intent> {
    if !turn.contains_any(QUESTION_KEYWORDS) {
        return None;
    }
    let carried = match turn.last_intent {
        Some(Intent::Company(company)) => Some(company),
        _ => None,
    };
    let intent = match Company::find_in(&turn.text).or(carried) {
        Some(company) => Intent::CompanyQuestions(company),
        None => Intent::Interview,
    };
    Some(intent)
}

fn interview(turn: &Turn) -> Option<Intent> {
    if !turn.text.contains(INTERVIEW_KEYWORD) {
        return None;
    }
    let intent = Company::find_in(&turn.text)
        .map(Intent::Company)
        .unwrap_or(Intent::Interview);
    Some(intent)
}

fn resume(turn: &Turn) -> Option<Intent> {
    turn.contains_any(RESUME_KEYWORDS).then_some(Intent::Resume)
}

fn skills(turn: &Turn) -> Option<Intent> {
    turn.contains_any(SKILL_KEYWORDS).then_some(Intent::Skills)
}

fn job_search(turn: &Turn) -> Option<Intent> {
    turn.contains_any(JOB_SEARCH_KEYWORDS)
        .then_some(Intent::JobSearch)
}

fn preparation(turn: &Turn) -> Option<Intent> {
    turn.contains_any(PREPARATION_KEYWORDS)
        .then_some(Intent::Preparation)
}

fn company_repeat(turn: &Turn) -> Option<Intent> {
    match turn.last_intent {
        Some(last) if last != Intent::Default => Company::find_in(&turn.text).map(Intent::Company),
        _ => None,
    }
}

/// Short, non-greeting follow-ups keep the open topic. Blank input never does.
fn carry_over(turn: &Turn) -> Option<Intent> {
    let last = turn.last_intent?;
    if last == Intent::Default || last.is_greeting() {
        return None;
    }
    let tokens = turn.token_count();
    if tokens == 0 || tokens >= CARRY_OVER_MAX_TOKENS || greeting_kind(turn).is_some() {
        return None;
    }
    Some(last)
}
