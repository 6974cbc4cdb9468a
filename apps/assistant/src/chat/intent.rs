//! Intent model: the closed set of topics a user turn can resolve to.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Suffix appended to a company name for its example-question variant.
pub const QUESTIONS_SUFFIX: &str = "Questions";

/// Employers with dedicated interview material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Company {
    Google,
    Amazon,
    Microsoft,
    Facebook,
    Apple,
}

impl Company {
    /// Detection order. The first company whose name appears in the text wins.
    pub const ALL: [Company; 5] = [
        Company::Google,
        Company::Amazon,
        Company::Microsoft,
        Company::Facebook,
        Company::Apple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Company::Google => "google",
            Company::Amazon => "amazon",
            Company::Microsoft => "microsoft",
            Company::Facebook => "facebook",
            Company::Apple => "apple",
        }
    }

    /// Substrings that count as a mention of this company.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Company::Google => &["google"],
            Company::Amazon => &["amazon"],
            Company::Microsoft => &["microsoft"],
            Company::Facebook => &["facebook", "meta"],
            Company::Apple => &["apple"],
        }
    }

    /// Substring detection against the roster. `lower` must already be lowercased.
    ///
    /// Only one company is expected per utterance. When several are named,
    /// the earliest entry in [`Company::ALL`] wins, not the earliest in the text.
    pub fn find_in(lower: &str) -> Option<Company> {
        Company::ALL
            .into_iter()
            .find(|company| company.aliases().iter().any(|alias| lower.contains(alias)))
    }
}

/// The classified topic of one user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Intent {
    Capabilities,
    Hello,
    Help,
    Default,
    Resume,
    Interview,
    Skills,
    JobSearch,
    Preparation,
    Company(Company),
    CompanyQuestions(Company),
}

impl Intent {
    pub const TOPICS: [Intent; 5] = [
        Intent::Resume,
        Intent::Interview,
        Intent::Skills,
        Intent::JobSearch,
        Intent::Preparation,
    ];

    /// Every member of the closed intent set.
    pub fn all() -> impl Iterator<Item = Intent> {
        [Intent::Capabilities, Intent::Hello, Intent::Help, Intent::Default]
            .into_iter()
            .chain(Intent::TOPICS)
            .chain(Company::ALL.into_iter().map(Intent::Company))
            .chain(Company::ALL.into_iter().map(Intent::CompanyQuestions))
    }

    /// Wire name. Only the `*Questions` variants allocate.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Intent::CompanyQuestions(c) => Cow::Owned(format!("{}{QUESTIONS_SUFFIX}", c.as_str())),
            other => Cow::Borrowed(other.fixed_name()),
        }
    }

    fn fixed_name(&self) -> &'static str {
        match self {
            Intent::Capabilities => "capabilities",
            Intent::Hello => "hello",
            Intent::Help => "help",
            Intent::Default => "default",
            Intent::Resume => "resume",
            Intent::Interview => "interview",
            Intent::Skills => "skills",
            Intent::JobSearch => "jobSearch",
            Intent::Preparation => "preparation",
            Intent::Company(c) | Intent::CompanyQuestions(c) => c.as_str(),
        }
    }

    pub fn is_greeting(&self) -> bool {
        matches!(self, Intent::Hello | Intent::Help)
    }

    /// Whether the transcript labels an assistant reply with this intent.
    pub fn is_tagged(&self) -> bool {
        !matches!(self, Intent::Default | Intent::Hello | Intent::Help)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fixed_name())?;
        if let Intent::CompanyQuestions(_) = self {
            f.write_str(QUESTIONS_SUFFIX)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown intent name '{0}'")]
pub struct ParseIntentError(pub String);

impl FromStr for Intent {
    type Err = ParseIntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let intent = match s {
            "capabilities" => Intent::Capabilities,
            "hello" => Intent::Hello,
            "help" => Intent::Help,
            "default" => Intent::Default,
            "resume" => Intent::Resume,
            "interview" => Intent::Interview,
            "skills" => Intent::Skills,
            "jobSearch" => Intent::JobSearch,
            "preparation" => Intent::Preparation,
            other => {
                let (base, questions) = match other.strip_suffix(QUESTIONS_SUFFIX) {
                    Some(base) => (base, true),
                    None => (other, false),
                };
                let company = Company::ALL
                    .into_iter()
                    .find(|c| c.as_str() == base)
                    .ok_or_else(|| ParseIntentError(s.to_string()))?;
                if questions {
                    Intent::CompanyQuestions(company)
                } else {
                    Intent::Company(company)
                }
            }
        };
        Ok(intent)
    }
}

impl TryFrom<String> for Intent {
    type Error = ParseIntentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Intent> for String {
    fn from(intent: Intent) -> Self {
        intent.name().into_owned()
    }
}
