//! Knowledge base: response buckets keyed by intent.
//!
//! Loaded once at startup from a JSON document and validated so that every
//! intent the resolver can produce has a non-empty bucket. Read-only afterwards
//! and shared across sessions as `Arc<KnowledgeBase>`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::chat::intent::Intent;

/// Reference data shipped with the binary.
const EMBEDDED_KNOWLEDGE: &str = include_str!("../../data/knowledge_base.json");

/// Bucket name used for the fallback responses in error messages.
const DEFAULTS_BUCKET: &str = "default";

/// On-disk shape of a knowledge base.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeDocument {
    pub greetings: HashMap<String, Vec<String>>,
    pub topics: HashMap<String, Vec<String>>,
    pub defaults: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Greetings,
    Topics,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Greetings => f.write_str("greetings"),
            Table::Topics => f.write_str("topics"),
        }
    }
}

impl Table {
    /// Table that must hold the bucket for `intent`. `None` for `default`,
    /// which is served from the flat defaults list.
    fn for_intent(intent: Intent) -> Option<Table> {
        match intent {
            Intent::Default => None,
            Intent::Hello | Intent::Help => Some(Table::Greetings),
            _ => Some(Table::Topics),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum KnowledgeError {
    #[error("Invalid knowledge base document: {0}")]
    Parse(String),

    #[error("Unknown bucket '{key}' in {table}")]
    UnknownBucket { table: Table, key: String },

    #[error("Bucket '{key}' does not belong in {table}")]
    MisplacedBucket { table: Table, key: String },

    #[error("Missing required bucket '{0}'")]
    MissingBucket(String),

    #[error("Bucket '{0}' is empty")]
    EmptyBucket(String),
}

/// Validated, immutable response buckets.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    topics: HashMap<Intent, Vec<String>>,
    greetings: HashMap<Intent, Vec<String>>,
    defaults: Vec<String>,
}

impl KnowledgeBase {
    /// The reference knowledge base compiled into the binary.
    pub fn embedded() -> Result<Self, KnowledgeError> {
        Self::from_json(EMBEDDED_KNOWLEDGE)
    }

    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let document: KnowledgeDocument =
            serde_json::from_str(json).map_err(|e| KnowledgeError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    /// Builds a knowledge base, rejecting unknown, misplaced, missing or empty buckets.
    pub fn from_document(document: KnowledgeDocument) -> Result<Self, KnowledgeError> {
        let greetings = index_table(Table::Greetings, document.greetings)?;
        let topics = index_table(Table::Topics, document.topics)?;

        for intent in Intent::all() {
            let table = match Table::for_intent(intent) {
                Some(Table::Greetings) => &greetings,
                Some(Table::Topics) => &topics,
                None => continue,
            };
            if !table.contains_key(&intent) {
                return Err(KnowledgeError::MissingBucket(intent.name().into_owned()));
            }
        }

        if document.defaults.is_empty() {
            return Err(KnowledgeError::EmptyBucket(DEFAULTS_BUCKET.to_string()));
        }

        Ok(Self {
            topics,
            greetings,
            defaults: document.defaults,
        })
    }

    /// Loads the override file at `path` if given, otherwise the embedded data.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let knowledge = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read knowledge base '{}'", path.display())
                })?;
                Self::from_json(&json)
                    .with_context(|| format!("Invalid knowledge base '{}'", path.display()))?
            }
            None => Self::embedded().context("Embedded knowledge base is invalid")?,
        };

        let source = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string());
        info!(
            topics = knowledge.topics.len(),
            greetings = knowledge.greetings.len(),
            defaults = knowledge.defaults.len(),
            %source,
            "Knowledge base loaded"
        );
        Ok(knowledge)
    }

    /// Topic, company, question and capabilities buckets.
    pub fn topic(&self, intent: Intent) -> Option<&[String]> {
        self.topics.get(&intent).map(Vec::as_slice)
    }

    pub fn greeting(&self, intent: Intent) -> Option<&[String]> {
        self.greetings.get(&intent).map(Vec::as_slice)
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }
}

fn index_table(
    table: Table,
    buckets: HashMap<String, Vec<String>>,
) -> Result<HashMap<Intent, Vec<String>>, KnowledgeError> {
    buckets
        .into_iter()
        .map(|(key, responses)| {
            let intent: Intent = key.parse().map_err(|_| KnowledgeError::UnknownBucket {
                table,
                key: key.clone(),
            })?;
            if Table::for_intent(intent) != Some(table) {
                return Err(KnowledgeError::MisplacedBucket { table, key });
            }
            if responses.is_empty() {
                return Err(KnowledgeError::EmptyBucket(key));
            }
            Ok((intent, responses))
        })
        .collect()
}

#[cfg(test)]
impl KnowledgeBase {
    /// Drops a bucket after validation, to exercise the selector's failure path.
    pub(crate) fn without_bucket(mut self, intent: Intent) -> Self {
        self.topics.remove(&intent);
        self.greetings.remove(&intent);
        self
    }
}
