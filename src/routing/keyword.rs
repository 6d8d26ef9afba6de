use std::collections::BTreeMap;

use regex::RegexSet;
use serde_json::{Value, json};

use super::Router;
use crate::config::CoordinatorConfig;
use crate::dispatch::request::USER_QUERY_KEY;
use crate::dispatch::types::{JsonMap, RoutingDecision};
use crate::error::RouteError;

/// Role text copied into the decision payload for a specialist.
#[derive(Debug, Clone, Default)]
struct Profile {
    description: Option<String>,
    instructions: Option<String>,
}

/// Routes queries by case-insensitive whole-word keyword matches.
///
/// The specialist with the most matching keywords wins; ties go to the
/// specialist whose keyword pair comes first. [`KeywordRouter::from_config`]
/// lists specialists by name, so there a tie goes to the alphabetically first
/// name, whatever the file order. With no match the default specialist is
/// used, if any.
pub struct KeywordRouter {
    patterns: RegexSet,
    /// (specialist, keyword) for each pattern, same order as `patterns`.
    pattern_owners: Vec<(String, String)>,
    profiles: BTreeMap<String, Profile>,
    default_specialist: Option<String>,
}

impl KeywordRouter {
    /// Create a router from (specialist, keyword) pairs.
    /// The RegexSet is compiled once for efficient multi-pattern matching.
    pub fn new(
        keywords: &[(String, String)],
        default_specialist: Option<String>,
    ) -> Result<Self, regex::Error> {
        let regexes: Vec<String> = keywords
            .iter()
            .map(|(_, keyword)| format!(r"(?i)\b{}\b", regex::escape(keyword)))
            .collect();
        Ok(Self {
            patterns: RegexSet::new(&regexes)?,
            pattern_owners: keywords.to_vec(),
            profiles: BTreeMap::new(),
            default_specialist,
        })
    }

    pub fn from_config(config: &CoordinatorConfig) -> Result<Self, regex::Error> {
        let keywords: Vec<(String, String)> = config
            .specialists
            .values()
            .flat_map(|s| s.keywords.iter().map(|k| (s.name.clone(), k.clone())))
            .collect();

        let mut router = Self::new(&keywords, config.default_specialist.clone())?;
        router.profiles = config
            .specialists
            .values()
            .map(|s| {
                (
                    s.name.clone(),
                    Profile {
                        description: s.description.clone(),
                        instructions: s.instructions.clone(),
                    },
                )
            })
            .collect();
        Ok(router)
    }

    /// Pick a specialist and the keywords that selected it.
    fn select(&self, query: &str) -> Option<(String, Vec<String>)> {
        let mut hits: Vec<(&str, Vec<String>)> = Vec::new();
        for idx in self.patterns.matches(query).into_iter() {
            let (specialist, keyword) = &self.pattern_owners[idx];
            match hits.iter_mut().find(|(name, _)| *name == specialist.as_str()) {
                Some((_, matched)) => matched.push(keyword.clone()),
                None => hits.push((specialist.as_str(), vec![keyword.clone()])),
            }
        }

        // max_by_key keeps the last maximum, so iterate in reverse to keep the first.
        hits.into_iter()
            .rev()
            .max_by_key(|(_, matched)| matched.len())
            .map(|(name, matched)| (name.to_string(), matched))
    }
}

impl Router for KeywordRouter {
    fn route(&self, query: &str) -> Result<RoutingDecision, RouteError> {
        let (specialist, matched) = match self.select(query) {
            Some(selection) => selection,
            None => match &self.default_specialist {
                Some(default) => (default.clone(), Vec::new()),
                None => return Err(RouteError::NoSpecialist),
            },
        };

        tracing::debug!(
            specialist = %specialist,
            matched = ?matched,
            "Keyword routing decision"
        );

        let mut payload = JsonMap::new();
        payload.insert(USER_QUERY_KEY.to_string(), Value::String(query.to_string()));
        payload.insert("specialist".to_string(), Value::String(specialist.clone()));
        if let Some(profile) = self.profiles.get(&specialist) {
            if let Some(description) = &profile.description {
                payload.insert("description".to_string(), Value::String(description.clone()));
            }
            if let Some(instructions) = &profile.instructions {
                payload.insert("instructions".to_string(), Value::String(instructions.clone()));
            }
        }
        if !matched.is_empty() {
            payload.insert("context".to_string(), json!({ "matched_keywords": matched }));
        }

        Ok(RoutingDecision::new(specialist, payload))
    }
}
