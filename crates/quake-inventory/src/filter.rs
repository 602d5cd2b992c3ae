//! Filter predicates over descriptor attributes
//!
//! A [`FilterSet`] is OR'd within an attribute name and AND'd across names:
//! `flavor=gpu,cpu` plus `flavor=arm` accepts any of the three flavors, and
//! adding `category=compute` additionally requires that category.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::types::{ResourceDescriptor, ResourceKind};

/// How a predicate compares attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// String equality
    #[default]
    Exact,
    /// Shell-style pattern (`*`, `?`, `[...]`)
    Glob,
}

/// Constraint on a single named attribute
#[derive(Debug, Clone)]
pub struct FilterPredicate {
    name: String,
    values: BTreeSet<String>,
    mode: MatchMode,
    patterns: Vec<Pattern>,
}

impl FilterPredicate {
    /// Predicate accepting any of `values` verbatim
    ///
    /// # Errors
    /// Returns `MalformedFilter` if the name is blank or no values are given.
    pub fn exact<I, S>(name: impl Into<String>, values: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(name.into(), values, MatchMode::Exact)
    }

    /// Predicate accepting values matching any of the glob `patterns`
    ///
    /// # Errors
    /// Returns `MalformedFilter` for a blank name or no values, and
    /// `InvalidPattern` if a pattern does not compile.
    pub fn glob<I, S>(name: impl Into<String>, patterns: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(name.into(), patterns, MatchMode::Glob)
    }

    fn build<I, S>(name: String, values: I, mode: MatchMode) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(InventoryError::MalformedFilter(
                "filter name is empty".to_string(),
            ));
        }

        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(InventoryError::MalformedFilter(format!(
                "filter `{name}` has no values"
            )));
        }

        let patterns = match mode {
            MatchMode::Exact => Vec::new(),
            MatchMode::Glob => values
                .iter()
                .map(|v| {
                    Pattern::new(v).map_err(|e| InventoryError::InvalidPattern {
                        attribute: name.clone(),
                        pattern: v.clone(),
                        reason: e.msg.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?,
        };

        Ok(Self {
            name,
            values,
            mode,
            patterns,
        })
    }

    /// Attribute this predicate constrains
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acceptable values (or patterns)
    #[must_use]
    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// Matching rule
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Test one attribute
    ///
    /// Vacuously true for attributes other than the one this predicate is
    /// scoped to.
    #[must_use]
    pub fn matches(&self, attribute_name: &str, attribute_value: &str) -> bool {
        if attribute_name != self.name {
            return true;
        }
        match self.mode {
            MatchMode::Exact => self.values.contains(attribute_value),
            MatchMode::Glob => self.patterns.iter().any(|p| p.matches(attribute_value)),
        }
    }
}

impl PartialEq for FilterPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values && self.mode == other.mode
    }
}

impl Eq for FilterPredicate {}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.mode {
            MatchMode::Exact => '=',
            MatchMode::Glob => '~',
        };
        let values: Vec<&str> = self.values.iter().map(String::as_str).collect();
        write!(f, "{}{op}{}", self.name, values.join(","))
    }
}

/// Parses `name=v1,v2` (exact) or `name~p1,p2` (glob)
impl FromStr for FilterPredicate {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (split, mode) = match (s.find('='), s.find('~')) {
            (Some(eq), Some(tilde)) if tilde < eq => (tilde, MatchMode::Glob),
            (Some(eq), _) => (eq, MatchMode::Exact),
            (None, Some(tilde)) => (tilde, MatchMode::Glob),
            (None, None) => {
                return Err(InventoryError::MalformedFilter(format!(
                    "expected name=value or name~pattern, got `{s}`"
                )));
            }
        };

        let name = &s[..split];
        let values = s[split + 1..]
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty());

        Self::build(name.to_string(), values, mode)
    }
}

/// Ordered collection of predicates
///
/// An empty set matches every descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    predicates: Vec<FilterPredicate>,
}

impl FilterSet {
    /// Empty filter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate
    #[must_use]
    pub fn with(mut self, predicate: FilterPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a predicate in place
    pub fn push(&mut self, predicate: FilterPredicate) {
        self.predicates.push(predicate);
    }

    /// Build from key/value query parameters
    ///
    /// Each pair becomes one exact predicate; repeated keys are OR'd.
    ///
    /// # Errors
    /// Returns `MalformedFilter` for a blank key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| FilterPredicate::exact(k, [v]))
            .collect::<Result<Vec<_>, _>>()
            .map(|predicates| Self { predicates })
    }

    /// Parse textual predicates (`name=v1,v2`, `name~pattern`)
    ///
    /// # Errors
    /// Returns the first parse failure.
    pub fn parse_all<I, S>(items: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items
            .into_iter()
            .map(|s| s.as_ref().parse::<FilterPredicate>())
            .collect::<Result<Vec<_>, _>>()
            .map(|predicates| Self { predicates })
    }

    /// Predicates in insertion order
    #[must_use]
    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }

    /// Check if the set has no predicates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Ensure every predicate names an attribute of `kind`
    ///
    /// # Errors
    /// Returns `InvalidFilter` naming the first unknown attribute.
    pub fn validate(&self, kind: ResourceKind) -> Result<(), InventoryError> {
        match self.predicates.iter().find(|p| !kind.has_attribute(p.name())) {
            Some(p) => Err(InventoryError::InvalidFilter {
                kind,
                attribute: p.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Predicates grouped by attribute name, in name order
    pub(crate) fn groups(&self) -> Vec<(&str, Vec<&FilterPredicate>)> {
        let mut groups: BTreeMap<&str, Vec<&FilterPredicate>> = BTreeMap::new();
        for p in &self.predicates {
            groups.entry(p.name()).or_default().push(p);
        }
        groups.into_iter().collect()
    }

    /// Test one descriptor
    ///
    /// Callers are expected to have run [`FilterSet::validate`] for the
    /// descriptor's kind; an attribute the descriptor lacks never matches.
    #[must_use]
    pub fn matches(&self, descriptor: &ResourceDescriptor) -> bool {
        matches_groups(&self.groups(), descriptor)
    }
}

/// OR within each name group, AND across groups
pub(crate) fn matches_groups(
    groups: &[(&str, Vec<&FilterPredicate>)],
    descriptor: &ResourceDescriptor,
) -> bool {
    groups.iter().all(|(name, group)| {
        descriptor
            .attribute(name)
            .is_some_and(|value| group.iter().any(|p| p.matches(name, &value)))
    })
}

impl FromIterator<FilterPredicate> for FilterSet {
    fn from_iter<T: IntoIterator<Item = FilterPredicate>>(iter: T) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}
