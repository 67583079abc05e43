// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Dependency path acceptors.
//!
//! An acceptor decides whether a path between two words counts as a semantic
//! relation. The template acceptors follow the Minipar tag set and come in
//! three tiers of increasing coverage; every tier first defers to the tier
//! below it, so whatever `Minimum` accepts, `Medium` and `Maximum` accept too.
//!
//! Templates are written `POS:REL:POS[,POS:REL:POS...]`. A path is rendered
//! three ways before the set lookup: with its actual tags, with the first tag
//! replaced by [`WILDCARD`], and with the last tag replaced by [`WILDCARD`].
//! At most one boundary is wildcarded per rendering and interior tags are
//! always literal.

use std::{collections::HashSet, fmt, str::FromStr, sync::OnceLock};

use serde::{Deserialize, Serialize};

use crate::{error::SpaceError, path::DependencyPath};

/// Tag placeholder in templates. Minipar also emits it for untagged tokens.
pub const WILDCARD: &str = "(null)";

/// Relation ceiling for the universal acceptor when none is given.
pub const DEFAULT_UNIVERSAL_MAX_RELATIONS: usize = 4;

/// Filter over candidate dependency paths. Never fails; bad input is `false`.
pub trait PathAcceptor: Send + Sync {
    fn accepts(&self, path: &DependencyPath) -> bool;

    /// Longest acceptable path in nodes (relations + 1). Callers may use it
    /// to bound their path search; longer paths are simply rejected.
    fn max_path_length(&self) -> usize;
}

const MINIMUM_TEMPLATES: &[&str] = &[
    "A:mod:N",
    "A:subj:N",
    "N:conj:N",
    "N:gen:N",
    "N:mod:A",
    "N:mod:Pred",
    "N:mod:Prep",
    "N:nn:N",
    "N:obj:V",
    "N:subj:A",
    "N:subj:V",
    "Pred:mod:N",
    "Prep:mod:N",
    "V:obj:N",
    "V:subj:N",
    "(null):lex-mod:N",
    "N:lex-mod:(null)",
];

const MEDIUM_TEMPLATES: &[&str] = &[
    "A:mod:N,N:lex-mod:(null)",
    "A:mod:N,N:nn:N",
    "A:subj:N,N:lex-mod:(null)",
    "A:subj:N,N:nn:N",
    "N:conj:N,N:lex-mod:(null)",
    "N:conj:N,N:nn:N",
    "N:gen:N,N:lex-mod:(null)",
    "N:gen:N,N:nn:N",
    "N:nn:N,N:conj:N",
    "N:nn:N,N:conj:N,N:nn:N",
    "N:nn:N,N:gen:N",
    "N:nn:N,N:gen:N,N:nn:N",
    "N:nn:N,N:mod:A",
    "N:nn:N,N:mod:Pred",
    "N:nn:N,N:obj:V",
    "N:nn:N,N:subj:A",
    "N:nn:N,N:subj:V",
    "(null):lex-mod:N,N:conj:N",
    "(null):lex-mod:N,N:conj:N,N:lex-mod:(null)",
    "(null):lex-mod:N,N:gen:N",
    "(null):lex-mod:N,N:gen:N,N:lex-mod:(null)",
    "(null):lex-mod:N,N:mod:A",
    "(null):lex-mod:N,N:mod:Pred",
    "(null):lex-mod:N,N:obj:V",
    "(null):lex-mod:N,N:subj:A",
    "(null):lex-mod:N,N:subj:V",
    "Prep:mod:N,N:lex-mod:(null)",
    "Prep:mod:N,N:nn:N",
    "V:obj:N,N:lex-mod:(null)",
    "V:obj:N,N:nn:N",
    "V:subj:N,N:lex-mod:(null)",
    "V:subj:N,N:nn:N",
];

const MAXIMUM_TEMPLATES: &[&str] = &[
    "N:subj:V,V:obj:N",
    "N:obj:V,V:subj:N",
    "V:subj:N,N:conj:N",
    "V:obj:N,N:conj:N",
    "N:conj:N,N:subj:V",
    "N:conj:N,N:obj:V",
    "N:mod:Prep,Prep:pcomp-n:N",
    "N:pcomp-n:Prep,Prep:mod:N",
    "V:mod:Prep,Prep:pcomp-n:N",
    "N:pcomp-n:Prep,Prep:mod:V",
    "A:mod:N,N:subj:V",
    "A:mod:N,N:obj:V",
    "V:subj:N,N:mod:A",
    "V:obj:N,N:mod:A",
    "N:subj:V,V:obj:N,N:nn:N",
    "N:nn:N,N:subj:V,V:obj:N",
    "N:obj:V,V:subj:N,N:nn:N",
    "N:nn:N,N:obj:V,V:subj:N",
    "N:mod:Prep,Prep:pcomp-n:N,N:nn:N",
    "N:nn:N,N:mod:Prep,Prep:pcomp-n:N",
    "(null):lex-mod:N,N:subj:V,V:obj:N",
    "N:subj:V,V:obj:N,N:lex-mod:(null)",
    "(null):lex-mod:N,N:mod:Prep,Prep:pcomp-n:N",
    "N:nn:N,N:subj:V,V:obj:N,N:nn:N",
    "N:nn:N,N:obj:V,V:subj:N,N:nn:N",
    "N:nn:N,N:conj:N,N:conj:N,N:nn:N",
    "(null):lex-mod:N,N:subj:V,V:obj:N,N:lex-mod:(null)",
    "N:nn:N,N:mod:Prep,Prep:pcomp-n:N,N:nn:N",
];

static MINIMUM_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
static MEDIUM_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
static MAXIMUM_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Coverage tier of the Minipar template acceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateTier {
    Minimum,
    Medium,
    Maximum,
}

impl TemplateTier {
    /// Longest path this tier's templates describe, in relations.
    #[must_use]
    pub const fn max_relations(self) -> usize {
        match self {
            Self::Minimum => 1,
            Self::Medium => 3,
            Self::Maximum => 4,
        }
    }

    /// The tier this one defers to before checking its own templates.
    #[must_use]
    pub const fn smaller(self) -> Option<Self> {
        match self {
            Self::Minimum => None,
            Self::Medium => Some(Self::Minimum),
            Self::Maximum => Some(Self::Medium),
        }
    }

    /// This tier's own templates, excluding those inherited from smaller tiers.
    pub fn templates(self) -> &'static HashSet<&'static str> {
        let (cell, source) = match self {
            Self::Minimum => (&MINIMUM_SET, MINIMUM_TEMPLATES),
            Self::Medium => (&MEDIUM_SET, MEDIUM_TEMPLATES),
            Self::Maximum => (&MAXIMUM_SET, MAXIMUM_TEMPLATES),
        };
        cell.get_or_init(|| source.iter().copied().collect())
    }

    #[must_use]
    pub fn accepts(self, path: &DependencyPath) -> bool {
        if self.smaller().is_some_and(|smaller| smaller.accepts(path)) {
            return true;
        }
        if path.length() > self.max_relations() {
            return false;
        }
        let Some(patterns) = PathPatterns::render(path) else {
            return false;
        };
        let templates = self.templates();
        templates.contains(patterns.exact.as_str())
            || templates.contains(patterns.start_wildcard.as_str())
            || templates.contains(patterns.end_wildcard.as_str())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Medium => "medium",
            Self::Maximum => "maximum",
        }
    }
}

/// The three comparable renderings of one path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathPatterns {
    exact: String,
    start_wildcard: String,
    end_wildcard: String,
}

impl PathPatterns {
    /// `None` for empty paths and for paths through a filtered token.
    fn render(path: &DependencyPath) -> Option<Self> {
        let length = path.length();
        if length == 0 || path.has_filtered_node() {
            return None;
        }

        let nodes = path.nodes();
        let mut exact = String::with_capacity(length * 16);
        let mut start_wildcard = String::with_capacity(length * 16);
        let mut end_wildcard = String::with_capacity(length * 16);

        for (i, relation) in path.relations().iter().enumerate() {
            if i > 0 {
                exact.push(',');
                start_wildcard.push(',');
                end_wildcard.push(',');
            }
            let head = nodes[i].pos.as_str();
            let tail = nodes[i + 1].pos.as_str();

            push_segment(&mut exact, head, relation, tail);
            push_segment(
                &mut start_wildcard,
                if i == 0 { WILDCARD } else { head },
                relation,
                tail,
            );
            push_segment(
                &mut end_wildcard,
                head,
                relation,
                if i + 1 == length { WILDCARD } else { tail },
            );
        }

        Some(Self {
            exact,
            start_wildcard,
            end_wildcard,
        })
    }
}

fn push_segment(out: &mut String, head: &str, relation: &str, tail: &str) {
    out.push_str(head);
    out.push(':');
    out.push_str(relation);
    out.push(':');
    out.push_str(tail);
}

/// Accepts paths matching one Minipar template tier (or any smaller tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateAcceptor {
    tier: TemplateTier,
}

impl TemplateAcceptor {
    #[must_use]
    pub const fn new(tier: TemplateTier) -> Self {
        Self { tier }
    }

    #[must_use]
    pub const fn minimum() -> Self {
        Self::new(TemplateTier::Minimum)
    }

    #[must_use]
    pub const fn medium() -> Self {
        Self::new(TemplateTier::Medium)
    }

    #[must_use]
    pub const fn maximum() -> Self {
        Self::new(TemplateTier::Maximum)
    }

    #[must_use]
    pub const fn tier(&self) -> TemplateTier {
        self.tier
    }
}

impl PathAcceptor for TemplateAcceptor {
    fn accepts(&self, path: &DependencyPath) -> bool {
        self.tier.accepts(path)
    }

    fn max_path_length(&self) -> usize {
        self.tier.max_relations() + 1
    }
}

/// Accepts any non-empty, unfiltered path up to a relation ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniversalPathAcceptor {
    max_relations: usize,
}

impl UniversalPathAcceptor {
    #[must_use]
    pub const fn new(max_relations: usize) -> Self {
        Self { max_relations }
    }
}

impl Default for UniversalPathAcceptor {
    fn default() -> Self {
        Self::new(DEFAULT_UNIVERSAL_MAX_RELATIONS)
    }
}

impl PathAcceptor for UniversalPathAcceptor {
    fn accepts(&self, path: &DependencyPath) -> bool {
        !path.is_empty() && path.length() <= self.max_relations && !path.has_filtered_node()
    }

    fn max_path_length(&self) -> usize {
        self.max_relations + 1
    }
}

/// Construction-time acceptor choice, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptorTier {
    Universal,
    Minimum,
    #[default]
    Medium,
    Maximum,
}

impl AcceptorTier {
    #[must_use]
    pub fn build(self) -> Box<dyn PathAcceptor> {
        match self {
            Self::Universal => Box::new(UniversalPathAcceptor::default()),
            Self::Minimum => Box::new(TemplateAcceptor::minimum()),
            Self::Medium => Box::new(TemplateAcceptor::medium()),
            Self::Maximum => Box::new(TemplateAcceptor::maximum()),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Universal => "universal",
            Self::Minimum => "minimum",
            Self::Medium => "medium",
            Self::Maximum => "maximum",
        }
    }
}

impl fmt::Display for AcceptorTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcceptorTier {
    type Err = SpaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "universal" => Ok(Self::Universal),
            "minimum" | "min" => Ok(Self::Minimum),
            "medium" | "med" => Ok(Self::Medium),
            "maximum" | "max" => Ok(Self::Maximum),
            other => Err(SpaceError::UnknownTier(other.to_string())),
        }
    }
}
