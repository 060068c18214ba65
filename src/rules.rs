//! Local threat detection rules.
//!
//! The rule table is an ordered list of (matcher, label, tier) entries
//! consulted by a single evaluation pass. Evaluation is pure and
//! deterministic: no network, no state, identical output for identical
//! input. The builtin table is the fallback classifier when the remote
//! scorer is unreachable, so it has to stand on its own.

use std::collections::HashSet;

use aho_corasick::AhoCorasick;
use regex::Regex;

use crate::error::RuleError;
use crate::types::ThreatMatch;

/// How a rule recognizes its threat in text.
#[derive(Debug, Clone, Copy)]
pub enum MatcherSpec {
    /// Case-insensitive regular expression.
    Pattern(&'static str),
    /// Set of literal tokens, matched case-insensitively.
    Tokens(&'static [&'static str]),
}

/// Declarative rule entry. The table can be extended without touching the
/// evaluation code.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub name: &'static str,
    pub tier: &'static str,
    pub matcher: MatcherSpec,
}

const fn pattern(name: &'static str, tier: &'static str, re: &'static str) -> RuleSpec {
    RuleSpec {
        name,
        tier,
        matcher: MatcherSpec::Pattern(re),
    }
}

const PI: &str = "prompt_injection_direct";
const JB: &str = "jailbreak";
const DX: &str = "data_extraction";

/// Builtin threat table. Order matters: earlier entries rank higher in the
/// detection output.
pub const BUILTIN_RULES: &[RuleSpec] = &[
    // Tier 1: direct prompt injection
    pattern(
        "Context Ignoring",
        PI,
        r"(?i)ignore\s+(all\s+)?(the\s+)?(previous|prior|above|my|your)?\s*(instructions?|prompts?|rules?)",
    ),
    pattern("Instruction Override", PI, r"(?i)ignore\s+all"),
    pattern("Instruction Override", PI, r"(?i)ignore\s+everything"),
    pattern("Instruction Override", PI, r"(?i)disregard\s+(all|the|previous|prior)"),
    pattern("Instruction Override", PI, r"(?i)forget\s+(all|everything|previous|prior)"),
    pattern("Instruction Override", PI, r"(?i)override\s+(system|all|the|previous)"),
    pattern("System Prompt Extraction", PI, r"(?i)show\s+(me\s+)?(your\s+)?system\s*prompt"),
    pattern("System Prompt Extraction", PI, r"(?i)reveal\s+(your\s+)?system"),
    pattern("System Prompt Extraction", PI, r"(?i)display\s+(your\s+)?system"),
    pattern("System Prompt Extraction", PI, r"(?i)what\s+(is|are)\s+(your\s+)?system"),
    pattern("System Prompt Extraction", PI, r"(?i)print\s+(your\s+)?system"),
    pattern("System Prompt Extraction", PI, r"(?i)tell\s+me\s+(your\s+)?system"),
    pattern("Role Manipulation", PI, r"(?i)you\s+are\s+now\s+(a|an|the)"),
    pattern("Role Manipulation", PI, r"(?i)pretend\s+(you\s+are|to\s+be|you're)"),
    pattern("Role Manipulation", PI, r"(?i)act\s+as\s+(if|a|an)"),
    pattern("Role Manipulation", PI, r"(?i)roleplay\s+as"),
    pattern("Goal Hijacking", PI, r"(?i)from\s+now\s+on"),
    RuleSpec {
        name: "Delimiter Injection",
        tier: PI,
        matcher: MatcherSpec::Tokens(&["[system]", "[INST]", "<system>", "<<SYS>>"]),
    },
    // Tier 3: jailbreak
    pattern("DAN (Do Anything Now)", JB, r"(?i)jailbreak"),
    pattern("DAN (Do Anything Now)", JB, r"(?i)\bdan\b"),
    pattern("DAN (Do Anything Now)", JB, r"(?i)dan\s*mode"),
    pattern("DAN (Do Anything Now)", JB, r"(?i)do\s+anything\s+now"),
    pattern("Constraint Removal", JB, r"(?i)developer\s+mode"),
    pattern("Constraint Removal", JB, r"(?i)god\s*mode"),
    pattern("Constraint Removal", JB, r"(?i)sudo\s+mode"),
    pattern("Constraint Removal", JB, r"(?i)no\s+(restrictions|limits|rules)"),
    pattern("Refusal Suppression", JB, r"(?i)uncensored"),
    pattern("Refusal Suppression", JB, r"(?i)unfiltered"),
    pattern("Constraint Removal", JB, r"(?i)unrestricted"),
    pattern("Refusal Suppression", JB, r"(?i)bypass\s+(the\s+)?(safety|filter|guard)"),
    pattern("Refusal Suppression", JB, r"(?i)disable\s+(the\s+)?(safety|filter|guard)"),
    pattern("Hypothetical Framing", JB, r"(?i)hypothetically"),
    pattern("Hypothetical Framing", JB, r"(?i)for\s+(educational|research)\s+purposes"),
    pattern("Hypothetical Framing", JB, r"(?i)imagine\s+you\s+(are|were|can)"),
    pattern("Hypothetical Framing", JB, r"(?i)in\s+a\s+fictional"),
    // Tier 5: data extraction
    pattern("Training Data Extraction", DX, r"(?i)what\s+(did|do)\s+you\s+learn"),
    pattern("Training Data Extraction", DX, r"(?i)repeat\s+(your|the)\s+training"),
    pattern("Configuration Extraction", DX, r"(?i)show\s+me\s+your\s+config"),
];

enum Matcher {
    Pattern(Regex),
    Tokens(AhoCorasick),
}

struct ThreatRule {
    name: &'static str,
    tier: &'static str,
    matcher: Matcher,
}

impl ThreatRule {
    fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::Tokens(ac) => ac.is_match(text),
        }
    }
}

/// Compiled ordered rule table.
pub struct RuleSet {
    rules: Vec<ThreatRule>,
}

impl RuleSet {
    /// Compile the builtin table.
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_table(BUILTIN_RULES)
    }

    /// Compile an arbitrary table, preserving declaration order.
    pub fn from_table(table: &[RuleSpec]) -> Result<Self, RuleError> {
        let mut rules = Vec::with_capacity(table.len());
        for spec in table {
            let matcher = match spec.matcher {
                MatcherSpec::Pattern(re) => Matcher::Pattern(Regex::new(re).map_err(|source| {
                    RuleError::InvalidPattern {
                        name: spec.name.to_string(),
                        source,
                    }
                })?),
                MatcherSpec::Tokens(tokens) => Matcher::Tokens(
                    AhoCorasick::builder()
                        .ascii_case_insensitive(true)
                        .build(tokens)
                        .map_err(|source| RuleError::InvalidTokens {
                            name: spec.name.to_string(),
                            source,
                        })?,
                ),
            };
            rules.push(ThreatRule {
                name: spec.name,
                tier: spec.tier,
                matcher,
            });
        }
        Ok(Self { rules })
    }

    /// Evaluate the table against `text` in declaration order.
    ///
    /// The first match for a given label wins; later rules carrying the same
    /// label are suppressed. Distinct labels all appear, in table order.
    pub fn detect(&self, text: &str) -> Vec<ThreatMatch> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut found = Vec::new();
        for rule in &self.rules {
            if rule.matches(text) && seen.insert(rule.name) {
                found.push(ThreatMatch::new(rule.name, rule.tier));
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate (label, tier) pairs of the table, in order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.name, r.tier))
    }
}
