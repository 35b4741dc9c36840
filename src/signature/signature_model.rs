use std::collections::BTreeSet;

use serde::Serialize;

use crate::tester::component_tester::TesterKind;

/// Declarative rule recognising one control family on a page.
///
/// A signature is satisfied when at least `min_matches` of its matcher
/// selectors match one or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub matchers: Vec<String>,
    pub min_matches: u32,
    pub tester: TesterKind,
}

impl Signature {
    /// Single selector, satisfied by any match.
    pub fn for_selector(name: &str, selector: &str, tester: TesterKind) -> Self {
        Self::for_selectors_min_match(name, &[selector], 1, tester)
    }

    /// Several selectors, satisfied when `min_matches` of them hit.
    ///
    /// `min_matches` is clamped to at least 1.
    pub fn for_selectors_min_match(
        name: &str,
        selectors: &[&str],
        min_matches: u32,
        tester: TesterKind,
    ) -> Self {
        Self {
            name: name.to_string(),
            matchers: selectors.iter().map(|s| s.to_string()).collect(),
            min_matches: min_matches.max(1),
            tester,
        }
    }
}

/// A signature that matched, with the element count summed over its matchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedSignature {
    pub name: String,
    pub tester: TesterKind,
    pub hits: u32,
}

/// Signatures satisfied by the current page snapshot.
///
/// Kept in catalog order so dispatch logs are reproducible, but compared
/// as a set of names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionResult {
    pub detected: Vec<DetectedSignature>,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.detected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detected.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.detected.iter().any(|d| d.name == name)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.detected.iter().map(|d| d.name.clone()).collect()
    }

    /// Insert unless a signature of the same name is already present.
    pub fn insert(&mut self, signature: DetectedSignature) {
        if !self.contains(&signature.name) {
            self.detected.push(signature);
        }
    }
}
