//! Environment rules from the config file
//!
//! Some environments cannot reproduce every case: a page that hangs the main
//! thread, an error log that depends on a favicon request. Skip rules opt
//! such cases out with a reason; relax rules strip the parts of an
//! expectation the environment cannot meet.

use serde_json::Value;

use crate::common::config::{Config, RelaxRule, SkipRule};

use super::definitions::{Expectation, ExpectedLhr, Test};
use super::runner::{ExpectationModifier, SkipPolicy};

/// Skip and relax rules, applied in file order
#[derive(Debug, Default, Clone)]
pub struct RuleSet {
    skip: Vec<SkipRule>,
    relax: Vec<RelaxRule>,
    /// Drop every expected artifact after the relax rules
    drop_artifacts: bool,
}

impl RuleSet {
    pub fn new(skip: Vec<SkipRule>, relax: Vec<RelaxRule>) -> Self {
        Self {
            skip,
            relax,
            drop_artifacts: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.skip.clone(), config.relax.clone())
    }

    pub fn has_skip_rules(&self) -> bool {
        !self.skip.is_empty()
    }

    /// Stop asserting artifacts for every case, for runs that gather none
    pub fn without_artifacts(mut self) -> Self {
        self.drop_artifacts = true;
        self
    }

    /// Whether [`ExpectationModifier::modify`] can change an expectation
    pub fn modifies_expectations(&self) -> bool {
        !self.relax.is_empty() || self.drop_artifacts
    }
}

impl SkipRule {
    fn matches(&self, test: &Test, expectation: &Expectation) -> bool {
        if self.url_contains.is_none() && self.test_id.is_none() {
            return false;
        }
        self.url_contains
            .as_deref()
            .map_or(true, |needle| expectation.requested_url().contains(needle))
            && self.test_id.as_deref().map_or(true, |id| test.id == id)
    }
}

impl RelaxRule {
    /// Unset selectors match anything, so a rule without any applies to
    /// every case. Config loading rejects such rules.
    fn matches(&self, test: &Test, expectation: &Expectation) -> bool {
        let url = expectation.requested_url();
        self.url.as_deref().map_or(true, |u| url == u)
            && self.url_contains.as_deref().map_or(true, |needle| url.contains(needle))
            && self.test_id.as_deref().map_or(true, |id| test.id == id)
    }

    fn apply(&self, expectation: &mut Expectation) {
        if !self.remove.is_empty() {
            match serde_json::to_value(&expectation.lhr) {
                Ok(mut lhr) => {
                    for pointer in &self.remove {
                        remove_pointer(&mut lhr, pointer);
                    }
                    match serde_json::from_value::<ExpectedLhr>(lhr) {
                        Ok(relaxed) => expectation.lhr = relaxed,
                        Err(e) => tracing::warn!(
                            url = %expectation.lhr.requested_url,
                            error = %e,
                            "Relax rule left an invalid expectation; ignoring it"
                        ),
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Could not serialize expectation"),
            }
        }
        if self.drop_artifacts {
            expectation.artifacts = None;
        }
    }
}

impl SkipPolicy for RuleSet {
    fn skip_reason(&self, test: &Test, expectation: &Expectation) -> Option<String> {
        self.skip
            .iter()
            .find(|rule| rule.matches(test, expectation))
            .map(|rule| rule.reason.clone())
    }
}

impl ExpectationModifier for RuleSet {
    fn modify(&self, test: &Test, expectation: &Expectation) -> Expectation {
        let mut relaxed = expectation.clone();
        for rule in self.relax.iter().filter(|rule| rule.matches(test, expectation)) {
            tracing::debug!(test = %test.id, url = expectation.requested_url(), "Relaxing expectation");
            rule.apply(&mut relaxed);
        }
        if self.drop_artifacts {
            relaxed.artifacts = None;
        }
        relaxed
    }
}

/// Remove the value at a JSON pointer; missing targets are ignored
fn remove_pointer(root: &mut Value, pointer: &str) -> Option<Value> {
    let (parent, last) = pointer.rsplit_once('/')?;
    let key = last.replace("~1", "/").replace("~0", "~");
    match root.pointer_mut(parent)? {
        Value::Object(map) => map.remove(&key),
        Value::Array(items) => {
            let index = key.parse::<usize>().ok().filter(|i| *i < items.len())?;
            Some(items.remove(index))
        }
        _ => None,
    }
}
