//! Gene templates: the ordered `(time, region)` grid every gene-level entry of
//! one dataset has to reproduce.

use std::fmt;

use crate::error::{Result, TimecourseError};
use crate::timeaxis::TimeAxisDefinition;

// ------------- GeneTemplateEntry -------------
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneTemplateEntry {
    time: i32,
    region: Option<String>,
}

impl GeneTemplateEntry {
    pub fn new(time: i32, region: Option<String>) -> Self {
        Self { time, region }
    }
    pub fn time(&self) -> i32 {
        self.time
    }
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}
impl fmt::Display for GeneTemplateEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "({}, {})", self.time, region),
            None => write!(f, "({})", self.time),
        }
    }
}

/// Verifies that `candidate`, the template of gene `gene`, reproduces the
/// dataset's canonical template exactly: same length, same pairs, same order.
pub fn verify_template(
    canonical: &[GeneTemplateEntry],
    candidate: &[GeneTemplateEntry],
    gene: &str,
    axis: &TimeAxisDefinition,
) -> Result<()> {
    if candidate.is_empty() {
        return Err(empty_template(gene));
    }
    if let Some(index) = canonical.iter().zip(candidate).position(|(a, b)| a != b) {
        return Err(TimecourseError::mismatch(format!(
            "Gene '{gene}' point {} is {} but the dataset template expects {}",
            index + 1,
            axis.display_entry(&candidate[index]),
            axis.display_entry(&canonical[index]),
        )));
    }
    if canonical.len() != candidate.len() {
        return Err(TimecourseError::mismatch(format!(
            "Gene '{gene}' has {} time/region points but the dataset template has {}",
            candidate.len(),
            canonical.len(),
        )));
    }
    Ok(())
}

pub fn empty_template(gene: &str) -> TimecourseError {
    TimecourseError::mismatch(format!("Gene '{gene}' has no time/region data points"))
}
