use serde::{Deserialize, Serialize};

use crate::template::GeneTemplateEntry;

/// Describes how integer times are presented: either as numbered time points
/// with a unit suffix ("12h") or as indices into a list of named stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeAxisDefinition {
    pub named_stages: bool,
    pub units: String,
    pub stage_names: Vec<String>,
}

impl Default for TimeAxisDefinition {
    fn default() -> Self {
        Self {
            named_stages: false,
            units: String::from("h"),
            stage_names: Vec::new(),
        }
    }
}

impl TimeAxisDefinition {
    pub fn numeric(units: &str) -> Self {
        Self { named_stages: false, units: units.to_owned(), stage_names: Vec::new() }
    }
    pub fn staged(stage_names: Vec<String>) -> Self {
        Self { named_stages: true, units: String::new(), stage_names }
    }
    pub fn stage_name(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.stage_names.get(i))
            .map(String::as_str)
    }
    pub fn display_time(&self, time: i32) -> String {
        if self.named_stages {
            match self.stage_name(time) {
                Some(name) => name.to_owned(),
                // out of range stage indices still need to show up in messages
                None => format!("stage {time}"),
            }
        } else {
            format!("{time}{}", self.units)
        }
    }
    pub fn display_entry(&self, entry: &GeneTemplateEntry) -> String {
        match entry.region() {
            Some(region) => format!("({}, {})", self.display_time(entry.time()), region),
            None => format!("({})", self.display_time(entry.time())),
        }
    }
}
