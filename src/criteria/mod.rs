use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filters::FilterPanel;

// categories whose options are sent as booleans rather than names
const BOOLEAN_CATEGORY: &str = "leave";
const BOOLEAN_TRUE_OPTION: &str = "Yes";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Name(String),
}

/// Request body of `POST /api/students`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilterCriteria {
    pub query: String,
    pub filters: BTreeMap<String, Vec<FilterValue>>,
    pub page: u32,
}

impl FilterCriteria {
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.query.is_empty() && self.filters.is_empty()
    }
}

/// Snapshot the query box and checkbox panel into fresh criteria. Sections
/// with their sentinel checked put no restriction on the search.
pub fn build_criteria(query: &str, panel: &FilterPanel) -> FilterCriteria {
    let mut filters = BTreeMap::new();
    for section in panel.sections() {
        if section.all_checked() {
            continue;
        }
        let category = section.category();
        let values = section
            .checked_options()
            .map(|name| {
                if category == BOOLEAN_CATEGORY {
                    FilterValue::Flag(name == BOOLEAN_TRUE_OPTION)
                } else {
                    FilterValue::Name(name.to_string())
                }
            })
            .collect();
        filters.insert(category.to_string(), values);
    }
    FilterCriteria {
        query: query.to_string(),
        filters,
        page: 0,
    }
}
