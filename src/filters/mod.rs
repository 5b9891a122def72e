//! Checkbox state for the filter sidebar.
//!
//! Every section holds one "all" sentinel plus any number of named options.
//! The sentinel is checked exactly when no option is, and every toggle keeps
//! that true.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SENTINEL_SUFFIX: &str = "-all";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SectionDefinition {
    pub category: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOption {
    pub name: String,
    pub checked: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Checkbox {
    All,
    Option(usize),
}

// where a click inside a section landed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Background,
    Header,
    Control,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter section '{category}'")]
    UnknownSection { category: String },

    #[error("unknown option '{option}' in filter section '{category}'")]
    UnknownOption { category: String, option: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSection {
    category: String,
    all: bool,
    options: Vec<FilterOption>,
    collapsed: bool,
}

impl FilterSection {
    pub fn new<I, S>(category: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|name| FilterOption {
                name: name.into(),
                checked: false,
            })
            .collect();
        Self {
            category: category.into(),
            all: true,
            options,
            collapsed: false,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn sentinel_name(&self) -> String {
        format!("{}{}", self.category, SENTINEL_SUFFIX)
    }

    pub fn all_checked(&self) -> bool {
        self.all
    }

    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    pub fn checked_options(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .filter(|o| o.checked)
            .map(|o| o.name.as_str())
    }

    pub fn is_checked(&self, checkbox: Checkbox) -> bool {
        match checkbox {
            Checkbox::All => self.all,
            Checkbox::Option(idx) => self.options.get(idx).map(|o| o.checked).unwrap_or(false),
        }
    }

    pub fn reset(&mut self) {
        self.all = true;
        for option in self.options.iter_mut() {
            option.checked = false;
        }
    }

    /// Resolve a checkbox by name. The sentinel answers to both `all` and
    /// `<category>-all`; options match case-insensitively.
    pub fn locate(&self, name: &str) -> Result<Checkbox, FilterError> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("all") || name == self.sentinel_name() {
            return Ok(Checkbox::All);
        }
        self.options
            .iter()
            .position(|o| o.name.eq_ignore_ascii_case(name))
            .map(Checkbox::Option)
            .ok_or_else(|| FilterError::UnknownOption {
                category: self.category.clone(),
                option: name.to_string(),
            })
    }

    /// Apply a change event. Setting a checkbox to the value it already has
    /// is not a change and does nothing.
    pub fn toggle(&mut self, checkbox: Checkbox, checked: bool) {
        if self.is_checked(checkbox) == checked {
            return;
        }
        match checkbox {
            Checkbox::All => {
                if !checked && self.options.is_empty() {
                    return;
                }
                self.all = checked;
                for option in self.options.iter_mut() {
                    option.checked = !checked;
                }
            }
            Checkbox::Option(idx) => {
                let Some(option) = self.options.get_mut(idx) else {
                    return;
                };
                option.checked = checked;
                if checked {
                    self.all = false;
                } else {
                    self.all = !self.options.iter().any(|o| o.checked);
                }
            }
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.all != self.options.iter().any(|o| o.checked)
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Header and background clicks fold the section; clicks on its
    /// checkboxes do not. Returns the collapsed state afterwards.
    pub fn click(&mut self, target: ClickTarget) -> bool {
        match target {
            ClickTarget::Background | ClickTarget::Header => self.collapsed = !self.collapsed,
            ClickTarget::Control => {}
        }
        self.collapsed
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterPanel {
    sections: Vec<FilterSection>,
}

impl FilterPanel {
    pub fn new(sections: Vec<FilterSection>) -> Self {
        let mut panel = Self { sections };
        panel.reset();
        panel
    }

    pub fn from_definitions(definitions: &[SectionDefinition]) -> Self {
        Self::new(
            definitions
                .iter()
                .map(|d| FilterSection::new(d.category.trim(), d.options.iter().cloned()))
                .collect(),
        )
    }

    pub fn sections(&self) -> &[FilterSection] {
        &self.sections
    }

    pub fn section(&self, category: &str) -> Result<&FilterSection, FilterError> {
        self.sections
            .iter()
            .find(|s| s.category.eq_ignore_ascii_case(category.trim()))
            .ok_or_else(|| FilterError::UnknownSection {
                category: category.trim().to_string(),
            })
    }

    pub fn section_mut(&mut self, category: &str) -> Result<&mut FilterSection, FilterError> {
        self.sections
            .iter_mut()
            .find(|s| s.category.eq_ignore_ascii_case(category.trim()))
            .ok_or_else(|| FilterError::UnknownSection {
                category: category.trim().to_string(),
            })
    }

    pub fn reset(&mut self) {
        for section in self.sections.iter_mut() {
            section.reset();
        }
    }

    pub fn set(&mut self, category: &str, name: &str, checked: bool) -> Result<(), FilterError> {
        let section = self.section_mut(category)?;
        let checkbox = section.locate(name)?;
        section.toggle(checkbox, checked);
        Ok(())
    }

    pub fn click(&mut self, category: &str, target: ClickTarget) -> Result<bool, FilterError> {
        Ok(self.section_mut(category)?.click(target))
    }
}

const COLLEGES: [&str; 14] = [
    "Benjamin Franklin",
    "Berkeley",
    "Branford",
    "Davenport",
    "Ezra Stiles",
    "Grace Hopper",
    "Jonathan Edwards",
    "Morse",
    "Pauli Murray",
    "Pierson",
    "Saybrook",
    "Silliman",
    "Timothy Dwight",
    "Trumbull",
];

pub fn default_sections() -> Vec<SectionDefinition> {
    vec![
        SectionDefinition {
            category: "college".to_string(),
            options: COLLEGES.iter().map(|c| c.to_string()).collect(),
        },
        SectionDefinition {
            category: "year".to_string(),
            options: ["2021", "2022", "2023", "2024"]
                .iter()
                .map(|y| y.to_string())
                .collect(),
        },
        SectionDefinition {
            category: "leave".to_string(),
            options: vec!["Yes".to_string(), "No".to_string()],
        },
    ]
}
