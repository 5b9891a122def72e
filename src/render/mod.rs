pub mod surface;

use std::borrow::Cow;

use serde::Serialize;

use crate::student::StudentRecord;

pub use surface::{CardBuffer, RenderSurface};

pub const DEFAULT_IMAGE: &str = "/static/images/user.png";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkProtocol {
    Mailto,
    Tel,
}

impl LinkProtocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Mailto => "mailto",
            Self::Tel => "tel",
        }
    }

    pub fn href(self, value: &str) -> String {
        format!("{}:{}", self.scheme(), value)
    }
}

// one optional row of a card: which value, which icon, how to link it
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub icon: &'static str,
    pub protocol: Option<LinkProtocol>,
    pub select: for<'a> fn(&'a StudentRecord) -> Option<Cow<'a, str>>,
}

fn text(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

pub const FIELDS: [FieldDescriptor; 10] = [
    FieldDescriptor {
        key: "year",
        icon: "calendar",
        protocol: None,
        select: |s| text(&s.year),
    },
    FieldDescriptor {
        key: "leave",
        icon: "hourglass",
        protocol: None,
        select: |s| s.on_leave().then_some(Cow::Borrowed("On Leave")),
    },
    FieldDescriptor {
        key: "college",
        icon: "graduation-cap",
        protocol: None,
        select: |s| text(&s.college),
    },
    FieldDescriptor {
        key: "email",
        icon: "envelope",
        protocol: Some(LinkProtocol::Mailto),
        select: |s| text(&s.email),
    },
    FieldDescriptor {
        key: "residence",
        icon: "building",
        protocol: None,
        select: |s| text(&s.residence),
    },
    FieldDescriptor {
        key: "major",
        icon: "book",
        protocol: None,
        select: |s| text(&s.major),
    },
    FieldDescriptor {
        key: "phone",
        icon: "phone",
        protocol: Some(LinkProtocol::Tel),
        select: |s| text(&s.phone),
    },
    FieldDescriptor {
        key: "birthday",
        icon: "birthday-cake",
        protocol: None,
        select: |s| text(&s.birthday),
    },
    FieldDescriptor {
        key: "access_code",
        icon: "key",
        protocol: None,
        select: |s| text(&s.access_code),
    },
    FieldDescriptor {
        key: "address",
        icon: "home",
        protocol: None,
        select: |s| text(&s.address),
    },
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RowContent {
    Text { value: String },
    Lines { lines: Vec<String> },
    Link { href: String, text: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub key: &'static str,
    pub icon: &'static str,
    pub content: RowContent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pill {
    pub label: &'static str,
    pub value: String,
}

impl Pill {
    pub fn text(&self) -> String {
        format!("{} {}", self.label, self.value)
    }
}

/// Everything a surface needs to draw one student.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StudentCard {
    pub image: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_recording: Option<String>,
    pub pills: Vec<Pill>,
    pub rows: Vec<FieldRow>,
}

impl StudentCard {
    pub fn row(&self, key: &str) -> Option<&FieldRow> {
        self.rows.iter().find(|r| r.key == key)
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn render_row(descriptor: &FieldDescriptor, student: &StudentRecord) -> Option<FieldRow> {
    let value = (descriptor.select)(student).filter(|v| !v.is_empty())?;
    let content = if value.contains('\n') {
        RowContent::Lines {
            lines: value.split('\n').map(str::to_string).collect(),
        }
    } else if let Some(protocol) = descriptor.protocol {
        RowContent::Link {
            href: protocol.href(&value),
            text: value.into_owned(),
        }
    } else {
        RowContent::Text {
            value: value.into_owned(),
        }
    };
    Some(FieldRow {
        key: descriptor.key,
        icon: descriptor.icon,
        content,
    })
}

pub fn render_student(student: &StudentRecord) -> StudentCard {
    let mut pills = Vec::new();
    if let Some(netid) = present(&student.netid) {
        pills.push(Pill {
            label: "NetID",
            value: netid,
        });
    }
    if let Some(upi) = present(&student.upi) {
        pills.push(Pill {
            label: "UPI",
            value: upi,
        });
    }

    StudentCard {
        image: present(&student.image).unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        name: student.display_name(),
        phonetic_name: present(&student.phonetic_name),
        name_recording: present(&student.name_recording),
        pills,
        rows: FIELDS
            .iter()
            .filter_map(|d| render_row(d, student))
            .collect(),
    }
}
