use serde::{Deserialize, Deserializer, Serialize};

// one entry of the search API response
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StudentRecord {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub netid: Option<String>,
    #[serde(default)]
    pub upi: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub year: Option<String>,
    #[serde(default)]
    pub leave: Option<bool>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phonetic_name: Option<String>,
    #[serde(default)]
    pub name_recording: Option<String>,
}

impl StudentRecord {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    pub fn on_leave(&self) -> bool {
        self.leave.unwrap_or(false)
    }
}

// the server sends class years as integers, older dumps carry them as strings
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(0)) => None,
        Some(Raw::Number(n)) => Some(n.to_string()),
        Some(Raw::Text(s)) => Some(s),
        None => None,
    })
}
