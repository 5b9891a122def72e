use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::filters::SectionDefinition;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "api_url")]
    pub url: Option<String>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub page_size: Option<usize>,
    pub max_pages: Option<u32>,
    pub viewport_rows: Option<usize>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
    pub sections: Option<Vec<SectionDefinition>>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".studentdir").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|e| e.to_string())
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# studentdir config
#
# Location (default):
#   ~/.studentdir/config.yml

# Directory server (the client posts to <url>/api/students)
url: http://localhost:5000/

# HTTP (optional)
timeout: 10
# proxy: http://127.0.0.1:8080
# header: "Cookie: session=..."

# Paging
page_size: 20
# Pages to load in batch mode (0 = until the directory runs out)
max_pages: 1
# Terminal rows used to decide when to prefetch in interactive mode
viewport_rows: 40

# Output (optional)
# output: ./students.html
# output_format: html
no_color: false

# Filter sections. Every section also gets an "all" checkbox.
sections:
  - category: college
    options:
      - Benjamin Franklin
      - Berkeley
      - Branford
      - Davenport
      - Ezra Stiles
      - Grace Hopper
      - Jonathan Edwards
      - Morse
      - Pauli Murray
      - Pierson
      - Saybrook
      - Silliman
      - Timothy Dwight
      - Trumbull
  - category: year
    options: ["2021", "2022", "2023", "2024"]
  - category: leave
    options: ["Yes", "No"]
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}
