use serde::Deserialize;
use std::fmt;

/// Contents of `.deepshift.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShiftConfig {
    /// Directory names excluded at any depth, on top of `.git` and `node_modules`.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Consult git ignore rules when the root is a repository.
    #[serde(default = "default_vcs_ignore")]
    pub vcs_ignore: bool,
}

fn default_vcs_ignore() -> bool {
    true
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            vcs_ignore: default_vcs_ignore(),
        }
    }
}

impl ShiftConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for entry in &self.exclude {
            if entry.trim().is_empty() {
                issues.push(ValidationIssue::EmptyExclude);
            } else if entry.contains('/') || entry.contains('\\') {
                issues.push(ValidationIssue::ExcludeNotAName {
                    entry: entry.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyExclude,
    ExcludeNotAName { entry: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyExclude => write!(f, "exclude entries must not be empty"),
            ValidationIssue::ExcludeNotAName { entry } => write!(
                f,
                "exclude entry '{entry}' must be a directory name, not a path"
            ),
        }
    }
}
