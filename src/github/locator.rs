//! Validated identity wrappers for the values a request targets.
//!
//! Every constructor enforces the format GitHub itself accepts, so a value of
//! one of these types can be interpolated into an API path without further
//! checks.

use std::fmt;

use lazy_regex::regex_is_match;
use thiserror::Error;

/// Reason a raw value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValueError(pub &'static str);

const MAX_REF_LENGTH: usize = 255;
const MAX_PATH_LENGTH: usize = 4096;
const MAX_TOKEN_LENGTH: usize = 1024;

/// Repository owner (a GitHub login).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    /// Validates a GitHub login: alphanumerics and hyphens, at most 39
    /// characters, not starting with a hyphen.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the value is empty or not a valid login.
    pub fn new(value: &str) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError("must not be empty"));
        }
        if !regex_is_match!(r"^[A-Za-z0-9][A-Za-z0-9-]{0,38}$", value) {
            return Err(ValueError("must be a valid GitHub username"));
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Compares against a GitHub login the way GitHub does: ignoring ASCII
    /// case.
    #[must_use]
    pub fn matches_login(&self, login: &str) -> bool {
        self.0.eq_ignore_ascii_case(login)
    }
}

/// Repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Validates a repository name.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the name is empty, too long, contains
    /// characters GitHub rejects, or is a dot path.
    pub fn new(value: &str) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError("must not be empty"));
        }
        if value == "." || value == ".." || !regex_is_match!(r"^[A-Za-z0-9._-]{1,100}$", value) {
            return Err(ValueError("must be a valid repository name"));
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// An `owner/name` pair identifying one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    owner: RepositoryOwner,
    name: RepositoryName,
}

impl RepositoryRef {
    /// Creates a repository reference from validated parts.
    #[must_use]
    pub const fn new(owner: RepositoryOwner, name: RepositoryName) -> Self {
        Self { owner, name }
    }

    /// Parses both parts.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValueError`] from either part.
    pub fn parse(owner: &str, name: &str) -> Result<Self, ValueError> {
        Ok(Self::new(RepositoryOwner::new(owner)?, RepositoryName::new(name)?))
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn name(&self) -> &RepositoryName {
        &self.name
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.owner.as_str(), self.name.as_str())
    }
}

/// A git reference name: a branch, a tag, or a commit SHA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefName(String);

impl RefName {
    /// Validates a reference name against git's `check-ref-format` rules.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] describing the first rule the name breaks.
    pub fn new(value: &str) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError("must not be empty"));
        }
        if value.len() > MAX_REF_LENGTH {
            return Err(ValueError("must be at most 255 characters"));
        }
        if value == "@" {
            return Err(ValueError("must not be '@'"));
        }
        if value.starts_with('-') || value.starts_with('/') {
            return Err(ValueError("must not start with '-' or '/'"));
        }
        if value.ends_with('/') || value.ends_with('.') || value.ends_with(".lock") {
            return Err(ValueError("must not end with '/', '.' or '.lock'"));
        }
        if value.contains("..") || value.contains("//") || value.contains("@{") {
            return Err(ValueError("must not contain '..', '//' or '@{'"));
        }
        if value.split('/').any(|component| component.starts_with('.')) {
            return Err(ValueError("path components must not start with '.'"));
        }
        let forbidden = |character: char| {
            character.is_ascii_control()
                || matches!(character, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\')
        };
        if value.chars().any(forbidden) {
            return Err(ValueError("contains characters git does not allow"));
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the reference name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Path inside a repository; empty means the repository root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPath(String);

impl ContentPath {
    /// Normalises surrounding slashes and rejects traversal.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] for over-long paths, control characters, empty
    /// or `.`/`..` segments.
    pub fn new(value: &str) -> Result<Self, ValueError> {
        if value.len() > MAX_PATH_LENGTH {
            return Err(ValueError("must be at most 4096 characters"));
        }
        if value.chars().any(char::is_control) {
            return Err(ValueError("must not contain control characters"));
        }
        let trimmed = value.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        if trimmed
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(ValueError("must not contain empty, '.' or '..' segments"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the normalised path.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this is the repository root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

/// Caller-supplied GitHub credential used for the outbound calls.
///
/// The `Debug` output is redacted so the token never reaches a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderToken(String);

impl ProviderToken {
    /// Validates that the token is present and plausibly sized.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the token is blank or longer than 1024
    /// characters.
    pub fn new(token: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError("is required"));
        }
        if trimmed.len() > MAX_TOKEN_LENGTH {
            return Err(ValueError("must be at most 1024 characters"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the raw token for building an authenticated client.
    #[must_use]
    pub const fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ProviderToken(<redacted>)")
    }
}
