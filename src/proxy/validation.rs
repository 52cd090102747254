//! Declarative validation of untyped JSON request bodies.
//!
//! Each endpoint declares an ordered schema of [`FieldRule`]s. [`validate`]
//! evaluates every rule, collecting all violations rather than stopping at the
//! first, and produces a [`ValidatedBody`] whose typed accessors the endpoint
//! reads its request from. The `provider_token` rule is appended to every
//! schema.

use std::collections::HashMap;
use std::iter;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::ProxyError;
use crate::github::locator::{
    ContentPath, ProviderToken, RefName, RepositoryName, RepositoryOwner, RepositoryRef,
    ValueError,
};

/// Field holding the caller's GitHub credential.
pub const PROVIDER_TOKEN_FIELD: &str = "provider_token";

const PROVIDER_TOKEN_RULE: FieldRule =
    FieldRule::required(PROVIDER_TOKEN_FIELD, FieldKind::ProviderToken);

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Name of the offending field, or `body` for the document itself.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Format a field must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// GitHub login.
    Owner,
    /// Repository name.
    Repository,
    /// Path inside a repository; empty means the root.
    ContentPath,
    /// Git reference; an empty string counts as absent.
    Ref,
    /// Branch name.
    Branch,
    /// Provider credential.
    ProviderToken,
    /// Free text up to `max_chars` characters.
    Text {
        /// Maximum length in characters.
        max_chars: usize,
    },
    /// Empty, or an absolute `http`/`https` URL.
    Homepage,
    /// Boolean.
    Flag,
}

/// A named field, its format, and whether it must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// JSON member name.
    pub name: &'static str,
    /// Expected format.
    pub kind: FieldKind,
    /// Whether absence (or `null`) is a violation.
    pub required: bool,
}

impl FieldRule {
    /// A field that must be present.
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// A field that may be omitted or `null`.
    #[must_use]
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone)]
enum FieldValue {
    Owner(RepositoryOwner),
    Repository(RepositoryName),
    Path(ContentPath),
    Ref(RefName),
    Token(ProviderToken),
    Text(String),
    Flag(bool),
}

/// A body that satisfied its schema, with every supplied field typed.
#[derive(Debug, Clone, Default)]
pub struct ValidatedBody {
    values: HashMap<&'static str, FieldValue>,
}

impl ValidatedBody {
    /// The `owner`/`repo` pair.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Unexpected`] when the schema did not declare
    /// both fields.
    pub fn repository(&self) -> Result<RepositoryRef, ProxyError> {
        let owner = match self.values.get("owner") {
            Some(FieldValue::Owner(owner)) => owner.clone(),
            _ => return Err(undeclared("owner")),
        };
        let name = self
            .repository_name("repo")
            .ok_or_else(|| undeclared("repo"))?;
        Ok(RepositoryRef::new(owner, name))
    }

    /// The caller's provider token.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Unexpected`] if the token is somehow absent.
    pub fn provider_token(&self) -> Result<ProviderToken, ProxyError> {
        match self.values.get(PROVIDER_TOKEN_FIELD) {
            Some(FieldValue::Token(token)) => Ok(token.clone()),
            _ => Err(undeclared(PROVIDER_TOKEN_FIELD)),
        }
    }

    /// A required reference or branch field.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Unexpected`] when the field was not declared as
    /// required.
    pub fn ref_name(&self, field: &'static str) -> Result<RefName, ProxyError> {
        self.optional_ref(field).ok_or_else(|| undeclared(field))
    }

    /// An optional reference or branch field.
    #[must_use]
    pub fn optional_ref(&self, field: &str) -> Option<RefName> {
        match self.values.get(field) {
            Some(FieldValue::Ref(reference)) => Some(reference.clone()),
            _ => None,
        }
    }

    /// A content path field, defaulting to the repository root.
    #[must_use]
    pub fn content_path(&self, field: &str) -> ContentPath {
        match self.values.get(field) {
            Some(FieldValue::Path(path)) => path.clone(),
            _ => ContentPath::default(),
        }
    }

    /// An optional repository name field.
    #[must_use]
    pub fn repository_name(&self, field: &str) -> Option<RepositoryName> {
        match self.values.get(field) {
            Some(FieldValue::Repository(name)) => Some(name.clone()),
            _ => None,
        }
    }

    /// An optional text or homepage field.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field) {
            Some(FieldValue::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// An optional boolean field.
    #[must_use]
    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.values.get(field) {
            Some(FieldValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }
}

fn undeclared(field: &str) -> ProxyError {
    ProxyError::unexpected(format!("validated body has no `{field}` field"))
}

/// Validates `body` against `schema` plus the provider token rule.
///
/// Members not named by any rule are ignored.
///
/// # Errors
///
/// Returns [`ProxyError::Validation`] listing every violation, in schema
/// order, when the body is not a JSON object or any rule fails.
pub fn validate(body: &[u8], schema: &[FieldRule]) -> Result<ValidatedBody, ProxyError> {
    let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) else {
        return Err(ProxyError::Validation(vec![FieldViolation::new(
            "body",
            "must be a JSON object",
        )]));
    };

    let mut validated = ValidatedBody::default();
    let mut violations = Vec::new();
    for rule in schema.iter().chain(iter::once(&PROVIDER_TOKEN_RULE)) {
        match check(rule, &object) {
            Ok(Some(value)) => {
                validated.values.insert(rule.name, value);
            }
            Ok(None) => {}
            Err(message) => violations.push(FieldViolation::new(rule.name, message)),
        }
    }

    if violations.is_empty() {
        Ok(validated)
    } else {
        tracing::debug!(?violations, "request body rejected");
        Err(ProxyError::Validation(violations))
    }
}

fn check(rule: &FieldRule, object: &Map<String, Value>) -> Result<Option<FieldValue>, String> {
    let raw = match object.get(rule.name) {
        None | Some(Value::Null) if rule.required => return Err("is required".to_owned()),
        None | Some(Value::Null) => return Ok(None),
        Some(raw) => raw,
    };

    if rule.kind == FieldKind::Flag {
        return raw
            .as_bool()
            .map(|flag| Some(FieldValue::Flag(flag)))
            .ok_or_else(|| "must be a boolean".to_owned());
    }
    let text = raw.as_str().ok_or_else(|| "must be a string".to_owned())?;
    parse_text(rule, text).map_err(|error| error.to_string())
}

fn parse_text(rule: &FieldRule, text: &str) -> Result<Option<FieldValue>, ValueError> {
    let value = match rule.kind {
        FieldKind::Owner => FieldValue::Owner(RepositoryOwner::new(text)?),
        FieldKind::Repository => FieldValue::Repository(RepositoryName::new(text)?),
        FieldKind::ContentPath => FieldValue::Path(ContentPath::new(text)?),
        FieldKind::Ref if text.is_empty() && !rule.required => return Ok(None),
        FieldKind::Ref | FieldKind::Branch => FieldValue::Ref(RefName::new(text)?),
        FieldKind::ProviderToken => FieldValue::Token(ProviderToken::new(text)?),
        FieldKind::Text { max_chars } => {
            if text.chars().count() > max_chars {
                return Err(ValueError("is too long"));
            }
            FieldValue::Text(text.to_owned())
        }
        FieldKind::Homepage => {
            if !text.is_empty() && !is_web_url(text) {
                return Err(ValueError("must be empty or an http(s) URL"));
            }
            FieldValue::Text(text.to_owned())
        }
        FieldKind::Flag => return Err(ValueError("must be a boolean")),
    };
    Ok(Some(value))
}

fn is_web_url(text: &str) -> bool {
    Url::parse(text).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::{FieldKind, FieldRule, FieldViolation, validate};
    use crate::error::ProxyError;

    const SCHEMA: &[FieldRule] = &[
        FieldRule::required("owner", FieldKind::Owner),
        FieldRule::required("repo", FieldKind::Repository),
        FieldRule::optional("path", FieldKind::ContentPath),
        FieldRule::optional("ref", FieldKind::Ref),
        FieldRule::optional("description", FieldKind::Text { max_chars: 5 }),
        FieldRule::optional("homepage", FieldKind::Homepage),
        FieldRule::optional("private", FieldKind::Flag),
    ];

    fn run(body: &Value) -> Result<super::ValidatedBody, ProxyError> {
        let bytes = serde_json::to_vec(body).expect("body should serialise");
        validate(&bytes, SCHEMA)
    }

    fn violations(body: &Value) -> Vec<FieldViolation> {
        match run(body) {
            Err(ProxyError::Validation(violations)) => violations,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[rstest]
    fn accepts_a_complete_body() {
        let validated = run(&json!({
            "owner": "alice",
            "repo": "demo",
            "path": "/src/",
            "ref": "main",
            "description": "Tools",
            "homepage": "https://example.com",
            "private": true,
            "provider_token": "ghp_x",
            "unrelated": 42
        }))
        .expect("body should validate");

        let repository = validated.repository().expect("repository should be present");
        assert_eq!(repository.to_string(), "alice/demo");
        assert_eq!(validated.content_path("path").as_str(), "src");
        assert_eq!(
            validated.optional_ref("ref").map(|r| r.to_string()),
            Some("main".to_owned())
        );
        assert_eq!(validated.text("description").as_deref(), Some("Tools"));
        assert_eq!(validated.flag("private"), Some(true));
        assert_eq!(
            validated
                .provider_token()
                .expect("token should be present")
                .expose(),
            "ghp_x"
        );
    }

    #[rstest]
    fn missing_provider_token_is_a_violation_on_every_schema() {
        let found = violations(&json!({"owner": "alice", "repo": "demo"}));
        assert_eq!(
            found,
            vec![FieldViolation::new("provider_token", "is required")]
        );

        let bytes = serde_json::to_vec(&json!({})).expect("body should serialise");
        let Err(ProxyError::Validation(empty_schema)) = validate(&bytes, &[]) else {
            panic!("empty schema should still require the token");
        };
        assert_eq!(
            empty_schema,
            vec![FieldViolation::new("provider_token", "is required")]
        );
    }

    #[rstest]
    fn collects_every_violation_in_schema_order() {
        let found = violations(&json!({
            "owner": "-bad",
            "repo": "..",
            "path": "../etc",
            "provider_token": "   "
        }));
        let fields: Vec<&str> = found.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["owner", "repo", "path", "provider_token"]);
    }

    #[rstest]
    #[case::not_json(b"not json".as_slice())]
    #[case::array(b"[1, 2]".as_slice())]
    #[case::empty(b"".as_slice())]
    fn non_object_bodies_are_rejected(#[case] body: &[u8]) {
        let Err(ProxyError::Validation(found)) = validate(body, SCHEMA) else {
            panic!("body should be rejected");
        };
        assert_eq!(found, vec![FieldViolation::new("body", "must be a JSON object")]);
    }

    #[rstest]
    #[case::string_expected(json!({"owner": 7}), "owner", "must be a string")]
    #[case::boolean_expected(json!({"private": "yes"}), "private", "must be a boolean")]
    #[case::too_long(json!({"description": "abcdef"}), "description", "is too long")]
    #[case::bad_homepage(
        json!({"homepage": "ftp://example.com"}),
        "homepage",
        "must be empty or an http(s) URL"
    )]
    fn reports_type_and_format_errors(
        #[case] overrides: Value,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let mut body = json!({"owner": "alice", "repo": "demo", "provider_token": "t"});
        if let (Some(target), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
            target.extend(extra.clone());
        }
        assert_eq!(violations(&body), vec![FieldViolation::new(field, message)]);
    }

    #[rstest]
    fn empty_optional_ref_and_homepage_are_accepted() {
        let validated = run(&json!({
            "owner": "alice",
            "repo": "demo",
            "ref": "",
            "homepage": "",
            "provider_token": "t"
        }))
        .expect("body should validate");
        assert!(validated.optional_ref("ref").is_none());
        assert_eq!(validated.text("homepage").as_deref(), Some(""));
    }

    #[rstest]
    fn null_optional_fields_count_as_absent() {
        let validated = run(&json!({
            "owner": "alice",
            "repo": "demo",
            "private": null,
            "provider_token": "t"
        }))
        .expect("body should validate");
        assert!(validated.flag("private").is_none());
        assert!(validated.content_path("path").is_root());
    }
}
