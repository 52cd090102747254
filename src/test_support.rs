//! GitHub and identity-store response fixtures shared by unit and
//! integration tests.

use serde_json::{Map, Value, json};

/// A `GET /repos/{owner}/{repo}` response body.
#[must_use]
pub fn repository_json(owner: &str, name: &str, default_branch: &str) -> Value {
    json!({
        "id": 1_296_269,
        "node_id": "MDEwOlJlcG9zaXRvcnkxMjk2MjY5",
        "name": name,
        "full_name": format!("{owner}/{name}"),
        "private": false,
        "owner": { "login": owner, "id": 1 },
        "default_branch": default_branch,
        "description": null,
        "homepage": null
    })
}

/// One entry of a `GET /repos/{owner}/{repo}/branches` response.
#[must_use]
pub fn branch_json(name: &str, sha: &str, protected: bool) -> Value {
    json!({
        "name": name,
        "commit": {
            "sha": sha,
            "url": format!("https://api.github.com/repos/o/r/commits/{sha}")
        },
        "protected": protected
    })
}

/// A `GET /repos/{owner}/{repo}/git/ref/heads/{branch}` response body.
#[must_use]
pub fn git_ref_json(branch: &str, sha: &str) -> Value {
    json!({
        "ref": format!("refs/heads/{branch}"),
        "node_id": "MDM6UmVmcmVmcy9oZWFkcy9mZWF0dXJlQQ==",
        "object": { "type": "commit", "sha": sha }
    })
}

/// A Supabase `GET /auth/v1/user` response body.
#[must_use]
pub fn auth_user_json(user_id: &str) -> Value {
    json!({
        "id": user_id,
        "aud": "authenticated",
        "role": "authenticated",
        "email": "someone@example.com"
    })
}

/// A Supabase profile-table query response with one row.
#[must_use]
pub fn profile_rows_json(username_column: &str, username: Option<&str>) -> Value {
    let mut row = Map::new();
    row.insert(username_column.to_owned(), json!(username));
    Value::Array(vec![Value::Object(row)])
}
