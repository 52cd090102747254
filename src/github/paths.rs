//! REST resource paths built from validated request values.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::locator::{ContentPath, RefName, RepositoryRef};

/// Characters left untouched inside a single path segment or query value.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const BRANCH_PAGE_SIZE: u8 = 100;

fn encode(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Encodes each `/`-separated component, keeping the separators.
fn encode_segments(value: &str) -> String {
    value.split('/').map(encode).collect::<Vec<_>>().join("/")
}

pub(super) fn repository_path(repository: &RepositoryRef) -> String {
    format!(
        "/repos/{}/{}",
        encode(repository.owner().as_str()),
        encode(repository.name().as_str())
    )
}

pub(super) fn contents_path(
    repository: &RepositoryRef,
    path: &ContentPath,
    reference: &RefName,
) -> String {
    let base = repository_path(repository);
    let encoded_ref = encode(reference.as_str());
    if path.is_root() {
        format!("{base}/contents?ref={encoded_ref}")
    } else {
        format!(
            "{base}/contents/{}?ref={encoded_ref}",
            encode_segments(path.as_str())
        )
    }
}

pub(super) fn branches_path(repository: &RepositoryRef) -> String {
    format!(
        "{}/branches?per_page={BRANCH_PAGE_SIZE}",
        repository_path(repository)
    )
}

pub(super) fn branch_ref_path(repository: &RepositoryRef, branch: &RefName) -> String {
    format!(
        "{}/git/ref/heads/{}",
        repository_path(repository),
        encode_segments(branch.as_str())
    )
}

pub(super) fn refs_path(repository: &RepositoryRef) -> String {
    format!("{}/git/refs", repository_path(repository))
}

pub(super) fn branch_refs_path(repository: &RepositoryRef, branch: &RefName) -> String {
    format!(
        "{}/git/refs/heads/{}",
        repository_path(repository),
        encode_segments(branch.as_str())
    )
}
