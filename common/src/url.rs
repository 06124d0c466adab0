// common/src/url.rs
// URL canonicalisation rules from spec.md §3.
//
// A code-forge URL reduces to `scheme://host/owner/repo`; a Q&A URL reduces
// to `scheme://host/questions/<numeric-id>`. Anything else is rejected.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DomainError;

static QUESTION_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Which provider kind a canonicalised link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    CodeForge,
    QuestionAnswer,
}

/// Reduce `raw` to its canonical form, classifying it along the way.
///
/// `canon(u) == canon(canon(u))` for any accepted input (idempotence,
/// spec.md §8) since the output is already in canonical form and will
/// re-parse to itself unchanged.
pub fn canonicalize(raw: &str) -> Result<(String, ResourceKind), DomainError> {
    let parsed = ::url::Url::parse(raw.trim())
        .map_err(|e| DomainError::Validation(format!("invalid url '{raw}': {e}")))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(DomainError::Validation(format!(
            "unsupported scheme in '{raw}'"
        )));
    }
    let host = parsed
        .host_str()
        .ok_or_else(|| DomainError::Validation(format!("missing host in '{raw}'")))?;

    let path = parsed.path().trim_matches('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if host == "github.com" {
        if let [owner, repo, ..] = segments.as_slice() {
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            return Ok((
                format!("{scheme}://{host}/{owner}/{repo}"),
                ResourceKind::CodeForge,
            ));
        }
    }

    if host == "stackoverflow.com" {
        if let [first, id, ..] = segments.as_slice() {
            if *first == "questions" && QUESTION_ID.is_match(id) {
                return Ok((
                    format!("{scheme}://{host}/questions/{id}"),
                    ResourceKind::QuestionAnswer,
                ));
            }
        }
    }

    Err(DomainError::Validation(format!(
        "url '{raw}' does not match a code-forge or question shape"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_github_repo() {
        let (canon, kind) = canonicalize("https://github.com/foo/bar").unwrap();
        assert_eq!(canon, "https://github.com/foo/bar");
        assert_eq!(kind, ResourceKind::CodeForge);
    }

    #[test]
    fn canonicalizes_github_repo_with_trailing_segments() {
        let (canon, _) = canonicalize("https://github.com/foo/bar/pulls?x=1").unwrap();
        assert_eq!(canon, "https://github.com/foo/bar");
    }

    #[test]
    fn canonicalizes_question_url() {
        let (canon, kind) =
            canonicalize("https://stackoverflow.com/questions/12345/some-title").unwrap();
        assert_eq!(canon, "https://stackoverflow.com/questions/12345");
        assert_eq!(kind, ResourceKind::QuestionAnswer);
    }

    #[test]
    fn rejects_non_numeric_question_id() {
        assert!(canonicalize("https://stackoverflow.com/questions/abc").is_err());
    }

    #[test]
    fn rejects_unrelated_shape() {
        assert!(canonicalize("https://example.com/x").is_err());
    }

    #[test]
    fn idempotent_on_accepted_input() {
        let (first, _) = canonicalize("https://github.com/foo/bar").unwrap();
        let (second, _) = canonicalize(&first).unwrap();
        assert_eq!(first, second);
    }
}
