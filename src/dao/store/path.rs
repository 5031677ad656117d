use std::fmt;

use thiserror::Error;

/// Characters the hosted backend refuses inside a key.
const FORBIDDEN: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// A path segment was empty or contained a character keys cannot hold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid store path segment `{segment}`")]
pub struct InvalidPath {
    pub segment: String,
}

/// Slash-delimited key path inside the hierarchical store, e.g. `sessions/AB12CD/members`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a slash-delimited path. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self, InvalidPath> {
        let trimmed = raw.trim_matches('/');
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            segments.push(check_segment(segment)?.to_owned());
        }
        Ok(Self { segments })
    }

    /// Path of the child `segment` below this one.
    pub fn join(&self, segment: impl AsRef<str>) -> Result<Self, InvalidPath> {
        let segment = check_segment(segment.as_ref())?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Ok(Self { segments })
    }

    /// Individual keys from the root down.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when one path is an ancestor of (or equal to) the other.
    ///
    /// Comparison is per segment, so `sessions/AB` does not overlap `sessions/ABC`.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(left, right)| left == right)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn check_segment(segment: &str) -> Result<&str, InvalidPath> {
    if segment.is_empty() || segment.contains(FORBIDDEN) || segment.chars().any(char::is_control)
    {
        return Err(InvalidPath {
            segment: segment.to_owned(),
        });
    }
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_outer_slashes() {
        let path = StorePath::parse("/sessions/AB12CD/").unwrap();
        assert_eq!(path.segments(), ["sessions", "AB12CD"]);
        assert_eq!(path.to_string(), "sessions/AB12CD");
    }

    #[test]
    fn parse_rejects_empty_and_forbidden_segments() {
        assert!(StorePath::parse("").is_err());
        assert!(StorePath::parse("sessions//x").is_err());
        assert!(StorePath::parse("sessions/a.b").is_err());
        assert!(StorePath::parse("sessions/a#b").is_err());
    }

    #[test]
    fn join_validates_segment() {
        let base = StorePath::parse("sessions").unwrap();
        assert_eq!(base.join("XY").unwrap().to_string(), "sessions/XY");
        assert!(base.join("a/b").is_err());
    }

    #[test]
    fn overlap_is_segment_wise() {
        let session = StorePath::parse("sessions/AB").unwrap();
        let member = StorePath::parse("sessions/AB/members/m1").unwrap();
        let sibling = StorePath::parse("sessions/ABC").unwrap();
        let other_member = StorePath::parse("sessions/AB/scores").unwrap();

        assert!(session.overlaps(&member));
        assert!(member.overlaps(&session));
        assert!(!session.overlaps(&sibling));
        assert!(!member.overlaps(&other_member));
    }
}
