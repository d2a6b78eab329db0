// src/uri_utils.rs
//! URI classification for samplesheet references.
//!
//! Every non-empty reference is either an HTTP(S) URL or is taken to be an
//! object-store URI of the form `scheme://container/key`. No syntax
//! validation is done: a malformed URI yields an empty container or key and
//! the failure surfaces later, when the store is asked to act on it.
//!
//! # Examples
//!
//! ```
//! use nfrelease::uri_utils::{RemoteLocation, ObjectRef};
//!
//! let loc = RemoteLocation::classify("s3://bucket-a/reads/x.fastq.gz");
//! assert_eq!(loc, RemoteLocation::ObjectStore(ObjectRef::new("bucket-a", "reads/x.fastq.gz")));
//!
//! let loc = RemoteLocation::classify("https://example.org/x.fastq.gz");
//! assert!(loc.is_http());
//! ```

use std::fmt;

use crate::constants::OBJECT_STORE_SCHEME;

/// A blob address inside an object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub container: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self { container: container.into(), key: key.into() }
    }

    /// Split `scheme://container/key` into its parts.
    ///
    /// The container is the authority component and the key is the path with
    /// its leading `/` stripped. Query and fragment suffixes are dropped.
    pub fn parse(uri: &str) -> Self {
        let without_suffix = uri
            .split_once(['?', '#'])
            .map(|(head, _)| head)
            .unwrap_or(uri);

        match without_suffix.split_once("://") {
            Some((_scheme, rest)) => match rest.split_once('/') {
                Some((container, key)) => Self::new(container, key.trim_start_matches('/')),
                None => Self::new(rest, ""),
            },
            // No authority at all: everything is path.
            None => Self::new("", without_suffix.trim_start_matches('/')),
        }
    }

    /// Last `/`-separated segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", OBJECT_STORE_SCHEME, self.container, self.key)
    }
}

/// Where a samplesheet reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLocation {
    ObjectStore(ObjectRef),
    Http(String),
}

impl RemoteLocation {
    /// Classify by prefix: `http://` or `https://` is HTTP, anything else is
    /// decomposed as an object-store URI.
    pub fn classify(s: &str) -> Self {
        if is_http_url(s) {
            RemoteLocation::Http(s.to_string())
        } else {
            RemoteLocation::ObjectStore(ObjectRef::parse(s))
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, RemoteLocation::Http(_))
    }
}

impl fmt::Display for RemoteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteLocation::ObjectStore(obj) => obj.fmt(f),
            RemoteLocation::Http(url) => f.write_str(url),
        }
    }
}

/// True when `s` starts exactly with `http://` or `https://`.
pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Final path segment of a URL, ignoring any query or fragment.
///
/// Returns `None` when the URL ends in `/` (or has no path at all).
pub fn url_file_name(url: &str) -> Option<&str> {
    let path = url
        .split_once(['?', '#'])
        .map(|(head, _)| head)
        .unwrap_or(url);
    let path = match path.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => path,
    };
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_prefixes_are_http() {
        for url in ["http://host/a.fq", "https://host/a.fq", "https://"] {
            assert_eq!(RemoteLocation::classify(url), RemoteLocation::Http(url.to_string()));
        }
    }

    #[test]
    fn uppercase_scheme_is_not_http() {
        // Prefix match is exact.
        let loc = RemoteLocation::classify("HTTPS://host/a.fq");
        assert_eq!(loc, RemoteLocation::ObjectStore(ObjectRef::new("host", "a.fq")));
    }

    #[test]
    fn object_uri_splits_container_and_key() {
        let obj = ObjectRef::parse("s3://bucket-a/reads/x.fastq.gz");
        assert_eq!(obj.container, "bucket-a");
        assert_eq!(obj.key, "reads/x.fastq.gz");
        assert_eq!(obj.file_name(), "x.fastq.gz");
        assert_eq!(obj.to_string(), "s3://bucket-a/reads/x.fastq.gz");
    }

    #[test]
    fn other_schemes_use_authority_as_container() {
        let obj = ObjectRef::parse("gs://data/set/one.bam");
        assert_eq!(obj, ObjectRef::new("data", "set/one.bam"));
    }

    #[test]
    fn malformed_uris_degrade_silently() {
        assert_eq!(ObjectRef::parse("s3://bucket-only"), ObjectRef::new("bucket-only", ""));
        assert_eq!(ObjectRef::parse("s3://bucket/"), ObjectRef::new("bucket", ""));
        assert_eq!(ObjectRef::parse("reads/x.fq"), ObjectRef::new("", "reads/x.fq"));
        assert_eq!(ObjectRef::parse("/abs/x.fq"), ObjectRef::new("", "abs/x.fq"));
    }

    #[test]
    fn query_and_fragment_are_not_key() {
        assert_eq!(ObjectRef::parse("s3://b/k.txt?versionId=3"), ObjectRef::new("b", "k.txt"));
        assert_eq!(ObjectRef::parse("s3://b/k.txt#frag"), ObjectRef::new("b", "k.txt"));
    }

    #[test]
    fn url_file_name_takes_last_segment() {
        assert_eq!(url_file_name("https://h/a/b/c.csv"), Some("c.csv"));
        assert_eq!(url_file_name("https://h/a/b/c.csv?raw=true"), Some("c.csv"));
        assert_eq!(url_file_name("https://h/a/"), None);
        assert_eq!(url_file_name("https://h"), None);
    }
}
