// src/rewrite.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Prefix rewriting of samplesheet references.
//!
//! Two granularities:
//! - per reference: anchored prefix swap, first occurrence only;
//! - per file: every literal occurrence in the raw text, wherever it appears.
//!
//! The file-level pass is not scoped to the references that were migrated.
//! A prefix that also occurs in unrelated text (a comment, another column)
//! is replaced there as well.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("rewrite prefix must not be empty")]
    EmptyPrefix,
}

/// An exact prefix and what replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    prefix: String,
    replacement: String,
}

impl RewriteRule {
    pub fn new(
        prefix: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, RewriteError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(RewriteError::EmptyPrefix);
        }
        Ok(Self { prefix, replacement: replacement.into() })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Destination for `reference`, or `None` when it does not start with the prefix.
    pub fn apply(&self, reference: &str) -> Option<String> {
        reference
            .strip_prefix(self.prefix.as_str())
            .map(|suffix| format!("{}{}", self.replacement, suffix))
    }

    /// Replace every occurrence in `text`. Returns the new text and the count.
    pub fn apply_all(&self, text: &str) -> (String, usize) {
        let count = text.matches(self.prefix.as_str()).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        (text.replace(self.prefix.as_str(), &self.replacement), count)
    }
}

/// Rewrite the whole file in place. Returns how many occurrences were replaced.
///
/// The file is left untouched when nothing matches.
pub fn rewrite_file(path: &Path, rule: &RewriteRule) -> Result<usize> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let (new_content, count) = rule.apply_all(&content);
    if count == 0 {
        debug!("no occurrence of '{}' in {}", rule.prefix(), path.display());
        return Ok(0);
    }
    fs::write(path, new_content)
        .with_context(|| format!("cannot write {}", path.display()))?;
    info!(
        "Replaced {} occurrence(s) of '{}' with '{}' in {}",
        count,
        rule.prefix(),
        rule.replacement(),
        path.display()
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rule(p: &str, r: &str) -> RewriteRule {
        RewriteRule::new(p, r).unwrap()
    }

    #[test]
    fn prefix_swap() {
        let r = rule("s3://bucket-a/reads", "s3://bucket-b/data");
        assert_eq!(
            r.apply("s3://bucket-a/reads/x.fastq.gz").as_deref(),
            Some("s3://bucket-b/data/x.fastq.gz")
        );
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let r = rule("s3://a/", "s3://b/");
        assert_eq!(r.apply("s3://a/s3://a/x").as_deref(), Some("s3://b/s3://a/x"));
    }

    #[test]
    fn non_matching_reference_is_untouched() {
        let r = rule("s3://a/", "s3://b/");
        assert_eq!(r.apply("https://h/s3://a/x"), None);
        assert_eq!(r.apply(""), None);
    }

    #[test]
    fn exact_prefix_gives_bare_replacement() {
        let r = rule("s3://a/x", "s3://b/y");
        assert_eq!(r.apply("s3://a/x").as_deref(), Some("s3://b/y"));
    }

    #[test]
    fn empty_prefix_rejected() {
        assert_eq!(RewriteRule::new("", "x"), Err(RewriteError::EmptyPrefix));
    }

    #[test]
    fn whole_file_replaces_everywhere() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("sheet.csv");
        fs::write(
            &path,
            "sample,fastq_1,note\nS1,s3://a/r1.fq,copied from s3://a/\n",
        )?;

        let n = rewrite_file(&path, &rule("s3://a/", "s3://b/"))?;
        assert_eq!(n, 2);
        assert_eq!(
            fs::read_to_string(&path)?,
            "sample,fastq_1,note\nS1,s3://b/r1.fq,copied from s3://b/\n"
        );
        Ok(())
    }

    #[test]
    fn whole_file_no_match_is_noop() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("sheet.csv");
        fs::write(&path, "a,b\n1,2\n")?;
        assert_eq!(rewrite_file(&path, &rule("s3://zzz/", "s3://b/"))?, 0);
        assert_eq!(fs::read_to_string(&path)?, "a,b\n1,2\n");
        Ok(())
    }
}
