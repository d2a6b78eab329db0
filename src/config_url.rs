// src/config_url.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Locate the test samplesheet referenced by a pipeline config and fetch it.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::TEST_DATASETS_URL_PREFIX;
use crate::http::HttpSource;
use crate::uri_utils::url_file_name;

/// Single-quoted test-datasets URL with "samplesheet" somewhere in it.
static SAMPLESHEET_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"'({}[^']*samplesheet[^']*)'",
        regex::escape(TEST_DATASETS_URL_PREFIX)
    ))
    .expect("samplesheet URL pattern is valid")
});

/// First samplesheet URL embedded in config text, if any.
pub fn find_samplesheet_url(config_text: &str) -> Option<&str> {
    SAMPLESHEET_URL
        .captures(config_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Download the samplesheet referenced by `config_path` into `work_dir`.
///
/// `Ok(None)` when the config has no such URL, the URL has no file name,
/// or the download fails; the reason is logged. An unreadable config file
/// is an error.
pub async fn fetch_samplesheet_from_config(
    config_path: &Path,
    http: &dyn HttpSource,
    work_dir: &Path,
) -> Result<Option<PathBuf>> {
    let text = fs::read_to_string(config_path)
        .with_context(|| format!("cannot read config {}", config_path.display()))?;

    let Some(url) = find_samplesheet_url(&text) else {
        info!("No valid URL found in {}", config_path.display());
        return Ok(None);
    };
    let Some(filename) = url_file_name(url) else {
        info!("URL {} in {} has no file name", url, config_path.display());
        return Ok(None);
    };

    let body = match http.fetch(url).await {
        Ok(body) => body,
        Err(e) => {
            info!("Failed to download file from {}: {:#}", url, e);
            return Ok(None);
        }
    };

    fs::create_dir_all(work_dir)
        .with_context(|| format!("cannot create {}", work_dir.display()))?;
    let local = work_dir.join(filename);
    fs::write(&local, &body).with_context(|| format!("cannot write {}", local.display()))?;
    info!("Fetched {} → {}", url, local.display());
    Ok(Some(local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_quoted_url() {
        let text = "params {\n  input = 'https://raw.githubusercontent.com/nf-core/test-datasets/pipeline/testdata/samplesheet_full.csv'\n}\n";
        assert_eq!(
            find_samplesheet_url(text),
            Some("https://raw.githubusercontent.com/nf-core/test-datasets/pipeline/testdata/samplesheet_full.csv")
        );
    }

    #[test]
    fn first_match_wins() {
        let text = "a = 'https://raw.githubusercontent.com/nf-core/test-datasets/x/samplesheet_1.csv'\n\
                    b = 'https://raw.githubusercontent.com/nf-core/test-datasets/x/samplesheet_2.csv'\n";
        assert!(find_samplesheet_url(text).unwrap().ends_with("samplesheet_1.csv"));
    }

    #[test]
    fn needs_single_quotes_and_keyword() {
        assert_eq!(
            find_samplesheet_url("input = \"https://raw.githubusercontent.com/nf-core/test-datasets/x/samplesheet.csv\""),
            None
        );
        assert_eq!(
            find_samplesheet_url("fasta = 'https://raw.githubusercontent.com/nf-core/test-datasets/x/genome.fa'"),
            None
        );
        assert_eq!(
            find_samplesheet_url("input = 'https://example.org/samplesheet.csv'"),
            None
        );
    }

    #[test]
    fn match_stops_at_closing_quote() {
        let text = "input = 'https://raw.githubusercontent.com/nf-core/test-datasets/x/samplesheet.csv' // 'other'";
        assert!(find_samplesheet_url(text).unwrap().ends_with("/samplesheet.csv"));
    }
}
