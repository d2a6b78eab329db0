// src/docs.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Required/optional status scraped from a rendered parameter documentation page.
//
// Each parameter on the page starts at an element carrying `id="<name>"`.
// Its section runs up to the next anchor of another known parameter. A
// section containing the required-badge class marks the parameter required.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::EnrichConfig;
use crate::http::HttpSource;
use crate::schema::{load_template, save_template, ParameterTemplate};

static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|\s)id\s*=\s*["']([^"']+)["']"#).expect("anchor pattern is valid")
});

/// Outcome of one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    /// Template parameters with an anchor on the page.
    pub found: usize,
    /// Of those, how many carry the required badge.
    pub required: usize,
    /// Template parameters absent from the page; their flag is unchanged.
    pub not_found: Vec<String>,
}

/// Update `optional` flags in place from `markup`.
pub fn enrich_from_docs(
    template: &mut ParameterTemplate,
    markup: &str,
    badge_class: &str,
) -> EnrichSummary {
    // (offset, name) of the first anchor of each template parameter
    let mut seen = HashSet::new();
    let anchors: Vec<(usize, String)> = ANCHOR
        .captures_iter(markup)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            (template.contains_key(name) && seen.insert(name.to_string()))
                .then(|| (whole.start(), name.to_string()))
        })
        .collect();

    let mut summary = EnrichSummary::default();
    for (i, (start, name)) in anchors.iter().enumerate() {
        let end = anchors.get(i + 1).map(|(next, _)| *next).unwrap_or(markup.len());
        let required = markup[*start..end].contains(badge_class);
        if let Some(entry) = template.get_mut(name) {
            entry.optional = !required;
        }
        summary.found += 1;
        if required {
            summary.required += 1;
        }
        debug!("{}: {}", name, if required { "required" } else { "optional" });
    }

    summary.not_found = template
        .keys()
        .filter(|k| !seen.contains(k.as_str()))
        .cloned()
        .collect();
    summary
}

/// Fetch the documentation page and rewrite the template file.
///
/// `Ok(None)` when the page could not be fetched; the template is left as is.
pub async fn enrich_template_file(
    cfg: &EnrichConfig,
    http: &dyn HttpSource,
) -> Result<Option<EnrichSummary>> {
    let mut template = load_template(&cfg.template_path)?;

    let body = match http.fetch(&cfg.docs_url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to fetch documentation page {}: {:#}", cfg.docs_url, e);
            return Ok(None);
        }
    };
    let markup = String::from_utf8_lossy(&body);

    let summary = enrich_from_docs(&mut template, &markup, &cfg.badge_class);
    save_template(&cfg.template_path, &template)?;
    info!(
        "{} of {} parameters found on {}, {} required",
        summary.found,
        template.len(),
        cfg.docs_url,
        summary.required
    );
    if !summary.not_found.is_empty() {
        warn!("Not on the documentation page: {}", summary.not_found.join(", "));
    }
    Ok(Some(summary))
}
