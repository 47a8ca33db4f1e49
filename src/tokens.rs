//! Token estimates for the rendered digest.
//!
//! Uses tiktoken-rs for OpenAI-compatible counts, with a character
//! heuristic when the tokenizer cannot be loaded.

use std::sync::OnceLock;

use serde::Serialize;
use tiktoken_rs::CoreBPE;

use crate::config::Role;
use crate::report::Report;

/// Token encoding to use for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// cl100k_base: GPT-4, GPT-3.5-turbo
    #[default]
    Cl100kBase,
    /// o200k_base: GPT-4o
    O200kBase,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::O200kBase => write!(f, "o200k_base"),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Ok(Encoding::Cl100kBase),
            "o200k" | "o200k_base" => Ok(Encoding::O200kBase),
            _ => Err(format!("unknown encoding: {}", s)),
        }
    }
}

// Loaded at most once per encoding; `None` if loading failed.
static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn get_tokenizer(encoding: Encoding) -> Option<&'static CoreBPE> {
    match encoding {
        Encoding::Cl100kBase => CL100K
            .get_or_init(|| tiktoken_rs::cl100k_base().ok())
            .as_ref(),
        Encoding::O200kBase => O200K
            .get_or_init(|| tiktoken_rs::o200k_base().ok())
            .as_ref(),
    }
}

/// Roughly four characters per token.
fn fallback_count(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Count tokens in `text`. Never fails.
pub fn count_tokens(text: &str, encoding: Encoding) -> usize {
    match get_tokenizer(encoding) {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => {
            tracing::debug!(%encoding, "tokenizer unavailable, using character estimate");
            fallback_count(text)
        }
    }
}

/// Token counts for a report and its listing artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenEstimate {
    pub encoding: String,
    pub report: usize,
    pub listings: Vec<(Role, usize)>,
}

impl TokenEstimate {
    /// Count the report text and every listing.
    pub fn for_report(report: &Report, encoding: Encoding) -> Self {
        Self {
            encoding: encoding.to_string(),
            report: count_tokens(&report.text, encoding),
            listings: report
                .listings
                .iter()
                .map(|artifact| (artifact.role, count_tokens(&artifact.contents, encoding)))
                .collect(),
        }
    }

    /// Human-readable summary, one line per counted text.
    pub fn render(&self) -> String {
        let mut output = format!(
            "Report: {} tokens ({})\n",
            format_number(self.report),
            self.encoding
        );
        for (role, tokens) in &self.listings {
            output.push_str(&format!(
                "{} listing: {} tokens\n",
                role.title(),
                format_number(*tokens)
            ));
        }
        output
    }
}

/// Format a number with thousands separators.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Aggregate, listing_entry};
    use std::path::Path;

    #[test]
    fn test_empty_string() {
        assert_eq!(count_tokens("", Encoding::default()), 0);
    }

    #[test]
    fn test_simple_text() {
        let count = count_tokens("Hello, world!", Encoding::Cl100kBase);
        assert!(count > 0 && count < 10);
    }

    #[test]
    fn test_fallback_approximation() {
        assert_eq!(fallback_count(""), 0);
        assert_eq!(fallback_count("a"), 1);
        assert_eq!(fallback_count("abcd"), 1);
        assert_eq!(fallback_count("abcde"), 2);
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("cl100k".parse::<Encoding>().unwrap(), Encoding::Cl100kBase);
        assert_eq!("o200k_base".parse::<Encoding>().unwrap(), Encoding::O200kBase);
        assert!("invalid".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_estimate_for_report() {
        let mut agg = Aggregate::new();
        agg.push_listing(Role::Frontend, listing_entry("src/App.jsx", "export default App;"));
        let report = Report::from_aggregate(Path::new("/tmp/p"), "p", &agg);

        let estimate = TokenEstimate::for_report(&report, Encoding::Cl100kBase);
        assert!(estimate.report > 0);
        assert_eq!(estimate.listings.len(), 1);
        assert_eq!(estimate.listings[0].0, Role::Frontend);

        let text = estimate.render();
        assert!(text.starts_with("Report: "));
        assert!(text.contains("Frontend listing: "));
    }
}
