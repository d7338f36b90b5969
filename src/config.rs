// src/config.rs
// =============================================================================
// Validated scan configuration.
//
// The CLI hands us raw strings; everything past this file trusts a ScanConfig.
// Every check the run depends on (URL scheme, range ordering, pattern syntax,
// positive concurrency) happens here, once, before any request is sent.
// =============================================================================

use crate::cli::Cli;
use regex::bytes::Regex;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reasons a command line cannot be turned into a ScanConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL '{0}': it must start with http:// or https://")]
    InvalidUrl(String),

    #[error("invalid RANGE '{0}': it must be in the format START-END")]
    RangeFormat(String),

    #[error("START of RANGE must be a positive number")]
    RangeStart,

    #[error("END of RANGE must be a positive number")]
    RangeEnd,

    #[error("START of RANGE must be less than END")]
    RangeOrder,

    #[error("endpoint '{endpoint}' does not contain the placeholder '{placeholder}'")]
    MissingPlaceholder { endpoint: String, placeholder: String },

    #[error("placeholder must not be empty")]
    EmptyPlaceholder,

    #[error("invalid regular expression: {0}")]
    Pattern(#[from] regex::Error),

    #[error("CONCURRENCY must be a positive number")]
    Concurrency,
}

/// Inclusive range of identifiers to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub start: u64,
    pub end: u64,
}

impl IdRange {
    /// Number of identifiers in the range (both ends included)
    pub fn count(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn ids(&self) -> std::ops::RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl FromStr for IdRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .filter(|(_, end)| !end.contains('-'))
            .ok_or_else(|| ConfigError::RangeFormat(s.to_string()))?;

        let start = parse_positive(start).ok_or(ConfigError::RangeStart)?;
        let end = parse_positive(end).ok_or(ConfigError::RangeEnd)?;

        if start >= end {
            return Err(ConfigError::RangeOrder);
        }

        Ok(IdRange { start, end })
    }
}

fn parse_positive(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// What to do when a download would land on a file that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Truncate and rewrite the existing file
    #[default]
    Overwrite,
    /// Leave the existing file alone and report a write error
    Keep,
}

/// Everything one run needs, already validated
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    pub id_range: IdRange,
    /// Endpoint path containing `placeholder` at least once
    pub endpoint_template: String,
    pub placeholder: String,
    pub link_pattern: Regex,
    pub download_concurrency: usize,
    pub download_dir: PathBuf,
    /// Total deadline for a probe and connect deadline for a download;
    /// `None` leaves reqwest without either
    pub request_timeout: Option<Duration>,
    pub collision_policy: CollisionPolicy,
}

impl ScanConfig {
    /// Endpoint path with every occurrence of the placeholder replaced by `id`
    pub fn endpoint_for(&self, id: u64) -> String {
        self.endpoint_template
            .replace(&self.placeholder, &id.to_string())
    }

    /// Full URL a probe for `id` is sent to
    pub fn probe_url(&self, id: u64) -> String {
        format!("{}{}", self.base_url, self.endpoint_for(id))
    }

    /// Full URL a scraped link is downloaded from
    pub fn download_url(&self, link: &str) -> String {
        format!("{}{}", self.base_url, link)
    }
}

impl TryFrom<Cli> for ScanConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let base_url = validate_url(&cli.url)?;
        let id_range: IdRange = cli.range.parse()?;

        if cli.placeholder.is_empty() {
            return Err(ConfigError::EmptyPlaceholder);
        }
        if !cli.endpoint.contains(&cli.placeholder) {
            return Err(ConfigError::MissingPlaceholder {
                endpoint: cli.endpoint,
                placeholder: cli.placeholder,
            });
        }

        let link_pattern = Regex::new(&cli.pattern)?;

        let download_concurrency = usize::try_from(cli.concurrency)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(ConfigError::Concurrency)?;

        let request_timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));

        let collision_policy = if cli.no_clobber {
            CollisionPolicy::Keep
        } else {
            CollisionPolicy::Overwrite
        };

        Ok(ScanConfig {
            base_url,
            id_range,
            endpoint_template: cli.endpoint,
            placeholder: cli.placeholder,
            link_pattern,
            download_concurrency,
            download_dir: PathBuf::from(cli.output_dir),
            request_timeout,
            collision_policy,
        })
    }
}

// Checks the scheme and that the rest actually parses, then trims trailing
// slashes so that base_url + "/path" never produces "//path".
fn validate_url(raw: &str) -> Result<String, ConfigError> {
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }
    Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
impl ScanConfig {
    /// Small config pointed at a stub server: IDs 1-3 on `/doc.php?uid=UID`,
    /// links like `/files/10.pdf`, two downloads at a time
    pub(crate) fn for_tests(base_url: &str, download_dir: &std::path::Path) -> Self {
        ScanConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            id_range: IdRange { start: 1, end: 3 },
            endpoint_template: "/doc.php?uid=UID".to_string(),
            placeholder: "UID".to_string(),
            link_pattern: Regex::new(r"/files/\d+\.pdf").unwrap(),
            download_concurrency: 2,
            download_dir: download_dir.to_path_buf(),
            request_timeout: Some(Duration::from_secs(5)),
            collision_policy: CollisionPolicy::Overwrite,
        }
    }
}
