//! Host link name synthesis.
//!
//! A host link name has the shape `v<name><separator><suffix>`:
//!
//! - `<name>` is the last `/` segment of the container name with the
//!   configured substitutions applied, optionally with repeated characters
//!   collapsed, and cut so the whole name fits `IFNAMSIZ - 1` bytes;
//! - `<suffix>` is the in-container link name with the first matching
//!   configured prefix removed (`eth0` becomes `0` with prefix `eth`).
//!
//! Synthesis is pure: the same configuration and inputs always give the same
//! name.

use crate::config::{Config, Replacement};
use crate::util::ifname::{self, IFNAMSIZ};

/// Leading character of every synthesized name.
const NAME_PREFIX: char = 'v';

/// Reasons a host link name cannot be synthesized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("container name is empty")]
    EmptyContainerName,

    #[error("container link name is empty")]
    EmptyLinkName,

    #[error("container link suffix is too long: {suffix:?}")]
    SuffixTooLong { suffix: String },

    #[error("{0}")]
    InvalidName(String),
}

/// Synthesizes host link names from a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct LinkNamer {
    config: Config,
}

impl LinkNamer {
    /// Create a namer owning the process configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the host link name for `link_name` inside `container_name`.
    pub fn host_link_name(
        &self,
        container_name: &str,
        link_name: &str,
    ) -> Result<String, NameError> {
        if container_name.is_empty() {
            return Err(NameError::EmptyContainerName);
        }
        if link_name.is_empty() {
            return Err(NameError::EmptyLinkName);
        }

        let leaf = match container_name.rfind('/') {
            Some(i) => &container_name[i + 1..],
            None => container_name,
        };
        let Some(first) = leaf.chars().next() else {
            return Err(NameError::EmptyContainerName);
        };

        let mut morphed = apply_replacements(leaf, &self.config.replacements);
        if morphed.is_empty() {
            morphed.push(first);
        }

        if self.config.remove_duplicated_symbols {
            morphed = collapse_duplicates(&morphed);
        }

        let suffix = self.link_suffix(link_name);
        let separator = &self.config.link_index_separator;

        let budget = (IFNAMSIZ - 1 - NAME_PREFIX.len_utf8()) as isize
            - suffix.len() as isize
            - separator.len() as isize;
        if budget < 1 {
            return Err(NameError::SuffixTooLong {
                suffix: suffix.to_string(),
            });
        }
        truncate_to(&mut morphed, budget as usize);

        let name = format!("{}{}{}{}", NAME_PREFIX, morphed, separator, suffix);
        ifname::validate(&name).map_err(|e| NameError::InvalidName(e.to_string()))?;

        Ok(name)
    }

    /// Strip the first configured prefix `link_name` starts with.
    fn link_suffix<'a>(&self, link_name: &'a str) -> &'a str {
        self.config
            .container_link_prefixes
            .iter()
            .find_map(|prefix| link_name.strip_prefix(prefix.as_str()))
            .unwrap_or(link_name)
    }
}

/// A piece of the name being rewritten.
#[derive(Debug)]
struct Segment {
    text: String,
    /// Produced by a substitution; later rules never look inside it.
    processed: bool,
}

impl Segment {
    fn pending(text: &str) -> Self {
        Self {
            text: text.to_string(),
            processed: false,
        }
    }
}

/// Apply substitution rules in order, each in a single left-to-right pass.
///
/// Text produced by a rule is frozen: neither that rule nor any later one
/// matches inside it. Rules with an empty needle are ignored.
pub fn apply_replacements(name: &str, rules: &[Replacement]) -> String {
    let mut segments = vec![Segment::pending(name)];

    for rule in rules {
        if rule.needle.is_empty() {
            continue;
        }

        let mut updated = Vec::with_capacity(segments.len());
        for segment in segments {
            if segment.processed {
                updated.push(segment);
                continue;
            }

            let mut rest = segment.text.as_str();
            loop {
                let Some(i) = rest.find(rule.needle.as_str()) else {
                    updated.push(Segment::pending(rest));
                    break;
                };

                if i > 0 {
                    updated.push(Segment::pending(&rest[..i]));
                }
                if !rule.replacement.is_empty() {
                    updated.push(Segment {
                        text: rule.replacement.clone(),
                        processed: true,
                    });
                }

                rest = &rest[i + rule.needle.len()..];
                if rest.is_empty() {
                    break;
                }
            }
        }

        segments = updated;
    }

    segments.into_iter().map(|s| s.text).collect()
}

/// Collapse every run of identical adjacent characters to one character.
fn collapse_duplicates(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = None;
    for c in s.chars() {
        if last != Some(c) {
            out.push(c);
            last = Some(c);
        }
    }
    out
}

/// Cut `s` to at most `max` bytes without splitting a character.
fn truncate_to(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
