//! Channel template parsing
//!
//! The template is a line-oriented list in the common IPTV "txt" layout:
//!
//! ```text
//! 央视频道,#genre#
//! CCTV-1
//! CCTV-5,http://backup.example/cctv5.m3u8
//! 卫视频道,#genre#
//! 湖南卫视
//! ```
//!
//! Marker lines (containing `#genre#`) open a category; every other non-blank
//! line is a channel, optionally followed by a known URL after the first comma.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::errors::TemplateError;
use crate::utils::{ChannelKey, normalize};

pub const GENRE_MARKER: &str = "#genre#";

/// One channel line in the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub name: String,
    pub category: String,
    pub known_urls: Vec<String>,
}

impl ChannelEntry {
    pub fn key(&self) -> ChannelKey {
        normalize(&self.name)
    }
}

/// Ordered group of channels under one marker line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub channels: Vec<ChannelEntry>,
}

/// Classification of a single trimmed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateLine<'a> {
    Blank,
    Marker { category: &'a str },
    Entry { name: &'a str, url: Option<&'a str> },
}

impl<'a> TemplateLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Blank;
        }
        if line.contains(GENRE_MARKER) {
            let category = line.split(',').next().unwrap_or_default().trim();
            return Self::Marker { category };
        }
        match line.split_once(',') {
            Some((name, url)) => {
                let url = url.trim();
                Self::Entry {
                    name: name.trim(),
                    url: (!url.is_empty()).then_some(url),
                }
            }
            None => Self::Entry {
                name: line,
                url: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ParseState {
    NoCategory,
    InCategory(usize),
}

/// Parsed template: category order, channel order and the set of keys of
/// interest.
#[derive(Debug, Clone, Default)]
pub struct ChannelTemplate {
    categories: Vec<Category>,
    keys: HashSet<ChannelKey>,
}

impl ChannelTemplate {
    /// Build the index from template lines.
    ///
    /// Fails with [`TemplateError::Malformed`] when a channel line precedes
    /// every category marker.
    pub fn parse<'a, I>(lines: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut template = Self::default();
        let mut state = ParseState::NoCategory;

        for (index, raw) in lines.into_iter().enumerate() {
            let raw = if index == 0 {
                raw.trim_start_matches('\u{feff}')
            } else {
                raw
            };

            match (TemplateLine::classify(raw), state) {
                (TemplateLine::Blank, _) => {}
                (TemplateLine::Marker { category }, _) => {
                    state = ParseState::InCategory(template.open_category(category));
                }
                (TemplateLine::Entry { name, .. }, ParseState::NoCategory) => {
                    return Err(TemplateError::Malformed {
                        line: index + 1,
                        content: name.to_string(),
                    });
                }
                (TemplateLine::Entry { name, url }, ParseState::InCategory(idx)) => {
                    template.add_entry(idx, name, url);
                }
            }
        }

        debug!(
            "Parsed template: {} categories, {} channels, {} distinct keys",
            template.categories.len(),
            template.channel_count(),
            template.keys.len()
        );
        Ok(template)
    }

    /// Read and parse a template file (UTF-8, BOM tolerated).
    pub async fn load(path: &Path) -> Result<Self, TemplateError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TemplateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(contents.lines())
    }

    fn open_category(&mut self, name: &str) -> usize {
        if let Some(idx) = self.categories.iter().position(|c| c.name == name) {
            return idx;
        }
        self.categories.push(Category {
            name: name.to_string(),
            channels: Vec::new(),
        });
        self.categories.len() - 1
    }

    fn add_entry(&mut self, category_idx: usize, name: &str, url: Option<&str>) {
        self.keys.insert(normalize(name));

        let category = &mut self.categories[category_idx];
        let pos = match category.channels.iter().position(|c| c.name == name) {
            Some(pos) => pos,
            None => {
                category.channels.push(ChannelEntry {
                    name: name.to_string(),
                    category: category.name.clone(),
                    known_urls: Vec::new(),
                });
                category.channels.len() - 1
            }
        };
        if let Some(url) = url {
            category.channels[pos].known_urls.push(url.to_string());
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Every channel in template order
    pub fn channels(&self) -> impl Iterator<Item = &ChannelEntry> {
        self.categories.iter().flat_map(|c| c.channels.iter())
    }

    pub fn channel_count(&self) -> usize {
        self.categories.iter().map(|c| c.channels.len()).sum()
    }

    /// Normalized keys of every template channel
    pub fn keys(&self) -> &HashSet<ChannelKey> {
        &self.keys
    }

    /// Known URLs of every template channel normalizing to `key`, in
    /// template order.
    pub fn known_urls(&self, key: &ChannelKey) -> Vec<&str> {
        self.channels()
            .filter(|entry| &entry.key() == key)
            .flat_map(|entry| entry.known_urls.iter().map(String::as_str))
            .collect()
    }
}
