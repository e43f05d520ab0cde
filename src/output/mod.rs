//! Output Format Module
//!
//! Renders an assembled [`Feed`] in the configured output format.

mod formatters;

use crate::api::OutputFormat;
use crate::error::FeedError;
use crate::types::Feed;
use std::io::Write;

pub use formatters::*;

/// Feed renderer selected from an [`OutputFormat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatter {
    Xml,
    Json,
}

impl OutputFormatter {
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Xml => OutputFormatter::Xml,
            OutputFormat::Json => OutputFormatter::Json,
        }
    }

    /// Write the feed to `writer`
    pub fn render<W: Write>(&self, feed: &Feed, writer: &mut W) -> Result<(), FeedError> {
        match self {
            OutputFormatter::Xml => XmlFeedFormatter.render(feed, writer),
            OutputFormatter::Json => JsonFeedFormatter.render(feed, writer),
        }
    }
}
