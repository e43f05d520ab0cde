//! Attribute and Media Extraction Module
//!
//! Collects image URLs and attribute pairs from a validated record, using the
//! fixed column tables of the [`FeedSchema`].

use crate::fallback::resolve_area;
use crate::schema::FeedSchema;
use crate::types::{Attribute, Record};

/// Whether `url` is an absolute `http`/`https` URL (outer whitespace ignored)
pub fn is_absolute_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Images and attributes of one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Image URLs; the primary image, when valid, comes first
    pub images: Vec<String>,
    pub attributes: Vec<Attribute>,
}

/// Reads the image and attribute columns of a record
#[derive(Debug, Clone, Copy)]
pub struct AttributeAndMediaExtractor<'a> {
    schema: &'a FeedSchema,
}

impl<'a> AttributeAndMediaExtractor<'a> {
    pub fn new(schema: &'a FeedSchema) -> Self {
        Self { schema }
    }

    pub fn extract(&self, record: &Record) -> Extracted {
        Extracted {
            images: self.images(record),
            attributes: self.attributes(record),
        }
    }

    /// Listing URL, if the column holds an absolute URL
    pub fn url(&self, record: &Record) -> Option<String> {
        valid_url(record, &self.schema.url_column)
    }

    /// Primary image followed by the secondary slots; invalid entries dropped
    pub fn images(&self, record: &Record) -> Vec<String> {
        std::iter::once(&self.schema.primary_image_column)
            .chain(&self.schema.image_columns)
            .filter_map(|column| valid_url(record, column))
            .collect()
    }

    /// Attribute pairs in table order
    ///
    /// A column takes part when it exists in the record, even empty. The area
    /// column goes through [`resolve_area`]; other values are kept as cleaned
    /// text and dropped when empty.
    pub fn attributes(&self, record: &Record) -> Vec<Attribute> {
        self.schema
            .attribute_columns
            .iter()
            .filter(|column| record.contains(column))
            .filter_map(|column| {
                let cleaned = record.text(column);
                let value = if *column == self.schema.area_column {
                    resolve_area(&cleaned)
                } else {
                    cleaned
                };
                (!value.is_empty()).then(|| Attribute::new(column.clone(), value))
            })
            .collect()
    }
}

fn valid_url(record: &Record, column: &str) -> Option<String> {
    let text = record.text(column);
    is_absolute_url(&text).then_some(text)
}
