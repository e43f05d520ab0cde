//! Feed Verification Module
//!
//! Re-reads a rendered XML feed and checks every ad against the structural
//! rules of the marketplace schema. Malformed XML is an error; rule
//! violations are collected as [`VerificationIssue`]s.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fmt;

use crate::api::PriceType;
use crate::error::FeedError;
use crate::extract::is_absolute_url;
use crate::types::illegal_xml_char;
use crate::schema::{
    ATTRIBUTE_NAME_MAX_LENGTH, ATTRIBUTE_VALUE_MAX_LENGTH, FEED_NAMESPACE, FEED_PREFIX,
    VENDOR_ID_MAX_LENGTH,
};

/// Elements every ad must contain
const REQUIRED_ELEMENTS: [&str; 6] = [
    "vendorId",
    "title",
    "description",
    "categoryId",
    "priceType",
    "price",
];

/// A rule violation found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationIssue {
    /// 1-based position of the ad; 0 for document-level issues
    pub ad: usize,
    pub vendor_id: Option<String>,
    pub message: String,
}

impl fmt::Display for VerificationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ad, &self.vendor_id) {
            (0, _) => write!(f, "document: {}", self.message),
            (ad, Some(id)) => write!(f, "ad {} ({}): {}", ad, id, self.message),
            (ad, None) => write!(f, "ad {}: {}", ad, self.message),
        }
    }
}

/// Result of [`verify_feed`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub ad_count: usize,
    pub issues: Vec<VerificationIssue>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Element texts, images and attributes collected for one ad
#[derive(Debug, Default)]
struct AdElements {
    fields: HashMap<String, String>,
    images: Vec<String>,
    attributes: Vec<(String, String)>,
}

/// Verify a rendered XML feed
///
/// # Errors
///
/// `FeedError::Xml` when the document is not well-formed.
///
/// # Example
///
/// ```rust
/// let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
/// <admarkt:ads xmlns:admarkt="http://admarkt.marktplaats.nl/schemas/1.0"/>"#;
/// let report = adfeed::verify_feed(xml).unwrap();
/// assert_eq!(report.ad_count, 0);
/// assert!(report.is_valid());
/// ```
pub fn verify_feed(xml: &[u8]) -> Result<VerificationReport, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut report = VerificationReport::default();
    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut current: Option<AdElements> = None;
    let mut attribute_name = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if stack.is_empty() {
                    check_root(&name, namespace_of(&e, &reader)?, &mut report);
                }
                if name == "ad" {
                    current = Some(AdElements::default());
                }
                text.clear();
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if stack.is_empty() {
                    check_root(&name, namespace_of(&e, &reader)?, &mut report);
                }
                if let (Some(ad), "image") = (current.as_mut(), name.as_str()) {
                    let mut url = String::new();
                    for attr in e.attributes() {
                        let attr = attr.map_err(quick_xml::Error::from)?;
                        if attr.key.local_name().as_ref() == b"url" {
                            url = attr.decode_and_unescape_value(&reader)?.into_owned();
                        }
                    }
                    ad.images.push(url);
                }
            }
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                let value = std::mem::take(&mut text);
                if name == "ad" {
                    if let Some(ad) = current.take() {
                        report.ad_count += 1;
                        check_ad(report.ad_count, &ad, &mut report.issues);
                    }
                } else if let Some(ad) = current.as_mut() {
                    match name.as_str() {
                        "attributeName" => attribute_name = value,
                        "attributeValue" => ad
                            .attributes
                            .push((std::mem::take(&mut attribute_name), value)),
                        field if stack.last().map(String::as_str) == Some("ad") => {
                            ad.fields.insert(field.to_string(), value);
                        }
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Xml(quick_xml::Error::UnexpectedEof(format!(
            "element '{}' is not closed",
            open
        ))));
    }

    Ok(report)
}

fn namespace_of<B>(
    e: &quick_xml::events::BytesStart<'_>,
    reader: &Reader<B>,
) -> Result<Option<String>, FeedError> {
    let declaration = format!("xmlns:{}", FEED_PREFIX);
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == declaration.as_bytes() {
            return Ok(Some(attr.decode_and_unescape_value(reader)?.into_owned()));
        }
    }
    Ok(None)
}

fn check_root(name: &str, namespace: Option<String>, report: &mut VerificationReport) {
    if name != "ads" {
        report.issues.push(document_issue(format!(
            "root element must be 'ads', found '{}'",
            name
        )));
    }
    if namespace.as_deref() != Some(FEED_NAMESPACE) {
        report.issues.push(document_issue(format!(
            "root element must declare xmlns:{}=\"{}\"",
            FEED_PREFIX, FEED_NAMESPACE
        )));
    }
}

fn document_issue(message: String) -> VerificationIssue {
    VerificationIssue {
        ad: 0,
        vendor_id: None,
        message,
    }
}

fn check_ad(position: usize, ad: &AdElements, issues: &mut Vec<VerificationIssue>) {
    let vendor_id = ad.fields.get("vendorId").cloned();
    let mut issue = |message: String| {
        issues.push(VerificationIssue {
            ad: position,
            vendor_id: vendor_id.clone(),
            message,
        })
    };

    for element in REQUIRED_ELEMENTS {
        if !ad.fields.contains_key(element) {
            issue(format!("missing required element '{}'", element));
        }
    }

    let texts = ad
        .fields
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .chain(ad.images.iter().map(|url| ("image url", url.as_str())))
        .chain(ad.attributes.iter().flat_map(|(name, value)| {
            [("attributeName", name.as_str()), ("attributeValue", value.as_str())]
        }));
    let mut illegal: Vec<(&str, char)> = texts
        .filter_map(|(name, value)| illegal_xml_char(value).map(|c| (name, c)))
        .collect();
    illegal.sort_unstable();
    for (name, c) in illegal {
        issue(format!(
            "{} contains character U+{:04X} not allowed in XML",
            name, c as u32
        ));
    }

    if let Some(id) = ad.fields.get("vendorId") {
        let length = id.chars().count();
        if length > VENDOR_ID_MAX_LENGTH {
            issue(format!(
                "vendorId longer than {} characters ({})",
                VENDOR_ID_MAX_LENGTH, length
            ));
        }
    }

    if let Some(price_type) = ad.fields.get("priceType") {
        if !PriceType::ALL.iter().any(|p| p.as_str() == price_type.as_str()) {
            issue(format!("unknown priceType '{}'", price_type));
        }
    }

    if let Some(category) = ad.fields.get("categoryId") {
        match category.parse::<i64>() {
            Ok(id) if id > 0 => {}
            Ok(id) => issue(format!("categoryId must be positive, got {}", id)),
            Err(_) => issue(format!("categoryId is not an integer: '{}'", category)),
        }
    }

    if let Some(price) = ad.fields.get("price") {
        if price.parse::<u64>().is_err() {
            issue(format!("price is not a non-negative integer: '{}'", price));
        }
    }

    for url in &ad.images {
        if !is_absolute_url(url) {
            issue(format!("image url is not absolute: '{}'", url));
        }
    }

    for (name, value) in &ad.attributes {
        if name.chars().count() > ATTRIBUTE_NAME_MAX_LENGTH {
            issue(format!(
                "attribute name longer than {} characters: '{}'",
                ATTRIBUTE_NAME_MAX_LENGTH, name
            ));
        }
        if value.chars().count() > ATTRIBUTE_VALUE_MAX_LENGTH {
            issue(format!(
                "attribute value of '{}' longer than {} characters",
                name, ATTRIBUTE_VALUE_MAX_LENGTH
            ));
        }
    }
}
