//! Public API Types
//!
//! Enumerations used by the public API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a listing's price is to be interpreted
///
/// The set is closed. Input tokens are matched case-insensitively; the feed
/// always carries the upper-case token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    FixedPrice,
    Bidding,
    Negotiable,
    NotApplicable,
    CredibleBid,
    Swap,
    Free,
    Reserved,
    SeeDescription,
    OnDemand,
    BiddingFrom,
}

impl PriceType {
    /// Every price type, in schema order
    pub const ALL: [PriceType; 11] = [
        PriceType::FixedPrice,
        PriceType::Bidding,
        PriceType::Negotiable,
        PriceType::NotApplicable,
        PriceType::CredibleBid,
        PriceType::Swap,
        PriceType::Free,
        PriceType::Reserved,
        PriceType::SeeDescription,
        PriceType::OnDemand,
        PriceType::BiddingFrom,
    ];

    /// Upper-case token written to the feed
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::FixedPrice => "FIXED_PRICE",
            PriceType::Bidding => "BIDDING",
            PriceType::Negotiable => "NEGOTIABLE",
            PriceType::NotApplicable => "NOT_APPLICABLE",
            PriceType::CredibleBid => "CREDIBLE_BID",
            PriceType::Swap => "SWAP",
            PriceType::Free => "FREE",
            PriceType::Reserved => "RESERVED",
            PriceType::SeeDescription => "SEE_DESCRIPTION",
            PriceType::OnDemand => "ON_DEMAND",
            PriceType::BiddingFrom => "BIDDING_FROM",
        }
    }

    /// Whether the feed must carry a real, strictly positive price
    ///
    /// Only `FIXED_PRICE` and `BIDDING_FROM` do. Every other type still emits
    /// a price element, but its value is always `0`.
    pub fn requires_price(&self) -> bool {
        matches!(self, PriceType::FixedPrice | PriceType::BiddingFrom)
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not one of the eleven price types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPriceType(pub String);

impl fmt::Display for UnknownPriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown price type '{}'", self.0)
    }
}

impl std::error::Error for UnknownPriceType {}

impl FromStr for PriceType {
    type Err = UnknownPriceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        PriceType::ALL
            .iter()
            .copied()
            .find(|price_type| price_type.as_str() == upper)
            .ok_or(UnknownPriceType(upper))
    }
}

/// Format of the record set handed to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum InputFormat {
    /// XLSX workbook; the first row of the selected sheet is the header
    Xlsx,

    /// JSON array of flat objects
    ///
    /// ```json
    /// [
    ///   {"Available": "TRUE", "vendorId": "V1", "title": "Flat", "categoryId": 5}
    /// ]
    /// ```
    Json,
}

/// Rendering of the assembled feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OutputFormat {
    /// The advertisement feed document (default)
    ///
    /// ```xml
    /// <?xml version="1.0" encoding="UTF-8"?>
    /// <admarkt:ads xmlns:admarkt="http://admarkt.marktplaats.nl/schemas/1.0">
    ///   <admarkt:ad>
    ///     <admarkt:vendorId>V1</admarkt:vendorId>
    ///     ...
    ///   </admarkt:ad>
    /// </admarkt:ads>
    /// ```
    #[default]
    Xml,

    /// Listings and run statistics as pretty-printed JSON
    Json,
}

/// Worksheet selection for XLSX input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SheetSelector {
    /// Sheet by position (0-based)
    Index(usize),

    /// Sheet by name
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}
