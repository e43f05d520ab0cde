//! Output Formatters
//!
//! - [`XmlFeedFormatter`]: the namespaced feed document consumed by the
//!   marketplace
//! - [`JsonFeedFormatter`]: listings and statistics as JSON, for inspection

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::error::FeedError;
use crate::schema::{FEED_NAMESPACE, FEED_PREFIX};
use crate::types::{Feed, Listing};

/// Writes the feed as an XML document
///
/// ```text
/// <?xml version="1.0" encoding="UTF-8"?>
/// <admarkt:ads xmlns:admarkt="...">
///   <admarkt:ad>
///     <admarkt:vendorId>..</admarkt:vendorId>
///     <admarkt:title>..</admarkt:title>
///     <admarkt:description><![CDATA[..]]></admarkt:description>
///     <admarkt:categoryId>..</admarkt:categoryId>
///     <admarkt:priceType>..</admarkt:priceType>
///     <admarkt:price>..</admarkt:price>
///     <admarkt:url>..</admarkt:url>                 (optional)
///     <admarkt:media><admarkt:image url=".."/></admarkt:media>   (optional)
///     <admarkt:attributes>                          (optional)
///       <admarkt:attribute>
///         <admarkt:attributeName>..</admarkt:attributeName>
///         <admarkt:attributeValue>..</admarkt:attributeValue>
///       </admarkt:attribute>
///     </admarkt:attributes>
///   </admarkt:ad>
/// </admarkt:ads>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFeedFormatter;

impl XmlFeedFormatter {
    pub fn render<W: Write>(&self, feed: &Feed, writer: &mut W) -> Result<(), FeedError> {
        {
            let mut xml = Writer::new_with_indent(&mut *writer, b' ', 2);
            xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

            let root = qualified("ads");
            let namespace_attr = format!("xmlns:{}", FEED_PREFIX);
            xml.write_event(Event::Start(
                BytesStart::new(root.as_str())
                    .with_attributes([(namespace_attr.as_str(), FEED_NAMESPACE)]),
            ))?;

            for listing in &feed.listings {
                write_ad(&mut xml, listing)?;
            }

            xml.write_event(Event::End(BytesEnd::new(root.as_str())))?;
        }
        writeln!(writer)?;
        writer.flush()?;

        Ok(())
    }
}

fn qualified(local: &str) -> String {
    format!("{}:{}", FEED_PREFIX, local)
}

fn write_ad<W: Write>(xml: &mut Writer<W>, listing: &Listing) -> Result<(), FeedError> {
    let ad = qualified("ad");
    xml.write_event(Event::Start(BytesStart::new(ad.as_str())))?;

    write_text_element(xml, "vendorId", listing.vendor_id())?;
    write_text_element(xml, "title", listing.title())?;
    write_cdata_element(xml, "description", listing.description())?;
    write_text_element(xml, "categoryId", &listing.category_id().to_string())?;
    write_text_element(xml, "priceType", listing.price_type().as_str())?;
    write_text_element(xml, "price", &listing.price().to_string())?;

    if let Some(url) = listing.url() {
        write_text_element(xml, "url", url)?;
    }

    if !listing.images().is_empty() {
        let media = qualified("media");
        let image = qualified("image");
        xml.write_event(Event::Start(BytesStart::new(media.as_str())))?;
        for url in listing.images() {
            xml.write_event(Event::Empty(
                BytesStart::new(image.as_str()).with_attributes([("url", url.as_str())]),
            ))?;
        }
        xml.write_event(Event::End(BytesEnd::new(media.as_str())))?;
    }

    if !listing.attributes().is_empty() {
        let attributes = qualified("attributes");
        let attribute = qualified("attribute");
        xml.write_event(Event::Start(BytesStart::new(attributes.as_str())))?;
        for pair in listing.attributes() {
            xml.write_event(Event::Start(BytesStart::new(attribute.as_str())))?;
            write_text_element(xml, "attributeName", &pair.name)?;
            write_text_element(xml, "attributeValue", &pair.value)?;
            xml.write_event(Event::End(BytesEnd::new(attribute.as_str())))?;
        }
        xml.write_event(Event::End(BytesEnd::new(attributes.as_str())))?;
    }

    xml.write_event(Event::End(BytesEnd::new(ad.as_str())))?;
    Ok(())
}

fn write_text_element<W: Write>(
    xml: &mut Writer<W>,
    local: &str,
    text: &str,
) -> Result<(), FeedError> {
    let name = qualified(local);
    xml.write_event(Event::Start(BytesStart::new(name.as_str())))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

fn write_cdata_element<W: Write>(
    xml: &mut Writer<W>,
    local: &str,
    text: &str,
) -> Result<(), FeedError> {
    let name = qualified(local);
    xml.write_event(Event::Start(BytesStart::new(name.as_str())))?;
    for section in cdata_sections(text) {
        xml.write_event(Event::CData(BytesCData::new(section)))?;
    }
    xml.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

/// Split text so that no section contains the CDATA terminator
///
/// `a]]>b` becomes `a]]` and `>b`; the sections concatenate back to the input.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

/// Writes the feed (listings and statistics) as pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFeedFormatter;

impl JsonFeedFormatter {
    pub fn render<W: Write>(&self, feed: &Feed, writer: &mut W) -> Result<(), FeedError> {
        serde_json::to_writer_pretty(&mut *writer, feed)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::FeedAssembler;
    use crate::builder::FeedConfig;
    use crate::types::Record;

    fn feed() -> Feed {
        let config = FeedConfig::default();
        let records = vec![
            Record::new()
                .field("Available", "yes")
                .field("vendorId", "V&1")
                .field("title", "Flat <3 rooms>")
                .field("description", "Spacious\n\nQuiet")
                .field("categoryId", 12i64)
                .field("priceType", "FIXED_PRICE")
                .field("price", 950.5)
                .field("url", "https://shop.example/ads/1")
                .field("image_link", "https://cdn.example/1.jpg")
                .field("img_2", "https://cdn.example/2.jpg?a=1&b=2")
                .field("area_sqm", 80i64)
                .field("deal_type", "rent"),
            Record::new()
                .field("Available", "TRUE")
                .field("vendorId", "V2")
                .field("title", "Garage")
                .field("description", "Dry")
                .field("categoryId", "7")
                .field("priceType", "free"),
        ];
        FeedAssembler::new(&config).assemble(&records)
    }

    fn render_xml(feed: &Feed) -> String {
        let mut buffer = Vec::new();
        XmlFeedFormatter.render(feed, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_xml_document_layout() {
        let xml = render_xml(&feed());

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            r#"<admarkt:ads xmlns:admarkt="http://admarkt.marktplaats.nl/schemas/1.0">"#
        ));
        assert_eq!(xml.matches("<admarkt:ad>").count(), 2);
        assert!(xml.contains("<admarkt:vendorId>V&amp;1</admarkt:vendorId>"));
        assert!(xml.contains("<admarkt:title>Flat &lt;3 rooms&gt;</admarkt:title>"));
        assert!(xml.contains(
            "<admarkt:description><![CDATA[<p>Spacious</p><p>Quiet</p>]]></admarkt:description>"
        ));
        assert!(xml.contains("<admarkt:categoryId>12</admarkt:categoryId>"));
        assert!(xml.contains("<admarkt:priceType>FIXED_PRICE</admarkt:priceType>"));
        assert!(xml.contains("<admarkt:price>950</admarkt:price>"));
        assert!(xml.contains("<admarkt:url>https://shop.example/ads/1</admarkt:url>"));
        assert!(xml.contains(r#"<admarkt:image url="https://cdn.example/1.jpg"/>"#));
        assert!(xml.contains(r#"<admarkt:image url="https://cdn.example/2.jpg?a=1&amp;b=2"/>"#));
        assert!(xml.contains("<admarkt:attributeName>area_sqm</admarkt:attributeName>"));
        assert!(xml.contains("<admarkt:attributeValue>80</admarkt:attributeValue>"));
        assert!(xml.trim_end().ends_with("</admarkt:ads>"));
    }

    #[test]
    fn test_xml_child_order() {
        let xml = render_xml(&feed());
        let first_ad = &xml[..xml.find("</admarkt:ad>").unwrap()];
        let order = [
            "<admarkt:vendorId>",
            "<admarkt:title>",
            "<admarkt:description>",
            "<admarkt:categoryId>",
            "<admarkt:priceType>",
            "<admarkt:price>",
            "<admarkt:url>",
            "<admarkt:media>",
            "<admarkt:attributes>",
        ];
        let positions: Vec<usize> = order.iter().map(|tag| first_ad.find(tag).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_optional_sections_omitted() {
        let xml = render_xml(&feed());
        let second_ad = &xml[xml.rfind("<admarkt:ad>").unwrap()..];
        assert!(second_ad.contains("<admarkt:price>0</admarkt:price>"));
        assert!(!second_ad.contains("<admarkt:url>"));
        assert!(!second_ad.contains("<admarkt:media>"));
        assert!(!second_ad.contains("<admarkt:attributes>"));
    }

    #[test]
    fn test_empty_feed_is_well_formed() {
        let xml = render_xml(&Feed::default());
        assert!(xml.contains("<admarkt:ads"));
        assert!(xml.contains("</admarkt:ads>"));
        assert!(!xml.contains("<admarkt:ad>"));
    }

    #[test]
    fn test_cdata_sections() {
        assert_eq!(cdata_sections("plain"), vec!["plain"]);
        assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_sections("]]>]]>"), vec!["]]", ">]]", ">"]);
        assert_eq!(cdata_sections("x]]>y]]>z").concat(), "x]]>y]]>z");
    }

    #[test]
    fn test_json_output() {
        let mut buffer = Vec::new();
        JsonFeedFormatter.render(&feed(), &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value["listings"][0]["vendorId"], "V&1");
        assert_eq!(value["listings"][0]["priceType"], "FIXED_PRICE");
        assert_eq!(value["listings"][1]["price"], 0);
        assert_eq!(value["stats"]["processedCount"], 2);
        assert_eq!(value["stats"]["errors"], serde_json::json!([]));
    }
}
