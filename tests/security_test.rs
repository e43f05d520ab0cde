//! Security Tests
//!
//! Input limits, hostile input and markup injection through record values.

use std::io::Cursor;
use adfeed::{
    verify_feed, FeedError, FeedGeneratorBuilder, InputFormat, SecurityConfig,
};

fn limited(security: SecurityConfig) -> adfeed::FeedGenerator {
    FeedGeneratorBuilder::new()
        .with_security_config(security)
        .build()
        .unwrap()
}

#[test]
fn test_input_file_size_limit() {
    let generator = limited(SecurityConfig {
        max_input_file_size: 64,
        ..SecurityConfig::default()
    });
    let oversized = format!("[{}]", r#"{"vendorId": "V"},"#.repeat(10).trim_end_matches(','));

    match generator.generate(oversized.as_bytes(), InputFormat::Json, Vec::new()) {
        Err(FeedError::SecurityViolation(msg)) => {
            assert!(msg.contains("Input file size exceeds maximum"));
        }
        _ => panic!("Expected SecurityViolation error"),
    }

    // the XLSX path applies the same limit before calamine sees the bytes
    let result = generator.generate(Cursor::new(vec![0u8; 65]), InputFormat::Xlsx, Vec::new());
    assert!(matches!(result, Err(FeedError::SecurityViolation(_))));
}

#[test]
fn test_record_count_limit() {
    let generator = limited(SecurityConfig {
        max_record_count: 3,
        ..SecurityConfig::default()
    });
    let records = format!("[{}]", vec!["{}"; 4].join(","));

    match generator.read_records(records.as_bytes(), InputFormat::Json) {
        Err(FeedError::SecurityViolation(msg)) => assert!(msg.contains("Record count")),
        _ => panic!("Expected SecurityViolation error"),
    }
}

#[test]
fn test_truncated_workbook_is_rejected() {
    // ZIP local file header signature followed by garbage
    let mut data = b"PK\x03\x04".to_vec();
    data.extend_from_slice(&[0xFF; 128]);

    let generator = FeedGeneratorBuilder::new().build().unwrap();
    let result = generator.generate(Cursor::new(data), InputFormat::Xlsx, Vec::new());
    assert!(matches!(result, Err(FeedError::Parse(_))));
}

#[test]
fn test_non_record_json_is_rejected() {
    let generator = FeedGeneratorBuilder::new().build().unwrap();
    for input in [r#"{"records": []}"#, r#""text""#, "42", r#"[[1, 2]]"#] {
        let result = generator.generate(input.as_bytes(), InputFormat::Json, Vec::new());
        assert!(
            matches!(result, Err(FeedError::InvalidInput(_))),
            "input: {}",
            input
        );
    }
}

#[test]
fn test_markup_in_text_fields_is_escaped() {
    let input = r#"[{"Available": "TRUE", "vendorId": "V1",
        "title": "Flat</admarkt:title><admarkt:price>1</admarkt:price>",
        "description": "Nice", "categoryId": 5, "priceType": "FREE",
        "deal_type": "<rent & buy>"}]"#;

    let generator = FeedGeneratorBuilder::new().build().unwrap();
    let (xml, report) = generator
        .generate_to_string(input.as_bytes(), InputFormat::Json)
        .unwrap();

    assert_eq!(report.stats.processed_count, 1);
    assert!(xml.contains("Flat&lt;/admarkt:title&gt;&lt;admarkt:price&gt;1"));
    assert!(xml.contains("&lt;rent &amp; buy&gt;"));
    assert_eq!(xml.matches("<admarkt:price>").count(), 1);

    let verification = verify_feed(xml.as_bytes()).unwrap();
    assert!(verification.is_valid(), "{:?}", verification.issues);
}

#[test]
fn test_cdata_terminator_in_description() {
    let input = r#"[{"Available": "TRUE", "vendorId": "V1", "title": "Flat",
        "description": "<b>]]></admarkt:description><admarkt:ad></b>",
        "categoryId": 5, "priceType": "FREE"}]"#;

    let generator = FeedGeneratorBuilder::new().build().unwrap();
    let (xml, _) = generator
        .generate_to_string(input.as_bytes(), InputFormat::Json)
        .unwrap();

    assert!(xml.contains("<![CDATA[<b>]]]]><![CDATA[></admarkt:description><admarkt:ad></b>]]>"));
    let verification = verify_feed(xml.as_bytes()).unwrap();
    assert_eq!(verification.ad_count, 1);
    assert!(verification.is_valid(), "{:?}", verification.issues);
}

#[test]
fn test_valid_file_processing() {
    let generator = FeedGeneratorBuilder::new().build().unwrap();
    let input = r#"[{"Available": "YES", "vendorId": "V1", "title": "Flat",
        "description": "Nice", "categoryId": 5, "priceType": "SWAP"}]"#;

    let result = generator.generate(input.as_bytes(), InputFormat::Json, Vec::new());
    assert!(result.is_ok());
}
