//! XML 文件攤平成表格資料。
//!
//! 根節點的每個子元素成為一筆 [`Record`]：子元素的直接子節點以
//! 標籤名稱為欄位、自身文字為值；屬性則加上 [`ATTRIBUTE_PREFIX`] 前綴。
//! 只攤平一層，更深的巢狀結構不保留。

use crate::domain::model::{DataSummary, HeaderSet, Record};
use crate::utils::error::{Result, SheetCastError};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::bytes;
use std::borrow::Cow;

/// 屬性欄位的前綴。若元素本身就叫 `attr_xxx` 會與屬性撞名，後寫入者勝出。
pub const ATTRIBUTE_PREFIX: &str = "attr_";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// 元素自身的文字 (不含子元素的文字)
    pub text: String,
    pub children: Vec<XmlElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

fn xml_error(message: impl Into<String>) -> SheetCastError {
    SheetCastError::XmlParseError {
        message: message.into(),
    }
}

/// 解析完整的 XML 文件；任何格式錯誤都回傳錯誤，不產生部分結果
pub fn parse(raw: &[u8]) -> Result<XmlDocument> {
    tracing::debug!(size = raw.len(), "Parsing XML content");

    let content = decode_document(raw)?;

    // 不在讀取階段修剪文字，片段間的空白要保留到 flatten_element 才整體修剪
    let mut reader = Reader::from_str(&content);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root.is_some() && stack.is_empty() {
                    return Err(xml_error("document has more than one root element"));
                }
                stack.push(element_from_start(&e)?);
            }
            Event::Empty(e) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error("closing tag without matching opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|err| xml_error(format!("CDATA is not valid UTF-8: {}", err)))?;
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            // 宣告、註解、處理指令與 DOCTYPE 不影響資料
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(format!("element <{}> is never closed", open.name)));
    }

    let root = root.ok_or_else(|| xml_error("document has no root element"))?;

    tracing::debug!(
        root_element = %root.name,
        children_count = root.children.len(),
        "XML parsed successfully"
    );

    Ok(XmlDocument { root })
}

/// 依 BOM 或 XML 宣告的 encoding 轉成 UTF-8；兩者皆無時視為 UTF-8
fn decode_document(raw: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, body) = match Encoding::for_bom(raw) {
        Some((encoding, bom_len)) => (encoding, &raw[bom_len..]),
        None => (declared_encoding(raw)?, raw),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| xml_error(format!("content is not valid {}", encoding.name())))
}

fn declared_encoding(raw: &[u8]) -> Result<&'static Encoding> {
    let declaration =
        bytes::Regex::new(r#"^\s*<\?xml\s[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
            .map_err(|e| xml_error(format!("invalid encoding pattern: {}", e)))?;

    let Some(label) = declaration.captures(raw).and_then(|c| c.get(1)) else {
        return Ok(UTF_8);
    };

    match Encoding::for_label(label.as_bytes()) {
        // 沒有 BOM 卻能以 ASCII 讀到宣告，內容不可能是 UTF-16
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => Ok(UTF_8),
        Some(encoding) => Ok(encoding),
        None => Err(xml_error(format!(
            "unsupported encoding '{}'",
            String::from_utf8_lossy(label.as_bytes())
        ))),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| xml_error(format!("invalid element name: {}", e)))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| xml_error(format!("invalid attribute name: {}", e)))?;
        // 命名空間宣告不是資料
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key.to_string(), value));
    }

    Ok(XmlElement {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_some() {
                return Err(xml_error("document has more than one root element"));
            }
            *root = Some(element);
        }
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(xml_error("text found outside of the root element")),
    }
}

/// 根節點的每個直接子元素產生一筆 Record，順序與文件一致
pub fn extract_records(document: &XmlDocument) -> Vec<Record> {
    let records: Vec<Record> = document.root.children.iter().map(flatten_element).collect();
    tracing::debug!(records_count = records.len(), "Data extraction completed");
    records
}

fn flatten_element(element: &XmlElement) -> Record {
    let mut record = Record::new();

    for child in &element.children {
        record.insert(child.name.as_str(), child.text.trim());
    }

    for (name, value) in &element.attributes {
        record.insert(format!("{}{}", ATTRIBUTE_PREFIX, name), value.as_str());
    }

    record
}

/// 所有 Record 欄位名稱的聯集，依首次出現順序
pub fn derive_headers(records: &[Record]) -> HeaderSet {
    let mut headers = HeaderSet::new();
    for key in records.iter().flat_map(Record::keys) {
        headers.push(key);
    }
    headers
}

pub fn summarize(records: &[Record]) -> DataSummary {
    DataSummary {
        total_records: records.len(),
        fields: derive_headers(records).to_vec(),
        sample_record: records.first().cloned().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ITEMS: &str = r#"<?xml version="1.0"?><root><item><name>Test</name><price>10.00</price></item><item><name>Test2</name><price>20.00</price></item></root>"#;

    #[test]
    fn test_parse_valid_xml() {
        let document = parse(TWO_ITEMS.as_bytes()).unwrap();
        assert_eq!(document.root.name, "root");
        assert_eq!(document.root.children.len(), 2);
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        let err = parse(b"invalid xml content").unwrap_err();
        assert!(matches!(err, SheetCastError::XmlParseError { .. }));
    }

    #[test]
    fn test_parse_rejects_unclosed_tag() {
        assert!(parse(b"<root><item><name>Test</name></item>").is_err());
    }

    #[test]
    fn test_parse_rejects_mismatched_tag() {
        assert!(parse(b"<root><item></product></root>").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_entity() {
        assert!(parse(b"<root><item><name>Fish &chips;</name></item></root>").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_input_and_multiple_roots() {
        assert!(parse(b"").is_err());
        assert!(parse(b"   ").is_err());
        assert!(parse(b"<a/><b/>").is_err());
    }

    #[test]
    fn test_extract_two_items() {
        let document = parse(TWO_ITEMS.as_bytes()).unwrap();
        let records = extract_records(&document);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Test"));
        assert_eq!(records[0].get("price"), Some("10.00"));
        assert_eq!(records[1].get("name"), Some("Test2"));
        assert_eq!(records[1].get("price"), Some("20.00"));

        let headers = derive_headers(&records);
        assert_eq!(headers.to_vec(), vec!["name", "price"]);
    }

    #[test]
    fn test_extract_attributes_with_prefix_after_children() {
        let xml = br#"<catalog><product id="42" sku="A-1"><title>Beans</title></product></catalog>"#;
        let records = extract_records(&parse(xml).unwrap());

        assert_eq!(
            records[0].keys().collect::<Vec<_>>(),
            vec!["title", "attr_id", "attr_sku"]
        );
        assert_eq!(records[0].get("attr_id"), Some("42"));
    }

    #[test]
    fn test_extract_only_one_level_deep() {
        let xml = br#"<root><item><name>Mug</name><size><w>10</w><h>12</h></size></item></root>"#;
        let records = extract_records(&parse(xml).unwrap());

        assert_eq!(records[0].get("name"), Some("Mug"));
        assert_eq!(records[0].get("size"), Some(""));
        assert!(records[0].get("w").is_none());
    }

    #[test]
    fn test_extract_unescapes_text_and_cdata() {
        let xml = br#"<root><item><name>Salt &amp; Pepper</name><desc><![CDATA[<b>bold</b>]]></desc></item></root>"#;
        let records = extract_records(&parse(xml).unwrap());

        assert_eq!(records[0].get("name"), Some("Salt & Pepper"));
        assert_eq!(records[0].get("desc"), Some("<b>bold</b>"));
    }

    #[test]
    fn test_empty_root_yields_no_records() {
        let records = extract_records(&parse(b"<root></root>").unwrap());
        assert!(records.is_empty());
        assert!(derive_headers(&records).is_empty());

        let records = extract_records(&parse(b"<root/>").unwrap());
        assert!(records.is_empty());
    }

    #[test]
    fn test_empty_child_is_kept() {
        let xml = b"<root><item><name>A</name></item><item/><item><name>C</name></item></root>";
        let records = extract_records(&parse(xml).unwrap());

        assert_eq!(records.len(), 3);
        assert!(records[1].is_empty());
        assert_eq!(records[2].get("name"), Some("C"));
    }

    #[test]
    fn test_pretty_printed_feed_is_trimmed() {
        let xml = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- feed -->\n<root>\n  <item>\n    <name>\n      Espresso\n    </name>\n  </item>\n</root>\n";
        let records = extract_records(&parse(xml).unwrap());
        assert_eq!(records[0].get("name"), Some("Espresso"));
    }

    #[test]
    fn test_whitespace_between_text_segments_is_kept() {
        let xml = b"<root><item><desc>Fish <![CDATA[&]]> Chips</desc><note>Hello <!-- c --> World</note></item></root>";
        let records = extract_records(&parse(xml).unwrap());

        assert_eq!(records[0].get("desc"), Some("Fish & Chips"));
        assert_eq!(records[0].get("note"), Some("Hello  World"));
    }

    #[test]
    fn test_parse_latin1_declared_feed() {
        let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><root><item><name>Caf\xE9</name></item></root>";
        let records = extract_records(&parse(xml).unwrap());

        assert_eq!(records[0].get("name"), Some("Caf\u{e9}"));
    }

    #[test]
    fn test_parse_utf8_bom_and_default_encoding() {
        let xml = "\u{feff}<root><item><name>Caf\u{e9}</name></item></root>";
        let records = extract_records(&parse(xml.as_bytes()).unwrap());
        assert_eq!(records[0].get("name"), Some("Caf\u{e9}"));

        // 未宣告編碼時必須是 UTF-8
        let err = parse(b"<root><item><name>Caf\xE9</name></item></root>").unwrap_err();
        assert!(matches!(err, SheetCastError::XmlParseError { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_declared_encoding() {
        let err = parse(b"<?xml version=\"1.0\" encoding=\"x-made-up\"?><root/>").unwrap_err();
        assert!(err.to_string().contains("unsupported encoding"));
    }

    #[test]
    fn test_derive_headers_union_in_first_seen_order() {
        let records = vec![
            Record::from_iter([("name", "Test1"), ("price", "10.00")]),
            Record::from_iter([("name", "Test2"), ("price", "20.00"), ("category", "A")]),
            Record::from_iter([("category", "B"), ("attr_id", "7")]),
        ];
        let headers = derive_headers(&records);

        assert_eq!(headers.to_vec(), vec!["name", "price", "category", "attr_id"]);
        for record in &records {
            assert!(record.keys().all(|key| headers.contains(key)));
        }
    }

    #[test]
    fn test_summarize() {
        let records = extract_records(&parse(TWO_ITEMS.as_bytes()).unwrap());
        let summary = summarize(&records);

        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.fields, vec!["name", "price"]);
        assert_eq!(summary.sample_record.get("name"), Some("Test"));

        let empty = summarize(&[]);
        assert_eq!(empty.total_records, 0);
        assert!(empty.sample_record.is_empty());
    }
}
