//! RTMS XML payload parsing
//!
//! ```text
//! <response>
//!   <header><resultCode>000</resultCode><resultMsg>OK</resultMsg></header>
//!   <body>
//!     <items><item><aptNm>..</aptNm><dealAmount>82,500</dealAmount>..</item>..</items>
//!     <numOfRows>1000</numOfRows><pageNo>1</pageNo><totalCount>37</totalCount>
//!   </body>
//! </response>
//! ```
//!
//! Gateway failures (bad key, quota) come back as
//! `<OpenAPI_ServiceResponse><cmmMsgHeader>..<returnReasonCode>30</returnReasonCode>`
//! with HTTP 200, so they are detected here rather than from the status code.

use super::FetchError;
use crate::dataset::transaction::{parse_integer, parse_number};
use crate::dataset::Transaction;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Result codes the API uses for success
const SUCCESS_CODES: [&str; 2] = ["00", "000"];

#[derive(Debug, Clone, Default)]
pub struct TradePage {
    pub result_code: Option<String>,
    pub result_msg: Option<String>,
    pub total_count: usize,
    pub page_no: u32,
    pub items: Vec<Transaction>,
}

pub fn parse_page(xml: &str) -> Result<TradePage, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = TradePage::default();
    let mut gateway_code: Option<String> = None;
    let mut gateway_msg: Option<String> = None;

    let mut current_tag = String::new();
    let mut current_item: Option<HashMap<String, String>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "item" {
                    current_item = Some(HashMap::new());
                }
                current_tag = name;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| FetchError::Xml(err.to_string()))?
                    .trim()
                    .to_string();

                match current_item.as_mut() {
                    Some(fields) => {
                        fields.insert(current_tag.clone(), text);
                    }
                    None => match current_tag.as_str() {
                        "resultCode" => page.result_code = Some(text),
                        "resultMsg" => page.result_msg = Some(text),
                        "totalCount" => page.total_count = text.parse().unwrap_or(0),
                        "pageNo" => page.page_no = text.parse().unwrap_or(0),
                        "returnReasonCode" => gateway_code = Some(text),
                        "returnAuthMsg" | "errMsg" => {
                            gateway_msg.get_or_insert(text);
                        }
                        _ => {}
                    },
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(fields) = current_item.take() {
                        page.items.push(transaction_from_fields(&fields));
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::Xml(format!("XML parsing error: {}", e))),
            _ => {}
        }
    }

    if let Some(code) = gateway_code {
        return Err(FetchError::Api {
            code,
            message: gateway_msg.unwrap_or_default(),
        });
    }

    match page.result_code.as_deref() {
        Some(code) if SUCCESS_CODES.contains(&code) => Ok(page),
        Some(code) => Err(FetchError::Api {
            code: code.to_string(),
            message: page.result_msg.clone().unwrap_or_default(),
        }),
        None => Err(FetchError::Xml("response has no resultCode".to_string())),
    }
}

fn transaction_from_fields(fields: &HashMap<String, String>) -> Transaction {
    let text = |tag: &str| {
        fields
            .get(tag)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let number = |tag: &str| fields.get(tag).and_then(|s| parse_number(s));
    let int = |tag: &str| fields.get(tag).and_then(|s| parse_integer(s));

    Transaction {
        apartment_name: text("aptNm").unwrap_or_default(),
        apt_seq: text("aptSeq"),
        exclusive_area: number("excluUseAr"),
        deal_year: int("dealYear").and_then(|v| i32::try_from(v).ok()),
        deal_month: int("dealMonth").and_then(|v| u32::try_from(v).ok()),
        deal_day: int("dealDay").and_then(|v| u32::try_from(v).ok()),
        price: number("dealAmount"),
        building_year: int("buildYear").and_then(|v| i32::try_from(v).ok()),
        dong_name: text("umdNm"),
        sigungu_code: text("sggCd"),
        floor: int("floor").and_then(|v| i32::try_from(v).ok()),
        deal_date: None,
    }
    .with_assembled_date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<response>
  <header><resultCode>000</resultCode><resultMsg>OK</resultMsg></header>
  <body>
    <items>
      <item>
        <aptDong> </aptDong>
        <aptNm>상도파크자이</aptNm>
        <aptSeq>11590-2461</aptSeq>
        <buildYear>2016</buildYear>
        <dealAmount>   125,000</dealAmount>
        <dealDay>15</dealDay>
        <dealMonth>2</dealMonth>
        <dealYear>2020</dealYear>
        <excluUseAr>84.97</excluUseAr>
        <floor>11</floor>
        <sggCd>11590</sggCd>
        <umdNm>상도동</umdNm>
      </item>
      <item>
        <aptNm>흑석한강푸르지오</aptNm>
        <dealAmount>98,000</dealAmount>
        <dealDay>31</dealDay>
        <dealMonth>2</dealMonth>
        <dealYear>2020</dealYear>
        <excluUseAr>59.9</excluUseAr>
        <floor></floor>
        <umdNm>흑석동</umdNm>
      </item>
    </items>
    <numOfRows>1000</numOfRows>
    <pageNo>1</pageNo>
    <totalCount>2</totalCount>
  </body>
</response>"#;

    #[test]
    fn test_parse_items_and_counts() {
        let page = parse_page(PAGE).unwrap();

        assert_eq!(page.total_count, 2);
        assert_eq!(page.page_no, 1);
        assert_eq!(page.items.len(), 2);

        let first = &page.items[0];
        assert_eq!(first.apartment_name, "상도파크자이");
        assert_eq!(first.price, Some(125000.0));
        assert_eq!(first.exclusive_area, Some(84.97));
        assert_eq!(first.floor, Some(11));
        assert_eq!(first.dong_name.as_deref(), Some("상도동"));
        assert_eq!(first.deal_date, NaiveDate::from_ymd_opt(2020, 2, 15));

        // Feb 31 stays undated; empty floor stays absent
        let second = &page.items[1];
        assert_eq!(second.deal_date, None);
        assert_eq!(second.floor, None);
        assert_eq!(second.building_year, None);
    }

    #[test]
    fn test_empty_body() {
        let xml = "<response><header><resultCode>000</resultCode><resultMsg>OK</resultMsg></header>\
                   <body><items/><numOfRows>1000</numOfRows><pageNo>1</pageNo><totalCount>0</totalCount></body></response>";
        let page = parse_page(xml).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_api_error_code() {
        let xml = "<response><header><resultCode>03</resultCode><resultMsg>NO_DATA</resultMsg></header></response>";
        match parse_page(xml) {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, "03");
                assert_eq!(message, "NO_DATA");
            }
            other => panic!("expected Api error, got {:?}", other.map(|p| p.items.len())),
        }
    }

    #[test]
    fn test_gateway_error_envelope() {
        let xml = "<OpenAPI_ServiceResponse><cmmMsgHeader>\
                   <errMsg>SERVICE ERROR</errMsg>\
                   <returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg>\
                   <returnReasonCode>30</returnReasonCode>\
                   </cmmMsgHeader></OpenAPI_ServiceResponse>";
        match parse_page(xml) {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, "30");
                assert_eq!(message, "SERVICE ERROR");
            }
            other => panic!("expected Api error, got {:?}", other.map(|p| p.items.len())),
        }
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_page("<response><header></body>"),
            Err(FetchError::Xml(_))
        ));
    }
}
