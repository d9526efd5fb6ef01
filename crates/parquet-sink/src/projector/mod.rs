//! 이벤트 투영 -- 계층형 [`Event`]를 고정 폭 [`FlatRow`]로 변환합니다.
//!
//! 투영은 결정적이며 실패하지 않습니다. 파싱할 수 없는 값(타임스탬프, 포트,
//! base64 페이로드)은 0 또는 빈 값으로 대체되고, 대체가 일어날 때마다
//! `flatstore_projection_defaults_total{kind=...}` 카운터가 증가합니다.
//!
//! # 절단 규칙
//! - DNS 응답: 앞의 5개 (`_0` ~ `_4`)
//! - DNS 질의: 첫 번째 1개
//! - 인디케이터: 앞의 3개 (`_0` ~ `_2`)
//! - 주소 목록: 종류별로 마지막으로 일치한 항목
//!
//! # 사용 예시
//! ```
//! use flatstore_core::event::Event;
//! use flatstore_parquet_sink::projector::EventProjector;
//!
//! let event: Event = serde_json::from_str(
//!     r#"{"id":"e1","src":["ipv4:10.0.0.1","tcp:8080"]}"#,
//! ).unwrap();
//! let row = EventProjector::new(false).project(&event);
//! assert_eq!(row.src_ipv4_0, "10.0.0.1");
//! assert_eq!(row.src_tcp_0, 8080);
//! ```

mod headers;

pub use headers::{HEADER_ALLOW_LIST, HeaderSlot};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDateTime;
use metrics::counter;

use flatstore_core::event::{
    DnsMessage, Event, HttpRequest, HttpResponse, Icmp, Indicator, Location, Locations,
    NtpTimestamp, UnrecognisedPayload,
};
use flatstore_core::metrics as m;

use crate::row::FlatRow;

use headers::apply_headers;

/// 이벤트 타임스탬프 형식 (`YYYY-MM-DDTHH:MM:SS.mmmZ`, UTC)
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// DNS 응답 최대 컬럼 수
pub const MAX_DNS_ANSWERS: usize = 5;

/// 인디케이터 최대 컬럼 수
pub const MAX_INDICATORS: usize = 3;

/// 이벤트 투영기
///
/// 상태는 페이로드 포함 여부 하나뿐이므로 복사해서 여러 생산자가 공유할 수 있습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventProjector {
    include_payloads: bool,
}

impl EventProjector {
    /// 새 투영기를 생성합니다. `include_payloads`가 false면 페이로드 필드는 항상 비어 있습니다.
    pub fn new(include_payloads: bool) -> Self {
        Self { include_payloads }
    }

    /// 페이로드 포함 여부를 반환합니다.
    pub fn include_payloads(&self) -> bool {
        self.include_payloads
    }

    /// 이벤트 하나를 평면 행으로 투영합니다.
    pub fn project(&self, event: &Event) -> FlatRow {
        let mut row = FlatRow {
            id: event.id.clone(),
            action: event.action.clone(),
            device: event.device.clone(),
            time: event.time.clone(),
            network: event.network.clone(),
            url: event.url.clone(),
            risk: event.risk,
            origin: event.origin.clone(),
            ..Default::default()
        };

        if let Some((micros, mins)) = parse_event_time(&event.time) {
            row.time_micros = micros;
            row.time_mins = mins;
        }

        let src = project_addresses(&event.src);
        row.src_ipv4_0 = src.ipv4;
        row.src_ipv6_0 = src.ipv6;
        row.src_tcp_0 = src.tcp;
        row.src_udp_0 = src.udp;

        let dest = project_addresses(&event.dest);
        row.dest_ipv4_0 = dest.ipv4;
        row.dest_ipv6_0 = dest.ipv6;
        row.dest_tcp_0 = dest.tcp;
        row.dest_udp_0 = dest.udp;

        if let Some(dns) = &event.dns_message {
            project_dns(dns, &mut row);
        }
        if let Some(req) = &event.http_request {
            self.project_http_request(req, &mut row);
        }
        if let Some(resp) = &event.http_response {
            self.project_http_response(resp, &mut row);
        }
        if let Some(icmp) = &event.icmp {
            self.project_icmp(icmp, &mut row);
        }
        if let Some(location) = &event.location {
            project_locations(location, &mut row);
        }
        if let Some(ntp) = &event.ntp_timestamp {
            project_ntp(ntp, &mut row);
        }
        if let Some(datagram) = &event.unrecognised_datagram {
            let (payload, length, sha1) = self.project_unrecognised(datagram);
            row.unrecognised_datagram_payload = payload;
            row.unrecognised_datagram_payload_length = length;
            row.unrecognised_datagram_payload_sha1 = sha1;
        }
        if let Some(stream) = &event.unrecognised_stream {
            let (payload, length, sha1) = self.project_unrecognised(stream);
            row.unrecognised_stream_payload = payload;
            row.unrecognised_stream_payload_length = length;
            row.unrecognised_stream_payload_sha1 = sha1;
        }
        if let Some(indicators) = &event.indicators {
            project_indicators(indicators, &mut row);
        }

        row
    }

    fn project_http_request(&self, req: &HttpRequest, row: &mut FlatRow) {
        row.http_request_method.clone_from(&req.method);
        if self.include_payloads {
            row.http_body = decode_payload(&req.body);
        }
        apply_headers(&req.header, row);
    }

    fn project_http_response(&self, resp: &HttpResponse, row: &mut FlatRow) {
        row.http_response_status.clone_from(&resp.status);
        row.http_response_code = narrow(resp.code);
        if self.include_payloads {
            row.http_body = decode_payload(&resp.body);
        }
        apply_headers(&resp.header, row);
    }

    fn project_icmp(&self, icmp: &Icmp, row: &mut FlatRow) {
        row.icmp_code = narrow(icmp.code);
        row.icmp_type = narrow(icmp.kind);
        if self.include_payloads {
            row.icmp_payload = decode_payload(&icmp.payload);
        }
    }

    fn project_unrecognised(&self, payload: &UnrecognisedPayload) -> (Vec<u8>, i64, String) {
        let bytes = if self.include_payloads {
            decode_payload(&payload.payload)
        } else {
            Vec::new()
        };
        (bytes, payload.payload_length, payload.payload_hash.clone())
    }
}

/// 편의 함수: `EventProjector::new(include_payloads).project(event)`
pub fn project(event: &Event, include_payloads: bool) -> FlatRow {
    EventProjector::new(include_payloads).project(event)
}

/// 타임스탬프를 (epoch 마이크로초, epoch 분) 으로 변환합니다.
///
/// 분 값이 `i32`를 넘으면 하위 32비트만 남습니다. 빈 문자열은 `None`을 반환하고, 형식이 맞지 않으면 카운터를 증가시킨 뒤 `None`을 반환합니다.
pub fn parse_event_time(time: &str) -> Option<(i64, i32)> {
    if time.is_empty() {
        return None;
    }
    match NaiveDateTime::parse_from_str(time, TIME_FORMAT) {
        Ok(naive) => {
            let utc = naive.and_utc();
            Some((utc.timestamp_micros(), narrow(utc.timestamp().div_euclid(60))))
        }
        Err(_) => {
            counter!(m::PROJECTION_DEFAULTS_TOTAL, m::LABEL_KIND => m::KIND_TIMESTAMP)
                .increment(1);
            None
        }
    }
}

/// 64비트 정수를 `INT32` 컬럼 폭으로 줄입니다. 범위를 넘는 값은 하위 32비트만 남습니다.
fn narrow(value: i64) -> i32 {
    value as i32
}

#[derive(Debug, Default)]
struct Addresses {
    ipv4: String,
    ipv6: String,
    tcp: i32,
    udp: i32,
}

fn project_addresses(entries: &[String]) -> Addresses {
    let mut out = Addresses::default();
    for entry in entries {
        if let Some(ip) = entry.strip_prefix("ipv4:") {
            ip.clone_into(&mut out.ipv4);
        } else if let Some(ip) = entry.strip_prefix("ipv6:") {
            ip.clone_into(&mut out.ipv6);
        } else if let Some(port) = entry.strip_prefix("tcp:") {
            out.tcp = parse_port(port);
        } else if let Some(port) = entry.strip_prefix("udp:") {
            out.udp = parse_port(port);
        }
    }
    out
}

/// 부호 없는 10진수 포트를 파싱합니다. 실패하거나 `i32` 범위를 넘으면 0입니다.
pub fn parse_port(raw: &str) -> i32 {
    match raw.parse::<u32>().ok().and_then(|p| i32::try_from(p).ok()) {
        Some(port) => port,
        None => {
            counter!(m::PROJECTION_DEFAULTS_TOTAL, m::LABEL_KIND => m::KIND_PORT).increment(1);
            0
        }
    }
}

/// 표준 base64(패딩 포함)를 디코딩합니다. 실패하면 빈 바이트열입니다.
pub fn decode_payload(encoded: &str) -> Vec<u8> {
    match STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(_) => {
            counter!(m::PROJECTION_DEFAULTS_TOTAL, m::LABEL_KIND => m::KIND_BASE64).increment(1);
            Vec::new()
        }
    }
}

fn project_dns(dns: &DnsMessage, row: &mut FlatRow) {
    row.dns_message_type.clone_from(&dns.kind);

    if let Some(query) = dns.query.first() {
        row.dns_message_query_name_0.clone_from(&query.name);
        row.dns_message_query_type_0.clone_from(&query.kind);
        row.dns_message_query_class_0.clone_from(&query.class);
    }

    let slots: [(&mut String, &mut String); MAX_DNS_ANSWERS] = [
        (
            &mut row.dns_message_answer_name_0,
            &mut row.dns_message_answer_address_0,
        ),
        (
            &mut row.dns_message_answer_name_1,
            &mut row.dns_message_answer_address_1,
        ),
        (
            &mut row.dns_message_answer_name_2,
            &mut row.dns_message_answer_address_2,
        ),
        (
            &mut row.dns_message_answer_name_3,
            &mut row.dns_message_answer_address_3,
        ),
        (
            &mut row.dns_message_answer_name_4,
            &mut row.dns_message_answer_address_4,
        ),
    ];
    for ((name, address), answer) in slots.into_iter().zip(&dns.answer) {
        name.clone_from(&answer.name);
        address.clone_from(&answer.address);
    }
}

fn project_locations(locations: &Locations, row: &mut FlatRow) {
    if let Some(src) = &locations.src {
        project_location(
            src,
            LocationSlots {
                accuracy: &mut row.location_src_accuracy,
                asnum: &mut row.location_src_asnum,
                asorg: &mut row.location_src_asorg,
                city: &mut row.location_src_city,
                country: &mut row.location_src_country,
                iso: &mut row.location_src_iso,
                lat: &mut row.location_src_position_lat,
                lon: &mut row.location_src_position_lon,
                postcode: &mut row.location_src_postcode,
            },
        );
    }
    if let Some(dest) = &locations.dest {
        project_location(
            dest,
            LocationSlots {
                accuracy: &mut row.location_dest_accuracy,
                asnum: &mut row.location_dest_asnum,
                asorg: &mut row.location_dest_asorg,
                city: &mut row.location_dest_city,
                country: &mut row.location_dest_country,
                iso: &mut row.location_dest_iso,
                lat: &mut row.location_dest_position_lat,
                lon: &mut row.location_dest_position_lon,
                postcode: &mut row.location_dest_postcode,
            },
        );
    }
}

struct LocationSlots<'a> {
    accuracy: &'a mut i32,
    asnum: &'a mut i32,
    asorg: &'a mut String,
    city: &'a mut String,
    country: &'a mut String,
    iso: &'a mut String,
    lat: &'a mut f64,
    lon: &'a mut f64,
    postcode: &'a mut String,
}

fn project_location(location: &Location, slots: LocationSlots<'_>) {
    *slots.accuracy = narrow(location.accuracy);
    *slots.asnum = narrow(location.asnum);
    slots.asorg.clone_from(&location.asorg);
    slots.city.clone_from(&location.city);
    slots.country.clone_from(&location.country);
    slots.iso.clone_from(&location.iso);
    if let Some(position) = &location.position {
        *slots.lat = position.lat;
        *slots.lon = position.lon;
    }
    slots.postcode.clone_from(&location.postcode);
}

fn project_ntp(ntp: &NtpTimestamp, row: &mut FlatRow) {
    row.ntp_timestamp_mode = narrow(ntp.mode);
    row.ntp_timestamp_version = narrow(ntp.version);
}

fn project_indicators(indicators: &[Indicator], row: &mut FlatRow) {
    let slots: [[&mut String; 7]; MAX_INDICATORS] = [
        [
            &mut row.indicator_id_0,
            &mut row.indicator_type_0,
            &mut row.indicator_value_0,
            &mut row.indicator_description_0,
            &mut row.indicator_category_0,
            &mut row.indicator_author_0,
            &mut row.indicator_source_0,
        ],
        [
            &mut row.indicator_id_1,
            &mut row.indicator_type_1,
            &mut row.indicator_value_1,
            &mut row.indicator_description_1,
            &mut row.indicator_category_1,
            &mut row.indicator_author_1,
            &mut row.indicator_source_1,
        ],
        [
            &mut row.indicator_id_2,
            &mut row.indicator_type_2,
            &mut row.indicator_value_2,
            &mut row.indicator_description_2,
            &mut row.indicator_category_2,
            &mut row.indicator_author_2,
            &mut row.indicator_source_2,
        ],
    ];
    for (fields, indicator) in slots.into_iter().zip(indicators) {
        let values = [
            &indicator.id,
            &indicator.kind,
            &indicator.value,
            &indicator.description,
            &indicator.category,
            &indicator.author,
            &indicator.source,
        ];
        for (field, value) in fields.into_iter().zip(values) {
            field.clone_from(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatstore_core::event::{DnsAnswer, DnsQuery, Position};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn indicator(n: usize) -> Indicator {
        Indicator {
            id: format!("ind-{n}"),
            kind: "hostname".to_owned(),
            value: format!("bad{n}.example"),
            description: "test".to_owned(),
            category: "malware".to_owned(),
            author: "analyst".to_owned(),
            source: "feed".to_owned(),
        }
    }

    #[test]
    fn common_fields_are_copied_verbatim() {
        let event = Event {
            id: "e1".to_owned(),
            action: "dns_message".to_owned(),
            device: "sensor-1".to_owned(),
            network: "lab".to_owned(),
            url: "http://x/".to_owned(),
            risk: 0.75,
            origin: "device".to_owned(),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.id, "e1");
        assert_eq!(row.action, "dns_message");
        assert_eq!(row.device, "sensor-1");
        assert_eq!(row.network, "lab");
        assert_eq!(row.url, "http://x/");
        assert_eq!(row.risk, 0.75);
        assert_eq!(row.origin, "device");
    }

    #[test]
    fn empty_event_projects_to_default_row() {
        assert_eq!(project(&Event::default(), true), FlatRow::default());
    }

    #[test]
    fn valid_timestamp_yields_micros_and_minutes() {
        let event = Event {
            time: "2024-01-15T12:34:56.789Z".to_owned(),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.time, "2024-01-15T12:34:56.789Z");
        assert_eq!(row.time_micros, 1_705_322_096_789_000);
        assert_eq!(row.time_mins, 28_422_034);
    }

    #[test]
    fn epoch_timestamp_is_zero() {
        assert_eq!(parse_event_time("1970-01-01T00:00:00.000Z"), Some((0, 0)));
    }

    #[test]
    fn pre_epoch_minutes_round_down() {
        let (micros, mins) = parse_event_time("1969-12-31T23:59:30.000Z").unwrap();
        assert_eq!(micros, -30_000_000);
        assert_eq!(mins, -1);
    }

    #[test]
    fn far_future_timestamp_keeps_micros() {
        let (micros, mins) = parse_event_time("9999-12-31T23:59:59.000Z").unwrap();
        assert_eq!(micros, 253_402_300_799_000_000);
        assert_eq!(mins, narrow(253_402_300_799 / 60));
    }

    #[test]
    fn wide_integers_keep_low_32_bits() {
        let event = Event {
            location: Some(Locations {
                src: Some(Location {
                    asnum: 4_200_000_000,
                    ..Default::default()
                }),
                dest: None,
            }),
            http_response: Some(HttpResponse {
                code: 200,
                ..Default::default()
            }),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.location_src_asnum, 4_200_000_000u32 as i32);
        assert_eq!(row.http_response_code, 200);
    }

    #[test]
    fn malformed_timestamp_yields_zeros() {
        let event = Event {
            time: "yesterday".to_owned(),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.time, "yesterday");
        assert_eq!(row.time_micros, 0);
        assert_eq!(row.time_mins, 0);
    }

    #[test]
    fn address_list_fills_each_kind() {
        let event = Event {
            src: vec![
                "ipv4:10.0.0.1".to_owned(),
                "tcp:8080".to_owned(),
                "udp:53".to_owned(),
            ],
            dest: vec!["ipv6:fe80::1".to_owned()],
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.src_ipv4_0, "10.0.0.1");
        assert_eq!(row.src_tcp_0, 8080);
        assert_eq!(row.src_udp_0, 53);
        assert!(row.src_ipv6_0.is_empty());
        assert_eq!(row.dest_ipv6_0, "fe80::1");
    }

    #[test]
    fn last_matching_address_wins() {
        let event = Event {
            dest: vec!["tcp:80".to_owned(), "tcp:8080".to_owned()],
            ..Default::default()
        };
        assert_eq!(project(&event, false).dest_tcp_0, 8080);
    }

    #[test]
    fn unparsable_port_becomes_zero() {
        assert_eq!(parse_port("http"), 0);
        assert_eq!(parse_port(""), 0);
        assert_eq!(parse_port("-1"), 0);
        assert_eq!(parse_port("4294967296"), 0);
        assert_eq!(parse_port("3000000000"), 0);
        assert_eq!(parse_port("65535"), 65535);
    }

    #[test]
    fn unknown_address_tags_are_ignored() {
        let event = Event {
            src: vec!["mac:00:11:22:33:44:55".to_owned(), "ipv4".to_owned()],
            ..Default::default()
        };
        assert_eq!(project(&event, false), FlatRow::default());
    }

    #[test]
    fn dns_answers_truncate_to_five() {
        let answers = (0..7)
            .map(|i| DnsAnswer {
                name: format!("n{i}"),
                address: format!("10.0.0.{i}"),
            })
            .collect();
        let event = Event {
            dns_message: Some(DnsMessage {
                kind: "response".to_owned(),
                query: vec![
                    DnsQuery {
                        name: "example.com".to_owned(),
                        kind: "A".to_owned(),
                        class: "IN".to_owned(),
                    },
                    DnsQuery {
                        name: "ignored.com".to_owned(),
                        ..Default::default()
                    },
                ],
                answer: answers,
            }),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.dns_message_type, "response");
        assert_eq!(row.dns_message_query_name_0, "example.com");
        assert_eq!(row.dns_message_query_type_0, "A");
        assert_eq!(row.dns_message_query_class_0, "IN");
        assert_eq!(row.dns_message_answer_name_0, "n0");
        assert_eq!(row.dns_message_answer_address_4, "10.0.0.4");
    }

    #[test]
    fn dns_with_two_answers_leaves_rest_empty() {
        let event = Event {
            dns_message: Some(DnsMessage {
                answer: vec![
                    DnsAnswer {
                        name: "a".to_owned(),
                        address: "1.1.1.1".to_owned(),
                    },
                    DnsAnswer {
                        name: "b".to_owned(),
                        address: "2.2.2.2".to_owned(),
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.dns_message_answer_name_1, "b");
        assert!(row.dns_message_answer_name_2.is_empty());
        assert!(row.dns_message_answer_address_4.is_empty());
        assert!(row.dns_message_query_name_0.is_empty());
    }

    #[test]
    fn seven_indicators_keep_first_three() {
        let event = Event {
            indicators: Some((0..7).map(indicator).collect()),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.indicator_id_0, "ind-0");
        assert_eq!(row.indicator_id_1, "ind-1");
        assert_eq!(row.indicator_id_2, "ind-2");
        assert_eq!(row.indicator_value_2, "bad2.example");
        assert_eq!(row.indicator_source_2, "feed");
    }

    #[test]
    fn single_indicator_leaves_other_slots_empty() {
        let event = Event {
            indicators: Some(vec![indicator(0)]),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.indicator_type_0, "hostname");
        assert!(row.indicator_id_1.is_empty());
        assert!(row.indicator_author_1.is_empty());
        assert!(row.indicator_id_2.is_empty());
        assert!(row.indicator_source_2.is_empty());
    }

    #[test]
    fn http_header_allow_list_applies() {
        let header: HashMap<String, String> = [("Host", "a.com"), ("X-Custom", "1")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        let event = Event {
            http_request: Some(HttpRequest {
                method: "GET".to_owned(),
                header,
                body: String::new(),
            }),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.http_request_method, "GET");
        assert_eq!(row.http_header_host, "a.com");
    }

    #[test]
    fn response_body_wins_over_request_body() {
        let event = Event {
            http_request: Some(HttpRequest {
                body: STANDARD.encode("request"),
                ..Default::default()
            }),
            http_response: Some(HttpResponse {
                code: 404,
                status: "Not Found".to_owned(),
                body: STANDARD.encode("response"),
                ..Default::default()
            }),
            ..Default::default()
        };
        let row = project(&event, true);
        assert_eq!(row.http_body, b"response");
        assert_eq!(row.http_response_code, 404);
        assert_eq!(row.http_response_status, "Not Found");
    }

    #[test]
    fn payloads_omitted_unless_requested() {
        let event = Event {
            http_request: Some(HttpRequest {
                body: STANDARD.encode("secret"),
                ..Default::default()
            }),
            icmp: Some(Icmp {
                kind: 8,
                code: 0,
                payload: STANDARD.encode([1u8, 2, 3]),
            }),
            unrecognised_stream: Some(UnrecognisedPayload {
                payload: STANDARD.encode("raw"),
                payload_length: 3,
                payload_hash: "abc".to_owned(),
            }),
            ..Default::default()
        };

        let stripped = project(&event, false);
        assert!(stripped.http_body.is_empty());
        assert!(stripped.icmp_payload.is_empty());
        assert!(stripped.unrecognised_stream_payload.is_empty());
        assert_eq!(stripped.icmp_type, 8);
        assert_eq!(stripped.unrecognised_stream_payload_length, 3);
        assert_eq!(stripped.unrecognised_stream_payload_sha1, "abc");

        let full = project(&event, true);
        assert_eq!(full.http_body, b"secret");
        assert_eq!(full.icmp_payload, vec![1u8, 2, 3]);
        assert_eq!(full.unrecognised_stream_payload, b"raw");
    }

    #[test]
    fn invalid_base64_becomes_empty() {
        let event = Event {
            unrecognised_datagram: Some(UnrecognisedPayload {
                payload: "***not base64***".to_owned(),
                payload_length: 12,
                payload_hash: "h".to_owned(),
            }),
            ..Default::default()
        };
        let row = project(&event, true);
        assert!(row.unrecognised_datagram_payload.is_empty());
        assert_eq!(row.unrecognised_datagram_payload_length, 12);
    }

    #[test]
    fn location_positions_copied_only_when_present() {
        let event = Event {
            location: Some(Locations {
                src: Some(Location {
                    city: "Paris".to_owned(),
                    iso: "FR".to_owned(),
                    asnum: 3215,
                    accuracy: 50,
                    ..Default::default()
                }),
                dest: Some(Location {
                    country: "United Kingdom".to_owned(),
                    postcode: "SW1".to_owned(),
                    position: Some(Position {
                        lat: 51.5,
                        lon: -0.12,
                    }),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.location_src_city, "Paris");
        assert_eq!(row.location_src_asnum, 3215);
        assert_eq!(row.location_src_accuracy, 50);
        assert_eq!(row.location_src_position_lat, 0.0);
        assert_eq!(row.location_dest_country, "United Kingdom");
        assert_eq!(row.location_dest_postcode, "SW1");
        assert_eq!(row.location_dest_position_lat, 51.5);
        assert_eq!(row.location_dest_position_lon, -0.12);
    }

    #[test]
    fn ntp_fields_copied() {
        let event = Event {
            ntp_timestamp: Some(NtpTimestamp {
                version: 4,
                mode: 3,
            }),
            ..Default::default()
        };
        let row = project(&event, false);
        assert_eq!(row.ntp_timestamp_version, 4);
        assert_eq!(row.ntp_timestamp_mode, 3);
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        (
            ".{0,12}",
            prop::collection::vec("(ipv4|ipv6|tcp|udp|mac):[0-9a-z.:]{0,8}", 0..6),
            prop::collection::vec("(ipv4|tcp|udp):[0-9]{0,6}", 0..6),
            0usize..8,
            "[A-Za-z0-9+/=]{0,16}",
            any::<bool>(),
        )
            .prop_map(|(time, src, dest, n_ind, payload, has_icmp)| Event {
                time,
                src,
                dest,
                indicators: (n_ind > 0).then(|| (0..n_ind).map(indicator).collect()),
                icmp: has_icmp.then(|| Icmp {
                    payload,
                    ..Default::default()
                }),
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn projection_is_deterministic(event in arb_event(), include in any::<bool>()) {
            prop_assert_eq!(project(&event, include), project(&event, include));
        }

        #[test]
        fn stripped_projection_never_carries_payloads(event in arb_event()) {
            let row = project(&event, false);
            prop_assert!(row.icmp_payload.is_empty());
            prop_assert!(row.http_body.is_empty());
        }

        #[test]
        fn ports_are_never_negative(event in arb_event()) {
            let row = project(&event, true);
            prop_assert!(row.src_tcp_0 >= 0 && row.src_udp_0 >= 0);
            prop_assert!(row.dest_tcp_0 >= 0 && row.dest_udp_0 >= 0);
        }
    }
}
