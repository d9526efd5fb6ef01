#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flatstore_core::event::{
    DnsAnswer, DnsMessage, Event, HttpRequest, HttpResponse, Icmp, Indicator,
    UnrecognisedPayload,
};
use flatstore_parquet_sink::projector::project;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    time: String,
    src: Vec<String>,
    dest: Vec<String>,
    answers: Vec<String>,
    headers: Vec<(String, String)>,
    request_body: String,
    response_body: String,
    icmp_payload: String,
    datagram_payload: String,
    indicator_values: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let header: HashMap<String, String> = input.headers.into_iter().take(32).collect();

    let event = Event {
        time: input.time,
        src: input.src.into_iter().take(16).collect(),
        dest: input.dest.into_iter().take(16).collect(),
        dns_message: Some(DnsMessage {
            answer: input
                .answers
                .into_iter()
                .take(16)
                .map(|address| DnsAnswer {
                    address,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }),
        http_request: Some(HttpRequest {
            header: header.clone(),
            body: input.request_body,
            ..Default::default()
        }),
        http_response: Some(HttpResponse {
            header,
            body: input.response_body,
            ..Default::default()
        }),
        icmp: Some(Icmp {
            payload: input.icmp_payload,
            ..Default::default()
        }),
        unrecognised_datagram: Some(UnrecognisedPayload {
            payload: input.datagram_payload,
            ..Default::default()
        }),
        indicators: Some(
            input
                .indicator_values
                .into_iter()
                .take(8)
                .map(|value| Indicator {
                    value,
                    ..Default::default()
                })
                .collect(),
        ),
        ..Default::default()
    };

    let stripped = project(&event, false);
    assert!(stripped.http_body.is_empty());
    assert!(stripped.icmp_payload.is_empty());
    assert!(stripped.src_tcp_0 >= 0 && stripped.dest_udp_0 >= 0);

    // 같은 입력은 항상 같은 행을 만들어야 함
    let full = project(&event, true);
    assert_eq!(full, project(&event, true));
});
