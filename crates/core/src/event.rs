//! 이벤트 모델 -- 프로브가 내보내는 계층형 텔레메트리 이벤트
//!
//! [`Event`]는 JSON 문서 하나에 대응하는 입력 레코드입니다.
//! 프로토콜별 페이로드(DNS, HTTP, ICMP 등)는 모두 `Option` 필드로 표현되며,
//! 0개 이상이 동시에 존재할 수 있습니다. 키가 없거나 값이 `null`인 필드는
//! 기본값이 됩니다. 정수 필드는 `i64`로 받고, 컬럼 폭으로 줄이는 일은 투영 단계가 맡습니다.
//!
//! # 입력 예시
//! ```
//! use flatstore_core::event::Event;
//!
//! let raw = br#"{
//!     "id": "6c1f6b2e",
//!     "action": "dns_message",
//!     "device": "sensor-1",
//!     "time": "2024-01-15T12:00:00.123Z",
//!     "src": ["ipv4:10.0.0.1", "udp:53"],
//!     "dest": ["ipv4:10.0.0.2", "udp:40000"],
//!     "dns_message": {"type": "query", "query": [{"name": "example.com"}]}
//! }"#;
//! let event: Event = serde_json::from_slice(raw).unwrap();
//! assert_eq!(event.device, "sensor-1");
//! assert!(event.dns_message.is_some());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// `null`을 기본값으로 역직렬화합니다. 키가 없을 때는 컨테이너의 `#[serde(default)]`가 적용됩니다.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 프로브 이벤트
///
/// 공통 식별 필드와 주소 목록, 그리고 선택적 프로토콜 페이로드로 구성됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// 이벤트 ID
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// 이벤트 종류 (예: "dns_message", "http_request")
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    /// 이벤트를 보고한 장치 ID
    #[serde(deserialize_with = "null_as_default")]
    pub device: String,
    /// 장치가 보고한 시각 (`YYYY-MM-DDTHH:MM:SS.mmmZ`)
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    /// 네트워크 이름
    #[serde(deserialize_with = "null_as_default")]
    pub network: String,
    /// 관련 URL
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    /// 위험도 점수
    #[serde(deserialize_with = "null_as_default")]
    pub risk: f64,
    /// 이벤트 출처
    #[serde(deserialize_with = "null_as_default")]
    pub origin: String,
    /// 출발지 주소 목록 (태그 문자열, 예: `"ipv4:1.2.3.4"`, `"tcp:80"`)
    #[serde(deserialize_with = "null_as_default")]
    pub src: Vec<String>,
    /// 목적지 주소 목록
    #[serde(deserialize_with = "null_as_default")]
    pub dest: Vec<String>,

    pub dns_message: Option<DnsMessage>,
    pub http_request: Option<HttpRequest>,
    pub http_response: Option<HttpResponse>,
    pub icmp: Option<Icmp>,
    pub location: Option<Locations>,
    pub ntp_timestamp: Option<NtpTimestamp>,
    pub unrecognised_datagram: Option<UnrecognisedPayload>,
    pub unrecognised_stream: Option<UnrecognisedPayload>,
    pub indicators: Option<Vec<Indicator>>,
}

/// DNS 메시지
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsMessage {
    /// 메시지 종류 ("query" / "response")
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub query: Vec<DnsQuery>,
    #[serde(deserialize_with = "null_as_default")]
    pub answer: Vec<DnsAnswer>,
}

/// DNS 질의 항목
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsQuery {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub class: String,
}

/// DNS 응답 항목
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsAnswer {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
}

/// HTTP 요청
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub header: HashMap<String, String>,
    /// base64 인코딩된 본문
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
}

/// HTTP 응답
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub code: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub header: HashMap<String, String>,
    /// base64 인코딩된 본문
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
}

/// ICMP 메시지
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Icmp {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub code: i64,
    /// base64 인코딩된 페이로드
    #[serde(deserialize_with = "null_as_default")]
    pub payload: String,
}

/// 출발지/목적지 지리 정보
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locations {
    pub src: Option<Location>,
    pub dest: Option<Location>,
}

/// GeoIP 조회 결과 한 건
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub iso: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub asnum: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub asorg: String,
    pub position: Option<Position>,
    /// 위치 정확도 반경 (km)
    #[serde(deserialize_with = "null_as_default")]
    pub accuracy: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub postcode: String,
}

/// 위도/경도
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    #[serde(deserialize_with = "null_as_default")]
    pub lat: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub lon: f64,
}

/// NTP 타임스탬프 메시지
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NtpTimestamp {
    #[serde(deserialize_with = "null_as_default")]
    pub version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub mode: i64,
}

/// 인식되지 않은 데이터그램/스트림 페이로드
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnrecognisedPayload {
    /// base64 인코딩된 페이로드
    #[serde(deserialize_with = "null_as_default")]
    pub payload: String,
    #[serde(deserialize_with = "null_as_default")]
    pub payload_length: i64,
    /// 페이로드 SHA-1 해시
    #[serde(deserialize_with = "null_as_default")]
    pub payload_hash: String,
}

/// 위협 인디케이터
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Indicator {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
}
