//! 고정 스키마 평면 행
//!
//! [`FlatRow`]는 투영 결과를 담는 고정 폭 레코드입니다. 모든 필드는 0 또는 빈 값을
//! 기본값으로 가지며 null을 허용하지 않습니다. 반복 구조는 위치 기반으로 잘려
//! `_0`, `_1` ... 접미어 필드에 들어갑니다.
//!
//! 구조체 필드, Arrow 스키마, 컬럼 배열 생성은 모두 `flat_row!` 선언 한 곳에서
//! 만들어지므로 컬럼 순서와 타입이 어긋날 수 없습니다.

use std::sync::{Arc, LazyLock};

use arrow::array::{
    ArrayRef, BinaryArray, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

/// 컬럼 물리 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// UTF-8 문자열 (딕셔너리 인코딩)
    Utf8,
    /// 32비트 정수
    Int32,
    /// 64비트 정수
    Int64,
    /// 배정밀도 실수
    Float64,
    /// 디코딩된 페이로드 바이트
    Binary,
}

impl ColumnKind {
    /// 대응하는 Arrow 데이터 타입을 반환합니다.
    pub fn data_type(self) -> DataType {
        match self {
            Self::Utf8 => DataType::Utf8,
            Self::Int32 => DataType::Int32,
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
            Self::Binary => DataType::Binary,
        }
    }

    /// 딕셔너리 인코딩 대상인지 여부
    pub fn is_dictionary_encoded(self) -> bool {
        self == Self::Utf8
    }
}

macro_rules! flat_row {
    (@ty Utf8) => { String };
    (@ty Int32) => { i32 };
    (@ty Int64) => { i64 };
    (@ty Float64) => { f64 };
    (@ty Binary) => { Vec<u8> };

    (@array $rows:ident, $field:ident, Utf8) => {
        Arc::new(StringArray::from_iter_values(
            $rows.iter().map(|r| r.$field.as_str()),
        )) as ArrayRef
    };
    (@array $rows:ident, $field:ident, Int32) => {
        Arc::new(Int32Array::from_iter_values($rows.iter().map(|r| r.$field))) as ArrayRef
    };
    (@array $rows:ident, $field:ident, Int64) => {
        Arc::new(Int64Array::from_iter_values($rows.iter().map(|r| r.$field))) as ArrayRef
    };
    (@array $rows:ident, $field:ident, Float64) => {
        Arc::new(Float64Array::from_iter_values($rows.iter().map(|r| r.$field))) as ArrayRef
    };
    (@array $rows:ident, $field:ident, Binary) => {
        Arc::new(BinaryArray::from_iter_values(
            $rows.iter().map(|r| r.$field.as_slice()),
        )) as ArrayRef
    };

    ($( $(#[$meta:meta])* $field:ident : $kind:ident => $name:literal, )*) => {
        /// 고정 스키마 평면 행
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct FlatRow {
            $( $(#[$meta])* pub $field: flat_row!(@ty $kind), )*
        }

        impl FlatRow {
            /// 스키마 순서대로 나열한 (컬럼 이름, 컬럼 타입)
            pub const COLUMNS: &'static [(&'static str, ColumnKind)] = &[
                $( ($name, ColumnKind::$kind), )*
            ];
        }

        fn build_columns(rows: &[FlatRow]) -> Vec<ArrayRef> {
            vec![ $( flat_row!(@array rows, $field, $kind), )* ]
        }
    };
}

flat_row! {
    id: Utf8 => "id",
    action: Utf8 => "action",
    device: Utf8 => "device",
    time: Utf8 => "time",
    origin: Utf8 => "origin",
    /// epoch 이후 분 (내림)
    time_mins: Int32 => "time_mins",
    /// epoch 이후 마이크로초
    time_micros: Int64 => "time_micros",
    network: Utf8 => "network",
    url: Utf8 => "url",
    risk: Float64 => "risk",

    src_ipv4_0: Utf8 => "src_ipv4_0",
    src_ipv6_0: Utf8 => "src_ipv6_0",
    src_tcp_0: Int32 => "src_tcp_0",
    src_udp_0: Int32 => "src_udp_0",
    dest_ipv4_0: Utf8 => "dest_ipv4_0",
    dest_ipv6_0: Utf8 => "dest_ipv6_0",
    dest_tcp_0: Int32 => "dest_tcp_0",
    dest_udp_0: Int32 => "dest_udp_0",

    dns_message_answer_name_0: Utf8 => "dns_message_answer_name_0",
    dns_message_answer_name_1: Utf8 => "dns_message_answer_name_1",
    dns_message_answer_name_2: Utf8 => "dns_message_answer_name_2",
    dns_message_answer_name_3: Utf8 => "dns_message_answer_name_3",
    dns_message_answer_name_4: Utf8 => "dns_message_answer_name_4",
    dns_message_answer_address_0: Utf8 => "dns_message_answer_address_0",
    dns_message_answer_address_1: Utf8 => "dns_message_answer_address_1",
    dns_message_answer_address_2: Utf8 => "dns_message_answer_address_2",
    dns_message_answer_address_3: Utf8 => "dns_message_answer_address_3",
    dns_message_answer_address_4: Utf8 => "dns_message_answer_address_4",
    dns_message_query_name_0: Utf8 => "dns_message_query_name_0",
    dns_message_query_type_0: Utf8 => "dns_message_query_type_0",
    dns_message_query_class_0: Utf8 => "dns_message_query_class_0",
    dns_message_type: Utf8 => "dns_message_type",

    http_header_accept: Utf8 => "http_header_Accept",
    http_header_accept_encoding: Utf8 => "http_header_Accept_Encoding",
    http_header_accept_language: Utf8 => "http_header_Accept_Language",
    http_header_cache_control: Utf8 => "http_header_Cache_Control",
    http_header_connection: Utf8 => "http_header_Connection",
    http_header_host: Utf8 => "http_header_Host",
    http_header_metadata_flavor: Utf8 => "http_header_Metadata_Flavor",
    http_header_pragma: Utf8 => "http_header_Pragma",
    http_header_referer: Utf8 => "http_header_Referer",
    http_header_upgrade_insecure_requests: Utf8 => "http_header_Upgrade_Insecure_Requests",
    http_header_user_agent: Utf8 => "http_header_User_Agent",
    http_header_content_length: Utf8 => "http_header_Content_Length",
    http_header_content_type: Utf8 => "http_header_Content_Type",
    http_header_date: Utf8 => "http_header_Date",
    http_header_etag: Utf8 => "http_header_ETag",
    http_header_server: Utf8 => "http_header_Server",
    http_header_x_frame_options: Utf8 => "http_header_X_Frame_Options",
    http_header_x_xss_protection: Utf8 => "http_header_X_XSS_Protection",
    http_request_method: Utf8 => "http_request_method",
    http_response_status: Utf8 => "http_response_status",
    http_response_code: Int32 => "http_response_code",
    /// 요청 또는 응답 본문 (응답이 있으면 응답 본문)
    http_body: Binary => "http_body",

    icmp_code: Int32 => "icmp_code",
    icmp_payload: Binary => "icmp_payload",
    icmp_type: Int32 => "icmp_type",

    location_dest_accuracy: Int32 => "location_dest_accuracy",
    location_dest_asnum: Int32 => "location_dest_asnum",
    location_dest_asorg: Utf8 => "location_dest_asorg",
    location_dest_city: Utf8 => "location_dest_city",
    location_dest_country: Utf8 => "location_dest_country",
    location_dest_iso: Utf8 => "location_dest_iso",
    location_dest_position_lat: Float64 => "location_dest_position_lat",
    location_dest_position_lon: Float64 => "location_dest_position_lon",
    location_dest_postcode: Utf8 => "location_dest_postcode",
    location_src_accuracy: Int32 => "location_src_accuracy",
    location_src_asnum: Int32 => "location_src_asnum",
    location_src_asorg: Utf8 => "location_src_asorg",
    location_src_city: Utf8 => "location_src_city",
    location_src_country: Utf8 => "location_src_country",
    location_src_iso: Utf8 => "location_src_iso",
    location_src_position_lat: Float64 => "location_src_position_lat",
    location_src_position_lon: Float64 => "location_src_position_lon",
    location_src_postcode: Utf8 => "location_src_postcode",

    ntp_timestamp_mode: Int32 => "ntp_timestamp_mode",
    ntp_timestamp_version: Int32 => "ntp_timestamp_version",

    unrecognised_datagram_payload: Binary => "unrecognised_datagram_payload",
    unrecognised_datagram_payload_length: Int64 => "unrecognised_datagram_payload_length",
    unrecognised_datagram_payload_sha1: Utf8 => "unrecognised_datagram_payload_sha1",
    unrecognised_stream_payload: Binary => "unrecognised_stream_payload",
    unrecognised_stream_payload_length: Int64 => "unrecognised_stream_payload_length",
    unrecognised_stream_payload_sha1: Utf8 => "unrecognised_stream_payload_sha1",

    indicator_id_0: Utf8 => "indicator_id_0",
    indicator_type_0: Utf8 => "indicator_type_0",
    indicator_value_0: Utf8 => "indicator_value_0",
    indicator_description_0: Utf8 => "indicator_description_0",
    indicator_category_0: Utf8 => "indicator_category_0",
    indicator_author_0: Utf8 => "indicator_author_0",
    indicator_source_0: Utf8 => "indicator_source_0",
    indicator_id_1: Utf8 => "indicator_id_1",
    indicator_type_1: Utf8 => "indicator_type_1",
    indicator_value_1: Utf8 => "indicator_value_1",
    indicator_description_1: Utf8 => "indicator_description_1",
    indicator_category_1: Utf8 => "indicator_category_1",
    indicator_author_1: Utf8 => "indicator_author_1",
    indicator_source_1: Utf8 => "indicator_source_1",
    indicator_id_2: Utf8 => "indicator_id_2",
    indicator_type_2: Utf8 => "indicator_type_2",
    indicator_value_2: Utf8 => "indicator_value_2",
    indicator_description_2: Utf8 => "indicator_description_2",
    indicator_category_2: Utf8 => "indicator_category_2",
    indicator_author_2: Utf8 => "indicator_author_2",
    indicator_source_2: Utf8 => "indicator_source_2",
}

static FLAT_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(
        FlatRow::COLUMNS
            .iter()
            .map(|(name, kind)| Field::new(*name, kind.data_type(), false))
            .collect::<Vec<_>>(),
    ))
});

/// 평면 행의 Arrow 스키마를 반환합니다.
pub fn flat_schema() -> SchemaRef {
    Arc::clone(&FLAT_SCHEMA)
}

/// 행 묶음을 하나의 [`RecordBatch`]로 변환합니다.
pub fn to_record_batch(rows: &[FlatRow]) -> Result<RecordBatch, ArrowError> {
    RecordBatch::try_new(flat_schema(), build_columns(rows))
}
