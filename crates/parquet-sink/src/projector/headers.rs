//! HTTP 헤더 허용 목록
//!
//! 목록에 있는 헤더만 평면 행으로 복사되고 나머지는 버려집니다.
//! 헤더 이름은 대소문자를 구분하여 정확히 일치해야 합니다.
//!
//! `Accept-Cache-Control` 키는 `http_header_Cache_Control` 컬럼에 대응합니다.
//! 프로브가 보내는 실제 `Cache-Control` 헤더는 목록에 없으므로 버려집니다.

use std::collections::HashMap;

use crate::row::FlatRow;

/// 허용 목록 헤더가 기록될 평면 행 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSlot {
    Accept,
    AcceptEncoding,
    AcceptLanguage,
    CacheControl,
    Connection,
    Host,
    MetadataFlavor,
    Pragma,
    Referer,
    UpgradeInsecureRequests,
    UserAgent,
    ContentLength,
    ContentType,
    Date,
    ETag,
    Server,
    XFrameOptions,
    XXssProtection,
}

impl HeaderSlot {
    fn field(self, row: &mut FlatRow) -> &mut String {
        match self {
            Self::Accept => &mut row.http_header_accept,
            Self::AcceptEncoding => &mut row.http_header_accept_encoding,
            Self::AcceptLanguage => &mut row.http_header_accept_language,
            Self::CacheControl => &mut row.http_header_cache_control,
            Self::Connection => &mut row.http_header_connection,
            Self::Host => &mut row.http_header_host,
            Self::MetadataFlavor => &mut row.http_header_metadata_flavor,
            Self::Pragma => &mut row.http_header_pragma,
            Self::Referer => &mut row.http_header_referer,
            Self::UpgradeInsecureRequests => &mut row.http_header_upgrade_insecure_requests,
            Self::UserAgent => &mut row.http_header_user_agent,
            Self::ContentLength => &mut row.http_header_content_length,
            Self::ContentType => &mut row.http_header_content_type,
            Self::Date => &mut row.http_header_date,
            Self::ETag => &mut row.http_header_etag,
            Self::Server => &mut row.http_header_server,
            Self::XFrameOptions => &mut row.http_header_x_frame_options,
            Self::XXssProtection => &mut row.http_header_x_xss_protection,
        }
    }
}

/// (헤더 이름, 대상 필드) 허용 목록
pub const HEADER_ALLOW_LIST: [(&str, HeaderSlot); 18] = [
    ("Accept", HeaderSlot::Accept),
    ("Accept-Encoding", HeaderSlot::AcceptEncoding),
    ("Accept-Language", HeaderSlot::AcceptLanguage),
    ("Accept-Cache-Control", HeaderSlot::CacheControl),
    ("Connection", HeaderSlot::Connection),
    ("Host", HeaderSlot::Host),
    ("Metadata-Flavor", HeaderSlot::MetadataFlavor),
    ("Pragma", HeaderSlot::Pragma),
    ("Referer", HeaderSlot::Referer),
    ("Upgrade-Insecure-Requests", HeaderSlot::UpgradeInsecureRequests),
    ("User-Agent", HeaderSlot::UserAgent),
    ("Content-Length", HeaderSlot::ContentLength),
    ("Content-Type", HeaderSlot::ContentType),
    ("Date", HeaderSlot::Date),
    ("ETag", HeaderSlot::ETag),
    ("Server", HeaderSlot::Server),
    ("X-Frame-Options", HeaderSlot::XFrameOptions),
    ("X-XSS-Protection", HeaderSlot::XXssProtection),
];

/// 허용 목록에 있는 헤더를 행에 복사합니다. 없는 헤더는 기존 값을 유지합니다.
pub(crate) fn apply_headers(headers: &HashMap<String, String>, row: &mut FlatRow) {
    if headers.is_empty() {
        return;
    }
    for (name, slot) in HEADER_ALLOW_LIST {
        if let Some(value) = headers.get(name) {
            value.clone_into(slot.field(row));
        }
    }
}
