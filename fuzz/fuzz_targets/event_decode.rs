#![no_main]

use libfuzzer_sys::fuzz_target;
use flatstore_core::event::Event;
use flatstore_parquet_sink::projector::project;
use flatstore_parquet_sink::row::to_record_batch;

fuzz_target!(|data: &[u8]| {
    let Ok(event) = serde_json::from_slice::<Event>(data) else {
        return;
    };

    // 디코딩된 이벤트는 어떤 값이든 투영과 배치 변환이 성공해야 함
    let rows = [project(&event, false), project(&event, true)];
    assert!(to_record_batch(&rows).is_ok());
});
