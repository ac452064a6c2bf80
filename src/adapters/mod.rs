pub mod http;
pub mod ocr;
pub mod roboflow;
pub mod sqlite;
pub mod storage;
pub mod vlm;
