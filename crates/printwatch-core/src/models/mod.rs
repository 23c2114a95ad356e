//! PrintWatch 도메인 모델.
//!
//! 모든 모델은 `serde` 직렬화를 지원하며 웹 API 응답에 그대로 사용된다.

pub mod printer;
pub mod reading;
pub mod run;
pub mod usage;
