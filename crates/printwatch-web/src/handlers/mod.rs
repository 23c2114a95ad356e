//! API 핸들러 모듈.

pub mod printers;
pub mod stats;
pub mod usage;

use printwatch_core::config::validate_periods;
use printwatch_core::models::printer::PrinterFilter;
use serde::Deserialize;

use crate::error::ApiError;

/// 위치/모델 필터 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    /// 위치 (정확히 일치)
    pub location: Option<String>,
    /// 모델 (정확히 일치)
    pub model: Option<String>,
}

impl FilterQuery {
    pub fn filter(&self) -> PrinterFilter {
        PrinterFilter {
            location: self.location.clone(),
            model: self.model.clone(),
        }
        .normalized()
    }
}

/// `periods=30,90,365` 파싱. 생략하면 기본 기간.
pub(crate) fn parse_periods(raw: Option<&str>, defaults: &[u32]) -> Result<Vec<u32>, ApiError> {
    let periods = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => defaults.to_vec(),
        Some(raw) => raw
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<u32>()
                    .map_err(|_| ApiError::BadRequest(format!("잘못된 기간: {p}")))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    validate_periods(&periods)?;
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_default_when_missing() {
        assert_eq!(parse_periods(None, &[30, 90]).unwrap(), vec![30, 90]);
        assert_eq!(parse_periods(Some(" "), &[7]).unwrap(), vec![7]);
    }

    #[test]
    fn periods_parse_in_order() {
        assert_eq!(
            parse_periods(Some("365, 30,90"), &[]).unwrap(),
            vec![365, 30, 90]
        );
    }

    #[test]
    fn bad_periods_are_rejected() {
        assert!(matches!(
            parse_periods(Some("30,abc"), &[]),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse_periods(Some("0"), &[]),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn blank_filters_are_dropped() {
        let query = FilterQuery {
            location: Some("".to_string()),
            model: Some("HL-L2350DW".to_string()),
        };
        let filter = query.filter();
        assert_eq!(filter.location, None);
        assert_eq!(filter.model.as_deref(), Some("HL-L2350DW"));
    }
}
