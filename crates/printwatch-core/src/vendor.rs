//! 벤더 프로파일.
//!
//! sysDescr 문자열 → 벤더 태그 → OID/파서 묶음으로 이어지는 정적 매핑.
//! 해석은 순수 함수이며 실패하지 않는다. 인식하지 못한 장치는 페이지 카운터만
//! 조회하는 Generic 프로파일로 떨어진다.

use crate::models::printer::VendorTag;
use crate::models::reading::DeviceStatus;
use crate::ports::snmp::SnmpValue;

/// SNMPv2-MIB sysDescr.0
pub const SYS_DESCR_OID: &str = "1.3.6.1.2.1.1.1.0";
/// SNMPv2-MIB sysName.0
pub const SYS_NAME_OID: &str = "1.3.6.1.2.1.1.5.0";

/// 측정 필드 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricField {
    PageCount,
    Model,
    DeviceStatus,
    /// hrPrinterDetectedErrorState 비트 플래그
    ErrorState,
    /// 벤더 전용 토너 백분율
    TonerPercent,
    TonerLevel,
    TonerMax,
    DrumLevel,
    DrumMax,
}

impl MetricField {
    pub fn name(&self) -> &'static str {
        match self {
            MetricField::PageCount => "page_count",
            MetricField::Model => "model",
            MetricField::DeviceStatus => "device_status",
            MetricField::ErrorState => "error_state",
            MetricField::TonerPercent => "toner_percent",
            MetricField::TonerLevel => "toner_level",
            MetricField::TonerMax => "toner_max",
            MetricField::DrumLevel => "drum_level",
            MetricField::DrumMax => "drum_max",
        }
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 원시 값 해석 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueParser {
    /// 누적 카운터 (음수 불가)
    Counter,
    /// 텍스트
    Text,
    /// 0~100 백분율
    Percent,
    /// prtMarkerSuppliesLevel (-3: 잔량 있음, -2: 알 수 없음)
    SupplyLevel,
    /// prtMarkerSuppliesMaxCapacity (양수만 유효)
    Capacity,
    /// hrDeviceStatus 코드
    StatusCode,
    /// hrPrinterDetectedErrorState 비트열
    ErrorFlags,
}

/// Printer-MIB 소모품 잔량 원시값
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyLevel {
    Units(u64),
    /// -3
    SomeRemaining,
    /// -2 또는 기타 음수
    Unknown,
}

/// hrPrinterDetectedErrorState 중 토너 관련 비트
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorFlags {
    pub low_toner: bool,
    pub no_toner: bool,
}

const LOW_TONER_BIT: u8 = 0x20;
const NO_TONER_BIT: u8 = 0x10;

/// 해석된 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedValue {
    Count(u64),
    Text(String),
    Percent(u8),
    Supply(SupplyLevel),
    Capacity(u64),
    Status(DeviceStatus),
    Flags(ErrorFlags),
}

impl ValueParser {
    /// 원시 값을 해석한다. 타입이 맞지 않거나 범위를 벗어나면 None.
    pub fn parse(self, raw: &SnmpValue) -> Option<ParsedValue> {
        match self {
            ValueParser::Counter => match raw {
                SnmpValue::Counter(v) => Some(ParsedValue::Count(*v)),
                other => other
                    .as_i64()
                    .and_then(|v| u64::try_from(v).ok())
                    .map(ParsedValue::Count),
            },
            ValueParser::Text => raw
                .as_text()
                .filter(|s| !s.is_empty())
                .map(ParsedValue::Text),
            ValueParser::Percent => raw
                .as_i64()
                .filter(|v| (0..=100).contains(v))
                .map(|v| ParsedValue::Percent(v as u8)),
            ValueParser::SupplyLevel => raw.as_i64().map(|v| {
                ParsedValue::Supply(match v {
                    -3 => SupplyLevel::SomeRemaining,
                    v if v < 0 => SupplyLevel::Unknown,
                    v => SupplyLevel::Units(v as u64),
                })
            }),
            ValueParser::Capacity => raw
                .as_i64()
                .filter(|v| *v > 0)
                .map(|v| ParsedValue::Capacity(v as u64)),
            ValueParser::StatusCode => raw
                .as_i64()
                .and_then(DeviceStatus::from_code)
                .map(ParsedValue::Status),
            ValueParser::ErrorFlags => match raw {
                SnmpValue::OctetString(bytes) => {
                    let first = bytes.first().copied().unwrap_or(0);
                    Some(ParsedValue::Flags(ErrorFlags {
                        low_toner: first & LOW_TONER_BIT != 0,
                        no_toner: first & NO_TONER_BIT != 0,
                    }))
                }
                _ => None,
            },
        }
    }
}

/// 필드 하나의 OID와 해석 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OidBinding {
    pub field: MetricField,
    pub oid: &'static str,
    pub parser: ValueParser,
}

const fn bind(field: MetricField, oid: &'static str, parser: ValueParser) -> OidBinding {
    OidBinding { field, oid, parser }
}

/// 벤더 프로파일
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorProfile {
    pub tag: VendorTag,
    pub bindings: &'static [OidBinding],
}

impl VendorProfile {
    pub fn binding(&self, field: MetricField) -> Option<&OidBinding> {
        self.bindings.iter().find(|b| b.field == field)
    }
}

// ============================================================
// OID 테이블
// ============================================================

const PAGE_COUNT: OidBinding = bind(
    MetricField::PageCount,
    "1.3.6.1.2.1.43.10.2.1.4.1.1",
    ValueParser::Counter,
);
const MODEL: OidBinding = bind(MetricField::Model, "1.3.6.1.2.1.25.3.2.1.3.1", ValueParser::Text);
const DEVICE_STATUS: OidBinding = bind(
    MetricField::DeviceStatus,
    "1.3.6.1.2.1.25.3.2.1.5.1",
    ValueParser::StatusCode,
);
const ERROR_STATE: OidBinding = bind(
    MetricField::ErrorState,
    "1.3.6.1.2.1.25.3.5.1.2.1",
    ValueParser::ErrorFlags,
);
const TONER_LEVEL: OidBinding = bind(
    MetricField::TonerLevel,
    "1.3.6.1.2.1.43.11.1.1.9.1.1",
    ValueParser::SupplyLevel,
);
const TONER_MAX: OidBinding = bind(
    MetricField::TonerMax,
    "1.3.6.1.2.1.43.11.1.1.8.1.1",
    ValueParser::Capacity,
);
const DRUM_LEVEL_IDX2: OidBinding = bind(
    MetricField::DrumLevel,
    "1.3.6.1.2.1.43.11.1.1.9.1.2",
    ValueParser::SupplyLevel,
);
const DRUM_MAX_IDX2: OidBinding = bind(
    MetricField::DrumMax,
    "1.3.6.1.2.1.43.11.1.1.8.1.2",
    ValueParser::Capacity,
);

static GENERIC_BINDINGS: [OidBinding; 1] = [PAGE_COUNT];

static STANDARD_BINDINGS: [OidBinding; 6] = [
    PAGE_COUNT,
    MODEL,
    DEVICE_STATUS,
    ERROR_STATE,
    TONER_LEVEL,
    TONER_MAX,
];

static BROTHER_BINDINGS: [OidBinding; 9] = [
    PAGE_COUNT,
    MODEL,
    DEVICE_STATUS,
    ERROR_STATE,
    bind(
        MetricField::TonerPercent,
        "1.3.6.1.4.1.2435.2.3.9.4.2.1.5.5.1.0",
        ValueParser::Percent,
    ),
    TONER_LEVEL,
    TONER_MAX,
    DRUM_LEVEL_IDX2,
    DRUM_MAX_IDX2,
];

static SAMSUNG_BINDINGS: [OidBinding; 9] = [
    PAGE_COUNT,
    MODEL,
    DEVICE_STATUS,
    ERROR_STATE,
    bind(
        MetricField::TonerPercent,
        "1.3.6.1.4.1.236.11.5.11.55.1.1.4.1",
        ValueParser::Percent,
    ),
    TONER_LEVEL,
    TONER_MAX,
    DRUM_LEVEL_IDX2,
    DRUM_MAX_IDX2,
];

/// sysDescr 키워드 → 벤더 (앞쪽 항목 우선)
const VENDOR_KEYWORDS: &[(&str, VendorTag)] = &[
    ("brother", VendorTag::Brother),
    ("samsung", VendorTag::Samsung),
    ("hewlett", VendorTag::Hp),
    ("hp", VendorTag::Hp),
    ("laserjet", VendorTag::Hp),
    ("canon", VendorTag::Canon),
    ("epson", VendorTag::Epson),
    ("xerox", VendorTag::Xerox),
    ("ricoh", VendorTag::Ricoh),
    ("lexmark", VendorTag::Lexmark),
    ("kyocera", VendorTag::Kyocera),
    ("sharp", VendorTag::Sharp),
    ("konica", VendorTag::Konica),
    ("minolta", VendorTag::Konica),
    ("oki", VendorTag::Oki),
    ("okidata", VendorTag::Oki),
    ("toshiba", VendorTag::Toshiba),
    ("dell", VendorTag::Dell),
];

/// 프린터로 볼 수 있는 sysDescr 키워드
const PRINTER_KEYWORDS: &[&str] = &[
    "printer",
    "print",
    "laser",
    "inkjet",
    "multifunction",
    "mfp",
    "copystation",
];

fn tokens(identity: &str) -> impl Iterator<Item = String> + '_ {
    identity
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

fn keyword_matches(token: &str, keyword: &str) -> bool {
    // 짧은 키워드(hp, oki)는 토큰 전체가 일치해야 한다
    token == keyword || (keyword.len() >= 4 && token.starts_with(keyword))
}

/// sysDescr 문자열에서 벤더 태그 결정
pub fn detect_vendor(identity: &str) -> VendorTag {
    let tokens: Vec<String> = tokens(identity).collect();
    VENDOR_KEYWORDS
        .iter()
        .find(|(keyword, _)| tokens.iter().any(|t| keyword_matches(t, keyword)))
        .map(|(_, tag)| *tag)
        .unwrap_or(VendorTag::Generic)
}

/// 벤더 태그의 프로파일
pub fn profile_for(tag: VendorTag) -> VendorProfile {
    let bindings: &'static [OidBinding] = match tag {
        VendorTag::Generic => &GENERIC_BINDINGS,
        VendorTag::Brother => &BROTHER_BINDINGS,
        VendorTag::Samsung => &SAMSUNG_BINDINGS,
        _ => &STANDARD_BINDINGS,
    };
    VendorProfile { tag, bindings }
}

/// sysDescr 문자열 → 프로파일
pub fn resolve(identity: &str) -> VendorProfile {
    profile_for(detect_vendor(identity))
}

/// sysDescr가 프린터로 보이는지 (프린터 키워드 또는 알려진 벤더)
pub fn looks_like_printer(identity: &str) -> bool {
    let lower = identity.to_ascii_lowercase();
    PRINTER_KEYWORDS.iter().any(|k| lower.contains(k))
        || detect_vendor(identity) != VendorTag::Generic
}
