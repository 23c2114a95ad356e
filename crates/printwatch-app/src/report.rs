//! 콘솔 리포트 렌더링.
//!
//! 입력은 이미 조회/집계된 값이고 출력은 표 형태의 문자열이다. I/O는 하지 않는다.

use printwatch_core::fleet::{PrinterStatus, PrinterUsage};
use printwatch_core::models::reading::Level;
use printwatch_core::models::run::{CollectionReport, DiscoveryReport, TargetFailure};
use std::collections::BTreeMap;
use std::fmt::Write;

const RULE_WIDTH: usize = 78;

fn rule(out: &mut String) {
    let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
}

fn count_cell(page_count: Option<u64>) -> String {
    page_count.map_or_else(|| "-".to_string(), |c| c.to_string())
}

fn level_cell(level: &Level, threshold: u8) -> String {
    if level.is_low(threshold) {
        format!("{level} ⚠")
    } else {
        level.to_string()
    }
}

fn failures(out: &mut String, failures: &[TargetFailure]) {
    if failures.is_empty() {
        return;
    }
    let _ = writeln!(out, "실패 {}건:", failures.len());
    for failure in failures {
        match failure.printer_id {
            Some(id) => {
                let _ = writeln!(out, "  - {} (#{id}): {}", failure.ip, failure.error);
            }
            None => {
                let _ = writeln!(out, "  - {}: {}", failure.ip, failure.error);
            }
        }
    }
}

/// 프린터 현황 표
pub fn render_status(statuses: &[PrinterStatus], low_toner_threshold: u8) -> String {
    let mut out = String::new();
    if statuses.is_empty() {
        out.push_str("등록된 프린터가 없습니다. `printwatch discover`로 탐색하세요.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<4} {:<20} {:<15} {:<14} {:<8} {:>10} {:>9} {:>8}",
        "ID", "이름", "IP", "위치", "상태", "페이지", "토너", "드럼"
    );
    rule(&mut out);
    for status in statuses {
        let printer = &status.printer;
        let (state, pages, toner, drum) = match &status.latest {
            None => ("미수집", "-".to_string(), "-".to_string(), "-".to_string()),
            Some(r) => (
                if r.online { "온라인" } else { "오프라인" },
                count_cell(r.page_count),
                level_cell(&r.toner, low_toner_threshold),
                r.drum.to_string(),
            ),
        };
        let _ = writeln!(
            out,
            "{:<4} {:<20} {:<15} {:<14} {:<8} {:>10} {:>9} {:>8}",
            printer.id, printer.name, printer.ip, printer.location, state, pages, toner, drum
        );
    }
    rule(&mut out);

    let online = statuses.iter().filter(|s| s.is_online()).count();
    let low = statuses
        .iter()
        .filter(|s| s.is_toner_low(low_toner_threshold))
        .count();
    let _ = writeln!(
        out,
        "총 {}대, 온라인 {online}대, 토너 부족 {low}대 (< {low_toner_threshold}%)",
        statuses.len()
    );
    out
}

/// 단일 기간 사용량 리포트 (위치별 그룹, 소계 포함)
///
/// 각 행의 첫 번째 기간 결과를 사용한다.
pub fn render_usage_report(rows: &[PrinterUsage], period_days: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "최근 {period_days}일 사용량");
    rule(&mut out);

    let mut by_location: BTreeMap<&str, Vec<&PrinterUsage>> = BTreeMap::new();
    for row in rows {
        by_location
            .entry(row.printer.location.as_str())
            .or_default()
            .push(row);
    }

    let mut grand_total = 0u64;
    for (location, group) in &by_location {
        let _ = writeln!(out, "[{location}]");
        let mut subtotal = 0u64;
        for row in group {
            let Some(result) = row.periods.first() else {
                continue;
            };
            subtotal = subtotal.saturating_add(result.pages_printed);
            let note = if result.readings_used < 2 {
                " (측정값 부족)"
            } else if result.counter_resets > 0 {
                " (카운터 리셋)"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "  {:<20} {:<15} {:>10}장 {:>9.1}장/일{note}",
                row.printer.name, row.printer.ip, result.pages_printed, result.average_per_day
            );
        }
        let _ = writeln!(out, "  소계: {subtotal}장");
        grand_total = grand_total.saturating_add(subtotal);
    }

    rule(&mut out);
    let _ = writeln!(out, "합계: {}대, {grand_total}장", rows.len());
    out
}

/// 다기간 사용량 요약 표 (기간별 열)
pub fn render_usage_summary(rows: &[PrinterUsage], periods: &[u32]) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<20} {:<14}", "이름", "위치");
    for days in periods {
        let _ = write!(out, " {:>10}", format!("{days}일"));
    }
    out.push('\n');
    rule(&mut out);

    let mut totals = vec![0u64; periods.len()];
    for row in rows {
        let _ = write!(out, "{:<20} {:<14}", row.printer.name, row.printer.location);
        for (idx, days) in periods.iter().enumerate() {
            let pages = row
                .periods
                .iter()
                .find(|r| r.period_days == *days)
                .map_or(0, |r| r.pages_printed);
            totals[idx] = totals[idx].saturating_add(pages);
            let _ = write!(out, " {pages:>10}");
        }
        out.push('\n');
    }

    rule(&mut out);
    let _ = write!(out, "{:<20} {:<14}", "합계", "");
    for total in &totals {
        let _ = write!(out, " {total:>10}");
    }
    out.push('\n');
    out
}

/// 탐색 실행 요약
pub fn render_discovery(report: &DiscoveryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "탐색 완료: 조회 {}개, 응답 {}개, 신규 {}대, 갱신 {}대, 변경 없음 {}대",
        report.scanned,
        report.responded,
        report.inserted.len(),
        report.updated.len(),
        report.unchanged
    );
    if report.skipped_non_printers > 0 {
        let _ = writeln!(out, "프린터 아님(제외): {}개", report.skipped_non_printers);
    }
    failures(&mut out, &report.failures);
    out
}

/// 수집 실행 요약
pub fn render_collection(report: &CollectionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "수집 완료 ({}): 대상 {}대, 온라인 {}대, 오프라인 {}대, 기록 {}건",
        report.polled_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.targets,
        report.online,
        report.offline,
        report.written()
    );
    failures(&mut out, &report.failures);
    out
}
