use super::conflicts::daily_hours_violations;
use super::types::{DaySchedule, OptimizationReport, ScheduleSummary, WorkloadStats};
use crate::snapshot::Snapshot;

const HIGH_WARNING_RATE: f64 = 20.0;
const LOW_SHIFTS_PER_DAY: f64 = 3.0;

pub(super) fn summarize(schedule: &[DaySchedule]) -> ScheduleSummary {
    let mut summary = ScheduleSummary {
        total_days: schedule.len(),
        ..ScheduleSummary::default()
    };
    for day in schedule {
        summary.total_shifts += day.shifts.len();
        if !day.warnings.is_empty() {
            summary.days_with_warnings += 1;
        }
        for shift in &day.shifts {
            *summary
                .employee_workload
                .entry(shift.employee_id.clone())
                .or_default() += 1;
            if let Some(st) = &shift.shift_type_id {
                *summary.shift_type_distribution.entry(st.clone()).or_default() += 1;
            }
        }
    }
    if summary.total_days > 0 {
        let days = summary.total_days as f64;
        summary.warning_rate = summary.days_with_warnings as f64 / days * 100.0;
        summary.average_shifts_per_day = summary.total_shifts as f64 / days;
    }
    summary
}

/// Moyenne et variance (population) des shifts par employé, absents compris.
pub(super) fn workload_stats(snapshot: &Snapshot, summary: &ScheduleSummary) -> WorkloadStats {
    if snapshot.employees.is_empty() {
        return WorkloadStats::default();
    }
    let counts: Vec<f64> = snapshot
        .employees
        .iter()
        .map(|e| summary.employee_workload.get(&e.id).copied().unwrap_or(0) as f64)
        .collect();
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<f64>() / n;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    WorkloadStats {
        mean,
        variance,
        standard_deviation: variance.sqrt(),
    }
}

/// Effectif pourvu (plafonné au besoin) sur besoin total, en pourcentage.
pub(super) fn coverage_score(schedule: &[DaySchedule]) -> f64 {
    let (met, required) = schedule
        .iter()
        .flat_map(|day| day.coverage.values())
        .fold((0u64, 0u64), |(met, req), c| {
            (
                met + u64::from(c.current.min(c.required)),
                req + u64::from(c.required),
            )
        });
    if required == 0 {
        100.0
    } else {
        met as f64 / required as f64 * 100.0
    }
}

pub(super) fn optimization_report(
    snapshot: &Snapshot,
    schedule: &[DaySchedule],
    summary: &ScheduleSummary,
) -> OptimizationReport {
    let workload = workload_stats(snapshot, summary);
    let coverage_score = coverage_score(schedule);

    let merged = snapshot.clone().with_shifts(
        snapshot
            .all_shifts()
            .cloned()
            .chain(schedule.iter().flat_map(|d| d.shifts.iter().cloned())),
    );
    let constraint_violations = daily_hours_violations(&merged, schedule.iter().map(|d| d.date));

    let overall_score = (coverage_score
        - 5.0 * (workload.variance - 2.0).max(0.0)
        - 10.0 * constraint_violations.len() as f64)
        .clamp(0.0, 100.0);

    OptimizationReport {
        workload,
        coverage_score,
        constraint_violations,
        overall_score,
        recommendations: recommendations(summary),
    }
}

pub(super) fn recommendations(summary: &ScheduleSummary) -> Vec<String> {
    let mut out = Vec::new();
    if summary.warning_rate > HIGH_WARNING_RATE {
        out.push(
            "High warning rate detected. Consider hiring more employees or adjusting capacity rules."
                .to_string(),
        );
    }
    if summary.total_days > 0 && summary.average_shifts_per_day < LOW_SHIFTS_PER_DAY {
        out.push(
            "Low shift coverage. Consider extending operating hours or adding shift types."
                .to_string(),
        );
    }
    out
}
