use super::conflicts::ConflictPolicy;
use crate::model::{EmployeeId, RoleId, ShiftAssignment, ShiftTypeId};
use crate::strategy::Algorithm;
use crate::validation::Rejection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Options de génération
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleOptions {
    /// Prend le pas sur l'algorithme des réglages de rotation.
    pub algorithm: Option<Algorithm>,
    pub include_weekends: bool,
    pub overwrite: bool,
    /// Calcule sans écrire dans le store.
    pub preview: bool,
    pub seed: Option<u64>,
    pub conflict_policy: ConflictPolicy,
}

/// Avertissement non bloquant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    NoCapacityRules {
        shift_type: String,
        date: NaiveDate,
    },
    NoAvailableEmployees {
        role: String,
        shift_type: String,
        date: NaiveDate,
    },
    ValidationRejected {
        employee: String,
        shift_type: String,
        date: NaiveDate,
        reason: String,
    },
    InsufficientCoverage {
        role: String,
        shift_type: String,
        date: NaiveDate,
        needed: u32,
        assigned: u32,
    },
}

impl ScheduleWarning {
    pub fn date(&self) -> NaiveDate {
        match self {
            ScheduleWarning::NoCapacityRules { date, .. }
            | ScheduleWarning::NoAvailableEmployees { date, .. }
            | ScheduleWarning::ValidationRejected { date, .. }
            | ScheduleWarning::InsufficientCoverage { date, .. } => *date,
        }
    }
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWarning::NoCapacityRules { shift_type, date } => {
                write!(f, "No capacity rules defined for {shift_type} on {date}")
            }
            ScheduleWarning::NoAvailableEmployees {
                role,
                shift_type,
                date,
            } => write!(f, "No available {role} for {shift_type} on {date}"),
            ScheduleWarning::ValidationRejected {
                employee,
                shift_type,
                date,
                reason,
            } => write!(f, "Cannot assign {employee} to {shift_type} on {date}: {reason}"),
            ScheduleWarning::InsufficientCoverage {
                role,
                shift_type,
                date,
                needed,
                assigned,
            } => write!(
                f,
                "Insufficient {role} coverage for {shift_type} on {date}. Need {needed}, assigned {assigned}"
            ),
        }
    }
}

/// Couverture d'un type de shift sur une journée.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageEntry {
    pub required: u32,
    pub current: u32,
    pub adequate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub shifts: Vec<ShiftAssignment>,
    pub coverage: BTreeMap<ShiftTypeId, CoverageEntry>,
    pub warnings: Vec<ScheduleWarning>,
}

impl DaySchedule {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            shifts: Vec::new(),
            coverage: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }
}

/// Journée dont la génération a échoué.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayError {
    pub date: NaiveDate,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub total_days: usize,
    pub total_shifts: usize,
    pub days_with_warnings: usize,
    /// Pourcentage de jours avec avertissement.
    pub warning_rate: f64,
    pub average_shifts_per_day: f64,
    pub employee_workload: BTreeMap<EmployeeId, usize>,
    pub shift_type_distribution: BTreeMap<ShiftTypeId, usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkloadStats {
    pub mean: f64,
    pub variance: f64,
    pub standard_deviation: f64,
}

/// Contrainte de temps de travail non respectée.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintViolation {
    MaxDailyHours {
        employee_id: EmployeeId,
        date: NaiveDate,
        hours: f64,
        limit: f64,
    },
    MaxWeeklyHours {
        employee_id: EmployeeId,
        week_start: NaiveDate,
        hours: f64,
        limit: f64,
    },
    MinRestBetween {
        employee_id: EmployeeId,
        date: NaiveDate,
        rest_hours: f64,
        limit: u32,
    },
    MaxConsecutiveDays {
        employee_id: EmployeeId,
        date: NaiveDate,
        days: u32,
        limit: u32,
    },
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintViolation::MaxDailyHours {
                employee_id,
                date,
                hours,
                limit,
            } => write!(f, "{employee_id} works {hours}h on {date} (max {limit}h per day)"),
            ConstraintViolation::MaxWeeklyHours {
                employee_id,
                week_start,
                hours,
                limit,
            } => write!(
                f,
                "{employee_id} works {hours}h in the week of {week_start} (max {limit}h per week)"
            ),
            ConstraintViolation::MinRestBetween {
                employee_id,
                date,
                rest_hours,
                limit,
            } => write!(
                f,
                "{employee_id} rests {rest_hours}h before the shift on {date} (min {limit}h)"
            ),
            ConstraintViolation::MaxConsecutiveDays {
                employee_id,
                date,
                days,
                limit,
            } => write!(
                f,
                "{employee_id} works {days} consecutive days up to {date} (max {limit})"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub workload: WorkloadStats,
    pub coverage_score: f64,
    pub constraint_violations: Vec<ConstraintViolation>,
    pub overall_score: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    pub date: NaiveDate,
    pub employee_id: EmployeeId,
    pub message: String,
}

/// Bilan d'écriture d'un planning dans le store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub written: usize,
    pub skipped: usize,
    pub failures: Vec<ApplyFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub schedule: Vec<DaySchedule>,
    pub summary: ScheduleSummary,
    pub errors: Vec<DayError>,
    pub warnings: Vec<ScheduleWarning>,
    pub optimization: OptimizationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<ApplyReport>,
}

/// Planning déjà stocké, résumé et noté.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleAnalysis {
    pub summary: ScheduleSummary,
    pub optimization: OptimizationReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub role_id: RoleId,
    pub priority: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Result<(), Rejection>> for ValidationOutcome {
    fn from(res: Result<(), Rejection>) -> Self {
        match res {
            Ok(()) => Self {
                valid: true,
                reason: None,
            },
            Err(rejection) => Self {
                valid: false,
                reason: Some(rejection.to_string()),
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid date range: {end} is before {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
    #[error("unknown shift type: {0}")]
    UnknownShiftType(String),
    #[error("unknown employee: {0}")]
    UnknownEmployee(String),
    #[error("unknown shift: {0}")]
    UnknownShift(String),
    #[error("invalid capacity rule for {shift_type}/{role}: max {max_allowed} < min {min_required}")]
    InvalidCapacityRule {
        shift_type: ShiftTypeId,
        role: RoleId,
        min_required: u32,
        max_allowed: u32,
    },
    #[error("swap invalid: {0}")]
    SwapInvalid(&'static str),
    #[error("cover invalid: {0}")]
    CoverInvalid(&'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
