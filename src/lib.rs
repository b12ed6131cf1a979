#![forbid(unsafe_code)]
//! Roulement : moteur de planification d'équipes par créneaux (sans BD).
//!
//! - Règles de capacité par rôle et type de shift.
//! - Stratégies de sélection interchangeables.
//! - Patterns de rotation (rotatif, fixe, alterné, règles personnalisées).
//! - Stockage JSON atomique ; dates calendaires locales.

pub mod availability;
pub mod calendar;
pub mod model;
pub mod pattern;
pub mod scheduler;
pub mod snapshot;
pub mod storage;
pub mod strategy;
pub mod validation;

pub use model::{
    calculate_shift_duration, CapacityRule, Constraints, Employee, EmployeeId, PolicySettings,
    Role, RoleId, RotationSettings, Settings, ShiftAssignment, ShiftId, ShiftRules, ShiftStatus,
    ShiftType, ShiftTypeId, TemplateId,
};
pub use pattern::{
    analyze_pattern_coverage, apply_pattern, bulk_apply_pattern, predefined_patterns,
    validate_and_optimize_shifts, BulkApplyOptions, BulkApplyOutcome, Pattern, PatternCoverage,
    PatternEngine, Template,
};
pub use scheduler::{
    ConflictPolicy, DaySchedule, SchedError, ScheduleOptions, ScheduleResult, ScheduleWarning,
    Scheduler, ShiftPriority, ShiftTypePriority,
};
pub use snapshot::Snapshot;
pub use storage::{JsonStorage, MemoryStore, Store, StoreData};
pub use strategy::{Algorithm, SelectionStrategy};
pub use validation::{validate_assignment, validate_with_pending, Rejection};
