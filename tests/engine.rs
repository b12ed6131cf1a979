#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime};
use insta::assert_snapshot;
use roulement::{
    model::{
        CapacityRule, Employee, EmployeeId, PolicySettings, Role, RotationSettings, Settings,
        ShiftAssignment, ShiftId, ShiftRules, ShiftStatus, ShiftType, ShiftTypeId,
    },
    pattern::Template,
    scheduler::{
        ConflictPolicy, ConstraintViolation, SchedError, ScheduleOptions, ScheduleWarning,
        Scheduler,
    },
    storage::{MemoryStore, Store},
    strategy::Algorithm,
};
use std::collections::HashMap;

fn hm(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 7).unwrap()
}

fn morning() -> ShiftType {
    ShiftType::new("morning", "Morning", hm(8), hm(16))
}

fn evening() -> ShiftType {
    ShiftType::new("evening", "Evening", hm(16), hm(23))
}

fn settings(nurses: usize) -> Settings {
    let mut s = Settings::default();
    s.roles = vec![Role::new("nurse", "Nurse")];
    s.employees = (1..=nurses)
        .map(|i| Employee::new(&format!("emp_{i}"), format!("Nurse {i}"), "nurse"))
        .collect();
    s.shift_types = vec![morning()];
    s.shift_rules.capacity_rules = vec![CapacityRule::new("morning", "nurse", 1, 1)];
    s
}

fn warning_lines(warnings: &[ScheduleWarning]) -> String {
    warnings.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

fn preview() -> ScheduleOptions {
    ScheduleOptions {
        preview: true,
        ..ScheduleOptions::default()
    }
}

#[test]
fn single_nurse_fills_single_slot() {
    let scheduler = Scheduler::new(MemoryStore::new(settings(1)));
    let day = scheduler.generate_day_schedule(monday(), &preview()).unwrap();

    assert!(day.warnings.is_empty());
    assert_eq!(day.shifts.len(), 1);
    let shift = &day.shifts[0];
    assert_eq!(shift.employee_id.as_str(), "emp_1");
    assert_eq!(shift.status, ShiftStatus::Scheduled);
    assert_eq!(shift.assigned_by.as_deref(), Some("AutoScheduler"));
    assert_eq!(shift.shift_type_name.as_deref(), Some("Morning"));

    let coverage = &day.coverage[&ShiftTypeId::new("morning")];
    assert_eq!((coverage.required, coverage.current), (1, 1));
    assert!(coverage.adequate);
}

#[test]
fn personal_off_day_leaves_slot_empty_with_one_warning() {
    let mut s = settings(1);
    s.policy
        .employee_off_days
        .insert(EmployeeId::new("emp_1"), vec!["Monday".into()]);
    let scheduler = Scheduler::new(MemoryStore::new(s));
    let day = scheduler.generate_day_schedule(monday(), &preview()).unwrap();

    assert!(day.shifts.is_empty());
    assert_eq!(day.warnings.len(), 1);
    assert_snapshot!(
        day.warnings[0].to_string(),
        @"Insufficient Nurse coverage for Morning on 2025-07-07. Need 1, assigned 0"
    );
}

#[test]
fn weekends_are_skipped_unless_requested() {
    let scheduler = Scheduler::new(MemoryStore::new(settings(1)));
    let saturday = NaiveDate::from_ymd_opt(2025, 7, 5).unwrap();

    let day = scheduler.generate_day_schedule(saturday, &preview()).unwrap();
    assert!(day.shifts.is_empty());
    assert!(day.warnings.is_empty());

    let opts = ScheduleOptions {
        include_weekends: true,
        ..preview()
    };
    let day = scheduler.generate_day_schedule(saturday, &opts).unwrap();
    assert_eq!(day.shifts.len(), 1);
}

#[test]
fn shift_type_without_rules_is_reported() {
    let mut s = settings(1);
    s.shift_types.push(evening());
    let scheduler = Scheduler::new(MemoryStore::new(s));
    let day = scheduler.generate_day_schedule(monday(), &preview()).unwrap();
    assert_eq!(day.shifts.len(), 1);
    assert_snapshot!(
        day.warnings[0].to_string(),
        @"No capacity rules defined for Evening on 2025-07-07"
    );
}

#[test]
fn capacity_never_exceeds_max_allowed() {
    let mut s = settings(6);
    s.shift_types.push(evening());
    s.shift_rules.capacity_rules = vec![
        CapacityRule::new("morning", "nurse", 2, 3),
        CapacityRule::new("evening", "nurse", 2, 2),
    ];
    let mut store = MemoryStore::new(s);
    let first = store.employees().unwrap()[0].clone();
    store
        .add_shift(monday(), ShiftAssignment::scheduled(monday(), &first, &morning(), "manual"))
        .unwrap();
    let mut scheduler = Scheduler::new(store);

    for algorithm in Algorithm::ALL {
        let opts = ScheduleOptions {
            algorithm: Some(algorithm),
            include_weekends: true,
            seed: Some(7),
            ..preview()
        };
        let end = monday() + chrono::Duration::days(6);
        let result = scheduler.generate_optimal_schedule(monday(), end, &opts);
        let result = match result {
            Ok(r) => r,
            Err(e) => panic!("{algorithm}: {e}"),
        };
        for day in &result.schedule {
            let mut per_type: HashMap<String, usize> = HashMap::new();
            let stored = scheduler.store().shifts_for_date(day.date).unwrap();
            for shift in stored.iter().chain(&day.shifts) {
                let st = shift.shift_type_id.as_ref().unwrap().as_str().to_string();
                *per_type.entry(st).or_default() += 1;
            }
            assert!(per_type.get("morning").copied().unwrap_or(0) <= 3, "{algorithm} {}", day.date);
            assert!(per_type.get("evening").copied().unwrap_or(0) <= 2, "{algorithm} {}", day.date);
        }
    }
}

#[test]
fn morning_and_evening_are_both_staffed() {
    let mut s = settings(4);
    s.shift_types.push(evening());
    s.shift_rules.capacity_rules = vec![
        CapacityRule::new("morning", "nurse", 2, 2),
        CapacityRule::new("evening", "nurse", 2, 2),
    ];
    let scheduler = Scheduler::new(MemoryStore::new(s));
    let day = scheduler.generate_day_schedule(monday(), &preview()).unwrap();
    assert_eq!(day.shifts.len(), 4);
    assert!(day.warnings.is_empty());
    assert!(day.coverage.values().all(|c| c.adequate));
}

#[test]
fn preview_is_deterministic() {
    let mut s = settings(5);
    s.shift_rules.capacity_rules = vec![CapacityRule::new("morning", "nurse", 2, 3)];
    let mut scheduler = Scheduler::new(MemoryStore::new(s));
    let end = monday() + chrono::Duration::days(13);
    for algorithm in [
        Algorithm::RoundRobin,
        Algorithm::BalancedWorkload,
        Algorithm::Seniority,
        Algorithm::AvailabilityScore,
        Algorithm::SkillBased,
    ] {
        let opts = ScheduleOptions {
            algorithm: Some(algorithm),
            ..preview()
        };
        let a = scheduler.generate_optimal_schedule(monday(), end, &opts).unwrap();
        let b = scheduler.generate_optimal_schedule(monday(), end, &opts).unwrap();
        assert_eq!(
            serde_json::to_string(&a.schedule).unwrap(),
            serde_json::to_string(&b.schedule).unwrap()
        );
        assert!(a.applied.is_none());
    }
    assert!(scheduler.store().all_shifts().unwrap().is_empty());
}

#[test]
fn seeded_preference_is_reproducible() {
    let scheduler = Scheduler::new(MemoryStore::new(settings(5)));
    let opts = ScheduleOptions {
        algorithm: Some(Algorithm::Preference),
        seed: Some(42),
        ..preview()
    };
    let a = scheduler.generate_day_schedule(monday(), &opts).unwrap();
    let b = scheduler.generate_day_schedule(monday(), &opts).unwrap();
    assert_eq!(a, b);
}

#[test]
fn reapply_writes_nothing_new() {
    let mut scheduler = Scheduler::new(MemoryStore::new(settings(3)));
    let end = monday() + chrono::Duration::days(4);
    let result = scheduler
        .generate_optimal_schedule(monday(), end, &ScheduleOptions::default())
        .unwrap();
    let applied = result.applied.unwrap();
    assert_eq!(applied.written, 5);
    assert!(applied.failures.is_empty());

    let again = scheduler.apply_schedule(&result.schedule, false);
    assert_eq!(again.written, 0);
    assert_eq!(again.skipped, 5);
    assert_eq!(scheduler.store().all_shifts().unwrap().len(), 5);

    let replaced = scheduler.apply_schedule(&result.schedule, true);
    assert_eq!(replaced.written, 5);
    assert_eq!(scheduler.store().all_shifts().unwrap().len(), 5);
}

#[test]
fn stored_schedule_is_already_covered() {
    let mut scheduler = Scheduler::new(MemoryStore::new(settings(2)));
    scheduler
        .generate_optimal_schedule(monday(), monday(), &ScheduleOptions::default())
        .unwrap();
    let rerun = scheduler.generate_day_schedule(monday(), &preview()).unwrap();
    assert!(rerun.shifts.is_empty());
    assert!(rerun.warnings.is_empty());
    assert!(rerun.coverage[&ShiftTypeId::new("morning")].adequate);
}

#[test]
fn reversed_range_is_rejected_before_any_write() {
    let mut scheduler = Scheduler::new(MemoryStore::new(settings(1)));
    let err = scheduler
        .generate_optimal_schedule(monday(), monday().pred_opt().unwrap(), &ScheduleOptions::default())
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidDateRange { .. }));
    assert!(scheduler.store().all_shifts().unwrap().is_empty());
}

#[test]
fn inconsistent_rule_fails_days_in_isolation() {
    let mut s = settings(1);
    s.shift_rules.capacity_rules = vec![CapacityRule::new("morning", "nurse", 3, 1)];
    let mut scheduler = Scheduler::new(MemoryStore::new(s));
    let saturday = NaiveDate::from_ymd_opt(2025, 7, 5).unwrap();
    let result = scheduler
        .generate_optimal_schedule(saturday, monday(), &preview())
        .unwrap();
    // samedi et dimanche sont sautés, seul lundi échoue
    assert_eq!(result.schedule.len(), 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].date, monday());
}

#[test]
fn already_assigned_nurse_is_not_available() {
    let mut s = settings(1);
    s.shift_types.push(evening());
    let mut store = MemoryStore::new(s);
    let nurse = store.employees().unwrap()[0].clone();
    store
        .add_shift(monday(), ShiftAssignment::scheduled(monday(), &nurse, &evening(), "manual"))
        .unwrap();
    let scheduler = Scheduler::new(store);
    let day = scheduler.generate_day_schedule(monday(), &preview()).unwrap();
    assert!(day.shifts.is_empty());
    assert!(day.warnings.iter().any(|w| w.to_string() == "No available Nurse for Morning on 2025-07-07"));
}

#[test]
fn time_overlap_policy_allows_two_shifts_a_day() {
    let mut s = settings(1);
    s.shift_types.push(evening());
    s.shift_rules.capacity_rules.push(CapacityRule::new("evening", "nurse", 1, 1));
    s.shift_rules.constraints.max_daily_hours = 16.0;
    let scheduler = Scheduler::new(MemoryStore::new(s));

    let same_date = scheduler.generate_day_schedule(monday(), &preview()).unwrap();
    assert_eq!(same_date.shifts.len(), 1);
    assert!(matches!(
        same_date.warnings[0],
        ScheduleWarning::NoAvailableEmployees { .. }
    ));

    let opts = ScheduleOptions {
        conflict_policy: ConflictPolicy::TimeOverlap,
        ..preview()
    };
    let overlap = scheduler.generate_day_schedule(monday(), &opts).unwrap();
    assert_eq!(overlap.shifts.len(), 2);
    assert!(overlap.warnings.is_empty());
}

#[test]
fn earlier_proposals_count_toward_daily_hours() {
    let mut s = settings(1);
    s.shift_types.push(evening());
    s.shift_rules.capacity_rules.push(CapacityRule::new("evening", "nurse", 1, 1));
    s.shift_rules.constraints.max_daily_hours = 12.0;
    let mut scheduler = Scheduler::new(MemoryStore::new(s));
    let opts = ScheduleOptions {
        conflict_policy: ConflictPolicy::TimeOverlap,
        ..ScheduleOptions::default()
    };
    let result = scheduler.generate_optimal_schedule(monday(), monday(), &opts).unwrap();

    assert_eq!(result.applied.as_ref().map(|a| a.written), Some(1));
    assert_snapshot!(warning_lines(&result.warnings), @r"
    Cannot assign Nurse 1 to Evening on 2025-07-07: Would exceed maximum daily hours (12)
    Insufficient Nurse coverage for Evening on 2025-07-07. Need 1, assigned 0
    ");
    assert!(result.optimization.constraint_violations.is_empty());
    assert_eq!(result.optimization.coverage_score, 50.0);

    let stored = scheduler.store().shifts_for_date(monday()).unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_shift_type(&ShiftTypeId::new("morning")));
}

#[test]
fn stored_shift_blocks_a_second_shift_over_the_limit() {
    let mut s = settings(1);
    s.shift_types.push(evening());
    s.shift_rules.capacity_rules = vec![CapacityRule::new("evening", "nurse", 1, 1)];
    s.shift_rules.constraints.max_daily_hours = 12.0;
    let mut store = MemoryStore::new(s);
    let nurse = store.employees().unwrap()[0].clone();
    store
        .add_shift(monday(), ShiftAssignment::scheduled(monday(), &nurse, &morning(), "manual"))
        .unwrap();
    let scheduler = Scheduler::new(store);
    let opts = ScheduleOptions {
        conflict_policy: ConflictPolicy::TimeOverlap,
        ..preview()
    };
    let day = scheduler.generate_day_schedule(monday(), &opts).unwrap();
    assert!(day.shifts.is_empty());
    assert!(day
        .warnings
        .iter()
        .any(|w| w.to_string() == "No available Nurse for Evening on 2025-07-07"));

    let outcome = scheduler
        .validate_shift_assignment(&ShiftTypeId::new("evening"), &nurse.id, monday())
        .unwrap();
    assert!(!outcome.valid);
    assert_eq!(outcome.reason.as_deref(), Some("Would exceed maximum daily hours (12)"));
}

#[test]
fn stored_overlong_day_is_reported_and_scored() {
    let mut s = settings(1);
    s.shift_types.push(evening());
    s.shift_rules.constraints.max_daily_hours = 12.0;
    let mut store = MemoryStore::new(s);
    let nurse = store.employees().unwrap()[0].clone();
    for st in [morning(), evening()] {
        store
            .add_shift(monday(), ShiftAssignment::scheduled(monday(), &nurse, &st, "manual"))
            .unwrap();
    }
    let scheduler = Scheduler::new(store);
    let analysis = scheduler.analyze_existing_schedule(monday(), monday()).unwrap();

    let violations = &analysis.optimization.constraint_violations;
    assert_eq!(violations.len(), 1);
    assert!(matches!(violations[0], ConstraintViolation::MaxDailyHours { hours, .. } if hours == 15.0));
    assert!(analysis.optimization.overall_score <= analysis.optimization.coverage_score - 10.0);
}

#[test]
fn summary_and_recommendations() {
    let mut scheduler = Scheduler::new(MemoryStore::new(settings(1)));
    let friday = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap();
    let result = scheduler.generate_optimal_schedule(monday(), friday, &preview()).unwrap();
    let summary = &result.summary;
    assert_eq!(summary.total_days, 5);
    assert_eq!(summary.total_shifts, 5);
    assert_eq!(summary.warning_rate, 0.0);
    assert_eq!(summary.average_shifts_per_day, 1.0);
    assert_eq!(summary.employee_workload[&EmployeeId::new("emp_1")], 5);
    assert_eq!(summary.shift_type_distribution[&ShiftTypeId::new("morning")], 5);

    let opt = &result.optimization;
    assert_eq!(opt.workload.mean, 5.0);
    assert_eq!(opt.workload.variance, 0.0);
    assert_eq!(opt.overall_score, 100.0);
    assert_eq!(
        opt.recommendations,
        ["Low shift coverage. Consider extending operating hours or adding shift types."]
    );
}

#[test]
fn suggestions_are_ranked_per_rule() {
    let mut s = settings(3);
    s.shift_rules.capacity_rules = vec![CapacityRule::new("morning", "nurse", 2, 3)];
    let scheduler = Scheduler::new(MemoryStore::new(s));
    let suggestions = scheduler
        .suggest_optimal_shift_assignment(
            &ShiftTypeId::new("morning"),
            monday(),
            &[EmployeeId::new("emp_1")],
            None,
        )
        .unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].priority, 1);
    assert_eq!(suggestions[1].priority, 2);
    assert!(suggestions.iter().all(|s| s.employee_id.as_str() != "emp_1"));
    assert_eq!(suggestions[0].reason, "Required Nurse for Morning");

    let err = scheduler
        .suggest_optimal_shift_assignment(&ShiftTypeId::new("ghost"), monday(), &[], None)
        .unwrap_err();
    assert!(matches!(err, SchedError::UnknownShiftType(_)));
}

#[test]
fn validate_reports_reason() {
    let mut store = MemoryStore::new(settings(2));
    let first = store.employees().unwrap()[0].clone();
    store
        .add_shift(monday(), ShiftAssignment::scheduled(monday(), &first, &morning(), "manual"))
        .unwrap();
    let scheduler = Scheduler::new(store);
    let outcome = scheduler
        .validate_shift_assignment(&ShiftTypeId::new("morning"), &EmployeeId::new("emp_2"), monday())
        .unwrap();
    assert!(!outcome.valid);
    assert_snapshot!(
        outcome.reason.unwrap(),
        @"Maximum capacity reached for this role in this shift (1)"
    );
}

fn stored_scheduler(nurses: usize) -> (Scheduler<MemoryStore>, ShiftAssignment) {
    let mut scheduler = Scheduler::new(MemoryStore::new(settings(nurses)));
    scheduler
        .generate_optimal_schedule(monday(), monday(), &ScheduleOptions::default())
        .unwrap();
    let shift = scheduler.store().shifts_for_date(monday()).unwrap().remove(0);
    (scheduler, shift)
}

#[test]
fn swap_request_then_approval_moves_shift() {
    let (mut scheduler, shift) = stored_scheduler(2);
    let other = if shift.employee_id.as_str() == "emp_1" { "emp_2" } else { "emp_1" };
    let other = EmployeeId::new(other);

    let requested = scheduler.request_swap(monday(), &shift.id, &other).unwrap();
    assert_eq!(requested.status, ShiftStatus::SwapRequested);
    assert!(matches!(
        scheduler.request_swap(monday(), &shift.id, &other),
        Err(SchedError::SwapInvalid(_))
    ));

    let approved = scheduler.approve_swap(monday(), &shift.id).unwrap();
    assert_eq!(approved.employee_id, other);
    assert_eq!(approved.status, ShiftStatus::Scheduled);
    let stored = scheduler.store().shifts_for_date(monday()).unwrap();
    assert_eq!(stored[0].employee_id, other);
    assert!(stored[0].swap.is_none());
}

#[test]
fn denied_swap_keeps_assignee() {
    let (mut scheduler, shift) = stored_scheduler(2);
    assert!(matches!(
        scheduler.approve_swap(monday(), &shift.id),
        Err(SchedError::SwapInvalid(_))
    ));
    let other = EmployeeId::new(if shift.employee_id.as_str() == "emp_1" { "emp_2" } else { "emp_1" });
    scheduler.request_swap(monday(), &shift.id, &other).unwrap();
    let denied = scheduler.deny_swap(monday(), &shift.id).unwrap();
    assert_eq!(denied.employee_id, shift.employee_id);
    assert_eq!(denied.status, ShiftStatus::Scheduled);
}

#[test]
fn sick_cover_and_delete() {
    let (mut scheduler, shift) = stored_scheduler(2);
    let sick = scheduler.mark_sick(monday(), &shift.id).unwrap();
    assert_eq!(sick.status, ShiftStatus::Sick);

    assert!(matches!(
        scheduler.cover_shift(monday(), &shift.id, &shift.employee_id),
        Err(SchedError::CoverInvalid(_))
    ));
    let other = EmployeeId::new(if shift.employee_id.as_str() == "emp_1" { "emp_2" } else { "emp_1" });
    let covered = scheduler.cover_shift(monday(), &shift.id, &other).unwrap();
    assert_eq!(covered.status, ShiftStatus::Covered);
    assert_eq!(covered.covered_by, Some(other));

    scheduler.delete_shift(monday(), &shift.id).unwrap();
    assert!(matches!(
        scheduler.delete_shift(monday(), &shift.id),
        Err(SchedError::UnknownShift(_))
    ));
}

#[test]
fn audit_flags_streaks_weekly_hours_and_short_rest() {
    let mut s = settings(1);
    s.shift_types.push(ShiftType::new("night", "Night", hm(22), hm(6)));
    s.shift_rules.constraints.max_consecutive_days = 3;
    s.shift_rules.constraints.max_weekly_hours = 30.0;
    s.shift_rules.constraints.min_hours_between = 8;
    let mut store = MemoryStore::new(s);
    let nurse = store.employees().unwrap()[0].clone();
    let sunday = NaiveDate::from_ymd_opt(2025, 7, 6).unwrap();
    for date in sunday.iter_days().take(5) {
        store
            .add_shift(date, ShiftAssignment::scheduled(date, &nurse, &morning(), "manual"))
            .unwrap();
    }
    // nuit du lundi puis matin du mardi : 2 h de repos
    let night = ShiftType::new("night", "Night", hm(22), hm(6));
    store
        .add_shift(monday(), ShiftAssignment::scheduled(monday(), &nurse, &night, "manual"))
        .unwrap();

    let scheduler = Scheduler::new(store);
    let violations = scheduler
        .audit_constraints(sunday, sunday + chrono::Duration::days(6))
        .unwrap();

    assert!(violations
        .iter()
        .any(|v| matches!(v, ConstraintViolation::MaxConsecutiveDays { days: 4, .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v, ConstraintViolation::MaxWeeklyHours { hours, .. } if *hours == 48.0)));
    assert!(violations.iter().any(|v| matches!(
        v,
        ConstraintViolation::MinRestBetween { rest_hours, .. } if *rest_hours == 2.0
    )));
}

/// Store qui refuse toute écriture sur une date donnée.
struct FailsOn {
    inner: MemoryStore,
    date: NaiveDate,
}

impl Store for FailsOn {
    fn employees(&self) -> anyhow::Result<Vec<Employee>> {
        self.inner.employees()
    }
    fn roles(&self) -> anyhow::Result<Vec<Role>> {
        self.inner.roles()
    }
    fn shift_types(&self) -> anyhow::Result<Vec<ShiftType>> {
        self.inner.shift_types()
    }
    fn shift_rules(&self) -> anyhow::Result<ShiftRules> {
        self.inner.shift_rules()
    }
    fn rotation_settings(&self) -> anyhow::Result<RotationSettings> {
        self.inner.rotation_settings()
    }
    fn policy_settings(&self) -> anyhow::Result<PolicySettings> {
        self.inner.policy_settings()
    }
    fn shift_templates(&self) -> anyhow::Result<Vec<Template>> {
        self.inner.shift_templates()
    }
    fn shifts_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<ShiftAssignment>> {
        self.inner.shifts_for_date(date)
    }
    fn all_shifts(&self) -> anyhow::Result<Vec<ShiftAssignment>> {
        self.inner.all_shifts()
    }
    fn add_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<ShiftId> {
        if date == self.date {
            anyhow::bail!("no space left for {date}");
        }
        self.inner.add_shift(date, shift)
    }
    fn update_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<()> {
        self.inner.update_shift(date, shift)
    }
    fn delete_shift(&mut self, date: NaiveDate, id: &ShiftId) -> anyhow::Result<()> {
        self.inner.delete_shift(date, id)
    }
}

#[test]
fn one_failed_write_does_not_stop_the_others() {
    let wednesday = NaiveDate::from_ymd_opt(2025, 7, 9).unwrap();
    let friday = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap();
    let store = FailsOn {
        inner: MemoryStore::new(settings(2)),
        date: wednesday,
    };
    let mut scheduler = Scheduler::new(store);
    let result = scheduler
        .generate_optimal_schedule(monday(), friday, &ScheduleOptions::default())
        .unwrap();

    let applied = result.applied.unwrap();
    assert_eq!(applied.written, 4);
    assert_eq!(applied.failures.len(), 1);
    assert_eq!(applied.failures[0].date, wednesday);
    assert_eq!(applied.failures[0].message, "no space left for 2025-07-09");
    assert_eq!(scheduler.store().all_shifts().unwrap().len(), 4);
    assert!(scheduler.store().shifts_for_date(wednesday).unwrap().is_empty());
}
