use super::conflicts::{optimize_shift_assignments, ConflictPolicy, ShiftPriority};
use super::types::{CoverageEntry, DaySchedule, ScheduleOptions, ScheduleWarning};
use super::{util, SchedError};
use crate::calendar::is_weekend;
use crate::model::{CapacityRule, Employee, ShiftAssignment, ShiftType};
use crate::snapshot::Snapshot;
use crate::strategy::{select_employees, SelectionContext, SelectionStrategy};
use crate::validation::validate_with_pending;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

pub const AUTO_ASSIGNER: &str = "AutoScheduler";

/// Propositions d'une journée, sans écriture.
pub(super) fn plan_day(
    snapshot: &Snapshot,
    date: NaiveDate,
    opts: &ScheduleOptions,
    strategy: &dyn SelectionStrategy,
    priority: &dyn ShiftPriority,
    rng: &mut StdRng,
) -> Result<DaySchedule, SchedError> {
    if is_weekend(date) && !opts.include_weekends {
        return Ok(DaySchedule::empty(date));
    }

    let mut shifts = Vec::new();
    let mut warnings = Vec::new();

    for shift_type in &snapshot.shift_types {
        let rules: Vec<&CapacityRule> = snapshot.rules.rules_for(&shift_type.id).collect();
        if rules.is_empty() {
            warnings.push(ScheduleWarning::NoCapacityRules {
                shift_type: shift_type.name.clone(),
                date,
            });
            continue;
        }
        for rule in rules {
            if !rule.is_consistent() {
                return Err(SchedError::InvalidCapacityRule {
                    shift_type: rule.shift_type_id.clone(),
                    role: rule.role_id.clone(),
                    min_required: rule.min_required,
                    max_allowed: rule.max_allowed,
                });
            }
            let mut ctx = SelectionContext {
                snapshot,
                date,
                shift_type,
                rng: &mut *rng,
            };
            let assigned = assign_role_to_shift(
                rule,
                strategy,
                &mut ctx,
                &shifts,
                opts.conflict_policy,
                &mut warnings,
            );
            shifts.extend(assigned);
        }
    }

    let shifts = optimize_shift_assignments(snapshot, shifts, opts.conflict_policy, priority);
    let coverage = day_coverage(snapshot, date, &shifts);
    tracing::debug!(%date, shifts = shifts.len(), warnings = warnings.len(), "day planned");

    Ok(DaySchedule {
        date,
        shifts,
        coverage,
        warnings,
    })
}

/// Comble le manque d'un rôle sur un créneau.
///
/// Sont écartés les employés déjà affectés ce jour dans le store, et ceux
/// dont une proposition antérieure de la journée entre en conflit.
fn assign_role_to_shift(
    rule: &CapacityRule,
    strategy: &dyn SelectionStrategy,
    ctx: &mut SelectionContext<'_>,
    proposed: &[ShiftAssignment],
    policy: ConflictPolicy,
    warnings: &mut Vec<ScheduleWarning>,
) -> Vec<ShiftAssignment> {
    let snapshot = ctx.snapshot;
    let date = ctx.date;
    let shift_type: &ShiftType = ctx.shift_type;

    let current = util::count_role(
        snapshot,
        snapshot.shifts_for_date(date),
        &shift_type.id,
        &rule.role_id,
    );
    let needed = rule.min_required.saturating_sub(current);
    if needed == 0 {
        return Vec::new();
    }

    let available: Vec<&Employee> = snapshot
        .employees
        .iter()
        .filter(|e| e.role_id == rule.role_id)
        .filter(|e| !snapshot.shifts_for_date(date).iter().any(|s| s.employee_id == e.id))
        .filter(|e| {
            let candidate = ShiftAssignment::scheduled(date, e, shift_type, AUTO_ASSIGNER);
            !proposed
                .iter()
                .any(|p| p.employee_id == e.id && policy.conflicts(snapshot, p, &candidate))
        })
        .collect();
    if available.is_empty() {
        warnings.push(ScheduleWarning::NoAvailableEmployees {
            role: snapshot.role_name(&rule.role_id),
            shift_type: shift_type.name.clone(),
            date,
        });
        return Vec::new();
    }

    tracing::debug!(
        %date,
        shift_type = %shift_type.id,
        role = %rule.role_id,
        needed,
        candidates = available.len(),
        strategy = strategy.name(),
        "selecting employees"
    );

    // propositions déjà retenues dans la journée, comptées par la validation
    let mut pending = proposed.to_vec();
    let mut out = Vec::new();
    for employee in select_employees(strategy, available, needed as usize, ctx) {
        match validate_with_pending(snapshot, &pending, &shift_type.id, &employee.id, date) {
            Ok(()) => {
                let shift = ShiftAssignment::scheduled(date, employee, shift_type, AUTO_ASSIGNER);
                pending.push(shift.clone());
                out.push(shift);
            }
            Err(rejection) => warnings.push(ScheduleWarning::ValidationRejected {
                employee: employee.name.clone(),
                shift_type: shift_type.name.clone(),
                date,
                reason: rejection.to_string(),
            }),
        }
    }

    let assigned = out.len() as u32;
    if assigned < needed {
        warnings.push(ScheduleWarning::InsufficientCoverage {
            role: snapshot.role_name(&rule.role_id),
            shift_type: shift_type.name.clone(),
            date,
            needed,
            assigned,
        });
    }
    out
}

/// Besoin (somme des minimums) et effectif (stocké + proposé) par type de shift.
pub(super) fn day_coverage(
    snapshot: &Snapshot,
    date: NaiveDate,
    proposed: &[ShiftAssignment],
) -> BTreeMap<crate::model::ShiftTypeId, CoverageEntry> {
    let mut coverage = BTreeMap::new();
    for shift_type in &snapshot.shift_types {
        let mut entry = CoverageEntry::default();
        let mut has_rule = false;
        for rule in snapshot.rules.rules_for(&shift_type.id) {
            has_rule = true;
            entry.required += rule.min_required;
            entry.current += util::count_role(
                snapshot,
                snapshot.shifts_for_date(date).iter().chain(proposed),
                &shift_type.id,
                &rule.role_id,
            );
        }
        if has_rule {
            entry.adequate = entry.current >= entry.required;
            coverage.insert(shift_type.id.clone(), entry);
        }
    }
    coverage
}
