use super::types::ConstraintViolation;
use super::util;
use crate::calendar::{days_inclusive, week_start};
use crate::model::{EmployeeId, ShiftAssignment};
use crate::snapshot::Snapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Quand deux shifts d'un même employé sont-ils en conflit ?
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Toute paire le même jour.
    #[default]
    SameDate,
    /// Intersection réelle des horaires (nuit comprise).
    TimeOverlap,
}

impl ConflictPolicy {
    pub fn conflicts(self, snapshot: &Snapshot, a: &ShiftAssignment, b: &ShiftAssignment) -> bool {
        match self {
            ConflictPolicy::SameDate => a.date == b.date,
            ConflictPolicy::TimeOverlap => {
                let resolve = |s: &ShiftAssignment| {
                    s.shift_type_id
                        .as_ref()
                        .and_then(|id| snapshot.shift_type(id))
                        .map(|st| util::shift_interval(s.date, st))
                };
                match (resolve(a), resolve(b)) {
                    (Some((a0, a1)), Some((b0, b1))) => util::overlaps(a0, a1, b0, b1),
                    // horaires inconnus : on retombe sur la règle du même jour
                    _ => a.date == b.date,
                }
            }
        }
    }
}

/// Priorité d'un shift lors d'un conflit ; la plus haute l'emporte.
pub trait ShiftPriority {
    fn priority(&self, snapshot: &Snapshot, shift: &ShiftAssignment) -> i32;
}

/// Lit `ShiftType::priority`, 1 si le type est inconnu.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftTypePriority;

impl ShiftPriority for ShiftTypePriority {
    fn priority(&self, snapshot: &Snapshot, shift: &ShiftAssignment) -> i32 {
        shift
            .shift_type_id
            .as_ref()
            .and_then(|id| snapshot.shift_type(id))
            .map_or(1, |st| st.priority)
    }
}

/// Garde, pour chaque employé, les shifts retenus deux à deux sans conflit.
///
/// Un shift entrant est comparé à tous les shifts déjà retenus de l'employé ;
/// s'il en contredit, il ne les remplace que si sa priorité est strictement
/// supérieure à chacun d'eux.
pub fn optimize_shift_assignments(
    snapshot: &Snapshot,
    shifts: Vec<ShiftAssignment>,
    policy: ConflictPolicy,
    priority: &dyn ShiftPriority,
) -> Vec<ShiftAssignment> {
    let mut slots: Vec<Option<ShiftAssignment>> = Vec::with_capacity(shifts.len());
    let mut kept: HashMap<EmployeeId, Vec<usize>> = HashMap::new();

    for shift in shifts {
        let held = kept.entry(shift.employee_id.clone()).or_default();
        let clashing: Vec<usize> = held
            .iter()
            .copied()
            .filter(|&idx| {
                slots[idx]
                    .as_ref()
                    .is_some_and(|other| policy.conflicts(snapshot, other, &shift))
            })
            .collect();

        if clashing.is_empty() {
            held.push(slots.len());
            slots.push(Some(shift));
            continue;
        }

        let incoming = priority.priority(snapshot, &shift);
        let wins = clashing.iter().all(|&idx| {
            slots[idx]
                .as_ref()
                .is_some_and(|other| incoming > priority.priority(snapshot, other))
        });
        if !wins {
            continue;
        }

        tracing::debug!(
            employee = %shift.employee_id,
            date = %shift.date,
            replaced = clashing.len(),
            "conflicting shift replaced by higher priority one"
        );
        held.retain(|idx| !clashing[1..].contains(idx));
        for &idx in &clashing[1..] {
            slots[idx] = None;
        }
        slots[clashing[0]] = Some(shift);
    }
    slots.into_iter().flatten().collect()
}

/// Dépassements du plafond d'heures journalier sur les jours donnés.
pub(super) fn daily_hours_violations(
    snapshot: &Snapshot,
    dates: impl IntoIterator<Item = NaiveDate>,
) -> Vec<ConstraintViolation> {
    let limit = snapshot.constraints().max_daily_hours;
    let mut out = Vec::new();
    for date in dates {
        let employees: BTreeSet<&EmployeeId> = snapshot
            .shifts_for_date(date)
            .iter()
            .map(|s| &s.employee_id)
            .collect();
        for employee in employees {
            let hours = snapshot.daily_hours(employee, date);
            if hours > limit {
                out.push(ConstraintViolation::MaxDailyHours {
                    employee_id: employee.clone(),
                    date,
                    hours,
                    limit,
                });
            }
        }
    }
    out
}

/// Contrôle complet des shifts stockés sur `[start, end]`.
pub(super) fn audit_constraints(
    snapshot: &Snapshot,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<ConstraintViolation> {
    let constraints = *snapshot.constraints();
    let mut out = daily_hours_violations(snapshot, days_inclusive(start, end));

    let weeks: BTreeSet<NaiveDate> = days_inclusive(start, end).map(week_start).collect();
    for employee in &snapshot.employees {
        for week in &weeks {
            let hours = snapshot.weekly_hours(&employee.id, *week);
            if hours > constraints.max_weekly_hours {
                out.push(ConstraintViolation::MaxWeeklyHours {
                    employee_id: employee.id.clone(),
                    week_start: *week,
                    hours,
                    limit: constraints.max_weekly_hours,
                });
            }
        }
    }

    let min_rest_minutes = i64::from(constraints.min_hours_between) * 60;
    for employee in &snapshot.employees {
        let mut intervals: Vec<(i64, i64, NaiveDate)> = snapshot
            .shifts_between(start, end)
            .filter(|s| s.employee_id == employee.id)
            .filter_map(|s| {
                let st = snapshot.shift_type(s.shift_type_id.as_ref()?)?;
                let (a, b) = util::shift_interval(s.date, st);
                Some((a, b, s.date))
            })
            .collect();
        intervals.sort_unstable();
        for pair in intervals.windows(2) {
            let (_, prev_end, _) = pair[0];
            let (next_start, _, date) = pair[1];
            let gap = next_start - prev_end;
            if gap < min_rest_minutes {
                out.push(ConstraintViolation::MinRestBetween {
                    employee_id: employee.id.clone(),
                    date,
                    rest_hours: gap.max(0) as f64 / 60.0,
                    limit: constraints.min_hours_between,
                });
            }
        }

        let mut streak = 0u32;
        for date in days_inclusive(start, end) {
            if snapshot.shifts_for_date(date).iter().any(|s| s.employee_id == employee.id) {
                streak += 1;
                if streak == constraints.max_consecutive_days + 1 {
                    out.push(ConstraintViolation::MaxConsecutiveDays {
                        employee_id: employee.id.clone(),
                        date,
                        days: streak,
                        limit: constraints.max_consecutive_days,
                    });
                }
            } else {
                streak = 0;
            }
        }
    }

    out
}
