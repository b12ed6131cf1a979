use crate::model::{calculate_shift_duration, EmployeeId, ShiftAssignment, ShiftTypeId};
use crate::snapshot::Snapshot;
use chrono::NaiveDate;
use thiserror::Error;

/// Motif de refus d'une affectation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("Employee not found")]
    UnknownEmployee,
    #[error("Maximum capacity reached for this role in this shift ({max_allowed})")]
    CapacityReached { max_allowed: u32 },
    #[error("Would exceed maximum daily hours ({limit})")]
    DailyHoursExceeded { hours: f64, limit: f64 },
}

/// Vérifie qu'une affectation candidate respecte capacité et heures/jour.
///
/// S'arrête au premier contrôle en échec, sans effet de bord.
pub fn validate_assignment(
    snapshot: &Snapshot,
    shift_type_id: &ShiftTypeId,
    employee_id: &EmployeeId,
    date: NaiveDate,
) -> Result<(), Rejection> {
    validate_with_pending(snapshot, &[], shift_type_id, employee_id, date)
}

/// Comme [`validate_assignment`], en comptant aussi les propositions pas
/// encore écrites (`pending`) de la même journée.
pub fn validate_with_pending(
    snapshot: &Snapshot,
    pending: &[ShiftAssignment],
    shift_type_id: &ShiftTypeId,
    employee_id: &EmployeeId,
    date: NaiveDate,
) -> Result<(), Rejection> {
    let employee = snapshot
        .employee(employee_id)
        .ok_or(Rejection::UnknownEmployee)?;
    let stored = snapshot.shifts_for_date(date);
    let pending: Vec<&ShiftAssignment> = pending.iter().filter(|s| s.date == date).collect();
    let day = || stored.iter().chain(pending.iter().copied());

    if let Some(rule) = snapshot.rules.rule_for(shift_type_id, &employee.role_id) {
        let same_role = day()
            .filter(|s| s.is_shift_type(shift_type_id))
            .filter(|s| snapshot.role_of(&s.employee_id) == Some(&employee.role_id))
            .count();
        if same_role >= rule.max_allowed as usize {
            return Err(Rejection::CapacityReached {
                max_allowed: rule.max_allowed,
            });
        }
    }

    let limit = snapshot.constraints().max_daily_hours;
    let worked: f64 = day()
        .filter(|s| &s.employee_id == employee_id)
        .map(|s| snapshot.duration_of(s))
        .sum();
    let hours = worked + calculate_shift_duration(snapshot.shift_type(shift_type_id));
    if hours > limit {
        return Err(Rejection::DailyHoursExceeded { hours, limit });
    }

    Ok(())
}
