use super::types::{ApplyFailure, ApplyReport, DaySchedule};
use super::{util, SchedError};
use crate::model::{EmployeeId, ShiftAssignment, ShiftId, ShiftStatus, SwapInfo};
use crate::storage::Store;
use chrono::{NaiveDate, Utc};

/// Écrit les propositions une à une ; un échec n'interrompt pas la suite.
pub(super) fn apply_schedule<S: Store + ?Sized>(
    store: &mut S,
    schedule: &[DaySchedule],
    overwrite: bool,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for shift in schedule.iter().flat_map(|d| d.shifts.iter()) {
        match apply_one(store, shift, overwrite) {
            Ok(true) => report.written += 1,
            Ok(false) => report.skipped += 1,
            Err(err) => {
                tracing::warn!(date = %shift.date, employee = %shift.employee_id, error = %err, "could not store shift");
                report.failures.push(ApplyFailure {
                    date: shift.date,
                    employee_id: shift.employee_id.clone(),
                    message: format!("{err:#}"),
                });
            }
        }
    }
    report
}

fn apply_one<S: Store + ?Sized>(
    store: &mut S,
    shift: &ShiftAssignment,
    overwrite: bool,
) -> anyhow::Result<bool> {
    let existing = store
        .shifts_for_date(shift.date)?
        .into_iter()
        .find(|s| s.same_slot(shift));
    match existing {
        Some(_) if !overwrite => Ok(false),
        Some(stored) => {
            let mut replacement = shift.clone();
            replacement.id = stored.id;
            replacement.assigned_at = Some(Utc::now());
            store.update_shift(shift.date, replacement)?;
            Ok(true)
        }
        None => {
            store.add_shift(shift.date, shift.clone())?;
            Ok(true)
        }
    }
}

fn holds_other_shift<S: Store + ?Sized>(
    store: &S,
    date: NaiveDate,
    employee: &EmployeeId,
    except: &ShiftId,
) -> Result<bool, SchedError> {
    Ok(store
        .shifts_for_date(date)?
        .iter()
        .any(|s| &s.employee_id == employee && &s.id != except))
}

pub(super) fn request_swap<S: Store + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    shift_id: &ShiftId,
    with: &EmployeeId,
) -> Result<ShiftAssignment, SchedError> {
    let mut shift = util::find_shift(&*store, date, shift_id)?;
    if !store.employees()?.iter().any(|e| &e.id == with) {
        return Err(SchedError::UnknownEmployee(with.as_str().to_string()));
    }
    if &shift.employee_id == with {
        return Err(SchedError::SwapInvalid("shift already assigned to that employee"));
    }
    if shift.swap.is_some() {
        return Err(SchedError::SwapInvalid("swap already requested"));
    }
    shift.status = ShiftStatus::SwapRequested;
    shift.swap = Some(SwapInfo {
        with: with.clone(),
        requested_at: Utc::now(),
    });
    store.update_shift(date, shift.clone())?;
    Ok(shift)
}

pub(super) fn approve_swap<S: Store + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    shift_id: &ShiftId,
) -> Result<ShiftAssignment, SchedError> {
    let mut shift = util::find_shift(&*store, date, shift_id)?;
    let Some(swap) = shift.swap.take() else {
        return Err(SchedError::SwapInvalid("no pending swap request"));
    };
    let target = store
        .employees()?
        .into_iter()
        .find(|e| e.id == swap.with)
        .ok_or_else(|| SchedError::UnknownEmployee(swap.with.as_str().to_string()))?;
    if holds_other_shift(&*store, date, &target.id, &shift.id)? {
        return Err(SchedError::SwapInvalid("target already assigned on that date"));
    }

    shift.employee_id = target.id;
    shift.employee_name = Some(target.name);
    shift.role_id = Some(target.role_id);
    shift.status = ShiftStatus::Scheduled;
    store.update_shift(date, shift.clone())?;
    Ok(shift)
}

pub(super) fn deny_swap<S: Store + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    shift_id: &ShiftId,
) -> Result<ShiftAssignment, SchedError> {
    let mut shift = util::find_shift(&*store, date, shift_id)?;
    if shift.swap.take().is_none() {
        return Err(SchedError::SwapInvalid("no pending swap request"));
    }
    shift.status = ShiftStatus::Scheduled;
    store.update_shift(date, shift.clone())?;
    Ok(shift)
}

pub(super) fn mark_sick<S: Store + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    shift_id: &ShiftId,
) -> Result<ShiftAssignment, SchedError> {
    let mut shift = util::find_shift(&*store, date, shift_id)?;
    shift.status = ShiftStatus::Sick;
    store.update_shift(date, shift.clone())?;
    Ok(shift)
}

pub(super) fn cover_shift<S: Store + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    shift_id: &ShiftId,
    by: &EmployeeId,
) -> Result<ShiftAssignment, SchedError> {
    let mut shift = util::find_shift(&*store, date, shift_id)?;
    if !store.employees()?.iter().any(|e| &e.id == by) {
        return Err(SchedError::UnknownEmployee(by.as_str().to_string()));
    }
    if &shift.employee_id == by {
        return Err(SchedError::CoverInvalid("employee cannot cover their own shift"));
    }
    if holds_other_shift(&*store, date, by, &shift.id)? {
        return Err(SchedError::CoverInvalid("cover employee already assigned on that date"));
    }
    shift.status = ShiftStatus::Covered;
    shift.covered_by = Some(by.clone());
    store.update_shift(date, shift.clone())?;
    Ok(shift)
}

pub(super) fn delete_shift<S: Store + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    shift_id: &ShiftId,
) -> Result<(), SchedError> {
    util::find_shift(&*store, date, shift_id)?;
    store.delete_shift(date, shift_id)?;
    Ok(())
}
