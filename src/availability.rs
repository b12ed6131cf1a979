use crate::calendar::day_name;
use crate::model::{off_day_matches, Employee, EmployeeId};
use crate::snapshot::Snapshot;
use chrono::{Duration, NaiveDate};

const BASE_SCORE: i32 = 100;
const DEFAULT_OFF_DAY_PENALTY: i32 = 20;
const PERSONAL_OFF_DAY_PENALTY: i32 = 40;
const HEAVY_WEEK_PENALTY: i32 = 15;
const HEAVY_WEEK_DAYS: usize = 5;
const CONSECUTIVE_DAY_PENALTY: i32 = 10;

/// Score de disponibilité dans `[0, 100]` ; plus haut = plus disponible.
pub fn availability_score(snapshot: &Snapshot, employee: &Employee, date: NaiveDate) -> u8 {
    let mut score = BASE_SCORE;
    let day = day_name(date);

    if snapshot
        .policy
        .default_off_days
        .iter()
        .any(|d| d.eq_ignore_ascii_case(day))
    {
        score -= DEFAULT_OFF_DAY_PENALTY;
    }
    if has_personal_off_day(snapshot, &employee.id, date) {
        score -= PERSONAL_OFF_DAY_PENALTY;
    }
    if days_worked_before(snapshot, &employee.id, date, 7) >= HEAVY_WEEK_DAYS {
        score -= HEAVY_WEEK_PENALTY;
    }
    if let Some(yesterday) = date.pred_opt() {
        if worked_on(snapshot, &employee.id, yesterday) {
            score -= CONSECUTIVE_DAY_PENALTY;
        }
    }

    score.clamp(0, 100) as u8
}

pub fn has_personal_off_day(snapshot: &Snapshot, employee: &EmployeeId, date: NaiveDate) -> bool {
    off_day_matches(snapshot.policy.personal_off_days(employee), date)
}

pub fn worked_on(snapshot: &Snapshot, employee: &EmployeeId, date: NaiveDate) -> bool {
    snapshot
        .shifts_for_date(date)
        .iter()
        .any(|s| &s.employee_id == employee)
}

/// Jours travaillés parmi les `window` jours précédant `date`.
pub fn days_worked_before(
    snapshot: &Snapshot,
    employee: &EmployeeId,
    date: NaiveDate,
    window: i64,
) -> usize {
    (1..=window)
        .map(|back| date - Duration::days(back))
        .filter(|d| worked_on(snapshot, employee, *d))
        .count()
}

/// Jours consécutifs travaillés juste avant `date` (à partir de la veille).
pub fn consecutive_work_days(snapshot: &Snapshot, employee: &EmployeeId, date: NaiveDate) -> u32 {
    let mut count = 0;
    let mut cursor = date.pred_opt();
    while let Some(day) = cursor {
        if !worked_on(snapshot, employee, day) {
            break;
        }
        count += 1;
        cursor = day.pred_opt();
    }
    count
}
