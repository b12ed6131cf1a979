mod analysis;
mod assignment;
mod conflicts;
mod mutate;
mod types;
mod util;

pub use assignment::AUTO_ASSIGNER;
pub use conflicts::{optimize_shift_assignments, ConflictPolicy, ShiftPriority, ShiftTypePriority};
pub use types::{
    ApplyFailure, ApplyReport, ConstraintViolation, CoverageEntry, DayError, DaySchedule,
    OptimizationReport, SchedError, ScheduleAnalysis, ScheduleOptions, ScheduleResult,
    ScheduleSummary, ScheduleWarning, Suggestion, ValidationOutcome, WorkloadStats,
};

use crate::calendar::days_inclusive;
use crate::model::{EmployeeId, ShiftAssignment, ShiftId, ShiftTypeId};
use crate::pattern::{self, BulkApplyOptions, BulkApplyOutcome, PatternCoverage};
use crate::snapshot::Snapshot;
use crate::storage::Store;
use crate::strategy::{select_employees, Algorithm, SelectionContext};
use crate::validation::validate_assignment;
use chrono::NaiveDate;

/// Scheduler : moteur de planification au-dessus d'un store
pub struct Scheduler<S: Store> {
    store: S,
    priority: Box<dyn ShiftPriority>,
}

impl<S: Store> Scheduler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            priority: Box::new(ShiftTypePriority),
        }
    }

    /// Remplace la priorité utilisée pour arbitrer les conflits.
    pub fn with_priority(mut self, priority: Box<dyn ShiftPriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn snapshot(&self) -> Result<Snapshot, SchedError> {
        Ok(Snapshot::capture(&self.store)?)
    }

    fn algorithm(snapshot: &Snapshot, opts: &ScheduleOptions) -> Algorithm {
        opts.algorithm.unwrap_or(snapshot.rotation.fairness_algorithm)
    }

    /// Planifie `[start, end]` ; écrit le résultat sauf en mode aperçu.
    pub fn generate_optimal_schedule(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        opts: &ScheduleOptions,
    ) -> Result<ScheduleResult, SchedError> {
        if end < start {
            return Err(SchedError::InvalidDateRange { start, end });
        }
        let snapshot = self.snapshot()?;
        let algorithm = Self::algorithm(&snapshot, opts);
        let strategy = algorithm.strategy();
        let mut rng = util::rng_from(opts.seed);

        let mut schedule = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for date in days_inclusive(start, end) {
            match assignment::plan_day(
                &snapshot,
                date,
                opts,
                strategy.as_ref(),
                self.priority.as_ref(),
                &mut rng,
            ) {
                Ok(day) => {
                    warnings.extend(day.warnings.iter().cloned());
                    schedule.push(day);
                }
                Err(err) => {
                    tracing::warn!(%date, error = %err, "day generation failed");
                    errors.push(DayError {
                        date,
                        message: err.to_string(),
                    });
                }
            }
        }

        let summary = analysis::summarize(&schedule);
        let optimization = analysis::optimization_report(&snapshot, &schedule, &summary);
        let applied = if opts.preview {
            None
        } else {
            Some(mutate::apply_schedule(&mut self.store, &schedule, opts.overwrite))
        };

        tracing::info!(
            %start,
            %end,
            algorithm = %algorithm,
            shifts = summary.total_shifts,
            warnings = warnings.len(),
            errors = errors.len(),
            written = applied.as_ref().map_or(0, |a| a.written),
            "schedule generated"
        );

        Ok(ScheduleResult {
            schedule,
            summary,
            errors,
            warnings,
            optimization,
            applied,
        })
    }

    /// Planifie une seule journée, sans écrire.
    pub fn generate_day_schedule(
        &self,
        date: NaiveDate,
        opts: &ScheduleOptions,
    ) -> Result<DaySchedule, SchedError> {
        let snapshot = self.snapshot()?;
        let strategy = Self::algorithm(&snapshot, opts).strategy();
        let mut rng = util::rng_from(opts.seed);
        assignment::plan_day(
            &snapshot,
            date,
            opts,
            strategy.as_ref(),
            self.priority.as_ref(),
            &mut rng,
        )
    }

    pub fn validate_shift_assignment(
        &self,
        shift_type_id: &ShiftTypeId,
        employee_id: &EmployeeId,
        date: NaiveDate,
    ) -> Result<ValidationOutcome, SchedError> {
        let snapshot = self.snapshot()?;
        Ok(validate_assignment(&snapshot, shift_type_id, employee_id, date).into())
    }

    /// Candidats suggérés pour un type de shift, par règle de capacité.
    pub fn suggest_optimal_shift_assignment(
        &self,
        shift_type_id: &ShiftTypeId,
        date: NaiveDate,
        exclude: &[EmployeeId],
        seed: Option<u64>,
    ) -> Result<Vec<Suggestion>, SchedError> {
        let snapshot = self.snapshot()?;
        let shift_type = snapshot
            .shift_type(shift_type_id)
            .ok_or_else(|| SchedError::UnknownShiftType(shift_type_id.as_str().to_string()))?;
        let strategy = snapshot.rotation.fairness_algorithm.strategy();
        let mut rng = util::rng_from(seed);

        let mut out = Vec::new();
        for rule in snapshot.rules.rules_for(shift_type_id) {
            let current = util::count_role(
                &snapshot,
                snapshot.shifts_for_date(date),
                shift_type_id,
                &rule.role_id,
            );
            let needed = rule.min_required.saturating_sub(current) as usize;
            if needed == 0 {
                continue;
            }
            let candidates = snapshot
                .employees
                .iter()
                .filter(|e| e.role_id == rule.role_id && !exclude.contains(&e.id))
                .collect();
            let mut ctx = SelectionContext {
                snapshot: &snapshot,
                date,
                shift_type,
                rng: &mut rng,
            };
            let selected = select_employees(strategy.as_ref(), candidates, needed, &mut ctx);
            let role = snapshot.role_name(&rule.role_id);
            for (rank, employee) in selected.into_iter().enumerate() {
                if validate_assignment(&snapshot, shift_type_id, &employee.id, date).is_ok() {
                    out.push(Suggestion {
                        employee_id: employee.id.clone(),
                        employee_name: employee.name.clone(),
                        role_id: employee.role_id.clone(),
                        priority: rank + 1,
                        reason: format!("Required {role} for {}", shift_type.name),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Résumé et notation de ce que le store contient déjà sur `[start, end]`.
    pub fn analyze_existing_schedule(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ScheduleAnalysis, SchedError> {
        if end < start {
            return Err(SchedError::InvalidDateRange { start, end });
        }
        let snapshot = self.snapshot()?;
        let stored = snapshot.clone().with_shifts(std::iter::empty());
        let schedule: Vec<DaySchedule> = days_inclusive(start, end)
            .map(|date| {
                let shifts = snapshot.shifts_for_date(date).to_vec();
                DaySchedule {
                    date,
                    coverage: assignment::day_coverage(&stored, date, &shifts),
                    shifts,
                    warnings: Vec::new(),
                }
            })
            .collect();
        let summary = analysis::summarize(&schedule);
        let optimization = analysis::optimization_report(&stored, &schedule, &summary);
        Ok(ScheduleAnalysis {
            summary,
            optimization,
        })
    }

    /// Heures/jour, heures/semaine, repos minimal, jours consécutifs.
    pub fn audit_constraints(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ConstraintViolation>, SchedError> {
        if end < start {
            return Err(SchedError::InvalidDateRange { start, end });
        }
        let snapshot = self.snapshot()?;
        Ok(conflicts::audit_constraints(&snapshot, start, end))
    }

    pub fn apply_schedule(&mut self, schedule: &[DaySchedule], overwrite: bool) -> ApplyReport {
        mutate::apply_schedule(&mut self.store, schedule, overwrite)
    }

    pub fn apply_pattern(
        &self,
        template_id: &str,
        start: NaiveDate,
        duration_days: u32,
        employee_ids: Option<&[EmployeeId]>,
        seed: Option<u64>,
    ) -> Result<Vec<ShiftAssignment>, SchedError> {
        pattern::apply_pattern(&self.store, template_id, start, duration_days, employee_ids, seed)
    }

    pub fn bulk_apply_pattern(
        &mut self,
        template_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        opts: &BulkApplyOptions,
    ) -> BulkApplyOutcome {
        pattern::bulk_apply_pattern(&mut self.store, template_id, start, end, opts)
    }

    pub fn analyze_pattern_coverage(
        &self,
        template_id: &str,
        start: NaiveDate,
        duration_days: u32,
        seed: Option<u64>,
    ) -> Result<PatternCoverage, SchedError> {
        let snapshot = self.snapshot()?;
        pattern::analyze_pattern_coverage(&snapshot, template_id, start, duration_days, seed)
    }

    pub fn request_swap(
        &mut self,
        date: NaiveDate,
        shift_id: &ShiftId,
        with: &EmployeeId,
    ) -> Result<ShiftAssignment, SchedError> {
        mutate::request_swap(&mut self.store, date, shift_id, with)
    }

    pub fn approve_swap(
        &mut self,
        date: NaiveDate,
        shift_id: &ShiftId,
    ) -> Result<ShiftAssignment, SchedError> {
        mutate::approve_swap(&mut self.store, date, shift_id)
    }

    pub fn deny_swap(
        &mut self,
        date: NaiveDate,
        shift_id: &ShiftId,
    ) -> Result<ShiftAssignment, SchedError> {
        mutate::deny_swap(&mut self.store, date, shift_id)
    }

    pub fn mark_sick(
        &mut self,
        date: NaiveDate,
        shift_id: &ShiftId,
    ) -> Result<ShiftAssignment, SchedError> {
        mutate::mark_sick(&mut self.store, date, shift_id)
    }

    pub fn cover_shift(
        &mut self,
        date: NaiveDate,
        shift_id: &ShiftId,
        by: &EmployeeId,
    ) -> Result<ShiftAssignment, SchedError> {
        mutate::cover_shift(&mut self.store, date, shift_id, by)
    }

    pub fn delete_shift(&mut self, date: NaiveDate, shift_id: &ShiftId) -> Result<(), SchedError> {
        mutate::delete_shift(&mut self.store, date, shift_id)
    }
}
