//! Stratégies de sélection : ordonnent les candidats d'un créneau.
//!
//! Chaque stratégie renvoie la liste du plus au moins prioritaire. Le filtre
//! dur de disponibilité ([`apply_availability_filters`]) passe ensuite, puis
//! on garde les `needed` premiers.

use crate::availability::{availability_score, consecutive_work_days, has_personal_off_day};
use crate::calendar::{month_bounds, unix_days, week_start};
use crate::model::{Employee, ShiftType};
use crate::snapshot::Snapshot;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// Algorithme d'équité configuré (réglages de rotation ou option d'exécution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    BalancedWorkload,
    Seniority,
    Preference,
    AvailabilityScore,
    SkillBased,
    /// Nom inconnu = round-robin, comme le choix par défaut.
    #[default]
    #[serde(other)]
    RoundRobin,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::RoundRobin,
        Algorithm::BalancedWorkload,
        Algorithm::Seniority,
        Algorithm::Preference,
        Algorithm::AvailabilityScore,
        Algorithm::SkillBased,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::RoundRobin => "round-robin",
            Algorithm::BalancedWorkload => "balanced-workload",
            Algorithm::Seniority => "seniority",
            Algorithm::Preference => "preference",
            Algorithm::AvailabilityScore => "availability-score",
            Algorithm::SkillBased => "skill-based",
        }
    }

    pub fn strategy(self) -> Box<dyn SelectionStrategy> {
        match self {
            Algorithm::RoundRobin => Box::new(RoundRobin),
            Algorithm::BalancedWorkload => Box::new(BalancedWorkload),
            Algorithm::Seniority => Box::new(Seniority),
            Algorithm::Preference => Box::new(Preference),
            Algorithm::AvailabilityScore => Box::new(AvailabilityScore),
            Algorithm::SkillBased => Box::new(SkillBased),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "rotation" {
            return Ok(Algorithm::RoundRobin);
        }
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown algorithm: {s}"))
    }
}

/// Contexte d'un classement : la vue, le jour, le créneau, et l'aléa.
pub struct SelectionContext<'a> {
    pub snapshot: &'a Snapshot,
    pub date: NaiveDate,
    pub shift_type: &'a ShiftType,
    pub rng: &'a mut StdRng,
}

pub trait SelectionStrategy {
    fn name(&self) -> &'static str;

    /// Ordonne les candidats, le plus prioritaire en tête.
    fn rank<'e>(
        &self,
        candidates: Vec<&'e Employee>,
        ctx: &mut SelectionContext<'_>,
    ) -> Vec<&'e Employee>;
}

/// Rotation déterministe selon le jour.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl SelectionStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "round-robin"
    }

    fn rank<'e>(
        &self,
        mut candidates: Vec<&'e Employee>,
        ctx: &mut SelectionContext<'_>,
    ) -> Vec<&'e Employee> {
        if candidates.is_empty() {
            return candidates;
        }
        let shift = unix_days(ctx.date).rem_euclid(candidates.len() as i64) as usize;
        candidates.rotate_left(shift);
        candidates
    }
}

/// Heures de la semaine croissantes, puis nombre de shifts du mois.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedWorkload;

impl SelectionStrategy for BalancedWorkload {
    fn name(&self) -> &'static str {
        "balanced-workload"
    }

    fn rank<'e>(
        &self,
        candidates: Vec<&'e Employee>,
        ctx: &mut SelectionContext<'_>,
    ) -> Vec<&'e Employee> {
        let week = week_start(ctx.date);
        let (month_first, month_last) = month_bounds(ctx.date);
        let mut keyed: Vec<(f64, usize, &'e Employee)> = candidates
            .into_iter()
            .map(|e| {
                (
                    ctx.snapshot.weekly_hours(&e.id, week),
                    ctx.snapshot.shift_count_between(&e.id, month_first, month_last),
                    e,
                )
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        keyed.into_iter().map(|(_, _, e)| e).collect()
    }
}

/// Ancienneté : date d'entrée la plus ancienne d'abord.
#[derive(Debug, Clone, Copy, Default)]
pub struct Seniority;

impl Seniority {
    /// Clé d'ancienneté : les employés datés (`created_at`) passent avant
    /// ceux qui n'ont que le jeton numérique d'un ancien id `emp_<n>`.
    pub fn key(employee: &Employee) -> (bool, i64) {
        if let Some(created) = employee.created_at {
            return (false, created.timestamp_millis());
        }
        let token = employee
            .id
            .as_str()
            .split('_')
            .nth(1)
            .map(|tok| tok.chars().take_while(char::is_ascii_digit).collect::<String>())
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(0);
        (true, token)
    }
}

impl SelectionStrategy for Seniority {
    fn name(&self) -> &'static str {
        "seniority"
    }

    fn rank<'e>(
        &self,
        mut candidates: Vec<&'e Employee>,
        _ctx: &mut SelectionContext<'_>,
    ) -> Vec<&'e Employee> {
        candidates.sort_by_key(|e| Seniority::key(e));
        candidates
    }
}

/// Pas de données de préférence : ordre aléatoire (reproductible si l'aléa est semé).
#[derive(Debug, Clone, Copy, Default)]
pub struct Preference;

impl SelectionStrategy for Preference {
    fn name(&self) -> &'static str {
        "preference"
    }

    fn rank<'e>(
        &self,
        mut candidates: Vec<&'e Employee>,
        ctx: &mut SelectionContext<'_>,
    ) -> Vec<&'e Employee> {
        tracing::debug!(
            date = %ctx.date,
            shift_type = %ctx.shift_type.id,
            "no preference data, shuffling candidates"
        );
        candidates.shuffle(&mut *ctx.rng);
        candidates
    }
}

/// Score de disponibilité décroissant.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityScore;

impl SelectionStrategy for AvailabilityScore {
    fn name(&self) -> &'static str {
        "availability-score"
    }

    fn rank<'e>(
        &self,
        mut candidates: Vec<&'e Employee>,
        ctx: &mut SelectionContext<'_>,
    ) -> Vec<&'e Employee> {
        candidates.sort_by_cached_key(|e| Reverse(availability_score(ctx.snapshot, e, ctx.date)));
        candidates
    }
}

/// Aucun modèle de compétences : l'ordre d'entrée est conservé.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillBased;

impl SelectionStrategy for SkillBased {
    fn name(&self) -> &'static str {
        "skill-based"
    }

    fn rank<'e>(
        &self,
        candidates: Vec<&'e Employee>,
        ctx: &mut SelectionContext<'_>,
    ) -> Vec<&'e Employee> {
        tracing::debug!(
            shift_type = %ctx.shift_type.id,
            "no skill model, keeping input order"
        );
        candidates
    }
}

/// Filtre dur : repos personnel et plafond de jours consécutifs.
pub fn apply_availability_filters<'e>(
    snapshot: &Snapshot,
    ranked: Vec<&'e Employee>,
    date: NaiveDate,
) -> Vec<&'e Employee> {
    let max_consecutive = snapshot.constraints().max_consecutive_days;
    ranked
        .into_iter()
        .filter(|e| !has_personal_off_day(snapshot, &e.id, date))
        .filter(|e| consecutive_work_days(snapshot, &e.id, date) < max_consecutive)
        .collect()
}

/// Classe, filtre puis garde les `needed` premiers.
pub fn select_employees<'e>(
    strategy: &dyn SelectionStrategy,
    candidates: Vec<&'e Employee>,
    needed: usize,
    ctx: &mut SelectionContext<'_>,
) -> Vec<&'e Employee> {
    let ranked = strategy.rank(candidates, ctx);
    let mut filtered = apply_availability_filters(ctx.snapshot, ranked, ctx.date);
    filtered.truncate(needed);
    filtered
}
