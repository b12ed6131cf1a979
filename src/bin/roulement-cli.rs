#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use roulement::{
    calendar::days_between,
    model::{EmployeeId, ShiftId, ShiftTypeId},
    pattern::{predefined_patterns, BulkApplyOptions, BulkApplyOutcome},
    scheduler::{ConflictPolicy, ScheduleOptions, Scheduler},
    storage::JsonStorage,
    strategy::Algorithm,
};
use serde::Serialize;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification d'équipes (store JSON local)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du store
    #[arg(long, global = true, default_value = "schedule.json")]
    store: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer un planning sur une période (bornes incluses)
    Generate {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        algorithm: Option<Algorithm>,
        #[arg(long)]
        include_weekends: bool,
        #[arg(long)]
        overwrite: bool,
        /// Ne rien écrire dans le store
        #[arg(long)]
        preview: bool,
        #[arg(long)]
        seed: Option<u64>,
        /// Conflit = chevauchement horaire (au lieu de même jour)
        #[arg(long)]
        time_overlap: bool,
    },

    /// Proposer le planning d'une journée (sans écriture)
    Day {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        algorithm: Option<Algorithm>,
        #[arg(long)]
        include_weekends: bool,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Suggérer des employés pour un type de shift
    Suggest {
        #[arg(long)]
        shift_type: String,
        #[arg(long)]
        date: NaiveDate,
        /// liste "id1,id2,..."
        #[arg(long)]
        exclude: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Vérifier une affectation candidate
    Validate {
        #[arg(long)]
        shift_type: String,
        #[arg(long)]
        employee: String,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Appliquer ou analyser un template de pattern
    Pattern {
        #[command(subcommand)]
        cmd: PatternCommands,
    },

    /// Lister les rotations prédéfinies
    Patterns,

    /// Contrôler les contraintes sur les shifts stockés
    Audit {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Résumé et score au lieu de la liste des violations
        #[arg(long)]
        summary: bool,
    },

    /// Demandes d'échange
    Swap {
        #[command(subcommand)]
        cmd: SwapCommands,
    },

    /// Faire couvrir un shift par un autre employé
    Cover {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        shift_id: String,
        #[arg(long)]
        by: String,
    },

    /// Déclarer un shift en maladie
    Sick {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        shift_id: String,
    },

    /// Supprimer un shift
    Delete {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        shift_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum PatternCommands {
    /// Générer et écrire sur [start, end) (fin exclue)
    Apply {
        #[arg(long)]
        template: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// liste "id1,id2,..."
        #[arg(long)]
        employees: Option<String>,
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        preview: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Couverture que produirait un template
    Analyze {
        #[arg(long)]
        template: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long, default_value_t = 14)]
        days: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum SwapCommands {
    Request {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        shift_id: String,
        #[arg(long)]
        with: String,
    },
    Approve {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        shift_id: String,
    },
    Deny {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        shift_id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn id_list(raw: Option<String>) -> Option<Vec<EmployeeId>> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(EmployeeId::new)
            .collect()
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }

    let storage = JsonStorage::open(&cli.store)?;
    let mut scheduler = Scheduler::new(storage);

    let code = match cli.cmd {
        Commands::Generate {
            start,
            end,
            algorithm,
            include_weekends,
            overwrite,
            preview,
            seed,
            time_overlap,
        } => {
            let opts = ScheduleOptions {
                algorithm,
                include_weekends,
                overwrite,
                preview,
                seed,
                conflict_policy: if time_overlap {
                    ConflictPolicy::TimeOverlap
                } else {
                    ConflictPolicy::SameDate
                },
            };
            let result = scheduler.generate_optimal_schedule(start, end, &opts)?;
            print_json(&result)?;
            for warning in &result.warnings {
                eprintln!("WARNING: {warning}");
            }
            // Code 2 = WARNING/INCOMPLETE
            if result.warnings.is_empty() && result.errors.is_empty() {
                0
            } else {
                2
            }
        }
        Commands::Day {
            date,
            algorithm,
            include_weekends,
            seed,
        } => {
            let opts = ScheduleOptions {
                algorithm,
                include_weekends,
                seed,
                preview: true,
                ..ScheduleOptions::default()
            };
            let day = scheduler.generate_day_schedule(date, &opts)?;
            print_json(&day)?;
            if day.warnings.is_empty() {
                0
            } else {
                2
            }
        }
        Commands::Suggest {
            shift_type,
            date,
            exclude,
            seed,
        } => {
            let exclude = id_list(exclude).unwrap_or_default();
            let suggestions = scheduler.suggest_optimal_shift_assignment(
                &ShiftTypeId::new(shift_type),
                date,
                &exclude,
                seed,
            )?;
            print_json(&suggestions)?;
            0
        }
        Commands::Validate {
            shift_type,
            employee,
            date,
        } => {
            let outcome = scheduler.validate_shift_assignment(
                &ShiftTypeId::new(shift_type),
                &EmployeeId::new(employee),
                date,
            )?;
            print_json(&outcome)?;
            if outcome.valid {
                0
            } else {
                2
            }
        }
        Commands::Pattern { cmd } => match cmd {
            PatternCommands::Apply {
                template,
                start,
                end,
                employees,
                overwrite,
                preview,
                seed,
            } => {
                let employees = id_list(employees);
                if preview {
                    if end < start {
                        bail!("end date {end} is before start date {start}");
                    }
                    let days = u32::try_from(days_between(start, end))?;
                    let shifts = scheduler.apply_pattern(
                        &template,
                        start,
                        days,
                        employees.as_deref(),
                        seed,
                    )?;
                    print_json(&shifts)?;
                } else {
                    let opts = BulkApplyOptions {
                        employee_ids: employees,
                        overwrite,
                        seed,
                    };
                    let outcome = scheduler.bulk_apply_pattern(&template, start, end, &opts);
                    if let BulkApplyOutcome::Failure { error } = &outcome {
                        bail!("pattern application failed: {error}");
                    }
                    print_json(&outcome)?;
                }
                0
            }
            PatternCommands::Analyze {
                template,
                start,
                days,
                seed,
            } => {
                let coverage = scheduler.analyze_pattern_coverage(&template, start, days, seed)?;
                print_json(&coverage)?;
                0
            }
        },
        Commands::Patterns => {
            print_json(&predefined_patterns())?;
            0
        }
        Commands::Audit {
            start,
            end,
            summary,
        } => {
            if summary {
                let analysis = scheduler.analyze_existing_schedule(start, end)?;
                print_json(&analysis)?;
                if analysis.optimization.constraint_violations.is_empty() {
                    0
                } else {
                    2
                }
            } else {
                let violations = scheduler.audit_constraints(start, end)?;
                print_json(&violations)?;
                if violations.is_empty() {
                    eprintln!("OK: no violations");
                    0
                } else {
                    eprintln!("Found {} violation(s)", violations.len());
                    2
                }
            }
        }
        Commands::Swap { cmd } => {
            let shift = match cmd {
                SwapCommands::Request {
                    date,
                    shift_id,
                    with,
                } => scheduler.request_swap(date, &ShiftId::new(shift_id), &EmployeeId::new(with))?,
                SwapCommands::Approve { date, shift_id } => {
                    scheduler.approve_swap(date, &ShiftId::new(shift_id))?
                }
                SwapCommands::Deny { date, shift_id } => {
                    scheduler.deny_swap(date, &ShiftId::new(shift_id))?
                }
            };
            print_json(&shift)?;
            0
        }
        Commands::Cover { date, shift_id, by } => {
            let shift = scheduler.cover_shift(date, &ShiftId::new(shift_id), &EmployeeId::new(by))?;
            print_json(&shift)?;
            0
        }
        Commands::Sick { date, shift_id } => {
            let shift = scheduler.mark_sick(date, &ShiftId::new(shift_id))?;
            print_json(&shift)?;
            0
        }
        Commands::Delete { date, shift_id } => {
            scheduler.delete_shift(date, &ShiftId::new(&shift_id))?;
            println!("deleted {shift_id}");
            0
        }
    };

    std::process::exit(code);
}
