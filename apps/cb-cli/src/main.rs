mod error;
mod schedule;

use cb_engine::{
    Action, CodeBlueSnapshot, SimEngine, SimStore, TitrationAction, TitrationEngine,
    TitrationSnapshot,
};
use cb_scenario::{ActionKind, DiagnosisCatalog, TitrationConfig, load_catalog, load_titration};
use clap::{Parser, Subcommand};
use error::{CliError, CliResult};
use schedule::{Scheduled, due};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cb-cli")]
#[command(about = "Code Blue CLI - deterministic patient simulation driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List diagnoses in the catalog
    Diagnoses {
        /// Alternative catalog (YAML or JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a scripted code-blue run
    Run {
        /// Diagnosis ID (unknown IDs fall back to the first entry)
        #[arg(long, default_value = "dx_legionella")]
        diagnosis: String,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 180.0)]
        seconds: f64,
        /// Tick size in milliseconds
        #[arg(long, default_value_t = 100.0)]
        dt_ms: f64,
        /// Scheduled action, e.g. `12.5:DEFIB_SHOCK` (repeatable)
        #[arg(long = "action", value_parser = parse_code_blue_action)]
        actions: Vec<Scheduled<ActionKind>>,
        /// Alternative catalog (YAML or JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pick a diagnosis from a seed
    Randomize {
        #[arg(long)]
        seed: u64,
        /// Alternative catalog (YAML or JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Run a ventilator/FiO2 titration scenario
    Titrate {
        /// Built-in scenario ID (`resp_failure` or `shock`)
        #[arg(long, default_value = "resp_failure")]
        scenario: String,
        /// Scenario config file instead of a built-in
        #[arg(long)]
        config: Option<PathBuf>,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 120.0)]
        seconds: f64,
        /// Tick size in milliseconds
        #[arg(long, default_value_t = 100.0)]
        dt_ms: f64,
        /// Scheduled action, e.g. `30:VENT_OFF`, `45:FIO2=0.6` (repeatable)
        #[arg(long = "action", value_parser = parse_titration_action)]
        actions: Vec<Scheduled<TitrationAction>>,
        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a diagnosis catalog or titration config file
    Validate {
        /// Path to the YAML or JSON file
        path: PathBuf,
        /// Treat the file as a titration config
        #[arg(long)]
        titration: bool,
    },
}

fn parse_code_blue_action(s: &str) -> Result<Scheduled<ActionKind>, String> {
    s.parse().map_err(|e: CliError| e.to_string())
}

fn parse_titration_action(s: &str) -> Result<Scheduled<TitrationAction>, String> {
    s.parse().map_err(|e: CliError| e.to_string())
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Diagnoses { catalog, json } => cmd_diagnoses(catalog.as_deref(), json),
        Commands::Run {
            diagnosis,
            seconds,
            dt_ms,
            actions,
            catalog,
            json,
        } => cmd_run(&diagnosis, seconds, dt_ms, actions, catalog.as_deref(), json),
        Commands::Randomize { seed, catalog } => cmd_randomize(seed, catalog.as_deref()),
        Commands::Titrate {
            scenario,
            config,
            seconds,
            dt_ms,
            actions,
            json,
        } => cmd_titrate(&scenario, config.as_deref(), seconds, dt_ms, actions, json),
        Commands::Validate { path, titration } => cmd_validate(&path, titration),
    }
}

fn open_catalog(path: Option<&Path>) -> CliResult<Arc<DiagnosisCatalog>> {
    let catalog = match path {
        Some(path) => load_catalog(path)?,
        None => DiagnosisCatalog::builtin(),
    };
    Ok(Arc::new(catalog))
}

fn check_timing(seconds: f64, dt_ms: f64) -> CliResult<usize> {
    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        return Err(CliError::InvalidInput("dt-ms must be positive".to_string()));
    }
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(CliError::InvalidInput(
            "seconds must be non-negative".to_string(),
        ));
    }
    Ok((seconds * 1000.0 / dt_ms).ceil() as usize)
}

fn cmd_diagnoses(catalog: Option<&Path>, json: bool) -> CliResult<()> {
    let catalog = open_catalog(catalog)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.to_file())?);
        return Ok(());
    }
    println!("Diagnoses:");
    for dx in catalog.iter() {
        println!("  {} - {}", dx.id, dx.name);
        if !dx.short_blurb.is_empty() {
            println!("      {}", dx.short_blurb);
        }
    }
    Ok(())
}

fn cmd_run(
    diagnosis: &str,
    seconds: f64,
    dt_ms: f64,
    mut schedule: Vec<Scheduled<ActionKind>>,
    catalog: Option<&Path>,
    json: bool,
) -> CliResult<()> {
    let steps = check_timing(seconds, dt_ms)?;
    let catalog = open_catalog(catalog)?;
    if catalog.find(diagnosis).is_none() {
        tracing::warn!(diagnosis, "unknown diagnosis, using catalog default");
    }
    let mut store = SimStore::new(SimEngine::new(catalog, diagnosis));
    schedule.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));

    if !json {
        let dx = store.engine().diagnosis();
        println!("Running {} ({}) for {:.0} s", dx.name, dx.id, seconds);
    }

    let mut phase = store.snapshot().state.phase;
    for _ in 0..steps {
        let now = store.snapshot().state.time_ms;
        for kind in due(&mut schedule, now) {
            if !json {
                println!("  t={:>6.1}s  action {}", now / 1000.0, kind);
            }
            store.dispatch(Action::new(kind));
        }
        store.tick(dt_ms);
        let state = &store.snapshot().state;
        if state.phase != phase {
            phase = state.phase;
            if !json {
                println!("  t={:>6.1}s  phase -> {}", state.time_ms / 1000.0, phase);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(store.snapshot())?);
    } else {
        print_code_blue_summary(store.snapshot());
    }
    Ok(())
}

fn print_code_blue_summary(snap: &CodeBlueSnapshot) {
    let v = &snap.vitals;
    let s = &snap.state;
    println!("✓ Finished at t={:.1}s in phase {}", s.time_ms / 1000.0, s.phase);
    println!(
        "  HR {:.0}  RR {:.0}  SpO2 {:.1}%  BP {:.0}/{:.0} (MAP {:.0})  EtCO2 {:.0}  Rhythm {}",
        v.hr, v.rr, v.spo2, v.sbp, v.dbp, v.map, v.etco2, v.rhythm
    );
    println!(
        "  Vent {}  FiO2 {:.0}%  PEEP {:.0}",
        if v.vent_on { "ON" } else { "OFF" },
        v.fio2 * 100.0,
        v.peep
    );
    println!("  Score: {}", s.score);
    if s.losses.any() {
        println!("  Losses: {:?}", s.losses);
    }
    if !s.alerts.is_empty() {
        println!("  Recent alerts:");
        for alert in &s.alerts {
            println!("    {alert}");
        }
    }
    if !s.notes.is_empty() {
        println!("  Recent notes:");
        for note in &s.notes {
            println!("    {note}");
        }
    }
}

fn cmd_randomize(seed: u64, catalog: Option<&Path>) -> CliResult<()> {
    let catalog = open_catalog(catalog)?;
    let first = catalog.default_diagnosis().id.clone();
    let mut store = SimStore::new(SimEngine::new(catalog, &first));
    let id = store.randomize(seed);
    let dx = store.engine().diagnosis();
    println!("{} - {}", id, dx.name);
    Ok(())
}

fn cmd_titrate(
    scenario: &str,
    config: Option<&Path>,
    seconds: f64,
    dt_ms: f64,
    mut schedule: Vec<Scheduled<TitrationAction>>,
    json: bool,
) -> CliResult<()> {
    let steps = check_timing(seconds, dt_ms)?;
    let config = match config {
        Some(path) => load_titration(path)?,
        None => TitrationConfig::builtin(scenario),
    };
    let mut store = SimStore::new(TitrationEngine::new(config));
    schedule.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));

    if !json {
        let config = store.engine().config();
        println!("Running {} ({}) for {:.0} s", config.name, config.id, seconds);
    }

    let mut elapsed_ms = 0.0;
    for _ in 0..steps {
        for action in due(&mut schedule, elapsed_ms) {
            store.dispatch(action);
        }
        store.tick(dt_ms);
        elapsed_ms += dt_ms;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(store.snapshot())?);
    } else {
        print_titration_summary(store.snapshot());
    }
    Ok(())
}

fn print_titration_summary(snap: &TitrationSnapshot) {
    let v = &snap.vitals;
    let bp = &snap.blood_pressure;
    println!("✓ Finished {} at t={:.1}s", snap.scenario_id, snap.t_sec);
    println!(
        "  HR {:.0}  RR {:.0}  SpO2 {:.1}%  BP {:.0}/{:.0} (MAP {:.0})",
        v.hr_bpm, v.resp_rpm, v.spo2_pct, bp.sbp, bp.dbp, v.map_mmhg
    );
    println!(
        "  Vent {}  FiO2 {:.2}  Norepi {:.0}%",
        if snap.vent_on { "ON" } else { "OFF" },
        snap.interventions.fio2,
        snap.interventions.pressor_dose * 100.0
    );
    println!(
        "  Trends: HR {:?}  SpO2 {:?}  RR {:?}  MAP {:?}",
        snap.trends.hr, snap.trends.spo2, snap.trends.rr, snap.trends.map
    );
    let silenced = if snap.alarms_silenced { " (silenced)" } else { "" };
    println!("  Alerts{silenced}:");
    for alert in &snap.alerts {
        println!("    [{:?}] {}", alert.severity, alert.label);
    }
    println!("  Objectives:");
    for objective in &snap.objectives {
        let mark = if objective.done { "✓" } else { " " };
        println!("    [{mark}] {}", objective.label);
    }
    if !snap.events.is_empty() {
        println!("  Events:");
        for event in &snap.events {
            println!("    t={:>6.1}s  {}", event.t_sec, event.label);
        }
    }
}

fn cmd_validate(path: &Path, titration: bool) -> CliResult<()> {
    println!("Validating: {}", path.display());
    if titration {
        let config = load_titration(path)?;
        println!("✓ Titration config '{}' is valid", config.id);
    } else {
        let catalog = load_catalog(path)?;
        println!("✓ Catalog is valid ({} diagnoses)", catalog.len());
    }
    Ok(())
}
