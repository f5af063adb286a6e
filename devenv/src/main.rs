use clap::{Parser, Subcommand, ValueEnum};
use devenv::layout::Layout;
use devenv::logging::{bootstrap_subscriber, init_logging};
use devenv::orchestrator::{handoff, PlanRecorder};
use devenv::session::{Session, GIT_SHA};
use devenv::ManifestRenderer;
use envconf::EnvironmentSnapshot;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Parser)]
#[command(name = "devenv")]
#[command(about = "Declarative development environment for the octowalrus service")]
struct Cli {
    /// Layout file (defaults to ./devenv.toml when present)
    #[arg(long, global = true)]
    layout: Option<PathBuf>,
    /// Env file layered under the process environment (defaults to ./.env when present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every resolved key and where its value came from
    Resolve,
    /// Print the validated plan handed to the orchestrator
    Plan {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Print ConfigMap and Secret manifests
    Manifests,
    /// Validate settings and the plan without emitting anything
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    // the real subscriber depends on the resolved LOG_LEVEL
    let session = tracing::subscriber::with_default(
        bootstrap_subscriber(),
        || -> Result<Session, Box<dyn std::error::Error>> {
            let snapshot = load_snapshot(cli.env_file.as_deref(), &cwd)?;
            let layout = Layout::discover(cli.layout.as_deref(), &cwd)?;
            Ok(Session::new(snapshot, layout))
        },
    )?;
    init_logging(session.config());

    match cli.command {
        Commands::Resolve => show_resolved(&session),
        Commands::Plan { format } => print_plan(&session, format)?,
        Commands::Manifests => print_manifests(&session)?,
        Commands::Check => check(&session)?,
    }

    Ok(())
}

fn load_snapshot(
    env_file: Option<&Path>,
    cwd: &Path,
) -> Result<EnvironmentSnapshot, Box<dyn std::error::Error>> {
    let snapshot = EnvironmentSnapshot::capture();
    if let Some(path) = env_file {
        return Ok(snapshot.with_dotenv(path)?);
    }
    let default = cwd.join(DEFAULT_ENV_FILE);
    if default.is_file() {
        return Ok(snapshot.with_dotenv(&default)?);
    }
    Ok(snapshot)
}

fn show_resolved(session: &Session) {
    println!("{:<22} {:<46} SOURCE", "KEY", "VALUE");
    for (key, resolved) in session.config().iter() {
        println!(
            "{:<22} {:<46} {}",
            key,
            format!("{:?}", resolved.display_value()),
            resolved.source
        );
    }
    let sha_source = if session.snapshot().contains(GIT_SHA) {
        "environment"
    } else {
        "git"
    };
    println!(
        "{:<22} {:<46} {}",
        GIT_SHA,
        format!("{:?}", session.git_sha()),
        sha_source
    );
}

fn print_plan(session: &Session, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let plan = session.validated_plan()?;

    let mut recorder = PlanRecorder::new();
    handoff(&plan, &mut recorder)?;
    let handed_off = recorder
        .into_plan()
        .ok_or("orchestrator never received the chart invocation")?;

    let rendered = match format {
        Format::Json => handed_off.to_json()?,
        Format::Yaml => handed_off.to_yaml()?,
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end())?;
    Ok(())
}

fn print_manifests(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let plan = session.validated_plan()?;
    let mut renderer = ManifestRenderer::new(io::stdout().lock(), plan.chart.namespace.clone());
    handoff(&plan, &mut renderer)?;
    info!(documents = renderer.documents(), "rendered manifests");
    Ok(())
}

fn check(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let mut failures = 0usize;

    for key in session.config().empty_overrides() {
        println!(
            "! {} is set to an empty string, which overrides its default",
            key
        );
        warn!(key, "empty value overrides non-empty default");
    }

    match session.settings() {
        Ok(settings) => println!(
            "✓ Settings valid (environment: {}, log level: {})",
            settings.app_env, settings.log_level
        ),
        Err(e) => {
            println!("✗ Settings invalid: {}", e);
            error!("Settings invalid: {}", e);
            failures += 1;
        }
    }

    match session.validated_plan() {
        Ok(plan) => println!(
            "✓ Plan valid ({} declarations, values file {})",
            plan.declarations.len(),
            plan.chart.values_file.display()
        ),
        Err(e) => {
            println!("✗ Plan invalid:");
            for issue in &e.issues {
                println!("  - {}", issue);
            }
            error!("Plan invalid: {}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{} check(s) failed", failures).into());
    }
    Ok(())
}
