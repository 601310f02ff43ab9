//! Symbology CLI - JSON bridge to the symbol code engine
//!
//! Commands: decode, encode, values, flags, compose, descriptors, create
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 0 ok, 2 validation failure, 1 usage or I/O failure

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use symbology_core::{
    catalog::GraphicCatalog,
    codec::{encode, inspect, SymbolCode},
    registry::{all_values, compose, decompose, legal_values, ClassificationAxis, Scheme, UnitEquipmentFlags},
    GraphicParams, MilStd2525GraphicFactory, Position, TacticalGraphicFactory,
};

#[derive(Parser)]
#[command(name = "symbology-cli")]
#[command(about = "Symbology CLI - MIL-STD-2525C symbol codes and tactical graphics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory of extra graphic catalog files
    #[arg(short, long, default_value = "catalog")]
    catalog_dir: PathBuf,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a 15-character symbol code
    Decode {
        code: String,
    },

    /// Encode a field map into a symbol code
    Encode {
        /// JSON object of axis -> token
        #[arg(short, long)]
        payload: String,
    },

    /// List legal tokens for an axis
    Values {
        #[arg(short, long)]
        axis: ClassificationAxis,

        /// Restrict to one scheme (token or name)
        #[arg(short, long)]
        scheme: Option<Scheme>,
    },

    /// Flags encoded by a unit/equipment token
    Flags {
        token: String,
    },

    /// Unit/equipment token for a flag set
    Compose {
        #[arg(long)]
        feint_dummy: bool,

        #[arg(long)]
        headquarters: bool,

        #[arg(long)]
        task_force: bool,
    },

    /// List graphic descriptors
    Descriptors,

    /// Create a graphic and print its render state
    Create {
        #[arg(long)]
        code: String,

        /// JSON array of {latitude, longitude, altitude}
        #[arg(long)]
        positions: String,

        /// JSON object of modifier key -> value
        #[arg(long)]
        params: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Decode { code } => {
            let report = inspect(&code);
            print_json(&report);
            if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Encode { payload } => {
            let fields: SymbolCode = match serde_json::from_str(&payload) {
                Ok(f) => f,
                Err(e) => return fail(&format!("Invalid payload: {}", e)),
            };

            match encode(&fields) {
                Ok(code) => {
                    print_json(&serde_json::json!({ "valid": true, "code": code }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&serde_json::json!({ "valid": false, "error": e.to_string() }));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Values { axis, scheme } => {
            let output = match scheme {
                Some(scheme) => {
                    let domain = legal_values(axis, scheme);
                    serde_json::json!({
                        "axis": axis,
                        "scheme": scheme,
                        "open": domain.is_open(),
                        "values": domain.tokens(),
                    })
                }
                None => serde_json::json!({
                    "axis": axis,
                    "open": axis == ClassificationAxis::FunctionId,
                    "values": all_values(axis),
                }),
            };
            print_json(&output);
            ExitCode::SUCCESS
        }

        Commands::Flags { token } => match decompose(&token) {
            Some(flags) => {
                print_json(&serde_json::json!({ "token": token.to_ascii_uppercase(), "flags": flags }));
                ExitCode::SUCCESS
            }
            None => {
                print_json(&serde_json::json!({
                    "token": token,
                    "error": "Not a unit/equipment token",
                }));
                ExitCode::from(2)
            }
        },

        Commands::Compose { feint_dummy, headquarters, task_force } => {
            let flags = UnitEquipmentFlags::new(feint_dummy, headquarters, task_force);
            match compose(flags) {
                Ok(token) => {
                    print_json(&serde_json::json!({ "flags": flags, "token": token }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&serde_json::json!({ "flags": flags, "error": e.to_string() }));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Descriptors => {
            let catalog = match GraphicCatalog::load_from_dir(&cli.catalog_dir) {
                Ok(c) => c,
                Err(e) => return fail(&format!("Failed to load catalog: {}", e)),
            };
            let descriptors: Vec<_> = catalog
                .list()
                .iter()
                .map(|d| serde_json::json!({
                    "id": d.id,
                    "name": d.name,
                    "scheme": d.scheme,
                    "kind": d.kind,
                    "controlPoints": d.control_points.to_string(),
                }))
                .collect();
            print_json(&descriptors);
            ExitCode::SUCCESS
        }

        Commands::Create { code, positions, params } => {
            let catalog = match GraphicCatalog::load_from_dir(&cli.catalog_dir) {
                Ok(c) => c,
                Err(e) => return fail(&format!("Failed to load catalog: {}", e)),
            };
            let positions: Vec<Position> = match serde_json::from_str(&positions) {
                Ok(p) => p,
                Err(e) => return fail(&format!("Invalid positions: {}", e)),
            };
            let params: Option<GraphicParams> = match params.as_deref().map(serde_json::from_str).transpose() {
                Ok(p) => p,
                Err(e) => return fail(&format!("Invalid params: {}", e)),
            };

            let factory = MilStd2525GraphicFactory::new(catalog);
            match factory.create_graphic(&code, positions, params.as_ref()) {
                Ok(graphic) => {
                    print_json(&serde_json::json!({
                        "success": true,
                        "graphic": graphic.render_state(),
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!(r#"{{"error": "Failed to serialize output: {}"}}"#, e),
    }
}

fn fail(message: &str) -> ExitCode {
    print_json(&serde_json::json!({ "error": message }));
    ExitCode::FAILURE
}
