mod config;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edm_model::EdmModel;
use edm_openapi::{Conversion, Converter, build_openapi, document::to_json};

use crate::config::{AppConfig, CliOverrides};

/// Converts an `OData` service model into an `OpenAPI` description
#[derive(Parser)]
#[command(name = "edm-openapi")]
#[command(about = "Converts an OData service model into an OpenAPI description")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum navigation depth (overrides config)
    #[arg(long)]
    max_depth: Option<i32>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the API description of a model as JSON
    Convert {
        /// JSON model document
        model: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List generated paths with their HTTP methods
    Paths {
        /// JSON model document
        model: PathBuf,
    },
    /// Validate the model and configuration and exit
    Check {
        /// JSON model document
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) defaults -> 2) YAML (if provided) -> 3) env (EDM_OPENAPI__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        max_depth: cli.max_depth,
    });

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    logging::init(&config.logging, cli.verbose)?;

    let Some(command) = cli.command else {
        anyhow::bail!("no command given, see --help");
    };
    match command {
        Commands::Convert { model, output } => run_convert(&config, &model, output.as_deref()),
        Commands::Paths { model } => run_paths(&config, &model),
        Commands::Check { model } => run_check(&config, &model),
    }
}

fn load_model(path: &Path) -> Result<EdmModel> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read model document {}", path.display()))?;
    let model = EdmModel::from_json_str(&json)
        .with_context(|| format!("invalid model document {}", path.display()))?;
    tracing::debug!(model = %model.id(), path = %path.display(), "model loaded");
    Ok(model)
}

fn convert(config: &AppConfig, model: &EdmModel) -> Result<Conversion> {
    let conversion = Converter::new(config.convert.clone()).convert(model)?;
    for issue in &conversion.issues {
        tracing::warn!(
            term = %issue.term,
            element = %issue.element,
            field = %issue.field,
            expected = issue.expected,
            found = issue.found,
            "annotation field ignored"
        );
    }
    Ok(conversion)
}

fn run_convert(config: &AppConfig, model_path: &Path, output: Option<&Path>) -> Result<()> {
    let model = load_model(model_path)?;
    let conversion = convert(config, &model)?;
    let json = to_json(&build_openapi(&model, &conversion, &config.document))?;
    if let Some(path) = output {
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "OpenAPI document written");
    } else {
        println!("{json}");
    }
    Ok(())
}

fn run_paths(config: &AppConfig, model_path: &Path) -> Result<()> {
    let model = load_model(model_path)?;
    let conversion = convert(config, &model)?;
    print!("{}", render_paths(&conversion));
    Ok(())
}

fn run_check(config: &AppConfig, model_path: &Path) -> Result<()> {
    config.convert.validate()?;
    let model = load_model(model_path)?;
    tracing::info!(model = %model.id(), "model and configuration are valid");
    println!("Configuration is valid");
    Ok(())
}

/// One line per path: template followed by its methods.
fn render_paths(conversion: &Conversion) -> String {
    conversion
        .by_path()
        .map(|(path, operations)| {
            let methods: Vec<&str> = operations.iter().map(|op| op.method.as_str()).collect();
            let methods = if methods.is_empty() {
                "-".to_owned()
            } else {
                methods.join(",")
            };
            format!("{} {methods}\n", path.template())
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use edm_model::{ContainerDef, EdmModelBuilder, EntityTypeDef};

    #[test]
    fn test_render_paths() {
        let model = EdmModelBuilder::new("NS")
            .entity_type(EntityTypeDef::new("Book").key(["Id"]).property("Id", "Edm.Int32"))
            .container(ContainerDef::new("Default").entity_set("Books", "Book"))
            .build()
            .unwrap();
        let conversion = convert(&AppConfig::default(), &model).unwrap();
        assert_eq!(
            render_paths(&conversion),
            "/Books GET,POST\n/Books/{Id} GET,PATCH,DELETE\n/Books/$count GET\n"
        );
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from([
            "edm-openapi",
            "--max-depth",
            "2",
            "convert",
            "m.json",
            "-o",
            "out.json",
        ]);
        assert_eq!(cli.max_depth, Some(2));
        let Some(Commands::Convert { model, output }) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(model, PathBuf::from("m.json"));
        assert_eq!(output, Some(PathBuf::from("out.json")));
    }
}
