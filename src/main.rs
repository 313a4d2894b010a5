use anyhow::{Context, Result};
use clap::Parser;
use entity_finder::cli::{Cli, Commands, OutputFormat};
use entity_finder::config::resolve_entity_paths;
use entity_finder::driver::StaticSourceDriver;
use entity_finder::metadata::{AssociationKind, ClassMetadata};
use entity_finder::registry::TypeRegistry;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();
    let cli = parse_cli()?;

    let paths = resolve_entity_paths(&cli);
    let mut driver = StaticSourceDriver::new(paths, TypeRegistry::new().into_shared());

    match cli.command.clone() {
        Commands::List { format } => {
            let result = run_list(&mut driver)?;
            write_output(&render_list(&result, format)?, None)?;
        }
        Commands::Describe {
            class_name,
            format,
            output,
        } => {
            let class_name = normalize_class_name(&class_name);
            let result = run_describe(&mut driver, &class_name)?;
            write_output(&render_describe(&result, format)?, output.as_deref())?;
        }
        Commands::Check { class_name, format } => {
            let class_name = normalize_class_name(&class_name);
            let result = run_check(&mut driver, &class_name)?;
            write_output(&render_check(&result, format)?, None)?;
        }
        Commands::Stats => {
            let result = run_stats(&mut driver)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn parse_cli() -> Result<Cli> {
    let args: Vec<String> = std::env::args().collect();
    Ok(Cli::parse_from(rewrite_args_for_implicit_describe(args)))
}

fn rewrite_args_for_implicit_describe(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["list", "describe", "check", "stats", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "--path" {
            idx += 2;
            continue;
        }

        if a.starts_with("--path=") {
            idx += 1;
            continue;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "describe".to_string());
        }
    }

    args
}

fn normalize_class_name(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("import") {
        s = rest.trim();
    }
    if s.ends_with(';') {
        s = s.trim_end_matches(';').trim();
    }
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, Serialize)]
struct ListResult {
    scanned_paths: Vec<String>,
    class_count: usize,
    class_names: Vec<String>,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct DescribeResult {
    origin: String,
    duration_ms: u64,
    metadata: ClassMetadata,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    class_name: String,
    transient: bool,
    origin: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatsResult {
    paths: Vec<String>,
    loaded_files: usize,
    registered_types: usize,
    entity_classes: usize,
    transient_types: usize,
    duration_ms: u64,
}

fn run_list(driver: &mut StaticSourceDriver) -> Result<ListResult> {
    let start = Instant::now();
    let class_names = driver
        .get_all_class_names()
        .context("Failed to discover entity classes")?;

    Ok(ListResult {
        scanned_paths: display_paths(driver.paths()),
        class_count: class_names.len(),
        class_names,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn run_describe(driver: &mut StaticSourceDriver, class_name: &str) -> Result<DescribeResult> {
    let start = Instant::now();
    driver
        .get_all_class_names()
        .context("Failed to discover entity classes")?;

    let mut metadata = ClassMetadata::new(class_name);
    driver
        .load_metadata_for_class(class_name, &mut metadata)
        .with_context(|| format!("Failed to load metadata for {class_name}"))?;
    let origin = driver
        .origin_of(class_name)
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    Ok(DescribeResult {
        origin,
        duration_ms: start.elapsed().as_millis() as u64,
        metadata,
    })
}

fn run_check(driver: &mut StaticSourceDriver, class_name: &str) -> Result<CheckResult> {
    driver
        .get_all_class_names()
        .context("Failed to discover entity classes")?;

    Ok(CheckResult {
        class_name: class_name.to_string(),
        transient: driver.is_transient(class_name),
        origin: driver
            .origin_of(class_name)
            .map(|p| p.display().to_string()),
    })
}

fn run_stats(driver: &mut StaticSourceDriver) -> Result<StatsResult> {
    let start = Instant::now();
    let entity_classes = driver
        .get_all_class_names()
        .context("Failed to discover entity classes")?
        .len();

    let shared = driver.registry();
    let registry = shared.lock();
    let described = registry
        .all_types()
        .filter(|record| record.descriptor.is_some())
        .count();

    Ok(StatsResult {
        paths: display_paths(driver.paths()),
        loaded_files: registry.loaded_file_count(),
        registered_types: registry.type_count(),
        entity_classes,
        transient_types: registry.type_count() - described,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn display_paths(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

fn render_list(result: &ListResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("class_count: {}\n", result.class_count));
            out.push_str(&format!("duration_ms: {}\n", result.duration_ms));
            for name in &result.class_names {
                out.push_str(&format!("- {name}\n"));
            }
            out
        }
    })
}

fn render_describe(result: &DescribeResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Text => {
            let m = &result.metadata;
            let mut out = String::new();
            out.push_str(&format!("class_name: {}\n", m.class_name));
            out.push_str(&format!("table_name: {}\n", m.table_name));
            out.push_str(&format!("origin: {}\n", result.origin));
            for field in &m.fields {
                out.push_str(&format!(
                    "- field: {} ({}), column: {}{}\n",
                    field.name,
                    field.sql_type,
                    field.column,
                    if field.id { ", id" } else { "" }
                ));
            }
            for assoc in &m.associations {
                let kind = match assoc.kind {
                    AssociationKind::ManyToOne => "many-to-one",
                    AssociationKind::OneToMany => "one-to-many",
                };
                out.push_str(&format!(
                    "- association: {} {kind} {}\n",
                    assoc.field, assoc.target_class
                ));
            }
            out
        }
    })
}

fn render_check(result: &CheckResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("class_name: {}\n", result.class_name));
            out.push_str(&format!("transient: {}\n", result.transient));
            if let Some(origin) = &result.origin {
                out.push_str(&format!("origin: {origin}\n"));
            }
            out
        }
    })
}

fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
