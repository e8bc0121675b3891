// src/commands.rs
//! Command handlers for the quarry CLI

use anyhow::{Context, Result};
use quarry::config::ResolverConfig;
use quarry::env::StandardEnvironment;
use quarry::resolver::{Decision, ExecuteJob, Resolved, Resolver};
use quarry::spec::PackageSpec;
use quarry::{db, QualifiedName};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Open (or create) the installed-package database
pub fn open_db(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory for {}", db_path))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database at {}", db_path))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    Ok(conn)
}

/// Initialize the database schema
pub fn cmd_init(db_path: &str) -> Result<()> {
    let conn = open_db(db_path)?;
    db::migrate(&conn)?;
    info!("Initialized quarry database at {}", db_path);
    println!("Initialized database at {}", db_path);
    Ok(())
}

/// Load configuration from an optional path
fn load_config(config_path: Option<&str>) -> Result<ResolverConfig> {
    match config_path {
        Some(path) => {
            ResolverConfig::load(Path::new(path)).with_context(|| format!("loading {}", path))
        }
        None => Ok(ResolverConfig::default()),
    }
}

/// Run the resolver over a set of target specs
fn run_resolver(
    db_path: &str,
    config: &ResolverConfig,
    targets: Vec<PackageSpec>,
) -> Result<Resolved> {
    let conn = open_db(db_path)?;
    db::migrate(&conn)?;
    let env = StandardEnvironment::from_db(&conn)?;

    let helpers = config.build_helpers()?;
    let mut resolver = Resolver::new(&env, helpers);
    resolver.set_permissions(config.permissions());
    resolver.set_restart_cap(config.resolution.restart_cap);
    resolver.set_use_existing_for_targets(config.resolution.use_existing_for_targets);
    resolver.set_use_existing_for_dependencies(config.resolution.use_existing_for_dependencies);

    for target in targets {
        resolver.add_target(target);
    }

    let resolved = resolver.resolve()?;
    if !resolver.restarts().is_empty() {
        info!("Resolution needed {} restarts", resolver.restarts().len());
    }
    Ok(resolved)
}

/// Resolve install/upgrade targets
pub fn cmd_resolve(
    targets: &[String],
    db_path: &str,
    config_path: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let specs = targets
        .iter()
        .map(|t| PackageSpec::parse(t).map_err(Into::into))
        .collect::<Result<Vec<_>>>()?;

    let resolved = run_resolver(db_path, &config, specs)?;
    print_resolved(&resolved);

    if let Some(output) = output {
        resolved.save(Path::new(output))?;
        println!("\nPlan written to {}", output);
    }
    Ok(())
}

/// Resolve removal of installed packages
pub fn cmd_remove(
    packages: &[String],
    db_path: &str,
    config_path: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let specs = packages
        .iter()
        .map(|p| {
            let name: QualifiedName = p.parse()?;
            let mut spec = PackageSpec::name_only(name);
            spec.block = true;
            Ok(spec)
        })
        .collect::<Result<Vec<_>>>()?;

    let resolved = run_resolver(db_path, &config, specs)?;
    print_resolved(&resolved);

    if let Some(output) = output {
        resolved.save(Path::new(output))?;
        println!("\nPlan written to {}", output);
    }
    Ok(())
}

/// Display a previously persisted plan
pub fn cmd_show_plan(plan_path: &str) -> Result<()> {
    let resolved = Resolved::load(Path::new(plan_path))
        .with_context(|| format!("loading plan from {}", plan_path))?;
    print_resolved(&resolved);
    Ok(())
}

/// Print a resolved plan the way users read it
fn print_resolved(resolved: &Resolved) {
    if !resolved.taken_change_or_remove_decisions.is_empty() {
        println!("These changes will be made:");
        for (resolvent, decision) in &resolved.taken_change_or_remove_decisions {
            println!("  {} -> {}", resolvent, decision);
        }
    }

    if !resolved.taken_unconfirmed_change_or_remove_decisions.is_empty() {
        println!("\nThese changes need confirmation:");
        for (resolvent, decision) in &resolved.taken_unconfirmed_change_or_remove_decisions {
            print!("  {} -> {}", resolvent, decision);
            let confirmations: Vec<String> = decision
                .confirmations()
                .iter()
                .map(|c| c.to_string())
                .collect();
            println!("  [needs: {}]", confirmations.join(", "));
        }
    }

    if !resolved.untaken_change_or_remove_decisions.is_empty() {
        println!("\nNot taking these optional changes:");
        for (resolvent, decision) in &resolved.untaken_change_or_remove_decisions {
            println!("  {} -> {}", resolvent, decision);
        }
    }

    let unable_count = resolved.taken_unable_to_make_decisions.len();
    if unable_count > 0 {
        println!("\nNo decision could be made for:");
        for (resolvent, decision) in &resolved.taken_unable_to_make_decisions {
            println!("  {}", resolvent);
            if let Decision::UnableToMake { unsuitable, .. } = decision {
                for candidate in unsuitable {
                    println!(
                        "    tried {}: {}",
                        candidate.id,
                        candidate.unmet_constraints.join("; ")
                    );
                }
            }
        }
    }

    let execute = &resolved.job_lists.execute_job_list;
    if !execute.is_empty() {
        println!("\nExecution plan ({} jobs):", execute.len());
        for (n, job) in execute.iter().enumerate() {
            match job {
                ExecuteJob::Fetch { origin_id, .. } => {
                    println!("  #{} fetch {}", n, origin_id);
                }
                ExecuteJob::Install {
                    origin_id,
                    destination,
                    requirements,
                    ..
                } => {
                    println!(
                        "  #{} install {} to {} (after {} requirement{})",
                        n,
                        origin_id,
                        destination,
                        requirements.len(),
                        if requirements.len() == 1 { "" } else { "s" }
                    );
                }
                ExecuteJob::Uninstall { ids, .. } => {
                    for id in ids {
                        println!("  #{} uninstall {}", n, id);
                    }
                }
            }
        }
    } else if resolved.taken_change_or_remove_decisions.is_empty() && unable_count == 0 {
        println!("Nothing to do.");
    }
}
