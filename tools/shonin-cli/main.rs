use clap::{Parser, Subcommand};
use shonin::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Validate, inspect and simulate declarative approval flows
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional engine configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Compare `==`/`!=` by JSON type instead of string form
    #[arg(long, global = true)]
    strict_equality: bool,

    /// Raise log verbosity (overridden by RUST_LOG)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a flow definition's structure
    Validate {
        /// Path to the flow definition JSON file
        flow_path: String,
    },
    /// Check that a literal status sequence is reachable in a flow
    Path {
        flow_path: String,
        /// Ordered statuses, e.g. `in_process approved`
        #[arg(required = true)]
        statuses: Vec<String>,
    },
    /// Evaluate a condition tree against a context
    Conditions {
        /// Path to the condition tree JSON file
        conditions_path: String,
        /// Path to the evaluation context JSON file
        context_path: String,
        /// Report every leaf condition
        #[arg(short, long)]
        details: bool,
    },
    /// Resolve (and optionally commit) an action against an approval
    Resolve {
        flow_path: String,
        /// Path to the approval instance JSON file
        approval_path: String,
        /// A stage id, status or label; omit for condition-driven routing
        action: Option<String>,
        /// Path to the evaluation context JSON file
        #[arg(long)]
        context: Option<String>,
        /// Commit the resolved transition as this actor and print the result
        #[arg(long)]
        commit_as: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine = build_engine(&cli);
    let start = Instant::now();
    match cli.command {
        Command::Validate { flow_path } => run_validate(&engine, &flow_path),
        Command::Path {
            flow_path,
            statuses,
        } => run_path(&engine, &flow_path, &statuses),
        Command::Conditions {
            conditions_path,
            context_path,
            details,
        } => run_conditions(&engine, &conditions_path, &context_path, details),
        Command::Resolve {
            flow_path,
            approval_path,
            action,
            context,
            commit_as,
            comment,
        } => run_resolve(
            &engine,
            &flow_path,
            &approval_path,
            action,
            context.as_deref(),
            commit_as.as_deref(),
            comment.as_deref(),
        ),
    }
    tracing::debug!(elapsed = ?start.elapsed(), "command finished");
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(cli: &Cli) -> FlowEngine {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json(&read_file(path, "engine config"))
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid engine config: {}", e))),
        None => EngineConfig::default(),
    };
    let mut builder = FlowEngine::builder().with_config(config);
    if cli.strict_equality {
        builder = builder.equality(EqualityMode::Strict);
    }
    builder.build()
}

fn run_validate(engine: &FlowEngine, flow_path: &str) {
    let definition = load_flow(flow_path);
    let report = engine.inspect_flow_definition(&definition);

    for warning in &report.warnings {
        println!("  -> Warning: {}", warning);
    }
    if report.is_valid() {
        println!(
            "Flow '{}' v{} is valid ({} stages).",
            definition.name,
            definition.version,
            definition.stages.len()
        );
    } else {
        println!("Flow '{}' is invalid:", definition.name);
        for issue in &report.issues {
            println!("  -> {}", issue);
        }
        std::process::exit(1);
    }
}

fn run_path(engine: &FlowEngine, flow_path: &str, statuses: &[String]) {
    let definition = load_flow(flow_path);
    let evaluation = engine.evaluate_flow_path(&definition, statuses);
    if evaluation.is_valid {
        println!("Path {} is valid.", statuses.join(" -> "));
    } else {
        println!("Path {} is invalid:", statuses.join(" -> "));
        for issue in &evaluation.issues {
            println!("  -> {}", issue);
        }
        std::process::exit(1);
    }
}

fn run_conditions(engine: &FlowEngine, conditions_path: &str, context_path: &str, details: bool) {
    let node = ConditionNode::from_json(&read_file(conditions_path, "conditions"))
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid condition tree: {}", e)));
    let context = load_context(context_path);

    if !details {
        let passed = engine.evaluate_conditions(&node, &context);
        println!("passed: {}", passed);
        return;
    }

    let report = engine.evaluate_conditions_with_details(&node, &context);
    println!("passed: {}", report.passed);
    println!("reason: {}", report.reason());
    println!("trace:  {}", TraceFormatter::format_report(&node, &report));
    for detail in &report.details {
        let marker = if detail.passed { "pass" } else { "FAIL" };
        println!("  [{}] {}", marker, TraceFormatter::format_detail(detail));
    }
}

fn run_resolve(
    engine: &FlowEngine,
    flow_path: &str,
    approval_path: &str,
    action: Option<String>,
    context_path: Option<&str>,
    commit_as: Option<&str>,
    comment: Option<&str>,
) {
    let definition = load_flow(flow_path);
    let approval: ApprovalInstance = serde_json::from_str(&read_file(approval_path, "approval"))
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid approval JSON: {}", e)));
    let context = context_path.map(load_context).unwrap_or_default();
    let action = action.map(Action::Named).unwrap_or(Action::Auto);

    let resolved = engine
        .resolve(&definition, &approval, &action, &context)
        .unwrap_or_else(|e| exit_with_error(&format!("Resolution failed: {}", e)));

    println!(
        "Resolved '{}' from stage '{}' -> status '{}' (stage {:?}, matched by {:?})",
        action,
        resolved.source_stage_id,
        resolved.status,
        resolved.next_stage_id,
        resolved.matched_by
    );

    if let Some(actor) = commit_as {
        let updated = engine
            .apply_transition(&approval, &resolved, actor, comment)
            .unwrap_or_else(|e| exit_with_error(&format!("Commit failed: {}", e)));
        let json = serde_json::to_string_pretty(&updated)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode approval: {}", e)));
        println!("{}", json);
    }
}

fn load_flow(path: &str) -> FlowDefinition {
    FlowDefinition::from_json(&read_file(path, "flow definition"))
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid flow definition: {}", e)))
}

fn load_context(path: &str) -> EvaluationContext {
    EvaluationContext::from_json(&read_file(path, "context"))
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid context: {}", e)))
}

fn read_file(path: &str, what: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read {} file '{}': {}", what, path, e))
    })
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
