//! imgproc-nodes CLI
//!
//! Lists and describes the registered node types, and runs a small edge
//! detection chain on an image file.

use anyhow::{anyhow, bail, Context, Result};
use imgproc_nodes::prelude::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("imgproc-nodes");

    if args.len() < 2 {
        print_usage(program);
        return;
    }

    let result = match args[1].as_str() {
        "list" => {
            list_nodes();
            Ok(())
        }
        "info" => match args.get(2) {
            Some(id) => node_info(id),
            None => Err(anyhow!("Please specify a node ID")),
        },
        "schema" => match args.get(2) {
            Some(id) => node_schema(id),
            None => Err(anyhow!("Please specify a node ID")),
        },
        "run" => run_pipeline(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("🎨 imgproc-nodes v{}", imgproc_nodes::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                 List all registered node types");
    println!("  info <node>          Show parameters and ports of a node type");
    println!("  schema <node>        Print the JSON schema of a node type");
    println!("  run <in> <out> [options]");
    println!("                       Gray -> Sobel -> abs_normalized, saved as 8-bit");
    println!("  help                 Show this help message");
    println!();
    println!("Run options:");
    println!("  --param <node>.<name>=<value>");
    println!("                       Override a parameter, e.g. --param sobel.ksize=5");
}

fn list_nodes() {
    let registry = NodeRegistry::global().read();
    let grouped = registry.grouped_by_category();

    println!("Available nodes ({} total):", registry.len());
    println!();

    for (category, nodes) in grouped {
        println!("  📁 {}", category.display_name());
        for metadata in nodes {
            println!("      • {} - {}", metadata.id, metadata.description);
        }
        println!();
    }
}

fn print_ports(title: &str, ports: &PortSet) {
    if ports.is_empty() {
        return;
    }
    println!("{}:", title);
    for port in ports.definitions() {
        match &port.default_value {
            Some(default) => println!("  • {} [{}] = {}", port.name, port.port_type, default),
            None => println!("  • {} [{}]", port.name, port.port_type),
        }
        for line in port.description.lines() {
            println!("    {}", line);
        }
    }
    println!();
}

fn node_info(id: &str) -> Result<()> {
    let registry = NodeRegistry::global().read();
    let descriptor = registry
        .descriptor(id)
        .ok_or_else(|| anyhow!("Node not found: {} (use 'list' to see available nodes)", id))?;
    let metadata = &descriptor.metadata;

    println!("Node: {}", metadata.name);
    println!("ID: {}", metadata.id);
    println!("Category: {}", metadata.category.display_name());
    println!("Version: {}", metadata.version);
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    println!();

    print_ports("Parameters", &descriptor.parameters);
    print_ports("Inputs", &descriptor.inputs);
    print_ports("Outputs", &descriptor.outputs);
    Ok(())
}

fn node_schema(id: &str) -> Result<()> {
    let registry = NodeRegistry::global().read();
    let descriptor = registry
        .descriptor(id)
        .ok_or_else(|| anyhow!("Node not found: {}", id))?;
    println!("{}", descriptor.schema_json()?);
    Ok(())
}

/// A `--param node.name=value` override.
struct Override {
    node: String,
    name: String,
    value: Value,
}

fn parse_overrides(args: &[String]) -> Result<Vec<Override>> {
    let mut overrides = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--param" => {
                let assignment = iter.next().context("--param needs <node>.<name>=<value>")?;
                let (key, value) = assignment
                    .split_once('=')
                    .with_context(|| format!("missing '=' in '{}'", assignment))?;
                let (node, name) = key
                    .split_once('.')
                    .with_context(|| format!("missing '.' in '{}'", key))?;
                overrides.push(Override {
                    node: node.to_string(),
                    name: name.to_string(),
                    value: Value::parse_literal(value),
                });
            }
            other => bail!("Unknown option: {}", other),
        }
    }
    Ok(overrides)
}

fn run_pipeline(args: &[String]) -> Result<()> {
    let (input_path, output_path) = match args {
        [input, output, ..] => (input, output),
        _ => bail!("Please specify input and output paths"),
    };
    let overrides = parse_overrides(&args[2..])?;

    let image = image::open(input_path).with_context(|| format!("failed to open {}", input_path))?;
    let mut current = Mat::from_dynamic(&image)?;

    let mut stages = Vec::new();
    if current.channels() != 1 {
        stages.push(
            ChainStage::new("cvt_color")
                .with_parameter("flag", Value::Integer(ColorConversion::RGB2GRAY)),
        );
    }
    stages.push(ChainStage::new("sobel").with_parameter("x", Value::Integer(1)));
    stages.push(ChainStage::new("abs_normalized"));

    for o in overrides {
        let stage = stages
            .iter_mut()
            .find(|s| s.node == o.node)
            .with_context(|| format!("'{}' is not part of the pipeline", o.node))?;
        stage.parameters.push((o.name, o.value));
    }

    println!("⚙️  Processing {} -> {}", input_path, output_path);
    for stage in &stages {
        println!("   • {}", stage.node);
    }
    current = run_chain(&NodeRegistry::global().read(), &stages, current)?;
    println!("   = {}", current);

    // abs_normalized yields [0, 2]
    let out = current.convert_to(Depth::U8, 127.5, 0.0);
    out.to_dynamic()?
        .save(output_path)
        .with_context(|| format!("failed to save {}", output_path))?;
    println!("✅ Image saved to: {}", output_path);
    Ok(())
}
