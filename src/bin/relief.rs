use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "relief", version)]
struct Cli {
    /// Log debug events (VM calls, renderer steps) to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a compiled script and render its maps.
    Run(RunArgs),
    /// Run a compiled script and print the recorded rendering sequence with its metadata.
    Sequence(ScriptArgs),
    /// Print the parameters a compiled script declares.
    Params(ParamsArgs),
}

#[derive(Parser, Debug)]
struct ParamsArgs {
    /// Input compiled script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ScriptArgs {
    /// Input compiled script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Script parameter override, `name=value`. May be repeated.
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Map width; 0 uses the script default.
    #[arg(long)]
    width: Option<u32>,

    /// Map height; 0 uses the script default.
    #[arg(long)]
    height: Option<u32>,

    /// Render scale in [0.1, 10].
    #[arg(long)]
    scale: Option<f64>,

    /// Global random seed.
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Only render these maps. May be repeated; renders every yielded map when omitted.
    #[arg(long = "map")]
    maps: Vec<String>,

    /// Runtime configuration JSON (VM and renderer limits).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    script: ScriptArgs,

    /// Renderer memory limit in bytes; overrides the configuration file.
    #[arg(long)]
    memory_limit: Option<u64>,

    /// Directory to write one `<map>.json` per rendered map into.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the renderer state after rendering.
    #[arg(long)]
    dump: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Sequence(args) => cmd_sequence(args),
        Command::Params(args) => cmd_params(args),
    }
}

fn read_script(path: &Path) -> anyhow::Result<relief::CompiledScript> {
    relief::CompiledScript::from_path(path)
        .with_context(|| format!("load compiled script '{}'", path.display()))
}

fn read_config(path: Option<&Path>) -> anyhow::Result<relief::RuntimeConfig> {
    match path {
        Some(path) => relief::RuntimeConfig::from_path(path)
            .with_context(|| format!("load configuration '{}'", path.display())),
        None => Ok(relief::RuntimeConfig::default()),
    }
}

fn build_parameters(
    script: &relief::CompiledScript,
    args: &ScriptArgs,
) -> anyhow::Result<relief::ScriptParameters> {
    let mut parameters = script
        .create_script_parameters()
        .context("script parameter declarations")?;
    if let Some(width) = args.width {
        parameters.map_width.set(width);
    }
    if let Some(height) = args.height {
        parameters.map_height.set(height);
    }
    if let Some(scale) = args.scale {
        parameters.render_scale = scale;
    }
    parameters.random_seed = args.seed;
    parameters.enabled_maps = args.maps.clone();
    for param in &args.params {
        let (name, value) = param
            .split_once('=')
            .with_context(|| format!("parameter override '{param}' is not NAME=VALUE"))?;
        parameters.set_from_str(name.trim(), value.trim());
    }
    Ok(parameters)
}

/// Runs the script to completion and returns its rendering sequence.
fn record(
    script: &relief::CompiledScript,
    args: &ScriptArgs,
    config: &relief::RuntimeConfig,
) -> anyhow::Result<relief::RenderingSequence> {
    let parameters = build_parameters(script, args)?;
    let mut vm = relief::VirtualMachine::new(script, parameters, config.vm)
        .context("create virtual machine")?;
    vm.run().context("run script")?;
    for message in vm.take_messages() {
        println!("{message}");
    }
    Ok(vm.take_rendering_sequence())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let script = read_script(&args.script.in_path)?;
    let mut config = read_config(args.script.config.as_deref())?;
    if let Some(limit) = args.memory_limit {
        config.renderer.memory_limit = limit;
    }
    let sequence = record(&script, &args.script, &config)?;

    let mut renderer = relief::Renderer::new(&sequence, config.renderer);
    renderer.run().context("render")?;
    if args.dump {
        eprintln!("{}", renderer.dump());
    }

    let maps = renderer.take_rendered_maps();
    for (name, map) in maps.iter() {
        let rect = map.rectangle();
        eprintln!(
            "{name}: {}x{} at ({}, {}), fingerprint {:016x}",
            rect.size.width,
            rect.size.height,
            rect.position.x,
            rect.position.y,
            maps.fingerprint(name).unwrap_or_default()
        );
    }
    if let Some(out) = &args.out {
        std::fs::create_dir_all(out)
            .with_context(|| format!("create output directory '{}'", out.display()))?;
        for (name, map) in maps.iter() {
            write_map(&out.join(format!("{name}.json")), map)?;
        }
    }
    Ok(())
}

/// Logical placement plus the row-major samples, `raster_width` per row.
#[derive(serde::Serialize)]
struct MapFile<'a> {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    scale: f64,
    raster_width: u32,
    raster_height: u32,
    heights: &'a [i16],
}

fn write_map(path: &Path, map: &relief::HeightMap) -> anyhow::Result<()> {
    let rect = map.rectangle();
    let file = MapFile {
        x: rect.position.x,
        y: rect.position.y,
        width: rect.size.width,
        height: rect.size.height,
        scale: map.scale(),
        raster_width: map.width(),
        raster_height: map.height(),
        heights: map.heights(),
    };
    let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    serde_json::to_writer(BufWriter::new(f), &file)
        .with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

fn cmd_sequence(args: ScriptArgs) -> anyhow::Result<()> {
    let script = read_script(&args.in_path)?;
    let config = read_config(args.config.as_deref())?;
    let sequence = record(&script, &args, &config)?;

    let mut renderer = relief::Renderer::new(&sequence, config.renderer);
    renderer.calculate_metadata();
    print!("{}", sequence.dump());
    if let Some(metadata) = renderer.metadata() {
        println!("peak memory: {} B", metadata.peak_memory());
        print!("{}", metadata.dump());
    }
    Ok(())
}

fn cmd_params(args: ParamsArgs) -> anyhow::Result<()> {
    let script = read_script(&args.in_path)?;
    let parameters = script
        .create_script_parameters()
        .context("script parameter declarations")?;
    print!("{}", parameters.dump());
    Ok(())
}
