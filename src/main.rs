use clap::{Parser, Subcommand};
use darkroom::batch::{self, BatchOperation, BatchOptions};
use darkroom::layers::{self, EditorLayer};
use darkroom::presets::{self, FilterCategory, ParameterValue};
use darkroom::transform::{self, Quality, RustBackend};
use darkroom::{config, output};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(about = "Image filters, presets and batch transforms")]
#[command(long_about = "\
Image filters, presets and batch transforms

Apply a filter preset to one image:

  darkroom filter in.jpg out.png --preset vintage --intensity 70
  darkroom filter in.jpg out.jpg --preset blur --param radius=4

Run a batch of transforms described in JSON:

  [
    {\"uri\": \"photos/dawn.jpg\", \"type\": \"resize\", \"params\": {\"width\": 800}},
    {\"uri\": \"photos/dusk.jpg\", \"type\": \"crop\",
     \"params\": {\"x\": 0, \"y\": 0, \"width\": 400, \"height\": 300}},
    {\"uri\": \"photos/noon.png\", \"type\": \"convert\", \"params\": {\"format\": \"webp\"}}
  ]

  darkroom batch operations.json --concurrency 4

Layer stacks are JSON arrays of layers; layer commands print the new stack.

Run 'darkroom gen-config' to generate a documented darkroom.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing darkroom.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List filter presets
    Presets {
        /// Only list presets in this category
        #[arg(long, value_enum)]
        category: Option<FilterCategory>,
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a filter preset to an image
    Filter {
        input: PathBuf,
        /// Output path; the extension picks the format (jpg, png, webp)
        output: PathBuf,
        #[arg(long)]
        preset: String,
        /// Blend strength 0-100 (default from config)
        #[arg(long)]
        intensity: Option<f32>,
        /// Override a preset parameter, e.g. --param warmth=-40
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f32)>,
    },
    /// Run batch transforms from a JSON file
    Batch {
        operations: PathBuf,
        /// Operations in flight at once (default from config)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Restructure a layer stack
    Layers {
        /// JSON file holding an array of layers
        file: PathBuf,
        #[command(subcommand)]
        action: LayerAction,
    },
    /// Print a stock darkroom.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum LayerAction {
    /// Merge layers by id into one layer appended last
    Merge {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Insert a copy of a layer right above it
    Duplicate { id: String },
    /// Move the layer at FROM to TO
    Reorder { from: usize, to: usize },
}

fn parse_param(s: &str) -> Result<(String, f32), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Presets { category, json } => {
            let list = presets::presets(category);
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                output::print_presets(&list);
            }
        }
        Command::Filter {
            input,
            output: out_path,
            preset,
            intensity,
            params,
        } => {
            let cfg = config::load_config(&cli.config_dir)?;
            let mut state = presets::create_filter_state(&preset)?;
            state.set_intensity(intensity.unwrap_or(cfg.filter.intensity));
            for (name, value) in params {
                state.set_parameter(&name, ParameterValue::Number(value));
            }
            let result = transform::filter_file(
                &input,
                &out_path,
                &state,
                Quality::new(cfg.output.quality),
            )?;
            if let Some(preset) = presets::preset(&state.id) {
                output::print_filter_result(
                    preset,
                    state.intensity,
                    &input,
                    &out_path,
                    (result.width, result.height),
                );
            }
        }
        Command::Batch {
            operations,
            concurrency,
            json,
        } => {
            let cfg = config::load_config(&cli.config_dir)?;
            init_thread_pool(&cfg.processing);
            let content = std::fs::read_to_string(&operations)?;
            let ops: Vec<BatchOperation> = serde_json::from_str(&content)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        // Progress goes to stderr so --json output stays clean
                        eprintln!("{}", line);
                    }
                }
            });
            let options = BatchOptions {
                concurrency: concurrency.unwrap_or(cfg.batch.concurrency),
                quality: Quality::new(cfg.output.quality),
                events: Some(tx),
            };
            let result = batch::process_batch(&RustBackend::new(), &ops, &options);
            drop(options);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_batch_summary(&result);
            }
        }
        Command::Layers { file, action } => {
            let stack = read_layers(&file)?;
            let updated = match action {
                LayerAction::Merge { ids } => layers::merge_layers(&stack, &ids),
                LayerAction::Duplicate { id } => {
                    let pos = stack
                        .iter()
                        .position(|l| l.id == id)
                        .ok_or_else(|| format!("no layer with id {id}"))?;
                    let mut updated = stack.clone();
                    updated.push(layers::duplicate_layer(&stack[pos]));
                    layers::reorder_layers(&updated, updated.len() - 1, pos + 1)
                }
                LayerAction::Reorder { from, to } => layers::reorder_layers(&stack, from, to),
            };
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn read_layers(path: &Path) -> Result<Vec<EditorLayer>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = processing.effective_threads();
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
