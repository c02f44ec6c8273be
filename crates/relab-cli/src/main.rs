use clap::{value_parser, Arg, ArgAction, Command};
use relab_core::{DataMode, ReproPipeline, RunConfig};
use relab_llm::HttpLanguageModel;
use relab_sandbox::DockerSandbox;
use std::sync::Arc;
use std::time::Duration;

mod chunk;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("relab")
        .version("0.1.0")
        .about("RELAB - reproduce a paper experiment as an executed notebook")
        .arg(
            Arg::new("input")
                .required(true)
                .help("Path to the extracted paper text"),
        )
        .arg(
            Arg::new("experiment")
                .long("experiment")
                .default_value("0")
                .value_parser(value_parser!(usize))
                .help("Index of the experiment to reproduce"),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .default_value("5")
                .value_parser(value_parser!(u32))
                .help("Maximum execution attempts (default: 5)"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .default_value("output")
                .help("Output directory (default: output)"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .default_value("600")
                .value_parser(value_parser!(u64))
                .help("Execution timeout in seconds (default: 600)"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .default_value("python:3.11-slim")
                .help("Sandbox container image"),
        )
        .arg(
            Arg::new("real-data")
                .long("real-data")
                .action(ArgAction::SetTrue)
                .help("Use the paper's real datasets instead of synthetic data"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .default_value("http://localhost:8000")
                .help("Chat backend base URL"),
        );

    let matches = cli.get_matches();

    let input = matches.get_one::<String>("input").unwrap();
    let experiment = *matches.get_one::<usize>("experiment").unwrap();
    let max_iterations = *matches.get_one::<u32>("max-iterations").unwrap();
    let output_dir = matches.get_one::<String>("output-dir").unwrap();
    let timeout = *matches.get_one::<u64>("timeout").unwrap();
    let image = matches.get_one::<String>("image").unwrap();
    let backend = matches.get_one::<String>("backend").unwrap();
    let data_mode = if matches.get_flag("real-data") {
        DataMode::Real
    } else {
        DataMode::Synthetic
    };

    let text = match std::fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("could not read {input}: {e}");
            std::process::exit(2);
        }
    };
    let chunks = chunk::chunk_text(&text, chunk::MAX_CHUNK_SIZE, chunk::CHUNK_OVERLAP);
    println!("Input: {} chars, {} chunk(s)", text.len(), chunks.len());

    let config = RunConfig::new(output_dir)
        .with_data_mode(data_mode)
        .with_max_iterations(max_iterations)
        .with_timeout(Duration::from_secs(timeout))
        .with_image(image.clone());
    let lm = Arc::new(HttpLanguageModel::new(backend));
    let sandbox = Arc::new(DockerSandbox::new());
    let pipeline = ReproPipeline::new(lm, sandbox, config);

    tracing::info!(experiment, max_iterations, backend = %backend, "starting pipeline");
    match pipeline.run(&chunks, experiment).await {
        Ok(report) => {
            println!();
            println!("Run {}", report.run_id);
            println!("  Experiment: {}", report.experiment_id);
            println!("  Success:    {}", report.success);
            println!("  Terminal:   {:?}", report.terminal);
            println!("  Iterations: {}", report.iterations);
            println!("  Time:       {:.1}s", report.total_time_secs);
            if let Some(error) = &report.error {
                println!("  Error:      {error}");
            }
            println!("  Outputs in: {output_dir}");
            std::process::exit(if report.success { 0 } else { 1 });
        }
        Err(e) => {
            eprintln!("pipeline failed: {e}");
            std::process::exit(2);
        }
    }
}
