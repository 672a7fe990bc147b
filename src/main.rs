use anyhow::{Context, Result};
use cura::api::{self, ServerConfig};
use cura::cli::{parse_args, setup_logging, Commands, MappingArgs, PredictArgs, ServeArgs, TrainArgs};
use cura::data::DataLoader;
use cura::doctor::DoctorMapping;
use cura::model::checkpoint::ModelSaver;
use cura::predict::{ChatResponse, EntryResponse, Predictor};
use cura::training::callbacks::{EpochLoggerCallback, ProgressBarCallback};
use cura::training::trainer::Trainer;
use cura::{DefaultBackend, TrainingBackend};
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", cura::info());

    let result = match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
        Commands::Mapping(args) => run_mapping(args),
        Commands::Serve(args) => run_serve(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    info!("Starting training...");
    info!("Training file: {:?}", args.train);
    info!("Testing file: {:?}", args.test);
    info!("Output directory: {:?}", args.output);

    let training_config = args.training_config()?;
    cura::utils::ensure_dir(&args.output)?;

    info!("Loading data...");
    let tables = DataLoader::new()
        .load_split(&args.train, &args.test)
        .context("Failed to load training data")?;
    info!(
        "Loaded {} rows with {} symptoms",
        tables.total_samples(),
        tables.schema().len()
    );

    let device = Default::default();
    let mut trainer = Trainer::<TrainingBackend>::new(training_config, device)
        .with_callback(EpochLoggerCallback::new())
        .with_callback(ProgressBarCallback::new());

    let trained = trainer.train(&tables).context("Training failed")?;

    ModelSaver::new(&args.output)
        .save(&trained.model, &trained.metadata, &trained.encoder)
        .context("Failed to save model")?;

    let result = &trained.result;
    info!("=== Training Results ===");
    info!("Total epochs: {}", result.state.epoch);
    info!("Best accuracy: {:.2}%", result.state.best_accuracy() * 100.0);
    info!("Training time: {}", cura::utils::format_duration(result.duration_secs));
    info!("Final Test Metrics:");
    info!("  Loss: {:.4}", result.final_metrics.loss);
    info!("  Accuracy: {:.2}%", result.final_metrics.accuracy * 100.0);
    info!("Model saved to: {:?}", args.output);

    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    info!("Loading model from {:?}", args.artifacts);
    let predictor = Predictor::from_artifacts::<DefaultBackend>(
        &args.artifacts,
        args.mapping.as_deref(),
        Default::default(),
    )
    .with_context(|| format!("Failed to load model from {:?}", args.artifacts))?;

    let entries: Vec<EntryResponse> = args
        .symptoms
        .iter()
        .map(|entry| predictor.respond(entry))
        .collect();

    if args.json {
        let reply = ChatResponse::from_entries(entries);
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.input());
        match entry {
            EntryResponse::Results { results, .. } => {
                for (rank, r) in results.iter().enumerate() {
                    println!(
                        "  {}. {:<40} {:>6.2}%  -> {}",
                        rank + 1,
                        r.disease,
                        r.confidence,
                        r.doctor
                    );
                }
            }
            EntryResponse::Error { error, .. } => println!("  {}", error),
        }
    }

    Ok(())
}

fn run_mapping(args: MappingArgs) -> Result<()> {
    let saver = ModelSaver::new(&args.artifacts);
    let encoder = saver
        .load_encoder()
        .with_context(|| format!("Failed to load label encoder from {:?}", args.artifacts))?;

    let output = args.output.unwrap_or_else(|| saver.mapping_path());
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        cura::utils::ensure_dir(parent)?;
    }

    let mapping = DoctorMapping::generate(encoder.classes());
    mapping.save(&output)?;
    info!("Mapping saved to: {:?}", output);

    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    info!("Loading model from {:?}", args.artifacts);
    let predictor = Predictor::from_artifacts::<DefaultBackend>(
        &args.artifacts,
        args.mapping.as_deref(),
        Default::default(),
    )
    .with_context(|| format!("Failed to load model from {:?}", args.artifacts))?;

    let config = ServerConfig::default().with_addr(args.addr);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(api::serve(predictor, config))
}
