use std::io;
use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use log::info;
use langdetect::interactive::{wait_for_enter, PROMPT};
use langdetect::{
    init_logger, load_or_reuse, AppConfig, ClassificationRecord, FsModelStore, InteractiveSession,
    PathOverrides,
};

#[derive(Parser)]
#[command(author, version, about = "Classify sentences with a trained language model", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model artifact written by langdetect-train
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Exit without waiting for <Enter>
    #[arg(long)]
    no_pause: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();

    let config = AppConfig::discover(args.config.as_deref())?.with_overrides(PathOverrides {
        model_path: args.model_path,
        ..PathOverrides::default()
    });
    config.validate()?;

    let model = load_or_reuse(&FsModelStore, &config.model_path, None)
        .with_context(|| format!("Cannot use model {}", config.model_path.display()))?;
    let info = model.info();
    info!(
        "Model has {} classes {:?}, trained on {} rows at {}",
        info.num_classes, info.class_labels, info.metadata.training_rows, info.metadata.created_at
    );

    let mut session = InteractiveSession::new(FsModelStore, &config.model_path, config.prediction.view)
        .with_model(model);
    let mut stdout = io::stdout();

    let samples: Vec<ClassificationRecord> = config
        .prediction
        .sample_texts
        .iter()
        .map(|text| ClassificationRecord::unlabeled(text.as_str()))
        .collect();
    if !samples.is_empty() {
        session.classify(&samples, &mut stdout)?;
    }

    println!();
    println!("{}", PROMPT);
    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(&mut stdin, &mut stdout).await?;

    if !args.no_pause {
        wait_for_enter("Press <Enter> to end program...", &mut stdin, &mut stdout).await?;
    }
    Ok(())
}
