use std::io;
use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use log::info;
use langdetect::interactive::wait_for_enter;
use langdetect::{evaluate, init_logger, train, AppConfig, PathOverrides};

#[derive(Parser)]
#[command(author, version, about = "Train the language classifier and evaluate it", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tab-separated training data
    #[arg(long)]
    training_path: Option<PathBuf>,

    /// Tab-separated test data
    #[arg(long)]
    test_path: Option<PathBuf>,

    /// Where to write the model artifact
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
        training_path: args.training_path,
        test_path: args.test_path,
        model_path: args.model_path,
    });
    config.validate()?;

    println!("Training Data Set");
    println!("-----------------");
    let model = train(&config, &config.training_path, &config.model_path)
        .with_context(|| format!("Training on {} failed", config.training_path.display()))?;
    info!("Model classes: {:?}", model.label_names()?);

    println!();
    println!("Evaluating Training Results");
    println!("---------------------------");
    evaluate(&model, &config, &config.test_path, &mut io::stdout().lock())
        .with_context(|| format!("Evaluation on {} failed", config.test_path.display()))?;

    if !args.no_pause {
        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
        wait_for_enter("Press <Enter> to exit...", &mut stdin, &mut io::stdout()).await?;
    }
    Ok(())
}
