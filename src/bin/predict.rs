//! predict CLI: operator interface to the prediction engine.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use predict_rs::classifier::{HttpClassifier, HttpClassifierConfig};
use predict_rs::codec::ResultCodec;
use predict_rs::config::Config;
use predict_rs::db::Db;
use predict_rs::engine::Dispatcher;
use predict_rs::model::{Label, Prediction, PredictionId, RequestContext, Status};
use predict_rs::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;

#[derive(Parser)]
#[command(name = "predict", about = "Image classification prediction engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit resources for classification and wait for the results
    Submit {
        /// Owner recorded on each prediction
        #[arg(long)]
        owner: String,
        /// Request id used to correlate the classification calls
        #[arg(long)]
        request_id: Option<String>,
        /// Resource locators to classify (e.g. object-storage paths)
        #[arg(required = true)]
        resources: Vec<String>,
    },
    /// Show a prediction
    Show {
        /// Prediction ID
        id: String,
    },
    /// List predictions
    List {
        /// Filter by status (processing, completed, failed)
        #[arg(long)]
        status: Option<String>,
        /// Filter by owner
        #[arg(long)]
        owner: Option<String>,
        /// Maximum predictions to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "predict".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;

    match cli.command {
        Command::Submit {
            owner,
            request_id,
            resources,
        } => cmd_submit(config, db, owner, request_id, resources).await,
        Command::Show { id } => cmd_show(&db, id).await,
        Command::List {
            status,
            owner,
            limit,
        } => cmd_list(&db, status, owner, limit).await,
    }
}

async fn cmd_submit(
    config: Config,
    db: Db,
    owner: String,
    request_id: Option<String>,
    resources: Vec<String>,
) -> anyhow::Result<()> {
    let codec = match config.labels_path {
        Some(ref path) => ResultCodec::load(path)?,
        None => ResultCodec::default(),
    };
    let classifier = HttpClassifier::new(HttpClassifierConfig {
        base_url: config.classifier_url,
        api_key: config.classifier_api_key,
        timeout: config.classifier_timeout,
    })?;

    let db = Arc::new(db);
    let dispatcher = Dispatcher::new(
        db.clone(),
        Arc::new(classifier),
        codec,
        config.max_in_flight,
    );

    let mut ctx = RequestContext::new();
    if let Some(id) = request_id {
        ctx = ctx.with_request_id(id);
    }

    let mut admitted = Vec::new();
    for resource in &resources {
        match dispatcher.submit(&ctx, &owner, resource).await {
            Ok(pending) => {
                println!("Accepted: {} ({resource})", pending.id);
                admitted.push(pending.id);
            }
            Err(e) if e.is_rejection() => println!("Rejected: {resource}: {e}"),
            Err(e) => return Err(e.into()),
        }
    }

    dispatcher.drain().await;

    if !admitted.is_empty() {
        println!();
    }
    for id in admitted {
        let prediction = db.get_prediction(id).await?;
        println!(
            "{}  {:<10}  {}",
            prediction.id,
            prediction.status,
            summary(&prediction)
        );
    }

    Ok(())
}

async fn cmd_show(db: &Db, id: String) -> anyhow::Result<()> {
    let id: PredictionId = id.parse()?;
    let prediction = db.get_prediction(id).await?;

    println!("ID:         {}", prediction.id);
    println!("Owner:      {}", prediction.owner);
    println!("Resource:   {}", prediction.resource);
    println!("Status:     {}", prediction.status);
    match prediction.label {
        Some(Label::Category {
            index,
            ref name,
            confidence,
        }) => println!("Label:      {name} (category {index}, confidence {confidence:.4})"),
        Some(Label::Undefined) => println!("Label:      {}", Label::UNDEFINED),
        None => {}
    }
    if let Some(ref err) = prediction.error {
        println!("Error:      {err}");
    }
    println!("Created:    {}", prediction.created_at);
    println!("Updated:    {}", prediction.updated_at);
    if let Some(completed) = prediction.completed_at {
        println!("Completed:  {completed}");
    }

    Ok(())
}

async fn cmd_list(
    db: &Db,
    status: Option<String>,
    owner: Option<String>,
    limit: i64,
) -> anyhow::Result<()> {
    let status: Option<Status> = status.map(|s| s.parse()).transpose()?;
    let predictions = db
        .list_predictions(status, owner.as_deref(), limit)
        .await?;

    if predictions.is_empty() {
        println!("No predictions found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<12}  {:<10}  {:<30}  CREATED",
        "ID", "OWNER", "STATUS", "RESULT"
    );
    println!("{}", "-".repeat(110));

    for prediction in &predictions {
        let result = summary(prediction);
        let result: String = result.chars().take(30).collect();
        println!(
            "{:<36}  {:<12}  {:<10}  {:<30}  {}",
            prediction.id,
            prediction.owner,
            prediction.status,
            result,
            prediction.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} prediction(s)", predictions.len());
    Ok(())
}

/// Label for completed predictions, reason for failed ones, `-` otherwise.
fn summary(prediction: &Prediction) -> String {
    match (&prediction.label, &prediction.error) {
        (Some(label), _) => label.to_string(),
        (None, Some(err)) => err.clone(),
        (None, None) => "-".to_string(),
    }
}
