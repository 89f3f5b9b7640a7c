//! Command line interface: `serve`, `train`, and `predict`.

use anyhow::Context;
use arc_swap::ArcSwap;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::client::{FormFields, PredictFormClient, SubmitPanel};
use crate::config::{AppConfig, RuntimeConfig};
use crate::dispatcher::Dispatcher;
use crate::handlers::{register_all, AppContext};
use crate::hot_reload::watch_model;
use crate::middleware::{MetricsMiddleware, TracingMiddleware};
use crate::pipeline::{load_training_csv, train_model, PredictPipeline, TrainParams};
use crate::router::{service_routes, Router};
use crate::security::{ApiKeyProvider, SessionProvider, SessionStore};
use crate::server::{AppService, HttpServer};
use crate::static_files::StaticFiles;

#[derive(Parser)]
#[command(name = "scorecast")]
#[command(about = "Student exam-score prediction service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the prediction service
    Serve {
        /// YAML config file; defaults apply when the file does not exist
        #[arg(short, long, default_value = "config/config.yaml")]
        config: PathBuf,

        /// Override the configured listen address
        #[arg(long)]
        addr: Option<String>,

        /// Override the configured model artifact directory
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Reload artifacts when they change on disk
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Train the regression model from a CSV dataset
    Train {
        /// Training CSV with feature columns and a math_score target
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory for model artifacts
        #[arg(short, long, default_value = "models")]
        out: PathBuf,

        #[arg(long, default_value_t = 100)]
        rounds: u32,

        #[arg(long, default_value_t = 0.5)]
        learning_rate: f64,

        /// L2 regularization strength
        #[arg(long, default_value_t = 1.0)]
        lambda: f64,
    },
    /// Submit the prediction form against a running service
    Predict {
        /// Base URL of the service
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        url: String,

        /// Form fields as NAME=VALUE, in submission order (repeatable)
        #[arg(short, long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SCORECAST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("SCORECAST_LOG_FORMAT").as_deref() == Ok("json") {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

pub fn run_cli() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            config,
            addr,
            model_dir,
            watch,
        } => serve(config, addr, model_dir, watch),
        Commands::Train {
            data,
            out,
            rounds,
            learning_rate,
            lambda,
        } => train(data, out, rounds, learning_rate, lambda),
        Commands::Predict { url, fields } => predict(&url, &fields),
    }
}

fn serve(
    config_path: PathBuf,
    addr: Option<String>,
    model_dir: Option<PathBuf>,
    watch: bool,
) -> anyhow::Result<()> {
    let cfg = if config_path.exists() {
        AppConfig::load(&config_path)?
    } else {
        info!(config = %config_path.display(), "config file not found, using defaults");
        AppConfig::default()
    };

    let runtime = RuntimeConfig::from_env();
    may::config().set_stack_size(runtime.stack_size);

    let addr = addr.unwrap_or(cfg.server.addr.clone());
    let model_dir = model_dir.unwrap_or(cfg.model.dir.clone());

    let pipeline = PredictPipeline::load(&model_dir).with_context(|| {
        format!(
            "no model artifacts in {} (run `scorecast train` first)",
            model_dir.display()
        )
    })?;
    let pipeline = Arc::new(ArcSwap::from_pointee(pipeline));

    let _watcher = if watch || cfg.model.watch {
        Some(watch_model(&model_dir, Arc::clone(&pipeline))?)
    } else {
        None
    };

    let metrics = Arc::new(MetricsMiddleware::new());
    let sessions = Arc::new(SessionStore::new());

    let mut dispatcher = Dispatcher::new(runtime.stack_size);
    let middleware_metrics: Arc<dyn crate::middleware::Middleware> = metrics.clone();
    dispatcher.add_middleware(middleware_metrics);
    dispatcher.add_middleware(Arc::new(TracingMiddleware));

    let ctx = Arc::new(AppContext {
        pipeline,
        sessions: Arc::clone(&sessions),
        users: cfg.security.users.clone(),
        reports_dir: cfg.reports.dir.clone(),
        metrics: Arc::clone(&metrics),
    });
    // SAFETY: the may runtime is initialized and the server is not yet serving.
    unsafe {
        register_all(&mut dispatcher, ctx);
    }

    let router = Arc::new(Router::new(service_routes(&cfg.security.protect)));
    let mut service = AppService::new(router, Arc::new(dispatcher), Arc::clone(&metrics));

    for (name, entry) in &cfg.security.api_keys {
        service.register_security_provider(
            name,
            Arc::new(ApiKeyProvider::new(&entry.header_name, &entry.key)),
        );
    }
    service.register_security_provider("session", Arc::new(SessionProvider::new(Arc::clone(&sessions))));
    service.register_security_provider(
        "admin_session",
        Arc::new(SessionProvider::admin_only(Arc::clone(&sessions))),
    );

    if let Some(static_dir) = &cfg.server.static_dir {
        if static_dir.is_dir() {
            service.set_static_files(StaticFiles::new(static_dir.clone()));
        }
    }

    let handle = HttpServer(service)
        .start(&addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, model_dir = %model_dir.display(), "scorecast listening");

    #[cfg(unix)]
    {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        if let Some(signal) = signals.forever().next() {
            info!(signal, "shutdown signal received");
            handle.stop();
        }
    }
    #[cfg(not(unix))]
    {
        handle
            .join()
            .map_err(|e| anyhow::anyhow!("server failed: {e:?}"))?;
    }
    Ok(())
}

fn train(
    data: PathBuf,
    out: PathBuf,
    rounds: u32,
    learning_rate: f64,
    lambda: f64,
) -> anyhow::Result<()> {
    let dataset = load_training_csv(&data)?;
    let params = TrainParams {
        rounds,
        learning_rate,
        lambda,
        ..TrainParams::default()
    };
    let (pipeline, report) = train_model(&dataset, &params)?;
    pipeline.save(&out)?;

    println!(
        "Training completed on {} rows ({} held out).",
        report.rows_train, report.rows_valid
    );
    println!("RMSE (train): {:.3}", report.rmse_train);
    if let (Some(rmse), Some(r2)) = (report.rmse_valid, report.r2_valid) {
        println!("RMSE (validation): {rmse:.3}");
        println!("R2 score (validation): {r2:.4}");
    }
    println!("Artifacts written to {}", out.display());
    Ok(())
}

fn predict(url: &str, raw_fields: &[String]) -> anyhow::Result<()> {
    let mut fields = FormFields::new();
    for raw in raw_fields {
        let (name, value) = raw
            .split_once('=')
            .with_context(|| format!("field '{raw}' is not NAME=VALUE"))?;
        fields.set(name, value);
    }

    let client = PredictFormClient::new(url)?;
    let mut panel = SubmitPanel::new();
    let result = client.submit(&fields, &mut panel);
    println!("{}", panel.result_html());
    result.map(|_| ())
}
