#![allow(dead_code)]

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::{Arc, Once};

use scorecast::config::UserEntry;
use scorecast::dispatcher::Dispatcher;
use scorecast::handlers::{register_all, AppContext};
use scorecast::middleware::{Middleware, MetricsMiddleware, TracingMiddleware};
use scorecast::pipeline::{
    CategoryEncoder, LinearModel, PredictPipeline, Preprocessor, StandardScaler,
};
use scorecast::router::{service_routes, Router};
use scorecast::security::{hash_password, ApiKeyProvider, SessionProvider, SessionStore};
use scorecast::server::{AppService, HttpServer, ServerHandle};
use scorecast::static_files::StaticFiles;

static MAY_INIT: Once = Once::new();

/// Ensure may coroutines are configured once per test binary.
pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x8000);
    });
}

/// A pipeline fitted on a small fixed vocabulary. With zero weights it
/// predicts the bias (66.0) for every in-vocabulary record.
pub fn tiny_pipeline() -> PredictPipeline {
    let preprocessor = Preprocessor {
        categorical: CategoryEncoder::fit(&[
            ("gender", vec!["female", "male"]),
            ("race_ethnicity", vec!["group A", "group B", "group C"]),
            (
                "parental_level_of_education",
                vec!["some college", "bachelor's degree"],
            ),
            ("lunch", vec!["standard", "free/reduced"]),
            ("test_preparation_course", vec!["none", "completed"]),
        ]),
        numeric: StandardScaler::fit(&[
            ("reading_score", vec![50.0, 90.0]),
            ("writing_score", vec![50.0, 90.0]),
        ]),
    };
    let mut model = LinearModel::zeros(preprocessor.width());
    model.set_bias(66.0);
    PredictPipeline::new(preprocessor, model).unwrap()
}

/// Config entry for a user with the given password.
pub fn user_entry(password: &str, admin: bool) -> UserEntry {
    UserEntry {
        salt: "73a1".to_string(),
        digest: hash_password("73a1", password),
        admin,
    }
}

/// A valid predict request body matching [`tiny_pipeline`]'s vocabulary.
pub fn valid_predict_body() -> serde_json::Value {
    serde_json::json!({
        "gender": "female",
        "ethnicity": "group B",
        "parental_level_of_education": "some college",
        "lunch": "standard",
        "test_preparation_course": "none",
        "reading_score": "72",
        "writing_score": "74"
    })
}

#[derive(Default)]
pub struct ServiceOptions {
    /// Handler name → scheme names guarding it.
    pub protect: HashMap<String, Vec<String>>,
    /// Registers an `api_key` scheme with this header/key pair.
    pub api_key: Option<(String, String)>,
    pub users: HashMap<String, UserEntry>,
    pub static_dir: Option<PathBuf>,
    /// Pipeline to serve; defaults to [`tiny_pipeline`].
    pub pipeline: Option<PredictPipeline>,
}

pub struct TestService {
    handle: Option<ServerHandle>,
    pub base_url: String,
    pub sessions: Arc<SessionStore>,
    pub metrics: Arc<MetricsMiddleware>,
    pub reports_dir: tempfile::TempDir,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

/// Boot the full service on an ephemeral port.
pub fn start_service(opts: ServiceOptions) -> TestService {
    setup_may_runtime();

    let reports_dir = tempfile::tempdir().unwrap();
    let pipeline = Arc::new(ArcSwap::from_pointee(
        opts.pipeline.unwrap_or_else(tiny_pipeline),
    ));
    let metrics = Arc::new(MetricsMiddleware::new());
    let sessions = Arc::new(SessionStore::new());

    let mut dispatcher = Dispatcher::new(0x8000);
    let middleware_metrics: Arc<dyn Middleware> = metrics.clone();
    dispatcher.add_middleware(middleware_metrics);
    dispatcher.add_middleware(Arc::new(TracingMiddleware));

    let ctx = Arc::new(AppContext {
        pipeline,
        sessions: Arc::clone(&sessions),
        users: opts.users,
        reports_dir: reports_dir.path().to_path_buf(),
        metrics: Arc::clone(&metrics),
    });
    unsafe {
        register_all(&mut dispatcher, ctx);
    }

    let router = Arc::new(Router::new(service_routes(&opts.protect)));
    let mut service = AppService::new(router, Arc::new(dispatcher), Arc::clone(&metrics));

    if let Some((header, key)) = &opts.api_key {
        service.register_security_provider("api_key", Arc::new(ApiKeyProvider::new(header, key)));
    }
    service.register_security_provider(
        "session",
        Arc::new(SessionProvider::new(Arc::clone(&sessions))),
    );
    service.register_security_provider(
        "admin_session",
        Arc::new(SessionProvider::admin_only(Arc::clone(&sessions))),
    );
    if let Some(dir) = opts.static_dir {
        service.set_static_files(StaticFiles::new(dir));
    }

    // Ephemeral port: bind, record, release, rebind inside the server.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handle = HttpServer(service).start(addr).unwrap();
    handle.wait_ready().unwrap();

    TestService {
        handle: Some(handle),
        base_url: format!("http://{addr}"),
        sessions,
        metrics,
        reports_dir,
    }
}
