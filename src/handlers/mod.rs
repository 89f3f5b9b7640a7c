//! API handlers and their registration with the dispatcher.
//!
//! One file per handler; [`register_all`] wires every handler name used by
//! the route table to its coroutine.

pub mod admin;
pub mod auth;
pub mod batch;
pub mod model_info;
pub mod predict;
pub mod reports;

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::UserEntry;
use crate::dispatcher::Dispatcher;
use crate::middleware::MetricsMiddleware;
use crate::pipeline::PredictPipeline;
use crate::security::SessionStore;

/// Shared state handed to every handler.
pub struct AppContext {
    /// The serving pipeline; swapped atomically on artifact hot-reload.
    pub pipeline: Arc<ArcSwap<PredictPipeline>>,
    pub sessions: Arc<SessionStore>,
    pub users: HashMap<String, UserEntry>,
    pub reports_dir: PathBuf,
    pub metrics: Arc<MetricsMiddleware>,
}

/// Register every service handler with the dispatcher.
///
/// # Safety
///
/// Spawns handler coroutines via `Dispatcher::register_handler`; the may
/// runtime must be initialized and the server must not yet be serving.
pub unsafe fn register_all(dispatcher: &mut Dispatcher, ctx: Arc<AppContext>) {
    let c = Arc::clone(&ctx);
    dispatcher.register_handler("predict", move |req| predict::handle(&c, req));

    let c = Arc::clone(&ctx);
    dispatcher.register_handler("batch_predict", move |req| batch::handle(&c, req));

    let c = Arc::clone(&ctx);
    dispatcher.register_handler("download_report", move |req| reports::handle(&c, req));

    let c = Arc::clone(&ctx);
    dispatcher.register_handler("model_info", move |req| model_info::handle(&c, req));

    let c = Arc::clone(&ctx);
    dispatcher.register_handler("login", move |req| auth::login(&c, req));

    let c = Arc::clone(&ctx);
    dispatcher.register_handler("logout", move |req| auth::logout(&c, req));

    let c = Arc::clone(&ctx);
    dispatcher.register_handler("admin_stats", move |req| admin::stats(&c, req));
}
