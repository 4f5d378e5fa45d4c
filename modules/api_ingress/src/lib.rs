//! HTTP ingress: assembles the axum router (routes, request ids, tracing, CORS,
//! panic recovery, Problem Details fallbacks) and serves it.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, middleware::from_fn_with_state, Router};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

use apikit::api::{problem_middleware, MethodProbe, RecoveryLayer, RestRouter};
use runtime::AppConfig;

mod config;
pub mod items;
pub mod request_id;
pub mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

pub struct ApiIngress {
    config: ApiIngressConfig,
    /// GCP project for trace correlation, from `logging.project_id`.
    project_id: Option<String>,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig, project_id: Option<String>) -> Self {
        Self { config, project_id }
    }

    /// Read `modules.api_ingress` and `logging.project_id` from the app config.
    pub fn from_app_config(app: &AppConfig) -> Result<Self> {
        let config: ApiIngressConfig = app.module_config(MODULE_NAME)?;
        config
            .validate()
            .with_context(|| format!("invalid modules.{MODULE_NAME} config"))?;
        let project_id = app.logging.as_ref().and_then(|l| l.project_id.clone());
        Ok(Self::new(config, project_id))
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    pub fn build_router(&self) -> Router {
        let state = items::ItemsState {
            catalog: Arc::new(items::demo_catalog()),
            limits: self.config.limit_policy(),
        };

        let (router, registry) = RestRouter::<items::ItemsState>::new()
            .get("/health", web::health_check)
            .get("/hello", web::hello)
            .get("/items", items::list_items)
            .into_parts();
        tracing::debug!(routes = registry.len(), "router assembled");
        let probe: Arc<dyn MethodProbe> = Arc::new(registry);

        // Layers run outermost last: SetRequestId -> PropagateRequestId -> request id
        // extension -> Trace -> CORS -> Recovery -> problem mapping -> routes.
        let mut router = router
            .with_state(state)
            .layer(from_fn_with_state(probe, problem_middleware))
            .layer(RecoveryLayer::new());

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        let x_request_id = request_id::header();
        router
            .layer(request_id::create_trace_layer(self.project_id.clone()))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().context("listener has no local address")?;
        tracing::info!(%addr, "HTTP server listening");

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_app_config_reads_module_section_and_project() {
        let mut app = AppConfig::default();
        app.modules.insert(
            MODULE_NAME.into(),
            serde_json::json!({"cors_enabled": true, "max_page_limit": 25}),
        );
        app.logging.as_mut().unwrap().project_id = Some("demo".into());

        let ingress = ApiIngress::from_app_config(&app).unwrap();
        assert!(ingress.config().cors_enabled);
        assert_eq!(ingress.config().max_page_limit, 25);
        assert_eq!(ingress.project_id.as_deref(), Some("demo"));
    }

    #[test]
    fn invalid_module_section_is_an_error() {
        let mut app = AppConfig::default();
        app.modules.insert(
            MODULE_NAME.into(),
            serde_json::json!({"default_page_limit": 500, "max_page_limit": 10}),
        );
        assert!(ApiIngress::from_app_config(&app).is_err());
    }
}
