//! Application lifecycle.

use crate::startup::print_startup_info;
use anyhow::Context;
use conveyor_config::AppConfig;
use conveyor_jobs::{register_metrics, JobService};
use conveyor_rest::{create_router, AppState};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// A bound, not yet running server.
pub struct Application {
    service: Arc<JobService>,
    listener: TcpListener,
    config: AppConfig,
}

impl Application {
    /// Builds the job service and binds the REST listener.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        register_metrics();

        let service = Arc::new(
            JobService::new(config.jobs.clone()).context("Failed to build job service")?,
        );

        let rest_addr = config.server.rest_addr();
        let listener = TcpListener::bind(&rest_addr)
            .await
            .with_context(|| format!("Failed to bind REST listener on {rest_addr}"))?;

        Ok(Self {
            service,
            listener,
            config,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared job service.
    pub fn service(&self) -> &Arc<JobService> {
        &self.service
    }

    /// Runs until `shutdown` resolves, then stops HTTP and the job service
    /// in that order.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            service,
            listener,
            config,
        } = self;

        service.start().context("Failed to start job service")?;

        let router = create_router(AppState::new(service.clone()), &config.server);
        print_startup_info(listener.local_addr()?);

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        info!("HTTP server stopped, draining jobs...");
        service.shutdown().await;

        served.context("REST server error")?;
        info!("Server shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.rest_host = "127.0.0.1".to_string();
        config.server.rest_port = 0;
        config.jobs.worker.workload_latency_ms = 1;
        config.jobs.worker.shutdown_timeout_secs = 1;
        config
    }

    #[tokio::test]
    async fn test_build_binds_ephemeral_port() {
        let app = Application::build(test_config()).await.unwrap();
        assert_ne!(app.local_addr().unwrap().port(), 0);
        assert!(!app.service().is_running());
    }

    #[tokio::test]
    async fn test_invalid_jobs_config_fails_build() {
        let mut config = test_config();
        config.jobs.queue.capacity = 0;
        assert!(Application::build(config).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_until_stops_service() {
        let app = Application::build(test_config()).await.unwrap();
        let service = app.service().clone();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(app.run_until(async {
            let _ = rx.await;
        }));

        let job = service.create("email", Vec::new()).unwrap();
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert!(!service.is_accepting());
        assert!(!service.is_running());
        assert_eq!(
            service.get(&job.id).unwrap().status,
            conveyor_jobs::JobStatus::Completed
        );
    }
}
