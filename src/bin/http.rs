#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use cpm_planner::{Project, ProjectMetadata, SchedulerConfig, http_api};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let addr: SocketAddr = std::env::var("CPM_PLANNER_HTTP_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let config = match std::env::var("CPM_PLANNER_CONFIG") {
        Ok(path) => SchedulerConfig::from_json_file(path)?,
        Err(_) => SchedulerConfig::default(),
    };

    let project = Project::with_config(ProjectMetadata::default(), config);
    http_api::serve(addr, project).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
