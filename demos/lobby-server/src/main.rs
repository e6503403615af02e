//! Runnable Gridline lobby server.
//!
//! Environment:
//!
//! - `GRIDLINE_ADDR`: listen address, default `0.0.0.0:8080`
//! - `GRIDLINE_TEMPLATES`: optional JSON array of templates, e.g.
//!   `[{"name":"classic","cell_count":3,"win_count":3,"capacity":2}]`
//! - `RUST_LOG`: tracing filter, default `info`

use gridline::prelude::*;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), GridlineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("GRIDLINE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let catalog = load_catalog()?;
    for (id, template) in catalog.iter() {
        tracing::info!(
            %id,
            name = %template.name(),
            cell_count = template.cell_count(),
            win_count = template.win_count(),
            capacity = template.capacity(),
            "template loaded"
        );
    }

    let server = GridlineServer::builder()
        .bind(&addr)
        .templates(catalog)
        .build()
        .await?;

    tracing::info!("lobby server listening on ws://{}", server.local_addr()?);
    server.run().await
}

/// Reads `GRIDLINE_TEMPLATES`, falling back to the built-in catalog.
fn load_catalog() -> Result<TemplateCatalog, GridlineError> {
    let Ok(raw) = std::env::var("GRIDLINE_TEMPLATES") else {
        return Ok(TemplateCatalog::default());
    };
    let templates: Vec<Template> = serde_json::from_str(&raw)
        .map_err(|e| RoomError::InvalidTemplate(format!("GRIDLINE_TEMPLATES: {e}")))?;
    Ok(TemplateCatalog::new(templates)?)
}
