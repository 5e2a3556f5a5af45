//! Catalog management commands.
//!
//! # Import file format
//!
//! ```yaml
//! - name: Rose Hoop
//!   price: "42.00"
//!   thread_colors: [red, green]
//! - id: mono-classic
//!   name: Classic Monogram
//! ```
//!
//! `id` is optional; without it the ID is derived from the name. Every other
//! key is stored on the design as-is.

use std::path::Path;

use tracing::{info, warn};

use threadline_core::DesignId;
use threadline_storefront::db::PgDocumentStore;
use threadline_storefront::models::DesignInput;
use threadline_storefront::services::CatalogService;

/// Parse an import file.
fn parse_designs(content: &str) -> Result<Vec<DesignInput>, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Import designs from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// operation fails. Nothing is written when the final commit fails.
pub async fn import(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading designs from file");

    // Read and parse before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let inputs = parse_designs(&content)?;
    info!(designs = inputs.len(), "Parsed import file");

    let pool = super::connect().await?;
    let store = PgDocumentStore::new(pool);
    let summary = CatalogService::new(&store).import(inputs).await?;

    for skipped in &summary.skipped {
        warn!(name = %skipped.name, reason = ?skipped.reason, "Skipped design");
    }

    info!(
        imported = summary.imported.len(),
        skipped = summary.skipped.len(),
        "Import complete"
    );
    Ok(())
}

/// List all catalog designs.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let store = PgDocumentStore::new(pool);
    let designs = CatalogService::new(&store).list().await?;

    #[allow(clippy::print_stdout)]
    for design in &designs {
        let name = design
            .fields
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");
        println!("{}\t{}", design.id, name);
    }

    info!(count = designs.len(), "Listed designs");
    Ok(())
}

/// Delete a design by ID.
///
/// # Errors
///
/// Returns an error if the ID is invalid or the database operation fails.
pub async fn delete(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let store = PgDocumentStore::new(pool);
    let design = DesignId::new(id);

    if CatalogService::new(&store).delete(&design).await? {
        info!(design_id = %design, "Design deleted");
    } else {
        warn!(design_id = %design, "No such design");
    }
    Ok(())
}
