//! Export and import routes.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use database::ContactFields;
use serde::{Deserialize, Serialize};
use tabular::{
    expected_headers, export_contacts as render_export, export_file_name, parse_import, ColumnMap,
    Delimiter, ExportFormat, ImportBatch, ImportOutcome, TabularError,
};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Download every contact as CSV or tab-separated text.
pub async fn export_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let format: ExportFormat = match query.format.as_deref() {
        Some(name) => name
            .parse()
            .map_err(|e: TabularError| ApiError::BadRequest(e.to_string()))?,
        None => ExportFormat::Csv,
    };

    let store = state.stores.store_for(user.id()).await?;
    let contacts = store.contacts().await?;
    let body = render_export(contacts.iter().map(|c| &c.fields), format);

    let timestamp = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();
    let file_name = export_file_name(format, &timestamp);

    info!(account = %user.id(), format = %format, rows = contacts.len(), "Contacts exported");

    Ok((
        [
            (CONTENT_TYPE, format.content_type().to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}

/// What an import would do, shown before the user confirms.
#[derive(Serialize)]
pub struct ImportPreview {
    pub valid_rows: usize,
    pub rejected_rows: usize,
    pub rows_read: usize,
    pub delimiter: Delimiter,
    pub columns: ColumnMap,
    pub first_record: Option<ContactFields>,
}

impl From<&ImportBatch> for ImportPreview {
    fn from(batch: &ImportBatch) -> Self {
        Self {
            valid_rows: batch.accepted(),
            rejected_rows: batch.rejected(),
            rows_read: batch.rows_read,
            delimiter: batch.delimiter,
            columns: batch.columns.clone(),
            first_record: batch.preview().cloned(),
        }
    }
}

/// Result of a confirmed import.
#[derive(Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected_rows: usize,
}

fn ready_batch(text: &str) -> Result<ImportBatch> {
    match parse_import(text) {
        ImportOutcome::Ready(batch) => Ok(batch),
        ImportOutcome::NoValidRows { rows_read, .. } => Err(ApiError::NoValidRows {
            rows_read,
            expected_headers: expected_headers(),
        }),
    }
}

/// Parse an uploaded file without writing anything.
pub async fn preview_import(user: AuthUser, body: String) -> Result<Json<ImportPreview>> {
    let batch = ready_batch(&body)?;
    info!(
        account = %user.id(),
        valid = batch.accepted(),
        rejected = batch.rejected(),
        "Import previewed"
    );
    Ok(Json((&batch).into()))
}

/// Parse an uploaded file and insert its valid rows.
pub async fn import_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    body: String,
) -> Result<(StatusCode, Json<ImportSummary>)> {
    let batch = ready_batch(&body)?;
    let created = state.contacts.import_batch(user.id(), &batch).await?;

    Ok((
        StatusCode::CREATED,
        Json(ImportSummary {
            imported: created.len(),
            rejected_rows: batch.rejected(),
        }),
    ))
}
