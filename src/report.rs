use tracing::{debug, info, warn};

use crate::artifacts::ArtifactStore;
use crate::error::ReportError;
use crate::excel;
use crate::filters::{self, FilterSet, RawReportQuery};
use crate::models::{ExportFormat, ReportData, ReportKind, ReportResult, ReportRow};
use crate::pdf;
use crate::source::RowSource;
use crate::stats::{self, Statistics};

/// Rows returned in the JSON payload; exports always cover the full set.
pub const PREVIEW_ROW_LIMIT: usize = 10;

/// Upper bound on rows pulled from the row source per report.
pub const ROW_FETCH_LIMIT: usize = 1000;

/// Runs one report request end to end: normalize filters, fetch rows,
/// apply the post-fetch filter, sort, aggregate, and optionally render and
/// persist an export document.
///
/// Only a fetch failure aborts the request. A renderer or persistence
/// failure downgrades to a `warning` on an otherwise successful preview.
pub async fn generate_report(
    source: &dyn RowSource,
    artifacts: &ArtifactStore,
    kind: ReportKind,
    raw: &RawReportQuery,
    format: Option<ExportFormat>,
) -> Result<ReportResult, ReportError> {
    let applied = filters::normalize(raw);
    debug!(%kind, ?applied, "normalized report filters");

    let native = applied.native_subset(kind);
    let fetched = source
        .fetch_rows(kind, &native, ROW_FETCH_LIMIT)
        .await
        .map_err(|source| ReportError::Fetch { kind, source })?;

    let mut rows = filters::apply_post_fetch(kind, fetched, &applied);
    // Stable sort; rows sharing an id keep their fetch order, so repeated
    // calls against the same snapshot preview identically.
    rows.sort_by_key(|row| row.id);

    let statistics = stats::aggregate(kind, &rows);
    info!(%kind, total = statistics.total, "computed report statistics");

    let mut download_url = None;
    let mut message = None;
    let mut warning = None;

    if let Some(format) = format {
        match export(artifacts, kind, format, &rows, &statistics, &applied).await {
            Ok(filename) => {
                download_url = Some(format!("/download/{filename}"));
                message = Some(format!(
                    "{} report generated successfully with {} {}",
                    format.upper_label(),
                    statistics.total,
                    kind.subject_noun()
                ));
            }
            Err(err) => {
                warn!(%kind, error = %err, "report export failed");
                warning = Some(
                    "Report preview generated but file export failed. Please try again."
                        .to_string(),
                );
            }
        }
    }

    let preview = rows.iter().take(PREVIEW_ROW_LIMIT).cloned().collect();
    Ok(ReportResult {
        success: true,
        data: ReportData {
            rows: preview,
            statistics,
            filters: applied,
        },
        download_url,
        message,
        warning,
    })
}

/// Renders the full filtered row set with the requested renderer and hands
/// the buffer to the artifact store.
async fn export(
    artifacts: &ArtifactStore,
    kind: ReportKind,
    format: ExportFormat,
    rows: &[ReportRow],
    statistics: &Statistics,
    applied: &FilterSet,
) -> anyhow::Result<String> {
    let bytes = match format {
        ExportFormat::Pdf => pdf::render(kind, rows, statistics, applied)?,
        ExportFormat::Excel => excel::render(kind, rows, statistics, applied)?,
    };
    let filename = artifacts.persist(&bytes, kind, format).await?;
    Ok(filename)
}
