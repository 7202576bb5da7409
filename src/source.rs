use std::path::PathBuf;

use async_trait::async_trait;

use crate::models::{parse_salary, ReportKind, ReportRow};

/// Filters a row source applies natively, before the post-fetch passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeFilter {
    pub department_id: Option<i64>,
    pub course_id: Option<i64>,
}

/// The data-access collaborator. Implementations return flat, denormalized
/// rows with display labels already resolved (`"Unknown"` / `"N/A"`
/// defaults applied) and at most `limit` rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(
        &self,
        kind: ReportKind,
        filter: &NativeFilter,
        limit: usize,
    ) -> anyhow::Result<Vec<ReportRow>>;
}

/// Row source backed by a CSV export, for generating reports without a
/// database at hand. Columns beyond `id` are optional; label columns
/// default the same way the database source resolves them.
pub struct CsvRowSource {
    path: PathBuf,
}

impl CsvRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(serde::Deserialize)]
struct CsvRecord {
    id: i64,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    department_id: Option<i64>,
    #[serde(default)]
    course: Option<String>,
    #[serde(default)]
    course_id: Option<i64>,
    #[serde(default)]
    academic_year: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    employment_type: Option<String>,
    #[serde(default)]
    salary: Option<String>,
    #[serde(default)]
    contact: Option<String>,
}

impl CsvRecord {
    fn matches(&self, filter: &NativeFilter) -> bool {
        let department_ok = filter
            .department_id
            .is_none_or(|wanted| self.department_id == Some(wanted));
        let course_ok = filter
            .course_id
            .is_none_or(|wanted| self.course_id == Some(wanted));
        department_ok && course_ok
    }

    fn into_row(self, kind: ReportKind) -> ReportRow {
        let label = |value: Option<String>| value.unwrap_or_else(|| "Unknown".to_string());
        ReportRow {
            id: self.id,
            reference: self.reference.unwrap_or_else(|| "N/A".to_string()),
            name: self.name.unwrap_or_else(|| "N/A".to_string()),
            department: label(self.department),
            course: match kind {
                ReportKind::Student => Some(label(self.course)),
                ReportKind::Faculty => None,
            },
            academic_year: match kind {
                ReportKind::Student => Some(label(self.academic_year)),
                ReportKind::Faculty => None,
            },
            position: match kind {
                ReportKind::Student => None,
                ReportKind::Faculty => Some(label(self.position)),
            },
            employment_type: match kind {
                ReportKind::Student => None,
                ReportKind::Faculty => Some(label(self.employment_type)),
            },
            salary: match kind {
                ReportKind::Student => None,
                ReportKind::Faculty => self.salary.as_deref().and_then(parse_salary),
            },
            contact: self.contact.unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

#[async_trait]
impl RowSource for CsvRowSource {
    async fn fetch_rows(
        &self,
        kind: ReportKind,
        filter: &NativeFilter,
        limit: usize,
    ) -> anyhow::Result<Vec<ReportRow>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();

        for result in reader.deserialize::<CsvRecord>() {
            let record = result?;
            if !record.matches(filter) {
                continue;
            }
            rows.push(record.into_row(kind));
            if rows.len() >= limit {
                break;
            }
        }

        Ok(rows)
    }
}
