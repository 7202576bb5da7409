use serde::Serialize;

use crate::filters::FilterSet;
use crate::stats::Statistics;

/// Which entity stream a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Student,
    Faculty,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Student => "Student Report",
            ReportKind::Faculty => "Faculty Report",
        }
    }

    pub fn total_label(&self) -> &'static str {
        match self {
            ReportKind::Student => "Total Students",
            ReportKind::Faculty => "Total Faculty",
        }
    }

    /// Noun used in the success message, e.g. "12 students".
    pub fn subject_noun(&self) -> &'static str {
        match self {
            ReportKind::Student => "students",
            ReportKind::Faculty => "faculty members",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Student => write!(f, "student"),
            ReportKind::Faculty => write!(f, "faculty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    /// Parses the `format` query value. Anything other than the two known
    /// values means "no export", matching how filters degrade.
    pub fn from_query(raw: &str) -> Option<Self> {
        match raw {
            "pdf" => Some(ExportFormat::Pdf),
            "excel" => Some(ExportFormat::Excel),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(ExportFormat::Pdf),
            "xlsx" => Some(ExportFormat::Excel),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Label used in the success message ("PDF report generated ...").
    pub fn upper_label(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Excel => "EXCEL",
        }
    }
}

/// One denormalized student or faculty record as handed over by a row
/// source. Display labels are already resolved: a missing relation comes
/// through as `"Unknown"` and a missing personal field as `"N/A"`, so the
/// aggregation and rendering layers never see empty labels. Fields that do
/// not apply to the record's kind are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub id: i64,
    /// Student number or employee number.
    pub reference: String,
    pub name: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    pub contact: String,
}

/// Coerces a raw salary value (the upstream store keeps decimals as
/// strings) into a number. Non-numeric input maps to `None`; the
/// positive-only rule lives in the aggregator, not here.
pub fn parse_salary(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// The full outcome of one report request: a capped row preview, the
/// statistics over the complete filtered set, the filters that were
/// actually applied, and the optional export outcome. Built fresh per
/// request, never persisted.
#[derive(Debug, Serialize)]
pub struct ReportResult {
    pub success: bool,
    pub data: ReportData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportData {
    pub rows: Vec<ReportRow>,
    pub statistics: Statistics,
    pub filters: FilterSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_strings_coerce_to_numbers() {
        assert_eq!(parse_salary("60000"), Some(60000.0));
        assert_eq!(parse_salary(" 45250.50 "), Some(45250.5));
        assert_eq!(parse_salary("-10"), Some(-10.0));
    }

    #[test]
    fn unparsable_salaries_are_dropped() {
        assert_eq!(parse_salary(""), None);
        assert_eq!(parse_salary("   "), None);
        assert_eq!(parse_salary("negotiable"), None);
        assert_eq!(parse_salary("NaN"), None);
    }

    #[test]
    fn format_parsing_matches_query_values() {
        assert_eq!(ExportFormat::from_query("pdf"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::from_query("excel"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::from_query("csv"), None);
        assert_eq!(ExportFormat::from_query(""), None);
    }
}
