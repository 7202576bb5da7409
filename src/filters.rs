use serde::Serialize;

use crate::models::{ReportKind, ReportRow};
use crate::source::NativeFilter;

/// Raw, query-style filter input exactly as it arrives from the outside
/// (HTTP query string or CLI flags). Everything is an optional string at
/// this point.
#[derive(Debug, Clone, Default)]
pub struct RawReportQuery {
    pub department_id: Option<String>,
    pub course_id: Option<String>,
    pub academic_year: Option<String>,
    pub employment_type: Option<String>,
}

/// Canonical filter object. Absent means "no restriction on that
/// dimension"; bad input never survives normalization as a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
}

/// Parses and coerces raw filter input. Integer filters that fail to parse
/// and empty strings degrade to "no restriction"; the literal employment
/// type `"all"` is equivalent to absent. Never fails.
pub fn normalize(raw: &RawReportQuery) -> FilterSet {
    FilterSet {
        department_id: parse_id(raw.department_id.as_deref()),
        course_id: parse_id(raw.course_id.as_deref()),
        academic_year: non_empty(raw.academic_year.as_deref()),
        employment_type: non_empty(raw.employment_type.as_deref())
            .filter(|value| value != "all"),
    }
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

impl FilterSet {
    /// The subset of filters the row source can apply natively: department
    /// and course for students, department only for faculty.
    pub fn native_subset(&self, kind: ReportKind) -> NativeFilter {
        NativeFilter {
            department_id: self.department_id,
            course_id: match kind {
                ReportKind::Student => self.course_id,
                ReportKind::Faculty => None,
            },
        }
    }

    /// Active filters as `(label, value)` pairs for summary sections in the
    /// rendered documents.
    pub fn active_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(id) = self.department_id {
            entries.push(("Department ID", id.to_string()));
        }
        if let Some(id) = self.course_id {
            entries.push(("Course ID", id.to_string()));
        }
        if let Some(year) = &self.academic_year {
            entries.push(("Academic Year", year.clone()));
        }
        if let Some(employment) = &self.employment_type {
            entries.push(("Employment Type", employment.clone()));
        }
        entries
    }
}

/// Applies the filters the row source cannot express: a substring match on
/// the resolved academic-year label for students (so `"2024"` matches
/// `"2024-2025"`), and an exact employment-type match for faculty.
pub fn apply_post_fetch(
    kind: ReportKind,
    mut rows: Vec<ReportRow>,
    filters: &FilterSet,
) -> Vec<ReportRow> {
    match kind {
        ReportKind::Student => {
            if let Some(year) = &filters.academic_year {
                rows.retain(|row| {
                    row.academic_year
                        .as_deref()
                        .is_some_and(|label| label.contains(year.as_str()))
                });
            }
        }
        ReportKind::Faculty => {
            if let Some(employment) = &filters.employment_type {
                rows.retain(|row| row.employment_type.as_deref() == Some(employment.as_str()));
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_row(id: i64, year: &str) -> ReportRow {
        ReportRow {
            id,
            reference: format!("STU-{id:04}"),
            name: "Avery Lee".to_string(),
            department: "Computer Studies".to_string(),
            course: Some("BSIT".to_string()),
            academic_year: Some(year.to_string()),
            position: None,
            employment_type: None,
            salary: None,
            contact: "N/A".to_string(),
        }
    }

    fn faculty_row(id: i64, employment: &str) -> ReportRow {
        ReportRow {
            id,
            reference: format!("EMP-{id:04}"),
            name: "Jules Moreno".to_string(),
            department: "Engineering".to_string(),
            course: None,
            academic_year: None,
            position: Some("Instructor".to_string()),
            employment_type: Some(employment.to_string()),
            salary: None,
            contact: "N/A".to_string(),
        }
    }

    #[test]
    fn unparsable_ids_degrade_to_no_restriction() {
        let raw = RawReportQuery {
            department_id: Some("abc".to_string()),
            course_id: Some("".to_string()),
            ..RawReportQuery::default()
        };
        let filters = normalize(&raw);
        assert_eq!(filters.department_id, None);
        assert_eq!(filters.course_id, None);
    }

    #[test]
    fn valid_ids_parse_through() {
        let raw = RawReportQuery {
            department_id: Some(" 4 ".to_string()),
            course_id: Some("12".to_string()),
            ..RawReportQuery::default()
        };
        let filters = normalize(&raw);
        assert_eq!(filters.department_id, Some(4));
        assert_eq!(filters.course_id, Some(12));
    }

    #[test]
    fn all_employment_type_means_absent() {
        let raw = RawReportQuery {
            employment_type: Some("all".to_string()),
            ..RawReportQuery::default()
        };
        assert_eq!(normalize(&raw).employment_type, None);

        let raw = RawReportQuery {
            employment_type: Some("Full-time".to_string()),
            ..RawReportQuery::default()
        };
        assert_eq!(
            normalize(&raw).employment_type,
            Some("Full-time".to_string())
        );
    }

    #[test]
    fn academic_year_filter_is_substring_based() {
        let filters = FilterSet {
            academic_year: Some("2024".to_string()),
            ..FilterSet::default()
        };
        let rows = vec![student_row(1, "2024-2025"), student_row(2, "2023-2024")];
        let kept = apply_post_fetch(ReportKind::Student, rows, &filters);
        assert_eq!(kept.len(), 2);

        let filters = FilterSet {
            academic_year: Some("2026".to_string()),
            ..FilterSet::default()
        };
        let rows = vec![student_row(1, "2024-2025")];
        let kept = apply_post_fetch(ReportKind::Student, rows, &filters);
        assert!(kept.is_empty());
    }

    #[test]
    fn employment_type_filter_is_exact() {
        let filters = FilterSet {
            employment_type: Some("Full-time".to_string()),
            ..FilterSet::default()
        };
        let rows = vec![
            faculty_row(1, "Full-time"),
            faculty_row(2, "Part-time"),
            faculty_row(3, "Full-time"),
        ];
        let kept = apply_post_fetch(ReportKind::Faculty, rows, &filters);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn faculty_native_subset_drops_course() {
        let filters = FilterSet {
            department_id: Some(2),
            course_id: Some(9),
            ..FilterSet::default()
        };
        let native = filters.native_subset(ReportKind::Faculty);
        assert_eq!(native.department_id, Some(2));
        assert_eq!(native.course_id, None);

        let native = filters.native_subset(ReportKind::Student);
        assert_eq!(native.course_id, Some(9));
    }
}
