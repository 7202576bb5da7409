use std::collections::HashMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::models::{ReportKind, ReportRow};

/// A grouping axis for report statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Course,
    Department,
    AcademicYear,
    EmploymentType,
    Position,
}

impl Dimension {
    /// Key under `statistics` in the JSON payload.
    pub fn json_key(&self) -> &'static str {
        match self {
            Dimension::Course => "byCourse",
            Dimension::Department => "byDepartment",
            Dimension::AcademicYear => "byAcademicYear",
            Dimension::EmploymentType => "byEmploymentType",
            Dimension::Position => "byPosition",
        }
    }

    /// Key naming the label inside each bucket entry.
    pub fn entry_key(&self) -> &'static str {
        match self {
            Dimension::Course => "course",
            Dimension::Department => "department",
            Dimension::AcademicYear => "year",
            Dimension::EmploymentType => "type",
            Dimension::Position => "position",
        }
    }

    /// Section heading in the PDF and sheet name in the workbook.
    pub fn title(&self) -> &'static str {
        match self {
            Dimension::Course => "By Course",
            Dimension::Department => "By Department",
            Dimension::AcademicYear => "By Academic Year",
            Dimension::EmploymentType => "By Employment Type",
            Dimension::Position => "By Position",
        }
    }

    /// Column header for the label column in the workbook sheet.
    pub fn sheet_header(&self) -> &'static str {
        match self {
            Dimension::Course => "Course Code",
            Dimension::Department => "Department",
            Dimension::AcademicYear => "Academic Year",
            Dimension::EmploymentType => "Type",
            Dimension::Position => "Position",
        }
    }

    /// The row's resolved label for this dimension. Rows where the
    /// dimension does not apply fall into the `"Unknown"` bucket, so every
    /// row lands in exactly one bucket per dimension.
    pub fn label<'a>(&self, row: &'a ReportRow) -> &'a str {
        let value = match self {
            Dimension::Course => row.course.as_deref(),
            Dimension::Department => Some(row.department.as_str()),
            Dimension::AcademicYear => row.academic_year.as_deref(),
            Dimension::EmploymentType => row.employment_type.as_deref(),
            Dimension::Position => row.position.as_deref(),
        };
        value.unwrap_or("Unknown")
    }
}

fn dimensions_for(kind: ReportKind) -> &'static [Dimension] {
    match kind {
        ReportKind::Student => &[
            Dimension::Course,
            Dimension::Department,
            Dimension::AcademicYear,
        ],
        ReportKind::Faculty => &[
            Dimension::Department,
            Dimension::EmploymentType,
            Dimension::Position,
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionBuckets {
    pub dimension: Dimension,
    pub entries: Vec<BucketEntry>,
}

/// Grouped statistics over one fully filtered row set. The single source
/// for the JSON preview and both document renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total: usize,
    pub buckets: Vec<DimensionBuckets>,
    /// Faculty only. Average over rows with a positive numeric salary;
    /// `0.0` when no row contributes.
    pub average_salary: Option<f64>,
}

impl Statistics {
    /// The integer value surfaced as `averageSalary` in the JSON payload.
    pub fn average_salary_rounded(&self) -> Option<i64> {
        self.average_salary.map(|avg| avg.round() as i64)
    }
}

/// Groups the rows along every dimension of the report kind and, for
/// faculty, computes the salary average. Statistics always cover the whole
/// filtered set, never the preview slice.
pub fn aggregate(kind: ReportKind, rows: &[ReportRow]) -> Statistics {
    let buckets = dimensions_for(kind)
        .iter()
        .map(|&dimension| DimensionBuckets {
            dimension,
            entries: group_by_dimension(rows, dimension),
        })
        .collect();

    Statistics {
        total: rows.len(),
        buckets,
        average_salary: match kind {
            ReportKind::Student => None,
            ReportKind::Faculty => Some(average_salary(rows)),
        },
    }
}

/// Counts rows per resolved label. Buckets keep first-seen order so that
/// identical input always serializes identically.
pub fn group_by_dimension(rows: &[ReportRow], dimension: Dimension) -> Vec<BucketEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let label = dimension.label(row);
        if !counts.contains_key(label) {
            order.push(label.to_string());
        }
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }

    order
        .into_iter()
        .map(|label| {
            let count = counts[&label];
            BucketEntry { label, count }
        })
        .collect()
}

/// Salary rows that are missing, non-numeric, or not positive contribute
/// neither to the sum nor to the divisor.
fn average_salary(rows: &[ReportRow]) -> f64 {
    let mut total = 0.0;
    let mut contributing = 0usize;

    for row in rows {
        if let Some(salary) = row.salary {
            if salary > 0.0 {
                total += salary;
                contributing += 1;
            }
        }
    }

    if contributing == 0 {
        0.0
    } else {
        total / contributing as f64
    }
}

// The wire shape is the one the original frontend consumes: `total`, one
// `byXxx` array per dimension whose entries key the label by the dimension
// name, and a rounded `averageSalary`.
impl Serialize for Statistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + self.buckets.len() + usize::from(self.average_salary.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("total", &self.total)?;
        for bucket in &self.buckets {
            map.serialize_entry(bucket.dimension.json_key(), &WireEntries(bucket))?;
        }
        if let Some(avg) = self.average_salary_rounded() {
            map.serialize_entry("averageSalary", &avg)?;
        }
        map.end()
    }
}

struct WireEntries<'a>(&'a DimensionBuckets);

impl Serialize for WireEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.entries.iter().map(|entry| WireEntry {
            key: self.0.dimension.entry_key(),
            entry,
        }))
    }
}

struct WireEntry<'a> {
    key: &'static str,
    entry: &'a BucketEntry,
}

impl Serialize for WireEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.key, &self.entry.label)?;
        map.serialize_entry("count", &self.entry.count)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, course: &str, department: &str, year: &str) -> ReportRow {
        ReportRow {
            id,
            reference: format!("STU-{id:04}"),
            name: "Sample Student".to_string(),
            department: department.to_string(),
            course: Some(course.to_string()),
            academic_year: Some(year.to_string()),
            position: None,
            employment_type: None,
            salary: None,
            contact: "N/A".to_string(),
        }
    }

    fn faculty(id: i64, salary: Option<f64>) -> ReportRow {
        ReportRow {
            id,
            reference: format!("EMP-{id:04}"),
            name: "Sample Faculty".to_string(),
            department: "Engineering".to_string(),
            course: None,
            academic_year: None,
            position: Some("Instructor".to_string()),
            employment_type: Some("Full-time".to_string()),
            salary,
            contact: "N/A".to_string(),
        }
    }

    #[test]
    fn bucket_counts_cover_every_row() {
        let rows = vec![
            student(1, "BSIT", "CS", "2024-2025"),
            student(2, "BSCS", "CS", "2024-2025"),
            student(3, "BSIT", "Engineering", "2023-2024"),
        ];
        let stats = aggregate(ReportKind::Student, &rows);
        assert_eq!(stats.total, 3);
        for bucket in &stats.buckets {
            let summed: usize = bucket.entries.iter().map(|entry| entry.count).sum();
            assert_eq!(summed, rows.len());
        }
    }

    #[test]
    fn missing_labels_group_under_unknown() {
        let mut no_course = student(7, "BSIT", "CS", "2024-2025");
        no_course.course = None;
        let rows = vec![no_course, student(8, "BSIT", "CS", "2024-2025")];

        let entries = group_by_dimension(&rows, Dimension::Course);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "Unknown");
        assert_eq!(entries[0].count, 1);
        assert_eq!(entries[1].label, "BSIT");
    }

    #[test]
    fn buckets_keep_first_seen_order() {
        let rows = vec![
            student(1, "BSCE", "Engineering", "2024-2025"),
            student(2, "BSIT", "CS", "2024-2025"),
            student(3, "BSCE", "Engineering", "2024-2025"),
        ];
        let entries = group_by_dimension(&rows, Dimension::Course);
        assert_eq!(entries[0].label, "BSCE");
        assert_eq!(entries[0].count, 2);
        assert_eq!(entries[1].label, "BSIT");
        assert_eq!(entries[1].count, 1);
    }

    #[test]
    fn average_salary_skips_non_positive_and_missing() {
        let rows = vec![
            faculty(1, Some(50000.0)),
            faculty(2, crate::models::parse_salary("60000")),
            faculty(3, Some(0.0)),
            faculty(4, None),
            faculty(5, Some(-10.0)),
        ];
        let stats = aggregate(ReportKind::Faculty, &rows);
        assert_eq!(stats.average_salary, Some(55000.0));
        assert_eq!(stats.average_salary_rounded(), Some(55000));
    }

    #[test]
    fn average_salary_is_zero_without_contributors() {
        let rows = vec![faculty(1, None), faculty(2, Some(0.0))];
        let stats = aggregate(ReportKind::Faculty, &rows);
        assert_eq!(stats.average_salary, Some(0.0));
    }

    #[test]
    fn statistics_serialize_to_the_wire_shape() {
        let rows = vec![
            student(1, "BSIT", "CS", "2024-2025"),
            student(2, "BSCS", "CS", "2024-2025"),
        ];
        let stats = aggregate(ReportKind::Student, &rows);
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["total"], 2);
        assert_eq!(value["byCourse"][0]["course"], "BSIT");
        assert_eq!(value["byCourse"][0]["count"], 1);
        assert_eq!(value["byDepartment"][0]["department"], "CS");
        assert_eq!(value["byDepartment"][0]["count"], 2);
        assert_eq!(value["byAcademicYear"][0]["year"], "2024-2025");
        assert!(value.get("averageSalary").is_none());
    }

    #[test]
    fn faculty_statistics_round_average_salary_in_json() {
        let rows = vec![faculty(1, Some(50000.0)), faculty(2, Some(60001.0))];
        let stats = aggregate(ReportKind::Faculty, &rows);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["averageSalary"], 55001);
        assert_eq!(value["byEmploymentType"][0]["type"], "Full-time");
        assert_eq!(value["byPosition"][0]["position"], "Instructor");
    }
}
