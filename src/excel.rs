use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::filters::FilterSet;
use crate::models::{ReportKind, ReportRow};
use crate::stats::Statistics;

const STUDENT_DETAIL_COLUMNS: [(&str, f64); 7] = [
    ("ID", 10.0),
    ("Student ID", 15.0),
    ("Name", 25.0),
    ("Course Code", 15.0),
    ("Department", 20.0),
    ("Academic Year", 15.0),
    ("Contact", 15.0),
];

const FACULTY_DETAIL_COLUMNS: [(&str, f64); 7] = [
    ("ID", 10.0),
    ("Employee ID", 15.0),
    ("Name", 25.0),
    ("Department", 20.0),
    ("Position", 20.0),
    ("Employment Type", 15.0),
    ("Salary", 15.0),
];

const SUMMARY_COLUMNS: [(&str, f64); 2] = [("Metric", 30.0), ("Value", 20.0)];

/// Builds the complete workbook export: a detail sheet with every filtered
/// row (this renderer is the uncapped counterpart to the PDF's preview
/// table), a summary sheet, and one sheet per populated dimension.
pub fn render(
    kind: ReportKind,
    rows: &[ReportRow],
    statistics: &Statistics,
    filters: &FilterSet,
) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let detail = workbook.add_worksheet();
    write_detail_sheet(detail, kind, rows, &bold)?;

    let summary = workbook.add_worksheet();
    write_summary_sheet(summary, kind, statistics, filters, &bold)?;

    for bucket in &statistics.buckets {
        if bucket.entries.is_empty() {
            continue;
        }
        let sheet = workbook.add_worksheet();
        sheet.set_name(bucket.dimension.title())?;
        write_headers(
            sheet,
            &[(bucket.dimension.sheet_header(), 30.0), ("Count", 15.0)],
            &bold,
        )?;
        for (index, entry) in bucket.entries.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_string(row, 0, entry.label.as_str())?;
            sheet.write_number(row, 1, entry.count as f64)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_detail_sheet(
    sheet: &mut Worksheet,
    kind: ReportKind,
    rows: &[ReportRow],
    bold: &Format,
) -> Result<(), XlsxError> {
    let columns = match kind {
        ReportKind::Student => {
            sheet.set_name("Students")?;
            &STUDENT_DETAIL_COLUMNS
        }
        ReportKind::Faculty => {
            sheet.set_name("Faculty")?;
            &FACULTY_DETAIL_COLUMNS
        }
    };
    write_headers(sheet, columns, bold)?;

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        sheet.write_number(r, 0, row.id as f64)?;
        sheet.write_string(r, 1, row.reference.as_str())?;
        sheet.write_string(r, 2, row.name.as_str())?;
        match kind {
            ReportKind::Student => {
                sheet.write_string(r, 3, row.course.as_deref().unwrap_or(""))?;
                sheet.write_string(r, 4, row.department.as_str())?;
                sheet.write_string(r, 5, row.academic_year.as_deref().unwrap_or(""))?;
                sheet.write_string(r, 6, row.contact.as_str())?;
            }
            ReportKind::Faculty => {
                sheet.write_string(r, 3, row.department.as_str())?;
                sheet.write_string(r, 4, row.position.as_deref().unwrap_or(""))?;
                sheet.write_string(r, 5, row.employment_type.as_deref().unwrap_or(""))?;
                if let Some(salary) = row.salary {
                    sheet.write_number(r, 6, salary)?;
                }
            }
        }
    }

    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    kind: ReportKind,
    statistics: &Statistics,
    filters: &FilterSet,
    bold: &Format,
) -> Result<(), XlsxError> {
    sheet.set_name("Summary")?;
    write_headers(sheet, &SUMMARY_COLUMNS, bold)?;

    let mut r = 1u32;
    sheet.write_string(r, 0, kind.total_label())?;
    sheet.write_number(r, 1, statistics.total as f64)?;
    r += 1;

    if let Some(average) = statistics.average_salary {
        sheet.write_string(r, 0, "Average Salary")?;
        sheet.write_number(r, 1, average)?;
        r += 1;
    }

    sheet.write_string(r, 0, "Report Generated")?;
    sheet.write_string(r, 1, Local::now().format("%Y-%m-%d %H:%M:%S").to_string())?;
    r += 1;

    for (label, value) in filters.active_entries() {
        sheet.write_string(r, 0, label)?;
        sheet.write_string(r, 1, value)?;
        r += 1;
    }

    Ok(())
}

fn write_headers(
    sheet: &mut Worksheet,
    columns: &[(&str, f64)],
    bold: &Format,
) -> Result<(), XlsxError> {
    for (index, (header, width)) in columns.iter().enumerate() {
        let col = index as u16;
        sheet.set_column_width(col, *width)?;
        sheet.write_string_with_format(0, col, *header, bold)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;

    fn faculty(id: i64, salary: Option<f64>) -> ReportRow {
        ReportRow {
            id,
            reference: format!("EMP-{id:04}"),
            name: format!("Faculty {id}"),
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
    fn renders_a_workbook_with_every_row() {
        let rows: Vec<ReportRow> = (1..=30)
            .map(|id| faculty(id, Some(40000.0 + id as f64)))
            .collect();
        let statistics = stats::aggregate(ReportKind::Faculty, &rows);
        let filters = FilterSet {
            employment_type: Some("Full-time".to_string()),
            ..FilterSet::default()
        };

        let bytes = render(ReportKind::Faculty, &rows, &statistics, &filters).unwrap();
        // xlsx is a zip container
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn tolerates_missing_salaries_and_empty_row_sets() {
        let rows = vec![faculty(1, None)];
        let statistics = stats::aggregate(ReportKind::Faculty, &rows);
        let bytes = render(ReportKind::Faculty, &rows, &statistics, &FilterSet::default());
        assert!(bytes.is_ok());

        let statistics = stats::aggregate(ReportKind::Student, &[]);
        let bytes = render(ReportKind::Student, &[], &statistics, &FilterSet::default());
        assert!(bytes.is_ok());
    }
}
