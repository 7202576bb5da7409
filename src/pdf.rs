use chrono::Local;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use crate::filters::FilterSet;
use crate::models::{ReportKind, ReportRow};
use crate::stats::Statistics;

/// The detail table is a capped preview. Callers that need every row use
/// the spreadsheet export or `statistics.total`.
pub const DETAIL_ROW_CAP: usize = 15;

const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const LEFT_MARGIN: f64 = 14.0;
const RIGHT_EDGE: f64 = 196.0;
const TOP_Y: f64 = 280.0;
const BOTTOM_MARGIN: f64 = 16.0;

struct Column {
    header: &'static str,
    x: f64,
    /// Cell text is clipped to this many characters to fit the fixed column.
    max_chars: usize,
}

const STUDENT_COLUMNS: [Column; 5] = [
    Column { header: "ID", x: 14.0, max_chars: 8 },
    Column { header: "Name", x: 36.0, max_chars: 12 },
    Column { header: "Department", x: 68.0, max_chars: 16 },
    Column { header: "Course", x: 110.0, max_chars: 16 },
    Column { header: "Year", x: 152.0, max_chars: 10 },
];

const FACULTY_COLUMNS: [Column; 5] = [
    Column { header: "ID", x: 14.0, max_chars: 8 },
    Column { header: "Name", x: 34.0, max_chars: 11 },
    Column { header: "Department", x: 64.0, max_chars: 16 },
    Column { header: "Position", x: 106.0, max_chars: 18 },
    Column { header: "Type", x: 152.0, max_chars: 10 },
];

/// Renders the fixed-structure report document: title, generation
/// timestamp, active filters, summary statistics, one subsection per
/// populated dimension, then the capped detail table. Content that
/// overflows a page continues on a fresh one.
pub fn render(
    kind: ReportKind,
    rows: &[ReportRow],
    statistics: &Statistics,
    filters: &FilterSet,
) -> anyhow::Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(kind.title(), Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "content");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    {
        let mut writer = PageWriter::new(&doc, doc.get_page(page).get_layer(layer));

        writer.text(kind.title(), &bold, 18.0, 60.0, 10.0);
        writer.text(
            &format!(
                "Report Generated: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
            &regular,
            10.0,
            0.0,
            5.0,
        );
        for (label, value) in filters.active_entries() {
            writer.text(&format!("{label}: {value}"), &regular, 10.0, 0.0, 5.0);
        }
        writer.gap(4.0);

        writer.text("Summary Statistics", &bold, 12.0, 0.0, 6.0);
        writer.text(
            &format!("{}: {}", kind.total_label(), statistics.total),
            &regular,
            10.0,
            0.0,
            5.0,
        );
        if let Some(average) = statistics.average_salary {
            writer.text(
                &format!("Average Salary: {average:.2}"),
                &regular,
                10.0,
                0.0,
                5.0,
            );
        }
        writer.gap(4.0);

        for bucket in &statistics.buckets {
            if bucket.entries.is_empty() {
                continue;
            }
            writer.text(
                &format!("{}:", bucket.dimension.title()),
                &bold,
                11.0,
                0.0,
                5.5,
            );
            for entry in &bucket.entries {
                writer.text(
                    &format!("{}: {}", entry.label, entry.count),
                    &regular,
                    10.0,
                    4.0,
                    5.0,
                );
            }
            writer.gap(3.0);
        }

        if !rows.is_empty() {
            let columns = columns_for(kind);
            writer.text(detail_title(kind), &bold, 12.0, 0.0, 7.0);

            let header_cells: Vec<(f64, String)> = columns
                .iter()
                .map(|column| (column.x, column.header.to_string()))
                .collect();
            writer.cells(&header_cells, &bold, 9.0, 3.0);
            writer.rule();

            for row in detail_slice(rows) {
                let cells = row_cells(kind, row, columns);
                writer.cells(&cells, &regular, 7.0, 4.5);
            }
        }
    }

    Ok(doc.save_to_bytes()?)
}

/// The slice of rows that appears in the detail table.
pub fn detail_slice(rows: &[ReportRow]) -> &[ReportRow] {
    &rows[..rows.len().min(DETAIL_ROW_CAP)]
}

fn columns_for(kind: ReportKind) -> &'static [Column; 5] {
    match kind {
        ReportKind::Student => &STUDENT_COLUMNS,
        ReportKind::Faculty => &FACULTY_COLUMNS,
    }
}

fn detail_title(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Student => "Student Details",
        ReportKind::Faculty => "Faculty Details",
    }
}

fn row_cells(kind: ReportKind, row: &ReportRow, columns: &[Column; 5]) -> Vec<(f64, String)> {
    let values = match kind {
        ReportKind::Student => [
            row.id.to_string(),
            row.name.clone(),
            row.department.clone(),
            row.course.clone().unwrap_or_default(),
            row.academic_year.clone().unwrap_or_default(),
        ],
        ReportKind::Faculty => [
            row.id.to_string(),
            row.name.clone(),
            row.department.clone(),
            row.position.clone().unwrap_or_default(),
            row.employment_type.clone().unwrap_or_default(),
        ],
    };

    columns
        .iter()
        .zip(values)
        .map(|(column, value)| (column.x, clip(&value, column.max_chars)))
        .collect()
}

/// Clips text to a column's character limit. Short or empty input passes
/// through untouched.
fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Cursor over the current page; starts a fresh page when the next write
/// would cross the bottom margin.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f64,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self { doc, layer, y: TOP_Y }
    }

    fn break_page_if_needed(&mut self, advance: f64) {
        if self.y - advance < BOTTOM_MARGIN {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_Y;
        }
    }

    fn text(&mut self, text: &str, font: &IndirectFontRef, size: f64, indent: f64, advance: f64) {
        self.break_page_if_needed(advance);
        self.layer
            .use_text(text, size as f32, Mm((LEFT_MARGIN + indent) as f32), Mm(self.y as f32), font);
        self.y -= advance;
    }

    fn cells(&mut self, cells: &[(f64, String)], font: &IndirectFontRef, size: f64, advance: f64) {
        self.break_page_if_needed(advance);
        for (x, text) in cells {
            self.layer
                .use_text(text.as_str(), size as f32, Mm(*x as f32), Mm(self.y as f32), font);
        }
        self.y -= advance;
    }

    fn rule(&mut self) {
        let line = Line {
            points: vec![
                (Point::new(Mm(LEFT_MARGIN as f32), Mm(self.y as f32)), false),
                (Point::new(Mm(RIGHT_EDGE as f32), Mm(self.y as f32)), false),
            ],
            is_closed: false,
        };
        self.layer.set_outline_thickness(0.4);
        self.layer.add_line(line);
        self.y -= 4.0;
    }

    fn gap(&mut self, space: f64) {
        self.y -= space;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;

    fn student(id: i64) -> ReportRow {
        ReportRow {
            id,
            reference: format!("STU-{id:04}"),
            name: format!("Student {id}"),
            department: "Computer Studies".to_string(),
            course: Some("BSIT".to_string()),
            academic_year: Some("2024-2025".to_string()),
            position: None,
            employment_type: None,
            salary: None,
            contact: "N/A".to_string(),
        }
    }

    #[test]
    fn detail_slice_never_exceeds_the_cap() {
        let rows: Vec<ReportRow> = (1..=40).map(student).collect();
        assert_eq!(detail_slice(&rows).len(), DETAIL_ROW_CAP);

        let few: Vec<ReportRow> = (1..=3).map(student).collect();
        assert_eq!(detail_slice(&few).len(), 3);
    }

    #[test]
    fn clip_tolerates_short_and_multibyte_text() {
        assert_eq!(clip("", 10), "");
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a department name", 6), "a depa");
        assert_eq!(clip("économétrie", 4), "écon");
    }

    #[test]
    fn renders_a_student_report_document() {
        let rows: Vec<ReportRow> = (1..=20).map(student).collect();
        let statistics = stats::aggregate(ReportKind::Student, &rows);
        let filters = FilterSet {
            department_id: Some(2),
            ..FilterSet::default()
        };

        let bytes = render(ReportKind::Student, &rows, &statistics, &filters).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_with_no_rows_at_all() {
        let statistics = stats::aggregate(ReportKind::Faculty, &[]);
        let bytes =
            render(ReportKind::Faculty, &[], &statistics, &FilterSet::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
