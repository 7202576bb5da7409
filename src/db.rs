use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::models::{parse_salary, ReportKind, ReportRow};
use crate::source::{NativeFilter, RowSource};

/// Row source backed by the school database. Labels are resolved in SQL so
/// the rest of the pipeline never touches foreign keys: a missing relation
/// comes back as `"Unknown"` and a missing personal field as `"N/A"`.
pub struct PgRowSource {
    pool: PgPool,
}

impl PgRowSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_students(
        &self,
        filter: &NativeFilter,
        limit: usize,
    ) -> anyhow::Result<Vec<ReportRow>> {
        let mut query = String::from(
            "SELECT s.id::bigint AS id, COALESCE(s.student_no, 'N/A') AS reference, \
             COALESCE(u.full_name, 'N/A') AS name, \
             COALESCE(d.name, 'Unknown') AS department, \
             COALESCE(c.code, 'Unknown') AS course, \
             COALESCE(y.name, 'Unknown') AS academic_year, \
             COALESCE(s.phone, 'N/A') AS contact \
             FROM students s \
             LEFT JOIN users u ON u.id = s.user_id \
             LEFT JOIN departments d ON d.id = s.department_id \
             LEFT JOIN courses c ON c.id = s.course_id \
             LEFT JOIN academic_years y ON y.id = s.academic_year_id \
             WHERE TRUE",
        );

        let mut bind_index = 0;
        if filter.department_id.is_some() {
            bind_index += 1;
            query.push_str(&format!(" AND s.department_id = ${bind_index}"));
        }
        if filter.course_id.is_some() {
            bind_index += 1;
            query.push_str(&format!(" AND s.course_id = ${bind_index}"));
        }
        query.push_str(&format!(" ORDER BY s.id LIMIT {limit}"));

        let mut rows = sqlx::query(&query);
        if let Some(department_id) = filter.department_id {
            rows = rows.bind(department_id);
        }
        if let Some(course_id) = filter.course_id {
            rows = rows.bind(course_id);
        }

        let records = rows.fetch_all(&self.pool).await?;
        let mut students = Vec::with_capacity(records.len());

        for row in records {
            students.push(ReportRow {
                id: row.get("id"),
                reference: row.get("reference"),
                name: row.get("name"),
                department: row.get("department"),
                course: Some(row.get("course")),
                academic_year: Some(row.get("academic_year")),
                position: None,
                employment_type: None,
                salary: None,
                contact: row.get("contact"),
            });
        }

        Ok(students)
    }

    async fn fetch_faculty(
        &self,
        filter: &NativeFilter,
        limit: usize,
    ) -> anyhow::Result<Vec<ReportRow>> {
        let mut query = String::from(
            "SELECT f.id::bigint AS id, COALESCE(f.employee_no, 'N/A') AS reference, \
             COALESCE(u.full_name, 'N/A') AS name, \
             COALESCE(d.name, 'Unknown') AS department, \
             COALESCE(f.position, 'Unknown') AS position, \
             COALESCE(f.employment_type, 'Unknown') AS employment_type, \
             f.salary::text AS salary, \
             COALESCE(f.phone, 'N/A') AS contact \
             FROM faculty f \
             LEFT JOIN users u ON u.id = f.user_id \
             LEFT JOIN departments d ON d.id = f.department_id \
             WHERE TRUE",
        );

        if filter.department_id.is_some() {
            query.push_str(" AND f.department_id = $1");
        }
        query.push_str(&format!(" ORDER BY f.id LIMIT {limit}"));

        let mut rows = sqlx::query(&query);
        if let Some(department_id) = filter.department_id {
            rows = rows.bind(department_id);
        }

        let records = rows.fetch_all(&self.pool).await?;
        let mut faculty = Vec::with_capacity(records.len());

        for row in records {
            let salary: Option<String> = row.get("salary");
            faculty.push(ReportRow {
                id: row.get("id"),
                reference: row.get("reference"),
                name: row.get("name"),
                department: row.get("department"),
                course: None,
                academic_year: None,
                position: Some(row.get("position")),
                employment_type: Some(row.get("employment_type")),
                salary: salary.as_deref().and_then(parse_salary),
                contact: row.get("contact"),
            });
        }

        Ok(faculty)
    }
}

#[async_trait]
impl RowSource for PgRowSource {
    async fn fetch_rows(
        &self,
        kind: ReportKind,
        filter: &NativeFilter,
        limit: usize,
    ) -> anyhow::Result<Vec<ReportRow>> {
        match kind {
            ReportKind::Student => self.fetch_students(filter, limit).await,
            ReportKind::Faculty => self.fetch_faculty(filter, limit).await,
        }
    }
}
