//! Report data handed to the capture pipeline by the schedule UI

use serde::{Deserialize, Serialize};

/// Fixed column labels of the captured table
pub const COLUMN_LABELS: [&str; 5] = ["Date", "Time", "Course", "Section", "Classroom"];

/// One exam sitting as displayed in the schedule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub date: String,
    pub time: String,
    pub course_code: String,
    pub section: String,
    pub classroom: String,
}

impl ReportRow {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        course_code: impl Into<String>,
        section: impl Into<String>,
        classroom: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            course_code: course_code.into(),
            section: section.into(),
            classroom: classroom.into(),
        }
    }

    /// Cell texts in column order
    pub fn cells(&self) -> [&str; 5] {
        [&self.date, &self.time, &self.course_code, &self.section, &self.classroom]
    }
}

/// Title plus ordered rows; built fresh for every capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>, rows: Vec<ReportRow>) -> Self {
        Self { title: title.into(), rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Exam naming metadata as stored alongside the schedule data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamMetadata {
    pub exam_name: Option<String>,
    pub semester: Option<String>,
    pub title: Option<String>,
}

impl ExamMetadata {
    /// `<exam name> <semester>` when both parts exist, else the legacy `title`.
    pub fn display_title(&self) -> Option<String> {
        let name = self.exam_name.as_deref().map(str::trim).unwrap_or_default();
        let semester = self.semester.as_deref().map(str::trim).unwrap_or_default();
        let combined = format!("{} {}", name, semester).trim().to_string();
        if !combined.is_empty() {
            return Some(combined);
        }
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// On-disk report input accepted by the command line tool
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: ExamMetadata,
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

impl ReportFile {
    /// Resolve the title (explicit, then metadata, then `fallback`) and build the document.
    pub fn into_document(self, fallback: &str) -> ReportDocument {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.metadata.display_title())
            .unwrap_or_else(|| fallback.to_string());
        ReportDocument::new(title, self.rows)
    }
}
