use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, Enum, InputObject, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::service::grade_points;
use crate::gql::loaders::{CourseLoader, StudentLoader};
use crate::gql::types::{Course, ResultStatus, Semester, Student};
use infra::models::{ResultRow, TranscriptLineRow};
use infra::workflow;

/// One student's scores for one course in one session.
#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct CourseResult {
    pub id: ID,
    pub student_id: ID,
    pub course_id: ID,
    pub session: String,
    pub ca_score: i32,
    pub exam_score: i32,
    pub total_score: i32,
    pub grade: String,
    pub status: ResultStatus,
    pub uploaded_by: ID,
    /// Set by the last rejecting approver; cleared on resubmission.
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResultRow> for CourseResult {
    fn from(row: ResultRow) -> Self {
        Self {
            id: row.id.into(),
            student_id: row.student_id.into(),
            course_id: row.course_id.into(),
            session: row.session,
            ca_score: row.ca_score,
            exam_score: row.exam_score,
            total_score: row.total_score,
            grade: row.grade,
            status: row.status.into(),
            uploaded_by: row.uploaded_by.into(),
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[ComplexObject]
impl CourseResult {
    async fn student(&self, ctx: &Context<'_>) -> Result<Student> {
        let student_id = Uuid::parse_str(self.student_id.as_str())?;
        let loader = ctx.data::<DataLoader<StudentLoader>>()?;

        match loader
            .load_one(student_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(async_graphql::Error::new("Student not found")),
        }
    }

    async fn course(&self, ctx: &Context<'_>) -> Result<Course> {
        let course_id = Uuid::parse_str(self.course_id.as_str())?;
        let loader = ctx.data::<DataLoader<CourseLoader>>()?;

        match loader
            .load_one(course_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(async_graphql::Error::new("Course not found")),
        }
    }

    /// Whether the lecturer may still change the scores directly.
    async fn editable(&self) -> bool {
        workflow::is_editable(self.status.into())
    }
}

#[derive(InputObject, Clone, Debug)]
pub struct ResultEntryInput {
    pub student_id: Uuid,
    pub ca_score: i32,
    pub exam_score: i32,
}

/// Pushed on `resultStatusChanged` whenever a result moves in the workflow.
#[derive(SimpleObject, Clone, Debug)]
pub struct ResultStatusEvent {
    pub result_id: ID,
    pub course_id: ID,
    pub session: String,
    /// Empty when the result was just created.
    pub previous_status: Option<ResultStatus>,
    pub status: ResultStatus,
    pub actor_id: ID,
    pub changed_at: DateTime<Utc>,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum DegreeClass {
    FirstClass,
    SecondClassUpper,
    SecondClassLower,
    ThirdClass,
    Pass,
    Fail,
}

impl From<infra::grading::DegreeClass> for DegreeClass {
    fn from(class: infra::grading::DegreeClass) -> Self {
        use infra::grading::DegreeClass as D;
        match class {
            D::FirstClass => DegreeClass::FirstClass,
            D::SecondClassUpper => DegreeClass::SecondClassUpper,
            D::SecondClassLower => DegreeClass::SecondClassLower,
            D::ThirdClass => DegreeClass::ThirdClass,
            D::Pass => DegreeClass::Pass,
            D::Fail => DegreeClass::Fail,
        }
    }
}

/// A published result as it appears on a transcript.
#[derive(SimpleObject, Clone, Debug)]
pub struct TranscriptLine {
    pub result_id: ID,
    pub course_id: ID,
    pub course_code: String,
    pub course_title: String,
    pub units: i32,
    pub semester: Semester,
    pub session: String,
    pub ca_score: i32,
    pub exam_score: i32,
    pub total_score: i32,
    pub grade: String,
    pub grade_points: i32,
}

impl From<TranscriptLineRow> for TranscriptLine {
    fn from(row: TranscriptLineRow) -> Self {
        let grade_points = grade_points(&row.grade);

        Self {
            result_id: row.result_id.into(),
            course_id: row.course_id.into(),
            course_code: row.course_code,
            course_title: row.course_title,
            units: row.units,
            semester: Semester::from(row.semester),
            session: row.session,
            ca_score: row.ca_score,
            exam_score: row.exam_score,
            total_score: row.total_score,
            grade: row.grade,
            grade_points,
        }
    }
}

#[derive(SimpleObject, Clone, Debug, PartialEq)]
pub struct SessionGpa {
    pub session: String,
    pub units: i32,
    pub gpa: f64,
}

/// A student's published results with their grade point averages.
#[derive(SimpleObject, Clone, Debug)]
pub struct StudentResults {
    pub student: Student,
    /// Results of the requested session, or all of them.
    pub results: Vec<TranscriptLine>,
    pub sessions: Vec<SessionGpa>,
    /// GPA over `results`
    pub gpa: f64,
    /// Cumulative over every published result
    pub cgpa: f64,
    pub total_units: i32,
    pub degree_class: DegreeClass,
}
