use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::workflow::ResultStatus;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login lookup row; kept apart from `UserRow` so the hash never leaves the auth path.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentialsRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FacultyRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub dean_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DepartmentRow {
    pub id: Uuid,
    pub faculty_id: Uuid,
    pub code: String,
    pub name: String,
    pub hod_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff record joined with its user account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StaffRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub staff_number: String,
    pub designation: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student record joined with its user account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub matric_number: String,
    pub level: i32,
    pub entry_year: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseRow {
    pub id: Uuid,
    pub department_id: Uuid,
    pub code: String,
    pub title: String,
    pub units: i32,
    pub level: i32,
    pub semester: String,
    pub lecturer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub session: String,
    pub ca_score: i32,
    pub exam_score: i32,
    pub total_score: i32,
    pub grade: String,
    pub status: ResultStatus,
    pub uploaded_by: Uuid,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A result together with the ownership chain used for permission checks:
/// course lecturer, department HOD and faculty dean.
#[derive(Debug, Clone, FromRow)]
pub struct ResultScopeRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub session: String,
    pub status: ResultStatus,
    pub lecturer_id: Option<Uuid>,
    pub department_id: Uuid,
    pub hod_id: Option<Uuid>,
    pub faculty_id: Uuid,
    pub dean_id: Option<Uuid>,
}

/// A published result with the course facts a transcript needs.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TranscriptLineRow {
    pub result_id: Uuid,
    pub course_id: Uuid,
    pub course_code: String,
    pub course_title: String,
    pub units: i32,
    pub semester: String,
    pub session: String,
    pub ca_score: i32,
    pub exam_score: i32,
    pub total_score: i32,
    pub grade: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "edit_request_status", rename_all = "snake_case")]
pub enum EditRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl EditRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditRequestStatus::Pending => "pending",
            EditRequestStatus::Approved => "approved",
            EditRequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EditRequestRow {
    pub id: Uuid,
    pub result_id: Uuid,
    pub requested_by: Uuid,
    pub reason: String,
    pub proposed_ca_score: i32,
    pub proposed_exam_score: i32,
    pub status: EditRequestStatus,
    pub reviewer_role: String,
    pub reviewed_by: Option<Uuid>,
    pub review_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_role: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
