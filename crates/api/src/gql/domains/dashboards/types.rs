use async_graphql::SimpleObject;

use crate::gql::types::{AuditLogEntry, Course, DegreeClass, ResultStatus, Student};

#[derive(SimpleObject, Clone, Debug)]
pub struct StatusCount {
    pub status: ResultStatus,
    pub count: i32,
}

#[derive(SimpleObject)]
pub struct AdminDashboard {
    pub faculties: i32,
    pub departments: i32,
    pub courses: i32,
    pub staff: i32,
    pub students: i32,
    pub active_users: i32,
    /// Every status, including those with no results
    pub results_by_status: Vec<StatusCount>,
    pub recent_activity: Vec<AuditLogEntry>,
}

#[derive(SimpleObject)]
pub struct StaffDashboard {
    pub courses: Vec<Course>,
    /// Draft or rejected results on the caller's courses
    pub editable_results: i32,
    /// Zero for lecturers
    pub pending_approvals: i32,
    pub pending_edit_reviews: i32,
}

#[derive(SimpleObject)]
pub struct StudentDashboard {
    pub student: Student,
    pub published_courses: i32,
    pub total_units: i32,
    pub cgpa: f64,
    pub degree_class: DegreeClass,
}
