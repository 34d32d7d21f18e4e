pub mod audit_logs;
pub mod courses;
pub mod dashboard;
pub mod departments;
pub mod faculties;
pub mod result_edit_requests;
pub mod results;
pub mod staff;
pub mod students;
pub mod users;

pub use audit_logs::{AuditLogFilter, NewAuditEntry};
pub use courses::{CourseFilter, CreateCourseData, UpdateCourseData};
pub use dashboard::EntityCounts;
pub use departments::{CreateDepartmentData, UpdateDepartmentData};
pub use faculties::{CreateFacultyData, UpdateFacultyData};
pub use result_edit_requests::{CreateEditRequestData, ReviewerFilter};
pub use results::{PendingFilter, UpsertDraftData};
pub use staff::{CreateStaffData, StaffFilter, UpdateStaffData};
pub use students::{CreateStudentData, StudentFilter, UpdateStudentData};
pub use users::{CreateUserData, UpdateUserData, UserFilter};
