// Each domain contains: mod.rs, resolvers.rs, types.rs (and service.rs when
// a mutation spans several repos in one transaction)

pub mod audit_log;
pub mod auth;
pub mod courses;
pub mod dashboards;
pub mod departments;
pub mod edit_requests;
pub mod faculties;
pub mod results;
pub mod staff;
pub mod students;
pub mod users;
