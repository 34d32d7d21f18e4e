use std::env;

use async_graphql::dataloader::DataLoader;
use async_graphql::Schema;

use super::loaders::{
    CourseLoader, DepartmentLoader, FacultyLoader, ResultLoader, StudentLoader, UserLoader,
};
use super::{MutationRoot, QueryRoot, SubscriptionRoot};
use crate::state::AppState;

pub type AppSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the GraphQL schema and inject shared state (AppState) into the context.
pub fn build_schema(state: AppState) -> AppSchema {
    let user_loader = DataLoader::new(UserLoader::new(state.db.clone()), tokio::spawn);
    let faculty_loader = DataLoader::new(FacultyLoader::new(state.db.clone()), tokio::spawn);
    let department_loader = DataLoader::new(DepartmentLoader::new(state.db.clone()), tokio::spawn);
    let course_loader = DataLoader::new(CourseLoader::new(state.db.clone()), tokio::spawn);
    let student_loader = DataLoader::new(StudentLoader::new(state.db.clone()), tokio::spawn);
    let result_loader = DataLoader::new(ResultLoader::new(state.db.clone()), tokio::spawn);

    let introspection_enabled = env::var("GQL_INTROSPECTION")
        .map(|v| v == "true")
        .unwrap_or(false);

    let mut builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        SubscriptionRoot,
    )
    .data(state)
    .data(user_loader)
    .data(faculty_loader)
    .data(department_loader)
    .data(course_loader)
    .data(student_loader)
    .data(result_loader)
    .limit_depth(15)
    .limit_complexity(300);

    if !introspection_enabled {
        builder = builder.disable_introspection();
    }

    builder.finish()
}
