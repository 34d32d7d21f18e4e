use api::gql::build_schema;
use api::gql::types::Role;
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state);

    for query in [
        "query { me { id } }",
        "query { courses { totalCount } }",
        "query { pendingApprovals { totalCount } }",
    ] {
        let response = execute_graphql(&schema, query, None, None).await;
        assert!(!response.errors.is_empty(), "{} should fail", query);
        assert_eq!(
            response.errors[0].message,
            "You must be logged in to perform this action"
        );
    }
}

#[tokio::test]
async fn test_structure_changes_are_admin_only() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;

    let query = r#"
        mutation CreateFaculty($code: String!) {
            createFaculty(input: { code: $code, name: "Faculty of Nope" }) { id }
        }
    "#;
    for claims in [&chain.lecturer, &chain.hod, &chain.dean, &chain.senate] {
        let message = execute_err(&schema, query, json!({ "code": unique("N") }), claims).await;
        assert!(message.starts_with("Access denied"), "got: {}", message);
    }

    let message = execute_err(
        &schema,
        "query { users { totalCount } }",
        json!({}),
        &chain.dean,
    )
    .await;
    assert!(message.starts_with("Access denied"), "got: {}", message);

    execute_ok(&schema, "query { users { totalCount } }", json!({}), &chain.admin).await;
}

#[tokio::test]
async fn test_course_results_visibility_follows_the_chain() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let other = setup_chain(&app_state).await;
    let (_, student) = create_test_student(&app_state, chain.department_id).await;

    let query = r#"
        query CourseResults($courseId: UUID!, $session: String!) {
            courseResults(courseId: $courseId, session: $session) { id }
        }
    "#;
    let vars = json!({ "courseId": chain.course_id, "session": SESSION });

    for claims in [&chain.lecturer, &chain.hod, &chain.dean, &chain.senate, &chain.admin] {
        execute_ok(&schema, query, vars.clone(), claims).await;
    }

    for claims in [&other.lecturer, &other.hod, &other.dean, &student] {
        let message = execute_err(&schema, query, vars.clone(), claims).await;
        assert!(message.starts_with("Access denied"), "got: {}", message);
    }
}

#[tokio::test]
async fn test_admin_is_not_an_approver() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;

    let message = execute_err(&schema, APPROVE_RESULTS, json!({ "ids": [result_id] }), &chain.admin).await;
    assert!(message.starts_with("Access denied"), "got: {}", message);
}

#[tokio::test]
async fn test_student_only_queries() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (_, student) = create_test_student(&app_state, chain.department_id).await;

    let message = execute_err(
        &schema,
        "query { myResults { cgpa } }",
        json!({}),
        &chain.lecturer,
    )
    .await;
    assert!(message.starts_with("Access denied"), "got: {}", message);

    let message = execute_err(
        &schema,
        "query { students { totalCount } }",
        json!({}),
        &student,
    )
    .await;
    assert!(message.starts_with("Access denied"), "got: {}", message);

    // A user with the student role but no record
    let (_, orphan) = create_test_user(&app_state, "orphan", Role::Student).await;
    let message = execute_err(&schema, "query { myResults { cgpa } }", json!({}), &orphan).await;
    assert!(message.contains("Student record not found"), "got: {}", message);
}
