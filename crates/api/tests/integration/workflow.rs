use api::gql::build_schema;
use api::gql::subscriptions::subscribe_course;
use api::gql::types::ResultStatus;
use serde_json::json;

use crate::common::*;

const COURSE_RESULTS: &str = r#"
    query CourseResults($courseId: UUID!, $session: String!) {
        courseResults(courseId: $courseId, session: $session) { id status caScore examScore grade }
    }
"#;

const MY_RESULTS: &str = r#"
    query MyResults {
        myResults { results { courseCode grade gradePoints } gpa cgpa totalUnits degreeClass }
    }
"#;

#[tokio::test]
async fn test_result_moves_through_every_stage_in_order() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, student) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 28, 47).await;
    let ids = json!({ "ids": [result_id] });

    let data = execute_ok(&schema, SUBMIT_RESULTS, ids.clone(), &chain.lecturer).await;
    assert_eq!(data["submitResults"][0]["status"], "SUBMITTED");

    let data = execute_ok(&schema, APPROVE_RESULTS, ids.clone(), &chain.hod).await;
    assert_eq!(data["approveResults"][0]["status"], "HOD_APPROVED");

    let data = execute_ok(&schema, APPROVE_RESULTS, ids.clone(), &chain.dean).await;
    assert_eq!(data["approveResults"][0]["status"], "DEAN_APPROVED");

    let data = execute_ok(&schema, APPROVE_RESULTS, ids, &chain.senate).await;
    assert_eq!(data["approveResults"][0]["status"], "APPROVED");

    let data = execute_ok(&schema, MY_RESULTS, json!({}), &student).await;
    let summary = &data["myResults"];
    assert_eq!(summary["results"].as_array().unwrap().len(), 1);
    assert_eq!(summary["results"][0]["grade"], "A");
    assert_eq!(summary["cgpa"], 5.0);
    assert_eq!(summary["totalUnits"], 3);
    assert_eq!(summary["degreeClass"], "FIRST_CLASS");
}

#[tokio::test]
async fn test_stages_cannot_be_skipped() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    let ids = json!({ "ids": [result_id] });

    // Drafts cannot be approved at all
    let message = execute_err(&schema, APPROVE_RESULTS, ids.clone(), &chain.hod).await;
    assert!(message.contains("cannot approve a result that is draft"), "got: {}", message);

    execute_ok(&schema, SUBMIT_RESULTS, ids.clone(), &chain.lecturer).await;

    let message = execute_err(&schema, APPROVE_RESULTS, ids.clone(), &chain.dean).await;
    assert!(message.contains("awaits the hod, not the dean"), "got: {}", message);

    let message = execute_err(&schema, APPROVE_RESULTS, ids, &chain.senate).await;
    assert!(message.contains("awaits the hod"), "got: {}", message);
}

#[tokio::test]
async fn test_hod_of_another_department_is_out_of_scope() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let other = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    let ids = json!({ "ids": [result_id] });
    execute_ok(&schema, SUBMIT_RESULTS, ids.clone(), &chain.lecturer).await;

    let message = execute_err(&schema, APPROVE_RESULTS, ids.clone(), &other.hod).await;
    assert!(message.contains("Access denied"), "got: {}", message);

    // Another lecturer cannot submit or record on this course either
    let message = execute_err(&schema, SUBMIT_RESULTS, ids, &other.lecturer).await;
    assert!(message.contains("Access denied"), "got: {}", message);
}

#[tokio::test]
async fn test_rejection_requires_reason_and_allows_resubmission() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 10, 20).await;
    let ids = json!({ "ids": [result_id.clone()] });
    execute_ok(&schema, SUBMIT_RESULTS, ids.clone(), &chain.lecturer).await;

    let message = execute_err(
        &schema,
        REJECT_RESULTS,
        json!({ "ids": [result_id.clone()], "reason": "   " }),
        &chain.hod,
    )
    .await;
    assert!(message.contains("reason must not be empty"), "got: {}", message);

    let data = execute_ok(
        &schema,
        REJECT_RESULTS,
        json!({ "ids": [result_id.clone()], "reason": "Exam score looks wrong" }),
        &chain.hod,
    )
    .await;
    assert_eq!(data["rejectResults"][0]["status"], "REJECTED");
    assert_eq!(data["rejectResults"][0]["rejectionReason"], "Exam score looks wrong");

    // The lecturer fixes the scores and resubmits
    let corrected = record_draft(&schema, &chain, student_id, 10, 40).await;
    assert_eq!(corrected, result_id);

    let data = execute_ok(&schema, SUBMIT_RESULTS, ids, &chain.lecturer).await;
    assert_eq!(data["submitResults"][0]["status"], "SUBMITTED");
}

#[tokio::test]
async fn test_failed_batch_leaves_every_result_unchanged() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (first_student, _) = create_test_student(&app_state, chain.department_id).await;
    let (second_student, _) = create_test_student(&app_state, chain.department_id).await;

    let first = record_draft(&schema, &chain, first_student, 20, 30).await;
    let second = record_draft(&schema, &chain, second_student, 25, 35).await;

    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [first.clone()] }), &chain.lecturer).await;

    // `first` is already submitted, so the whole batch fails
    let message = execute_err(
        &schema,
        SUBMIT_RESULTS,
        json!({ "ids": [first.clone(), second.clone()] }),
        &chain.lecturer,
    )
    .await;
    assert!(message.contains("cannot submit"), "got: {}", message);

    let data = execute_ok(
        &schema,
        COURSE_RESULTS,
        json!({ "courseId": chain.course_id, "session": SESSION }),
        &chain.lecturer,
    )
    .await;
    let rows = data["courseResults"].as_array().unwrap();
    let status_of = |id: &str| {
        rows.iter()
            .find(|r| r["id"] == id)
            .map(|r| r["status"].clone())
            .unwrap()
    };
    assert_eq!(status_of(&first), "SUBMITTED");
    assert_eq!(status_of(&second), "DRAFT");
}

#[tokio::test]
async fn test_invalid_scores_reject_the_whole_upload() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (good, _) = create_test_student(&app_state, chain.department_id).await;
    let (bad, _) = create_test_student(&app_state, chain.department_id).await;

    let message = execute_err(
        &schema,
        UPSERT_RESULTS,
        json!({
            "courseId": chain.course_id,
            "session": SESSION,
            "entries": [
                { "studentId": good, "caScore": 30, "examScore": 50 },
                { "studentId": bad, "caScore": 41, "examScore": 10 },
            ],
        }),
        &chain.lecturer,
    )
    .await;
    assert!(message.contains("CA score must be between 0 and 40"), "got: {}", message);

    let data = execute_ok(
        &schema,
        COURSE_RESULTS,
        json!({ "courseId": chain.course_id, "session": SESSION }),
        &chain.admin,
    )
    .await;
    assert!(data["courseResults"].as_array().unwrap().is_empty());

    let message = execute_err(
        &schema,
        UPSERT_RESULTS,
        json!({
            "courseId": chain.course_id,
            "session": "2025/2027",
            "entries": [{ "studentId": good, "caScore": 30, "examScore": 50 }],
        }),
        &chain.lecturer,
    )
    .await;
    assert!(message.contains("session"), "got: {}", message);
}

#[tokio::test]
async fn test_submitted_results_are_locked_for_direct_edits() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id] }), &chain.lecturer).await;

    let message = execute_err(
        &schema,
        UPSERT_RESULTS,
        json!({
            "courseId": chain.course_id,
            "session": SESSION,
            "entries": [{ "studentId": student_id, "caScore": 40, "examScore": 60 }],
        }),
        &chain.lecturer,
    )
    .await;
    assert!(message.contains("can no longer be edited"), "got: {}", message);
}

#[tokio::test]
async fn test_students_only_see_published_results() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, student) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    let ids = json!({ "ids": [result_id.clone()] });
    execute_ok(&schema, SUBMIT_RESULTS, ids.clone(), &chain.lecturer).await;
    execute_ok(&schema, APPROVE_RESULTS, ids.clone(), &chain.hod).await;
    execute_ok(&schema, APPROVE_RESULTS, ids, &chain.dean).await;

    let data = execute_ok(&schema, MY_RESULTS, json!({}), &student).await;
    assert!(data["myResults"]["results"].as_array().unwrap().is_empty());
    assert_eq!(data["myResults"]["cgpa"], 0.0);

    // Students cannot read course result sheets
    let message = execute_err(
        &schema,
        COURSE_RESULTS,
        json!({ "courseId": chain.course_id, "session": SESSION }),
        &student,
    )
    .await;
    assert!(message.contains("Access denied"), "got: {}", message);
}

#[tokio::test]
async fn test_submit_course_results_submits_every_draft() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    for _ in 0..3 {
        let (student_id, _) = create_test_student(&app_state, chain.department_id).await;
        record_draft(&schema, &chain, student_id, 20, 30).await;
    }

    let query = r#"
        mutation SubmitCourse($courseId: UUID!, $session: String!) {
            submitCourseResults(courseId: $courseId, session: $session) { id status }
        }
    "#;
    let vars = json!({ "courseId": chain.course_id, "session": SESSION });

    let data = execute_ok(&schema, query, vars.clone(), &chain.lecturer).await;
    let submitted = data["submitCourseResults"].as_array().unwrap();
    assert_eq!(submitted.len(), 3);
    assert!(submitted.iter().all(|r| r["status"] == "SUBMITTED"));

    let message = execute_err(&schema, query, vars, &chain.lecturer).await;
    assert!(message.contains("No draft or rejected results"), "got: {}", message);
}

#[tokio::test]
async fn test_pending_approvals_follow_stage_and_scope() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let other = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;

    let query = r#"
        query Pending($session: String) {
            pendingApprovals(session: $session) { totalCount items { id status } }
        }
    "#;
    let vars = json!({ "session": SESSION });

    let data = execute_ok(&schema, query, vars.clone(), &chain.hod).await;
    let items = data["pendingApprovals"]["items"].as_array().unwrap();
    assert!(items.iter().any(|r| r["id"] == result_id.as_str()));

    let data = execute_ok(&schema, query, vars.clone(), &other.hod).await;
    let items = data["pendingApprovals"]["items"].as_array().unwrap();
    assert!(!items.iter().any(|r| r["id"] == result_id.as_str()));

    // Not yet the dean's turn
    let data = execute_ok(&schema, query, vars, &chain.dean).await;
    let items = data["pendingApprovals"]["items"].as_array().unwrap();
    assert!(!items.iter().any(|r| r["id"] == result_id.as_str()));
}

#[tokio::test]
async fn test_status_changes_are_published_to_course_subscribers() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let mut receiver = subscribe_course(chain.course_id);

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;

    let created = receiver.try_recv().expect("creation event");
    assert_eq!(created.result_id.as_str(), result_id);
    assert!(created.previous_status.is_none());

    let submitted = receiver.try_recv().expect("submission event");
    assert_eq!(submitted.result_id.as_str(), result_id);
    assert_eq!(submitted.status, ResultStatus::Submitted);
    assert_eq!(submitted.previous_status, Some(ResultStatus::Draft));
}
