use api::gql::build_schema;
use serde_json::json;
use uuid::Uuid;

use crate::common::*;

const REQUEST_EDIT: &str = r#"
    mutation RequestEdit($resultId: UUID!, $ca: Int!, $exam: Int!, $reason: String!) {
        requestResultEdit(
            resultId: $resultId
            proposedCaScore: $ca
            proposedExamScore: $exam
            reason: $reason
        ) {
            id
            status
            reviewerRole
        }
    }
"#;

const REVIEW_EDIT: &str = r#"
    mutation Review($id: UUID!, $approve: Boolean!, $comment: String) {
        reviewEditRequest(id: $id, approve: $approve, comment: $comment) {
            id
            status
            reviewedBy
            reviewComment
            result { id status caScore examScore totalScore grade }
        }
    }
"#;

const CANCEL_EDIT: &str = r#"
    mutation Cancel($id: UUID!) {
        cancelEditRequest(id: $id) { id status reviewComment }
    }
"#;

fn edit_vars(result_id: &str, ca: i32, exam: i32) -> serde_json::Value {
    json!({
        "resultId": result_id,
        "ca": ca,
        "exam": exam,
        "reason": "Script was re-marked",
    })
}

#[tokio::test]
async fn test_draft_results_need_no_edit_request() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;

    let message = execute_err(&schema, REQUEST_EDIT, edit_vars(&result_id, 25, 30), &chain.lecturer).await;
    assert!(message.contains("no edit request is needed"), "got: {}", message);
}

#[tokio::test]
async fn test_submitted_result_edit_is_routed_to_hod_once() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;

    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 25, 30), &chain.lecturer).await;
    assert_eq!(data["requestResultEdit"]["status"], "PENDING");
    assert_eq!(data["requestResultEdit"]["reviewerRole"], "HOD");

    let message = execute_err(&schema, REQUEST_EDIT, edit_vars(&result_id, 26, 30), &chain.lecturer).await;
    assert!(message.contains("already exists"), "got: {}", message);

    // Only the course lecturer may file one
    let other = setup_chain(&app_state).await;
    let message = execute_err(&schema, REQUEST_EDIT, edit_vars(&result_id, 26, 30), &other.lecturer).await;
    assert!(message.contains("Access denied"), "got: {}", message);
}

#[tokio::test]
async fn test_approved_edit_regrades_and_returns_result_to_draft() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    let ids = json!({ "ids": [result_id.clone()] });
    execute_ok(&schema, SUBMIT_RESULTS, ids.clone(), &chain.lecturer).await;
    execute_ok(&schema, APPROVE_RESULTS, ids, &chain.hod).await;

    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 35, 50), &chain.lecturer).await;
    let request_id = data["requestResultEdit"]["id"].as_str().unwrap().to_string();
    assert_eq!(data["requestResultEdit"]["reviewerRole"], "HOD");

    let data = execute_ok(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": true, "comment": "Confirmed with the examiner" }),
        &chain.hod,
    )
    .await;
    let review = &data["reviewEditRequest"];
    assert_eq!(review["status"], "APPROVED");
    assert_eq!(review["reviewComment"], "Confirmed with the examiner");
    assert_eq!(review["result"]["status"], "DRAFT");
    assert_eq!(review["result"]["caScore"], 35);
    assert_eq!(review["result"]["examScore"], 50);
    assert_eq!(review["result"]["totalScore"], 85);
    assert_eq!(review["result"]["grade"], "A");

    // Reviewing twice is refused
    let message = execute_err(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": false }),
        &chain.hod,
    )
    .await;
    assert!(message.contains("already approved"), "got: {}", message);
}

#[tokio::test]
async fn test_published_result_edit_goes_to_senate() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    publish_result(&schema, &chain, &result_id).await;

    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 22, 30), &chain.lecturer).await;
    assert_eq!(data["requestResultEdit"]["reviewerRole"], "SENATE");
    let request_id = data["requestResultEdit"]["id"].as_str().unwrap().to_string();

    let message = execute_err(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": true }),
        &chain.hod,
    )
    .await;
    assert!(message.contains("reviewed by the senate, not the hod"), "got: {}", message);

    let data = execute_ok(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": true }),
        &chain.senate,
    )
    .await;
    assert_eq!(data["reviewEditRequest"]["result"]["status"], "DRAFT");
    assert_eq!(data["reviewEditRequest"]["result"]["totalScore"], 52);
}

#[tokio::test]
async fn test_rejected_edit_leaves_result_untouched() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;

    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 40, 60), &chain.lecturer).await;
    let request_id = data["requestResultEdit"]["id"].as_str().unwrap().to_string();

    let data = execute_ok(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": false, "comment": "No evidence" }),
        &chain.hod,
    )
    .await;
    let review = &data["reviewEditRequest"];
    assert_eq!(review["status"], "REJECTED");
    assert_eq!(review["result"]["status"], "SUBMITTED");
    assert_eq!(review["result"]["totalScore"], 50);

    // A new request can be filed once the old one is resolved
    execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 22, 30), &chain.lecturer).await;
}

#[tokio::test]
async fn test_only_the_requester_can_cancel() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;

    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 25, 30), &chain.lecturer).await;
    let request_id = data["requestResultEdit"]["id"].as_str().unwrap().to_string();

    let message = execute_err(&schema, CANCEL_EDIT, json!({ "id": request_id }), &chain.hod).await;
    assert!(message.contains("only the requester"), "got: {}", message);

    let data = execute_ok(&schema, CANCEL_EDIT, json!({ "id": request_id }), &chain.lecturer).await;
    assert_eq!(data["cancelEditRequest"]["status"], "REJECTED");
    assert_eq!(data["cancelEditRequest"]["reviewComment"], "cancelled by requester");

    let message = execute_err(&schema, CANCEL_EDIT, json!({ "id": request_id }), &chain.lecturer).await;
    assert!(message.contains("already rejected"), "got: {}", message);
}

#[tokio::test]
async fn test_edit_request_queue_is_scoped_to_reviewer() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let other = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;
    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 25, 30), &chain.lecturer).await;
    let request_id = data["requestResultEdit"]["id"].clone();

    let query = r#"
        query Queue {
            editRequests(status: PENDING) { totalCount items { id } }
        }
    "#;

    let data = execute_ok(&schema, query, json!({}), &chain.hod).await;
    let items = data["editRequests"]["items"].as_array().unwrap();
    assert!(items.iter().any(|r| r["id"] == request_id));

    let data = execute_ok(&schema, query, json!({}), &other.hod).await;
    let items = data["editRequests"]["items"].as_array().unwrap();
    assert!(!items.iter().any(|r| r["id"] == request_id));

    let mine = execute_ok(
        &schema,
        "query { myEditRequests { id } }",
        json!({}),
        &chain.lecturer,
    )
    .await;
    assert_eq!(mine["myEditRequests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pending_edit_request_freezes_the_workflow() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    let ids = json!({ "ids": [result_id.clone()] });
    execute_ok(&schema, SUBMIT_RESULTS, ids.clone(), &chain.lecturer).await;

    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 25, 30), &chain.lecturer).await;
    let request_id = data["requestResultEdit"]["id"].as_str().unwrap().to_string();

    let message = execute_err(&schema, APPROVE_RESULTS, ids.clone(), &chain.hod).await;
    assert!(message.contains("pending edit request"), "got: {}", message);

    let message = execute_err(
        &schema,
        REJECT_RESULTS,
        json!({ "ids": [result_id.clone()], "reason": "Recheck" }),
        &chain.hod,
    )
    .await;
    assert!(message.contains("pending edit request"), "got: {}", message);

    // Once the request is closed the chain moves again
    execute_ok(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": false }),
        &chain.hod,
    )
    .await;
    let data = execute_ok(&schema, APPROVE_RESULTS, ids, &chain.hod).await;
    assert_eq!(data["approveResults"][0]["status"], "HOD_APPROVED");
}

#[tokio::test]
async fn test_review_follows_the_current_result_status() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;

    let data = execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 39, 59), &chain.lecturer).await;
    assert_eq!(data["requestResultEdit"]["reviewerRole"], "HOD");
    let request_id = data["requestResultEdit"]["id"].as_str().unwrap().to_string();

    // The result was published behind the request's back
    let result_uuid = Uuid::parse_str(&result_id).unwrap();
    sqlx::query("UPDATE results SET status = 'approved' WHERE id = $1")
        .bind(result_uuid)
        .execute(&app_state.db)
        .await
        .unwrap();

    let message = execute_err(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": true }),
        &chain.hod,
    )
    .await;
    assert!(message.contains("reviewed by the senate, not the hod"), "got: {}", message);

    let (status, total): (String, i32) =
        sqlx::query_as("SELECT status::text, total_score FROM results WHERE id = $1")
            .bind(result_uuid)
            .fetch_one(&app_state.db)
            .await
            .unwrap();
    assert_eq!(status, "approved");
    assert_eq!(total, 50);

    // Back in the lecturer's hands, the request is moot
    sqlx::query("UPDATE results SET status = 'rejected' WHERE id = $1")
        .bind(result_uuid)
        .execute(&app_state.db)
        .await
        .unwrap();

    let message = execute_err(
        &schema,
        REVIEW_EDIT,
        json!({ "id": request_id, "approve": true }),
        &chain.hod,
    )
    .await;
    assert!(message.contains("can be edited directly"), "got: {}", message);

    let data = execute_ok(&schema, CANCEL_EDIT, json!({ "id": request_id }), &chain.lecturer).await;
    assert_eq!(data["cancelEditRequest"]["status"], "REJECTED");
}

#[tokio::test]
async fn test_staff_dashboard_counts_edit_reviews_for_the_current_reviewer() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;

    let result_id = record_draft(&schema, &chain, student_id, 20, 30).await;
    execute_ok(&schema, SUBMIT_RESULTS, json!({ "ids": [result_id.clone()] }), &chain.lecturer).await;
    execute_ok(&schema, REQUEST_EDIT, edit_vars(&result_id, 25, 30), &chain.lecturer).await;

    let query = "query { staffDashboard { pendingApprovals pendingEditReviews } }";

    let data = execute_ok(&schema, query, json!({}), &chain.hod).await;
    assert_eq!(data["staffDashboard"]["pendingEditReviews"], 1);
    assert_eq!(data["staffDashboard"]["pendingApprovals"], 1);

    // The dean never sees it, since the result cannot advance while the request is open
    let message = execute_err(&schema, APPROVE_RESULTS, json!({ "ids": [result_id] }), &chain.hod).await;
    assert!(message.contains("pending edit request"), "got: {}", message);
    let data = execute_ok(&schema, query, json!({}), &chain.dean).await;
    assert_eq!(data["staffDashboard"]["pendingEditReviews"], 0);
    assert_eq!(data["staffDashboard"]["pendingApprovals"], 0);
}
