use api::gql::build_schema;
use api::gql::types::Role;
use serde_json::json;
use uuid::Uuid;

use crate::common::*;

const CREATE_FACULTY: &str = r#"
    mutation CreateFaculty($code: String!, $name: String!) {
        createFaculty(input: { code: $code, name: $name }) { id code name deanId }
    }
"#;

const CREATE_COURSE: &str = r#"
    mutation CreateCourse($input: CreateCourseInput!) {
        createCourse(input: $input) { id code units level semester lecturerId }
    }
"#;

#[tokio::test]
async fn test_faculty_codes_are_normalized_and_unique() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let (_, admin) = create_test_user(&app_state, "admin", Role::Admin).await;

    let code = unique("sci");
    let data = execute_ok(
        &schema,
        CREATE_FACULTY,
        json!({ "code": format!("  {}  ", code.to_lowercase()), "name": "Faculty of Science" }),
        &admin,
    )
    .await;
    assert_eq!(data["createFaculty"]["code"], code.to_uppercase());
    assert!(data["createFaculty"]["deanId"].is_null());

    let message = execute_err(
        &schema,
        CREATE_FACULTY,
        json!({ "code": code, "name": "Another Science" }),
        &admin,
    )
    .await;
    assert!(message.contains("already exists"), "got: {}", message);

    let message = execute_err(
        &schema,
        CREATE_FACULTY,
        json!({ "code": "SCI-1", "name": "Bad Code" }),
        &admin,
    )
    .await;
    assert!(message.contains("may only contain letters and digits"), "got: {}", message);
}

#[tokio::test]
async fn test_assign_dean_requires_dean_role() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let (_, admin) = create_test_user(&app_state, "admin", Role::Admin).await;
    let (lecturer_id, _) = create_test_user(&app_state, "lecturer", Role::Lecturer).await;
    let (dean_id, _) = create_test_user(&app_state, "dean", Role::Dean).await;
    let faculty_id = create_test_faculty(&app_state, None).await;

    let query = r#"
        mutation AssignDean($facultyId: UUID!, $userId: UUID) {
            assignDean(facultyId: $facultyId, userId: $userId) { id deanId dean { id role } }
        }
    "#;

    let message = execute_err(
        &schema,
        query,
        json!({ "facultyId": faculty_id, "userId": lecturer_id }),
        &admin,
    )
    .await;
    assert!(message.contains("must have the dean role"), "got: {}", message);

    let data = execute_ok(
        &schema,
        query,
        json!({ "facultyId": faculty_id, "userId": dean_id }),
        &admin,
    )
    .await;
    assert_eq!(data["assignDean"]["deanId"], dean_id.to_string());
    assert_eq!(data["assignDean"]["dean"]["role"], "DEAN");

    let data = execute_ok(
        &schema,
        query,
        json!({ "facultyId": faculty_id, "userId": null }),
        &admin,
    )
    .await;
    assert!(data["assignDean"]["deanId"].is_null());
}

#[tokio::test]
async fn test_create_staff_returns_working_temporary_password() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let (_, admin) = create_test_user(&app_state, "admin", Role::Admin).await;
    let faculty_id = create_test_faculty(&app_state, None).await;
    let department_id = create_test_department(&app_state, faculty_id, None).await;

    let query = r#"
        mutation CreateStaff($input: CreateStaffInput!) {
            createStaff(input: $input) {
                staff { id userId email role staffNumber isActive }
                temporaryPassword
            }
        }
    "#;
    let email = format!("Staff_{}@Test.edu", Uuid::new_v4().simple());
    let input = json!({
        "email": email,
        "firstName": "Ada",
        "lastName": "Obi",
        "role": "LECTURER",
        "departmentId": department_id,
        "staffNumber": unique("sn"),
        "designation": "Lecturer II",
    });

    let data = execute_ok(&schema, query, json!({ "input": input.clone() }), &admin).await;
    let payload = &data["createStaff"];
    assert_eq!(payload["staff"]["email"], email.to_lowercase());
    assert_eq!(payload["staff"]["role"], "LECTURER");
    assert_eq!(payload["staff"]["isActive"], true);

    let password = payload["temporaryPassword"].as_str().unwrap();
    let user_id = Uuid::parse_str(payload["staff"]["userId"].as_str().unwrap()).unwrap();
    let (hash,): (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&app_state.db)
        .await
        .unwrap();
    assert_ne!(hash, password);
    assert!(bcrypt::verify(password, &hash).unwrap());

    let mut duplicate = input;
    duplicate["staffNumber"] = json!(unique("sn"));
    let message = execute_err(&schema, query, json!({ "input": duplicate }), &admin).await;
    assert!(message.contains("already exists"), "got: {}", message);

    let student_role = json!({
        "email": format!("x_{}@test.edu", Uuid::new_v4().simple()),
        "firstName": "Ada",
        "lastName": "Obi",
        "role": "STUDENT",
        "departmentId": department_id,
        "staffNumber": unique("sn"),
        "designation": "Lecturer II",
    });
    let message = execute_err(&schema, query, json!({ "input": student_role }), &admin).await;
    assert!(message.contains("Staff role must be"), "got: {}", message);
}

#[tokio::test]
async fn test_created_student_sees_their_dashboard() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;

    let query = r#"
        mutation CreateStudent($input: CreateStudentInput!) {
            createStudent(input: $input) {
                student { id userId matricNumber level fullName }
                temporaryPassword
            }
        }
    "#;
    let matric = unique("u").to_lowercase();
    let data = execute_ok(
        &schema,
        query,
        json!({
            "input": {
                "email": format!("student_{}@test.edu", Uuid::new_v4().simple()),
                "firstName": "Chidi",
                "lastName": "Eze",
                "departmentId": chain.department_id,
                "matricNumber": matric,
                "level": 100,
                "entryYear": 2025,
            }
        }),
        &chain.admin,
    )
    .await;
    let student = &data["createStudent"]["student"];
    assert_eq!(student["matricNumber"], matric.to_uppercase());
    assert_eq!(student["fullName"], "Chidi Eze");

    let student_id = Uuid::parse_str(student["id"].as_str().unwrap()).unwrap();
    let user_id = Uuid::parse_str(student["userId"].as_str().unwrap()).unwrap();
    let claims = api::auth::Claims::new(user_id, "student@test.edu".to_string(), Role::Student, 60);

    let result_id = record_draft(&schema, &chain, student_id, 30, 30).await;
    publish_result(&schema, &chain, &result_id).await;

    let data = execute_ok(
        &schema,
        "query { studentDashboard { publishedCourses totalUnits cgpa degreeClass student { id } } }",
        json!({}),
        &claims,
    )
    .await;
    let dashboard = &data["studentDashboard"];
    assert_eq!(dashboard["student"]["id"], student_id.to_string());
    assert_eq!(dashboard["publishedCourses"], 1);
    assert_eq!(dashboard["totalUnits"], 3);
    assert_eq!(dashboard["cgpa"], 4.0);
    assert_eq!(dashboard["degreeClass"], "SECOND_CLASS_UPPER");
}

#[tokio::test]
async fn test_course_validation() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;

    let input = |units: i32, level: i32| {
        json!({
            "input": {
                "departmentId": chain.department_id,
                "code": unique("csc"),
                "title": "Data Structures",
                "units": units,
                "level": level,
                "semester": "SECOND",
            }
        })
    };

    let message = execute_err(&schema, CREATE_COURSE, input(7, 200), &chain.admin).await;
    assert!(message.contains("units must be between 1 and 6"), "got: {}", message);

    let message = execute_err(&schema, CREATE_COURSE, input(3, 250), &chain.admin).await;
    assert!(message.contains("level must be one of"), "got: {}", message);

    let data = execute_ok(&schema, CREATE_COURSE, input(3, 200), &chain.admin).await;
    assert_eq!(data["createCourse"]["semester"], "SECOND");
    assert!(data["createCourse"]["lecturerId"].is_null());

    let message = execute_err(&schema, CREATE_COURSE, input(3, 200), &chain.lecturer).await;
    assert!(message.contains("Access denied"), "got: {}", message);
}

#[tokio::test]
async fn test_assign_lecturer_requires_staff_record() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;
    let (outsider_id, _) = create_test_user(&app_state, "lecturer", Role::Lecturer).await;

    let query = r#"
        mutation Assign($courseId: UUID!, $userId: UUID) {
            assignLecturer(courseId: $courseId, userId: $userId) { id lecturerId }
        }
    "#;

    let message = execute_err(
        &schema,
        query,
        json!({ "courseId": chain.course_id, "userId": outsider_id }),
        &chain.admin,
    )
    .await;
    assert!(message.contains("must be a staff member"), "got: {}", message);

    let data = execute_ok(
        &schema,
        query,
        json!({ "courseId": chain.course_id, "userId": null }),
        &chain.admin,
    )
    .await;
    assert!(data["assignLecturer"]["lecturerId"].is_null());

    // With no lecturer assigned, nobody can record scores
    let (student_id, _) = create_test_student(&app_state, chain.department_id).await;
    let message = execute_err(
        &schema,
        UPSERT_RESULTS,
        json!({
            "courseId": chain.course_id,
            "session": SESSION,
            "entries": [{ "studentId": student_id, "caScore": 10, "examScore": 10 }],
        }),
        &chain.lecturer,
    )
    .await;
    assert!(message.contains("Access denied"), "got: {}", message);
}

#[tokio::test]
async fn test_role_change_from_hod_clears_headship() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;

    let query = r#"
        mutation ChangeRole($userId: UUID!, $role: Role!) {
            updateUserRole(userId: $userId, role: $role) { id role }
        }
    "#;
    let data = execute_ok(
        &schema,
        query,
        json!({ "userId": chain.hod_id, "role": "LECTURER" }),
        &chain.admin,
    )
    .await;
    assert_eq!(data["updateUserRole"]["role"], "LECTURER");

    let (hod_id,): (Option<Uuid>,) = sqlx::query_as("SELECT hod_id FROM departments WHERE id = $1")
        .bind(chain.department_id)
        .fetch_one(&app_state.db)
        .await
        .unwrap();
    assert!(hod_id.is_none());

    let (_, student) = create_test_student(&app_state, chain.department_id).await;
    let message = execute_err(
        &schema,
        query,
        json!({ "userId": student.sub, "role": "LECTURER" }),
        &chain.admin,
    )
    .await;
    assert!(message.contains("Student accounts"), "got: {}", message);
}

#[tokio::test]
async fn test_deactivated_accounts_are_locked_out() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());
    let chain = setup_chain(&app_state).await;

    let query = r#"
        mutation SetActive($userId: UUID!, $isActive: Boolean!) {
            setUserActive(userId: $userId, isActive: $isActive) { id isActive }
        }
    "#;
    let data = execute_ok(
        &schema,
        query,
        json!({ "userId": chain.lecturer_id, "isActive": false }),
        &chain.admin,
    )
    .await;
    assert_eq!(data["setUserActive"]["isActive"], false);

    let message = execute_err(&schema, "query { me { id } }", json!({}), &chain.lecturer).await;
    assert!(message.contains("account is deactivated"), "got: {}", message);

    execute_ok(
        &schema,
        query,
        json!({ "userId": chain.lecturer_id, "isActive": true }),
        &chain.admin,
    )
    .await;
    execute_ok(&schema, "query { me { id } }", json!({}), &chain.lecturer).await;
}
