use infra::db::{is_foreign_key_violation, is_unique_violation};
use infra::grading::GradingError;
use infra::workflow::WorkflowError;

/// Unified error type for GraphQL resolvers.
///
/// async-graphql has a blanket `impl<T: Display + Send + Sync + 'static> From<T> for Error`,
/// so anything here converts with `?`.
///
///   - `Sqlx` logs the DB detail and shows a sanitized message; constraint
///     violations get a readable explanation instead
///   - `Workflow` / `Grading` show the rule that was broken
///   - `NotFound`, `Forbidden`, `Invalid` and `Custom` carry their own text
#[derive(Debug)]
pub enum GqlError {
    Sqlx(sqlx::Error),
    Uuid(uuid::Error),
    SerdeJson(serde_json::Error),
    Workflow(WorkflowError),
    Grading(GradingError),
    NotFound(String),
    Forbidden(String),
    Invalid(String),
    Custom(String),
}

impl GqlError {
    pub fn new(msg: impl Into<String>) -> Self {
        GqlError::Custom(msg.into())
    }

    pub fn not_found(what: &str) -> Self {
        GqlError::NotFound(format!("{what} not found"))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        GqlError::Forbidden(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        GqlError::Invalid(msg.into())
    }
}

impl std::fmt::Display for GqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GqlError::Sqlx(e) if is_unique_violation(e) => {
                write!(f, "A record with the same {} already exists", constraint_subject(e))
            }
            GqlError::Sqlx(e) if is_foreign_key_violation(e) => write!(
                f,
                "This record is still referenced by other records or refers to a missing one"
            ),
            GqlError::Sqlx(e) => {
                tracing::error!("Database error: {e}");
                write!(f, "Internal database error")
            }
            GqlError::Uuid(e) => write!(f, "Invalid ID: {e}"),
            GqlError::SerdeJson(e) => write!(f, "Serialization error: {e}"),
            GqlError::Workflow(e) => write!(f, "Workflow error: {e}"),
            GqlError::Grading(e) => write!(f, "Invalid scores: {e}"),
            GqlError::NotFound(msg) | GqlError::Invalid(msg) | GqlError::Custom(msg) => {
                write!(f, "{msg}")
            }
            GqlError::Forbidden(msg) => write!(f, "Access denied: {msg}"),
        }
    }
}

/// Best-effort field name from a unique constraint such as `courses_code_key`.
fn constraint_subject(e: &sqlx::Error) -> String {
    let constraint = match e {
        sqlx::Error::Database(db) => db.constraint().unwrap_or_default().to_string(),
        _ => String::new(),
    };

    let subject = constraint
        .strip_suffix("_key")
        .and_then(|rest| rest.split_once('_').map(|(_, column)| column.replace('_', " ")))
        .unwrap_or_default();

    if subject.is_empty() {
        "values".to_string()
    } else {
        subject
    }
}

impl std::error::Error for GqlError {}

impl From<sqlx::Error> for GqlError {
    fn from(e: sqlx::Error) -> Self {
        GqlError::Sqlx(e)
    }
}

impl From<uuid::Error> for GqlError {
    fn from(e: uuid::Error) -> Self {
        GqlError::Uuid(e)
    }
}

impl From<serde_json::Error> for GqlError {
    fn from(e: serde_json::Error) -> Self {
        GqlError::SerdeJson(e)
    }
}

impl From<WorkflowError> for GqlError {
    fn from(e: WorkflowError) -> Self {
        GqlError::Workflow(e)
    }
}

impl From<GradingError> for GqlError {
    fn from(e: GradingError) -> Self {
        GqlError::Grading(e)
    }
}

/// Extension trait that converts any `Result<T, E>` where `E: Display`
/// into `async_graphql::Result<T>` with a contextual message prefix.
///
/// Usage: `Uuid::parse_str(id).gql_err("Invalid course ID")?`
pub trait ResultExt<T> {
    fn gql_err(self, context: &str) -> std::result::Result<T, async_graphql::Error>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn gql_err(self, context: &str) -> std::result::Result<T, async_graphql::Error> {
        self.map_err(|e| async_graphql::Error::new(format!("{context}: {e}")))
    }
}

/// Routes a database error through [`GqlError`] so clients never see raw SQL errors.
pub trait DbResultExt<T> {
    fn db(self) -> std::result::Result<T, GqlError>;
}

impl<T> DbResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn db(self) -> std::result::Result<T, GqlError> {
        self.map_err(GqlError::from)
    }
}
