use async_graphql::{Context, Result, Subscription};
use futures_util::Stream;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use uuid::Uuid;

use crate::auth::permissions::{can_view_course, require_admin, require_any_role, STAFF_ROLES};
use crate::gql::common::helpers::load_course_chain;
use crate::gql::error::GqlError;
use crate::gql::types::{AuditLogEntry, ResultStatusEvent, Role};
use crate::state::AppState;

const CHANNEL_CAPACITY: usize = 100;

struct SubscriptionChannels {
    /// Per-course result status changes
    courses: HashMap<Uuid, broadcast::Sender<ResultStatusEvent>>,
    /// Every audit entry, for the admin viewer
    audit: broadcast::Sender<AuditLogEntry>,
}

impl SubscriptionChannels {
    fn new() -> Self {
        Self {
            courses: HashMap::new(),
            audit: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Course channels exist only while someone listens; idle ones are
    /// dropped whenever a new subscriber arrives.
    fn subscribe_course(&mut self, course_id: Uuid) -> broadcast::Receiver<ResultStatusEvent> {
        self.courses.retain(|_, sender| sender.receiver_count() > 0);
        self.courses
            .entry(course_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn publish_course(&mut self, course_id: Uuid, event: ResultStatusEvent) {
        let idle = match self.courses.get(&course_id) {
            Some(sender) => sender.receiver_count() == 0,
            None => return,
        };

        if idle {
            self.courses.remove(&course_id);
        } else if let Some(sender) = self.courses.get(&course_id) {
            let _ = sender.send(event);
        }
    }
}

static CHANNELS: Lazy<Arc<Mutex<SubscriptionChannels>>> =
    Lazy::new(|| Arc::new(Mutex::new(SubscriptionChannels::new())));

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Status changes of results on one course. Open to the staff who can see the course.
    async fn result_status_changed(
        &self,
        ctx: &Context<'_>,
        course_id: Uuid,
    ) -> Result<impl Stream<Item = Result<ResultStatusEvent, BroadcastStreamRecvError>>> {
        let mut roles = STAFF_ROLES.to_vec();
        roles.push(Role::Admin);
        let actor = require_any_role(ctx, &roles).await?;

        let state = ctx.data::<AppState>()?;
        let chain = load_course_chain(&state.db, course_id).await?;
        if !can_view_course(
            &actor,
            chain.course.lecturer_id,
            chain.department.hod_id,
            chain.faculty.dean_id,
        ) {
            return Err(GqlError::forbidden("you cannot follow results of this course").into());
        }

        let receiver = CHANNELS.lock().subscribe_course(course_id);

        Ok(BroadcastStream::new(receiver))
    }

    /// Live audit trail (admins only).
    async fn audit_log_created(
        &self,
        ctx: &Context<'_>,
    ) -> Result<impl Stream<Item = Result<AuditLogEntry, BroadcastStreamRecvError>>> {
        let _admin = require_admin(ctx).await?;

        let receiver = CHANNELS.lock().audit.subscribe();

        Ok(BroadcastStream::new(receiver))
    }
}

/// Publish a result status change to its course channel.
pub fn publish_result_status(event: ResultStatusEvent) {
    let course_id = match Uuid::parse_str(event.course_id.as_str()) {
        Ok(id) => id,
        Err(_) => return,
    };

    CHANNELS.lock().publish_course(course_id, event);
}

pub fn publish_audit_entry(entry: AuditLogEntry) {
    let _ = CHANNELS.lock().audit.send(entry);
}

/// Subscribe to a course channel outside GraphQL.
pub fn subscribe_course(course_id: Uuid) -> broadcast::Receiver<ResultStatusEvent> {
    CHANNELS.lock().subscribe_course(course_id)
}

/// Subscribe to the audit channel outside GraphQL.
pub fn subscribe_audit() -> broadcast::Receiver<AuditLogEntry> {
    CHANNELS.lock().audit.subscribe()
}
