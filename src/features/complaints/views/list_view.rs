//! The signed-in user's own complaints.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::scope::{ScopeHandle, ViewScope};
use crate::features::complaints::models::{Complaint, ComplaintStatus};
use crate::features::complaints::services::ComplaintService;
use crate::shared::constants::{DESCRIPTION_PREVIEW_CHARS, IMAGE_FALLBACK_TEXT};

pub const SHOW_MORE_LABEL: &str = "Show More";
pub const SHOW_LESS_LABEL: &str = "Show Less";

/// Load state of one evidence image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageDisplay {
    #[default]
    Loading,
    Loaded,
    Failed,
}

/// Everything needed to render one complaint
#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintCard {
    pub id: Uuid,
    pub title: String,
    /// Full or truncated description, depending on `expanded`
    pub description: String,
    pub expanded: bool,
    /// `None` when the description fits without truncation
    pub toggle_label: Option<&'static str>,
    pub status: ComplaintStatus,
    pub status_label: &'static str,
    pub category_label: &'static str,
    pub priority_label: &'static str,
    /// Hidden once the image failed to load
    pub image_url: Option<String>,
    pub image_fallback: Option<&'static str>,
    pub can_edit: bool,
    pub can_delete: bool,
    pub confirming_delete: bool,
    pub created_at: DateTime<Utc>,
}

/// Header counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStats {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
}

/// What the list area shows
#[derive(Debug, Clone, PartialEq)]
pub enum ListDisplay {
    Loading,
    Error(String),
    Empty,
    Items(Vec<ComplaintCard>),
}

/// First `DESCRIPTION_PREVIEW_CHARS` characters plus "...", or `None` if it already fits
fn truncate_description(description: &str) -> Option<String> {
    if description.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return None;
    }
    let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    Some(format!("{}...", preview))
}

pub struct ComplaintListView {
    user_id: Uuid,
    service: Arc<ComplaintService>,
    scope: ViewScope,
    complaints: Vec<Complaint>,
    loading: bool,
    error: Option<String>,
    expanded_id: Option<Uuid>,
    pending_delete_id: Option<Uuid>,
    image_states: HashMap<Uuid, ImageDisplay>,
}

impl ComplaintListView {
    /// A freshly mounted list is loading until the first [`ComplaintListView::load`] ends
    pub fn new(service: Arc<ComplaintService>, user_id: Uuid) -> Self {
        Self {
            user_id,
            service,
            scope: ViewScope::new(),
            complaints: Vec::new(),
            loading: true,
            error: None,
            expanded_id: None,
            pending_delete_id: None,
            image_states: HashMap::new(),
        }
    }

    pub fn scope_handle(&self) -> ScopeHandle {
        self.scope.handle()
    }

    pub fn complaints(&self) -> &[Complaint] {
        &self.complaints
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn expanded_id(&self) -> Option<Uuid> {
        self.expanded_id
    }

    pub fn pending_delete_id(&self) -> Option<Uuid> {
        self.pending_delete_id
    }

    /// Replace the list with the user's complaints, newest first
    pub async fn load(&mut self) {
        self.loading = true;
        self.error = None;

        let Some(result) = self.scope.run(self.service.list_for_user(self.user_id)).await else {
            tracing::debug!("Complaint list load discarded");
            return;
        };

        match result {
            Ok(complaints) => {
                self.image_states
                    .retain(|id, _| complaints.iter().any(|c| c.id == *id));
                self.complaints = complaints;
            }
            Err(e) => self.error = Some(e.user_message()),
        }
        self.loading = false;
    }

    /// Same request as the initial load
    pub async fn retry(&mut self) {
        self.load().await;
    }

    pub fn toggle_expand(&mut self, id: Uuid) {
        self.expanded_id = match self.expanded_id {
            Some(current) if current == id => None,
            _ => Some(id),
        };
    }

    /// Open the delete confirmation; closed complaints cannot be deleted
    pub fn request_delete(&mut self, id: Uuid) -> bool {
        match self.complaints.iter().find(|c| c.id == id) {
            Some(complaint) if !complaint.status.is_final() => {
                self.pending_delete_id = Some(id);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete_id = None;
    }

    /// Delete the complaint awaiting confirmation. Returns whether it was removed.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(id) = self.pending_delete_id else {
            return false;
        };

        let Some(result) = self
            .scope
            .run(self.service.delete_owned(id, self.user_id))
            .await
        else {
            return false;
        };

        self.pending_delete_id = None;
        match result {
            Ok(()) => {
                self.complaints.retain(|c| c.id != id);
                self.image_states.remove(&id);
                if self.expanded_id == Some(id) {
                    self.expanded_id = None;
                }
                true
            }
            Err(e) => {
                self.error = Some(e.user_message());
                false
            }
        }
    }

    pub fn on_image_error(&mut self, id: Uuid) {
        self.image_states.insert(id, ImageDisplay::Failed);
    }

    pub fn on_image_loaded(&mut self, id: Uuid) {
        self.image_states.insert(id, ImageDisplay::Loaded);
    }

    pub fn image_state(&self, id: Uuid) -> ImageDisplay {
        self.image_states.get(&id).copied().unwrap_or_default()
    }

    fn card(&self, complaint: &Complaint) -> ComplaintCard {
        let expanded = self.expanded_id == Some(complaint.id);
        let truncated = truncate_description(&complaint.description);
        let (description, toggle_label) = match truncated {
            None => (complaint.description.clone(), None),
            Some(_) if expanded => (complaint.description.clone(), Some(SHOW_LESS_LABEL)),
            Some(preview) => (preview, Some(SHOW_MORE_LABEL)),
        };

        let image_failed = self.image_state(complaint.id) == ImageDisplay::Failed;
        let open = !complaint.status.is_final();

        ComplaintCard {
            id: complaint.id,
            title: complaint.title.clone(),
            description,
            expanded,
            toggle_label,
            status: complaint.status,
            status_label: complaint.status.label(),
            category_label: complaint.category.label(),
            priority_label: complaint.priority.label(),
            image_url: complaint.image_url.clone().filter(|_| !image_failed),
            image_fallback: (complaint.image_url.is_some() && image_failed)
                .then_some(IMAGE_FALLBACK_TEXT),
            can_edit: open,
            can_delete: open,
            confirming_delete: self.pending_delete_id == Some(complaint.id),
            created_at: complaint.created_at,
        }
    }

    pub fn cards(&self) -> Vec<ComplaintCard> {
        self.complaints.iter().map(|c| self.card(c)).collect()
    }

    pub fn stats(&self) -> ListStats {
        ListStats {
            total: self.complaints.len(),
            pending: self
                .complaints
                .iter()
                .filter(|c| c.status == ComplaintStatus::Pending)
                .count(),
            resolved: self
                .complaints
                .iter()
                .filter(|c| c.status == ComplaintStatus::Resolved)
                .count(),
        }
    }

    pub fn display(&self) -> ListDisplay {
        if self.loading {
            return ListDisplay::Loading;
        }
        if let Some(error) = &self.error {
            return ListDisplay::Error(error.clone());
        }
        if self.complaints.is_empty() {
            return ListDisplay::Empty;
        }
        ListDisplay::Items(self.cards())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::gateway::{Filter, GatewayOp, InMemoryGateway};
    use crate::shared::constants::COMPLAINTS_TABLE;
    use crate::shared::test_helpers::{complaint_gateway, complaint_row, complaint_service};
    use chrono::Duration;
    use serde_json::{json, Value};

    fn view(gateway: &Arc<InMemoryGateway>, user: Uuid) -> ComplaintListView {
        ComplaintListView::new(Arc::new(complaint_service(gateway)), user)
    }

    fn id_of(row: &Value) -> Uuid {
        Uuid::parse_str(row["id"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_renders_newest_first_regardless_of_insertion_order() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let t1 = Utc::now();
        gateway.seed(
            COMPLAINTS_TABLE,
            vec![
                complaint_row(user, "T2", t1 - Duration::days(1)),
                complaint_row(user, "T3", t1 - Duration::days(2)),
                complaint_row(user, "T1", t1),
            ],
        );

        let mut list = view(&gateway, user);
        assert!(list.loading());
        assert_eq!(list.display(), ListDisplay::Loading);

        list.load().await;

        let titles: Vec<_> = list.cards().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["T1", "T2", "T3"]);
        assert!(!list.loading());
    }

    #[tokio::test]
    async fn test_load_error_and_retry() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        gateway.seed(COMPLAINTS_TABLE, vec![complaint_row(user, "only", Utc::now())]);
        gateway.fail(GatewayOp::Select, COMPLAINTS_TABLE, "network down");

        let mut list = view(&gateway, user);
        list.load().await;
        assert_eq!(list.display(), ListDisplay::Error("network down".to_string()));
        assert!(!list.loading());

        gateway.clear_faults();
        list.retry().await;

        assert_eq!(list.error(), None);
        assert_eq!(list.complaints().len(), 1);
        let selects = gateway.calls_of(GatewayOp::Select);
        assert_eq!(selects.len(), 2);
        assert_eq!(selects[0], selects[1]);
    }

    #[tokio::test]
    async fn test_empty_state_and_stats() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let mut list = view(&gateway, user);
        list.load().await;
        assert_eq!(list.display(), ListDisplay::Empty);
        assert_eq!(list.stats(), ListStats::default());

        let mut resolved = complaint_row(user, "done", Utc::now());
        resolved["status"] = json!("resolved");
        let mut rejected = complaint_row(user, "no", Utc::now());
        rejected["status"] = json!("rejected");
        gateway.seed(
            COMPLAINTS_TABLE,
            vec![complaint_row(user, "open", Utc::now()), resolved, rejected],
        );
        list.load().await;

        assert_eq!(
            list.stats(),
            ListStats {
                total: 3,
                pending: 1,
                resolved: 1
            }
        );
    }

    #[tokio::test]
    async fn test_delete_confirmed_removes_exactly_one() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let x = complaint_row(user, "X", Utc::now());
        let x_id = id_of(&x);
        gateway.seed(
            COMPLAINTS_TABLE,
            vec![x, complaint_row(user, "Y", Utc::now() - Duration::hours(1))],
        );

        let mut list = view(&gateway, user);
        list.load().await;

        assert!(list.request_delete(x_id));
        assert!(list.cards()[0].confirming_delete);
        assert!(list.confirm_delete().await);

        let titles: Vec<_> = list.complaints().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Y"]);
        assert_eq!(list.pending_delete_id(), None);

        let deletes = gateway.calls_of(GatewayOp::Delete);
        assert_eq!(deletes.len(), 1);
        assert_eq!(
            deletes[0].filters,
            vec![Filter::eq("id", x_id), Filter::eq("user_id", user)]
        );
    }

    #[tokio::test]
    async fn test_cancelled_confirmation_makes_no_call() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let row = complaint_row(user, "X", Utc::now());
        let id = id_of(&row);
        gateway.seed(COMPLAINTS_TABLE, vec![row]);

        let mut list = view(&gateway, user);
        list.load().await;
        assert!(list.request_delete(id));
        list.cancel_delete();

        assert!(!list.confirm_delete().await);
        assert!(gateway.calls_of(GatewayOp::Delete).is_empty());
        assert_eq!(list.complaints().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_list() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let row = complaint_row(user, "X", Utc::now());
        let id = id_of(&row);
        gateway.seed(COMPLAINTS_TABLE, vec![row]);
        gateway.fail(GatewayOp::Delete, COMPLAINTS_TABLE, "row is locked");

        let mut list = view(&gateway, user);
        list.load().await;
        list.request_delete(id);

        assert!(!list.confirm_delete().await);
        assert_eq!(list.error(), Some("row is locked"));
        assert_eq!(list.complaints().len(), 1);
        assert_eq!(list.pending_delete_id(), None);
    }

    #[tokio::test]
    async fn test_final_complaints_have_no_enabled_controls() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let mut rows = Vec::new();
        for status in ["pending", "reviewed", "resolved", "rejected"] {
            let mut row = complaint_row(user, status, Utc::now());
            row["status"] = json!(status);
            rows.push(row);
        }
        let resolved_id = id_of(&rows[2]);
        gateway.seed(COMPLAINTS_TABLE, rows);

        let mut list = view(&gateway, user);
        list.load().await;

        for card in list.cards() {
            let open = matches!(card.status, ComplaintStatus::Pending | ComplaintStatus::Reviewed);
            assert_eq!(card.can_edit, open, "{}", card.title);
            assert_eq!(card.can_delete, open, "{}", card.title);
        }
        assert!(!list.request_delete(resolved_id));
        assert_eq!(list.pending_delete_id(), None);
    }

    #[tokio::test]
    async fn test_long_description_truncates_at_120() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let mut row = complaint_row(user, "long", Utc::now());
        let description = "é".repeat(150);
        row["description"] = json!(description);
        let id = id_of(&row);
        gateway.seed(COMPLAINTS_TABLE, vec![row]);

        let mut list = view(&gateway, user);
        list.load().await;

        let cards = list.cards();
        let collapsed = &cards[0];
        assert_eq!(collapsed.description, format!("{}...", "é".repeat(120)));
        assert_eq!(collapsed.toggle_label, Some(SHOW_MORE_LABEL));

        list.toggle_expand(id);
        let cards = list.cards();
        let expanded = &cards[0];
        assert_eq!(expanded.description.chars().count(), 150);
        assert_eq!(expanded.toggle_label, Some(SHOW_LESS_LABEL));

        list.toggle_expand(id);
        assert_eq!(list.expanded_id(), None);
    }

    #[test]
    fn test_short_description_is_not_truncated() {
        assert_eq!(truncate_description(&"a".repeat(120)), None);
        assert!(truncate_description(&"a".repeat(121)).is_some());
    }

    #[tokio::test]
    async fn test_image_failures_are_per_complaint() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let mut y = complaint_row(user, "Y", Utc::now());
        y["image_url"] = json!("memory://complaints-evidence/y.png");
        let mut z = complaint_row(user, "Z", Utc::now() - Duration::minutes(1));
        z["image_url"] = json!("memory://complaints-evidence/z.png");
        let (y_id, z_id) = (id_of(&y), id_of(&z));
        gateway.seed(COMPLAINTS_TABLE, vec![y, z]);

        let mut list = view(&gateway, user);
        list.load().await;

        list.on_image_error(y_id);
        list.on_image_loaded(z_id);

        let cards = list.cards();
        assert_eq!(cards[0].image_url, None);
        assert_eq!(cards[0].image_fallback, Some(IMAGE_FALLBACK_TEXT));
        assert!(cards[1].image_url.is_some());
        assert_eq!(cards[1].image_fallback, None);
        assert_eq!(list.image_state(y_id), ImageDisplay::Failed);
    }

    #[tokio::test]
    async fn test_cancelled_load_leaves_state_untouched() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        gateway.seed(COMPLAINTS_TABLE, vec![complaint_row(user, "X", Utc::now())]);
        let gate = gateway.gate(GatewayOp::Select);

        let mut list = view(&gateway, user);
        let handle = list.scope_handle();
        let task = tokio::spawn(async move {
            list.load().await;
            list
        });

        tokio::task::yield_now().await;
        handle.cancel();
        gate.notify_one();

        let list = task.await.unwrap();
        assert!(list.complaints().is_empty());
        assert_eq!(list.error(), None);
    }
}
