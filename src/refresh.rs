//! Full tree re-render from the server, preserving what the user had open and
//! selected.

use crate::backend::{Backend, HttpReply};
use crate::error::BackendError;
use crate::notify::{Level, Notifier};
use crate::selection::{SelectionEntry, SelectionStore};
use crate::tree::{ExpandedSet, ExpansionTracker, FileTree, MarkupNode, TreePayload, TreeSorter};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    Idle,
    Loading,
}

/// Snapshot taken when a refresh starts; handed back with the reply.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    generation: u64,
    expanded: ExpandedSet,
    selection: Vec<SelectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New content installed; `restored` selections survived the re-render.
    Success { restored: usize },
    Failed(String),
    /// A newer refresh was started after this one; nothing was touched.
    Stale,
}

enum Payload {
    Markup(Vec<MarkupNode>),
    Error(String),
    Empty,
    Unreachable(String),
}

impl Payload {
    fn interpret(reply: Result<HttpReply, BackendError>) -> Payload {
        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => return Payload::Unreachable(e.to_string()),
        };
        if !reply.is_success() {
            return match reply.error_field() {
                Some(error) => Payload::Error(error),
                None => Payload::Unreachable(format!("HTTP error! status: {}", reply.status)),
            };
        }
        match serde_json::from_str::<TreePayload>(&reply.body) {
            Ok(TreePayload {
                error: Some(error), ..
            }) => Payload::Error(error),
            Ok(TreePayload {
                markup: Some(markup),
                ..
            }) if !markup.is_empty() => Payload::Markup(markup),
            _ => Payload::Empty,
        }
    }
}

#[derive(Debug)]
pub struct RefreshOrchestrator {
    state: RefreshState,
    generation: u64,
}

impl Default for RefreshOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshOrchestrator {
    pub fn new() -> Self {
        RefreshOrchestrator {
            state: RefreshState::Idle,
            generation: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == RefreshState::Loading
    }

    /// Idle -> Loading: snapshot expansion and selection, dim the tree.
    pub fn begin(&mut self, tree: &mut FileTree) -> RefreshTicket {
        self.generation += 1;
        self.state = RefreshState::Loading;
        tree.set_loading(true);

        let ticket = RefreshTicket {
            generation: self.generation,
            expanded: ExpansionTracker::capture(tree),
            selection: SelectionStore::capture(tree),
        };
        info!(
            generation = ticket.generation,
            expanded = ticket.expanded.len(),
            selected = ticket.selection.len(),
            "refresh started"
        );
        ticket
    }

    /// Apply the reply for `ticket` and return to Idle. Replies for anything
    /// but the latest ticket are dropped.
    pub fn complete(
        &mut self,
        ticket: RefreshTicket,
        reply: Result<HttpReply, BackendError>,
        tree: &mut FileTree,
        selection: &mut SelectionStore,
        notifier: &mut dyn Notifier,
    ) -> RefreshOutcome {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                latest = self.generation,
                "discarding stale refresh reply"
            );
            return RefreshOutcome::Stale;
        }

        let outcome = match Payload::interpret(reply) {
            Payload::Markup(markup) => {
                tree.install(&markup);
                tree.unwrap_root();
                TreeSorter::sort(tree);
                ExpansionTracker::restore(tree, &ticket.expanded);
                let restored = SelectionStore::restore(tree, &ticket.selection);
                info!(restored, "file tree refreshed");
                RefreshOutcome::Success { restored }
            }
            Payload::Error(error) => {
                tree.show_message(format!("Error loading file tree: {}", error));
                notifier.notify(
                    Level::Error,
                    format!("Error refreshing file tree: {}", error),
                );
                RefreshOutcome::Failed(error)
            }
            Payload::Empty => {
                tree.show_message("Empty response received.");
                notifier.notify(
                    Level::Warning,
                    "Received empty response during refresh.".to_string(),
                );
                RefreshOutcome::Failed("Empty response received.".to_string())
            }
            Payload::Unreachable(msg) => {
                warn!(error = %msg, "refresh request failed");
                tree.show_message(format!("Failed to load file tree. {}", msg));
                notifier.notify(Level::Error, format!("Failed to refresh file tree: {}", msg));
                RefreshOutcome::Failed(msg)
            }
        };

        // The summary follows the controls; after a failure that means empty.
        selection.recompute(tree);
        tree.set_loading(false);
        self.state = RefreshState::Idle;
        outcome
    }

    pub async fn refresh(
        &mut self,
        backend: &dyn Backend,
        tree: &mut FileTree,
        selection: &mut SelectionStore,
        notifier: &mut dyn Notifier,
    ) -> RefreshOutcome {
        let ticket = self.begin(tree);
        let reply = backend.refresh_tree().await;
        self.complete(ticket, reply, tree, selection, notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::notify::ToastQueue;
    use crate::tree::dom::tests::sample_markup;
    use crate::tree::{Container, TreeModel};
    use serde_json::json;
    use std::time::Duration;

    fn rendered() -> FileTree {
        let mut tree = FileTree::from_markup(&sample_markup());
        tree.unwrap_root();
        TreeSorter::sort(&mut tree);
        tree
    }

    fn markup_reply(nodes: &[MarkupNode]) -> HttpReply {
        HttpReply::ok_json(&json!({ "markup": nodes }))
    }

    fn folder_named(tree: &FileTree, name: &str) -> usize {
        tree.folders()
            .find(|&id| tree.display_name(id) == name)
            .unwrap()
    }

    fn open_paths(tree: &FileTree) -> Vec<String> {
        ExpansionTracker::capture(tree)
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[tokio::test]
    async fn success_keeps_expansion_and_selection() {
        let mut tree = rendered();
        let mut selection = SelectionStore::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        let src = folder_named(&tree, "src");
        ExpansionTracker::open(&mut tree, src);
        let lib = folder_named(&tree, "lib");
        ExpansionTracker::open(&mut tree, lib);
        selection.add_file(&mut tree, "src/lib/util.py");
        selection.add_file(&mut tree, "notes.txt");

        let fake = FakeBackend::new();
        fake.push_reply(markup_reply(&sample_markup()));
        let mut refresh = RefreshOrchestrator::new();
        let outcome = refresh
            .refresh(&fake, &mut tree, &mut selection, &mut toasts)
            .await;

        assert_eq!(outcome, RefreshOutcome::Success { restored: 2 });
        assert_eq!(open_paths(&tree), vec!["src", "src/lib"]);
        let selected: Vec<String> = SelectionStore::capture(&tree)
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(selected, vec!["src/lib/util.py", "notes.txt"]);
        assert_eq!(selection.summary().count(), 2);
        assert!(!tree.is_loading());
        assert!(!tree.is_dimmed());
        assert!(!refresh.is_loading());
    }

    #[tokio::test]
    async fn new_content_is_unwrapped_and_sorted() {
        let mut tree = FileTree::new();
        let mut selection = SelectionStore::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        let fake = FakeBackend::new();
        fake.push_reply(markup_reply(&[MarkupNode::folder(
            "root",
            vec![
                MarkupNode::file("README.md", "README.md"),
                MarkupNode::folder("src", vec![MarkupNode::file("app.py", "src/app.py")]),
            ],
        )]));

        RefreshOrchestrator::new()
            .refresh(&fake, &mut tree, &mut selection, &mut toasts)
            .await;

        let names: Vec<String> = TreeModel::new(&tree)
            .nodes()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["src", "README.md"]);
        assert_eq!(tree.children(Container::Root).len(), 2);
    }

    #[tokio::test]
    async fn error_payload_replaces_tree_with_message() {
        let mut tree = rendered();
        let mut selection = SelectionStore::new();
        selection.add_file(&mut tree, "README.md");
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        let fake = FakeBackend::new();
        fake.push_reply(HttpReply::error_json(500, "disk unavailable"));

        let outcome = RefreshOrchestrator::new()
            .refresh(&fake, &mut tree, &mut selection, &mut toasts)
            .await;

        assert_eq!(outcome, RefreshOutcome::Failed("disk unavailable".into()));
        assert_eq!(tree.message(), Some("Error loading file tree: disk unavailable"));
        assert!(tree.is_empty());
        assert!(!tree.is_loading());
        let notice = toasts.latest().unwrap();
        assert_eq!(notice.level, Level::Error);
        assert_eq!(notice.message, "Error refreshing file tree: disk unavailable");
        assert_eq!(selection.summary().count(), 0);
    }

    #[tokio::test]
    async fn empty_and_unreachable_replies_fail_cleanly() {
        let mut tree = rendered();
        let mut selection = SelectionStore::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        let fake = FakeBackend::new();
        fake.push_reply(HttpReply::ok_json(&json!({})))
            .push_reply(HttpReply::new(502, "Bad Gateway"))
            .push_transport_error("connection refused");
        let mut refresh = RefreshOrchestrator::new();

        refresh
            .refresh(&fake, &mut tree, &mut selection, &mut toasts)
            .await;
        assert_eq!(tree.message(), Some("Empty response received."));
        assert_eq!(toasts.latest().unwrap().level, Level::Warning);

        refresh
            .refresh(&fake, &mut tree, &mut selection, &mut toasts)
            .await;
        assert_eq!(
            tree.message(),
            Some("Failed to load file tree. HTTP error! status: 502")
        );

        refresh
            .refresh(&fake, &mut tree, &mut selection, &mut toasts)
            .await;
        assert_eq!(tree.message(), Some("Failed to load file tree. connection refused"));
        assert_eq!(
            toasts.latest().unwrap().message,
            "Failed to refresh file tree: connection refused"
        );
        assert!(!tree.is_loading());
    }

    #[test]
    fn stale_reply_is_discarded() {
        let mut tree = rendered();
        let mut selection = SelectionStore::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        let mut refresh = RefreshOrchestrator::new();

        let first = refresh.begin(&mut tree);
        let second = refresh.begin(&mut tree);
        assert!(second.generation > first.generation);

        let outcome = refresh.complete(
            first,
            Ok(HttpReply::error_json(500, "late")),
            &mut tree,
            &mut selection,
            &mut toasts,
        );
        assert_eq!(outcome, RefreshOutcome::Stale);
        assert!(tree.message().is_none());
        assert!(tree.is_loading());
        assert!(toasts.latest().is_none());

        let outcome = refresh.complete(
            second,
            Ok(markup_reply(&sample_markup())),
            &mut tree,
            &mut selection,
            &mut toasts,
        );
        assert_eq!(outcome, RefreshOutcome::Success { restored: 0 });
        assert!(!refresh.is_loading());
    }
}
