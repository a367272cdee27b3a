//! Dispatch bridge between the message protocol and the core services.

use std::time::Duration;

use crate::app::reconcile::Reconciler;
use crate::app::scan::Scanner;
use crate::domain::errors::ReconcileError;
use crate::domain::model::{NodeId, ReconcileSummary, TextRecord};
use crate::infra::config::Config;
use crate::infra::host::{NodeTree, VariableStore};
use crate::infra::notify::{Notice, NotificationSink};
use crate::ui::messages::{CoreEvent, UiRequest};

/// Core-side endpoint of the UI protocol.
///
/// Owns the host handle and the services behind it. Requests come in through
/// [`handle`](Self::handle); events queue in an outbox until the embedding
/// transport drains them. Reconcile failures surface as notices, never as
/// returned errors.
pub struct UiBridge<H> {
    host: H,
    scanner: Scanner,
    reconciler: Reconciler,
    notifier: Box<dyn NotificationSink>,
    notice_timeout: Duration,
    outbox: Vec<CoreEvent>,
}

impl<H: NodeTree + VariableStore> UiBridge<H> {
    pub fn new(host: H, config: &Config, notifier: Box<dyn NotificationSink>) -> Self {
        Self {
            host,
            scanner: Scanner::new(),
            reconciler: Reconciler::from_config(config),
            notifier,
            notice_timeout: Duration::from_secs(config.defaults.notify_timeout_secs),
            outbox: Vec::new(),
        }
    }

    /// Post the initial snapshot, before any request has arrived.
    pub fn startup(&mut self) {
        self.rescan();
    }

    /// Dispatch one request.
    pub fn handle(&mut self, request: UiRequest) {
        match request {
            UiRequest::RequestScan => self.rescan(),
            UiRequest::RequestReconcile { records } => self.reconcile(records),
            UiRequest::ExportResult { success } => self.notify(export_notice(success)),
        }
    }

    /// Drain queued events for the transport to deliver.
    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn rescan(&mut self) {
        let root = self.current_root();
        let scan = self.scanner.scan(&self.host, root.as_ref());
        self.outbox.push(CoreEvent::TextLayers {
            records: scan.records,
            container_name: scan.container_name,
        });
    }

    fn reconcile(&mut self, records: Vec<TextRecord>) {
        let root = self.current_root();
        match self.reconciler.reconcile(&mut self.host, root.as_ref(), &records) {
            // Nothing selected: stay silent, keep the current snapshot.
            Ok(summary) if summary.is_empty() => {}
            Ok(summary) => {
                // Rescan first so the refreshed bound flags reach the UI
                // before the notice does.
                self.rescan();
                self.notify(summary_notice(&summary));
            }
            Err(err) => self.notify(error_notice(&err)),
        }
    }

    fn current_root(&self) -> Option<NodeId> {
        self.host.selection().into_iter().next()
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice.with_timeout(self.notice_timeout));
    }
}

/// Notice reporting a completed batch with both counts.
pub fn summary_notice(summary: &ReconcileSummary) -> Notice {
    Notice::info(format!(
        "Variables created in \"{}\" ({} succeeded, {} failed)",
        summary.container,
        summary.created_or_updated(),
        summary.failed()
    ))
}

/// Notice for a reconcile that aborted before touching any record.
pub fn error_notice(error: &ReconcileError) -> Notice {
    Notice::error(format!("Failed to create variables: {error}"))
}

/// Notice acknowledging the UI-side export outcome.
pub fn export_notice(success: bool) -> Notice {
    if success {
        Notice::info("Layers exported successfully")
    } else {
        Notice::error("Failed to export layers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::model::NodeId;
    use crate::infra::document::{DesignDocument, NodeRecord};
    use crate::infra::host::NodeKind;
    use crate::infra::notify::MemoryNotifier;

    fn small_document() -> DesignDocument {
        let mut document = DesignDocument::new();
        document.insert_node("1:2", NodeRecord::text("Title", "Hello"));
        document.insert_node(
            "1:1",
            NodeRecord::container("Card", NodeKind::Frame, vec![NodeId::new("1:2")]),
        );
        document.selection = vec![NodeId::new("1:1")];
        document
    }

    fn bridge_with(
        document: DesignDocument,
    ) -> (UiBridge<DesignDocument>, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let bridge = UiBridge::new(document, &Config::default(), Box::new(notifier.clone()));
        (bridge, notifier)
    }

    #[test]
    fn startup_posts_the_initial_snapshot() {
        let (mut bridge, notifier) = bridge_with(small_document());
        bridge.startup();

        let events = bridge.drain_events();
        assert_eq!(events.len(), 1);
        let CoreEvent::TextLayers {
            records,
            container_name,
        } = &events[0];
        assert_eq!(container_name.as_deref(), Some("Card"));
        assert_eq!(records.len(), 1);
        assert!(notifier.take().is_empty());
        assert!(bridge.drain_events().is_empty());
    }

    #[test]
    fn reconcile_rescans_then_notifies() {
        let (mut bridge, notifier) = bridge_with(small_document());
        bridge.startup();
        let CoreEvent::TextLayers { records, .. } =
            bridge.drain_events().into_iter().next().unwrap();

        bridge.handle(UiRequest::RequestReconcile { records });

        let CoreEvent::TextLayers { records, .. } =
            bridge.drain_events().into_iter().next().unwrap();
        assert!(records[0].is_bound);
        assert!(!records[0].selected);

        let notices = notifier.take();
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].message,
            "Variables created in \"Card\" (1 succeeded, 0 failed)"
        );
        assert!(!notices[0].error);
        assert_eq!(notices[0].timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_selection_stays_silent() {
        let (mut bridge, notifier) = bridge_with(small_document());
        bridge.startup();
        let CoreEvent::TextLayers { mut records, .. } =
            bridge.drain_events().into_iter().next().unwrap();
        for record in &mut records {
            record.selected = false;
        }

        bridge.handle(UiRequest::RequestReconcile { records });

        assert!(bridge.drain_events().is_empty());
        assert!(notifier.take().is_empty());
        assert!(bridge.host().collections.is_empty());
    }

    #[test]
    fn invalid_designation_surfaces_as_an_error_notice() {
        let mut document = small_document();
        document.selection.clear();
        let (mut bridge, notifier) = bridge_with(document);

        bridge.handle(UiRequest::RequestReconcile { records: Vec::new() });

        let notices = notifier.take();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].error);
        assert!(
            notices[0]
                .message
                .starts_with("Failed to create variables:")
        );
        assert!(bridge.drain_events().is_empty());
    }

    #[test]
    fn export_acknowledgements_become_notices() {
        let (mut bridge, notifier) = bridge_with(small_document());

        bridge.handle(UiRequest::ExportResult { success: true });
        bridge.handle(UiRequest::ExportResult { success: false });

        let notices = notifier.take();
        assert_eq!(notices[0].message, "Layers exported successfully");
        assert!(!notices[0].error);
        assert_eq!(notices[1].message, "Failed to export layers");
        assert!(notices[1].error);
    }
}
