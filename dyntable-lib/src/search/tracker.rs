//! Search-and-select state of a relationship widget

use std::sync::Arc;

use tokio::sync::broadcast;

use super::Debouncer;
use super::KeyInput;
use crate::assimilate::ColumnBindings;
use crate::assimilate::assimilate;
use crate::backend::RecordSearch;
use crate::config::SearchConfig;
use crate::error::Error;
use crate::event::Notification;
use crate::event::TableEvent;
use crate::model::Row;
use crate::schema::LinkifiedColumns;

const EVENT_CAPACITY: usize = 64;

/// Notification title for a rejected search.
pub const SEARCH_ERROR_TITLE: &str = "Error retrieving search data";

/// Tracks the query, candidates and selection of a search widget.
///
/// Keystrokes arm a debounce timer; when it fires the query is sent to the
/// search collaborator with every selected id excluded, so a selected
/// record never comes back as a candidate. Result and selection lists are
/// replaced, never mutated in place, so a snapshot handed to a view stays
/// consistent.
///
/// # Example
///
/// ```ignore
/// let mut tracker = SearchSelectionTracker::new(SearchConfig::new("Account", "Id,Name"), backend);
/// tracker.handle_key(KeyInput::Char('a'), "a");
/// tracker.next_search().await?;
/// ```
pub struct SearchSelectionTracker {
    config: SearchConfig,
    search: Arc<dyn RecordSearch>,
    debouncer: Debouncer,
    query: String,
    results: Arc<Vec<Row>>,
    linkified: Arc<LinkifiedColumns>,
    bindings: Arc<ColumnBindings>,
    selected: Arc<Vec<Row>>,
    selected_linkified: Arc<LinkifiedColumns>,
    in_flight: bool,
    no_results: bool,
    events: broadcast::Sender<TableEvent>,
}

impl SearchSelectionTracker {
    pub fn new(config: SearchConfig, search: Arc<dyn RecordSearch>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let debouncer = Debouncer::new(config.debounce());
        Self {
            config,
            search,
            debouncer,
            query: String::new(),
            results: Arc::default(),
            linkified: Arc::default(),
            bindings: Arc::default(),
            selected: Arc::default(),
            selected_linkified: Arc::default(),
            in_flight: false,
            no_results: false,
            events,
        }
    }

    /// Publishes events on an existing channel, e.g. a table's.
    pub fn with_events(mut self, events: broadcast::Sender<TableEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.events.subscribe()
    }

    /// Handles a released key; `text` is the input's content after the key.
    ///
    /// Returns true if the key (re)started the debounce timer. Keys that do
    /// not edit the query leave both the query and the timer untouched.
    pub fn handle_key(&mut self, key: KeyInput, text: &str) -> bool {
        if !key.triggers_search() {
            return false;
        }
        self.query = text.to_string();
        self.debouncer.schedule();
        true
    }

    /// Waits for the debounce timer, then runs the search.
    pub async fn next_search(&mut self) -> Result<(), Error> {
        self.debouncer.fired().await;
        self.run_search().await
    }

    /// Runs the search for the current query immediately.
    ///
    /// Disarms a pending debounce, so the same keystrokes never search
    /// twice. An empty query clears the results without calling the
    /// collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Search`] if the collaborator rejects the request,
    /// after publishing an error notification. Results are left as they
    /// were.
    pub async fn run_search(&mut self) -> Result<(), Error> {
        self.debouncer.cancel();
        let query = self.query.trim().to_string();
        if query.is_empty() {
            self.set_results(Vec::new(), LinkifiedColumns::new(), ColumnBindings::new());
            self.no_results = false;
            return Ok(());
        }

        let request = self.config.search_request(&query, self.selected_ids());
        log::debug!(
            "Searching {} for '{}' excluding {} id(s)",
            request.object_name,
            query,
            request.excluded_ids.len()
        );

        self.in_flight = true;
        let response = self.search.search(&request).await;
        self.in_flight = false;

        let records = match response {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Search for '{}' failed: {}", query, e);
                self.notify(Notification::error(SEARCH_ERROR_TITLE, e.message()));
                return Err(Error::Search(e));
            }
        };

        let assimilated = assimilate(&records)?;
        self.no_results = assimilated.rows.is_empty();
        self.set_results(assimilated.rows, assimilated.linkified, assimilated.bindings);
        Ok(())
    }

    /// Adds a candidate to the selection and clears the query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRecord`] if the id is not a current candidate.
    pub fn select(&mut self, record_id: &str) -> Result<(), Error> {
        let row = self
            .results
            .iter()
            .find(|r| r.id() == record_id)
            .cloned()
            .ok_or_else(|| Error::UnknownRecord(record_id.to_string()))?;

        Arc::make_mut(&mut self.selected).push(row);
        let selected_linkified = Arc::make_mut(&mut self.selected_linkified);
        for header in self.linkified.headers() {
            if let Some(label) = self.linkified.label_name(header) {
                selected_linkified.insert(header, label);
            }
        }

        self.query.clear();
        self.debouncer.cancel();
        self.no_results = false;
        self.set_results(Vec::new(), LinkifiedColumns::new(), ColumnBindings::new());
        self.publish_selection();
        Ok(())
    }

    /// Removes a record from the selection. Returns false if it was not
    /// selected.
    pub fn remove(&mut self, record_id: &str) -> bool {
        if !self.selected.iter().any(|r| r.id() == record_id) {
            return false;
        }
        self.selected = Arc::new(
            self.selected
                .iter()
                .filter(|r| r.id() != record_id)
                .cloned()
                .collect(),
        );
        self.publish_selection();
        true
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current candidates.
    pub fn results(&self) -> Arc<Vec<Row>> {
        Arc::clone(&self.results)
    }

    pub fn linkified(&self) -> Arc<LinkifiedColumns> {
        Arc::clone(&self.linkified)
    }

    pub fn bindings(&self) -> Arc<ColumnBindings> {
        Arc::clone(&self.bindings)
    }

    /// Selected records, in selection order.
    pub fn selected(&self) -> Arc<Vec<Row>> {
        Arc::clone(&self.selected)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().map(|r| r.id().to_string()).collect()
    }

    /// True while a search is pending or in flight.
    pub fn is_loading(&self) -> bool {
        self.debouncer.is_armed() || self.in_flight
    }

    /// True when the last non-empty query found nothing.
    pub fn no_results(&self) -> bool {
        self.no_results
    }

    fn set_results(&mut self, rows: Vec<Row>, linkified: LinkifiedColumns, bindings: ColumnBindings) {
        self.results = Arc::new(rows);
        self.linkified = Arc::new(linkified);
        self.bindings = Arc::new(bindings);
        let _ = self.events.send(TableEvent::SearchResultsChanged {
            rows: self.results(),
            linkified: self.linkified(),
            bindings: self.bindings(),
        });
    }

    fn publish_selection(&self) {
        let _ = self.events.send(TableEvent::SelectionChanged {
            selected: self.selected(),
            linkified: Arc::clone(&self.selected_linkified),
        });
    }

    fn notify(&self, notification: Notification) {
        let _ = self.events.send(TableEvent::Notification(notification));
    }
}

impl std::fmt::Debug for SearchSelectionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSelectionTracker")
            .field("config", &self.config)
            .field("query", &self.query)
            .field("results", &self.results.len())
            .field("selected", &self.selected.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::backend::Call;
    use crate::backend::InMemoryBackend;
    use crate::error::ApiError;
    use crate::model::RawRecord;

    fn backend() -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        backend.insert_record(RawRecord::new("Account", "001A").set("Name", "Acme"));
        backend.insert_record(RawRecord::new("Account", "001B").set("Name", "Acme West"));
        backend.insert_record(RawRecord::new("Account", "001C").set("Name", "Globex"));
        backend
    }

    fn tracker(backend: &Arc<InMemoryBackend>) -> SearchSelectionTracker {
        let config = SearchConfig::new("Account", "Id,Name").with_search_paths("Name");
        SearchSelectionTracker::new(config, backend.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_debounce_into_one_search() {
        let backend = backend();
        let mut tracker = tracker(&backend);

        tracker.handle_key(KeyInput::Char('a'), "a");
        tokio::time::sleep(Duration::from_millis(50)).await;
        tracker.handle_key(KeyInput::Char('c'), "ac");
        tokio::time::sleep(Duration::from_millis(50)).await;
        tracker.handle_key(KeyInput::Char('m'), "acm");
        let last_key = Instant::now();
        assert!(tracker.is_loading());

        tracker.next_search().await.unwrap();

        let elapsed = last_key.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(310));
        assert_eq!(backend.calls(Call::Search), 1);
        assert_eq!(backend.searches().await[0].query, "acm");
        assert_eq!(tracker.results().len(), 2);
        assert!(!tracker.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_modifier_keys_do_not_restart_timer() {
        let backend = backend();
        let mut tracker = tracker(&backend);

        tracker.handle_key(KeyInput::Char('g'), "g");
        let first_key = Instant::now();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!tracker.handle_key(KeyInput::Other, "g"));

        tracker.next_search().await.unwrap();
        assert!(first_key.elapsed() < Duration::from_millis(310));
        assert_eq!(tracker.results().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_search_disarms_debounce() {
        let backend = backend();
        let mut tracker = tracker(&backend);

        tracker.handle_key(KeyInput::Char('a'), "acme");
        tracker.run_search().await.unwrap();
        assert!(!tracker.is_loading());

        let again = tokio::time::timeout(Duration::from_secs(1), tracker.next_search()).await;
        assert!(again.is_err());
        assert_eq!(backend.calls(Call::Search), 1);
    }

    #[tokio::test]
    async fn test_selected_ids_are_excluded() {
        let backend = backend();
        let mut tracker = tracker(&backend);

        tracker.handle_key(KeyInput::Char('a'), "acme");
        tracker.run_search().await.unwrap();
        tracker.select("001A").unwrap();
        assert_eq!(tracker.query(), "");
        assert!(tracker.results().is_empty());

        tracker.handle_key(KeyInput::Char('a'), "acme");
        tracker.run_search().await.unwrap();
        let ids: Vec<_> = tracker.results().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["001B"]);
        assert_eq!(backend.searches().await[1].excluded_ids, vec!["001A"]);
    }

    #[tokio::test]
    async fn test_empty_query_clears_without_request() {
        let backend = backend();
        let mut tracker = tracker(&backend);

        tracker.handle_key(KeyInput::Char('a'), "acme");
        tracker.run_search().await.unwrap();
        assert_eq!(tracker.results().len(), 2);

        tracker.handle_key(KeyInput::Backspace, "  ");
        tracker.run_search().await.unwrap();
        assert!(tracker.results().is_empty());
        assert!(!tracker.no_results());
        assert_eq!(backend.calls(Call::Search), 1);
    }

    #[tokio::test]
    async fn test_no_results_flag() {
        let backend = backend();
        let mut tracker = tracker(&backend);
        tracker.handle_key(KeyInput::Char('z'), "zzz");
        tracker.run_search().await.unwrap();
        assert!(tracker.no_results());
    }

    #[tokio::test]
    async fn test_search_failure_notifies_and_keeps_results() {
        let backend = backend();
        let mut tracker = tracker(&backend);
        let mut events = tracker.subscribe();

        tracker.handle_key(KeyInput::Char('a'), "acme");
        tracker.run_search().await.unwrap();

        backend.fail(Call::Search, ApiError::rejected("Search is down"));
        tracker.handle_key(KeyInput::Char('w'), "acme w");
        let err = tracker.run_search().await.unwrap_err();
        assert!(matches!(err, Error::Search(_)));
        assert_eq!(tracker.results().len(), 2);

        let mut notification = None;
        while let Ok(event) = events.try_recv() {
            if let Some(n) = event.as_notification() {
                notification = Some(n.clone());
            }
        }
        let notification = notification.unwrap();
        assert_eq!(notification.title, SEARCH_ERROR_TITLE);
        assert_eq!(notification.message, "Search is down");
    }

    #[tokio::test]
    async fn test_select_and_remove() {
        let backend = backend();
        let mut tracker = tracker(&backend);

        tracker.handle_key(KeyInput::Char('a'), "acme");
        tracker.run_search().await.unwrap();
        assert!(matches!(tracker.select("001C"), Err(Error::UnknownRecord(_))));

        let before = tracker.selected();
        tracker.select("001B").unwrap();
        assert!(before.is_empty());
        assert_eq!(tracker.selected_ids(), vec!["001B"]);

        assert!(tracker.remove("001B"));
        assert!(!tracker.remove("001B"));
        assert!(tracker.selected().is_empty());
    }
}
