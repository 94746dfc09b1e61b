//! Sectioned, paginated and searchable user list state.
//!
//! [`UserListController`] owns two fetch lanes: the browse lane feeding the
//! alphabetical [`GroupedIndex`], and the search lane feeding the flat
//! [`SearchState`] results. Fetches run on a [`FetchExecutor`]; their
//! completions are applied only from [`UserListController::process_completions`],
//! which the UI loop calls on its own thread. Everything the list widget and the
//! surrounding screen should react to is queued as a [`ListEvent`].

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetch::{CursorId, FetchCompletion, FetchExecutor, FetchKind, SharedCursor, fetch_job};
use crate::grouping::GroupedIndex;
use crate::model::{IndexPath, Session, User, capitalized};
use crate::search::{SearchScope, SearchState};
use crate::source::{ListMode, UserSource, UsersRequest};

/// Message shown when a list has nothing to display.
pub const NO_USERS_FOUND: &str = "No users found";

/// Notifications for the list widget and its collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEvent {
    /// Section or row contents changed; redraw.
    Reload,
    ShowEmptyState(String),
    ClearEmptyState,
    /// Whether any fetch is still in flight.
    Loading(bool),
    /// A refresh or pagination fetch failed.
    ShowError(FetchError),
    UserSelected { user: User, position: IndexPath },
    /// Navigate to a conversation with this user.
    OpenConversation(User),
}

struct Lane {
    id: CursorId,
    cursor: SharedCursor,
    in_flight: bool,
    exhausted: bool,
}

pub struct UserListController {
    session: Session,
    source: Box<dyn UserSource>,
    executor: Box<dyn FetchExecutor>,
    mode: ListMode,
    page_size: Option<usize>,
    index: GroupedIndex,
    search: SearchState,
    browse: Option<Lane>,
    search_lane: Option<Lane>,
    next_cursor: u64,
    tx: Sender<FetchCompletion>,
    rx: Receiver<FetchCompletion>,
    events: Vec<ListEvent>,
}

impl UserListController {
    pub fn new(
        session: Session,
        source: impl UserSource + 'static,
        executor: impl FetchExecutor + 'static,
    ) -> Self {
        let (tx, rx) = channel();
        Self {
            session,
            source: Box::new(source),
            executor: Box::new(executor),
            mode: ListMode::default(),
            page_size: None,
            index: GroupedIndex::new(),
            search: SearchState::default(),
            browse: None,
            search_lane: None,
            next_cursor: 0,
            tx,
            rx,
            events: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: ListMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the page size of the browsing modes.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn grouped(&self) -> &GroupedIndex {
        &self.index
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn is_loading(&self) -> bool {
        self.browse.as_ref().is_some_and(|l| l.in_flight)
            || self.search_lane.as_ref().is_some_and(|l| l.in_flight)
    }

    /// True once the browse cursor returned an empty page.
    pub fn is_exhausted(&self) -> bool {
        self.browse.as_ref().is_some_and(|l| l.exhausted)
    }

    /// Drain queued events in emission order.
    pub fn take_events(&mut self) -> Vec<ListEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- commands ----------------------------------------------------------

    /// Drop the grouped list and start over from the first page.
    pub fn refresh(&mut self) {
        info!(mode = self.mode.label(), "refreshing user list");
        self.index.clear();
        let request = UsersRequest::for_mode(self.mode, self.page_size, None);
        self.browse = Some(self.open_lane(&request));
        self.events.push(ListEvent::Reload);
        self.dispatch(FetchKind::Reset);
    }

    /// Fetch the following page of whatever the list currently shows.
    ///
    /// Returns `false` when nothing was issued: no cursor yet, a fetch is
    /// already running on it, or it is exhausted.
    pub fn fetch_next_page(&mut self) -> bool {
        if self.search.is_active() {
            self.dispatch(FetchKind::SearchAppend)
        } else {
            self.dispatch(FetchKind::Append)
        }
    }

    pub fn begin_search(&mut self) {
        self.search.session_open = true;
    }

    /// Close the search session; the list falls back to the grouped index.
    pub fn end_search(&mut self) {
        self.search.reset();
        self.search_lane = None;
        self.events.push(ListEvent::Reload);
        self.push_empty_state(self.index.is_empty() && self.is_exhausted());
        self.events.push(ListEvent::Loading(self.is_loading()));
    }

    pub fn set_search_query(&mut self, text: &str) {
        self.search.session_open = true;
        self.search.query = text.to_string();
        let request = UsersRequest::for_mode(self.mode, self.page_size, Some(text));
        debug!(query = text, "new search cursor");
        self.search_lane = Some(self.open_lane(&request));
        self.dispatch(FetchKind::Search);
    }

    /// Engage or release the secondary filter and rerun the current query.
    pub fn set_scope(&mut self, scope: SearchScope) {
        if self.search.scope == scope {
            return;
        }
        self.search.scope = scope;
        if self.search.session_open {
            let query = self.search.query.clone();
            self.set_search_query(&query);
        }
    }

    pub fn set_mode(&mut self, mode: ListMode) {
        if self.mode == mode {
            return;
        }
        info!(from = self.mode.label(), to = mode.label(), "switching list mode");
        self.mode = mode;
        self.refresh();
        if self.search.session_open {
            let query = self.search.query.clone();
            self.set_search_query(&query);
        }
    }

    // ---- widget data source ------------------------------------------------

    pub fn is_search_active(&self) -> bool {
        self.search.is_active()
    }

    pub fn section_count(&self) -> usize {
        if self.is_search_active() {
            1
        } else {
            self.index.len()
        }
    }

    pub fn row_count(&self, section: usize) -> usize {
        if self.is_search_active() {
            if section == 0 { self.search.results().len() } else { 0 }
        } else {
            self.index.section(section).map_or(0, <[User]>::len)
        }
    }

    pub fn row_content(&self, section: usize, row: usize) -> Option<&User> {
        if self.is_search_active() {
            if section != 0 {
                return None;
            }
            self.search.results().get(row)
        } else {
            self.index.section(section)?.get(row)
        }
    }

    pub fn section_title(&self, section: usize) -> String {
        if self.is_search_active() {
            return String::new();
        }
        self.index
            .section(section)
            .and_then(|users| users.first())
            .and_then(|u| capitalized(&u.name).chars().next())
            .map(String::from)
            .unwrap_or_default()
    }

    // ---- widget signals ----------------------------------------------------

    /// The widget is about to show `(section, row)`; paginate when it is the
    /// very last row.
    pub fn will_display_row(&mut self, section: usize, row: usize) -> bool {
        let sections = self.section_count();
        if sections == 0 {
            return false;
        }
        let last = sections - 1;
        let rows = self.row_count(last);
        if rows == 0 || section != last || row != rows - 1 {
            return false;
        }
        self.fetch_next_page()
    }

    pub fn on_row_selected(&mut self, section: usize, row: usize) -> bool {
        let Some(user) = self.row_content(section, row).cloned() else {
            return false;
        };
        debug!(user = %user.id, section, row, "user selected");
        self.events.push(ListEvent::UserSelected {
            user: user.clone(),
            position: IndexPath::new(section, row),
        });
        self.events.push(ListEvent::OpenConversation(user));
        true
    }

    // ---- completions -------------------------------------------------------

    /// Apply every finished fetch. Call from the UI thread.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.rx.try_recv() {
            if self.apply(done) {
                applied += 1;
            }
        }
        applied
    }

    fn apply(&mut self, done: FetchCompletion) -> bool {
        let lane = if done.kind.is_search() {
            self.search_lane.as_mut()
        } else {
            self.browse.as_mut()
        };
        let Some(lane) = lane.filter(|l| l.id == done.cursor) else {
            debug!(cursor = done.cursor.0, kind = ?done.kind, "dropping stale completion");
            return false;
        };
        lane.in_flight = false;
        if matches!(&done.result, Ok(page) if page.is_empty()) {
            lane.exhausted = true;
        }

        match done.result {
            Err(e) if done.kind == FetchKind::Search => {
                debug!(error = %e, "search fetch failed");
            }
            Err(e) => {
                warn!(error = %e, kind = ?done.kind, "user fetch failed");
                self.events.push(ListEvent::ShowError(e));
            }
            Ok(page) => {
                let fetched = page.len();
                let page: Vec<User> = page
                    .into_iter()
                    .filter(|u| u.id != self.session.id)
                    .collect();
                self.apply_page(done.kind, fetched, page);
            }
        }
        self.events.push(ListEvent::Loading(self.is_loading()));
        true
    }

    /// Merge a page into whatever the lane feeds. `fetched` counts the page as
    /// the source served it, before the session user was dropped.
    fn apply_page(&mut self, kind: FetchKind, fetched: usize, page: Vec<User>) {
        let (shown, empty) = match kind {
            FetchKind::Reset | FetchKind::Append => {
                let before = self.index.user_count();
                self.index.merge_page(&page);
                debug!(
                    added = page.len(),
                    sections = self.index.len(),
                    "merged page into grouped list"
                );
                (self.index.user_count() - before, self.index.is_empty())
            }
            FetchKind::Search => {
                let shown = self.search.replace_results(page);
                (shown, self.search.results().is_empty())
            }
            FetchKind::SearchAppend => {
                let shown = self.search.append_results(page);
                (shown, self.search.results().is_empty())
            }
        };
        self.events.push(ListEvent::Reload);

        // A page that shows nothing leaves the widget no new last row to
        // paginate from; keep reading until a row appears or the cursor is dry.
        if fetched > 0 && shown == 0 && self.dispatch(kind.follow_up()) {
            debug!(fetched, kind = ?kind, "page filtered out entirely, fetching next");
            return;
        }
        self.push_empty_state(empty);
    }

    fn push_empty_state(&mut self, empty: bool) {
        if empty {
            self.events
                .push(ListEvent::ShowEmptyState(NO_USERS_FOUND.to_string()));
        } else {
            self.events.push(ListEvent::ClearEmptyState);
        }
    }

    fn open_lane(&mut self, request: &UsersRequest) -> Lane {
        self.next_cursor += 1;
        let id = CursorId(self.next_cursor);
        debug!(cursor = id.0, limit = request.limit, friends = request.friends_only, "cursor created");
        Lane {
            id,
            cursor: Arc::new(Mutex::new(self.source.create_cursor(request))),
            in_flight: false,
            exhausted: false,
        }
    }

    fn dispatch(&mut self, kind: FetchKind) -> bool {
        let lane = if kind.is_search() {
            self.search_lane.as_mut()
        } else {
            self.browse.as_mut()
        };
        let Some(lane) = lane else { return false };
        if lane.in_flight || lane.exhausted {
            return false;
        }
        lane.in_flight = true;
        let job = fetch_job(Arc::clone(&lane.cursor), lane.id, kind, self.tx.clone());
        self.events.push(ListEvent::Loading(true));
        self.executor.execute(job);
        true
    }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fetch::{InlineExecutor, Job};
	use crate::model::UserStatus;
	use crate::source::MemorySource;
	use std::cell::RefCell;
	use std::rc::Rc;

	/// Holds jobs until the test runs them.
	#[derive(Clone, Default)]
	struct ManualExecutor {
		queue: Rc<RefCell<Vec<Job>>>,
	}

	impl ManualExecutor {
		fn run_all(&self) {
			let jobs: Vec<Job> = self.queue.borrow_mut().drain(..).collect();
			for job in jobs {
				job();
			}
		}

		fn run_first(&self) {
			let job = self.queue.borrow_mut().remove(0);
			job();
		}

		fn pending(&self) -> usize {
			self.queue.borrow().len()
		}
	}

	impl FetchExecutor for ManualExecutor {
		fn execute(&self, job: Job) {
			self.queue.borrow_mut().push(job);
		}
	}

	fn users(items: &[(&str, &str)]) -> Vec<User> {
		items.iter().map(|(id, name)| User::new(*id, *name)).collect()
	}

	fn session() -> Session {
		Session::new("me", "Me")
	}

	fn inline(source: MemorySource) -> UserListController {
		UserListController::new(session(), source, InlineExecutor)
	}

	#[test]
	fn refresh_groups_first_page() {
		let mut c = inline(MemorySource::new(users(&[("1", "bob"), ("2", "alice")])));
		c.refresh();
		assert!(c.is_loading());
		assert_eq!(c.process_completions(), 1);
		assert!(!c.is_loading());

		assert_eq!(c.section_count(), 2);
		assert_eq!(c.section_title(0), "A");
		assert_eq!(c.section_title(1), "B");
		assert_eq!(c.row_content(0, 0).map(|u| u.name.as_str()), Some("alice"));
		let events = c.take_events();
		assert!(events.contains(&ListEvent::Reload));
		assert!(events.contains(&ListEvent::ClearEmptyState));
	}

	#[test]
	fn empty_first_page_shows_empty_state() {
		let mut c = inline(MemorySource::new(vec![]));
		c.refresh();
		c.process_completions();
		assert_eq!(c.section_count(), 0);
		assert!(c.is_exhausted());
		assert!(c.take_events().contains(&ListEvent::ShowEmptyState(NO_USERS_FOUND.into())));
	}

	#[test]
	fn refresh_error_is_surfaced_without_touching_list() {
		let src = MemorySource::new(users(&[("1", "bob")]));
		let mut c = inline(src.clone()).with_page_size(1);
		c.refresh();
		c.process_completions();
		c.take_events();

		src.fail_next(FetchError::Unavailable("offline".into()));
		assert!(c.fetch_next_page());
		c.process_completions();
		assert_eq!(c.section_count(), 1);
		let events = c.take_events();
		assert!(events.contains(&ListEvent::ShowError(FetchError::Unavailable("offline".into()))));
		assert!(!events.contains(&ListEvent::Reload));
	}

	#[test]
	fn pagination_appends_and_stops_when_exhausted() {
		let src = MemorySource::new(users(&[("1", "bob"), ("2", "bea"), ("3", "bill")]));
		let mut c = inline(src.clone()).with_page_size(2);
		c.refresh();
		c.process_completions();
		assert_eq!(c.row_count(0), 2);

		assert!(c.will_display_row(0, 1));
		c.process_completions();
		let ids: Vec<&str> = (0..c.row_count(0))
			.filter_map(|r| c.row_content(0, r))
			.map(|u| u.id.as_str())
			.collect();
		assert_eq!(ids, vec!["1", "2", "3"]);

		assert!(c.fetch_next_page());
		c.process_completions();
		assert!(c.is_exhausted());
		let before = src.fetch_count();
		assert!(!c.fetch_next_page());
		assert_eq!(src.fetch_count(), before);
	}

	#[test]
	fn will_display_ignores_rows_other_than_last() {
		let mut c = inline(MemorySource::new(users(&[("1", "bob"), ("2", "alice"), ("3", "amy")])));
		c.refresh();
		c.process_completions();
		assert!(!c.will_display_row(0, 1));
		assert!(!c.will_display_row(1, 5));
		assert!(c.will_display_row(1, 0));
	}

	#[test]
	fn in_flight_fetch_blocks_duplicate_pagination() {
		let exec = ManualExecutor::default();
		let src = MemorySource::new(users(&[("1", "bob"), ("2", "bea")]));
		let mut c = UserListController::new(session(), src, exec.clone()).with_page_size(1);
		c.refresh();
		assert!(!c.fetch_next_page());
		assert_eq!(exec.pending(), 1);
		exec.run_all();
		c.process_completions();
		assert!(c.fetch_next_page());
	}

	#[test]
	fn stale_completion_after_refresh_is_ignored() {
		let exec = ManualExecutor::default();
		let src = MemorySource::new(users(&[("1", "bob"), ("2", "alice")]));
		let mut c = UserListController::new(session(), src.clone(), exec.clone());
		c.refresh();
		src.push_user(User::new("3", "carol"));
		c.refresh();
		assert_eq!(exec.pending(), 2);

		// The first job belongs to the discarded cursor.
		exec.run_first();
		assert_eq!(c.process_completions(), 0);
		assert!(c.grouped().is_empty());

		exec.run_all();
		assert_eq!(c.process_completions(), 1);
		assert_eq!(c.section_count(), 3);
	}

	#[test]
	fn search_replaces_results_and_uses_single_section() {
		let mut c = inline(MemorySource::new(users(&[("1", "bob"), ("2", "alice")])));
		c.refresh();
		c.process_completions();

		c.begin_search();
		c.set_search_query("al");
		c.process_completions();
		assert!(c.is_search_active());
		assert_eq!(c.section_count(), 1);
		assert_eq!(c.row_count(0), 1);
		assert_eq!(c.section_title(0), "");
		assert_eq!(c.row_content(0, 0).map(|u| u.id.as_str()), Some("2"));
		assert!(c.row_content(0, 1).is_none());

		c.set_search_query("zz");
		c.process_completions();
		assert_eq!(c.row_count(0), 0);
		assert!(c.take_events().contains(&ListEvent::ShowEmptyState(NO_USERS_FOUND.into())));

		c.end_search();
		assert!(!c.is_search_active());
		assert_eq!(c.section_count(), 2);
	}

	#[test]
	fn search_errors_are_silent() {
		let src = MemorySource::new(users(&[("1", "bob")]));
		let mut c = inline(src.clone());
		src.fail_next(FetchError::Unavailable("offline".into()));
		c.set_search_query("bo");
		c.process_completions();
		assert!(!c.take_events().iter().any(|e| matches!(e, ListEvent::ShowError(_))));
	}

	#[test]
	fn stale_search_completion_is_ignored() {
		let exec = ManualExecutor::default();
		let src = MemorySource::new(users(&[("1", "bob"), ("2", "alice")]));
		let mut c = UserListController::new(session(), src, exec.clone());
		c.set_search_query("b");
		c.set_search_query("al");
		exec.run_all();
		assert_eq!(c.process_completions(), 1);
		assert_eq!(c.row_count(0), 1);
		assert_eq!(c.row_content(0, 0).map(|u| u.name.as_str()), Some("alice"));
	}

	#[test]
	fn scope_engages_search_without_query() {
		let src = MemorySource::new(vec![
			User::new("1", "bob"),
			User::new("2", "alice").with_status(UserStatus::Unavailable),
		]);
		let mut c = inline(src);
		c.begin_search();
		assert!(!c.is_search_active());
		c.set_scope(SearchScope::AvailableOnly);
		c.process_completions();
		assert!(c.is_search_active());
		assert_eq!(c.row_count(0), 1);
		assert_eq!(c.row_content(0, 0).map(|u| u.id.as_str()), Some("1"));
	}

	#[test]
	fn session_user_is_not_listed() {
		let mut c = inline(MemorySource::new(users(&[("me", "Me"), ("2", "alice")])));
		c.refresh();
		c.process_completions();
		assert_eq!(c.grouped().user_count(), 1);
	}

	#[test]
	fn scope_filtered_page_keeps_reading_until_someone_shows() {
		let src = MemorySource::new(vec![
			User::new("1", "ann").with_status(UserStatus::Unavailable),
			User::new("2", "abe").with_status(UserStatus::Unavailable),
			User::new("3", "amy"),
		]);
		let mut c = inline(src.clone()).with_page_size(2);
		c.begin_search();
		c.set_scope(SearchScope::AvailableOnly);
		c.process_completions();

		assert_eq!(c.row_count(0), 1);
		assert_eq!(c.row_content(0, 0).map(|u| u.name.as_str()), Some("amy"));
		let events = c.take_events();
		assert!(!events.contains(&ListEvent::ShowEmptyState(NO_USERS_FOUND.into())));
		assert_eq!(events.last(), Some(&ListEvent::Loading(false)));
		assert_eq!(src.fetch_count(), 2);
	}

	#[test]
	fn fully_filtered_search_shows_empty_state_once_cursor_runs_dry() {
		let src = MemorySource::new(vec![
			User::new("1", "ann").with_status(UserStatus::Unavailable),
			User::new("2", "abe").with_status(UserStatus::Unavailable),
		]);
		let mut c = inline(src).with_page_size(1);
		c.begin_search();
		c.set_scope(SearchScope::AvailableOnly);
		c.process_completions();

		assert_eq!(c.row_count(0), 0);
		let events = c.take_events();
		let empties = events
			.iter()
			.filter(|e| matches!(e, ListEvent::ShowEmptyState(_)))
			.count();
		assert_eq!(empties, 1);
		assert!(!c.fetch_next_page());
	}

	#[test]
	fn page_holding_only_session_user_fetches_next() {
		let exec = ManualExecutor::default();
		let src = MemorySource::new(users(&[("me", "Me"), ("2", "bob")]));
		let mut c = UserListController::new(session(), src, exec.clone()).with_page_size(1);
		c.refresh();
		exec.run_all();
		c.process_completions();

		// the follow-up is queued and no empty state was announced meanwhile
		assert_eq!(exec.pending(), 1);
		assert!(c.is_loading());
		assert!(!c.is_exhausted());
		assert!(!c.take_events().iter().any(|e| matches!(e, ListEvent::ShowEmptyState(_))));

		exec.run_all();
		c.process_completions();
		assert_eq!(c.section_count(), 1);
		assert_eq!(c.row_content(0, 0).map(|u| u.id.as_str()), Some("2"));
		assert!(c.take_events().contains(&ListEvent::ClearEmptyState));
	}

	#[test]
	fn search_rows_live_in_section_zero_only() {
		let mut c = inline(MemorySource::new(users(&[("1", "bob"), ("2", "alice")])));
		c.set_search_query("b");
		c.process_completions();
		c.take_events();

		assert_eq!(c.row_count(0), 1);
		assert_eq!(c.row_count(5), 0);
		assert!(c.row_content(5, 0).is_none());
		assert!(!c.on_row_selected(5, 0));
		assert!(c.take_events().is_empty());
		assert!(c.on_row_selected(0, 0));
	}

	#[test]
	fn selection_emits_delegate_and_navigation_events() {
		let mut c = inline(MemorySource::new(users(&[("1", "bob"), ("2", "alice")])));
		c.refresh();
		c.process_completions();
		c.take_events();

		assert!(c.on_row_selected(1, 0));
		let bob = User::new("1", "bob");
		assert_eq!(
			c.take_events(),
			vec![
				ListEvent::UserSelected { user: bob.clone(), position: IndexPath::new(1, 0) },
				ListEvent::OpenConversation(bob),
			]
		);
		assert!(!c.on_row_selected(4, 4));
		assert!(c.take_events().is_empty());
	}

	#[test]
	fn out_of_range_lookups_degrade() {
		let c = inline(MemorySource::new(vec![]));
		assert_eq!(c.row_count(3), 0);
		assert!(c.row_content(3, 9).is_none());
		assert_eq!(c.section_title(2), "");
	}

	#[test]
	fn disabled_mode_fetches_nothing() {
		let src = MemorySource::new(users(&[("1", "bob")]));
		let mut c = inline(src).with_mode(ListMode::Disabled);
		c.refresh();
		c.process_completions();
		assert_eq!(c.section_count(), 0);
		assert!(c.is_exhausted());
	}

	#[test]
	fn switching_mode_refreshes_with_friends_filter() {
		let src = MemorySource::new(users(&[("1", "bob"), ("2", "alice")]));
		src.set_friends(["1"]);
		let mut c = inline(src);
		c.refresh();
		c.process_completions();
		assert_eq!(c.section_count(), 2);
		c.set_mode(ListMode::Friends);
		c.process_completions();
		assert_eq!(c.section_count(), 1);
		assert_eq!(c.section_title(0), "B");
	}

	#[test]
	fn section_title_uses_unmodified_first_character() {
		let mut c = inline(MemorySource::new(users(&[("1", "émile"), ("2", "")])));
		c.refresh();
		c.process_completions();
		assert_eq!(c.section_title(0), "");
		assert_eq!(c.section_title(1), "É");
	}
}
