//! Paged user sources.
//!
//! A [`UserSource`] hands out [`UserCursor`]s for a [`UsersRequest`]. Each call
//! to [`UserCursor::fetch_next`] returns the next page; an empty page means the
//! cursor is exhausted. Cursors are moved onto fetch workers, so they must be
//! `Send`.

pub mod memory;

use crate::error::FetchError;
use crate::model::User;

pub use memory::MemorySource;

/// Page size used by the browsing modes unless overridden.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Which population of users the directory lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListMode {
    #[default]
    All,
    Friends,
    Disabled,
}

impl ListMode {
    pub fn page_size(self) -> usize {
        match self {
            ListMode::All | ListMode::Friends => DEFAULT_PAGE_SIZE,
            ListMode::Disabled => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListMode::All => "all",
            ListMode::Friends => "friends",
            ListMode::Disabled => "disabled",
        }
    }
}

impl std::str::FromStr for ListMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ListMode::All),
            "friends" | "friends-only" => Ok(ListMode::Friends),
            "disabled" | "none" => Ok(ListMode::Disabled),
            other => Err(format!("unknown list mode '{other}'")),
        }
    }
}

/// Parameters a cursor is created from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsersRequest {
    pub limit: usize,
    pub friends_only: bool,
    pub search_keyword: Option<String>,
}

impl UsersRequest {
    pub fn builder(limit: usize) -> UsersRequestBuilder {
        UsersRequestBuilder {
            request: UsersRequest {
                limit,
                ..Default::default()
            },
        }
    }

    /// Request matching a list mode, with an optional page size override
    /// that applies to the browsing modes only.
    pub fn for_mode(mode: ListMode, page_size: Option<usize>, keyword: Option<&str>) -> Self {
        let limit = match mode {
            ListMode::Disabled => 0,
            _ => page_size.unwrap_or_else(|| mode.page_size()),
        };
        let mut builder = Self::builder(limit).friends_only(mode == ListMode::Friends);
        if let Some(k) = keyword {
            builder = builder.search_keyword(k);
        }
        builder.build()
    }

    /// Lowercased keyword, `None` when unset or blank.
    pub fn normalized_keyword(&self) -> Option<String> {
        self.search_keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
    }
}

pub struct UsersRequestBuilder {
    request: UsersRequest,
}

impl UsersRequestBuilder {
    pub fn friends_only(mut self, on: bool) -> Self {
        self.request.friends_only = on;
        self
    }

    pub fn search_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.request.search_keyword = Some(keyword.into());
        self
    }

    pub fn build(self) -> UsersRequest {
        self.request
    }
}

/// Continuation handle for one paged query.
pub trait UserCursor: Send {
    fn fetch_next(&mut self) -> Result<Vec<User>, FetchError>;
}

/// Something that can list users page by page.
pub trait UserSource: Send + Sync {
    fn create_cursor(&self, request: &UsersRequest) -> Box<dyn UserCursor>;
}

/// Keyword match shared by the bundled sources: case-insensitive substring
/// of the display name or the id.
pub fn matches_keyword(user: &User, keyword: &str) -> bool {
    user.name.to_lowercase().contains(keyword) || user.id.to_lowercase().contains(keyword)
}

/// Cursor over an already-filtered snapshot, paging by `limit`.
pub(crate) struct SnapshotCursor {
    users: Vec<User>,
    offset: usize,
    limit: usize,
}

impl SnapshotCursor {
    pub(crate) fn new(users: Vec<User>, limit: usize) -> Self {
        Self {
            users,
            offset: 0,
            limit,
        }
    }

    pub(crate) fn next_page(&mut self) -> Vec<User> {
        if self.limit == 0 || self.offset >= self.users.len() {
            return Vec::new();
        }
        let end = (self.offset + self.limit).min(self.users.len());
        let page = self.users[self.offset..end].to_vec();
        self.offset = end;
        page
    }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mode_requests_use_expected_limits() {
		let all = UsersRequest::for_mode(ListMode::All, None, None);
		assert_eq!(all.limit, 20);
		assert!(!all.friends_only);

		let friends = UsersRequest::for_mode(ListMode::Friends, None, Some("al"));
		assert_eq!(friends.limit, 20);
		assert!(friends.friends_only);
		assert_eq!(friends.search_keyword.as_deref(), Some("al"));

		let disabled = UsersRequest::for_mode(ListMode::Disabled, Some(50), None);
		assert_eq!(disabled.limit, 0);

		let custom = UsersRequest::for_mode(ListMode::All, Some(5), None);
		assert_eq!(custom.limit, 5);
	}

	#[test]
	fn blank_keyword_normalizes_to_none() {
		let r = UsersRequest::builder(10).search_keyword("   ").build();
		assert_eq!(r.normalized_keyword(), None);
		let r = UsersRequest::builder(10).search_keyword(" AL ").build();
		assert_eq!(r.normalized_keyword().as_deref(), Some("al"));
	}

	#[test]
	fn list_mode_parses_aliases() {
		assert_eq!("Friends".parse::<ListMode>(), Ok(ListMode::Friends));
		assert_eq!("none".parse::<ListMode>(), Ok(ListMode::Disabled));
		assert!("bogus".parse::<ListMode>().is_err());
	}

	#[test]
	fn snapshot_cursor_pages_then_exhausts() {
		let users = (0..5).map(|i| User::new(i.to_string(), format!("u{i}"))).collect();
		let mut c = SnapshotCursor::new(users, 2);
		assert_eq!(c.next_page().len(), 2);
		assert_eq!(c.next_page().len(), 2);
		assert_eq!(c.next_page().len(), 1);
		assert!(c.next_page().is_empty());
	}

	#[test]
	fn zero_limit_fetches_nothing() {
		let mut c = SnapshotCursor::new(vec![User::new("1", "a")], 0);
		assert!(c.next_page().is_empty());
	}
}
