use crate::model::User;

/// Secondary filter applied on top of the keyword search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    All,
    AvailableOnly,
}

impl SearchScope {
    pub fn toggled(self) -> Self {
        match self {
            SearchScope::All => SearchScope::AvailableOnly,
            SearchScope::AvailableOnly => SearchScope::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchScope::All => "all",
            SearchScope::AvailableOnly => "available",
        }
    }

    fn admits(self, user: &User) -> bool {
        match self {
            SearchScope::All => true,
            SearchScope::AvailableOnly => user.is_available(),
        }
    }
}

/// Query, scope and the flat result set of the current search session.
#[derive(Clone, Debug, Default)]
pub struct SearchState {
    pub session_open: bool,
    pub query: String,
    pub scope: SearchScope,
    results: Vec<User>,
}

impl SearchState {
    /// A session lists search results only once the user typed something or
    /// narrowed the scope.
    pub fn is_active(&self) -> bool {
        self.session_open && (!self.query.is_empty() || self.scope != SearchScope::All)
    }

    pub fn results(&self) -> &[User] {
        &self.results
    }

    /// Start the results over with `page`. Returns how many users the scope admitted.
    pub fn replace_results(&mut self, page: Vec<User>) -> usize {
        self.results.clear();
        self.append_results(page)
    }

    /// Returns how many users of `page` the scope admitted.
    pub fn append_results(&mut self, page: Vec<User>) -> usize {
        let scope = self.scope;
        let before = self.results.len();
        self.results.extend(page.into_iter().filter(|u| scope.admits(u)));
        self.results.len() - before
    }

    /// Close the session and forget query, scope and results.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
