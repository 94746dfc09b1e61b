//! Core records shown by the directory: users, sessions and list positions.

/// Availability of a user as reported by the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UserStatus {
    #[default]
    Available,
    Unavailable,
}

/// A directory entry. Two users are equal when their ids match.
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub name: String,
    pub status: UserStatus,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: UserStatus::Available,
        }
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == UserStatus::Available
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

/// The logged-in account the directory is browsed as.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub name: String,
}

impl Session {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A `(section, row)` position in the sectioned list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IndexPath {
    pub section: usize,
    pub row: usize,
}

impl IndexPath {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

/// Uppercase the first letter of every word and lowercase the rest.
///
/// Word boundaries are whitespace; the string is not trimmed.
pub fn capitalized(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Bucket label for a display name: first character of the capitalized,
/// trimmed name, or `""` for a blank name.
pub fn group_key(name: &str) -> String {
    capitalized(name)
        .trim()
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn users_compare_by_id_only() {
		let a = User::new("1", "alice");
		let b = User::new("1", "Alice Renamed").with_status(UserStatus::Unavailable);
		assert_eq!(a, b);
		assert_ne!(a, User::new("2", "alice"));
	}

	#[test]
	fn capitalized_handles_words_and_case() {
		assert_eq!(capitalized("bob SMITH"), "Bob Smith");
		assert_eq!(capitalized("  émile"), "  Émile");
		assert_eq!(capitalized(""), "");
	}

	#[test]
	fn group_key_trims_and_uppercases() {
		assert_eq!(group_key("bob"), "B");
		assert_eq!(group_key("   alice"), "A");
		assert_eq!(group_key("\tzed\n"), "Z");
		assert_eq!(group_key(""), "");
		assert_eq!(group_key("   "), "");
		assert_eq!(group_key("42 club"), "4");
	}
}
