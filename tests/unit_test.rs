// Unit tests for userdir-tui
// These tests exercise the public API of each module in isolation

#[cfg(test)]
mod grouping_tests {
    use userdir_tui::grouping::GroupedIndex;
    use userdir_tui::model::{User, group_key};

    fn page(items: &[(&str, &str)]) -> Vec<User> {
        items.iter().map(|(id, name)| User::new(*id, *name)).collect()
    }

    #[test]
    fn test_group_key_rules() {
        assert_eq!(group_key("bob"), "B");
        assert_eq!(group_key("  alice  "), "A");
        assert_eq!(group_key(""), "");
    }

    #[test]
    fn test_earlier_pages_stay_first_in_group() {
        let mut idx = GroupedIndex::new();
        let p1 = page(&[("1", "anna"), ("2", "bob"), ("3", "Abe")]);
        let p2 = page(&[("4", "axel"), ("5", "Bea"), ("6", "cid")]);
        idx.merge_page(&p1);
        idx.merge_page(&p2);

        let a: Vec<&str> = idx.group("A").unwrap().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(a, vec!["1", "3", "4"]);
        let b: Vec<&str> = idx.group("B").unwrap().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(b, vec!["2", "5"]);
        // nothing lost
        assert_eq!(idx.user_count(), p1.len() + p2.len());
    }

    #[test]
    fn test_sorted_keys_non_decreasing_without_duplicates() {
        let mut idx = GroupedIndex::new();
        let names = ["zoe", "Yan", "", "alice", "Émile", "bob", "zack", "1st", "beth", "  carl"];
        for chunk in names.chunks(3) {
            let users: Vec<User> = chunk
                .iter()
                .enumerate()
                .map(|(i, n)| User::new(format!("{n}-{i}"), *n))
                .collect();
            idx.merge_page(&users);
        }
        let keys = idx.sorted_keys();
        for pair in keys.windows(2) {
            assert!(pair[0].to_lowercase() <= pair[1].to_lowercase(), "{pair:?}");
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(keys.first().map(String::as_str), Some(""));
        assert_eq!(keys.len(), idx.len());
    }
}

#[cfg(test)]
mod source_tests {
    use userdir_tui::FetchError;
    use userdir_tui::model::User;
    use userdir_tui::source::{ListMode, MemorySource, UserSource, UsersRequest};

    #[test]
    fn test_memory_source_pages() {
        let users = (0..45).map(|i| User::new(format!("{i}"), format!("user{i}"))).collect();
        let src = MemorySource::new(users);
        let mut cursor = src.create_cursor(&UsersRequest::for_mode(ListMode::All, None, None));
        assert_eq!(cursor.fetch_next().unwrap().len(), 20);
        assert_eq!(cursor.fetch_next().unwrap().len(), 20);
        assert_eq!(cursor.fetch_next().unwrap().len(), 5);
        assert!(cursor.fetch_next().unwrap().is_empty());
    }

    #[test]
    fn test_disabled_mode_returns_nothing() {
        let src = MemorySource::new(vec![User::new("1", "a")]);
        let mut cursor = src.create_cursor(&UsersRequest::for_mode(ListMode::Disabled, None, None));
        assert!(cursor.fetch_next().unwrap().is_empty());
    }

    #[test]
    fn test_failure_injection() {
        let src = MemorySource::new(vec![User::new("1", "a")]);
        let mut cursor = src.create_cursor(&UsersRequest::builder(10).build());
        src.fail_next(FetchError::Io("disk".into()));
        assert!(cursor.fetch_next().is_err());
        assert!(cursor.fetch_next().is_ok());
    }
}

#[cfg(test)]
mod controller_tests {
    use userdir_tui::controller::{ListEvent, NO_USERS_FOUND, UserListController};
    use userdir_tui::fetch::InlineExecutor;
    use userdir_tui::model::{Session, User};
    use userdir_tui::source::MemorySource;

    fn controller(users: Vec<User>) -> UserListController {
        UserListController::new(Session::new("me", "Me"), MemorySource::new(users), InlineExecutor)
    }

    #[test]
    fn test_bob_alice_scenario() {
        let mut c = controller(vec![User::new("1", "bob"), User::new("2", "alice")]);
        c.refresh();
        c.process_completions();
        assert_eq!(c.grouped().sorted_keys(), &["A".to_string(), "B".to_string()]);
        assert_eq!(c.section_title(0), "A");
        assert_eq!(c.row_content(0, 0).unwrap().name, "alice");
    }

    #[test]
    fn test_empty_name_sorts_before_a() {
        let mut c = controller(vec![User::new("2", "alice"), User::new("3", "")]);
        c.refresh();
        c.process_completions();
        assert_eq!(c.grouped().sorted_keys()[0], "");
        assert_eq!(c.row_content(0, 0).unwrap().id, "3");
        assert_eq!(c.section_title(0), "");
    }

    #[test]
    fn test_search_al_scenario() {
        let mut c = controller(vec![User::new("1", "bob"), User::new("2", "alice")]);
        c.refresh();
        c.process_completions();
        c.begin_search();
        c.set_search_query("al");
        c.process_completions();
        assert_eq!(c.section_count(), 1);
        assert_eq!(c.row_count(0), 1);
        assert_eq!(c.section_title(0), "");
        // search always reports a single section, whatever the grouped list holds
        assert_eq!(c.grouped().len(), 2);
    }

    #[test]
    fn test_out_of_range_never_panics() {
        let mut c = controller(vec![User::new("1", "bob")]);
        for (s, r) in [(0, 0), (5, 0), (0, 9), (usize::MAX, usize::MAX)] {
            assert_eq!(c.row_count(s), 0);
            assert!(c.row_content(s, r).is_none());
            assert_eq!(c.section_title(s), "");
        }
        c.refresh();
        c.process_completions();
        assert_eq!(c.row_count(usize::MAX), 0);
        assert!(c.row_content(0, usize::MAX).is_none());
        assert!(!c.will_display_row(usize::MAX, usize::MAX));
    }

    #[test]
    fn test_empty_search_shows_empty_state() {
        let mut c = controller(vec![User::new("1", "bob")]);
        c.set_search_query("nobody");
        c.process_completions();
        let events = c.take_events();
        assert!(events.contains(&ListEvent::ShowEmptyState(NO_USERS_FOUND.to_string())));
    }
}
