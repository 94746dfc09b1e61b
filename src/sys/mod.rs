//! Local account directory.
//!
//! Serves the accounts of a `passwd(5)` file as directory users. Friends of the
//! session user are the accounts sharing at least one group with it, primary or
//! supplementary, as listed in `group(5)`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::model::{User, UserStatus};
use crate::source::{SnapshotCursor, UserCursor, UserSource, UsersRequest, matches_keyword};

#[derive(Clone, Debug)]
pub struct SystemUser {
    pub uid: u32,
    pub name: String,
    pub primary_gid: u32,
    pub full_name: Option<String>,
    pub shell: String,
}

impl SystemUser {
    /// Accounts whose shell refuses logins.
    pub fn is_inactive(&self) -> bool {
        let shell = self.shell.trim();
        shell.ends_with("nologin") || shell.ends_with("/false") || shell == "false"
    }

    /// First GECOS field, if any.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .and_then(|g| g.split(',').next())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn to_user(&self) -> User {
        let status = if self.is_inactive() {
            UserStatus::Unavailable
        } else {
            UserStatus::Available
        };
        User::new(self.name.clone(), self.display_name()).with_status(status)
    }
}

#[derive(Clone, Debug)]
pub struct SystemGroup {
    pub gid: u32,
    pub members: Vec<String>,
}

/// Directory backed by account files on disk.
#[derive(Clone, Debug)]
pub struct PasswdDirectory {
    passwd: PathBuf,
    group: PathBuf,
    session_login: String,
}

impl PasswdDirectory {
    pub fn new(passwd: impl Into<PathBuf>, group: impl Into<PathBuf>, session_login: impl Into<String>) -> Self {
        Self {
            passwd: passwd.into(),
            group: group.into(),
            session_login: session_login.into(),
        }
    }

    /// Users matching `request`, in file order.
    pub fn load(&self, request: &UsersRequest) -> Result<Vec<User>, FetchError> {
        let accounts = parse_passwd(&self.passwd)?;
        let friends = if request.friends_only {
            let groups = parse_group(&self.group)?;
            Some(friend_logins(&self.session_login, &accounts, &groups))
        } else {
            None
        };
        let keyword = request.normalized_keyword();
        let users = accounts
            .iter()
            .filter(|a| friends.as_ref().is_none_or(|f| f.contains(&a.name)))
            .map(SystemUser::to_user)
            .filter(|u| keyword.as_deref().is_none_or(|k| matches_keyword(u, k)))
            .collect();
        Ok(users)
    }
}

/// Logins sharing a group with `login`. `login` itself is not included.
pub fn friend_logins(login: &str, accounts: &[SystemUser], groups: &[SystemGroup]) -> HashSet<String> {
    let Some(me) = accounts.iter().find(|a| a.name == login) else {
        return HashSet::new();
    };
    let my_gids: HashSet<u32> = groups
        .iter()
        .filter(|g| g.gid == me.primary_gid || g.members.iter().any(|m| m == login))
        .map(|g| g.gid)
        .chain(std::iter::once(me.primary_gid))
        .collect();

    accounts
        .iter()
        .filter(|a| a.name != login)
        .filter(|a| {
            my_gids.contains(&a.primary_gid)
                || groups
                    .iter()
                    .any(|g| my_gids.contains(&g.gid) && g.members.iter().any(|m| m == &a.name))
        })
        .map(|a| a.name.clone())
        .collect()
}

enum PasswdCursor {
    Pending {
        directory: PasswdDirectory,
        request: UsersRequest,
    },
    Loaded(SnapshotCursor),
}

impl UserCursor for PasswdCursor {
    fn fetch_next(&mut self) -> Result<Vec<User>, FetchError> {
        if let PasswdCursor::Pending { directory, request } = self {
            let users = directory.load(request)?;
            let limit = request.limit;
            tracing::debug!(count = users.len(), path = %directory.passwd.display(), "loaded accounts");
            *self = PasswdCursor::Loaded(SnapshotCursor::new(users, limit));
        }
        match self {
            PasswdCursor::Loaded(snapshot) => Ok(snapshot.next_page()),
            PasswdCursor::Pending { .. } => Ok(Vec::new()),
        }
    }
}

impl UserSource for PasswdDirectory {
    fn create_cursor(&self, request: &UsersRequest) -> Box<dyn UserCursor> {
        Box::new(PasswdCursor::Pending {
            directory: self.clone(),
            request: request.clone(),
        })
    }
}

fn parse_passwd<P: AsRef<Path>>(path: P) -> Result<Vec<SystemUser>, FetchError> {
    let contents = fs::read_to_string(path)?;
    let mut users = Vec::new();
    for line in contents.lines() {
        if line.is_empty() || line.starts_with('#') { continue; }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 7 { continue; }
        let uid = parts[2]
            .parse::<u32>()
            .map_err(|e| FetchError::Parse(format!("uid of {}: {}", parts[0], e)))?;
        let gid = parts[3]
            .parse::<u32>()
            .map_err(|e| FetchError::Parse(format!("gid of {}: {}", parts[0], e)))?;
        let full_name = if parts[4].is_empty() { None } else { Some(parts[4].to_string()) };
        users.push(SystemUser {
            uid,
            name: parts[0].to_string(),
            primary_gid: gid,
            full_name,
            shell: parts[6].to_string(),
        });
    }
    Ok(users)
}

fn parse_group<P: AsRef<Path>>(path: P) -> Result<Vec<SystemGroup>, FetchError> {
    let contents = fs::read_to_string(path)?;
    let mut groups = Vec::new();
    for line in contents.lines() {
        if line.is_empty() || line.starts_with('#') { continue; }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 3 { continue; }
        let gid = parts[2]
            .parse::<u32>()
            .map_err(|e| FetchError::Parse(format!("gid of group {}: {}", parts[0], e)))?;
        let members = if parts.len() >= 4 && !parts[3].is_empty() {
            parts[3].split(',').filter(|s| !s.is_empty()).map(|s| s.to_string()).collect()
        } else { Vec::new() };
        groups.push(SystemGroup { gid, members });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{path::PathBuf, time::{SystemTime, UNIX_EPOCH}};

	fn tmp_path(tag: &str) -> PathBuf {
		let mut p = std::env::temp_dir();
		let n = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
		p.push(format!("userdir_{tag}_{}_{}", std::process::id(), n));
		p
	}

	const PASSWD: &str = "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
jdoe:x:1000:1000:John Doe,,,:/home/jdoe:/bin/zsh
ann:x:1001:1001::/home/ann:/bin/bash
zed:x:1002:100:Zed:/home/zed:/bin/bash
";

	const GROUP: &str = "\
root:x:0:
jdoe:x:1000:
ann:x:1001:
users:x:100:jdoe
wheel:x:998:root,ann
";

	#[test]
	fn parse_passwd_basic() {
		let path = tmp_path("passwd");
		fs::write(&path, PASSWD).unwrap();
		let users = parse_passwd(&path).unwrap();
		fs::remove_file(&path).ok();

		assert_eq!(users.len(), 5);
		assert_eq!(users[2].name, "jdoe");
		assert_eq!(users[2].uid, 1000);
		assert_eq!(users[2].full_name.as_deref(), Some("John Doe,,,"));
		assert_eq!(users[2].display_name(), "John Doe");
		assert_eq!(users[3].display_name(), "ann");
		assert!(users[1].is_inactive());
		assert!(!users[0].is_inactive());
	}

	#[test]
	fn parse_group_basic() {
		let path = tmp_path("group");
		fs::write(&path, GROUP).unwrap();
		let groups = parse_group(&path).unwrap();
		fs::remove_file(&path).ok();

		assert_eq!(groups.len(), 5);
		assert!(groups[0].members.is_empty());
		assert_eq!(groups[4].members, vec!["root".to_string(), "ann".to_string()]);
	}

	#[test]
	fn malformed_uid_is_a_parse_error() {
		let path = tmp_path("badpasswd");
		fs::write(&path, "bad:x:abc:0::/:/bin/sh\n").unwrap();
		let res = parse_passwd(&path);
		fs::remove_file(&path).ok();
		assert!(matches!(res, Err(FetchError::Parse(_))));
	}

	#[test]
	fn friends_share_a_group() {
		let p = tmp_path("fpasswd");
		let g = tmp_path("fgroup");
		fs::write(&p, PASSWD).unwrap();
		fs::write(&g, GROUP).unwrap();
		let accounts = parse_passwd(&p).unwrap();
		let groups = parse_group(&g).unwrap();
		fs::remove_file(&p).ok();
		fs::remove_file(&g).ok();

		// jdoe is a member of "users" (gid 100), zed's primary group
		let f = friend_logins("jdoe", &accounts, &groups);
		assert_eq!(f, HashSet::from(["zed".to_string()]));
		// ann and root meet in "wheel"
		let f = friend_logins("ann", &accounts, &groups);
		assert_eq!(f, HashSet::from(["root".to_string()]));
		assert!(friend_logins("nobody", &accounts, &groups).is_empty());
	}

	#[test]
	fn cursor_pages_and_filters() {
		let p = tmp_path("cpasswd");
		let g = tmp_path("cgroup");
		fs::write(&p, PASSWD).unwrap();
		fs::write(&g, GROUP).unwrap();
		let dir = PasswdDirectory::new(&p, &g, "jdoe");

		let mut c = dir.create_cursor(&UsersRequest::builder(2).build());
		assert_eq!(c.fetch_next().unwrap().len(), 2);
		assert_eq!(c.fetch_next().unwrap().len(), 2);
		assert_eq!(c.fetch_next().unwrap().len(), 1);
		assert!(c.fetch_next().unwrap().is_empty());

		let mut c = dir.create_cursor(&UsersRequest::builder(10).search_keyword("doe").build());
		let page = c.fetch_next().unwrap();
		assert_eq!(page.len(), 1);
		assert_eq!(page[0].id, "jdoe");
		assert_eq!(page[0].name, "John Doe");

		let mut c = dir.create_cursor(&UsersRequest::builder(10).friends_only(true).build());
		let page = c.fetch_next().unwrap();
		fs::remove_file(&p).ok();
		fs::remove_file(&g).ok();
		assert_eq!(page.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), vec!["zed"]);
	}

	#[test]
	fn missing_file_surfaces_io_error() {
		let dir = PasswdDirectory::new(tmp_path("nope"), tmp_path("nope2"), "x");
		let mut c = dir.create_cursor(&UsersRequest::builder(5).build());
		assert!(matches!(c.fetch_next(), Err(FetchError::Io(_))));
	}
}
