use std::fmt::Display;
use std::path::{Component, Path};

use log::debug;
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, UtcOffset};

use crate::errors::WikiError;
use crate::types::History;

/// Source of a page's change log, newest first
pub trait HistoryProvider: Send + Sync {
    fn history(&self, file: &Path) -> Result<Vec<History>, WikiError>;
}

/// Hex SHA-256 of the trimmed, lowercased email, as used for avatar lookups
pub fn email_hash(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    let mut output = String::with_capacity(64);
    for byte in digest.iter() {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn git_err(context: &str, e: impl Display) -> WikiError {
    WikiError::HistoryError(format!("{}: {}", context, e))
}

/// History read from the git repository containing the page
#[derive(Debug, Default, Clone, Copy)]
pub struct GitHistory;

impl GitHistory {
    pub fn new() -> Self {
        Self
    }
}

impl HistoryProvider for GitHistory {
    fn history(&self, file: &Path) -> Result<Vec<History>, WikiError> {
        let file = file.canonicalize()?;
        let dir = file.parent().ok_or(WikiError::InvalidPath)?;
        let repo = gix::discover(dir).map_err(|e| git_err("open repository", e))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| WikiError::HistoryError("repository has no work tree".to_string()))?
            .canonicalize()?;
        let rel = repo_path(&workdir, &file)?;
        debug!("Reading history of {} in {}", rel, workdir.display());

        let head = repo.head_commit().map_err(|e| git_err("resolve HEAD", e))?;
        let walk = repo
            .rev_walk([head.id])
            .all()
            .map_err(|e| git_err("walk history", e))?;

        let mut history = Vec::new();
        for info in walk {
            let info = info.map_err(|e| git_err("walk history", e))?;
            let commit = info.object().map_err(|e| git_err("read commit", e))?;
            let Some(entry) = entry_id(&commit, &rel)? else {
                continue;
            };
            let parent = match info.parent_ids().next() {
                Some(id) => {
                    let parent = id
                        .object()
                        .map_err(|e| git_err("read parent", e))?
                        .try_into_commit()
                        .map_err(|e| git_err("read parent", e))?;
                    entry_id(&parent, &rel)?
                }
                None => None,
            };
            if parent != Some(entry) {
                history.push(to_history(&commit)?);
            }
        }
        Ok(history)
    }
}

/// Path of `file` inside `workdir`, with `/` separators
fn repo_path(workdir: &Path, file: &Path) -> Result<String, WikiError> {
    let relative = file.strip_prefix(workdir).map_err(|_| WikiError::InvalidPath)?;
    let mut parts = Vec::new();
    for comp in relative.components() {
        match comp {
            Component::Normal(seg) => parts.push(seg.to_string_lossy().into_owned()),
            _ => return Err(WikiError::InvalidPath),
        }
    }
    Ok(parts.join("/"))
}

fn entry_id(commit: &gix::Commit<'_>, path: &str) -> Result<Option<gix::ObjectId>, WikiError> {
    let mut tree = commit.tree().map_err(|e| git_err("read tree", e))?;
    let entry = tree
        .peel_to_entry_by_path(path)
        .map_err(|e| git_err("find entry", e))?;
    Ok(entry.map(|e| e.object_id()))
}

fn to_history(commit: &gix::Commit<'_>) -> Result<History, WikiError> {
    let author = commit.author().map_err(|e| git_err("decode author", e))?;
    let author_name = author.name.to_string();
    let author_email = author.email.to_string();
    let time = commit.time().map_err(|e| git_err("decode time", e))?;
    let offset = UtcOffset::from_whole_seconds(time.offset).unwrap_or(UtcOffset::UTC);
    let time = OffsetDateTime::from_unix_timestamp(time.seconds)
        .map_err(|e| git_err("commit time", e))?
        .to_offset(offset);
    let summary = commit
        .message()
        .map_err(|e| git_err("decode message", e))?
        .summary()
        .to_string();

    Ok(History {
        id: commit.id.to_string(),
        short_id: commit.id.to_hex_with_len(7).to_string(),
        email_hash: email_hash(&author_email),
        author_name,
        author_email,
        time,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gix::objs::{tree, Tree};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_email_hash() {
        let hash = email_hash("MyEmailAddress@example.com ");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, email_hash("myemailaddress@example.com"));
        assert_eq!(
            email_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_repo_path() {
        let rel = repo_path(Path::new("/srv/wiki"), Path::new("/srv/wiki/notes/Page.md")).unwrap();
        assert_eq!(rel, "notes/Page.md");
        assert!(repo_path(Path::new("/srv/wiki"), Path::new("/elsewhere/Page.md")).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = GitHistory::new().history(&dir.path().join("Nope.md"));
        assert!(result.is_err());
    }

    fn repo_with_identity(dir: &Path) -> gix::Repository {
        gix::init(dir).unwrap();
        let mut config = fs::OpenOptions::new().append(true).open(dir.join(".git/config")).unwrap();
        writeln!(config, "[user]\n\tname = Ada\n\temail = Ada@Example.com").unwrap();
        gix::open(dir).unwrap()
    }

    fn commit(repo: &gix::Repository, files: &[(&str, &str)], message: &str) {
        let mut entries: Vec<tree::Entry> = files
            .iter()
            .map(|(name, content)| tree::Entry {
                mode: tree::EntryKind::Blob.into(),
                filename: (*name).into(),
                oid: repo.write_blob(content.as_bytes()).unwrap().into(),
            })
            .collect();
        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        let tree_id = repo.write_object(&Tree { entries }).unwrap();
        let parents: Vec<gix::ObjectId> = repo.head_id().ok().map(|id| id.detach()).into_iter().collect();
        repo.commit("HEAD", message, tree_id, parents).unwrap();
    }

    #[test]
    fn test_history_keeps_commits_touching_the_file() {
        let dir = TempDir::new().unwrap();
        let repo = repo_with_identity(dir.path());
        commit(&repo, &[("A.md", "one\n")], "c1 add A");
        commit(&repo, &[("A.md", "one\n"), ("B.md", "b\n")], "c2 add B");
        commit(&repo, &[("A.md", "two\n"), ("B.md", "b\n")], "c3 edit A");
        fs::write(dir.path().join("A.md"), "two\n").unwrap();
        fs::write(dir.path().join("B.md"), "b\n").unwrap();

        let history = GitHistory::new().history(&dir.path().join("A.md")).unwrap();
        let summaries: Vec<_> = history.iter().map(|h| h.summary.as_str()).collect();
        assert_eq!(summaries, ["c3 edit A", "c1 add A"]);

        let first = &history[0];
        assert_eq!(first.author_name, "Ada");
        assert_eq!(first.email_hash, email_hash("ada@example.com"));
        assert_eq!(first.short_id.len(), 7);
        assert!(first.id.starts_with(&first.short_id));

        let history = GitHistory::new().history(&dir.path().join("B.md")).unwrap();
        let summaries: Vec<_> = history.iter().map(|h| h.summary.as_str()).collect();
        assert_eq!(summaries, ["c2 add B"]);
    }

    #[test]
    fn test_repository_without_commits_is_an_error() {
        let dir = TempDir::new().unwrap();
        gix::init(dir.path()).unwrap();
        let page = dir.path().join("Home.md");
        fs::write(&page, "# Home").unwrap();
        assert!(GitHistory::new().history(&page).is_err());
    }
}
