//! Auto-PR worker
//!
//! Turns review suggestions into a branch and pull request. Jobs are queued
//! by the review endpoint and processed one at a time; a failed job is
//! logged and the worker moves on to the next one.

use chrono::{DateTime, SecondsFormat, Utc};
use revbot_core::{strip_code_fences, Error, FileSuggestion, Result};
use revbot_github::{parse_repo_url, GitHubClient, NewPullRequest};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Commit message for applied suggestions
const COMMIT_MESSAGE: &str = "chore: apply suggested changes";

/// Commit invocation with explicit identity; transient clones carry no
/// git config of their own
const COMMIT_ARGS: [&str; 7] = [
    "-c",
    "user.name=revbot",
    "-c",
    "user.email=revbot@users.noreply.github.com",
    "commit",
    "-m",
    COMMIT_MESSAGE,
];

/// A queued request to open a pull request with suggested changes.
#[derive(Debug, Clone)]
pub struct AutoPrJob {
    pub id: Uuid,
    pub repo_url: String,
    pub base_branch: String,
    pub files: Vec<FileSuggestion>,
}

impl AutoPrJob {
    pub fn new(
        repo_url: impl Into<String>,
        base_branch: impl Into<String>,
        files: Vec<FileSuggestion>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            repo_url: repo_url.into(),
            base_branch: base_branch.into(),
            files,
        }
    }
}

/// Auto-PR worker configuration
#[derive(Clone, Debug)]
pub struct AutoPrWorkerConfig {
    /// Maximum queued jobs before new ones are rejected
    pub queue_capacity: usize,
    /// Directory that holds transient clones
    pub workdir: PathBuf,
}

impl Default for AutoPrWorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            workdir: std::env::temp_dir(),
        }
    }
}

/// Auto-PR worker
pub struct AutoPrWorker {
    github: GitHubClient,
    config: AutoPrWorkerConfig,
}

impl AutoPrWorker {
    pub fn new(github: GitHubClient, config: AutoPrWorkerConfig) -> Self {
        Self { github, config }
    }

    /// Run the worker loop until every job sender is dropped.
    pub async fn run(self, mut jobs: mpsc::Receiver<AutoPrJob>) {
        info!(workdir = %self.config.workdir.display(), "Starting auto-PR worker");

        while let Some(job) = jobs.recv().await {
            let job_id = job.id;
            if let Err(e) = self.process_job(job).await {
                error!(job_id = %job_id, error = %e, "Auto-PR job failed");
            }
        }

        info!("Auto-PR worker stopped");
    }

    async fn process_job(&self, job: AutoPrJob) -> Result<()> {
        let (owner, repo) = parse_repo_url(&job.repo_url)?;
        let now = Utc::now();
        let timestamp = now.timestamp_millis();
        let branch = branch_name(timestamp);
        let local_path = self.config.workdir.join(format!("{repo}-{timestamp}"));

        info!(
            job_id = %job.id,
            owner = %owner,
            repo = %repo,
            branch = %branch,
            files = job.files.len(),
            "Processing auto-PR job"
        );

        self.clone_repository(&owner, &repo, &local_path).await?;
        git(&local_path, &["checkout", "-b", &branch]).await?;

        let applied = apply_suggestions(&local_path, &job.files).await?;
        if applied == 0 {
            return Err(Error::Git(
                "no suggested changes could be applied".to_string(),
            ));
        }

        git(&local_path, &["add", "-A"]).await?;
        git(&local_path, &COMMIT_ARGS).await?;
        git(&local_path, &["push", "origin", &branch]).await?;

        let request = NewPullRequest {
            title: pr_title(now),
            head: branch,
            base: job.base_branch.clone(),
            body: pr_body(&job.files),
        };
        let pr_url = self
            .github
            .create_pull_request(&owner, &repo, &request)
            .await?;

        info!(job_id = %job.id, url = %pr_url, "Auto-PR created");

        // failed jobs leave the clone behind; only successful ones clean up
        if let Err(e) = tokio::fs::remove_dir_all(&local_path).await {
            warn!(path = %local_path.display(), error = %e, "Failed to remove transient clone");
        }

        Ok(())
    }

    async fn clone_repository(&self, owner: &str, repo: &str, local_path: &Path) -> Result<()> {
        let clone_url = self.github.authenticated_clone_url(owner, repo);
        let output = Command::new("git")
            .args(["clone", &clone_url])
            .arg(local_path)
            .current_dir(&self.config.workdir)
            .output()
            .await?;

        if !output.status.success() {
            // git echoes the URL on failure; keep the token out of the error
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.replace(&clone_url, "<repository>");
            return Err(Error::Git(format!("git clone failed: {}", message.trim())));
        }

        Ok(())
    }
}

async fn git(dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await?;

    if !output.status.success() {
        // -c overrides may precede the subcommand
        let command = args
            .iter()
            .copied()
            .find(|arg| !arg.starts_with('-') && !arg.contains('='))
            .unwrap_or("git");
        return Err(Error::Git(format!(
            "git {command} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

/// Writes the revised content of each suggestion into the clone.
///
/// Suggestions for paths missing from the clone, paths that would escape the
/// clone root, and empty suggestions are skipped. Returns how many files
/// were written.
async fn apply_suggestions(root: &Path, files: &[FileSuggestion]) -> Result<usize> {
    let mut applied = 0;

    for file in files {
        let relative = file.path.trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            warn!(file = %file.path, "Skipping suggestion with non-local path");
            continue;
        }

        let target = root.join(relative);
        if !target.exists() {
            debug!(file = %file.path, "Skipping suggestion for file missing from clone");
            continue;
        }

        let revised = strip_code_fences(file.revised());
        if revised.trim().is_empty() {
            debug!(file = %file.path, "Skipping empty suggestion");
            continue;
        }

        tokio::fs::write(&target, revised).await?;
        applied += 1;
    }

    Ok(applied)
}

fn branch_name(timestamp_millis: i64) -> String {
    format!("code-review-{timestamp_millis}")
}

fn pr_title(now: DateTime<Utc>) -> String {
    format!(
        "Code review - {}",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// One section per reviewed file, separated by horizontal rules.
fn pr_body(files: &[FileSuggestion]) -> String {
    files
        .iter()
        .map(|file| format!("### {}\n\n{}", file.path, file.summary().trim()))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_branch_name_format() {
        assert_eq!(branch_name(1700000000123), "code-review-1700000000123");
    }

    #[test]
    fn test_pr_title_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(pr_title(now), "Code review - 2024-05-01T12:30:00Z");
    }

    #[test]
    fn test_pr_body_joins_file_sections() {
        let files = vec![
            FileSuggestion::new("src/a.js", "code########\nUse strict mode.\n"),
            FileSuggestion::new("src/b.js", "code only, no summary"),
        ];
        let body = pr_body(&files);
        assert_eq!(
            body,
            "### src/a.js\n\nUse strict mode.\n\n---\n\n### src/b.js\n\n"
        );
    }

    #[test]
    fn test_job_construction() {
        let job = AutoPrJob::new("https://github.com/acme/demo", "develop", vec![]);
        assert_eq!(job.repo_url, "https://github.com/acme/demo");
        assert_eq!(job.base_branch, "develop");
        assert!(job.files.is_empty());
    }

    #[test]
    fn test_worker_config_defaults() {
        let config = AutoPrWorkerConfig::default();
        assert_eq!(config.queue_capacity, 32);
        assert_eq!(config.workdir, std::env::temp_dir());
    }

    #[tokio::test]
    async fn test_apply_suggestions_writes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/app.js"), "old content").unwrap();

        let files = vec![
            FileSuggestion::new("src/app.js", "```js\nnew content\n```\n########\nsummary"),
            FileSuggestion::new("missing.js", "whatever########summary"),
        ];

        let applied = apply_suggestions(dir.path(), &files).await.unwrap();
        assert_eq!(applied, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/app.js")).unwrap(),
            "new content\n"
        );
    }

    #[tokio::test]
    async fn test_apply_suggestions_skips_non_local_paths() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![FileSuggestion::new("../escape.txt", "data########s")];

        let applied = apply_suggestions(dir.path(), &files).await.unwrap();
        assert_eq!(applied, 0);
    }

    #[tokio::test]
    async fn test_apply_suggestions_skips_empty_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "old content").unwrap();

        let files = vec![FileSuggestion::new("app.js", "")];

        let applied = apply_suggestions(dir.path(), &files).await.unwrap();
        assert_eq!(applied, 0);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("app.js")).unwrap(),
            "old content"
        );
    }

    #[tokio::test]
    async fn test_apply_suggestions_trims_leading_slash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "old content").unwrap();

        let files = vec![FileSuggestion::new("/app.js", "new########s")];

        let applied = apply_suggestions(dir.path(), &files).await.unwrap();
        assert_eq!(applied, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("app.js")).unwrap(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_commit_uses_explicit_identity() {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init"]).await.unwrap();
        std::fs::write(dir.path().join("app.js"), "content").unwrap();
        git(dir.path(), &["add", "-A"]).await.unwrap();
        git(dir.path(), &COMMIT_ARGS).await.unwrap();

        let output = Command::new("git")
            .args(["log", "-1", "--format=%an <%ae>"])
            .current_dir(dir.path())
            .output()
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&output.stdout).trim(),
            "revbot <revbot@users.noreply.github.com>"
        );
    }
}
