//! Upstream checkout and revision bookkeeping
//!
//! The converted revision is identified by the git tree hash of the upstream
//! `dist` directory at the commit the remote ref points to after a fetch, the
//! same value the hosting API reports for that subtree. It is stamped into a
//! Ruby constant in the host project.

use crate::error::{ConverterError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::process::Command;

const REMOTE: &str = "origin";

/// Clone `url` into `path`, or fetch branches and tags if a checkout is already there
pub fn ensure_checkout(url: &str, path: &Path) -> Result<()> {
    if path.exists() {
        log::info!("Fetching {}", path.display());
        run_git(&["fetch", "--quiet", "--tags", "--force", REMOTE], Some(path))?;
    } else {
        log::info!("Cloning {} into {}", url, path.display());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let target = path.to_string_lossy();
        run_git(&["clone", "--quiet", url, target.as_ref()], None)?;
    }
    Ok(())
}

/// Check out what `git_ref` names on the remote and return that commit.
///
/// A branch is reset to its remote-tracking head, so a fetch is never shadowed
/// by a stale local branch. Tags and commit ids are checked out detached.
pub fn checkout_ref(path: &Path, git_ref: &str) -> Result<String> {
    let tracking = format!("refs/remotes/{}/{}", REMOTE, git_ref);

    if let Some(commit) = resolve_commit(path, &tracking) {
        log::info!("Checking out {} at {}/{} ({})", git_ref, REMOTE, git_ref, commit);
        run_git(&["checkout", "--quiet", "-B", git_ref, &tracking], Some(path))?;
        return Ok(commit);
    }

    let commit = resolve_commit(path, git_ref).ok_or_else(|| {
        ConverterError::upstream(format!(
            "'{}' is not a branch on {}, a tag or a commit in {}",
            git_ref,
            REMOTE,
            path.display()
        ))
    })?;
    log::info!("Checking out {} ({}) detached", git_ref, commit);
    run_git(&["checkout", "--quiet", "--detach", &commit], Some(path))?;
    Ok(commit)
}

fn resolve_commit(path: &Path, rev: &str) -> Option<String> {
    let object = format!("{}^{{commit}}", rev);
    run_git(&["rev-parse", "--verify", "--quiet", &object], Some(path))
        .ok()
        .filter(|commit| !commit.is_empty())
}

/// Tree hash of `subtree` at `git_ref`
pub fn tree_sha(path: &Path, git_ref: &str, subtree: &str) -> Result<String> {
    let object = format!("{}:{}", git_ref, subtree);
    let sha = run_git(&["rev-parse", "--verify", "--quiet", &object], Some(path)).map_err(|e| {
        ConverterError::upstream(format!(
            "cannot resolve '{}' in {}: {}",
            object,
            path.display(),
            e
        ))
    })?;
    if sha.is_empty() {
        return Err(ConverterError::upstream(format!("'{}' resolved to nothing", object)));
    }
    log::debug!("{} -> {}", object, sha);
    Ok(sha)
}

/// Replace the quoted hex literal assigned to `constant` in `file`
pub fn record_version_stamp(file: &Path, constant: &str, sha: &str) -> Result<()> {
    let content = fs::read_to_string(file)
        .map_err(|e| ConverterError::io_at(file.display().to_string(), e))?;

    let stamped = stamp_version(&content, constant, sha).ok_or_else(|| ConverterError::VersionStamp {
        path: file.display().to_string(),
        message: format!("no {} assignment found", constant),
    })?;

    fs::write(file, stamped)?;
    log::info!("Recorded {} = '{}' in {}", constant, sha, file.display());
    Ok(())
}

/// `content` with the stamp replaced, or `None` if `constant` is not assigned
pub fn stamp_version(content: &str, constant: &str, sha: &str) -> Option<String> {
    let pattern = format!(r#"{}\s*=\s*['"]\w+['"]"#, regex::escape(constant));
    let assignment = Regex::new(&pattern).ok()?;
    if !assignment.is_match(content) {
        return None;
    }
    let replacement = format!("{} = '{}'", constant, sha);
    Some(
        assignment
            .replacen(content, 1, regex::NoExpand(&replacement))
            .into_owned(),
    )
}

/// Run git and return its trimmed stdout
fn run_git(args: &[&str], dir: Option<&Path>) -> Result<String> {
    let mut command = Command::new("git");
    if let Some(dir) = dir {
        command.arg("-C").arg(dir);
    }
    let output = command.args(args).output()?;
    let subcommand = args.first().copied().unwrap_or_default();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConverterError::git(
            subcommand,
            format!("{} ({})", stderr.trim(), output.status),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
