use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// The user's home directory; falls back to the account database when `$HOME` is unset.
fn user_home() -> Option<PathBuf> {
    dirs::home_dir().filter(|p| !p.as_os_str().is_empty())
}

/// Expand a leading `~` (`~`, `~/x`, `~\x`) to the user's home directory.
pub fn expand_tilde(raw: &str) -> Result<PathBuf> {
    let Some(rest) = raw.strip_prefix('~') else {
        return Ok(PathBuf::from(raw));
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        bail!("unsupported home reference in path '{raw}'");
    }
    let home = user_home().context("cannot expand '~': home directory is unknown")?;
    let rest = rest.trim_start_matches(['/', '\\']);
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// Resolve the service home directory to an absolute path.
///
/// `None` means `<user home>/<default_subdir>`. Relative paths are taken
/// against the current directory. With `create`, the directory is created.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let path = match configured {
        Some(raw) => expand_tilde(raw.trim())?,
        None => user_home()
            .context("cannot resolve default home_dir: home directory is unknown")?
            .join(default_subdir),
    };
    let path = absolutize(&path)?;

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create home_dir '{}'", path.display()))?;
    }
    Ok(path)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(path))
}
