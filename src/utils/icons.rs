// Tournament thumbnails picked from a local icon directory by host code

use std::path::{Path, PathBuf};

use tracing::debug;

const IMAGE_EXTENSIONS: &[&str] = &["png", "webp", "jpg", "jpeg", "gif"];

/// Split a `HOST | Tournament Name` label on the first `|`.
/// Without a delimiter the whole label is the host and there is no name.
pub fn split_host_label(label: &str) -> (String, Option<String>) {
    match label.split_once('|') {
        Some((host, name)) => {
            let name = name.trim();
            (
                host.trim().to_string(),
                (!name.is_empty()).then(|| name.to_string()),
            )
        }
        None => (label.trim().to_string(), None),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// "MRC", "mrc", "MRC.png" -> "MRC"
fn host_key(host: &str) -> &str {
    let host = host.trim();
    match host.rsplit_once('.') {
        Some((stem, ext)) if IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => stem,
        _ => host,
    }
}

/// Pick the icon for `host` among `files`: image stem equal to the host
/// ignoring case, first file name in alphabetical order wins.
pub fn pick_icon(files: impl IntoIterator<Item = PathBuf>, host: &str) -> Option<PathBuf> {
    let key = host_key(host);
    if key.is_empty() {
        return None;
    }

    files
        .into_iter()
        .filter(|p| is_image(p))
        .filter(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|stem| stem.eq_ignore_ascii_case(key))
                .unwrap_or(false)
        })
        .min_by(|a, b| a.file_name().cmp(&b.file_name()))
}

/// Scan `dir` for the host's icon. A missing directory just means no icon.
pub async fn find_icon(dir: &Path, host: &str) -> Option<PathBuf> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Icon directory {} unreadable: {}", dir.display(), e);
            return None;
        }
    };

    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            files.push(entry.path());
        }
    }

    pick_icon(files, host)
}
