use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Icon reads are idempotent, so resolved data URIs are cached for the
/// lifetime of the process, misses included.
static ICON_CACHE: Lazy<Mutex<HashMap<PathBuf, Option<String>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Resolve an icon reference to an embeddable data URI. Failures are
/// non-fatal: the node simply renders without an icon.
pub fn data_uri(assets_dir: &Path, icon: &str) -> Option<String> {
    let path = assets_dir.join(icon);
    if let Ok(cache) = ICON_CACHE.lock() {
        if let Some(cached) = cache.get(&path) {
            return cached.clone();
        }
    }

    let resolved = read_data_uri(&path);
    if resolved.is_none() {
        tracing::warn!(path = %path.display(), "icon could not be read");
    }
    if let Ok(mut cache) = ICON_CACHE.lock() {
        cache.insert(path, resolved.clone());
    }
    resolved
}

fn read_data_uri(path: &Path) -> Option<String> {
    let data = std::fs::read(path).ok()?;
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/svg+xml",
    };
    Some(format!("data:{};base64,{}", mime, BASE64.encode(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_icon_is_none() {
        let dir = std::env::temp_dir();
        assert!(data_uri(&dir, "definitely-not-here.svg").is_none());
    }

    #[test]
    fn svg_icon_round_trips_and_caches() {
        let dir = std::env::temp_dir().join("adac-icon-test");
        std::fs::create_dir_all(&dir).expect("tempdir");
        let file = dir.join("box.svg");
        std::fs::write(&file, "<svg xmlns='http://www.w3.org/2000/svg'/>").expect("write");

        let uri = data_uri(&dir, "box.svg").expect("uri missing");
        assert!(uri.starts_with("data:image/svg+xml;base64,"));

        // Second lookup is served from the cache even if the file vanishes.
        std::fs::remove_file(&file).expect("remove");
        assert_eq!(data_uri(&dir, "box.svg"), Some(uri));
    }
}
