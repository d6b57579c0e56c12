//! Per-item skip-or-fetch steps driven by the `dump` binary. Each step checks
//! the store first and only invokes its fetch closure when the file is
//! missing, so a fully populated store performs no network requests.

use crate::{images, store::Store, Error, Json};

pub fn page<F>(store: &Store, title: &str, fetch: F) -> Result<(), Error>
where
    F: FnOnce() -> Result<Json, Error>,
{
    let name = store.sanitize(title);
    if store.has_page(title) {
        println!("Skipping page: {} (already exists)", name);
        return Ok(());
    }
    println!("Fetching page: {}", name);
    store.write_page(title, &fetch()?)
}

pub fn revisions<F>(store: &Store, title: &str, fetch: F) -> Result<(), Error>
where
    F: FnOnce() -> Result<Json, Error>,
{
    let name = store.sanitize(title);
    if store.has_revisions(title) {
        println!("Skipping revisions: {} (already exists)", name);
        return Ok(());
    }
    println!("Fetching revisions: {}", name);
    store.write_revisions(title, &fetch()?)
}

pub fn image<F>(store: &Store, url: &str, fetch: F) -> Result<(), Error>
where
    F: FnOnce() -> Result<Vec<u8>, Error>,
{
    let name = store.sanitize(images::filename(url));
    if store.has_image(&name) {
        println!("Skipping image: {} (already exists)", name);
        return Ok(());
    }
    println!("Downloading image: {}", name);
    store.write_image(&name, &fetch()?)
}

#[cfg(test)]
mod tests {
    use super::{image, page, revisions};
    use crate::store::Store;
    use serde_json::json;

    const URL: &str = "https://tgstation13.org/wiki/images/a/ab/Toolbox.png";

    #[test]
    fn populated_store_never_invokes_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.write_page("AI", &json!({"parse": {}})).unwrap();
        store.write_revisions("AI", &json!({"query": {}})).unwrap();
        store.write_image("Toolbox.png", b"png").unwrap();

        let mut calls = 0;
        page(&store, "AI", || {
            calls += 1;
            Ok(json!({}))
        })
        .unwrap();
        revisions(&store, "AI", || {
            calls += 1;
            Ok(json!({}))
        })
        .unwrap();
        image(&store, URL, || {
            calls += 1;
            Ok(Vec::new())
        })
        .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn missing_files_are_fetched_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut calls = 0;
        page(&store, "AI", || {
            calls += 1;
            Ok(json!({"parse": {"title": "AI"}}))
        })
        .unwrap();
        revisions(&store, "AI", || {
            calls += 1;
            Ok(json!({"query": {}}))
        })
        .unwrap();
        image(&store, URL, || {
            calls += 1;
            Ok(b"png".to_vec())
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert!(store.has_page("AI"));
        assert!(store.has_revisions("AI"));
        assert!(store.has_image("Toolbox.png"));
    }

    #[test]
    fn fetch_error_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let err = page(&store, "AI", || {
            Err(crate::Error::Api(json!({"error": "boom"})))
        });
        assert!(err.is_err());
        assert!(!store.has_page("AI"));
    }
}
