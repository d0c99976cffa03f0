// src/listing.rs
//
// Full bucket roster: every key paired with its stored display name.

use anyhow::Result;
use tracing::{debug, info};

use crate::object_store::{ObjectStore, StoredObject};

/// Shown by every command that finds nothing in the bucket.
pub const EMPTY_BUCKET_MESSAGE: &str = "No objects were found in the bucket.";

/// Walk every listing page and HEAD each key to recover its display name.
///
/// Returns `Ok(None)` when the first page is empty. Listings never carry
/// user metadata, so this costs one HEAD per object on top of the page calls.
pub async fn list_all_objects(store: &dyn ObjectStore) -> Result<Option<Vec<StoredObject>>> {
    let mut objects = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.list_page(token.as_deref()).await?;
        pages += 1;
        if pages == 1 && page.keys.is_empty() {
            info!("Bucket {} is empty", store.bucket());
            return Ok(None);
        }
        let next = page.next_token().map(str::to_string);

        for key in page.keys {
            match store.head(&key).await? {
                Some(head) => {
                    let display_name = head.display_name().unwrap_or_default().to_string();
                    debug!("{} -> {:?} ({:?} bytes)", key, display_name, head.content_length);
                    objects.push(StoredObject { key, display_name });
                }
                // Deleted between the listing and the HEAD.
                None => debug!("{} vanished during listing, skipped", key),
            }
        }

        match next {
            Some(t) => token = Some(t),
            None => break,
        }
    }

    info!("Listed {} objects in {} page(s)", objects.len(), pages);
    Ok(Some(objects))
}

/// Two left-aligned columns under `File key` / `File name` headers.
pub fn render_table(objects: &[StoredObject]) -> Vec<String> {
    const KEY_HEADER: &str = "File key";
    const NAME_HEADER: &str = "File name";

    let key_width = objects
        .iter()
        .map(|o| o.key.chars().count())
        .chain(std::iter::once(KEY_HEADER.len()))
        .max()
        .unwrap_or(KEY_HEADER.len());
    let name_width = objects
        .iter()
        .map(|o| o.display_name.chars().count())
        .chain(std::iter::once(NAME_HEADER.len()))
        .max()
        .unwrap_or(NAME_HEADER.len());

    let mut lines = Vec::with_capacity(objects.len() + 2);
    lines.push(format!("{:<key_width$}  {}", KEY_HEADER, NAME_HEADER));
    lines.push(format!("{}  {}", "-".repeat(key_width), "-".repeat(name_width)));
    for obj in objects {
        lines.push(format!("{:<key_width$}  {}", obj.key, obj.display_name));
    }
    lines
}

/// Everything `list` prints: the table and a total, or the empty-bucket line.
pub fn listing_lines(objects: Option<&[StoredObject]>) -> Vec<String> {
    match objects {
        Some(objects) if !objects.is_empty() => {
            let mut lines = render_table(objects);
            lines.push(String::new());
            lines.push(format!("Total objects: {}", objects.len()));
            lines
        }
        _ => vec![EMPTY_BUCKET_MESSAGE.to_string()],
    }
}
