//! Default catalogue categories, installed by `--seed-tags`.

use tracing::info;
use vitrine_core::{
  store::CatalogStore,
  tag::{NewTag, TagPatch},
};

/// `(name, color)` for every default tag.
pub const DEFAULT_TAGS: [(&str, &str); 8] = [
  ("Beleza", "#ec4899"),
  ("Cabelo", "#f59e0b"),
  ("Make", "#8b5cf6"),
  ("Skincare", "#06b6d4"),
  ("Estilo", "#10b981"),
  ("Looks", "#ef4444"),
  ("Autocuidado", "#f97316"),
  ("Tendências", "#6366f1"),
];

/// Upsert [`DEFAULT_TAGS`]: missing tags are created and existing ones get
/// their default color back. Returns how many tags were created.
pub async fn seed_default_tags<S: CatalogStore>(store: &S) -> Result<usize, S::Error> {
  let mut created = 0;
  for (name, color) in DEFAULT_TAGS {
    match store.find_tag_by_name(name).await? {
      Some(existing) => {
        let patch = TagPatch {
          name:  None,
          color: Some(color.to_owned()),
        };
        store.update_tag(existing.tag_id, patch).await?;
      }
      None => {
        let tag = NewTag {
          name:  name.to_owned(),
          color: color.to_owned(),
        };
        store.create_tag(tag).await?;
        created += 1;
      }
    }
  }
  info!(created, total = DEFAULT_TAGS.len(), "default tags seeded");
  Ok(created)
}
