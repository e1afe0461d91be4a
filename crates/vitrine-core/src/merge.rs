//! Filling partially populated remote records from the fallback defaults.
//!
//! The remote schema may lag the deployed defaults: a row can exist without
//! its call-to-action text, link or detail block. Each remote record is
//! paired with a default record and blank fields are copied over.
//!
//! Pairing tries, in order: an explicit `slug`, the id, then exact title
//! equality. The title join exists for rows created before slugs; renaming
//! such a row silently drops its template content.

use tracing::debug;

use crate::{content::DetailBlock, entity::Entity};

/// Merge every record with its matching default, if any.
pub fn merge_with_defaults<E: Entity>(records: Vec<E>, defaults: &[E]) -> Vec<E> {
  records
    .into_iter()
    .map(|mut record| {
      if let Some(template) = find_template(&record, defaults) {
        record.fill_from(template);
      }
      record
    })
    .collect()
}

/// Find the default record that corresponds to `record`.
pub fn find_template<'a, E: Entity>(record: &E, defaults: &'a [E]) -> Option<&'a E> {
  if let Some(slug) = record.slug().filter(|s| !s.trim().is_empty())
    && let Some(template) = defaults.iter().find(|d| d.slug() == Some(slug))
  {
    return Some(template);
  }

  let id = record.id();
  if let Some(template) = defaults.iter().find(|d| d.id() == id) {
    return Some(template);
  }

  let title = record.title().filter(|t| !t.trim().is_empty())?;
  let template = defaults.iter().find(|d| d.title() == Some(title))?;
  debug!(
    entity = %E::TABLE.kind,
    title,
    "matched default by title"
  );
  Some(template)
}

fn is_blank(value: &Option<String>) -> bool {
  value.as_deref().is_none_or(|s| s.trim().is_empty())
}

pub(crate) fn fill_text(target: &mut Option<String>, template: &Option<String>) {
  if is_blank(target) && !is_blank(template) {
    target.clone_from(template);
  }
}

pub(crate) fn fill_detail(
  target: &mut Option<DetailBlock>,
  template: &Option<DetailBlock>,
) {
  let target_empty = target.as_ref().is_none_or(DetailBlock::is_empty);
  if target_empty && template.is_some() {
    target.clone_from(template);
  }
}
