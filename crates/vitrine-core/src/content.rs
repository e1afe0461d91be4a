//! Concrete content types shown on the public site.
//!
//! Remote rows may be partially populated: every optional field tolerates
//! both a missing key and an explicit `null`, and nested [`DetailBlock`]s
//! decode to empty structures rather than failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  defaults,
  entity::{
    Entity, EntityKind, Identity, Order, RecordId, Table, null_as_default,
    null_as_true, yes,
  },
  merge::{fill_detail, fill_text},
};

// ─── Detail block ────────────────────────────────────────────────────────────

/// A titled bullet list inside a [`DetailBlock`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailList {
  #[serde(default, deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub items: Vec<String>,
}

/// The expanded "read more" body of an announcement or service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailBlock {
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:      String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub paragraphs: Vec<String>,
  #[serde(default)]
  pub list:       Option<DetailList>,
  #[serde(default)]
  pub footer:     Option<String>,
}

impl DetailBlock {
  /// `true` when there is nothing worth rendering.
  pub fn is_empty(&self) -> bool {
    self.title.trim().is_empty()
      && self.paragraphs.iter().all(|p| p.trim().is_empty())
      && self.list.as_ref().is_none_or(|l| l.items.is_empty())
      && self.footer.as_deref().is_none_or(|f| f.trim().is_empty())
  }
}

// ─── Announcement ────────────────────────────────────────────────────────────

/// A news item on the home page. Append-only in spirit: newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
  #[serde(default)]
  pub id:          i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:       String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  /// Free-form display date, e.g. "March 2025".
  #[serde(default)]
  pub date:        Option<String>,
  #[serde(default)]
  pub image_url:   Option<String>,
  #[serde(default)]
  pub link:        Option<String>,
  #[serde(default)]
  pub link_text:   Option<String>,
  #[serde(default = "yes", deserialize_with = "null_as_true")]
  pub is_active:   bool,
  #[serde(default)]
  pub detail:      Option<DetailBlock>,
  #[serde(default)]
  pub slug:        Option<String>,
  #[serde(default)]
  pub created_at:  Option<DateTime<Utc>>,
}

impl Entity for Announcement {
  const TABLE: Table = Table {
    kind:      EntityKind::Announcements,
    name:      "announcements",
    id_field:  "id",
    identity:  Identity::Serial,
    order:     Order::Descending("id"),
    cache_key: "vitrine.announcements",
  };

  fn id(&self) -> RecordId { RecordId::Serial(self.id) }

  fn set_id(&mut self, id: &RecordId) {
    if let Some(n) = id.as_serial() {
      self.id = n;
    }
  }

  fn title(&self) -> Option<&str> { Some(&self.title) }

  fn slug(&self) -> Option<&str> { self.slug.as_deref() }

  fn is_published(&self) -> bool { self.is_active }

  fn fill_from(&mut self, template: &Self) {
    fill_text(&mut self.link, &template.link);
    fill_text(&mut self.link_text, &template.link_text);
    fill_text(&mut self.image_url, &template.image_url);
    fill_detail(&mut self.detail, &template.detail);
  }

  fn defaults() -> Vec<Self> { defaults::announcements() }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// A service card with a call-to-action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
  #[serde(default)]
  pub id:          i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:       String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default)]
  pub icon:        Option<String>,
  #[serde(default)]
  pub price:       Option<String>,
  #[serde(default)]
  pub action_text: Option<String>,
  #[serde(default)]
  pub action_link: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order:  i64,
  #[serde(default)]
  pub detail:      Option<DetailBlock>,
  #[serde(default)]
  pub slug:        Option<String>,
  #[serde(default)]
  pub created_at:  Option<DateTime<Utc>>,
}

impl Entity for Service {
  const TABLE: Table = Table {
    kind:      EntityKind::Services,
    name:      "services",
    id_field:  "id",
    identity:  Identity::Serial,
    order:     Order::Ascending("sort_order"),
    cache_key: "vitrine.services",
  };

  fn id(&self) -> RecordId { RecordId::Serial(self.id) }

  fn set_id(&mut self, id: &RecordId) {
    if let Some(n) = id.as_serial() {
      self.id = n;
    }
  }

  fn title(&self) -> Option<&str> { Some(&self.title) }

  fn slug(&self) -> Option<&str> { self.slug.as_deref() }

  fn fill_from(&mut self, template: &Self) {
    fill_text(&mut self.icon, &template.icon);
    fill_text(&mut self.price, &template.price);
    fill_text(&mut self.action_text, &template.action_text);
    fill_text(&mut self.action_link, &template.action_link);
    fill_detail(&mut self.detail, &template.detail);
  }

  fn defaults() -> Vec<Self> { defaults::services() }
}

// ─── Case ────────────────────────────────────────────────────────────────────

/// A portfolio case study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Case {
  #[serde(default)]
  pub id:          i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:       String,
  #[serde(default)]
  pub client:      Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  /// Headline outcome, e.g. "+40% inbound leads".
  #[serde(default)]
  pub result:      Option<String>,
  #[serde(default)]
  pub image_url:   Option<String>,
  #[serde(default)]
  pub link:        Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order:  i64,
  #[serde(default)]
  pub slug:        Option<String>,
  #[serde(default)]
  pub created_at:  Option<DateTime<Utc>>,
}

impl Entity for Case {
  const TABLE: Table = Table {
    kind:      EntityKind::Cases,
    name:      "cases",
    id_field:  "id",
    identity:  Identity::Serial,
    order:     Order::Ascending("sort_order"),
    cache_key: "vitrine.cases",
  };

  fn id(&self) -> RecordId { RecordId::Serial(self.id) }

  fn set_id(&mut self, id: &RecordId) {
    if let Some(n) = id.as_serial() {
      self.id = n;
    }
  }

  fn title(&self) -> Option<&str> { Some(&self.title) }

  fn slug(&self) -> Option<&str> { self.slug.as_deref() }

  fn fill_from(&mut self, template: &Self) {
    fill_text(&mut self.image_url, &template.image_url);
    fill_text(&mut self.link, &template.link);
    fill_text(&mut self.result, &template.result);
  }

  fn defaults() -> Vec<Self> { defaults::cases() }
}

// ─── Link ────────────────────────────────────────────────────────────────────

/// A contact or social link on the contacts page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
  #[serde(default)]
  pub id:         i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:      String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub url:        String,
  #[serde(default)]
  pub icon:       Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order: i64,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Link {
  const TABLE: Table = Table {
    kind:      EntityKind::Links,
    name:      "links",
    id_field:  "id",
    identity:  Identity::Serial,
    order:     Order::Ascending("sort_order"),
    cache_key: "vitrine.links",
  };

  fn id(&self) -> RecordId { RecordId::Serial(self.id) }

  fn set_id(&mut self, id: &RecordId) {
    if let Some(n) = id.as_serial() {
      self.id = n;
    }
  }

  fn title(&self) -> Option<&str> { Some(&self.title) }

  fn defaults() -> Vec<Self> { defaults::links() }
}

// ─── Home project ────────────────────────────────────────────────────────────

/// A highlighted project tile on the home page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeProject {
  #[serde(default)]
  pub id:          i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:       String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default)]
  pub image_url:   Option<String>,
  #[serde(default)]
  pub link:        Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sort_order:  i64,
  #[serde(default)]
  pub slug:        Option<String>,
  #[serde(default)]
  pub created_at:  Option<DateTime<Utc>>,
}

impl Entity for HomeProject {
  const TABLE: Table = Table {
    kind:      EntityKind::HomeProjects,
    name:      "home_projects",
    id_field:  "id",
    identity:  Identity::Serial,
    order:     Order::Ascending("sort_order"),
    cache_key: "vitrine.home_projects",
  };

  fn id(&self) -> RecordId { RecordId::Serial(self.id) }

  fn set_id(&mut self, id: &RecordId) {
    if let Some(n) = id.as_serial() {
      self.id = n;
    }
  }

  fn title(&self) -> Option<&str> { Some(&self.title) }

  fn slug(&self) -> Option<&str> { self.slug.as_deref() }

  fn fill_from(&mut self, template: &Self) {
    fill_text(&mut self.image_url, &template.image_url);
    fill_text(&mut self.link, &template.link);
  }

  fn defaults() -> Vec<Self> { defaults::home_projects() }
}

// ─── Setting ─────────────────────────────────────────────────────────────────

/// A key/value profile setting (name, phone, bio, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Setting {
  #[serde(default, deserialize_with = "null_as_default")]
  pub key:        String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub value:      String,
  /// Human-readable caption for the admin form.
  #[serde(default)]
  pub label:      Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Setting {
  const TABLE: Table = Table {
    kind:      EntityKind::Settings,
    name:      "settings",
    id_field:  "key",
    identity:  Identity::Key,
    order:     Order::Ascending("key"),
    cache_key: "vitrine.settings",
  };

  fn id(&self) -> RecordId { RecordId::Key(self.key.clone()) }

  fn set_id(&mut self, id: &RecordId) {
    if let RecordId::Key(k) = id {
      self.key = k.clone();
    }
  }

  fn fill_from(&mut self, template: &Self) {
    fill_text(&mut self.label, &template.label);
  }

  fn defaults() -> Vec<Self> { defaults::settings() }

  fn label(&self) -> String { format!("\"{}\"", self.key) }
}

// ─── Theme ───────────────────────────────────────────────────────────────────

/// Site-wide colour scheme and typography. The site renders the first record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Theme {
  #[serde(default)]
  pub id:               i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub primary_color:    String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub accent_color:     String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub background_color: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub text_color:       String,
  #[serde(default)]
  pub font_family:      Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub dark_mode:        bool,
  #[serde(default)]
  pub created_at:       Option<DateTime<Utc>>,
}

impl Entity for Theme {
  const TABLE: Table = Table {
    kind:      EntityKind::Theme,
    name:      "theme_settings",
    id_field:  "id",
    identity:  Identity::Serial,
    order:     Order::Ascending("id"),
    cache_key: "vitrine.theme",
  };

  fn id(&self) -> RecordId { RecordId::Serial(self.id) }

  fn set_id(&mut self, id: &RecordId) {
    if let Some(n) = id.as_serial() {
      self.id = n;
    }
  }

  fn defaults() -> Vec<Self> { defaults::theme() }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn partial_service_row_decodes() {
    let service: Service = serde_json::from_value(json!({
      "id": 3,
      "title": "Audit",
      "description": null,
      "sort_order": null,
      "detail": { "paragraphs": null, "list": { "items": ["a"] } }
    }))
    .unwrap();

    assert_eq!(service.description, "");
    assert_eq!(service.sort_order, 0);
    let detail = service.detail.unwrap();
    assert!(detail.paragraphs.is_empty());
    assert_eq!(detail.list.unwrap().title, "");
  }

  #[test]
  fn announcement_defaults_to_active() {
    let a: Announcement =
      serde_json::from_value(json!({ "id": 1, "title": "Hi" })).unwrap();
    assert!(a.is_active);

    let b: Announcement =
      serde_json::from_value(json!({ "id": 1, "is_active": null })).unwrap();
    assert!(b.is_active);

    let hidden: Announcement =
      serde_json::from_value(json!({ "id": 2, "is_active": false })).unwrap();
    assert!(!hidden.is_published());
  }

  #[test]
  fn empty_detail_block_is_empty() {
    assert!(DetailBlock::default().is_empty());
    assert!(
      !DetailBlock { footer: Some("Book a call".into()), ..Default::default() }
        .is_empty()
    );
  }
}
