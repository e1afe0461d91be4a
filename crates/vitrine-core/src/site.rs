//! [`Site`]: one shared reconciler per content type.

use std::sync::Arc;

use serde::Serialize;

use crate::{
  Error, Result,
  cache::LocalCache,
  content::{Announcement, Case, HomeProject, Link, Service, Setting, Theme},
  entity::{Entity, EntityKind},
  reconcile::{Reconciler, Status},
  store::{AuditEntry, RemoteStore},
};

/// Every content section of the site, sharing one remote store and one
/// local cache.
pub struct Site<R, C> {
  pub announcements: Reconciler<Announcement, R, C>,
  pub services:      Reconciler<Service, R, C>,
  pub cases:         Reconciler<Case, R, C>,
  pub links:         Reconciler<Link, R, C>,
  pub home_projects: Reconciler<HomeProject, R, C>,
  pub settings:      Reconciler<Setting, R, C>,
  pub theme:         Reconciler<Theme, R, C>,
  remote:            Arc<R>,
}

/// The current mode of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
  pub entity: EntityKind,
  pub status: Status,
}

impl<R: RemoteStore, C: LocalCache> Site<R, C> {
  pub fn new(remote: Arc<R>, cache: Arc<C>) -> Self {
    Self {
      announcements: Reconciler::new(remote.clone(), cache.clone()),
      services:      Reconciler::new(remote.clone(), cache.clone()),
      cases:         Reconciler::new(remote.clone(), cache.clone()),
      links:         Reconciler::new(remote.clone(), cache.clone()),
      home_projects: Reconciler::new(remote.clone(), cache.clone()),
      settings:      Reconciler::new(remote.clone(), cache.clone()),
      theme:         Reconciler::new(remote.clone(), cache),
      remote,
    }
  }

  /// The reconciler for content type `E`.
  pub fn section<E: Section>(&self) -> &Reconciler<E, R, C> { E::section(self) }

  pub fn statuses(&self) -> Vec<SectionStatus> {
    let status = |entity, status| SectionStatus { entity, status };
    vec![
      status(EntityKind::Announcements, self.announcements.status()),
      status(EntityKind::Services, self.services.status()),
      status(EntityKind::Cases, self.cases.status()),
      status(EntityKind::Links, self.links.status()),
      status(EntityKind::HomeProjects, self.home_projects.status()),
      status(EntityKind::Settings, self.settings.status()),
      status(EntityKind::Theme, self.theme.status()),
    ]
  }

  /// Probe the remote store without touching any section's mode.
  pub async fn check_remote(&self) -> Result<()> {
    self
      .remote
      .health_check()
      .await
      .map_err(|e| Error::Remote(Box::new(e)))
  }

  /// The most recent audit entries, newest first.
  pub async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
    self
      .remote
      .recent_audit(limit)
      .await
      .map_err(|e| Error::Remote(Box::new(e)))
  }
}

/// Maps a content type to its field on [`Site`].
pub trait Section: Entity {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C>;
}

impl Section for Announcement {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C> { &site.announcements }
}

impl Section for Service {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C> { &site.services }
}

impl Section for Case {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C> { &site.cases }
}

impl Section for Link {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C> { &site.links }
}

impl Section for HomeProject {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C> { &site.home_projects }
}

impl Section for Setting {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C> { &site.settings }
}

impl Section for Theme {
  fn section<R, C>(site: &Site<R, C>) -> &Reconciler<Self, R, C> { &site.theme }
}
