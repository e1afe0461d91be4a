//! JSON REST API for Vitrine.
//!
//! Exposes two axum routers over a shared [`Site`]: an open read-only router
//! for the public pages and an admin router for mutations, sync and the audit
//! log. Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vitrine_api::public_router(site.clone()))
//! .nest("/api/admin", vitrine_api::admin_router(site.clone()))
//! ```

pub mod admin;
pub mod error;
pub mod public;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use vitrine_core::{
  cache::LocalCache,
  content::{Announcement, Case, HomeProject, Link, Service, Setting, Theme},
  site::{Section, Site},
  store::RemoteStore,
};

pub use error::ApiError;

type SiteRouter<R, C> = Router<Arc<Site<R, C>>>;

/// Build the public read router for `site`.
///
/// `/theme` serves the current theme record rather than a list.
pub fn public_router<R, C>(site: Arc<Site<R, C>>) -> Router<()>
where
  R: RemoteStore + 'static,
  C: LocalCache + 'static,
{
  let router = Router::new()
    .route("/theme", get(public::theme::<R, C>))
    .route("/health", get(public::health::<R, C>));

  let router = public_section::<Announcement, R, C>(router);
  let router = public_section::<Service, R, C>(router);
  let router = public_section::<Case, R, C>(router);
  let router = public_section::<Link, R, C>(router);
  let router = public_section::<HomeProject, R, C>(router);
  let router = public_section::<Setting, R, C>(router);

  router.with_state(site)
}

/// Build the admin router for `site`. Mount it behind authentication.
pub fn admin_router<R, C>(site: Arc<Site<R, C>>) -> Router<()>
where
  R: RemoteStore + 'static,
  C: LocalCache + 'static,
{
  let router = Router::new().route("/logs", get(admin::logs::<R, C>));

  let router = admin_section::<Announcement, R, C>(router);
  let router = admin_section::<Service, R, C>(router);
  let router = admin_section::<Case, R, C>(router);
  let router = admin_section::<Link, R, C>(router);
  let router = admin_section::<HomeProject, R, C>(router);
  let router = admin_section::<Setting, R, C>(router);
  let router = admin_section::<Theme, R, C>(router);

  router.with_state(site)
}

fn public_section<E, R, C>(router: SiteRouter<R, C>) -> SiteRouter<R, C>
where
  E: Section,
  R: RemoteStore + 'static,
  C: LocalCache + 'static,
{
  let kind = E::TABLE.kind;
  router.route(&format!("/{kind}"), get(public::list::<E, R, C>))
}

fn admin_section<E, R, C>(router: SiteRouter<R, C>) -> SiteRouter<R, C>
where
  E: Section,
  R: RemoteStore + 'static,
  C: LocalCache + 'static,
{
  let kind = E::TABLE.kind;
  router
    .route(
      &format!("/{kind}"),
      get(admin::list::<E, R, C>).post(admin::create::<E, R, C>),
    )
    .route(
      &format!("/{kind}/{{id}}"),
      put(admin::update::<E, R, C>).delete(admin::delete::<E, R, C>),
    )
    .route(&format!("/{kind}/sync"), post(admin::sync::<E, R, C>))
}
