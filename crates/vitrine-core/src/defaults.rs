//! Hardcoded fallback content, shipped with each deployment.
//!
//! Shown when the remote store yields nothing and the local cache is empty,
//! and used as a template to fill blanks in partially populated remote rows.

use crate::content::{
  Announcement, Case, DetailBlock, DetailList, HomeProject, Link, Service,
  Setting, Theme,
};

fn text(s: &str) -> Option<String> { Some(s.to_owned()) }

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| (*s).to_owned()).collect()
}

pub fn announcements() -> Vec<Announcement> {
  vec![Announcement {
    id:          1,
    title:       "Booking is open for the new season".into(),
    description: "A limited number of brand strategy slots is available this \
                  quarter."
      .into(),
    date:        text("This season"),
    image_url:   None,
    link:        text("/services"),
    link_text:   text("See services"),
    is_active:   true,
    detail:      Some(DetailBlock {
      title:      "What's new".into(),
      paragraphs: strings(&[
        "Strategy sessions now include a written action plan.",
        "Returning clients get priority scheduling.",
      ]),
      list:       None,
      footer:     text("Slots are confirmed in order of request."),
    }),
    slug:        text("season-booking"),
    created_at:  None,
  }]
}

pub fn services() -> Vec<Service> {
  let service = |id: i64, slug: &str, title: &str, description: &str, icon: &str| {
    Service {
      id,
      title: title.into(),
      description: description.into(),
      icon: text(icon),
      price: None,
      action_text: text("Book"),
      action_link: text("/contacts"),
      sort_order: id,
      detail: None,
      slug: text(slug),
      created_at: None,
    }
  };

  vec![
    Service {
      price: text("from 450 €"),
      detail: Some(DetailBlock {
        title:      "Brand strategy".into(),
        paragraphs: strings(&[
          "We define positioning, audience and tone of voice.",
          "You leave with a one-page strategy you can act on.",
        ]),
        list:       Some(DetailList {
          title: "Includes".into(),
          items: strings(&[
            "Two working sessions",
            "Competitor review",
            "Written strategy",
          ]),
        }),
        footer:     text("Typical turnaround: two weeks."),
      }),
      ..service(
        1,
        "brand-strategy",
        "Brand strategy",
        "Positioning and messaging for a personal brand.",
        "compass",
      )
    },
    Service {
      price: text("from 200 €"),
      ..service(
        2,
        "brand-audit",
        "Personal brand audit",
        "A review of every public touchpoint with concrete fixes.",
        "search",
      )
    },
    service(
      3,
      "content-plan",
      "Content plan",
      "A month of topics, formats and publishing rhythm.",
      "calendar",
    ),
    service(
      4,
      "landing-page",
      "Landing page",
      "A one-page site that turns visitors into enquiries.",
      "layout",
    ),
    service(
      5,
      "social-media",
      "Social media management",
      "Ongoing publishing and community management.",
      "message-circle",
    ),
    Service {
      action_text: text("Ask a question"),
      price: text("90 € / hour"),
      ..service(
        6,
        "consultation",
        "Consultation",
        "An hour to work through one specific problem.",
        "phone",
      )
    },
  ]
}

pub fn cases() -> Vec<Case> {
  vec![
    Case {
      id:          1,
      title:       "Rebrand for an independent architect".into(),
      client:      text("Studio North"),
      description: "New positioning, portfolio structure and launch plan."
        .into(),
      result:      text("3x more enquiries in two months"),
      image_url:   None,
      link:        None,
      sort_order:  1,
      slug:        text("studio-north"),
      created_at:  None,
    },
    Case {
      id:          2,
      title:       "Content system for a nutrition coach".into(),
      client:      text("Private client"),
      description: "A repeatable weekly content format across two platforms."
        .into(),
      result:      text("+40% audience growth per quarter"),
      image_url:   None,
      link:        None,
      sort_order:  2,
      slug:        text("nutrition-coach"),
      created_at:  None,
    },
    Case {
      id:          3,
      title:       "Launch page for an online course".into(),
      client:      text("Design school"),
      description: "Landing page, email sequence and launch calendar.".into(),
      result:      text("Sold out first cohort"),
      image_url:   None,
      link:        None,
      sort_order:  3,
      slug:        text("course-launch"),
      created_at:  None,
    },
  ]
}

pub fn links() -> Vec<Link> {
  let link = |id: i64, title: &str, url: &str, icon: &str| Link {
    id,
    title: title.into(),
    url: url.into(),
    icon: text(icon),
    sort_order: id,
    created_at: None,
  };

  vec![
    link(1, "Telegram", "https://t.me/", "send"),
    link(2, "WhatsApp", "https://wa.me/", "message-square"),
    link(3, "Email", "mailto:hello@example.com", "mail"),
    link(4, "Instagram", "https://instagram.com/", "instagram"),
  ]
}

pub fn home_projects() -> Vec<HomeProject> {
  vec![
    HomeProject {
      id:          1,
      title:       "Services".into(),
      description: "What I can do for you".into(),
      image_url:   None,
      link:        text("/services"),
      sort_order:  1,
      slug:        text("services"),
      created_at:  None,
    },
    HomeProject {
      id:          2,
      title:       "Cases".into(),
      description: "Selected work and results".into(),
      image_url:   None,
      link:        text("/cases"),
      sort_order:  2,
      slug:        text("cases"),
      created_at:  None,
    },
    HomeProject {
      id:          3,
      title:       "Contacts".into(),
      description: "Get in touch".into(),
      image_url:   None,
      link:        text("/contacts"),
      sort_order:  3,
      slug:        text("contacts"),
      created_at:  None,
    },
  ]
}

pub fn settings() -> Vec<Setting> {
  let setting = |key: &str, value: &str, label: &str| Setting {
    key:        key.into(),
    value:      value.into(),
    label:      text(label),
    created_at: None,
  };

  vec![
    setting("avatar_url", "", "Avatar image URL"),
    setting("email", "hello@example.com", "Email"),
    setting("phone", "", "Phone"),
    setting("profile_bio", "I help experts turn what they know into a brand people remember.", "Short bio"),
    setting("profile_name", "Your Name", "Display name"),
    setting("profile_title", "Personal brand strategist", "Headline"),
  ]
}

pub fn theme() -> Vec<Theme> {
  vec![Theme {
    id:               1,
    primary_color:    "#1f2937".into(),
    accent_color:     "#f59e0b".into(),
    background_color: "#ffffff".into(),
    text_color:       "#111827".into(),
    font_family:      text("Inter"),
    dark_mode:        false,
    created_at:       None,
  }]
}
