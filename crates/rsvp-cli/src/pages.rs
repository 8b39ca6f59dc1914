//! Terminal renditions of the site's pages.
//!
//! The router builds a [`Page`] the first time its route is visited; rendering
//! then fetches whatever the page shows from the API.

use std::fmt::Write as _;

use rsvp_client::ApiClient;
use rsvp_core::error::AppError;
use rsvp_core::models::{Event, EventStats, RsvpListEntry};
use rsvp_core::router::{ROUTES, Route};
use rsvp_core::traits::PageFactory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    /// RSVP form for one event
    EventRsvp { slug: &'static str },
    Registry,
    AdminLogin,
    AdminDashboard,
}

/// Builds pages for the CLI router.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliPages;

impl PageFactory for CliPages {
    type Page = Page;

    async fn load(&self, route: Route) -> Result<Page, AppError> {
        tracing::debug!(%route, "Building page");
        Ok(match route {
            Route::Home => Page::Home,
            Route::Engagement => Page::EventRsvp { slug: "engagement" },
            Route::Wedding => Page::EventRsvp { slug: "wedding" },
            Route::Registry => Page::Registry,
            Route::AdminLogin => Page::AdminLogin,
            Route::AdminDashboard => Page::AdminDashboard,
        })
    }
}

impl Page {
    pub async fn render(&self, api: &ApiClient) -> Result<String, AppError> {
        match self {
            Page::Home => {
                let events = api.list_events().await?;
                let mut out = events_table(&events);
                out.push('\n');
                out.push_str(&route_list());
                Ok(out)
            }
            Page::EventRsvp { slug } => {
                let event = api.get_event(slug).await?;
                let mut out = event_details(&event);
                let _ = writeln!(
                    out,
                    "\nTo RSVP:\n  rsvp rsvp --event {slug} --name <NAME> --email <EMAIL> --attending <true|false>"
                );
                Ok(out)
            }
            Page::Registry => {
                let registry = api.get_registry().await?;
                Ok(format!("Gift registry: {}\n", registry.registry_url))
            }
            Page::AdminLogin => Ok("Admin login\n\n  rsvp login\n\n\
                 The password is read from --password, RSVP_ADMIN_PASSWORD, or stdin.\n"
                .to_string()),
            Page::AdminDashboard => {
                let stats = api.get_admin_stats().await?;
                let rsvps = api.get_admin_rsvps(None).await?;
                let mut out = stats_table(&stats);
                out.push('\n');
                out.push_str(&rsvps_table(&rsvps));
                Ok(out)
            }
        }
    }
}

pub fn events_table(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events yet.\n".to_string();
    }

    let mut out = String::from("Events:\n");
    for event in events {
        let _ = writeln!(
            out,
            "  {}  {:<24} ({})",
            event.event_date.format("%Y-%m-%d"),
            event.name,
            event.slug
        );
    }
    out
}

pub fn event_details(event: &Event) -> String {
    let mut out = format!(
        "{}\n{}\n",
        event.name,
        event.event_date.format("%A, %B %-d, %Y")
    );
    if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "\n{description}");
    }
    out
}

pub fn stats_table(stats: &[EventStats]) -> String {
    let mut out = String::from("Responses by event:\n");
    if stats.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }
    for s in stats {
        let _ = writeln!(
            out,
            "  {:<24} total {:>4}  attending {:>4}  declined {:>4}",
            s.event_name, s.total_responses, s.attending, s.not_attending
        );
    }
    out
}

pub fn rsvps_table(rows: &[RsvpListEntry]) -> String {
    if rows.is_empty() {
        return "No RSVPs yet.\n".to_string();
    }

    let mut out = String::from("RSVPs:\n");
    for r in rows {
        let _ = writeln!(
            out,
            "  [{:>4}] {} - {} <{}> attending: {} ({})",
            r.id,
            r.submitted_at.format("%Y-%m-%d %H:%M"),
            r.name,
            r.email,
            r.attending_label(),
            r.event_slug
        );
    }
    let _ = writeln!(out, "\nTotal: {} RSVPs", rows.len());
    out
}

pub fn route_list() -> String {
    let mut out = String::from("Pages:\n");
    for entry in ROUTES {
        let lock = if entry.requires_auth { "  (admin)" } else { "" };
        let _ = writeln!(out, "  {:<18} {}{lock}", entry.path, entry.name);
    }
    out
}
