//! Route table and shared application state.

use std::sync::Arc;

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::gemini::TextGenerator;
use crate::render::page;
use crate::session::SessionStore;
use crate::wizards;
use crate::wizards::citation::CitationSession;
use crate::wizards::small_claims::SmallClaimsSession;
use crate::wizards::tenancy::TenancySession;
use crate::wizards::tos::TosSession;

/// Everything the handlers need: the outbound client and one session
/// store per wizard. Cheap to clone; all fields are shared.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub tos: Arc<SessionStore<TosSession>>,
    pub small_claims: Arc<SessionStore<SmallClaimsSession>>,
    pub tenancy: Arc<SessionStore<TenancySession>>,
    pub citation: Arc<SessionStore<CitationSession>>,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        let idle = config.session_idle_timeout;
        Self {
            generator,
            tos: SessionStore::new(idle),
            small_claims: SessionStore::new(idle),
            tenancy: SessionStore::new(idle),
            citation: SessionStore::new(idle),
        }
    }
}

/// GET / — landing page listing the wizards.
async fn landing() -> Html<String> {
    let body = "\
        <h1>AI Lawyer Assistant</h1>\
        <p>Your legal companion, powered by AI.</p>\
        <a class=\"wizard\" href=\"/toss\">Terms of Service Simplifier</a>\
        <a class=\"wizard\" href=\"/smallcourtclaims\">Small Court Claims Preparation</a>\
        <a class=\"wizard\" href=\"/rentingdocs\">Renter and Landlord Rights</a>\
        <a class=\"wizard\" href=\"/traffictickets\">Traffic Tickets</a>";
    Html(page("AI Lawyer Assistant", body))
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .merge(wizards::tos::routes())
        .merge(wizards::small_claims::routes())
        .merge(wizards::tenancy::routes())
        .merge(wizards::citation::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn landing_links_every_wizard() {
        let html = landing().await.0;
        for href in ["/toss", "/smallcourtclaims", "/rentingdocs", "/traffictickets"] {
            assert!(html.contains(&format!("href=\"{href}\"")), "missing {href}");
        }
    }
}
