//! Landlord-tenant rights wizard.
//!
//! Progresses linearly: Role → Location → Category → Lease → Rights.
//! The Lease advance performs the remote call; Rights self-loops for
//! follow-up questions.

use axum::Router;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use super::{Answer, BUSY_MESSAGE, CallOutcome, SESSION_EXPIRED, classify};
use crate::gemini::GenerateRequest;
use crate::gemini::types::GenerationConfig;
use crate::render::{error_box, escape_html, options_html, page, result_box};
use crate::routes::AppState;

const TITLE: &str = "Renter and Landlord Rights";
const MAX_OUTPUT_TOKENS: u32 = 512;

pub const ISSUE_CATEGORIES: [&str; 8] = [
    "Repairs and habitability issues",
    "Security deposit rules and timelines",
    "Eviction processes and protections",
    "Privacy and landlord entry requirements",
    "Lease termination procedures",
    "Rent increase limitations",
    "Discrimination protections",
    "Subletting and guest policies",
];

/// Stages of the rights wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Role,
    Location,
    Category,
    Lease,
    Rights,
}

impl Stage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (Role, Location) | (Location, Category) | (Category, Lease) | (Lease, Rights)
        )
    }

    /// Next stage in the linear progression, if any.
    pub fn next(&self) -> Option<Stage> {
        use Stage::*;
        match self {
            Role => Some(Location),
            Location => Some(Category),
            Category => Some(Lease),
            Lease => Some(Rights),
            Rights => None,
        }
    }

    /// Whether this stage shows the result and accepts follow-ups.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rights)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Role => "role",
            Self::Location => "location",
            Self::Category => "category",
            Self::Lease => "lease",
            Self::Rights => "rights",
        };
        write!(f, "{s}")
    }
}

/// Per-visit state.
#[derive(Debug, Clone, Default)]
pub struct TenancySession {
    pub stage: Stage,
    pub role: String,
    pub zip: String,
    pub category: String,
    pub lease: String,
    pub rights: String,
    pub answered: Option<Answer>,
    pub error: Option<String>,
    pub rights_in_flight: bool,
    pub question_in_flight: bool,
}

/// Exactly five numeric characters.
pub fn is_valid_zip(value: &str) -> bool {
    value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Prompt for the general rights summary.
pub fn rights_prompt(zip: &str, role: &str, category: &str, lease: &str) -> String {
    format!(
        "You are a legal assistant specializing in landlord-tenant laws.\n\
         Given the following inputs:\n\
         - User ZIP code: {zip}\n\
         - User role: {role}\n\
         - Issue category: {category}\n\
         - User's leasing contract: {lease}\n\n\
         Provide a detailed but easy-to-understand summary of their legal rights and \
         responsibilities. Your response should include:\n\n\
         1. Legal Framework Overview:\n\
         2. Specific Rights & Responsibilities:\n\
         3. Time Limitations & Notice Requirements:\n\
         4. Documentation Recommendations:\n\n\
         The tone should be clear, supportive, and professional, similar to a legal help \
         website. Only include information that is applicable to their role and location."
    )
}

/// Prompt for a follow-up question over the collected context.
pub fn question_prompt(
    zip: &str,
    role: &str,
    category: &str,
    lease: &str,
    question: &str,
) -> String {
    format!(
        "Answer this specific law question: {question}, based on a {role} in zip code: \
         {zip} and issue category: {category}. Here is some or all of the user's leasing \
         contract: {lease}."
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rentingdocs", get(show))
        .route("/rentingdocs/role", post(set_role))
        .route("/rentingdocs/location", post(set_location))
        .route("/rentingdocs/category", post(set_category))
        .route("/rentingdocs/lease", post(set_lease))
        .route("/rentingdocs/ask", post(ask))
}

async fn show(State(state): State<AppState>) -> Html<String> {
    let id = state.tenancy.create(TenancySession::default()).await;
    render_page(id, &TenancySession::default())
}

#[derive(Deserialize)]
struct RoleForm {
    session: Uuid,
    #[serde(default)]
    role: String,
}

async fn set_role(State(state): State<AppState>, Form(form): Form<RoleForm>) -> Html<String> {
    let updated = state
        .tenancy
        .with(form.session, |s| {
            if s.stage == Stage::Role {
                s.role = form.role.trim().to_string();
                if s.role.is_empty() {
                    s.error = Some("Please enter whether you are a tenant or a landlord.".to_string());
                } else if let Some(next) = s.stage.next() {
                    s.error = None;
                    s.stage = next;
                }
            }
            render_page(form.session, s)
        })
        .await;
    match updated {
        Some(html) => html,
        None => expired_page(&state).await,
    }
}

#[derive(Deserialize)]
struct LocationForm {
    session: Uuid,
    #[serde(default)]
    zip: String,
}

async fn set_location(
    State(state): State<AppState>,
    Form(form): Form<LocationForm>,
) -> Html<String> {
    let updated = state
        .tenancy
        .with(form.session, |s| {
            if s.stage == Stage::Location {
                let candidate = form.zip.trim();
                if is_valid_zip(candidate) {
                    s.zip = candidate.to_string();
                    s.error = None;
                    if let Some(next) = s.stage.next() {
                        s.stage = next;
                    }
                } else {
                    // Digit-only filter: anything else never reaches the session.
                    s.error = Some("Please enter a valid 5-digit zip code.".to_string());
                }
            }
            render_page(form.session, s)
        })
        .await;
    match updated {
        Some(html) => html,
        None => expired_page(&state).await,
    }
}

#[derive(Deserialize)]
struct CategoryForm {
    session: Uuid,
    #[serde(default)]
    category: String,
}

async fn set_category(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Html<String> {
    let updated = state
        .tenancy
        .with(form.session, |s| {
            if s.stage == Stage::Category {
                if ISSUE_CATEGORIES.contains(&form.category.as_str()) {
                    s.category = form.category.clone();
                    s.error = None;
                    if let Some(next) = s.stage.next() {
                        s.stage = next;
                    }
                } else {
                    s.error = Some("Please select an issue category.".to_string());
                }
            }
            render_page(form.session, s)
        })
        .await;
    match updated {
        Some(html) => html,
        None => expired_page(&state).await,
    }
}

#[derive(Deserialize)]
struct LeaseForm {
    session: Uuid,
    #[serde(default)]
    lease: String,
}

async fn set_lease(State(state): State<AppState>, Form(form): Form<LeaseForm>) -> Html<String> {
    let prepared = state
        .tenancy
        .with(form.session, |s| {
            if s.stage != Stage::Lease {
                return None;
            }
            s.lease = form.lease.trim().to_string();
            if s.lease.is_empty() {
                s.error =
                    Some("Please paste your leasing contract, or \"na\" if unavailable.".to_string());
                return None;
            }
            if s.rights_in_flight {
                s.error = Some(BUSY_MESSAGE.to_string());
                return None;
            }
            s.error = None;
            s.rights_in_flight = true;
            Some(rights_prompt(&s.zip, &s.role, &s.category, &s.lease))
        })
        .await;

    let prompt = match prepared {
        None => return expired_page(&state).await,
        Some(None) => return render_session(&state, form.session).await,
        Some(Some(prompt)) => prompt,
    };

    let request =
        GenerateRequest::text(prompt, GenerationConfig::with_output_cap(MAX_OUTPUT_TOKENS));
    let outcome = classify(state.generator.generate(request).await);

    let updated = state
        .tenancy
        .with(form.session, |s| {
            s.rights_in_flight = false;
            match outcome {
                CallOutcome::Text(text) => {
                    s.rights = text;
                    s.stage = Stage::Rights;
                    s.error = None;
                }
                CallOutcome::Failed(message) => s.error = Some(message),
            }
            render_page(form.session, s)
        })
        .await;
    match updated {
        Some(html) => html,
        None => expired_page(&state).await,
    }
}

#[derive(Deserialize)]
struct AskForm {
    session: Uuid,
    #[serde(default)]
    question: String,
}

async fn ask(State(state): State<AppState>, Form(form): Form<AskForm>) -> Html<String> {
    let question = form.question.trim().to_string();

    let prepared = state
        .tenancy
        .with(form.session, |s| {
            if !s.stage.is_terminal() {
                s.error = Some("Finish the steps above before asking questions.".to_string());
                return None;
            }
            if question.is_empty() {
                s.error = Some("Please enter a question.".to_string());
                return None;
            }
            if s.question_in_flight {
                s.error = Some(BUSY_MESSAGE.to_string());
                return None;
            }
            s.error = None;
            s.question_in_flight = true;
            Some(question_prompt(
                &s.zip, &s.role, &s.category, &s.lease, &question,
            ))
        })
        .await;

    let prompt = match prepared {
        None => return expired_page(&state).await,
        Some(None) => return render_session(&state, form.session).await,
        Some(Some(prompt)) => prompt,
    };

    let request =
        GenerateRequest::text(prompt, GenerationConfig::with_output_cap(MAX_OUTPUT_TOKENS));
    let outcome = classify(state.generator.generate(request).await);

    let updated = state
        .tenancy
        .with(form.session, |s| {
            s.question_in_flight = false;
            match outcome {
                CallOutcome::Text(text) => {
                    s.answered = Some(Answer {
                        question: question.clone(),
                        text,
                    });
                    s.error = None;
                }
                CallOutcome::Failed(message) => s.error = Some(message),
            }
            render_page(form.session, s)
        })
        .await;
    match updated {
        Some(html) => html,
        None => expired_page(&state).await,
    }
}

async fn render_session(state: &AppState, id: Uuid) -> Html<String> {
    match state.tenancy.with(id, |s| render_page(id, s)).await {
        Some(html) => html,
        None => expired_page(state).await,
    }
}

async fn expired_page(state: &AppState) -> Html<String> {
    let id = state.tenancy.create(TenancySession::default()).await;
    let session = TenancySession {
        error: Some(SESSION_EXPIRED.to_string()),
        ..TenancySession::default()
    };
    render_page(id, &session)
}

fn render_page(id: Uuid, s: &TenancySession) -> Html<String> {
    let mut body = format!("<h1>{TITLE}</h1>");
    if let Some(error) = &s.error {
        body.push_str(&error_box(error));
    }
    match s.stage {
        Stage::Role => body.push_str(&format!(
            "<p>Are you a tenant or a landlord?</p>\
             <form method=\"post\" action=\"/rentingdocs/role\">\
             <input type=\"hidden\" name=\"session\" value=\"{id}\">\
             <textarea name=\"role\" rows=\"1\" \
             placeholder=\"Put if you are a tenant or a landlord...\">{role}</textarea>\
             <button type=\"submit\">Next</button>\
             </form>",
            role = escape_html(&s.role),
        )),
        Stage::Location => body.push_str(&format!(
            "<p>Zip code:</p>\
             <form method=\"post\" action=\"/rentingdocs/location\">\
             <input type=\"hidden\" name=\"session\" value=\"{id}\">\
             <input name=\"zip\" maxlength=\"5\" inputmode=\"numeric\" \
             placeholder=\"Zip code...\" value=\"{zip}\">\
             <button type=\"submit\">Next</button>\
             </form>",
            zip = escape_html(&s.zip),
        )),
        Stage::Category => body.push_str(&format!(
            "<p>Issue category</p>\
             <form method=\"post\" action=\"/rentingdocs/category\">\
             <input type=\"hidden\" name=\"session\" value=\"{id}\">\
             <select name=\"category\">{options}</select> \
             <button type=\"submit\">Next</button>\
             </form>",
            options = options_html(
                "Select Issue Category",
                &ISSUE_CATEGORIES,
                Some(s.category.as_str())
            ),
        )),
        Stage::Lease => body.push_str(&format!(
            "<p>Put in your leasing contract</p>\
             <form method=\"post\" action=\"/rentingdocs/lease\">\
             <input type=\"hidden\" name=\"session\" value=\"{id}\">\
             <textarea name=\"lease\" rows=\"15\" \
             placeholder=\"Put in your leasing contract or na if unavailable...\">{lease}</textarea>\
             <button type=\"submit\">Get General summary</button>\
             </form>",
            lease = escape_html(&s.lease),
        )),
        Stage::Rights => {
            body.push_str(&result_box("General Rights:", &s.rights));
            if let Some(answer) = &s.answered {
                body.push_str(&result_box(
                    &format!("Question: {}<br>Answer:", escape_html(&answer.question)),
                    &answer.text,
                ));
            }
            body.push_str(&format!(
                "<p>Put specific questions below</p>\
                 <form method=\"post\" action=\"/rentingdocs/ask\">\
                 <input type=\"hidden\" name=\"session\" value=\"{id}\">\
                 <textarea name=\"question\" rows=\"5\" \
                 placeholder=\"Put specific questions here...\"></textarea>\
                 <button type=\"submit\">Submit Question</button>\
                 </form>",
            ));
        }
    }
    Html(page(TITLE, &body))
}
