//! Terms-of-service summarizer wizard.
//!
//! Two stages: paste the document, then review the summary and ask
//! follow-up questions about it. The summarize call carries the standard
//! harm-category thresholds.

use axum::Router;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use super::{Answer, BUSY_MESSAGE, CallOutcome, SESSION_EXPIRED, classify};
use crate::gemini::GenerateRequest;
use crate::gemini::types::{GenerationConfig, medium_and_above_safety};
use crate::render::{error_box, escape_html, page, result_box};
use crate::routes::AppState;

const TITLE: &str = "Terms of Service Summarizer";
const MAX_OUTPUT_TOKENS: u32 = 512;

/// Stages of the summarizer. `Review` self-loops for follow-up questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Collect,
    Review,
}

/// Per-visit state.
#[derive(Debug, Clone, Default)]
pub struct TosSession {
    pub stage: Stage,
    pub document: String,
    pub summary: String,
    pub answered: Option<Answer>,
    pub error: Option<String>,
    pub summary_in_flight: bool,
    pub question_in_flight: bool,
}

/// The document must contain something beyond whitespace.
pub fn validate_document(document: &str) -> Result<(), &'static str> {
    if document.trim().is_empty() {
        Err("Please paste the Terms of Service text first.")
    } else {
        Ok(())
    }
}

/// Prompt for the initial summary.
pub fn summary_prompt(document: &str) -> String {
    format!(
        "Please summarize the following Terms of Service document in simple terms, \
         focusing on key points like data usage, user rights, liability limitations, \
         and termination clauses. Use Markdown for formatting like headings, bold text, \
         and bullet points:\n\n{document}"
    )
}

/// Prompt for a follow-up question, carrying the original document.
pub fn question_prompt(document: &str, question: &str) -> String {
    format!(
        "Here is a Terms of Service document:\n\n{document}\n\n\
         Answer this specific question about the document in plain language, \
         using Markdown for formatting: {question}"
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/toss", get(show))
        .route("/toss/summarize", post(summarize))
        .route("/toss/ask", post(ask))
}

async fn show(State(state): State<AppState>) -> Html<String> {
    let id = state.tos.create(TosSession::default()).await;
    render_page(id, &TosSession::default())
}

#[derive(Deserialize)]
struct SummarizeForm {
    session: Uuid,
    #[serde(default)]
    document: String,
}

async fn summarize(
    State(state): State<AppState>,
    Form(form): Form<SummarizeForm>,
) -> Html<String> {
    // Validate and mark the slot busy under the lock; the call itself
    // runs without it.
    let prepared = state
        .tos
        .with(form.session, |s| {
            s.document = form.document.clone();
            if let Err(message) = validate_document(&s.document) {
                s.error = Some(message.to_string());
                return None;
            }
            if s.summary_in_flight {
                s.error = Some(BUSY_MESSAGE.to_string());
                return None;
            }
            s.error = None;
            s.summary_in_flight = true;
            Some(summary_prompt(&s.document))
        })
        .await;

    let prompt = match prepared {
        None => return expired_page(&state).await,
        Some(None) => return render_session(&state, form.session).await,
        Some(Some(prompt)) => prompt,
    };

    let request = GenerateRequest::text(prompt, GenerationConfig::with_output_cap(MAX_OUTPUT_TOKENS))
        .with_safety(medium_and_above_safety());
    let outcome = classify(state.generator.generate(request).await);

    let updated = state
        .tos
        .with(form.session, |s| {
            s.summary_in_flight = false;
            match outcome {
                CallOutcome::Text(text) => {
                    s.summary = text;
                    s.stage = Stage::Review;
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
        .tos
        .with(form.session, |s| {
            if s.stage != Stage::Review {
                s.error = Some("Summarize a document before asking questions.".to_string());
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
            Some(question_prompt(&s.document, &question))
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
        .tos
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

/// Re-render whatever state the session is in now.
async fn render_session(state: &AppState, id: Uuid) -> Html<String> {
    match state.tos.with(id, |s| render_page(id, s)).await {
        Some(html) => html,
        None => expired_page(state).await,
    }
}

/// Fresh entry page carrying the session-expired notice.
async fn expired_page(state: &AppState) -> Html<String> {
    let id = state.tos.create(TosSession::default()).await;
    let session = TosSession {
        error: Some(SESSION_EXPIRED.to_string()),
        ..TosSession::default()
    };
    render_page(id, &session)
}

fn render_page(id: Uuid, s: &TosSession) -> Html<String> {
    let mut body = format!("<h1>{TITLE}</h1>");
    if let Some(error) = &s.error {
        body.push_str(&error_box(error));
    }
    match s.stage {
        Stage::Collect => {
            body.push_str(&format!(
                "<p>Paste the Terms of Service (ToS) below and click \"Summarize\" to get a \
                 simplified overview.</p>\
                 <form method=\"post\" action=\"/toss/summarize\">\
                 <input type=\"hidden\" name=\"session\" value=\"{id}\">\
                 <textarea name=\"document\" rows=\"15\" \
                 placeholder=\"Paste Terms of Service text here...\">{doc}</textarea>\
                 <button type=\"submit\">Summarize</button>\
                 </form>",
                doc = escape_html(&s.document),
            ));
        }
        Stage::Review => {
            body.push_str(&result_box("Summary:", &s.summary));
            if let Some(answer) = &s.answered {
                body.push_str(&result_box(
                    &format!("Question: {}<br>Answer:", escape_html(&answer.question)),
                    &answer.text,
                ));
            }
            // The question box renders empty after every submission.
            body.push_str(&format!(
                "<h3>Ask Questions About the Document:</h3>\
                 <form method=\"post\" action=\"/toss/ask\">\
                 <input type=\"hidden\" name=\"session\" value=\"{id}\">\
                 <textarea name=\"question\" rows=\"5\" \
                 placeholder=\"Ask questions based on the text provided...\"></textarea>\
                 <button type=\"submit\" class=\"submit\">Submit Question</button>\
                 </form>",
            ));
        }
    }
    Html(page(TITLE, &body))
}
