//! Traffic-citation advisor wizard.
//!
//! Progresses linearly: CitationNumber → County → Details → Guidance.
//! Follow-up answers feed the previous answer back to the model as a
//! separate message part.

use axum::Router;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use super::{Answer, BUSY_MESSAGE, CallOutcome, SESSION_EXPIRED, classify};
use crate::gemini::GenerateRequest;
use crate::gemini::types::GenerationConfig;
use crate::render::{error_box, escape_html, page, result_box};
use crate::routes::AppState;

const TITLE: &str = "Traffic Tickets";
const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Stages of the advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    CitationNumber,
    County,
    Details,
    Guidance,
}

impl Stage {
    pub fn next(&self) -> Option<Stage> {
        use Stage::*;
        match self {
            CitationNumber => Some(County),
            County => Some(Details),
            Details => Some(Guidance),
            Guidance => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Guidance)
    }
}

/// Per-visit state.
#[derive(Debug, Clone, Default)]
pub struct CitationSession {
    pub stage: Stage,
    pub citation_number: String,
    pub county: String,
    pub details: String,
    pub guidance: String,
    pub answered: Option<Answer>,
    pub error: Option<String>,
    pub guidance_in_flight: bool,
    pub question_in_flight: bool,
}

/// Prompt for the general guidance.
pub fn guidance_prompt(citation_number: &str, county: &str, details: &str) -> String {
    format!(
        "Analyze the following traffic citation and provide detailed guidance:\n\
         Citation Number: {citation_number}\n\
         County: {county}\n\
         Additional Details: {details}\n\
         Please provide:\n\
         1. An explanation of the likely violation based on the citation number format and county\n\
         2. Typical fines and penalties for this type of citation in {county} County\n\
         3. All available options for the recipient (paying, contesting, traffic school, etc.)\n\
         4. Step-by-step procedures for each option in {county} County\n\
         5. Important deadlines and requirements specific to this jurisdiction\n\
         6. Potential impacts on driving record and insurance\n\
         7. Any county-specific programs or alternatives that might be available\n\
         Include any insights based on the additional details provided\n\
         Please provide comprehensive yet clear guidance that someone without legal \
         training can understand."
    )
}

/// Prompt for a follow-up question.
pub fn question_prompt(citation_number: &str, county: &str, details: &str, question: &str) -> String {
    format!(
        "Based on the previous information about your traffic citation:\n\
         - Citation Number: {citation_number}\n\
         - County: {county}\n\n\
         You asked: \"{question}\"\n\n\
         Please provide a detailed answer to this specific question about your citation, \
         including any relevant legal information, procedural guidance, or practical advice \
         applicable to {county} County. Consider the context from your additional details: \
         \"{details}\"\n\n\
         Offer concrete next steps when appropriate and clarify any jurisdiction-specific \
         requirements or deadlines relevant to this question."
    )
}

/// Message parts for a follow-up call: the previous answer (when one
/// exists) travels ahead of the question template.
pub fn question_parts(s: &CitationSession, question: &str) -> Vec<String> {
    let prompt = question_prompt(&s.citation_number, &s.county, &s.details, question);
    match &s.answered {
        Some(previous) if !previous.text.is_empty() => vec![previous.text.clone(), prompt],
        _ => vec![prompt],
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/traffictickets", get(show))
        .route("/traffictickets/citation", post(set_citation))
        .route("/traffictickets/county", post(set_county))
        .route("/traffictickets/details", post(set_details))
        .route("/traffictickets/ask", post(ask))
}

async fn show(State(state): State<AppState>) -> Html<String> {
    let id = state.citation.create(CitationSession::default()).await;
    render_page(id, &CitationSession::default())
}

#[derive(Deserialize)]
struct CitationForm {
    session: Uuid,
    #[serde(default)]
    citation_number: String,
}

async fn set_citation(
    State(state): State<AppState>,
    Form(form): Form<CitationForm>,
) -> Html<String> {
    advance_text_stage(
        &state,
        form.session,
        Stage::CitationNumber,
        form.citation_number,
        "Please enter the citation number.",
        |s, value| s.citation_number = value,
    )
    .await
}

#[derive(Deserialize)]
struct CountyForm {
    session: Uuid,
    #[serde(default)]
    county: String,
}

async fn set_county(State(state): State<AppState>, Form(form): Form<CountyForm>) -> Html<String> {
    advance_text_stage(
        &state,
        form.session,
        Stage::County,
        form.county,
        "Please enter the county the ticket was issued in.",
        |s, value| s.county = value,
    )
    .await
}

/// Shared shape of the purely-local advances: store the trimmed value and
/// move to the next stage, or stay put with an inline message.
async fn advance_text_stage(
    state: &AppState,
    id: Uuid,
    expected: Stage,
    value: String,
    empty_message: &str,
    store: impl FnOnce(&mut CitationSession, String),
) -> Html<String> {
    let updated = state
        .citation
        .with(id, |s| {
            if s.stage == expected {
                let value = value.trim().to_string();
                if value.is_empty() {
                    s.error = Some(empty_message.to_string());
                } else {
                    store(s, value);
                    s.error = None;
                    if let Some(next) = s.stage.next() {
                        s.stage = next;
                    }
                }
            }
            render_page(id, s)
        })
        .await;
    match updated {
        Some(html) => html,
        None => expired_page(state).await,
    }
}

#[derive(Deserialize)]
struct DetailsForm {
    session: Uuid,
    #[serde(default)]
    details: String,
}

async fn set_details(State(state): State<AppState>, Form(form): Form<DetailsForm>) -> Html<String> {
    let prepared = state
        .citation
        .with(form.session, |s| {
            if s.stage != Stage::Details {
                return None;
            }
            s.details = form.details.trim().to_string();
            if s.details.is_empty() {
                s.error = Some("Please add some details regarding your case.".to_string());
                return None;
            }
            if s.guidance_in_flight {
                s.error = Some(BUSY_MESSAGE.to_string());
                return None;
            }
            s.error = None;
            s.guidance_in_flight = true;
            Some(guidance_prompt(&s.citation_number, &s.county, &s.details))
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
        .citation
        .with(form.session, |s| {
            s.guidance_in_flight = false;
            match outcome {
                CallOutcome::Text(text) => {
                    s.guidance = text;
                    s.stage = Stage::Guidance;
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
        .citation
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
            Some(question_parts(s, &question))
        })
        .await;

    let parts = match prepared {
        None => return expired_page(&state).await,
        Some(None) => return render_session(&state, form.session).await,
        Some(Some(parts)) => parts,
    };

    let request = GenerateRequest {
        parts,
        config: GenerationConfig::with_output_cap(MAX_OUTPUT_TOKENS),
        safety: Vec::new(),
    };
    let outcome = classify(state.generator.generate(request).await);

    let updated = state
        .citation
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
    match state.citation.with(id, |s| render_page(id, s)).await {
        Some(html) => html,
        None => expired_page(state).await,
    }
}

async fn expired_page(state: &AppState) -> Html<String> {
    let id = state.citation.create(CitationSession::default()).await;
    let session = CitationSession {
        error: Some(SESSION_EXPIRED.to_string()),
        ..CitationSession::default()
    };
    render_page(id, &session)
}

fn render_page(id: Uuid, s: &CitationSession) -> Html<String> {
    let mut body = format!("<h1>{TITLE}</h1>");
    if let Some(error) = &s.error {
        body.push_str(&error_box(error));
    }
    match s.stage {
        Stage::CitationNumber => body.push_str(&format!(
            "<p>Citation Number (located in top right corner):</p>\
             <form method=\"post\" action=\"/traffictickets/citation\">\
             <input type=\"hidden\" name=\"session\" value=\"{id}\">\
             <textarea name=\"citation_number\" rows=\"1\" \
             placeholder=\"This is located in the top right of the ticket...\">{value}</textarea>\
             <button type=\"submit\">Next</button>\
             </form>",
            value = escape_html(&s.citation_number),
        )),
        Stage::County => body.push_str(&format!(
            "<p>What county was the ticket issued in:</p>\
             <form method=\"post\" action=\"/traffictickets/county\">\
             <input type=\"hidden\" name=\"session\" value=\"{id}\">\
             <textarea name=\"county\" rows=\"1\" \
             placeholder=\"Enter the county the ticket was issued in...\">{value}</textarea>\
             <button type=\"submit\">Next</button>\
             </form>",
            value = escape_html(&s.county),
        )),
        Stage::Details => body.push_str(&format!(
            "<p>Add details about your case:</p>\
             <form method=\"post\" action=\"/traffictickets/details\">\
             <input type=\"hidden\" name=\"session\" value=\"{id}\">\
             <textarea name=\"details\" rows=\"15\" \
             placeholder=\"Add some details regarding your case for better responses...\">{value}</textarea>\
             <button type=\"submit\">Get General summary</button>\
             </form>",
            value = escape_html(&s.details),
        )),
        Stage::Guidance => {
            body.push_str(&result_box("Here is what you need to know", &s.guidance));
            if let Some(answer) = &s.answered {
                body.push_str(&result_box(
                    &format!("Question: {}<br>Answer:", escape_html(&answer.question)),
                    &answer.text,
                ));
            }
            body.push_str(&format!(
                "<p>Enter specific questions:</p>\
                 <form method=\"post\" action=\"/traffictickets/ask\">\
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

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session() -> CitationSession {
        CitationSession {
            stage: Stage::Guidance,
            citation_number: "CA-12345".to_string(),
            county: "Alameda".to_string(),
            details: "Speeding on I-880, radar".to_string(),
            guidance: "Some guidance".to_string(),
            ..CitationSession::default()
        }
    }

    #[test]
    fn next_walks_all_stages() {
        use Stage::*;
        let mut current = CitationNumber;
        for expected in [County, Details, Guidance] {
            let next = current.next().unwrap();
            assert_eq!(next, expected);
            current = next;
        }
        assert!(current.next().is_none());
        assert!(current.is_terminal());
    }

    #[test]
    fn guidance_prompt_is_deterministic_and_complete() {
        let prompt = guidance_prompt("CA-12345", "Alameda", "Speeding on I-880");
        assert_eq!(prompt, guidance_prompt("CA-12345", "Alameda", "Speeding on I-880"));
        assert!(prompt.contains("Citation Number: CA-12345"));
        assert!(prompt.contains("Alameda County"));
        assert!(prompt.contains("traffic school"));
        assert!(prompt.contains("driving record and insurance"));
    }

    #[test]
    fn question_prompt_quotes_question_and_details() {
        let prompt = question_prompt("CA-1", "Kern", "night stop", "Can I do traffic school?");
        assert!(prompt.contains("You asked: \"Can I do traffic school?\""));
        assert!(prompt.contains("Kern County"));
        assert!(prompt.contains("\"night stop\""));
    }

    #[test]
    fn first_follow_up_sends_one_part() {
        let session = ready_session();
        let parts = question_parts(&session, "What is the deadline?");
        assert_eq!(parts.len(), 1);
        assert!(parts[0].contains("What is the deadline?"));
    }

    #[test]
    fn later_follow_ups_lead_with_previous_answer() {
        let mut session = ready_session();
        session.answered = Some(Answer {
            question: "first?".to_string(),
            text: "Earlier answer text".to_string(),
        });
        let parts = question_parts(&session, "And now?");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "Earlier answer text");
        assert!(parts[1].contains("And now?"));
    }

    #[test]
    fn each_stage_renders_exactly_one_form() {
        let forms = [
            "/traffictickets/citation",
            "/traffictickets/county",
            "/traffictickets/details",
            "/traffictickets/ask",
        ];
        for (stage, own_form) in [
            (Stage::CitationNumber, "/traffictickets/citation"),
            (Stage::County, "/traffictickets/county"),
            (Stage::Details, "/traffictickets/details"),
            (Stage::Guidance, "/traffictickets/ask"),
        ] {
            let session = CitationSession {
                stage,
                ..CitationSession::default()
            };
            let html = render_page(Uuid::new_v4(), &session).0;
            for form in forms {
                assert_eq!(
                    html.contains(&format!("action=\"{form}\"")),
                    form == own_form,
                    "stage {stage:?} should render only {own_form}"
                );
            }
        }
    }
}
