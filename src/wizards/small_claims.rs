//! Small-claims preparation wizard.
//!
//! One big details stage (state, case type, dates, amounts, narrative
//! fields), then a walkthrough stage with the generated filing package
//! and a follow-up question loop.

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

const TITLE: &str = "Small Court Claims Preparation Assistant";
const MAX_OUTPUT_TOKENS: u32 = 4096;

pub const STATES: [&str; 50] = [
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
    "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
    "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
    "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
    "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
    "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia",
    "Wisconsin", "Wyoming",
];

pub const CASE_TYPES: [&str; 15] = [
    "Security deposit disputes",
    "Landlord/tenant issues (non-deposit)",
    "Consumer complaints",
    "Minor property damage",
    "Unpaid personal loans or debts",
    "Breach of contract",
    "Auto accident/repair disputes",
    "Contractor/home repair disputes",
    "Wage/employment disputes",
    "Returned check/payment issues",
    "Homeowner association disputes",
    "Professional service disputes",
    "Personal injury (minor)",
    "Property recovery",
    "Other",
];

pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Stages of the preparer. `Walkthrough` self-loops for follow-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Details,
    Walkthrough,
}

/// Raw field values exactly as submitted, kept so the form re-renders
/// populated after a validation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsFields {
    pub state: String,
    pub case_type: String,
    pub issue_description: String,
    pub claim_amount: String,
    pub incident_year: String,
    pub incident_month: String,
    pub incident_day: String,
    pub opposing_party: String,
    pub evidence: String,
}

/// Validated details the prompts are assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDetails {
    pub state: String,
    pub case_type: String,
    pub issue_description: String,
    pub claim_amount: u32,
    pub incident_year: u16,
    pub incident_month: String,
    pub incident_day: u8,
    pub opposing_party: String,
    pub evidence: String,
}

/// Per-visit state.
#[derive(Debug, Clone, Default)]
pub struct SmallClaimsSession {
    pub stage: Stage,
    pub fields: DetailsFields,
    pub details: Option<CaseDetails>,
    pub walkthrough: String,
    pub answered: Option<Answer>,
    pub error: Option<String>,
    pub walkthrough_in_flight: bool,
    pub question_in_flight: bool,
}

/// Check every field: selects against their closed sets, numerics parsed
/// and range-checked, free text non-empty.
pub fn validate_details(fields: &DetailsFields) -> Result<CaseDetails, &'static str> {
    const INCOMPLETE: &str = "Please enter all data.";

    if !STATES.contains(&fields.state.as_str())
        || !CASE_TYPES.contains(&fields.case_type.as_str())
        || !MONTHS.contains(&fields.incident_month.as_str())
    {
        return Err(INCOMPLETE);
    }

    let issue_description = fields.issue_description.trim();
    let opposing_party = fields.opposing_party.trim();
    let evidence = fields.evidence.trim();
    if issue_description.is_empty() || opposing_party.is_empty() || evidence.is_empty() {
        return Err(INCOMPLETE);
    }

    let claim_amount: u32 = match fields.claim_amount.trim().parse() {
        Ok(amount) if amount > 0 => amount,
        _ => return Err("Please enter the claim amount as a positive whole number of dollars."),
    };

    let incident_year: u16 = match fields.incident_year.trim().parse() {
        Ok(year) if (1900..=2100).contains(&year) => year,
        _ => return Err("Please enter a four-digit incident year."),
    };

    let incident_day: u8 = match fields.incident_day.trim().parse() {
        Ok(day) if (1..=31).contains(&day) => day,
        _ => return Err(INCOMPLETE),
    };

    Ok(CaseDetails {
        state: fields.state.clone(),
        case_type: fields.case_type.clone(),
        issue_description: issue_description.to_string(),
        claim_amount,
        incident_year,
        incident_month: fields.incident_month.clone(),
        incident_day,
        opposing_party: opposing_party.to_string(),
        evidence: evidence.to_string(),
    })
}

/// Prompt for the filing walkthrough.
pub fn walkthrough_prompt(d: &CaseDetails) -> String {
    format!(
        "Based on the user being located in {state} and filing a {case_type} small claims \
         case, please help generate appropriate documentation for their case.\n\n\
         Case details provided by user:\n\
         - Description of issue: {issue}\n\
         - Amount seeking: {amount}\n\
         - Date(s) of incident: {day} {month}, {year}\n\
         - Opposing party information: {opposing}\n\
         - Evidence available: {evidence}\n\n\
         Please provide:\n\
         1. A properly formatted draft complaint for {state} small claims court\n\
         2. A demand letter template that could be sent before filing\n\
         3. Instructions for completing any required forms specific to {state}\n\
         4. A checklist of what documentation to bring to court\n\
         5. Any jurisdiction-specific requirements or limitations for this type of case in {state}\n\n\
         Include appropriate legal language while keeping everything understandable to \
         someone without legal training.",
        state = d.state,
        case_type = d.case_type,
        issue = d.issue_description,
        amount = d.claim_amount,
        day = d.incident_day,
        month = d.incident_month,
        year = d.incident_year,
        opposing = d.opposing_party,
        evidence = d.evidence,
    )
}

/// Prompt for a follow-up question over the collected case details.
pub fn question_prompt(d: &CaseDetails, question: &str) -> String {
    format!(
        "You are a legal expert helping someone understand their small claims court options.\n\
         Given the following inputs:\n\
         - Type of case: {case_type}\n\
         - Date of incident: {day} {month}, {year}\n\
         - Opposing party information: {opposing}\n\
         - Evidence provided: {evidence}\n\
         - Claim amount: {amount}\n\
         - Issue description: {issue}\n\
         - User state: {state}\n\n\
         This person asked you this specific question: {question}\n\n\
         Use plain, helpful language.",
        case_type = d.case_type,
        day = d.incident_day,
        month = d.incident_month,
        year = d.incident_year,
        opposing = d.opposing_party,
        evidence = d.evidence,
        amount = d.claim_amount,
        issue = d.issue_description,
        state = d.state,
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/smallcourtclaims", get(show))
        .route("/smallcourtclaims/prepare", post(prepare))
        .route("/smallcourtclaims/ask", post(ask))
}

async fn show(State(state): State<AppState>) -> Html<String> {
    let id = state.small_claims.create(SmallClaimsSession::default()).await;
    render_page(id, &SmallClaimsSession::default())
}

#[derive(Deserialize)]
struct DetailsForm {
    session: Uuid,
    #[serde(default)]
    state: String,
    #[serde(default)]
    case_type: String,
    #[serde(default)]
    issue_description: String,
    #[serde(default)]
    claim_amount: String,
    #[serde(default)]
    incident_year: String,
    #[serde(default)]
    incident_month: String,
    #[serde(default)]
    incident_day: String,
    #[serde(default)]
    opposing_party: String,
    #[serde(default)]
    evidence: String,
}

impl DetailsForm {
    fn into_fields(self) -> DetailsFields {
        DetailsFields {
            state: self.state,
            case_type: self.case_type,
            issue_description: self.issue_description,
            claim_amount: self.claim_amount,
            incident_year: self.incident_year,
            incident_month: self.incident_month,
            incident_day: self.incident_day,
            opposing_party: self.opposing_party,
            evidence: self.evidence,
        }
    }
}

async fn prepare(State(state): State<AppState>, Form(form): Form<DetailsForm>) -> Html<String> {
    let session_id = form.session;
    let fields = form.into_fields();

    let prepared = state
        .small_claims
        .with(session_id, |s| {
            s.fields = fields.clone();
            match validate_details(&s.fields) {
                Err(message) => {
                    s.error = Some(message.to_string());
                    None
                }
                Ok(details) => {
                    if s.walkthrough_in_flight {
                        s.error = Some(BUSY_MESSAGE.to_string());
                        return None;
                    }
                    s.error = None;
                    s.walkthrough_in_flight = true;
                    let prompt = walkthrough_prompt(&details);
                    s.details = Some(details);
                    Some(prompt)
                }
            }
        })
        .await;

    let prompt = match prepared {
        None => return expired_page(&state).await,
        Some(None) => return render_session(&state, session_id).await,
        Some(Some(prompt)) => prompt,
    };

    let request =
        GenerateRequest::text(prompt, GenerationConfig::with_output_cap(MAX_OUTPUT_TOKENS));
    let outcome = classify(state.generator.generate(request).await);

    let updated = state
        .small_claims
        .with(session_id, |s| {
            s.walkthrough_in_flight = false;
            match outcome {
                CallOutcome::Text(text) => {
                    s.walkthrough = text;
                    s.stage = Stage::Walkthrough;
                    s.error = None;
                }
                CallOutcome::Failed(message) => s.error = Some(message),
            }
            render_page(session_id, s)
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
        .small_claims
        .with(form.session, |s| {
            let Some(details) = &s.details else {
                s.error = Some("Submit your case details before asking questions.".to_string());
                return None;
            };
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
            Some(question_prompt(details, &question))
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
        .small_claims
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
    match state.small_claims.with(id, |s| render_page(id, s)).await {
        Some(html) => html,
        None => expired_page(state).await,
    }
}

async fn expired_page(state: &AppState) -> Html<String> {
    let id = state.small_claims.create(SmallClaimsSession::default()).await;
    let session = SmallClaimsSession {
        error: Some(SESSION_EXPIRED.to_string()),
        ..SmallClaimsSession::default()
    };
    render_page(id, &session)
}

fn render_page(id: Uuid, s: &SmallClaimsSession) -> Html<String> {
    let mut body = format!("<h1>{TITLE}</h1>");
    if let Some(error) = &s.error {
        body.push_str(&error_box(error));
    }
    match s.stage {
        Stage::Details => body.push_str(&details_form(id, &s.fields)),
        Stage::Walkthrough => {
            let details = s.details.as_ref();
            let heading = match details {
                Some(d) => format!(
                    "State: {}<br>Case Type: {}<br>Process Walkthrough:",
                    escape_html(&d.state),
                    escape_html(&d.case_type)
                ),
                None => "Process Walkthrough:".to_string(),
            };
            body.push_str(&result_box(&heading, &s.walkthrough));
            if let Some(answer) = &s.answered {
                body.push_str(&result_box(
                    &format!("Question: {}<br>Answer:", escape_html(&answer.question)),
                    &answer.text,
                ));
            }
            body.push_str(&format!(
                "<p>Put specific questions below</p>\
                 <form method=\"post\" action=\"/smallcourtclaims/ask\">\
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

fn details_form(id: Uuid, f: &DetailsFields) -> String {
    let days: Vec<String> = (1..=31).map(|d| d.to_string()).collect();
    let day_options: Vec<&str> = days.iter().map(String::as_str).collect();
    format!(
        "<form method=\"post\" action=\"/smallcourtclaims/prepare\">\
         <input type=\"hidden\" name=\"session\" value=\"{id}\">\
         <div><label>Select Your State:</label> \
         <select name=\"state\">{states}</select></div>\
         <div><label>Type of Case:</label> \
         <select name=\"case_type\">{case_types}</select></div>\
         <h3>Give a general description of the case:</h3>\
         <textarea name=\"issue_description\" rows=\"5\" \
         placeholder=\"Give a general description of the case...\">{issue}</textarea>\
         <h3>Give the claim amount:</h3>\
         $USD<input name=\"claim_amount\" inputmode=\"numeric\" \
         placeholder=\"Give the claim amount...\" value=\"{amount}\">\
         <h3>Give info on opposing party:</h3>\
         <textarea name=\"opposing_party\" rows=\"5\" \
         placeholder=\"Opposing party info...\">{opposing}</textarea>\
         <h3>Give evidence of the case you want to use:</h3>\
         <textarea name=\"evidence\" rows=\"5\" placeholder=\"Evidence...\">{evidence}</textarea>\
         <h3>Give the incident date:</h3>\
         <input name=\"incident_year\" inputmode=\"numeric\" \
         placeholder=\"Give the incident year...\" value=\"{year}\">\
         <div><label>Give the incident month:</label> \
         <select name=\"incident_month\">{months}</select></div>\
         <div><label>Give the incident day:</label> \
         <select name=\"incident_day\">{days}</select></div>\
         <button type=\"submit\" class=\"submit\">Submit</button>\
         </form>",
        states = options_html("Select a State", &STATES, Some(f.state.as_str())),
        case_types = options_html("Select Case Type", &CASE_TYPES, Some(f.case_type.as_str())),
        issue = escape_html(&f.issue_description),
        amount = escape_html(&f.claim_amount),
        opposing = escape_html(&f.opposing_party),
        evidence = escape_html(&f.evidence),
        year = escape_html(&f.incident_year),
        months = options_html("Select Month", &MONTHS, Some(f.incident_month.as_str())),
        days = options_html("Select Day", &day_options, Some(f.incident_day.as_str())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_fields() -> DetailsFields {
        DetailsFields {
            state: "California".to_string(),
            case_type: "Breach of contract".to_string(),
            issue_description: "Contractor never finished the deck.".to_string(),
            claim_amount: "500".to_string(),
            incident_year: "2024".to_string(),
            incident_month: "March".to_string(),
            incident_day: "14".to_string(),
            opposing_party: "Acme Decks LLC, 1 Main St".to_string(),
            evidence: "Signed contract, photos, receipts".to_string(),
        }
    }

    #[test]
    fn complete_details_validate() {
        let details = validate_details(&complete_fields()).unwrap();
        assert_eq!(details.state, "California");
        assert_eq!(details.claim_amount, 500);
        assert_eq!(details.incident_day, 14);
    }

    #[test]
    fn missing_fields_are_rejected() {
        for strip in [
            |f: &mut DetailsFields| f.state.clear(),
            |f: &mut DetailsFields| f.case_type.clear(),
            |f: &mut DetailsFields| f.issue_description.clear(),
            |f: &mut DetailsFields| f.incident_month.clear(),
            |f: &mut DetailsFields| f.opposing_party.clear(),
            |f: &mut DetailsFields| f.evidence.clear(),
        ] {
            let mut fields = complete_fields();
            strip(&mut fields);
            assert!(validate_details(&fields).is_err());
        }
    }

    #[test]
    fn selects_must_come_from_their_option_sets() {
        let mut fields = complete_fields();
        fields.state = "Narnia".to_string();
        assert!(validate_details(&fields).is_err());

        let mut fields = complete_fields();
        fields.incident_month = "Smarch".to_string();
        assert!(validate_details(&fields).is_err());
    }

    #[test]
    fn claim_amount_must_be_positive_integer() {
        for bad in ["0", "-5", "12.50", "five hundred", ""] {
            let mut fields = complete_fields();
            fields.claim_amount = bad.to_string();
            assert!(validate_details(&fields).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn incident_day_bounds() {
        let mut fields = complete_fields();
        fields.incident_day = "31".to_string();
        assert!(validate_details(&fields).is_ok());
        fields.incident_day = "32".to_string();
        assert!(validate_details(&fields).is_err());
        fields.incident_day = "0".to_string();
        assert!(validate_details(&fields).is_err());
    }

    #[test]
    fn walkthrough_prompt_is_deterministic_and_complete() {
        let details = validate_details(&complete_fields()).unwrap();
        let prompt = walkthrough_prompt(&details);
        assert_eq!(prompt, walkthrough_prompt(&details));
        assert!(prompt.contains("California"));
        assert!(prompt.contains("Breach of contract"));
        assert!(prompt.contains("- Amount seeking: 500"));
        assert!(prompt.contains("14 March, 2024"));
        assert!(prompt.contains("draft complaint"));
        assert!(prompt.contains("demand letter"));
        assert!(prompt.contains("checklist"));
    }

    #[test]
    fn question_prompt_carries_details_and_question() {
        let details = validate_details(&complete_fields()).unwrap();
        let prompt = question_prompt(&details, "Can I recover filing fees?");
        assert!(prompt.contains("Can I recover filing fees?"));
        assert!(prompt.contains("- User state: California"));
        assert!(prompt.contains("- Claim amount: 500"));
        assert!(prompt.contains("plain, helpful language"));
    }

    #[test]
    fn details_page_shows_only_the_details_form() {
        let html = render_page(Uuid::new_v4(), &SmallClaimsSession::default()).0;
        assert!(html.contains("/smallcourtclaims/prepare"));
        assert!(!html.contains("/smallcourtclaims/ask"));
    }

    #[test]
    fn walkthrough_page_shows_result_and_question_form() {
        let session = SmallClaimsSession {
            stage: Stage::Walkthrough,
            details: validate_details(&complete_fields()).ok(),
            walkthrough: "# Filing steps".to_string(),
            ..SmallClaimsSession::default()
        };
        let html = render_page(Uuid::new_v4(), &session).0;
        assert!(html.contains("/smallcourtclaims/ask"));
        assert!(!html.contains("/smallcourtclaims/prepare"));
        assert!(html.contains("<h1>Filing steps</h1>"));
        assert!(html.contains("State: California"));
    }

    #[test]
    fn form_re_renders_submitted_values() {
        let session = SmallClaimsSession {
            fields: complete_fields(),
            error: Some("Please enter all data.".to_string()),
            ..SmallClaimsSession::default()
        };
        let html = render_page(Uuid::new_v4(), &session).0;
        assert!(html.contains("Contractor never finished the deck."));
        assert!(html.contains("<option value=\"California\" selected>"));
        assert!(html.contains("<option value=\"March\" selected>"));
    }
}
