use std::str::FromStr;

use hyper::Method;
use serde::{Deserialize, Serialize};
use serde_json::{value, Value};

use crate::{
    application::api::{
        router::{HttpError, RequestBody, ACCESS_DENIED_ERROR, INTERNAL_ERROR, NOT_FOUND_ERROR},
        session::RequestContext,
        view::{Reply, View},
    },
    domain::person::{policy, Person, PersonId, PersonManager, PersonRepositoryError},
};

/// Anti-forgery token of a form submission, read before anything else in it.
#[derive(Deserialize)]
struct CsrfInput {
    csrftkn: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePersonInput {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    search_term: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersonOutput {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl From<Person> for PersonOutput {
    fn from(value: Person) -> Self {
        return Self {
            id: value.id().to_string(),
            first_name: value.first_name().clone(),
            last_name: value.last_name().clone(),
            email: value.email().clone(),
        };
    }
}

impl From<PersonRepositoryError> for HttpError<'static> {
    fn from(value: PersonRepositoryError) -> Self {
        match value {
            PersonRepositoryError::PersonNotFound => {
                HttpError::new(404, "PersonNotFound", "The person requested is not found")
            }
            PersonRepositoryError::InternalError(e) => {
                tracing::error!(
                    "An internal error occured while making an action on Persons: {}",
                    e
                );
                INTERNAL_ERROR
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<PersonId, HttpError<'static>> {
    PersonId::from_str(raw).map_err(|_| {
        HttpError::new(
            400,
            "InvalidId",
            "The person identifier you provided must be an integer",
        )
    })
}

fn to_value<T: Serialize>(output: T) -> Result<Value, HttpError<'static>> {
    value::to_value(output).map_err(|e| {
        tracing::error!(
            "An internal error occured while converting persons to value: {:?}",
            e
        );
        INTERNAL_ERROR
    })
}

pub async fn router(
    path: &str,
    query: &str,
    method: &Method,
    context: &RequestContext,
    body: &RequestBody,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (&Method::GET, ["persons"]) => list_persons(context, person_manager).await,
        (&Method::GET, ["persons", "search"]) => {
            search_persons(query, context, person_manager).await
        }
        (&Method::GET, ["persons", id]) => get_person(id, context, person_manager).await,
        (&Method::DELETE, ["persons", id]) => delete_person(id, context, person_manager).await,
        (&Method::GET, ["myprofile"]) => get_my_profile(context, person_manager).await,
        (&Method::POST, ["update-person"]) => update_person(body, context, person_manager).await,
        (_, _) => Err(NOT_FOUND_ERROR),
    }
}

async fn get_person(
    raw_id: &str,
    context: &RequestContext,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    let id = parse_id(raw_id)?;
    policy::view_person(id).evaluate(&context.identity)?;
    render_person(&id, context, person_manager).await
}

async fn get_my_profile(
    context: &RequestContext,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    policy::view_my_profile().evaluate(&context.identity)?;
    render_person(context.identity.id(), context, person_manager).await
}

async fn render_person(
    id: &PersonId,
    context: &RequestContext,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    let person: PersonOutput = person_manager.get_person_by_id(id).await?.into();
    Ok(Reply::View(
        View::new("person")
            .with("CSRF_TKN", Value::String(context.session.csrf_token().clone()))
            .with("person", to_value(person)?),
    ))
}

async fn delete_person(
    raw_id: &str,
    context: &RequestContext,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    let id = parse_id(raw_id)?;
    let identity = &context.identity;
    if let Err(denied) = policy::delete_person(id).evaluate(identity) {
        tracing::error!(
            target: "audit",
            user_id = %identity.id(),
            "User {} doesn't have permission to delete person!",
            identity.id()
        );
        return Err(denied.into());
    }
    person_manager.delete_person(&id).await?;
    tracing::info!(target: "audit", user_id = %identity.id(), person_id = %id, "Person deleted");
    Ok(Reply::NoContent)
}

async fn update_person(
    body: &RequestBody,
    context: &RequestContext,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    let identity = &context.identity;
    let csrf: CsrfInput = body.parse()?;
    if !context.session.verify_csrf_token(&csrf.csrftkn) {
        tracing::warn!(target: "audit", user_id = %identity.id(), "Invalid CSRF token on person update");
        return Err(ACCESS_DENIED_ERROR);
    }
    let input: UpdatePersonInput = body.parse()?;
    let id = parse_id(&input.id)?;
    if let Err(denied) = policy::update_person(id).evaluate(identity) {
        tracing::error!(
            target: "audit",
            user_id = %identity.id(),
            "User {} doesn't have permission to update person details!",
            identity.id()
        );
        return Err(denied.into());
    }
    person_manager
        .update_person(Person::new(
            id,
            &input.first_name,
            &input.last_name,
            &input.email,
        ))
        .await?;
    tracing::info!(target: "audit", user_id = %identity.id(), person_id = %id, "Person updated");
    Ok(Reply::Redirect(format!("/persons/{}", id)))
}

async fn list_persons(
    context: &RequestContext,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    policy::list_persons().evaluate(&context.identity)?;
    let persons: Vec<PersonOutput> = person_manager
        .get_persons()
        .await?
        .into_iter()
        .map(PersonOutput::from)
        .collect();
    Ok(Reply::View(View::new("persons").with("persons", to_value(persons)?)))
}

async fn search_persons(
    query: &str,
    context: &RequestContext,
    person_manager: &PersonManager,
) -> Result<Reply, HttpError<'static>> {
    policy::search_persons().evaluate(&context.identity)?;
    let search_term = serde_qs::from_str::<SearchQuery>(query)
        .ok()
        .and_then(|query| query.search_term)
        .ok_or(HttpError::new(
            400,
            "MissingSearchTerm",
            "The searchTerm query parameter is required",
        ))?;
    let persons: Vec<PersonOutput> = person_manager
        .search_persons(&search_term)
        .await?
        .into_iter()
        .map(PersonOutput::from)
        .collect();
    Ok(Reply::Json(to_value(persons)?))
}
