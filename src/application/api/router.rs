use std::{io::Error, net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    body,
    header::{
        self, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE,
    },
    server::conn::http1,
    Method, Request, Response,
};
use hyper_util::{rt::TokioIo, service::TowerToHyperService};
use jsonwebtoken::{Algorithm, Validation};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::domain::{access::AccessDenied, person::PersonManager};

use super::{
    keycloak::get_keycloak_keys,
    person::person_router,
    session::{session_id_from_cookies, RequestContext, SessionStore},
    token::extract_token,
    view::{Reply, ViewRenderer},
};

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpError<'a> {
    code: u16,
    error: &'a str,
    details: &'a str,
}
impl<'a> HttpError<'a> {
    pub fn new(code: u16, error: &'a str, details: &'a str) -> Self {
        HttpError {
            code,
            error,
            details,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }
}

pub const INTERNAL_ERROR: HttpError = HttpError {
    code: 500,
    error: "InternalError",
    details: "An internal error occured, please contact our technical service",
};

pub const NOT_FOUND_ERROR: HttpError = HttpError {
    code: 404,
    error: "NotFound",
    details: "The requested resource is not found",
};

pub const ACCESS_DENIED_ERROR: HttpError = HttpError {
    code: 403,
    error: "AccessDenied",
    details: "You cannot access to this ressource",
};

pub const UNAUTHENTICATED_ERROR: HttpError = HttpError {
    code: 401,
    error: "Unauthenticated",
    details: "A bearer token is required to access this ressource",
};

impl From<AccessDenied> for HttpError<'static> {
    fn from(_: AccessDenied) -> Self {
        ACCESS_DENIED_ERROR
    }
}

pub enum APIError {
    ConfigurationError(String),
    RequestError(HttpError<'static>),
}

fn error_response(err: &HttpError<'static>) -> Response<BoxBody> {
    let body = serde_json::to_string(err).unwrap_or_default();
    let mut response = Response::new(full(body));
    *response.status_mut() =
        hyper::StatusCode::from_u16(err.code).unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Settings the request boundary needs to authenticate callers.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub bind_address: SocketAddr,
    pub keycloak_certs_url: String,
    pub token_audience: String,
    pub keys_cache_ttl: Duration,
    /// Origins allowed to send credentialed cross-origin requests.
    pub allowed_origins: Vec<HeaderValue>,
}

/// Raw request body, decoded on demand into the shape a handler expects.
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    content: Bytes,
    is_form: bool,
}

impl RequestBody {
    pub fn json(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            is_form: false,
        }
    }

    pub fn form(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            is_form: true,
        }
    }

    /// Decodes the body as `application/x-www-form-urlencoded` or JSON.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, HttpError<'static>> {
        let parsed = if self.is_form {
            serde_qs::from_bytes(&self.content).map_err(|e| e.to_string())
        } else {
            serde_json::from_slice(&self.content).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| {
            tracing::debug!("Cannot decode request body: {}", e);
            HttpError::new(
                400,
                "InvalidFormat",
                "The body format is invalid. Please refer to the documentation",
            )
        })
    }
}

#[derive(Clone)]
pub struct MainRouter {
    person_manager: PersonManager,
    session_store: SessionStore,
    renderer: Arc<dyn ViewRenderer>,
    config: RouterConfig,
}

impl MainRouter {
    pub fn new(
        person_manager: PersonManager,
        session_store: SessionStore,
        renderer: Arc<dyn ViewRenderer>,
        config: RouterConfig,
    ) -> Self {
        return Self {
            person_manager,
            session_store,
            renderer,
            config,
        };
    }

    pub async fn run(&self) -> Result<(), APIError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| APIError::ConfigurationError(e.to_string()))?;
        tracing::info!("Listening on {}", self.config.bind_address);
        loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| APIError::ConfigurationError(e.to_string()))?;

            let io = TokioIo::new(stream);

            let router = self.clone();
            tokio::task::spawn(async move {
                let cors = CorsLayer::new()
                    .allow_origin(AllowOrigin::list(router.config.allowed_origins.clone()))
                    .allow_credentials(true)
                    .allow_methods(vec![
                        Method::GET,
                        Method::POST,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers(vec![header::CONTENT_TYPE, AUTHORIZATION]);
                let service = ServiceBuilder::new().layer(cors).service_fn(|r| {
                    let router = router.clone();
                    async move {
                        let res = match router.route_requests(r).await {
                            Ok(r) => r,
                            Err(APIError::RequestError(e)) => error_response(&e),
                            Err(APIError::ConfigurationError(e)) => {
                                tracing::error!("A fatal error occured: {}", e);
                                error_response(&INTERNAL_ERROR)
                            }
                        };
                        Ok::<Response<BoxBody>, Error>(res)
                    }
                });
                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, TowerToHyperService::new(service))
                    .await
                {
                    tracing::warn!("Error serving connection: {:?}", err);
                }
            });
        }
    }

    async fn route_requests(
        &self,
        request: Request<body::Incoming>,
    ) -> Result<Response<BoxBody>, APIError> {
        let path = request.uri().path().to_string();
        let params = request.uri().query().unwrap_or_default().to_string();
        let method = request.method().clone();
        tracing::info!("Request {}:{}", method.as_str(), path);
        let headers = request.headers().clone();
        let content = request
            .collect()
            .await
            .map_err(|e| {
                tracing::error!("An internal error occured: {:?}", e);
                APIError::RequestError(INTERNAL_ERROR)
            })?
            .to_bytes();
        let body = if header_str(&headers, CONTENT_TYPE)
            .starts_with("application/x-www-form-urlencoded")
        {
            RequestBody::form(content)
        } else {
            RequestBody::json(content)
        };

        let keys = get_keycloak_keys(&self.config.keycloak_certs_url, self.config.keys_cache_ttl)
            .await
            .map_err(|e| {
                tracing::error!("An internal error occured: {}", e);
                APIError::RequestError(INTERNAL_ERROR)
            })?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.config.token_audience.as_str()]);
        let identity = extract_token(header_str(&headers, AUTHORIZATION), &keys, &validation)
            .and_then(|token| token.identity())
            .map_err(APIError::RequestError)?;

        let (session, created) = self
            .session_store
            .resolve(
                session_id_from_cookies(header_str(&headers, COOKIE)).as_deref(),
                &identity,
            )
            .await;
        let cookie = created.then(|| session.cookie());
        let context = RequestContext { identity, session };

        let mut response = match person_router::router(
            &path,
            &params,
            &method,
            &context,
            &body,
            &self.person_manager,
        )
        .await
        .and_then(|reply| into_response(reply, self.renderer.as_ref()))
        {
            Ok(response) => response,
            Err(e) => {
                tracing::info!("An error occured: {:?}", e);
                error_response(&e)
            }
        };
        if let Some(cookie) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Ok(response)
    }
}

pub fn into_response(
    reply: Reply,
    renderer: &dyn ViewRenderer,
) -> Result<Response<BoxBody>, HttpError<'static>> {
    let response = match reply {
        Reply::View(view) => Response::builder()
            .status(200)
            .header(CONTENT_TYPE, renderer.content_type())
            .body(full(renderer.render(&view)?)),
        Reply::Json(value) => Response::builder()
            .status(200)
            .header(CONTENT_TYPE, "application/json")
            .body(full(serde_json::to_string(&value).map_err(|e| {
                tracing::error!("Cannot serialize response: {}", e);
                INTERNAL_ERROR
            })?)),
        Reply::NoContent => Response::builder().status(204).body(full(Bytes::new())),
        Reply::Redirect(location) => Response::builder()
            .status(302)
            .header(LOCATION, location)
            .body(full(Bytes::new())),
    };
    response.map_err(|e| {
        tracing::error!("Cannot build response: {}", e);
        INTERNAL_ERROR
    })
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn header_str(headers: &hyper::HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
