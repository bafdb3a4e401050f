use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use sl_config::shared::{ClientConfig, TimeoutBudget};
use tracing::debug;

use crate::{bail, sl_error};
use crate::error::{ErrorKind, SlError, SlResult};
use crate::transport::{
    BlockingMetadataTransport, GraphQLRequest, MetadataSession, MetadataTransport,
};

const USER_AGENT: &str = concat!("sl-client/", env!("CARGO_PKG_VERSION"));

/// Message the metadata endpoint answers with when the token is rejected.
const UNAUTHORIZED_MESSAGE: &str = "User is not authorized";

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQLErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorMessage {
    message: String,
}

fn default_headers(auth_token: &SecretString) -> SlResult<HeaderMap> {
    let mut authorization =
        HeaderValue::from_str(&format!("Bearer {}", auth_token.expose_secret())).map_err(|err| {
            sl_error!(
                ErrorKind::ConfigError,
                "Auth token is not a valid header value",
                source: err
            )
        })?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);

    Ok(headers)
}

/// Maps a request failure, attaching the budget that was exceeded when it timed out.
fn map_request_error(err: reqwest::Error, timeout: &TimeoutBudget) -> SlError {
    let exceeded = if err.is_connect() {
        timeout.connect()
    } else {
        timeout.execute()
    };
    let is_timeout = err.is_timeout();

    let error = SlError::from(err);
    if is_timeout {
        error.with_timeout(exceeded)
    } else {
        error
    }
}

fn decode_response(response: GraphQLResponse) -> SlResult<Value> {
    if let Some(first) = response.errors.first() {
        let messages = response
            .errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if first.message == UNAUTHORIZED_MESSAGE {
            bail!(
                ErrorKind::Auth,
                "Semantic layer rejected the credentials",
                messages
            );
        }

        bail!(
            ErrorKind::Transport,
            "Metadata request returned errors",
            messages
        );
    }

    match response.data {
        Some(data) => Ok(data),
        None => bail!(
            ErrorKind::DeserializationError,
            "Metadata response carries neither data nor errors"
        ),
    }
}

/// Metadata transport over HTTP, for use with the non-blocking client.
#[derive(Debug, Clone)]
pub struct HttpGraphQLTransport {
    client: reqwest::Client,
    url: String,
    timeout: TimeoutBudget,
}

impl HttpGraphQLTransport {
    pub fn new(config: &ClientConfig) -> SlResult<Self> {
        let timeout = config.timeout;
        let client = reqwest::Client::builder()
            .default_headers(default_headers(&config.auth_token)?)
            .user_agent(USER_AGENT)
            .connect_timeout(timeout.connect())
            .timeout(timeout.execute())
            .build()?;

        Ok(Self {
            client,
            url: config.graphql_url(),
            timeout,
        })
    }
}

impl MetadataTransport for HttpGraphQLTransport {
    type Session = HttpGraphQLSession;

    async fn open(&self) -> SlResult<HttpGraphQLSession> {
        debug!(url = %self.url, "opening metadata session");

        Ok(HttpGraphQLSession {
            client: self.client.clone(),
            url: self.url.clone(),
            timeout: self.timeout,
        })
    }
}

/// Session of an [`HttpGraphQLTransport`].
///
/// Requests of one session share the transport's connection pool.
#[derive(Debug, Clone)]
pub struct HttpGraphQLSession {
    client: reqwest::Client,
    url: String,
    timeout: TimeoutBudget,
}

impl MetadataSession for HttpGraphQLSession {
    async fn execute(&self, request: &GraphQLRequest) -> SlResult<Value> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| map_request_error(err, &self.timeout))?;

        let body: GraphQLResponse = response
            .json()
            .await
            .map_err(|err| map_request_error(err, &self.timeout))?;

        decode_response(body)
    }

    async fn close(self) -> SlResult<()> {
        debug!(url = %self.url, "closing metadata session");
        Ok(())
    }
}

/// Metadata transport over HTTP that blocks the calling thread.
///
/// Meant for the blocking client. It must not be created or dropped inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct BlockingHttpGraphQLTransport {
    client: reqwest::blocking::Client,
    url: String,
    timeout: TimeoutBudget,
}

impl BlockingHttpGraphQLTransport {
    pub fn new(config: &ClientConfig) -> SlResult<Self> {
        let timeout = config.timeout;
        let client = reqwest::blocking::Client::builder()
            .default_headers(default_headers(&config.auth_token)?)
            .user_agent(USER_AGENT)
            .connect_timeout(timeout.connect())
            .timeout(timeout.execute())
            .build()?;

        Ok(Self {
            client,
            url: config.graphql_url(),
            timeout,
        })
    }
}

impl MetadataTransport for BlockingHttpGraphQLTransport {
    type Session = BlockingHttpGraphQLSession;

    async fn open(&self) -> SlResult<BlockingHttpGraphQLSession> {
        debug!(url = %self.url, "opening blocking metadata session");

        Ok(BlockingHttpGraphQLSession {
            client: self.client.clone(),
            url: self.url.clone(),
            timeout: self.timeout,
        })
    }
}

impl BlockingMetadataTransport for BlockingHttpGraphQLTransport {}

/// Session of a [`BlockingHttpGraphQLTransport`].
#[derive(Debug, Clone)]
pub struct BlockingHttpGraphQLSession {
    client: reqwest::blocking::Client,
    url: String,
    timeout: TimeoutBudget,
}

impl MetadataSession for BlockingHttpGraphQLSession {
    async fn execute(&self, request: &GraphQLRequest) -> SlResult<Value> {
        let body: GraphQLResponse = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::json)
            .map_err(|err| map_request_error(err, &self.timeout))?;

        decode_response(body)
    }

    async fn close(self) -> SlResult<()> {
        debug!(url = %self.url, "closing blocking metadata session");
        Ok(())
    }
}
