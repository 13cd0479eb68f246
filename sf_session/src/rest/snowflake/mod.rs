pub mod auth;
pub mod query_request;
pub mod query_response;

use crate::config::rest_parameters::{ClientInfo, LoginParameters, QueryParameters};
use crate::rest::snowflake::auth::{
    AuthRequest, AuthRequestClientEnvironment, AuthRequestData, AuthResponse, SessionResponse,
};
use snafu::{Location, ResultExt, Snafu};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const LOGIN_PATH: &str = "/session/v1/login-request";
pub const QUERY_PATH: &str = "/queries/v1/query-request";
pub const SESSION_PATH: &str = "/session";

pub const QUERY_IN_PROGRESS_CODE: &str = "333333";
pub const QUERY_IN_PROGRESS_ASYNC_CODE: &str = "333334";

const INLINE_SHORT_POLL_DELAYS: &[Duration] = &[
    Duration::from_millis(5),
    Duration::from_millis(10),
    Duration::from_millis(20),
    Duration::from_millis(40),
];
const POLL_BACKOFF_BASE: Duration = Duration::from_millis(100);
const POLL_BACKOFF_CAP: Duration = Duration::from_secs(5);

pub fn user_agent(client_info: &ClientInfo) -> String {
    format!(
        "{}/{} ({}; {})",
        client_info.application, client_info.version, client_info.os, client_info.os_version
    )
}

fn authorization(session_token: &str) -> String {
    format!("Snowflake Token=\"{session_token}\"")
}

pub fn auth_request_data(login_parameters: &LoginParameters) -> AuthRequestData {
    let client_info = &login_parameters.client_info;
    AuthRequestData {
        client_app_id: client_info.application.clone(),
        client_app_version: client_info.version.clone(),
        account_name: login_parameters.account_name.clone(),
        login_name: login_parameters.username.clone(),
        password: login_parameters.password.clone(),
        authenticator: "SNOWFLAKE".to_string(),
        client_environment: AuthRequestClientEnvironment {
            application: client_info.application.clone(),
            os: client_info.os.clone(),
            os_version: client_info.os_version.clone(),
            ocsp_mode: client_info.ocsp_mode.clone(),
        },
    }
}

/// Tokens issued by a successful login.
#[derive(Debug)]
pub struct LoginResponse {
    pub token: String,
    pub master_token: Option<String>,
    pub session_id: Option<i64>,
}

#[tracing::instrument(skip(client, login_parameters), fields(account_name, login_name))]
pub async fn snowflake_login(
    client: &reqwest::Client,
    login_parameters: &LoginParameters,
) -> Result<LoginResponse, RestError> {
    tracing::info!("Starting Snowflake login process");

    tracing::Span::current().record("account_name", &login_parameters.account_name);
    tracing::Span::current().record("login_name", &login_parameters.username);

    tracing::debug!(
        server_url = %login_parameters.server_url,
        database = ?login_parameters.database,
        schema = ?login_parameters.schema,
        warehouse = ?login_parameters.warehouse,
        role = ?login_parameters.role,
        "Extracted connection settings"
    );

    let login_request = AuthRequest {
        data: auth_request_data(login_parameters),
    };
    let login_url = format!("{}{LOGIN_PATH}", login_parameters.server_url);

    tracing::info!(login_url = %login_url, "Making Snowflake login request");
    let request = client
        .post(&login_url)
        .query(&[
            (
                "databaseName",
                login_parameters.database.as_deref().unwrap_or_default(),
            ),
            (
                "schemaName",
                login_parameters.schema.as_deref().unwrap_or_default(),
            ),
            (
                "warehouse",
                login_parameters.warehouse.as_deref().unwrap_or_default(),
            ),
            (
                "roleName",
                login_parameters.role.as_deref().unwrap_or_default(),
            ),
        ])
        .query(&[("request_id", uuid::Uuid::new_v4().to_string())])
        .json(&login_request)
        .header("Accept", "application/json")
        .header("User-Agent", user_agent(&login_parameters.client_info))
        .header("Authorization", "Snowflake Token=\"None\"")
        .build()
        .context(RequestConstructionSnafu { request: "login" })?;
    let response = client.execute(request).await.context(CommunicationSnafu {
        context: "Failed to execute login request",
    })?;

    let auth_response = read_response_json::<AuthResponse>(response)
        .await
        .context(InvalidSnowflakeResponseSnafu)?;

    if !auth_response.success {
        let message = auth_response
            .message
            .unwrap_or_else(|| "Unknown error".to_string());
        tracing::error!(message = %message, code = ?auth_response.code, "Snowflake login failed");
        return RequestFailedSnafu {
            code: auth_response.code,
            message,
        }
        .fail()
        .context(InvalidSnowflakeResponseSnafu);
    }

    let data = auth_response.data.unwrap_or_default();
    match data.token {
        Some(token) => {
            tracing::info!(
                session_id = ?data.session_id,
                server_version = ?data.server_version,
                "Snowflake login completed successfully"
            );
            Ok(LoginResponse {
                token,
                master_token: data.master_token,
                session_id: data.session_id,
            })
        }
        None => {
            tracing::error!("Login response missing token data");
            InvalidResponseSnafu {
                message: "Login response missing token".to_string(),
            }
            .fail()
            .context(InvalidSnowflakeResponseSnafu)
        }
    }
}

#[tracing::instrument(skip(client, query_parameters, session_token))]
pub async fn snowflake_query(
    client: &reqwest::Client,
    query_parameters: &QueryParameters,
    session_token: &str,
    sql: &str,
) -> Result<query_response::Response, RestError> {
    let query_url = format!("{}{QUERY_PATH}", query_parameters.server_url);

    let query_request = query_request::Request {
        sql_text: sql.to_string(),
        async_exec: false,
        sequence_id: 1,
        query_submission_time: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default(),
        is_internal: false,
        query_context: query_request::QueryContext { entries: None },
    };

    let request = client
        .post(&query_url)
        .header("Authorization", authorization(session_token))
        .header("Accept", "application/json")
        .header("User-Agent", user_agent(&query_parameters.client_info))
        .query(&[
            ("requestId", uuid::Uuid::new_v4().to_string()),
            ("request_guid", uuid::Uuid::new_v4().to_string()),
        ])
        .json(&query_request)
        .build()
        .context(RequestConstructionSnafu { request: "query" })?;

    tracing::debug!(url = %request.url(), "Sending query request");

    let response = client.execute(request).await.context(CommunicationSnafu {
        context: "Failed to execute query request",
    })?;

    let mut query_response = read_response_json::<query_response::Response>(response)
        .await
        .context(InvalidSnowflakeResponseSnafu)?;
    query_response = check_query_response(query_response)?;

    if query_in_progress(&query_response) {
        query_response = wait_for_completion(
            client,
            query_parameters,
            session_token,
            &query_response,
        )
        .await?;
    }

    tracing::debug!(
        query_id = ?query_response.data.as_ref().and_then(|data| data.query_id.as_deref()),
        "Query completed"
    );
    Ok(query_response)
}

/// Returns true while Snowflake is still executing the statement and the
/// result has to be fetched from `getResultUrl`.
pub fn query_in_progress(response: &query_response::Response) -> bool {
    matches!(
        response.code.as_deref(),
        Some(QUERY_IN_PROGRESS_CODE | QUERY_IN_PROGRESS_ASYNC_CODE)
    )
}

fn check_query_response(
    response: query_response::Response,
) -> Result<query_response::Response, RestError> {
    if response.success {
        return Ok(response);
    }
    let message = response
        .message
        .unwrap_or_else(|| "Unknown error".to_string());
    tracing::error!(message = %message, code = ?response.code, "Snowflake query failed");
    RequestFailedSnafu {
        code: response.code,
        message,
    }
    .fail()
    .context(InvalidSnowflakeResponseSnafu)
}

fn result_url(server_url: &str, get_result_url: &str) -> String {
    if get_result_url.starts_with("http://") || get_result_url.starts_with("https://") {
        get_result_url.to_string()
    } else {
        format!("{server_url}{get_result_url}")
    }
}

fn next_poll_delay(attempt: usize, previous: Duration) -> Duration {
    match INLINE_SHORT_POLL_DELAYS.get(attempt) {
        Some(delay) => *delay,
        None => (previous * 2).clamp(POLL_BACKOFF_BASE, POLL_BACKOFF_CAP),
    }
}

/// Polls the statement's result URL until Snowflake reports a final outcome:
/// a short burst of quick polls, then exponential backoff.
async fn wait_for_completion(
    client: &reqwest::Client,
    query_parameters: &QueryParameters,
    session_token: &str,
    in_progress: &query_response::Response,
) -> Result<query_response::Response, RestError> {
    let get_result_url = in_progress
        .data
        .as_ref()
        .and_then(|data| data.get_result_url.as_deref());
    let Some(get_result_url) = get_result_url else {
        return MissingResultUrlSnafu
            .fail()
            .context(InvalidSnowflakeResponseSnafu);
    };
    let url = result_url(&query_parameters.server_url, get_result_url);
    tracing::info!(result_url = %url, code = ?in_progress.code, "Query still running, polling for result");

    let mut attempt: usize = 0;
    let mut delay = Duration::ZERO;
    loop {
        delay = next_poll_delay(attempt, delay);
        attempt += 1;
        tokio::time::sleep(delay).await;

        let request = client
            .get(&url)
            .header("Authorization", authorization(session_token))
            .header("Accept", "application/json")
            .header("User-Agent", user_agent(&query_parameters.client_info))
            .build()
            .context(RequestConstructionSnafu {
                request: "query result",
            })?;
        let response = client.execute(request).await.context(CommunicationSnafu {
            context: "Failed to poll query result",
        })?;
        let polled = read_response_json::<query_response::Response>(response)
            .await
            .context(InvalidSnowflakeResponseSnafu)?;
        let polled = check_query_response(polled)?;

        if !query_in_progress(&polled) {
            tracing::debug!(attempts = attempt, "Query finished");
            return Ok(polled);
        }
        tracing::trace!(attempt, delay_ms = delay.as_millis() as u64, "Query still running");
    }
}

/// Deletes the server-side session tied to `session_token`.
#[tracing::instrument(skip(client, query_parameters, session_token))]
pub async fn snowflake_logout(
    client: &reqwest::Client,
    query_parameters: &QueryParameters,
    session_token: &str,
) -> Result<(), RestError> {
    let logout_url = format!("{}{SESSION_PATH}", query_parameters.server_url);

    let request = client
        .post(&logout_url)
        .header("Authorization", authorization(session_token))
        .header("Accept", "application/json")
        .header("User-Agent", user_agent(&query_parameters.client_info))
        .query(&[
            ("delete", "true".to_string()),
            ("request_id", uuid::Uuid::new_v4().to_string()),
        ])
        .build()
        .context(RequestConstructionSnafu { request: "logout" })?;

    let response = client.execute(request).await.context(CommunicationSnafu {
        context: "Failed to execute logout request",
    })?;

    let session_response = read_response_json::<SessionResponse>(response)
        .await
        .context(InvalidSnowflakeResponseSnafu)?;

    if !session_response.success {
        return RequestFailedSnafu {
            code: session_response.code,
            message: session_response
                .message
                .unwrap_or_else(|| "Unknown error".to_string()),
        }
        .fail()
        .context(InvalidSnowflakeResponseSnafu);
    }

    tracing::info!("Snowflake session closed");
    Ok(())
}

async fn read_response_json<T>(response: reqwest::Response) -> Result<T, SnowflakeResponseError>
where
    T: serde::de::DeserializeOwned,
{
    let response_status = response.status();
    let response_text = response.text().await;

    if !response_status.is_success() {
        return ResponseStatusSnafu {
            status: response_status,
            message: response_text.unwrap_or("Unknown error".to_string()),
        }
        .fail();
    }

    let response_text = response_text.context(ResponseTextSnafu)?;

    let response_data: T = serde_json::from_str(&response_text).context(ResponseFormatSnafu)?;

    Ok(response_data)
}

#[derive(Debug, Snafu)]
pub enum RestError {
    #[snafu(display("Invalid Snowflake response: {source}"))]
    InvalidSnowflakeResponse {
        source: SnowflakeResponseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to communicate with Snowflake: {context}"))]
    Communication {
        context: String,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to build request: {request}"))]
    RequestConstruction {
        request: String,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Snafu)]
pub enum SnowflakeResponseError {
    #[snafu(display("Failed to parse Snowflake response"))]
    ResponseFormat {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to read Snowflake response text"))]
    ResponseText {
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Snowflake responded with error status: {status}, message: {message}"))]
    ResponseStatus {
        status: reqwest::StatusCode,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Snowflake error {}: {message}", code.as_deref().unwrap_or("unknown")))]
    RequestFailed {
        code: Option<String>,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Query is still running but the response has no result URL"))]
    MissingResultUrl {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("{message}"))]
    InvalidResponse {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}
