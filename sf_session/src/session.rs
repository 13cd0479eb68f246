use crate::config::ConfigError;
use crate::config::rest_parameters::{LoginParameters, QueryParameters};
use crate::config::settings::Settings;
use crate::rest::snowflake::{RestError, snowflake_login, snowflake_logout, snowflake_query};
use snafu::{Location, OptionExt, ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("Failed to create runtime"))]
    Runtime {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Configuration error: {source}"))]
    Configuration {
        source: ConfigError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to login: {source}"))]
    Login {
        source: RestError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to execute query: {source}"))]
    Query {
        source: RestError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to close session: {source}"))]
    Logout {
        source: RestError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Session is already closed"))]
    Closed {
        #[snafu(implicit)]
        location: Location,
    },
}

/// Rows returned by a synchronous query, as the JSON rowset Snowflake sends back.
#[derive(Debug, Default, PartialEq)]
pub struct QueryResult {
    pub query_id: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Authenticated Snowflake session.
///
/// The session owns the runtime its requests run on, so every call blocks the
/// calling thread. The server-side session is deleted by [`Session::close`],
/// or on drop if it was never closed explicitly.
pub struct Session {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    query_parameters: QueryParameters,
    session_token: Option<String>,
    session_id: Option<i64>,
}

impl Session {
    #[tracing::instrument(skip(login_parameters), fields(account_name = %login_parameters.account_name))]
    pub fn login(login_parameters: LoginParameters) -> Result<Self, SessionError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context(RuntimeSnafu)?;
        let client = reqwest::Client::new();

        let login_response = runtime
            .block_on(snowflake_login(&client, &login_parameters))
            .context(LoginSnafu)?;

        Ok(Self {
            runtime,
            client,
            query_parameters: login_parameters.query_parameters(),
            session_token: Some(login_response.token),
            session_id: login_response.session_id,
        })
    }

    pub fn from_settings(settings: &dyn Settings) -> Result<Self, SessionError> {
        let login_parameters =
            LoginParameters::from_settings(settings).context(ConfigurationSnafu)?;
        Self::login(login_parameters)
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    pub fn server_url(&self) -> &str {
        &self.query_parameters.server_url
    }

    pub fn is_closed(&self) -> bool {
        self.session_token.is_none()
    }

    #[tracing::instrument(skip(self), fields(session_id = ?self.session_id))]
    pub fn execute(&self, sql: &str) -> Result<QueryResult, SessionError> {
        let session_token = self.session_token.as_deref().context(ClosedSnafu)?;
        let response = self
            .runtime
            .block_on(snowflake_query(
                &self.client,
                &self.query_parameters,
                session_token,
                sql,
            ))
            .context(QuerySnafu)?;

        let data = response.data.unwrap_or_default();
        Ok(QueryResult {
            query_id: data.query_id,
            columns: data
                .row_type
                .unwrap_or_default()
                .into_iter()
                .map(|row_type| row_type.name)
                .collect(),
            rows: data.rowset.unwrap_or_default(),
        })
    }

    pub fn close(mut self) -> Result<(), SessionError> {
        self.logout()
    }

    fn logout(&mut self) -> Result<(), SessionError> {
        let Some(session_token) = self.session_token.take() else {
            return Ok(());
        };
        tracing::debug!(session_id = ?self.session_id, "Closing Snowflake session");
        self.runtime
            .block_on(snowflake_logout(
                &self.client,
                &self.query_parameters,
                &session_token,
            ))
            .context(LogoutSnafu)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(error) = self.logout() {
            tracing::warn!(%error, "Failed to close Snowflake session on drop");
        }
    }
}
