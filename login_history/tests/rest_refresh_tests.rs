mod common;

use common::*;
use login_history::parameters::DEFAULT_SECTION;
use login_history::warehouse::{RestSessionBuilder, WarehouseError};
use login_history::{BuildError, RefreshStatus, build_connection_from_file, refresh_login_history};
use sf_session::rest::snowflake::{LOGIN_PATH, QUERY_PATH, SESSION_PATH};
use sf_session::test_utils::{
    StubResponse, StubServer, default_snowflake_response, query_in_progress_response,
    query_success_response, setup_logging,
};

const RESULT_PATH: &str = "/queries/q-1/result";

#[test]
fn refresh_issues_create_or_replace_and_closes_session() {
    setup_logging();
    let server = StubServer::snowflake();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, VALID_CONFIG);
    let builder = RestSessionBuilder::new().with_server_url(server.url());

    let session = build_connection_from_file(&builder, &path, DEFAULT_SECTION).unwrap();
    let status = refresh_login_history(&session, true).unwrap();
    session.close().unwrap();

    assert_eq!(status, RefreshStatus::Refreshed);
    let login = &server.requests_to(LOGIN_PATH)[0];
    assert_eq!(login.json()["data"]["ACCOUNT_NAME"], "myorg-acct");
    assert_eq!(login.json()["data"]["LOGIN_NAME"], "alice");
    assert_eq!(login.json()["data"]["PASSWORD"], "hunter2");
    assert_eq!(login.query_param("roleName").as_deref(), Some("ACCOUNTADMIN"));

    let queries = server.requests_to(QUERY_PATH);
    assert_eq!(queries.len(), 1);
    assert_eq!(
        queries[0].json()["sqlText"],
        "CREATE OR REPLACE TABLE loginhistory AS SELECT * FROM SNOWFLAKE.ACCOUNT_USAGE.LOGIN_HISTORY"
    );
    assert_eq!(server.requests_to(SESSION_PATH).len(), 1);
}

#[test]
fn skipped_refresh_sends_no_query() {
    let server = StubServer::snowflake();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, VALID_CONFIG);
    let builder = RestSessionBuilder::new().with_server_url(server.url());

    let session = build_connection_from_file(&builder, &path, DEFAULT_SECTION).unwrap();
    let status = refresh_login_history(&session, false).unwrap();
    drop(session);

    assert_eq!(status, RefreshStatus::Skipped);
    assert!(server.requests_to(QUERY_PATH).is_empty());
    assert_eq!(server.requests_to(SESSION_PATH).len(), 1);
}

#[test]
fn missing_user_never_reaches_the_server() {
    let server = StubServer::snowflake();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, &config_without("SNOWFLAKE_USER"));
    let builder = RestSessionBuilder::new().with_server_url(server.url());

    let result = build_connection_from_file(&builder, &path, DEFAULT_SECTION);

    assert!(matches!(result, Err(BuildError::Parameters { .. })));
    assert!(server.requests().is_empty());
}

#[test]
fn missing_source_table_fails_the_refresh() {
    let server = StubServer::start(|request| {
        if request.path() == QUERY_PATH {
            StubResponse::ok(serde_json::json!({
                "data": {"queryId": "q-1", "sqlState": "42S02"},
                "message": "Object 'SNOWFLAKE.ACCOUNT_USAGE.LOGIN_HISTORY' does not exist or not authorized.",
                "code": "002003",
                "success": false
            }))
        } else {
            default_snowflake_response(request)
        }
    });
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, VALID_CONFIG);
    let builder = RestSessionBuilder::new().with_server_url(server.url());

    let session = build_connection_from_file(&builder, &path, DEFAULT_SECTION).unwrap();
    let error = refresh_login_history(&session, true).unwrap_err();
    drop(session);

    assert!(matches!(error, WarehouseError::Session { .. }));
    assert!(error.to_string().contains("does not exist"));
    assert_eq!(server.requests_to(SESSION_PATH).len(), 1);
}

#[test]
fn long_running_refresh_waits_for_the_result_before_closing() {
    let server = StubServer::start(|request| match request.path() {
        QUERY_PATH => query_in_progress_response("q-1", RESULT_PATH),
        RESULT_PATH => query_success_response(),
        _ => default_snowflake_response(request),
    });
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, VALID_CONFIG);
    let builder = RestSessionBuilder::new().with_server_url(server.url());

    let session = build_connection_from_file(&builder, &path, DEFAULT_SECTION).unwrap();
    let status = refresh_login_history(&session, true).unwrap();
    session.close().unwrap();

    assert_eq!(status, RefreshStatus::Refreshed);
    let paths: Vec<String> = server
        .requests()
        .iter()
        .map(|request| request.path().to_string())
        .collect();
    assert_eq!(paths, [LOGIN_PATH, QUERY_PATH, RESULT_PATH, SESSION_PATH]);
}

#[test]
fn long_running_refresh_that_fails_reports_no_status() {
    let server = StubServer::start(|request| match request.path() {
        QUERY_PATH => query_in_progress_response("q-1", RESULT_PATH),
        RESULT_PATH => StubResponse::ok(serde_json::json!({
            "data": {"queryId": "q-1"},
            "message": "Statement reached its statement or warehouse timeout of 3,600 second(s) and was canceled.",
            "code": "000630",
            "success": false
        })),
        _ => default_snowflake_response(request),
    });
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, VALID_CONFIG);
    let builder = RestSessionBuilder::new().with_server_url(server.url());

    let session = build_connection_from_file(&builder, &path, DEFAULT_SECTION).unwrap();
    let error = refresh_login_history(&session, true).unwrap_err();
    drop(session);

    assert!(matches!(error, WarehouseError::Session { .. }));
    assert!(error.to_string().contains("000630"));
    assert_eq!(server.requests_to(RESULT_PATH).len(), 1);
    assert_eq!(server.requests_to(SESSION_PATH).len(), 1);
}
