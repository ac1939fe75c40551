use httpmock::prelude::*;
use inventory_bot::data::Cell;
use inventory_bot::error::InventoryError;
use inventory_bot::sheets::{Credentials, SheetsClient};
use inventory_bot::source::TabularSource;

#[test]
fn fetch_reads_values_with_bearer_token() {
    let server = MockServer::start();
    let values = server.mock(|when, then| {
        when.method(GET)
            .path_includes("/v4/spreadsheets/sheet-1/values/")
            .header("authorization", "Bearer static-token");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "range": "DALONG!A1:Z1000",
                "majorDimension": "ROWS",
                "values": [
                    ["Username", "Soni"],
                    ["alice", 12],
                    ["bob"]
                ]
            }));
    });

    let client =
        SheetsClient::with_access_token(&server.base_url(), "static-token").expect("client");
    let table = client.fetch("sheet-1", "DALONG!A1:Z1000").expect("fetch");

    values.assert();
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[1], vec![Cell::from("alice"), Cell::Integer(12)]);
    assert_eq!(table.rows[2].len(), 1);
}

#[test]
fn empty_range_is_an_empty_table() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_includes("/values/");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "range": "DALONG!A1:Z1000",
                "majorDimension": "ROWS"
            }));
    });

    let client = SheetsClient::with_access_token(&server.base_url(), "tok").expect("client");
    let table = client.fetch("sheet-1", "DALONG!A1:Z1000").expect("fetch");
    assert!(table.is_empty());
}

#[test]
fn http_failure_is_a_fetch_error_without_retry() {
    let server = MockServer::start();
    let denied = server.mock(|when, then| {
        when.method(GET).path_includes("/values/");
        then.status(403)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "error": { "message": "caller does not have permission" }
            }));
    });

    let client = SheetsClient::with_access_token(&server.base_url(), "tok").expect("client");
    let err = client.fetch("sheet-1", "DALONG!A1:Z1000").expect_err("forbidden");

    denied.assert_calls(1);
    match err {
        InventoryError::Fetch(message) => {
            assert!(message.contains("403"), "{message}");
            assert!(message.contains("caller does not have permission"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn authorized_user_token_is_refreshed_once_and_reused() {
    let server = MockServer::start();
    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .body_includes("grant_type=refresh_token")
            .body_includes("refresh_token=refresh-1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({ "access_token": "fresh-token", "expires_in": 3599 }));
    });
    let values = server.mock(|when, then| {
        when.method(GET)
            .path_includes("/values/")
            .header("authorization", "Bearer fresh-token");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({ "values": [["Username"], ["alice"]] }));
    });

    let credentials: Credentials = serde_json::from_value(serde_json::json!({
        "type": "authorized_user",
        "client_id": "client-1",
        "client_secret": "secret-1",
        "refresh_token": "refresh-1",
        "token_uri": server.url("/token"),
    }))
    .expect("credentials");
    let client = SheetsClient::from_credentials(&server.base_url(), credentials).expect("client");

    client.fetch("sheet-1", "DALONG!A1:Z1000").expect("first fetch");
    client.fetch("sheet-1", "DALONG!A1:Z1000").expect("second fetch");

    token.assert_calls(1);
    values.assert_calls(2);
}

#[test]
fn rejected_token_request_is_a_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(400)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({ "error": "invalid_grant" }));
    });

    let credentials: Credentials = serde_json::from_value(serde_json::json!({
        "type": "authorized_user",
        "client_id": "client-1",
        "client_secret": "secret-1",
        "refresh_token": "revoked",
        "token_uri": server.url("/token"),
    }))
    .expect("credentials");
    let client = SheetsClient::from_credentials(&server.base_url(), credentials).expect("client");
    let err = client.fetch("sheet-1", "DALONG!A1:Z1000").expect_err("bad grant");
    assert!(err.to_string().contains("invalid_grant"), "{err}");
}
