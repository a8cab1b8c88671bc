#![allow(dead_code)]

use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_KEY: &str = include_str!("../fixtures/test_key.pem");
pub const CLIENT_EMAIL: &str = "agent@porygon-pipelines.iam.gserviceaccount.com";
pub const ACCESS_TOKEN: &str = "ya29.test-token";

/// Service-account key JSON whose token endpoint is `token_uri`.
pub fn key_json(token_uri: &str) -> String {
    json!({
        "type": "service_account",
        "project_id": "porygon-pipelines",
        "private_key_id": "kid-1",
        "private_key": TEST_KEY,
        "client_email": CLIENT_EMAIL,
        "client_id": "1234",
        "token_uri": token_uri
    })
    .to_string()
}

pub fn write_key_file(token_uri: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(key_json(token_uri).as_bytes()).unwrap();
    file
}

/// Mount a token endpoint at `/token` that accepts JWT-bearer grants.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}
