// This file is part of the tf-provider-google project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::json;
use tf_provider_google::auth::{Credentials, StaticTokenSource};
use tf_provider_google::config::Config;
use tf_provider_google::error::TransportError;
use tf_provider_google::transport::{Backoff, Client, RequestOptions};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAST: Backoff = Backoff {
    initial: Duration::from_millis(1),
    max: Duration::from_millis(5),
};

fn client(config: Config) -> Client {
    let credentials = Credentials {
        source: Arc::new(StaticTokenSource::new("ya29.test")),
        kind: "access_token",
    };
    Client::new(&config, credentials, reqwest::Client::new()).with_backoff(FAST)
}

#[tokio::test]
async fn sends_authenticated_json_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/p/topics"))
        .and(query_param("alt", "json"))
        .and(header("authorization", "Bearer ya29.test"))
        .and(header("user-agent", "Terraform/1.7.0 test"))
        .and(header("x-goog-user-project", "billing-project"))
        .and(header("x-goog-request-reason", "ticket-42"))
        .and(body_json(json!({"name": "t"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "t", "id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(Config {
        user_agent: "Terraform/1.7.0 test".to_string(),
        billing_project: Some("billing-project".to_string()),
        user_project_override: true,
        request_reason: Some("ticket-42".to_string()),
        ..Default::default()
    });
    let url = format!("{}/v1/projects/p/topics", server.uri());
    let body = json!({"name": "t"});
    let response = client
        .send_request(RequestOptions::new(Method::POST, &url).body(&body))
        .await
        .unwrap();
    assert_eq!(response, json!({"name": "t", "id": 1}));
}

#[tokio::test]
async fn billing_project_needs_user_project_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-goog-user-project", "billing-project"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(Config {
        billing_project: Some("billing-project".to_string()),
        ..Default::default()
    });
    let url = format!("{}/v1/thing", server.uri());
    let response = client
        .send_request(RequestOptions::new(Method::GET, &url))
        .await
        .unwrap();
    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn retries_unavailable_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "DONE"})))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/v1/operations/op", server.uri());
    let response = client(Config::default())
        .send_request(RequestOptions::new(Method::GET, &url))
        .await
        .unwrap();
    assert_eq!(response["status"], "DONE");
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "The resource 'projects/p/zones/z/instances/i' was not found",
                "errors": [{"reason": "notFound", "message": "not found"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/compute/v1/projects/p/zones/z/instances/i", server.uri());
    let err = client(Config::default())
        .send_request(RequestOptions::new(Method::GET, &url))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("was not found"));
}

#[tokio::test]
async fn retry_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let url = format!("{}/v1/quota", server.uri());
    let err = client(Config::default())
        .send_request(RequestOptions::new(Method::GET, &url).timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();
    match err {
        TransportError::DeadlineExceeded(timeout, last) => {
            assert_eq!(timeout, Duration::from_millis(50));
            assert_eq!(last.api_error().map(|err| err.code), Some(429));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
