//! Shared harness for the integration tests: a server on a random port
//! backed by the in-memory stores.

#![allow(dead_code)]

use std::net::TcpListener;

use chirpy::configuration::{ApplicationSettings, JwtSettings, PolkaSettings};
use chirpy::startup::run;
use chirpy::storage::Storage;
use serde_json::{json, Value};

pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub storage: Storage,
    pub jwt: JwtSettings,
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 60 * 24 * 60 * 60,
        issuer: "chirpy".to_string(),
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_on_platform("dev")
}

pub fn spawn_app_on_platform(platform: &str) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let storage = Storage::in_memory();
    let jwt = jwt_settings();
    let application = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        platform: platform.to_string(),
    };
    let polka = PolkaSettings {
        api_key: POLKA_KEY.to_string(),
    };

    let server = run(listener, storage.clone(), application, jwt.clone(), polka)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        storage,
        jwt,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in, returning the login response body.
    pub async fn signed_in_user(&self, email: &str, password: &str) -> Value {
        assert_eq!(201, self.create_user(email, password).await.status().as_u16());
        let response = self.login(email, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse login response")
    }

    pub async fn post_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/chirps"))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
