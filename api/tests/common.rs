use anyhow::Result;
use futures::Future;
use once_cell::sync::Lazy;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use roster_api::Server;
use roster_db::test::{create_database, TestDatabase};

/// A client bound to the base URL of a test server.
#[derive(Clone)]
pub struct TestClient {
    pub base: String,
    pub client: reqwest::Client,
}

impl TestClient {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }
}

pub struct TestApp {
    pub database: TestDatabase,
    /// A client set to the base url of the server.
    pub client: TestClient,
}

async fn start_app(database: TestDatabase) -> Result<TestApp> {
    let config = roster_api::config::Config {
        database_url: database.url.clone(),
        database_max_connections: 4,
        port: 0, // Bind to random port
        host: "127.0.0.1".to_string(),
        env: "test".to_string(),
        honeycomb_team: None,
        honeycomb_dataset: String::new(),
    };
    Lazy::force(&roster_test::TRACING);
    let server = roster_api::create_server(config).await?;
    let Server { host, port, .. } = &server;
    let address = format!("{}:{}", host, port);

    tokio::task::spawn(server.run());

    let client = TestClient {
        base: format!("http://{}/api", address),
        client: reqwest::ClientBuilder::new()
            .timeout(std::time::Duration::from_secs(30))
            .build()?,
    };

    Ok(TestApp { database, client })
}

pub async fn run_app_test<F, R>(f: F)
where
    F: FnOnce(TestApp) -> R,
    R: Future<Output = Result<(), anyhow::Error>>,
{
    let database = create_database().await.expect("Creating database");
    let app = start_app(database.clone()).await.expect("Starting app");
    f(app).await.unwrap();
    drop(database);
}

/// Check the status and content type of a response and decode its JSON body.
pub async fn json_body<T: DeserializeOwned>(response: Response, status: u16) -> Result<T> {
    assert_eq!(
        response.status().as_u16(),
        status,
        "response status code should be {}",
        status
    );

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.contains("json"),
        "content type should be json, saw {content_type}"
    );

    Ok(response.json::<T>().await?)
}
