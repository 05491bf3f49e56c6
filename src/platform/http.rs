use crate::platform::{
    Analysis, ClientError, Container, FileRef, JobId, JobRequest, Platform, find_project_file,
};

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Blocking REST client for the platform API.
pub struct HttpPlatform {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct Created {
    #[serde(rename = "_id")]
    id: String,
}

impl HttpPlatform {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("scitran-user {}", api_key))
            .map_err(|_| ClientError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn send<T: DeserializeOwned>(&self, url: String, builder: RequestBuilder) -> Result<T, ClientError> {
        log::trace!("request {}", url);
        let resp = builder.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
                body,
            });
        }
        Ok(resp.json()?)
    }
}

impl Platform for HttpPlatform {
    fn lookup(&self, path: &[&str]) -> Result<Container, ClientError> {
        let url = self.url("lookup");
        let builder = self.client.post(&url).json(&json!({ "path": path }));
        match self.send(url, builder) {
            Err(ClientError::Status { status: 404, .. }) => Err(ClientError::NotFound(path.join("/"))),
            other => other,
        }
    }

    fn project_file(&self, project: &Container, name: &str) -> Result<FileRef, ClientError> {
        find_project_file(project, name)
    }

    fn session_analyses(&self, session: &Container) -> Result<Vec<Analysis>, ClientError> {
        let url = self.url(&format!("sessions/{}/analyses", session.id));
        let builder = self.client.get(&url);
        self.send(url, builder)
    }

    fn run_gear(&self, gear: &Container, request: &JobRequest) -> Result<JobId, ClientError> {
        let url = self.url(&format!("sessions/{}/analyses", request.destination));
        let body = json!({
            "label": request.analysis_label,
            "job": {
                "gear_id": gear.id,
                "config": request.config,
                "inputs": request.inputs,
            },
        });
        let builder = self.client.post(&url).json(&body);
        let created: Created = self.send(url, builder)?;
        Ok(created.id)
    }
}
