//! reqwest-backed billing API client

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response, Url};

use crate::common::{ApiError, Config, Error, Result};

use super::request::{ApiRequest, Method};
use super::BillingApi;

/// HTTP client for the billing API
///
/// One request per call, no retries, and the transport's default timeouts.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: ReqwestClient,
    base_url: String,
    base: Url,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .user_agent(concat!("billing-harness/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::invalid_base_url(&config.base_url, e))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            base,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Url {
        request.url(&self.base)
    }
}

#[async_trait]
impl BillingApi for HttpClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: &ApiRequest) -> std::result::Result<serde_json::Value, ApiError> {
        let url = self.url_for(request);
        tracing::debug!(method = %request.method(), %url, "sending request");

        let builder = match request.method() {
            Method::Get => self.http_client.get(url),
            Method::Post => self.http_client.post(url),
            Method::Put => self.http_client.put(url),
        };
        let builder = match request.body() {
            Some(body) => builder.json(&body),
            None => builder,
        };

        let response = builder.send().await.map_err(ApiError::transport)?;
        let status = response.status();
        let body = read_body(response).await?;

        tracing::debug!(status = status.as_u16(), "received response");

        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Response {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Read a response body as JSON
///
/// Empty bodies become `null`; anything that is not JSON is kept as a string.
async fn read_body(response: Response) -> std::result::Result<serde_json::Value, ApiError> {
    let text = response.text().await.map_err(ApiError::transport)?;
    Ok(parse_body(text))
}

fn parse_body(text: String) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResourceId;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), serde_json::Value::Null);
        assert_eq!(parse_body("  \n".into()), serde_json::Value::Null);
        assert_eq!(parse_body(r#"{"id":1}"#.into()), json!({"id": 1}));
        assert_eq!(
            parse_body("Bad Gateway".into()),
            json!("Bad Gateway")
        );
    }

    #[test]
    fn test_url_for() {
        let config = Config::with_base_url("http://billing.local:8080/").unwrap();
        let client = HttpClient::new(&config).unwrap();

        assert_eq!(client.base_url(), "http://billing.local:8080");
        assert_eq!(
            client
                .url_for(&ApiRequest::ListInvoicesForCustomer(ResourceId::Number(3)))
                .as_str(),
            "http://billing.local:8080/facturas?clienteId=3"
        );
    }

    #[tokio::test]
    async fn test_text_ids_reach_the_intended_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clientes/a%23b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a#b"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/facturas"))
            .and(query_param("clienteId", "41&clienteId=99999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&Config::with_base_url(&server.uri()).unwrap()).unwrap();

        let body = client
            .send(&ApiRequest::GetCustomer(ResourceId::Text("a#b".into())))
            .await
            .unwrap();
        assert_eq!(body, json!({"id": "a#b"}));

        let body = client
            .send(&ApiRequest::ListInvoicesForCustomer(ResourceId::Text(
                "41&clienteId=99999".into(),
            )))
            .await
            .unwrap();
        assert_eq!(body, json!([]));

        let requests = server.received_requests().await.unwrap();
        let list = &requests[1];
        assert_eq!(list.url.query_pairs().count(), 1);
    }
}
