//! HTTP implementation of the expense API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use super::ExpenseApi;
use super::models::{Expense, ExpenseFilter, ExpenseInput, ImportSummary, Report, ReportRequest};
use crate::config::{Config, DEFAULT_API_URL};
use crate::error::{ApiError, Result};

/// Error body returned by the API, e.g. `{"erro": "Despesa não encontrada"}`
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "erro")]
    message: String,
}

/// reqwest-backed expense API client
pub struct HttpExpenseClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl HttpExpenseClient {
    /// Create a client against the default API with a 60s timeout
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, token, Duration::from_secs(60))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.api_url, config.token.clone(), config.timeout())
    }

    pub fn with_base_url(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, &url);
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a JSON body from a 2xx response
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = Self::check_status(builder.send().await.map_err(ApiError::from)?).await?;

        let data = response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(data)
    }

    /// Send where only the status matters; any 2xx body (or none) is accepted
    async fn send_no_content(&self, builder: RequestBuilder) -> Result<()> {
        Self::check_status(builder.send().await.map_err(ApiError::from)?).await?;
        Ok(())
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        let err = match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::BadRequest(message)
            }
            status if status.is_server_error() => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Unexpected status code: {}", status)),
        };
        Err(err.into())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.send(self.builder(Method::GET, path).query(query)).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.builder(method, path).json(body)).await
    }
}

#[async_trait]
impl ExpenseApi for HttpExpenseClient {
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        self.get("/expenses", &filter.query_pairs()).await
    }

    async fn get_expense(&self, id: &str) -> Result<Expense> {
        self.get(&format!("/expenses/{}", id), &[]).await
    }

    async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense> {
        self.send_json(Method::POST, "/expenses", input).await
    }

    async fn update_expense(&self, id: &str, input: &ExpenseInput) -> Result<Expense> {
        self.send_json(Method::PUT, &format!("/expenses/{}", id), input)
            .await
    }

    async fn delete_expense(&self, id: &str) -> Result<()> {
        self.send_no_content(self.builder(Method::DELETE, &format!("/expenses/{}", id)))
            .await
    }

    async fn import_expenses(&self, file_name: &str, csv: &[u8]) -> Result<ImportSummary> {
        let part = Part::bytes(csv.to_vec())
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(ApiError::from)?;
        let form = Form::new().part("file", part);

        self.send(self.builder(Method::POST, "/expenses/import").multipart(form))
            .await
    }

    async fn report(&self, request: &ReportRequest) -> Result<Report> {
        self.get("/expenses/report", &request.query_pairs()).await
    }
}
