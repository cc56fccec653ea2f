//! HTTP client for the Green Street backend.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument};
use url::Url;

use green_street_core::{
    Credential, EcoScore, EcoScoreEntry, NewRecycleItem, Price, Product, ProductDraft, ProductId,
    RecycleDecision, RecycleItem, RecycleItemId, UserProfile, UserSummary, Voucher,
};

use super::ApiError;
use super::types::{
    AdminLoginForm, DynamicPriceResponse, EcoPointsResponse, EcoScoreResponse,
    EcoScoresResponse, LoginForm, LoginGrant, LoginResponse, MessageResponse,
    RecycleDecisionBody, RegisterForm, error_message, normalize_products,
};
use crate::config::ClientConfig;

const PRODUCTS_KEY: &str = "products";

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool and the product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<&'static str, Arc<Vec<Product>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        let products = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                products,
            }),
        })
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange username and password for a credential.
    ///
    /// # Errors
    ///
    /// Wrong credentials come back as `ApiError::Rejected` carrying the
    /// backend's message.
    #[instrument(skip(self, form), fields(username = %form.username, role = %form.role))]
    pub async fn login(&self, form: &LoginForm) -> Result<LoginGrant, ApiError> {
        let request = self.request(Method::POST, "api/login", None)?.json(form);
        let response: LoginResponse = self.execute_json(request, false).await?;
        Ok(response.into())
    }

    /// Admin login.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::login`].
    #[instrument(skip(self, password))]
    pub async fn admin_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginGrant, ApiError> {
        let form = AdminLoginForm { username, password };
        let request = self
            .request(Method::POST, "api/admin/login", None)?
            .json(&form);
        let response: LoginResponse = self.execute_json(request, false).await?;
        Ok(response.into())
    }

    /// Create an account. Returns the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// An existing username comes back as `ApiError::Rejected`.
    #[instrument(skip(self, form), fields(username = %form.username, role = %form.role))]
    pub async fn register(&self, form: &RegisterForm) -> Result<String, ApiError> {
        let request = self.request(Method::POST, "api/register", None)?.json(form);
        self.execute_message(request, false).await
    }

    /// Profile of the credential's owner.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn profile(&self, credential: &Credential) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::GET, "api/profile", Some(credential))?;
        self.execute_json(request, true).await
    }

    // =========================================================================
    // Catalogue
    // =========================================================================

    /// Public product listing (cached).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures. An unexpected
    /// body shape is not an error; it yields an empty listing.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(products) = self.inner.products.get(&PRODUCTS_KEY).await {
            debug!(count = products.len(), "Product listing served from cache");
            return Ok(products);
        }

        let request = self.request(Method::GET, "api/products", None)?;
        let body: Value = self.execute_json(request, false).await?;
        let products = Arc::new(normalize_products(body));
        self.inner
            .products
            .insert(PRODUCTS_KEY, Arc::clone(&products))
            .await;
        Ok(products)
    }

    /// Product listing as seen by a seller. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn seller_products(&self, credential: &Credential) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, "api/products", Some(credential))?;
        let body: Value = self.execute_json(request, true).await?;
        Ok(normalize_products(body))
    }

    /// Eco score table.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or decode failures.
    #[instrument(skip(self))]
    pub async fn eco_scores(&self) -> Result<Vec<EcoScoreEntry>, ApiError> {
        let request = self.request(Method::GET, "api/eco-scores", None)?;
        let response: EcoScoresResponse = self.execute_json(request, false).await?;
        Ok(response.scores)
    }

    /// Current dynamic price, if the backend publishes one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or decode failures.
    #[instrument(skip(self))]
    pub async fn dynamic_price(&self) -> Result<Option<Price>, ApiError> {
        let request = self.request(Method::GET, "api/dynamic-pricing", None)?;
        let response: DynamicPriceResponse = self.execute_json(request, false).await?;
        Ok(response.dynamic_price)
    }

    // =========================================================================
    // Seller product management
    // =========================================================================

    /// Score a draft without saving it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all, fields(name = %draft.name))]
    pub async fn calculate_eco_score(
        &self,
        credential: &Credential,
        draft: &ProductDraft,
    ) -> Result<EcoScore, ApiError> {
        let request = self
            .request(Method::POST, "api/calculate-eco-score", Some(credential))?
            .json(draft);
        let response: EcoScoreResponse = self.execute_json(request, true).await?;
        Ok(response.eco_score)
    }

    /// Score a draft, then create the product with that score.
    ///
    /// Returns the score that was saved with the product.
    ///
    /// # Errors
    ///
    /// A failure of the second step is reported as
    /// `ApiError::PartialFailure`. Scoring has no side effects, so nothing
    /// needs undoing.
    #[instrument(skip_all, fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        credential: &Credential,
        draft: &ProductDraft,
    ) -> Result<EcoScore, ApiError> {
        self.save_product(credential, draft, None).await
    }

    /// Score a draft, then update product `id` with it.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::create_product`].
    #[instrument(skip(self, credential, draft), fields(name = %draft.name))]
    pub async fn update_product(
        &self,
        credential: &Credential,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<EcoScore, ApiError> {
        self.save_product(credential, draft, Some(id)).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip(self, credential))]
    pub async fn delete_product(
        &self,
        credential: &Credential,
        id: ProductId,
    ) -> Result<(), ApiError> {
        let path = format!("api/products/{id}");
        let request = self.request(Method::DELETE, &path, Some(credential))?;
        self.execute(request, true).await?;
        self.inner.products.invalidate_all();
        Ok(())
    }

    async fn save_product(
        &self,
        credential: &Credential,
        draft: &ProductDraft,
        id: Option<ProductId>,
    ) -> Result<EcoScore, ApiError> {
        let eco_score = self.calculate_eco_score(credential, draft).await?;
        let scored = ProductDraft {
            eco_score: Some(eco_score),
            ..draft.clone()
        };

        let (method, path, failed) = match id {
            Some(id) => (Method::PUT, format!("api/products/{id}"), "product update"),
            None => (Method::POST, "api/products".to_string(), "product creation"),
        };
        let saved = match self.request(method, &path, Some(credential)) {
            Ok(request) => self.execute(request.json(&scored), true).await,
            Err(e) => Err(e),
        };

        match saved {
            Ok(_) => {
                self.inner.products.invalidate_all();
                debug!(eco_score, "Product saved");
                Ok(eco_score)
            }
            Err(e) => Err(ApiError::PartialFailure {
                completed: "eco score calculation",
                failed,
                source: Box::new(e),
            }),
        }
    }

    // =========================================================================
    // Recycle program
    // =========================================================================

    /// Submit an item to the recycle program.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all, fields(product = %item.product_name))]
    pub async fn submit_recycle_item(
        &self,
        credential: &Credential,
        item: &NewRecycleItem,
    ) -> Result<String, ApiError> {
        let request = self
            .request(Method::POST, "api/recycle", Some(credential))?
            .json(item);
        self.execute_message(request, true).await
    }

    /// The caller's recycle submissions.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn recycle_items(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RecycleItem>, ApiError> {
        let request = self.request(Method::GET, "api/recycle_items", Some(credential))?;
        self.execute_json(request, true).await
    }

    /// Vouchers earned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn vouchers(&self, credential: &Credential) -> Result<Vec<Voucher>, ApiError> {
        let request = self.request(Method::GET, "api/vouchers", Some(credential))?;
        self.execute_json(request, true).await
    }

    /// Eco points balance of the caller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn eco_points(&self, credential: &Credential) -> Result<i64, ApiError> {
        let request = self.request(Method::GET, "api/eco_points", Some(credential))?;
        let response: EcoPointsResponse = self.execute_json(request, true).await?;
        Ok(response.points)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every recycle submission awaiting review.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn admin_recycle_items(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RecycleItem>, ApiError> {
        let request = self.request(Method::GET, "api/admin/recycle_items", Some(credential))?;
        self.execute_json(request, true).await
    }

    /// Approve or reject a recycle submission.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip(self, credential))]
    pub async fn decide_recycle_item(
        &self,
        credential: &Credential,
        id: RecycleItemId,
        decision: RecycleDecision,
    ) -> Result<String, ApiError> {
        let request = self
            .request(
                Method::PUT,
                &format!("api/admin/recycle_item/{id}"),
                Some(credential),
            )?
            .json(&RecycleDecisionBody { status: decision });
        self.execute_message(request, true).await
    }

    /// All registered users.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn admin_users(&self, credential: &Credential) -> Result<Vec<UserSummary>, ApiError> {
        let request = self.request(Method::GET, "api/admin/users", Some(credential))?;
        self.execute_json(request, true).await
    }

    /// Every product, including ones not listed publicly.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is refused.
    #[instrument(skip_all)]
    pub async fn admin_products(&self, credential: &Credential) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, "api/admin/products", Some(credential))?;
        let body: Value = self.execute_json(request, true).await?;
        Ok(normalize_products(body))
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn request(
        &self,
        method: Method,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let request = self.inner.client.request(method, url);
        Ok(match credential {
            Some(credential) => request.bearer_auth(credential.expose()),
            None => request,
        })
    }

    /// Send a request and return the body of a successful response.
    ///
    /// On authenticated calls 401 and 422 mean the credential was refused.
    async fn execute(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        if authenticated
            && matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
            )
        {
            debug!(status = %status, "Backend refused the credential");
            return Err(ApiError::Unauthorized(
                message.unwrap_or_else(|| status.to_string()),
            ));
        }

        error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| format!("Request failed ({status})")),
        })
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<T, ApiError> {
        let body = self.execute(request, authenticated).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Decode(e)
        })
    }

    /// Like `execute`, keeping only the `message` field. A body without one
    /// yields an empty string.
    async fn execute_message(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<String, ApiError> {
        let body = self.execute(request, authenticated).await?;
        Ok(serde_json::from_str::<MessageResponse>(&body)
            .unwrap_or_default()
            .message)
    }
}
