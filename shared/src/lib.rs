// lib.rs - food details screen core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod event;
pub mod model;
pub mod pricing;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::App as CruxApp;
pub use event::{CategoryId, Event, ExtraId, FoodId, SessionToken};
pub use model::{
    ApiConfig, CreateFavoriteRequest, CreateOrderRequest, Extra, FavoriteRecord, FoodItem,
    FoodResponse, Model, OrderQuantity, ScreenState,
};
pub use pricing::CurrencyFormat;

pub const FOODS_PATH: &str = "foods";
pub const FAVORITES_PATH: &str = "favorites";
pub const ORDERS_PATH: &str = "orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    MalformedResponse,
    InvalidLocalState,
    Configuration,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Server,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::InvalidLocalState => "INVALID_STATE",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Whether asking the user to try again can help. The core itself never
    /// retries.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server | Self::Conflict
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::MalformedResponse => {
                "The server sent something unexpected. Please try again later.".into()
            }
            ErrorKind::InvalidLocalState => "Please wait for the dish to finish loading.".into(),
            ErrorKind::Configuration => {
                "The app is misconfigured. Please contact support.".into()
            }
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Authorization => {
                "You don't have permission to perform this action.".into()
            }
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "This dish could not be found.".into(),
            ErrorKind::Conflict => {
                "This action conflicts with a recent change. Please try again.".into()
            }
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.".into(),
            ErrorKind::Server | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<&crux_http::Error> for AppError {
    fn from(e: &crux_http::Error) -> Self {
        use crux_http::Error as HttpError;

        match e {
            HttpError::Http(http) => {
                AppError::from_http_status(u16::from(http.code), http.body.as_deref())
                    .with_internal(http.message.clone())
            }
            HttpError::Json(msg) => {
                AppError::new(ErrorKind::MalformedResponse, "Unexpected response")
                    .with_internal(msg.clone())
            }
            HttpError::Url(msg) => {
                AppError::new(ErrorKind::Configuration, "Request could not be built")
                    .with_internal(msg.clone())
            }
            HttpError::Io(msg) => {
                AppError::new(ErrorKind::Network, "Network error").with_internal(msg.clone())
            }
            HttpError::Timeout => AppError::new(ErrorKind::Timeout, "Request timed out"),
        }
    }
}

impl From<&capabilities::UrlError> for AppError {
    fn from(e: &capabilities::UrlError) -> Self {
        AppError::new(ErrorKind::Configuration, "Invalid API address").with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
}

pub type AppResult<T> = Result<T, AppError>;

// --- View model ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FoodView {
    pub id: FoodId,
    pub name: String,
    pub description: String,
    pub formatted_price: String,
    pub image_url: String,
    pub thumbnail_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExtraView {
    pub id: ExtraId,
    pub name: String,
    pub formatted_value: String,
    pub quantity: u32,
    pub can_decrement: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub state: ScreenState,
    pub food: Option<FoodView>,
    pub extras: Vec<ExtraView>,
    pub order_quantity: u32,
    pub can_decrement_order: bool,
    /// Formatted order total; absent until the food has loaded.
    pub total: Option<String>,
    pub is_favorite: bool,
    pub favorite_icon: capabilities::FavoriteIcon,
    pub favorite_toggle_pending: bool,
    pub can_finish_order: bool,
    pub error: Option<UserFacingError>,
}

pub mod app {
    use super::*;
    use crate::capabilities::{
        new_request_id, HeaderAction, HttpResult, Route, ValidatedUrl, REQUEST_ID_HEADER,
    };
    use crux_http::Response;
    use tracing::{debug, info, instrument, warn};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn endpoint(model: &Model, path: &str) -> AppResult<ValidatedUrl> {
            model
                .config
                .base_url
                .join(path)
                .map_err(|e| AppError::from(&e).with_context("path", path))
        }

        #[instrument(skip(model, caps))]
        fn load_food(
            food_id: FoodId,
            session: SessionToken,
            model: &Model,
            caps: &Capabilities,
        ) -> AppResult<()> {
            let url = Self::endpoint(model, &format!("{FOODS_PATH}/{food_id}"))?;
            let request_id = new_request_id();
            debug!(%url, %request_id, "loading food");

            caps.http
                .get(url.as_str())
                .header(REQUEST_ID_HEADER, request_id.as_str())
                .expect_json::<FoodResponse>()
                .send(move |result| Event::FoodLoaded {
                    session,
                    result: Box::new(result),
                });
            Ok(())
        }

        #[instrument(skip(model, caps))]
        fn load_favorites(
            session: SessionToken,
            model: &Model,
            caps: &Capabilities,
        ) -> AppResult<()> {
            let url = Self::endpoint(model, FAVORITES_PATH)?;
            let request_id = new_request_id();
            debug!(%url, %request_id, "loading favorites");

            caps.http
                .get(url.as_str())
                .header(REQUEST_ID_HEADER, request_id.as_str())
                .expect_json::<Vec<FavoriteRecord>>()
                .send(move |result| Event::FavoritesLoaded {
                    session,
                    result: Box::new(result),
                });
            Ok(())
        }

        fn register_header_action(model: &Model, caps: &Capabilities) {
            caps.navigator
                .set_header_action(HeaderAction::favorite_toggle(model.favorite.is_favorite));
        }

        fn toggle_favorite(model: &mut Model, caps: &Capabilities) -> AppResult<()> {
            if model.favorite.toggle_in_flight {
                debug!("favorite toggle already in flight, ignoring");
                return Ok(());
            }

            let food = match (&model.food, model.state) {
                (_, ScreenState::Dismissed | ScreenState::Submitted) | (None, _) => {
                    return Err(AppError::new(
                        ErrorKind::InvalidLocalState,
                        "Cannot toggle favorite before the food has loaded",
                    )
                    .with_context("state", format!("{:?}", model.state)));
                }
                (Some(food), _) => food,
            };

            let session = model.session;
            let target = !model.favorite.is_favorite;
            let request_id = new_request_id();

            let builder = if target {
                let url = Self::endpoint(model, FAVORITES_PATH)?;
                caps.http
                    .post(url.as_str())
                    .body_json(&CreateFavoriteRequest::from(food))
                    .map_err(|e| AppError::from(&e))?
            } else {
                let url = Self::endpoint(model, &format!("{FAVORITES_PATH}/{}", food.id))?;
                caps.http.delete(url.as_str())
            };

            info!(food_id = %food.id, favorite = target, %request_id, "toggling favorite");
            model.favorite.toggle_in_flight = true;
            model.favorite.toggled = true;

            builder
                .header(REQUEST_ID_HEADER, request_id.as_str())
                .send(move |result| Event::FavoriteToggled {
                    session,
                    favorite: target,
                    result: Box::new(result),
                });
            Ok(())
        }

        fn submit_order(model: &mut Model, caps: &Capabilities) -> AppResult<()> {
            if model.state == ScreenState::Submitting {
                debug!("order already submitting, ignoring");
                return Ok(());
            }

            let (Some(food), Some(total), ScreenState::Ready) =
                (&model.food, model.total(), model.state)
            else {
                return Err(AppError::new(
                    ErrorKind::InvalidLocalState,
                    "Cannot submit an order before the food has loaded",
                )
                .with_context("state", format!("{:?}", model.state)));
            };

            let payload = CreateOrderRequest {
                product_id: food.id,
                name: food.name.clone(),
                description: food.description.clone(),
                price: total,
                category: food.category,
                thumbnail_url: food.thumbnail_url.clone(),
                extras: model.extras.clone(),
            };

            let url = Self::endpoint(model, ORDERS_PATH)?;
            let request_id = new_request_id();
            let builder = caps
                .http
                .post(url.as_str())
                .header(REQUEST_ID_HEADER, request_id.as_str())
                .body_json(&payload)
                .map_err(|e| AppError::from(&e))?;

            info!(
                product_id = %payload.product_id,
                total = %payload.price,
                extras = payload.extras.len(),
                %request_id,
                "submitting order"
            );
            model.state = ScreenState::Submitting;

            let session = model.session;
            builder.send(move |result| Event::OrderSubmitted {
                session,
                result: Box::new(result),
            });
            Ok(())
        }

        fn successful<T>(result: HttpResult<T>) -> AppResult<Response<T>> {
            match result {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => Err(AppError::from_http_status(
                    u16::from(response.status()),
                    None,
                )),
                Err(e) => Err(AppError::from(&e)),
            }
        }

        fn decode<T>(result: HttpResult<T>) -> AppResult<T> {
            let mut response = Self::successful(result)?;
            response.take_body().ok_or_else(|| {
                AppError::new(ErrorKind::MalformedResponse, "Unexpected response shape")
                    .with_internal("empty body")
            })
        }

        fn adjust_quantity(model: &mut Model, change: impl FnOnce(&mut Model)) {
            if model.state.accepts_input() {
                change(model);
            } else {
                debug!(state = ?model.state, "ignoring quantity change outside ready state");
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let span = tracing::debug_span!(
                "update",
                event = event.name(),
                user = event.is_user_initiated()
            );
            let _entered = span.enter();

            if let Some(session) = event.session() {
                if !model.is_current(session) {
                    debug!(%session, current = %model.session, "dropping stale completion");
                    return;
                }
            }

            match event {
                Event::Noop => {}

                Event::ApiConfigured { base_url } => {
                    match ValidatedUrl::new(base_url) {
                        Ok(url) => {
                            info!(base_url = %url, "api configured");
                            model.config.base_url = url;
                        }
                        Err(e) => {
                            warn!(error = %e, "rejected api configuration");
                            model.set_error(AppError::from(&e));
                        }
                    }
                    caps.render.render();
                }

                Event::ScreenOpened { food_id } => {
                    let session = model.begin_session(food_id);
                    info!(%food_id, %session, "screen opened");

                    let loads = Self::load_food(food_id, session, model, caps)
                        .and_then(|()| Self::load_favorites(session, model, caps));
                    if let Err(e) = loads {
                        warn!(error = %e, "could not issue initial loads");
                        model.set_error(e);
                    }

                    Self::register_header_action(model, caps);
                    caps.render.render();
                }

                Event::ScreenClosed => {
                    info!(session = %model.session, "screen closed");
                    model.end_session();
                    caps.render.render();
                }

                Event::FoodLoaded { result, .. } => {
                    let parsed = Self::decode(*result).and_then(|response| {
                        response.into_parts().map_err(|reason| {
                            AppError::new(ErrorKind::MalformedResponse, "Invalid food data")
                                .with_internal(reason)
                        })
                    });

                    match parsed {
                        Ok((food, extras)) => {
                            info!(food_id = %food.id, extras = extras.len(), "food loaded");
                            model.apply_food(food, extras);
                        }
                        Err(e) => {
                            warn!(error = %e, "food load failed");
                            model.set_error(e);
                        }
                    }
                    caps.render.render();
                }

                Event::FavoritesLoaded { result, .. } => {
                    if model.favorite.toggled {
                        debug!("favorite toggled during this visit, ignoring favorites listing");
                        return;
                    }

                    match Self::decode(*result) {
                        Ok(records) => {
                            let is_favorite = model
                                .food_id
                                .is_some_and(|id| records.iter().any(|r| r.id == id));
                            debug!(count = records.len(), is_favorite, "favorites loaded");

                            if model.favorite.is_favorite != is_favorite {
                                model.favorite.is_favorite = is_favorite;
                                Self::register_header_action(model, caps);
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "favorites load failed");
                            model.set_error(e);
                        }
                    }
                    caps.render.render();
                }

                Event::IncrementExtra { extra_id } => {
                    Self::adjust_quantity(model, |m| {
                        if !m.increment_extra(extra_id) {
                            debug!(%extra_id, "unknown extra");
                        }
                    });
                    caps.render.render();
                }

                Event::DecrementExtra { extra_id } => {
                    Self::adjust_quantity(model, |m| {
                        if !m.decrement_extra(extra_id) {
                            debug!(%extra_id, "unknown extra");
                        }
                    });
                    caps.render.render();
                }

                Event::IncrementFood => {
                    Self::adjust_quantity(model, |m| m.order_quantity.increment());
                    caps.render.render();
                }

                Event::DecrementFood => {
                    Self::adjust_quantity(model, |m| m.order_quantity.decrement());
                    caps.render.render();
                }

                Event::ToggleFavorite => {
                    if let Err(e) = Self::toggle_favorite(model, caps) {
                        warn!(error = %e, "favorite toggle rejected");
                        model.set_error(e);
                    }
                    caps.render.render();
                }

                Event::FavoriteToggled {
                    favorite, result, ..
                } => {
                    model.favorite.toggle_in_flight = false;

                    match Self::successful(*result) {
                        Ok(_) => {
                            info!(favorite, "favorite updated");
                            model.favorite.is_favorite = favorite;
                            Self::register_header_action(model, caps);
                        }
                        Err(e) => {
                            warn!(error = %e, "favorite update failed");
                            model.set_error(e);
                        }
                    }
                    caps.render.render();
                }

                Event::FinishOrder => {
                    if let Err(e) = Self::submit_order(model, caps) {
                        warn!(error = %e, "order submission rejected");
                        model.set_error(e);
                    }
                    caps.render.render();
                }

                Event::OrderSubmitted { result, .. } => {
                    match Self::successful(*result) {
                        Ok(_) => {
                            info!("order submitted");
                            model.state = ScreenState::Submitted;
                            caps.navigator.navigate(Route::Orders);
                        }
                        Err(e) => {
                            warn!(error = %e, "order submission failed");
                            model.state = ScreenState::Ready;
                            model.set_error(e);
                        }
                    }
                    caps.render.render();
                }

                Event::DismissError => {
                    model.clear_error();
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let currency = &model.config.currency;

            ViewModel {
                state: model.state,
                food: model.food.as_ref().map(|food| FoodView {
                    id: food.id,
                    name: food.name.clone(),
                    description: food.description.clone(),
                    formatted_price: currency.format(food.price),
                    image_url: food.image_url.clone(),
                    thumbnail_url: food.thumbnail_url.clone(),
                }),
                extras: model
                    .extras
                    .iter()
                    .map(|extra| ExtraView {
                        id: extra.id,
                        name: extra.name.clone(),
                        formatted_value: currency.format(extra.value),
                        quantity: extra.quantity,
                        can_decrement: extra.quantity > 0,
                    })
                    .collect(),
                order_quantity: model.order_quantity.get(),
                can_decrement_order: model.order_quantity.can_decrement(),
                total: model.total().map(|total| currency.format(total)),
                is_favorite: model.favorite.is_favorite,
                favorite_icon: capabilities::FavoriteIcon::for_flag(model.favorite.is_favorite),
                favorite_toggle_pending: model.favorite.toggle_in_flight,
                can_finish_order: model.state == ScreenState::Ready && model.food.is_some(),
                error: model.active_error.as_ref().map(UserFacingError::from),
            }
        }
    }
}
