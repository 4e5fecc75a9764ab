mod endpoint;
mod navigator;

pub use self::endpoint::{
    new_request_id, HttpResult, UrlError, ValidatedUrl, DEFAULT_BASE_URL, MAX_URL_LENGTH,
    REQUEST_ID_HEADER,
};
pub use self::navigator::{
    FavoriteIcon, HeaderAction, HeaderPress, Navigator, NavigatorOperation, Route,
    HEADER_ACCENT_COLOR, HEADER_ICON_SIZE,
};

// Crux's built-in Render covers view refreshes.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppNavigator = Navigator<Event>;
pub type AppRender = Render<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub navigator: Navigator<Event>,
    pub render: Render<Event>,
}
