use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capabilities::HttpResult;
use crate::model::{FavoriteRecord, FoodResponse};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_id!(FoodId);
typed_id!(ExtraId);
typed_id!(CategoryId);

// --- Screen lifetime ---

/// Identifies one visit of the screen. Every request captures the token that
/// was current when it was issued; completions carrying any other token are
/// dropped without touching the model.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SessionToken(pub u64);

impl SessionToken {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Noop,

    ApiConfigured {
        base_url: String,
    },

    ScreenOpened {
        food_id: FoodId,
    },
    ScreenClosed,

    IncrementExtra {
        extra_id: ExtraId,
    },
    DecrementExtra {
        extra_id: ExtraId,
    },
    IncrementFood,
    DecrementFood,

    ToggleFavorite,
    FinishOrder,
    DismissError,

    // --- capability callbacks ---
    #[serde(skip)]
    FoodLoaded {
        session: SessionToken,
        result: Box<HttpResult<FoodResponse>>,
    },
    #[serde(skip)]
    FavoritesLoaded {
        session: SessionToken,
        result: Box<HttpResult<Vec<FavoriteRecord>>>,
    },
    /// `favorite` is the flag value the request was trying to reach.
    #[serde(skip)]
    FavoriteToggled {
        session: SessionToken,
        favorite: bool,
        result: Box<HttpResult<Vec<u8>>>,
    },
    #[serde(skip)]
    OrderSubmitted {
        session: SessionToken,
        result: Box<HttpResult<Vec<u8>>>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::ApiConfigured { .. } => "api_configured",
            Self::ScreenOpened { .. } => "screen_opened",
            Self::ScreenClosed => "screen_closed",
            Self::IncrementExtra { .. } => "increment_extra",
            Self::DecrementExtra { .. } => "decrement_extra",
            Self::IncrementFood => "increment_food",
            Self::DecrementFood => "decrement_food",
            Self::ToggleFavorite => "toggle_favorite",
            Self::FinishOrder => "finish_order",
            Self::DismissError => "dismiss_error",
            Self::FoodLoaded { .. } => "food_loaded",
            Self::FavoritesLoaded { .. } => "favorites_loaded",
            Self::FavoriteToggled { .. } => "favorite_toggled",
            Self::OrderSubmitted { .. } => "order_submitted",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::ScreenOpened { .. }
                | Self::ScreenClosed
                | Self::IncrementExtra { .. }
                | Self::DecrementExtra { .. }
                | Self::IncrementFood
                | Self::DecrementFood
                | Self::ToggleFavorite
                | Self::FinishOrder
                | Self::DismissError
        )
    }

    /// Session captured by a capability callback, if this is one.
    #[must_use]
    pub const fn session(&self) -> Option<SessionToken> {
        match self {
            Self::FoodLoaded { session, .. }
            | Self::FavoritesLoaded { session, .. }
            | Self::FavoriteToggled { session, .. }
            | Self::OrderSubmitted { session, .. } => Some(*session),
            _ => None,
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
