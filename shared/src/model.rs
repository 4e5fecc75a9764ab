use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::capabilities::ValidatedUrl;
use crate::event::{CategoryId, ExtraId, FoodId, SessionToken};
use crate::pricing::{self, CurrencyFormat, MAX_PRICE, MAX_QUANTITY};
use crate::AppError;

/// Where and how the core talks to the food API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: ValidatedUrl,
    pub currency: CurrencyFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: ValidatedUrl::default(),
            currency: CurrencyFormat::default(),
        }
    }
}

#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Submitting,
    Submitted,
    Dismissed,
}

impl ScreenState {
    #[must_use]
    pub const fn accepts_input(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// An add-on for the current food. `quantity` is the only field the user
/// edits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Extra {
    pub id: ExtraId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(default)]
    pub quantity: u32,
}

impl Extra {
    /// Stops at `MAX_QUANTITY`.
    pub fn increment(&mut self) {
        if self.quantity < MAX_QUANTITY {
            self.quantity += 1;
        }
    }

    pub fn decrement(&mut self) {
        self.quantity = self.quantity.saturating_sub(1);
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FoodItem {
    pub id: FoodId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: String,
    pub thumbnail_url: String,
    pub category: CategoryId,
}

/// Units of the base food being ordered, within `1..=MAX_QUANTITY`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderQuantity(NonZeroU32);

impl OrderQuantity {
    pub const ONE: Self = Self(NonZeroU32::MIN);

    #[must_use]
    pub const fn new(units: u32) -> Option<Self> {
        if units > MAX_QUANTITY {
            return None;
        }
        match NonZeroU32::new(units) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    pub fn increment(&mut self) {
        if self.0.get() < MAX_QUANTITY {
            self.0 = self.0.saturating_add(1);
        }
    }

    pub fn decrement(&mut self) {
        if let Some(n) = NonZeroU32::new(self.0.get() - 1) {
            self.0 = n;
        }
    }

    #[must_use]
    pub const fn can_decrement(self) -> bool {
        self.0.get() > 1
    }
}

impl Default for OrderQuantity {
    fn default() -> Self {
        Self::ONE
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FavoriteState {
    pub is_favorite: bool,
    pub toggle_in_flight: bool,
    /// Set once a toggle is issued; later favorites listings no longer
    /// override the flag for this visit.
    pub toggled: bool,
}

// --- Wire types ---

/// `GET foods/{id}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FoodResponse {
    pub id: FoodId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: String,
    pub thumbnail_url: String,
    pub category: CategoryId,
    #[serde(default)]
    pub extras: Vec<ExtraResponse>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExtraResponse {
    pub id: ExtraId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

/// Entry of `GET favorites`; only the id takes part in the comparison.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FavoriteRecord {
    pub id: FoodId,
}

/// `POST favorites`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateFavoriteRequest {
    pub id: FoodId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: CategoryId,
    pub image_url: String,
    pub thumbnail_url: String,
}

impl From<&FoodItem> for CreateFavoriteRequest {
    fn from(food: &FoodItem) -> Self {
        Self {
            id: food.id,
            name: food.name.clone(),
            description: food.description.clone(),
            price: food.price,
            category: food.category,
            image_url: food.image_url.clone(),
            thumbnail_url: food.thumbnail_url.clone(),
        }
    }
}

/// `POST orders`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateOrderRequest {
    pub product_id: FoodId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: CategoryId,
    pub thumbnail_url: String,
    pub extras: Vec<Extra>,
}

fn amount_in_range(amount: Decimal) -> bool {
    (amount.is_zero() || amount.is_sign_positive()) && amount <= MAX_PRICE
}

impl FoodResponse {
    /// Splits the response into the food and its extras, every extra starting
    /// at quantity zero. Amounts must lie in `0..=MAX_PRICE`.
    pub fn into_parts(self) -> Result<(FoodItem, Vec<Extra>), String> {
        if !amount_in_range(self.price) {
            return Err(format!("food {} has out-of-range price {}", self.id, self.price));
        }
        if let Some(bad) = self.extras.iter().find(|e| !amount_in_range(e.value)) {
            return Err(format!("extra {} has out-of-range value {}", bad.id, bad.value));
        }

        let extras = self
            .extras
            .into_iter()
            .map(|e| Extra {
                id: e.id,
                name: e.name,
                value: e.value,
                quantity: 0,
            })
            .collect();

        let food = FoodItem {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            thumbnail_url: self.thumbnail_url,
            category: self.category,
        };

        Ok((food, extras))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Model {
    pub config: ApiConfig,
    pub state: ScreenState,
    pub session: SessionToken,

    pub food_id: Option<FoodId>,
    pub food: Option<FoodItem>,
    pub extras: Vec<Extra>,
    pub order_quantity: OrderQuantity,
    pub favorite: FavoriteState,

    pub active_error: Option<AppError>,
}

impl Model {
    /// Starts a fresh visit for `food_id`, discarding everything from the
    /// previous one.
    pub fn begin_session(&mut self, food_id: FoodId) -> SessionToken {
        self.session = self.session.next();
        self.state = ScreenState::Loading;
        self.food_id = Some(food_id);
        self.food = None;
        self.extras.clear();
        self.order_quantity = OrderQuantity::ONE;
        self.favorite = FavoriteState::default();
        self.active_error = None;
        self.session
    }

    pub fn end_session(&mut self) {
        self.session = self.session.next();
        self.state = ScreenState::Dismissed;
        self.favorite.toggle_in_flight = false;
    }

    #[must_use]
    pub fn is_current(&self, session: SessionToken) -> bool {
        self.session == session && self.state != ScreenState::Dismissed
    }

    pub fn apply_food(&mut self, food: FoodItem, extras: Vec<Extra>) {
        self.food = Some(food);
        self.extras = extras;
        if self.state == ScreenState::Loading {
            self.state = ScreenState::Ready;
        }
    }

    /// Returns `false` when no extra has that id.
    pub fn increment_extra(&mut self, extra_id: ExtraId) -> bool {
        self.extra_mut(extra_id).map(Extra::increment).is_some()
    }

    /// Returns `false` when no extra has that id. Floors at zero.
    pub fn decrement_extra(&mut self, extra_id: ExtraId) -> bool {
        self.extra_mut(extra_id).map(Extra::decrement).is_some()
    }

    fn extra_mut(&mut self, extra_id: ExtraId) -> Option<&mut Extra> {
        self.extras.iter_mut().find(|e| e.id == extra_id)
    }

    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.food
            .as_ref()
            .and_then(|food| pricing::order_total(food.price, self.order_quantity, &self.extras))
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn food_json() -> serde_json::Value {
        serde_json::json!({
            "id": 42,
            "name": "Ao molho",
            "description": "Macarrão ao molho branco",
            "price": 19.9,
            "category": 1,
            "image_url": "https://cdn.example.com/ao_molho.png",
            "thumbnail_url": "https://cdn.example.com/ao_molho_thumb.png",
            "extras": [
                { "id": 1, "name": "Bacon", "value": 2.5 },
                { "id": 2, "name": "Frango", "value": 3 }
            ]
        })
    }

    fn loaded_model() -> Model {
        let response: FoodResponse = serde_json::from_value(food_json()).unwrap();
        let (food, extras) = response.into_parts().unwrap();
        let mut model = Model::default();
        model.begin_session(food.id);
        model.apply_food(food, extras);
        model
    }

    #[test]
    fn food_response_normalizes_extras() {
        let model = loaded_model();
        assert_eq!(model.state, ScreenState::Ready);
        assert_eq!(model.extras.len(), 2);
        assert!(model.extras.iter().all(|e| e.quantity == 0));
        assert_eq!(model.extras[0].value, Decimal::new(25, 1));
        assert_eq!(model.extras[1].value, Decimal::from(3));
    }

    #[test]
    fn food_response_ignores_server_quantities() {
        let mut json = food_json();
        json["extras"][0]["quantity"] = serde_json::json!(9);
        let response: FoodResponse = serde_json::from_value(json).unwrap();
        let (_, extras) = response.into_parts().unwrap();
        assert_eq!(extras[0].quantity, 0);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut json = food_json();
        json["extras"][1]["value"] = serde_json::json!(-1.0);
        let response: FoodResponse = serde_json::from_value(json).unwrap();
        assert!(response.into_parts().is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let mut json = food_json();
        json["price"] = serde_json::json!(1e28);
        let response: FoodResponse = serde_json::from_value(json).unwrap();
        assert!(response.into_parts().is_err());

        let mut json = food_json();
        json["extras"][0]["value"] = serde_json::json!(1_000_000.01);
        let response: FoodResponse = serde_json::from_value(json).unwrap();
        assert!(response.into_parts().is_err());

        let mut json = food_json();
        json["price"] = serde_json::json!(1_000_000);
        let response: FoodResponse = serde_json::from_value(json).unwrap();
        assert!(response.into_parts().is_ok());
    }

    #[test]
    fn quantities_stop_at_maximum() {
        let mut q = OrderQuantity::new(MAX_QUANTITY).unwrap();
        q.increment();
        assert_eq!(q.get(), MAX_QUANTITY);
        assert!(OrderQuantity::new(MAX_QUANTITY + 1).is_none());

        let mut model = loaded_model();
        model.extras[0].quantity = MAX_QUANTITY;
        assert!(model.increment_extra(ExtraId(1)));
        assert_eq!(model.extras[0].quantity, MAX_QUANTITY);
        assert!(model.total().is_some());
    }

    #[test]
    fn initial_total_is_unit_price() {
        let model = loaded_model();
        assert_eq!(model.total(), Some(Decimal::new(199, 1)));
    }

    #[test]
    fn total_absent_before_food() {
        assert_eq!(Model::default().total(), None);
    }

    #[test]
    fn extra_quantities_change_by_id() {
        let mut model = loaded_model();
        assert!(model.increment_extra(ExtraId(2)));
        assert!(model.increment_extra(ExtraId(2)));
        assert!(model.decrement_extra(ExtraId(2)));
        assert_eq!(model.extras[1].quantity, 1);
        assert_eq!(model.extras[0].quantity, 0);

        assert!(!model.increment_extra(ExtraId(99)));
    }

    #[test]
    fn extra_decrement_floors_at_zero() {
        let mut model = loaded_model();
        assert!(model.decrement_extra(ExtraId(1)));
        assert_eq!(model.extras[0].quantity, 0);
    }

    #[test]
    fn order_quantity_floors_at_one() {
        let mut q = OrderQuantity::ONE;
        q.decrement();
        assert_eq!(q.get(), 1);
        assert!(!q.can_decrement());

        q.increment();
        assert_eq!(q.get(), 2);
        assert!(q.can_decrement());

        assert!(OrderQuantity::new(0).is_none());
    }

    #[test]
    fn begin_session_resets_screen() {
        let mut model = loaded_model();
        model.increment_extra(ExtraId(1));
        model.order_quantity.increment();
        model.favorite.is_favorite = true;
        let old = model.session;

        let new = model.begin_session(FoodId(7));

        assert_ne!(old, new);
        assert_eq!(model.state, ScreenState::Loading);
        assert!(model.food.is_none());
        assert!(model.extras.is_empty());
        assert_eq!(model.order_quantity, OrderQuantity::ONE);
        assert!(!model.favorite.is_favorite);
        assert!(!model.is_current(old));
        assert!(model.is_current(new));
    }

    #[test]
    fn end_session_invalidates_token() {
        let mut model = loaded_model();
        let session = model.session;
        model.end_session();
        assert!(!model.is_current(session));
        assert!(!model.is_current(model.session));
    }

    #[test]
    fn order_payload_shape() {
        let model = loaded_model();
        let food = model.food.clone().unwrap();
        let payload = CreateOrderRequest {
            product_id: food.id,
            name: food.name,
            description: food.description,
            price: model.total().unwrap(),
            category: food.category,
            thumbnail_url: food.thumbnail_url,
            extras: model.extras.clone(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["product_id"], 42);
        assert_eq!(json["price"].as_f64(), Some(19.9));
        assert_eq!(json["extras"][1]["quantity"], 0);
        assert!(json.get("image_url").is_none());
    }

    proptest! {
        #[test]
        fn order_quantity_never_below_one(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut q = OrderQuantity::ONE;
            let mut expected: u32 = 1;
            for up in ops {
                if up {
                    q.increment();
                    expected += 1;
                } else {
                    q.decrement();
                    expected = expected.saturating_sub(1).max(1);
                }
                prop_assert!(q.get() >= 1);
            }
            prop_assert_eq!(q.get(), expected);
        }

        #[test]
        fn extra_quantity_never_negative(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut model = loaded_model();
            let mut expected: u32 = 0;
            for up in ops {
                if up {
                    model.increment_extra(ExtraId(1));
                    expected += 1;
                } else {
                    model.decrement_extra(ExtraId(1));
                    expected = expected.saturating_sub(1);
                }
            }
            prop_assert_eq!(model.extras[0].quantity, expected);
            prop_assert_eq!(model.extras[1].quantity, 0);
        }
    }
}
