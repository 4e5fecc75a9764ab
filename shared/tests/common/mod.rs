#![allow(dead_code)]

use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use food_details::capabilities::NavigatorOperation;
use food_details::{App, Effect, Event, FoodId, Model};
use serde_json::{json, Value};

pub type Tester = AppTester<App, Effect>;

pub const FOOD_ID: FoodId = FoodId(42);

pub fn food_json(id: i64, price: f64, extras: &[(i64, &str, f64)]) -> Value {
    json!({
        "id": id,
        "name": "Ao molho",
        "description": "Macarrão ao molho branco, fughi e cheiro verde das montanhas.",
        "price": price,
        "image_url": "https://cdn.example.com/ao_molho.png",
        "thumbnail_url": "https://cdn.example.com/ao_molho_thumb.png",
        "category": 1,
        "extras": extras
            .iter()
            .map(|(id, name, value)| json!({ "id": id, "name": name, "value": value }))
            .collect::<Vec<_>>(),
    })
}

pub fn ok_json(value: &Value) -> HttpResult {
    HttpResult::Ok(HttpResponse::ok().json(value).build())
}

pub fn status(code: u16) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(code).build())
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn navigator_ops(effects: &[Effect]) -> Vec<NavigatorOperation> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Navigator(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

pub fn renders(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Render(_)))
}

/// Resolves a shell request and feeds the resulting events back into the app,
/// returning every effect produced along the way.
pub fn resolve(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    result: HttpResult,
) -> Vec<Effect> {
    let update = app.resolve(request, result).expect("an update");
    let mut effects = update.effects;
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

pub struct Opened {
    pub food: Request<HttpRequest>,
    pub favorites: Request<HttpRequest>,
    pub effects: Vec<Effect>,
}

pub fn open(app: &Tester, model: &mut Model, food_id: FoodId) -> Opened {
    let update = app.update(Event::ScreenOpened { food_id }, model);

    let mut food = None;
    let mut favorites = None;
    let mut rest = Vec::new();
    for effect in update.effects {
        match effect {
            Effect::Http(request) if request.operation.url.ends_with("/favorites") => {
                favorites = Some(request);
            }
            Effect::Http(request) => food = Some(request),
            other => rest.push(other),
        }
    }

    Opened {
        food: food.expect("food request"),
        favorites: favorites.expect("favorites request"),
        effects: rest,
    }
}

/// Opens the screen and answers both initial loads, food first.
pub fn open_loaded(
    app: &Tester,
    model: &mut Model,
    food: &Value,
    favorites: &Value,
) -> Vec<Effect> {
    let id = FoodId(food["id"].as_i64().unwrap());
    let mut opened = open(app, model, id);
    let mut effects = resolve(app, model, &mut opened.food, ok_json(food));
    effects.extend(resolve(app, model, &mut opened.favorites, ok_json(favorites)));
    effects
}
