use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Header icon colour used by the food screens.
pub const HEADER_ACCENT_COLOR: &str = "#FFB84D";
pub const HEADER_ICON_SIZE: u16 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Orders,
}

/// Icon names as understood by the shell's material icon set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoriteIcon {
    #[serde(rename = "favorite")]
    Filled,
    #[serde(rename = "favorite-border")]
    Outline,
}

impl FavoriteIcon {
    #[must_use]
    pub const fn for_flag(is_favorite: bool) -> Self {
        if is_favorite {
            Self::Filled
        } else {
            Self::Outline
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Filled => "favorite",
            Self::Outline => "favorite-border",
        }
    }
}

/// What the shell should send back when the header button is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPress {
    ToggleFavorite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderAction {
    pub icon: FavoriteIcon,
    pub size: u16,
    pub color: String,
    pub on_press: HeaderPress,
}

impl HeaderAction {
    #[must_use]
    pub fn favorite_toggle(is_favorite: bool) -> Self {
        Self {
            icon: FavoriteIcon::for_flag(is_favorite),
            size: HEADER_ICON_SIZE,
            color: HEADER_ACCENT_COLOR.to_string(),
            on_press: HeaderPress::ToggleFavorite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum NavigatorOperation {
    Navigate(Route),
    /// Replaces whatever header action the screen registered before.
    SetHeaderAction(HeaderAction),
}

impl Operation for NavigatorOperation {
    type Output = ();
}

/// Fire-and-forget requests to the shell's navigation chrome.
pub struct Navigator<Ev> {
    context: CapabilityContext<NavigatorOperation, Ev>,
}

impl<Ev> Capability<Ev> for Navigator<Ev> {
    type Operation = NavigatorOperation;
    type MappedSelf<MappedEv> = Navigator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigator::new(self.context.map_event(f))
    }
}

impl<Ev> Navigator<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NavigatorOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn navigate(&self, route: Route) {
        self.notify(NavigatorOperation::Navigate(route));
    }

    pub fn set_header_action(&self, action: HeaderAction) {
        self.notify(NavigatorOperation::SetHeaderAction(action));
    }

    fn notify(&self, operation: NavigatorOperation) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}
