//! Header controller: the single owner of overlay visibility.
//!
//! The cart drawer and the navigation drawer are two independent cells.
//! Opening one never touches the other, and nothing outside this type sets
//! either flag.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token for one in-flight add-to-cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddToCartToken(Uuid);

impl AddToCartToken {
    /// A fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AddToCartToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for AddToCartToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Overlay state for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderController {
    cart_open: bool,
    menu_open: bool,
    /// In-flight add tokens from the last observation.
    #[serde(default)]
    previous_adds: Vec<AddToCartToken>,
}

impl HeaderController {
    #[must_use]
    pub const fn is_cart_open(&self) -> bool {
        self.cart_open
    }

    #[must_use]
    pub const fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub const fn open_cart(&mut self) {
        self.cart_open = true;
    }

    pub const fn close_cart(&mut self) {
        self.cart_open = false;
    }

    pub const fn open_menu(&mut self) {
        self.menu_open = true;
    }

    pub const fn close_menu(&mut self) {
        self.menu_open = false;
    }

    /// Observe the current list of in-flight add-to-cart operations.
    ///
    /// Opens the cart when the list is non-empty and holds a token the
    /// previous observation did not, unless the cart is already open. Never
    /// closes the cart. Returns whether this observation opened it.
    pub fn observe_add_to_cart(&mut self, in_flight: &[AddToCartToken]) -> bool {
        let has_new = in_flight.iter().any(|t| !self.previous_adds.contains(t));
        self.previous_adds = in_flight.to_vec();

        if has_new && !self.cart_open {
            self.open_cart();
            true
        } else {
            false
        }
    }
}
