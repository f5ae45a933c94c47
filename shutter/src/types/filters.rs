//! Filter vocabulary shared by the gateway and the pagination controller.
//!
//! Each enum has a lowercase wire form used in query strings and cache keys,
//! and an upstream form sent to the provider. `all` is the absence of a
//! filter and is never forwarded upstream.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShutterError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Latest,
    Oldest,
    Popular,
    Views,
}

impl OrderBy {
    pub const ALL: [OrderBy; 4] = [
        OrderBy::Latest,
        OrderBy::Oldest,
        OrderBy::Popular,
        OrderBy::Views,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderBy::Latest => "latest",
            OrderBy::Oldest => "oldest",
            OrderBy::Popular => "popular",
            OrderBy::Views => "views",
        }
    }

    /// Provider ordering. The provider has no view-count ordering, so `views`
    /// is sent as `popular`.
    pub fn upstream_value(self) -> &'static str {
        match self {
            OrderBy::Latest => "latest",
            OrderBy::Oldest => "oldest",
            OrderBy::Popular | OrderBy::Views => "popular",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    All,
    BlackAndWhite,
    Black,
    White,
    Yellow,
    Orange,
    Red,
    Purple,
    Magenta,
    Green,
    Teal,
    Blue,
}

impl Color {
    pub const ALL: [Color; 12] = [
        Color::All,
        Color::BlackAndWhite,
        Color::Black,
        Color::White,
        Color::Yellow,
        Color::Orange,
        Color::Red,
        Color::Purple,
        Color::Magenta,
        Color::Green,
        Color::Teal,
        Color::Blue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Color::All => "all",
            Color::BlackAndWhite => "black_and_white",
            Color::Black => "black",
            Color::White => "white",
            Color::Yellow => "yellow",
            Color::Orange => "orange",
            Color::Red => "red",
            Color::Purple => "purple",
            Color::Magenta => "magenta",
            Color::Green => "green",
            Color::Teal => "teal",
            Color::Blue => "blue",
        }
    }

    pub fn upstream_value(self) -> Option<&'static str> {
        match self {
            Color::All => None,
            other => Some(other.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    All,
    Landscape,
    Portrait,
    Squarish,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::All,
        Orientation::Landscape,
        Orientation::Portrait,
        Orientation::Squarish,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::All => "all",
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Squarish => "squarish",
        }
    }

    pub fn upstream_value(self) -> Option<&'static str> {
        match self {
            Orientation::All => None,
            other => Some(other.as_str()),
        }
    }
}

macro_rules! impl_wire_str {
    ($ty:ident, $what:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ShutterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ShutterError::Validation(format!("unknown {}: {s}", $what)))
            }
        }
    };
}

impl_wire_str!(OrderBy, "order");
impl_wire_str!(Color, "color");
impl_wire_str!(Orientation, "orientation");

/// Complete filter snapshot. A pagination session is scoped to exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub order_by: OrderBy,
    pub color: Color,
    pub orientation: Orientation,
}

impl FilterSet {
    pub fn new(order_by: OrderBy, color: Color, orientation: Orientation) -> Self {
        Self {
            order_by,
            color,
            orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_maps_to_popular_upstream() {
        assert_eq!(OrderBy::Views.upstream_value(), "popular");
        assert_eq!(OrderBy::Popular.upstream_value(), "popular");
        assert_eq!(OrderBy::Oldest.upstream_value(), "oldest");
    }

    #[test]
    fn test_all_is_not_forwarded() {
        assert_eq!(Color::All.upstream_value(), None);
        assert_eq!(Orientation::All.upstream_value(), None);
        assert_eq!(Color::BlackAndWhite.upstream_value(), Some("black_and_white"));
        assert_eq!(Orientation::Squarish.upstream_value(), Some("squarish"));
    }

    #[test]
    fn test_parse_round_trips_display() {
        for c in Color::ALL {
            assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
        }
        assert_eq!("PORTRAIT".parse::<Orientation>().unwrap(), Orientation::Portrait);
    }

    #[test]
    fn test_unknown_value_is_validation_error() {
        let err = "sideways".parse::<Orientation>().unwrap_err();
        assert!(matches!(err, ShutterError::Validation(_)));
    }

    #[test]
    fn test_serde_wire_names() {
        let f = FilterSet::new(OrderBy::Views, Color::BlackAndWhite, Orientation::Landscape);
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(
            json,
            r#"{"orderBy":"views","color":"black_and_white","orientation":"landscape"}"#
        );
    }
}
