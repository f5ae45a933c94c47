pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod likes;
pub mod rest;
pub mod store;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

// Config + errors
pub use config::{AccountStatus, AuthConfig, GatewayConfig, StoreConfig, UserEntry};
pub use error::{AuthFailure, Result, ShutterError};

// REST client
pub use rest::UnsplashHttpClient;

// Gateway + cache
pub use cache::{NoCache, ResponseCache, TtlCache};
pub use gateway::{PhotoSource, UpstreamGateway};

// Likes
pub use auth::{Authenticator, Identity};
pub use likes::{LikeApi, UserLikes};
pub use store::{JsonFileLikeStore, LikeStore};

// Data model
pub use types::{
    Author, Color, FilterSet, LikeRecord, LikedResponse, LikesResponse, ListPayload, OrderBy,
    Orientation, PageRequest, Photo, PhotoPage, PhotoUrls, ProfileImage, MAX_PAGE_SIZE,
};
