pub mod token;
pub use token::{Claims, Identity, TokenCodec, TokenError, VerifyError};

pub mod session;
pub use session::{AnonymousReason, Session, SessionResolver};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AdminInfo, AuthError, AuthService, LoginSuccess};
pub use auth_service_impl::SeaOrmAuthService;

pub mod login_throttle;
pub use login_throttle::{LoginThrottle, ThrottleDecision};

pub mod slug;

pub mod blog_service;
pub mod blog_service_impl;
pub use blog_service::{BlogError, BlogPostInput, BlogService};
pub use blog_service_impl::SeaOrmBlogService;

pub mod contact_service;
pub mod contact_service_impl;
pub use contact_service::{ContactError, ContactListing, ContactService, Pagination};
pub use contact_service_impl::SeaOrmContactService;

pub mod sitemap;
