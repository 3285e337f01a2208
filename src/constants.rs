pub mod auth {

    /// Cookie carrying the signed session token.
    pub const SESSION_COOKIE: &str = "admin_token";

    /// The only role allowed into the admin area.
    pub const ADMIN_ROLE: &str = "admin";

    /// Username reserved for the provisioned administrator.
    pub const RESERVED_ADMIN_USERNAME: &str = "admin";

    pub const RESERVED_ADMIN_FULL_NAME: &str = "Administrator";

    pub const TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

    /// Query parameter holding the page to return to after login.
    pub const REDIRECT_PARAM: &str = "redirect";

    /// Generic message for every credential failure.
    pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";
}

pub mod login_flow {
    use std::time::Duration;

    pub const MAX_ATTEMPTS: u32 = 5;

    pub const BLOCK_MINUTES: i64 = 15;

    pub const ALREADY_AUTHENTICATED_DELAY: Duration = Duration::from_millis(1500);

    pub const SUCCESS_DELAY: Duration = Duration::from_millis(2000);
}

pub mod blog {

    pub const MAX_SLUG_LEN: usize = 50;

    /// Upper bound (exclusive) of the random suffix appended to a colliding slug.
    pub const SLUG_SUFFIX_RANGE: u32 = 1000;
}

pub mod limits {

    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    pub const MAX_PAGE_SIZE: u64 = 100;
}
