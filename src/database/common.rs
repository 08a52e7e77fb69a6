/// Seeded at setup; the only account that exists on a fresh database.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "adminpass";
