use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub api_token: String,
    pub base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Self {
            port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "bookingpage.db".to_string()),
            api_token: env::var("API_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
        }
    }
}
