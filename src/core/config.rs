use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub github: GithubConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    pub frontend_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Local JWT issuance and the server secret used to sign OAuth state
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub secret_key: String,
    pub token_ttl: Duration,
    pub jwt_leeway: Duration,
}

/// GitHub OAuth app credentials. Login via GitHub is disabled when unset.
#[derive(Clone, Debug, Default)]
pub struct GithubConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Resume file storage on the local filesystem
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub max_upload_size: usize,
}

/// Hosted AI providers. Every key is optional; features degrade when missing.
#[derive(Clone, Debug, Default)]
pub struct AiConfig {
    pub mistral_api_key: Option<String>,
    pub mistral_model: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub qdrant_url: Option<String>,
    pub qdrant_api_key: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Reads an optional variable, treating empty strings as unset
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String>
where
    T: ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("{} must be a valid number", key))
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is fine in production
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        let app = AppConfig::from_env()?;
        let github = GithubConfig::from_env(&app.frontend_url);

        Ok(Config {
            app,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            github,
            storage: StorageConfig::from_env()?,
            ai: AiConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 20 * 1024 * 1024; // 20MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("APP_HOST")
            .or_else(|_| env::var("HOST"))
            .unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid APP_PORT: {}", e))?;

        let cors_allowed_origins = split_origins(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        let max_request_body_size =
            parse_var("MAX_REQUEST_BODY_SIZE", Self::DEFAULT_MAX_REQUEST_BODY_SIZE)?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            frontend_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_github_redirect(frontend_url: &str) -> String {
    format!(
        "{}/api/auth/github/authorize",
        frontend_url.trim_end_matches('/')
    )
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = match optional_var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let name = optional_var("DB_NAME")
                    .ok_or_else(|| "DATABASE_URL or DB_NAME must be set".to_string())?;
                build_database_url(
                    &optional_var("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                    parse_var("DB_PORT", 5432u16)?,
                    &optional_var("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                    optional_var("DB_PASSWORD").as_deref(),
                    &name,
                )
            }
        };

        Ok(Self {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_var("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_var("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

/// Assembles a postgres URL from the discrete `DB_*` variables
pub fn build_database_url(
    host: &str,
    port: u16,
    user: &str,
    password: Option<&str>,
    name: &str,
) -> String {
    let credentials = match password {
        Some(password) => format!(
            "{}:{}",
            urlencoding::encode(user),
            urlencoding::encode(password)
        ),
        None => urlencoding::encode(user).into_owned(),
    };
    format!("postgres://{}@{}:{}/{}", credentials, host, port, name)
}

impl AuthConfig {
    const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = optional_var("JWT_SECRET_KEY")
            .ok_or_else(|| "JWT_SECRET_KEY environment variable is required".to_string())?;

        let secret_key = optional_var("SECRET_KEY").unwrap_or_else(|| jwt_secret.clone());

        let ttl_hours = parse_var("JWT_EXPIRY_HOURS", Self::DEFAULT_TOKEN_TTL_HOURS)?;
        let leeway_secs = parse_var("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            jwt_secret,
            secret_key,
            token_ttl: Duration::from_secs(ttl_hours * 3600),
            jwt_leeway: Duration::from_secs(leeway_secs),
        })
    }
}

impl GithubConfig {
    /// Falls back to the callback route on `frontend_url` when
    /// `GITHUB_REDIRECT_URI` is unset
    pub fn from_env(frontend_url: &str) -> Self {
        Self {
            client_id: optional_var("GITHUB_CLIENT_ID"),
            client_secret: optional_var("GITHUB_CLIENT_SECRET"),
            redirect_uri: optional_var("GITHUB_REDIRECT_URI")
                .or_else(|| Some(default_github_redirect(frontend_url))),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl StorageConfig {
    const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024; // 16MB

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            upload_dir: optional_var("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            max_upload_size: parse_var("MAX_UPLOAD_SIZE", Self::DEFAULT_MAX_UPLOAD_SIZE)?,
        })
    }
}

impl AiConfig {
    const DEFAULT_MISTRAL_MODEL: &'static str = "mistral-small-latest";
    const DEFAULT_GROQ_MODEL: &'static str = "llama-3.1-8b-instant";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let timeout_secs = parse_var("AI_REQUEST_TIMEOUT_SECS", Self::DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            mistral_api_key: optional_var("MISTRAL_API_KEY"),
            mistral_model: optional_var("MISTRAL_MODEL")
                .unwrap_or_else(|| Self::DEFAULT_MISTRAL_MODEL.to_string()),
            groq_api_key: optional_var("GROQ_API_KEY"),
            groq_model: optional_var("GROQ_MODEL")
                .unwrap_or_else(|| Self::DEFAULT_GROQ_MODEL.to_string()),
            qdrant_url: optional_var("QDRANT_URL"),
            qdrant_api_key: optional_var("QDRANT_API_KEY"),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            username: optional_var("SWAGGER_USERNAME"),
            password: optional_var("SWAGGER_PASSWORD"),
            title: env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Hireflow API".to_string()),
            version: env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string()),
            description: env::var("SWAGGER_DESCRIPTION")
                .unwrap_or_else(|_| "Applicant tracking API".to_string()),
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url_with_password() {
        let url = build_database_url("db", 5433, "ats", Some("p@ss word"), "ats_db");
        assert_eq!(url, "postgres://ats:p%40ss%20word@db:5433/ats_db");
    }

    #[test]
    fn test_build_database_url_without_password() {
        let url = build_database_url("localhost", 5432, "postgres", None, "ats");
        assert_eq!(url, "postgres://postgres@localhost:5432/ats");
    }

    #[test]
    fn test_split_origins_skips_blanks() {
        let origins = split_origins("http://a.test, ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert!(swagger.credentials().is_none());

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials().as_deref(), Some("admin:secret"));
    }

    #[test]
    fn test_github_config_requires_id_and_secret() {
        let config = GithubConfig {
            client_id: Some("id".to_string()),
            client_secret: None,
            redirect_uri: None,
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn test_default_github_redirect_uses_frontend_url() {
        assert_eq!(
            default_github_redirect("https://hire.example.com/"),
            "https://hire.example.com/api/auth/github/authorize"
        );
    }
}
