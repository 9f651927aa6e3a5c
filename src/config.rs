use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("object storage is partially configured; set all of S3_ENDPOINT, S3_BUCKET, S3_ACCESS_KEY, S3_SECRET_KEY")]
    PartialStorage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub link_check_timeout_secs: u64,
    pub storage: Option<StorageConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        // The process refuses to start without a signing secret.
        let secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.trim().is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }

        let environment = match lookup("APP_ENV").as_deref().map(str::trim) {
            None | Some("") | Some("development") | Some("dev") | Some("test") => {
                Environment::Development
            }
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "APP_ENV",
                    value: other.to_string(),
                })
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "artfolio".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "artfolio-users".into()),
            ttl_days: parse_or("SESSION_TTL_DAYS", &lookup, 7)?,
        };
        if jwt.ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_DAYS",
                value: jwt.ttl_days.to_string(),
            });
        }

        let link_check_timeout_secs = parse_or("LINK_CHECK_TIMEOUT_SECS", &lookup, 5)?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("APP_PORT", &lookup, 8080)?;

        let storage = match (
            lookup("S3_ENDPOINT"),
            lookup("S3_BUCKET"),
            lookup("S3_ACCESS_KEY"),
            lookup("S3_SECRET_KEY"),
        ) {
            (Some(endpoint), Some(bucket), Some(access_key), Some(secret_key)) => {
                Some(StorageConfig {
                    endpoint,
                    bucket,
                    access_key,
                    secret_key,
                    region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
                })
            }
            (None, None, None, None) => None,
            _ => return Err(ConfigError::PartialStorage),
        };

        Ok(Self {
            host,
            port,
            database_url,
            environment,
            jwt,
            link_check_timeout_secs,
            storage,
        })
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
