#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Env {
    Dev,
    Staging,
    Production,
}

impl Env {
    pub fn from_env() -> Self {
        match var("ENVIRONMENT") {
            Ok(Some(env)) => Env::parse(&env),
            _ => Env::Dev,
        }
    }

    fn parse(env: &str) -> Self {
        match env {
            "dev" => Env::Dev,
            "staging" => Env::Staging,
            "production" => Env::Production,
            _ => Env::Dev,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub env: Env,
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Users allowed to edit or delete any guest book entry
    pub admin_user_ids: Vec<String>,
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

fn var(key: &str) -> Result<Option<String>, String> {
    match std::env::var(key) {
        Ok(env) => Ok(Some(env)),
        Err(e) => match e {
            std::env::VarError::NotPresent => {
                tracing::debug!("Missing environment variable `{key}`");
                Ok(None)
            }
            std::env::VarError::NotUnicode(_) => Err(format!(
                "Could not get the environment variable `{key}` due to unicode error"
            )),
        },
    }
}

fn required_var(key: &str) -> String {
    let val = var(key);
    match val {
        Ok(val) => match val {
            Some(val) => val,
            None => {
                tracing::error!("Environment variable `{key}` is required");
                std::process::exit(1)
            }
        },
        Err(e) => {
            tracing::error!(
                "Environment variable `{key}` is required, but could not retrieve: {e}"
            );
            std::process::exit(1)
        }
    }
}

// comma separated, blanks ignored
fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_port(value: Option<String>) -> u16 {
    match value {
        Some(port) => port.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid `PORT` value `{port}`, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        None => DEFAULT_PORT,
    }
}

impl ServerConfig {
    pub fn new_from_env() -> Self {
        let cors_allowed_origins = match var("CORS_ALLOWED_ORIGINS") {
            Ok(Some(origins)) => list(&origins),
            _ => vec![DEFAULT_CORS_ORIGIN.to_string()],
        };

        let admin_user_ids = match var("GUEST_BOOK_ADMIN_USER_IDS") {
            Ok(Some(ids)) => list(&ids),
            _ => {
                tracing::warn!("No guest book admins configured");
                vec![]
            }
        };

        ServerConfig {
            env: Env::from_env(),
            database_url: required_var("DATABASE_URL"),
            port: parse_port(var("PORT").ok().flatten()),
            cors_allowed_origins,
            admin_user_ids,
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user_ids.iter().any(|id| id == user_id)
    }
}
