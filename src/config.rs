/// Which Persistence Gateway backs the user service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStore {
    Postgres,
    Memory,
}

impl std::str::FromStr for UserStore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown USER_STORE {:?} (expected postgres or memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub user_store: UserStore,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let user_store = match get("USER_STORE") {
            Some(v) => v.parse()?,
            None => UserStore::Postgres,
        };
        let database_url = get("DATABASE_URL");
        if user_store == UserStore::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when USER_STORE=postgres");
        }

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: get("APP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            user_store,
            database_url,
            db_max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_postgres_and_requires_database_url() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let cfg = config_from(&[("DATABASE_URL", "postgres://localhost/users")]).unwrap();
        assert_eq!(cfg.user_store, UserStore::Postgres);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_max_connections, 10);
    }

    #[test]
    fn memory_store_needs_no_database() {
        let cfg = config_from(&[("USER_STORE", "Memory"), ("APP_PORT", "9000")]).unwrap();
        assert_eq!(cfg.user_store, UserStore::Memory);
        assert_eq!(cfg.port, 9000);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn rejects_unknown_store() {
        let err = config_from(&[("USER_STORE", "redis")]).unwrap_err();
        assert!(err.to_string().contains("unknown USER_STORE"));
    }
}
