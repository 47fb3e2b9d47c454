use std::env;
use std::path::PathBuf;

/// Process configuration, read from the environment exactly once at startup
/// and passed by reference to whatever needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub default_pfp: String,
}

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_UPLOAD_DIR: &str = "assets";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_PFP: &str = "https://picsum.photos/id/237/200";

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET_KEY")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            upload_dir,
            max_upload_bytes,
            default_pfp: DEFAULT_PFP.to_string(),
        })
    }
}
