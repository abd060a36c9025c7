use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

static DATA_DIR_NAME: &str = "threads";
static THREADS_DB_NAME: &str = "threads_db.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

// For now this directory structure should be like
// data_dir_path
// |- threads
//    |- threads_db.sqlite
//    |- config.json

#[derive(Serialize, Deserialize, Debug)]
pub struct ThreadsConfig {
    pub(crate) database_path: PathBuf,

    /// Wrap multi-row mutations (thread create, subtree delete) in a single
    /// transaction.
    ///
    /// Off by default: each row write is then issued independently, and a
    /// mid-sequence failure can leave back-reference lists trailing the
    /// thread rows until the operation is retried. `serde(default)` keeps
    /// backward compatibility with old config.json files.
    #[serde(default)]
    pub(crate) transactional_writes: bool,
}

impl ThreadsConfig {
    /// Creates a new ThreadsConfig rooted at the specified data directory
    fn new(data_dir: PathBuf) -> Self {
        let database_path = data_dir.join(THREADS_DB_NAME);

        ThreadsConfig {
            database_path,
            transactional_writes: false,
        }
    }

    pub fn transactional_writes(&self) -> bool {
        self.transactional_writes
    }
}

/// Gets the existing config or initializes a new one if it doesn't exist
pub async fn get_or_init() -> Result<ThreadsConfig, Box<dyn std::error::Error>> {
    let data_dir = dirs::data_dir().expect("failed to find a data directory on this platform");

    let threads_dir = data_dir.join(DATA_DIR_NAME);
    let config_path = threads_dir.join(CONFIG_FILE_NAME);

    // Create the data directory if it doesn't exist
    fs::create_dir_all(&threads_dir).await?;

    // Check if config file exists
    if config_path.exists() {
        // Read and deserialize existing config
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: ThreadsConfig = serde_json::from_str(&contents)?;
        Ok(config)
    } else {
        // Create new config
        let config = ThreadsConfig::new(threads_dir.clone());

        // Serialize and write to file
        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        Ok(config)
    }
}
