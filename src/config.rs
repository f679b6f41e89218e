use anyhow::{bail, Context};

/// Which storage collaborator backs the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(Self::DynamoDb),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown STORE_BACKEND '{}' (expected dynamodb or memory)", other),
        }
    }
}

/// How the process receives requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    /// Invoked by the Lambda runtime API.
    Lambda,
    /// Plain HTTP server on `host:port`, for local development.
    Local,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub backend: StoreBackend,
    pub memory_page_size: usize,
    pub host: String,
    pub port: u16,
    pub runtime: Runtime,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let memory_page_size: usize = lookup("MEMORY_PAGE_SIZE")
            .unwrap_or_else(|| "100".to_string())
            .parse()
            .context("MEMORY_PAGE_SIZE must be a valid number")?;
        if memory_page_size == 0 {
            bail!("MEMORY_PAGE_SIZE must be > 0");
        }

        Ok(Self {
            table_name: lookup("TABLE_NAME").unwrap_or_else(|| "inventory_info".to_string()),
            region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint_url: lookup("DYNAMODB_ENDPOINT_URL").filter(|url| !url.trim().is_empty()),
            backend: lookup("STORE_BACKEND")
                .map(|raw| raw.parse::<StoreBackend>())
                .transpose()?
                .unwrap_or(StoreBackend::DynamoDb),
            memory_page_size,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            runtime: if lookup("AWS_LAMBDA_RUNTIME_API").is_some() {
                Runtime::Lambda
            } else {
                Runtime::Local
            },
        })
    }
}
