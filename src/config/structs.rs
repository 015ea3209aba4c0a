use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀，例如 SHORTENER__STORAGE__DATABASE_URL
pub const ENV_PREFIX: &str = "SHORTENER";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - storage: 存储后端选择与参数
/// - deletion: 异步删除队列
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub deletion: DeletionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：SHORTENER，分隔符：__
    /// 示例：SHORTENER__DELETION__QUEUE_CAPACITY=500
    pub fn load(path: Option<&str>) -> Self {
        use config::{Config, Environment, File};

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 存储配置
///
/// 后端选择：`database_url` 非空 → 关系型；否则 `file_storage_path` 非空 →
/// 追加日志文件；否则内存。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_file_storage_path")]
    pub file_storage_path: String,
    /// 每次追加后 fsync
    #[serde(default)]
    pub sync_writes: bool,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl StorageConfig {
    /// 仅内存存储（测试常用）
    pub fn memory() -> Self {
        Self {
            database_url: String::new(),
            file_storage_path: String::new(),
            ..Self::default()
        }
    }

    pub fn file<P: Into<String>>(path: P) -> Self {
        Self {
            database_url: String::new(),
            file_storage_path: path.into(),
            ..Self::default()
        }
    }

    pub fn database<U: Into<String>>(url: U) -> Self {
        Self {
            database_url: url.into(),
            ..Self::default()
        }
    }
}

/// 异步删除队列配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
}

// ============================================================
// Default value functions
// ============================================================

fn default_file_storage_path() -> String {
    "/tmp/short-url-db.json".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    crate::deletion::DEFAULT_QUEUE_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            file_storage_path: default_file_storage_path(),
            sync_writes: false,
            pool_size: default_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}
