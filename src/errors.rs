use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortenerError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    Validation(String),
    Entropy(String),
    ShortIdCollision(String),
    NoRowsAffected(String),
    QueueFull(String),
    QueueClosed(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::DatabaseConfig(_) => "E001",
            ShortenerError::DatabaseConnection(_) => "E002",
            ShortenerError::DatabaseOperation(_) => "E003",
            ShortenerError::FileOperation(_) => "E004",
            ShortenerError::Serialization(_) => "E005",
            ShortenerError::Validation(_) => "E006",
            ShortenerError::Entropy(_) => "E007",
            ShortenerError::ShortIdCollision(_) => "E008",
            ShortenerError::NoRowsAffected(_) => "E009",
            ShortenerError::QueueFull(_) => "E010",
            ShortenerError::QueueClosed(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::DatabaseConfig(_) => "Database Configuration Error",
            ShortenerError::DatabaseConnection(_) => "Database Connection Error",
            ShortenerError::DatabaseOperation(_) => "Database Operation Error",
            ShortenerError::FileOperation(_) => "File Operation Error",
            ShortenerError::Serialization(_) => "Serialization Error",
            ShortenerError::Validation(_) => "Validation Error",
            ShortenerError::Entropy(_) => "Entropy Source Error",
            ShortenerError::ShortIdCollision(_) => "Short ID Collision",
            ShortenerError::NoRowsAffected(_) => "No Rows Affected",
            ShortenerError::QueueFull(_) => "Deletion Queue Full",
            ShortenerError::QueueClosed(_) => "Deletion Queue Closed",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::DatabaseConfig(msg)
            | ShortenerError::DatabaseConnection(msg)
            | ShortenerError::DatabaseOperation(msg)
            | ShortenerError::FileOperation(msg)
            | ShortenerError::Serialization(msg)
            | ShortenerError::Validation(msg)
            | ShortenerError::Entropy(msg)
            | ShortenerError::ShortIdCollision(msg)
            | ShortenerError::NoRowsAffected(msg)
            | ShortenerError::QueueFull(msg)
            | ShortenerError::QueueClosed(msg) => msg,
        }
    }

    /// 关系型后端的 delete 没有命中任何行，调用方应视为“无事可做”
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, ShortenerError::NoRowsAffected(_))
    }

    /// 格式化为彩色输出（用于 CLI）
    #[cfg(feature = "cli")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Validation(msg.into())
    }

    pub fn entropy<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Entropy(msg.into())
    }

    pub fn short_id_collision<T: Into<String>>(msg: T) -> Self {
        ShortenerError::ShortIdCollision(msg.into())
    }

    pub fn no_rows_affected<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NoRowsAffected(msg.into())
    }

    pub fn queue_full<T: Into<String>>(msg: T) -> Self {
        ShortenerError::QueueFull(msg.into())
    }

    pub fn queue_closed<T: Into<String>>(msg: T) -> Self {
        ShortenerError::QueueClosed(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortenerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

impl From<getrandom::Error> for ShortenerError {
    fn from(err: getrandom::Error) -> Self {
        ShortenerError::Entropy(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            ShortenerError::database_config("a"),
            ShortenerError::database_connection("a"),
            ShortenerError::database_operation("a"),
            ShortenerError::file_operation("a"),
            ShortenerError::serialization("a"),
            ShortenerError::validation("a"),
            ShortenerError::entropy("a"),
            ShortenerError::short_id_collision("a"),
            ShortenerError::no_rows_affected("a"),
            ShortenerError::queue_full("a"),
            ShortenerError::queue_closed("a"),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_only_no_rows_affected_is_nothing_to_do() {
        assert!(ShortenerError::no_rows_affected("x").is_nothing_to_do());
        assert!(!ShortenerError::database_operation("x").is_nothing_to_do());
        assert!(!ShortenerError::short_id_collision("x").is_nothing_to_do());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = ShortenerError::validation("URL cannot be empty");
        assert_eq!(err.to_string(), "Validation Error: URL cannot be empty");
        assert_eq!(err.message(), "URL cannot be empty");
    }

    #[test]
    fn test_io_error_converts_to_file_operation() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ShortenerError = io.into();
        assert_eq!(err.code(), "E004");
    }
}
