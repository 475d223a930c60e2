//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers, fixed notices, and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for HTTP requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default backend base URL (development proxy)
    pub const DEFAULT_API_URL: &str = "http://localhost:5173/api";
}

/// UI configuration
pub mod ui {
    /// Config directory name
    pub const CONFIG_DIR_NAME: &str = ".sohbet";
}

/// Session identity persistence
pub mod session {
    /// File under the config directory holding the persisted session id
    pub const IDENTITY_FILE: &str = "session.json";
}

/// Voice configuration
pub mod voice {
    /// Locale for speech synthesis and recognition (fixed for this deployment)
    pub const LANGUAGE: &str = "tr-TR";
}

/// Fixed user-facing notices (deployment language: Turkish)
pub mod notices {
    /// Placeholder text for a pending assistant reply
    pub const REPLY_PENDING: &str = "...";

    /// The chat endpoint refused or could not be reached
    pub const CONNECT_FAILED: &str = "Hata: servise bağlanılamadı";

    /// The user stopped an in-flight reply
    pub const REPLY_STOPPED: &str = "Cevap durduruldu";

    /// A stream event could not be processed (malformed or error-carrying)
    pub const EVENT_FAILED: &str = "Mesaj işlenirken bir hata oluştu";

    /// Regenerate invoked before any user message exists
    pub const REGENERATE_NEEDS_MESSAGE: &str = "Tekrar oluşturmak için önce bir mesaj gönderin";

    /// No speech recognition backend is configured
    pub const DICTATION_UNSUPPORTED: &str = "Ses tanıma özelliği desteklenmiyor";

    /// The speech recognition backend failed to start
    pub const DICTATION_FAILED: &str = "Ses tanıma başlatılamadı";
}
