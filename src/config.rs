use crate::origin::OriginMatcher;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub allowed_origins: Vec<OriginMatcher>,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed_origins(mut self, allowed_origins: Vec<OriginMatcher>) -> Self {
        self.allowed_origins = allowed_origins;
        self
    }
}
