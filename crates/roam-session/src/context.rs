//! The per-request session context supplied by the caller environment.

/// What the serving environment knows about a request's session identity.
///
/// The local identifier is whatever the current instance assigned or read
/// from its own transport (cookie, connection). The incoming identifier, when
/// present, was carried out-of-band from another instance (a URL-embedded
/// token, a failover header) and names a session that may already hold
/// attributes under a different canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    local_id: Option<String>,
    incoming_id: Option<String>,
    allow_create: bool,
}

impl SessionContext {
    /// Context for a request with a locally-known session identifier.
    pub fn new(local_id: impl Into<String>) -> Self {
        Self {
            local_id: Some(local_id.into()),
            incoming_id: None,
            allow_create: true,
        }
    }

    /// Context for a request carrying no session identifier at all.
    /// Resolution is always unresolved; attribute operations no-op.
    pub fn anonymous() -> Self {
        Self {
            local_id: None,
            incoming_id: None,
            allow_create: false,
        }
    }

    /// Attach an externally-presented identifier to reconcile.
    pub fn with_incoming_id(mut self, incoming_id: impl Into<String>) -> Self {
        self.incoming_id = Some(incoming_id.into());
        self
    }

    /// Whether a new session may be created when none resolves.
    pub fn with_allow_create(mut self, allow_create: bool) -> Self {
        self.allow_create = allow_create;
        self
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn incoming_id(&self) -> Option<&str> {
        self.incoming_id.as_deref()
    }

    pub fn allow_create(&self) -> bool {
        self.allow_create
    }
}
