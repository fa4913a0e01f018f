use tokio::sync::watch;

/// Session identity as the board core sees it: a stable per-session user
/// id, or none while unresolved. Every board operation gates on this.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;

    /// Watch channel carrying the latest identity; consumers await
    /// changes instead of registering callbacks.
    fn watch(&self) -> watch::Receiver<Option<String>>;
}
