use std::future::Future;

/// Station-mode network link.
///
/// Credentials are owned by the implementation (flash storage, provisioning
/// portal); the guard only asks it to join, re-join or forget.
pub trait WifiLink: Send {
    /// Current association state.
    fn is_connected(&self) -> bool;

    /// Join with stored credentials, falling back to the provisioning portal.
    ///
    /// Resolves to `true` once connected, `false` when neither path worked.
    fn auto_connect(&mut self) -> impl Future<Output = bool> + Send;

    /// Start re-association with the stored credentials.
    ///
    /// Returns without waiting for the outcome; the guard polls
    /// [`is_connected`](WifiLink::is_connected).
    fn begin_reconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Forget the stored credentials so the next boot enters provisioning.
    fn clear_credentials(&mut self) -> impl Future<Output = ()> + Send;
}
