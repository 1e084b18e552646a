use std::fmt;

use harvester_core::ElementPath;

use crate::DriverError;

/// Opaque handle to one browsing context (tab, window or frame host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// The only way the harvester touches a live page.
///
/// Every call names the view it acts on; the harvester never keeps an
/// implicit "current page".
#[async_trait::async_trait]
pub trait ViewDriver: Send + Sync {
    /// Open views, oldest first.
    async fn views(&self) -> Result<Vec<ViewId>, DriverError>;

    /// Serialized DOM of the view as currently rendered.
    async fn markup(&self, view: ViewId) -> Result<String, DriverError>;

    async fn url(&self, view: ViewId) -> Result<String, DriverError>;

    async fn click(&self, view: ViewId, target: &ElementPath) -> Result<(), DriverError>;

    async fn go_back(&self, view: ViewId) -> Result<(), DriverError>;

    /// PNG bytes of the visible view.
    async fn screenshot(&self, view: ViewId) -> Result<Vec<u8>, DriverError>;

    async fn close(&self, view: ViewId) -> Result<(), DriverError>;

    async fn bring_to_front(&self, _view: ViewId) -> Result<(), DriverError> {
        Ok(())
    }
}
